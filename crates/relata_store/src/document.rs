//! The document store.

use crate::error::{StoreError, StoreResult};
use crate::stats::StoreStats;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use relata_model::{Collection, Entity, KindSpec};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use uuid::Uuid;

/// SQLite-backed store persisting entities as JSON rows.
///
/// The store is created closed so the application container can hand out
/// shared handles during Wire and open the file during Construct; every
/// operation on a closed store fails with [`StoreError::Closed`].
///
/// # Example
///
/// ```rust
/// use relata_model::Entity;
/// use relata_store::DocumentStore;
///
/// let store = DocumentStore::open_in_memory().unwrap();
/// store.ensure_table("nodes").unwrap();
///
/// let mut entity = Entity::new("nodes");
/// entity.insert("name", serde_json::json!("a"));
/// store.create(&mut entity).unwrap();
/// assert!(!entity.id.is_empty());
/// ```
pub struct DocumentStore {
    conn: Mutex<Option<Connection>>,
    tables: RwLock<Vec<String>>,
}

impl DocumentStore {
    /// Creates a closed store; call [`DocumentStore::connect`] to open it.
    #[must_use]
    pub fn new() -> Self {
        Self {
            conn: Mutex::new(None),
            tables: RwLock::new(Vec::new()),
        }
    }

    /// Opens a store at the given file path, creating the file if absent.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let store = Self::new();
        store.connect(path)?;
        Ok(store)
    }

    /// Opens an in-memory store for testing.
    pub fn open_in_memory() -> StoreResult<Self> {
        let store = Self::new();
        store.connect_in_memory()?;
        Ok(store)
    }

    /// Connects a closed store to the given file, creating it if absent.
    pub fn connect(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        self.install(Connection::open(path.as_ref())?)
    }

    /// Connects a closed store to a fresh in-memory database.
    pub fn connect_in_memory(&self) -> StoreResult<()> {
        self.install(Connection::open_in_memory()?)
    }

    /// Creates the table for one kind if it does not exist yet.
    pub fn ensure_table(&self, kind: &str) -> StoreResult<()> {
        let table = table_name(kind)?;
        self.with_conn(|conn| {
            conn.execute(
                &format!("CREATE TABLE IF NOT EXISTS {table} (id TEXT NOT NULL PRIMARY KEY, json TEXT)"),
                [],
            )?;
            Ok(())
        })?;

        let mut tables = self.tables.write();
        if !tables.iter().any(|t| t == &table) {
            tables.push(table);
        }
        Ok(())
    }

    /// Creates the tables for every given kind. Idempotent.
    pub fn ensure_tables<'a>(&self, kinds: impl IntoIterator<Item = &'a str>) -> StoreResult<()> {
        for kind in kinds {
            self.ensure_table(kind)?;
        }
        tracing::info!(tables = ?self.tables.read(), "document schema ready");
        Ok(())
    }

    /// Inserts a new entity: mints the id, stamps the timestamp,
    /// serializes the whole envelope.
    ///
    /// Any client-supplied id is discarded.
    pub fn create(&self, entity: &mut Entity) -> StoreResult<()> {
        let table = table_name(&entity.kind)?;
        entity.id = Uuid::new_v4().to_string();
        entity.timestamp = Utc::now();
        let payload = serde_json::to_string(entity)?;
        let id = entity.id.clone();

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("INSERT INTO {table} (id, json) VALUES (?1, ?2)"))?;
            stmt.execute(params![id, payload]).map_err(|err| {
                if is_constraint_violation(&err) {
                    StoreError::Conflict {
                        kind: table.clone(),
                        id: id.clone(),
                    }
                } else {
                    StoreError::from(err)
                }
            })?;
            Ok(())
        })
    }

    /// Overwrites the row for `id` with the re-stamped, re-serialized
    /// entity. Full replace - nothing of the previous payload survives.
    pub fn update(&self, id: &str, entity: &mut Entity) -> StoreResult<()> {
        let table = table_name(&entity.kind)?;
        entity.id = id.to_string();
        entity.timestamp = Utc::now();
        let payload = serde_json::to_string(entity)?;

        let affected = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("UPDATE {table} SET json = ?1 WHERE id = ?2"))?;
            Ok(stmt.execute(params![payload, id])?)
        })?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                kind: table,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Loads the row for `id` into the caller-supplied entity.
    pub fn get(&self, id: &str, entity: &mut Entity) -> StoreResult<()> {
        let table = table_name(&entity.kind)?;
        let payload: Option<String> = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT json FROM {table} WHERE id = ?1"))?;
            Ok(stmt.query_row(params![id], |row| row.get(0)).optional()?)
        })?;

        match payload {
            Some(payload) => hydrate(entity, &payload, id),
            None => Err(StoreError::NotFound {
                kind: table,
                id: id.to_string(),
            }),
        }
    }

    /// Scans every row of the kind into the collection, allocating a
    /// fresh factory instance per row so rows never alias each other.
    pub fn get_all(&self, spec: &KindSpec, collection: &mut Collection) -> StoreResult<()> {
        let table = table_name(spec.kind())?;
        let rows: Vec<(String, String)> = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT id, json FROM {table}"))?;
            let mapped = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            Ok(mapped.collect::<Result<_, _>>()?)
        })?;

        for (id, payload) in rows {
            let mut entity = spec.new_entity();
            hydrate(&mut entity, &payload, &id)?;
            collection.push(entity);
        }
        Ok(())
    }

    /// Deletes the row for `id`.
    pub fn delete(&self, kind: &str, id: &str) -> StoreResult<()> {
        let table = table_name(kind)?;
        let affected = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("DELETE FROM {table} WHERE id = ?1"))?;
            Ok(stmt.execute(params![id])?)
        })?;
        if affected == 0 {
            return Err(StoreError::NotFound {
                kind: table,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Deletes every row of one kind.
    pub fn truncate(&self, kind: &str) -> StoreResult<()> {
        let table = table_name(kind)?;
        self.with_conn(|conn| {
            conn.execute(&format!("DELETE FROM {table}"), [])?;
            Ok(())
        })
    }

    /// Deletes every row of every known table, skipping the named
    /// exceptions (used to preserve seed rows on reset).
    pub fn clear(&self, except: &[&str]) -> StoreResult<()> {
        let tables = self.tables.read().clone();
        for table in tables {
            if except.contains(&table.as_str()) {
                continue;
            }
            self.truncate(&table)?;
        }
        Ok(())
    }

    /// Returns per-table row counts.
    pub fn statistics(&self) -> StoreResult<Vec<StoreStats>> {
        let tables = self.tables.read().clone();
        let mut stats = Vec::with_capacity(tables.len());
        for table in tables {
            let count: i64 = self.with_conn(|conn| {
                let mut stmt = conn.prepare(&format!("SELECT COUNT(1) FROM {table}"))?;
                Ok(stmt.query_row([], |row| row.get(0))?)
            })?;
            stats.push(StoreStats {
                key: format!("{table}.count"),
                value: count.to_string(),
            });
        }
        Ok(stats)
    }

    fn install(&self, conn: Connection) -> StoreResult<()> {
        let mut guard = self.conn.lock();
        if guard.is_some() {
            return Err(StoreError::AlreadyOpen);
        }
        *guard = Some(conn);
        Ok(())
    }

    fn with_conn<R>(&self, f: impl FnOnce(&Connection) -> StoreResult<R>) -> StoreResult<R> {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or(StoreError::Closed)?;
        f(conn)
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("connected", &self.conn.lock().is_some())
            .field("tables", &*self.tables.read())
            .finish()
    }
}

/// Decodes a row payload into the caller's entity, preserving the
/// entity's kind and pinning the id to the row key.
fn hydrate(entity: &mut Entity, payload: &str, id: &str) -> StoreResult<()> {
    let decoded: Entity = serde_json::from_str(payload)?;
    entity.timestamp = decoded.timestamp;
    entity.extended = decoded.extended;
    entity.id = id.to_string();
    Ok(())
}

/// Validates a kind name for direct use as a table name.
fn table_name(kind: &str) -> StoreResult<String> {
    let valid = !kind.is_empty()
        && kind.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && kind.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(StoreError::InvalidKind {
            kind: kind.to_string(),
        });
    }
    Ok(kind.to_string())
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
