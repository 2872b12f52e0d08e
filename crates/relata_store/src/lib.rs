//! # Relata Store
//!
//! SQLite-backed document store for relata entities.
//!
//! Entities persist as JSON blobs, one logical table per entity kind with
//! two columns: a text primary-key `id` and the full serialized payload.
//! Schema creation is idempotent and driven at boot from the set of kinds
//! known to the application.
//!
//! ## Concurrency
//!
//! One connection behind a mutex; statements are prepared per call and
//! the driver provides the only synchronization. There is no
//! application-level locking or optimistic concurrency control -
//! concurrent writers to the same row are last-writer-wins.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod error;
mod stats;

pub use document::DocumentStore;
pub use error::{StoreError, StoreResult};
pub use stats::StoreStats;
