//! Application settings.

use std::path::PathBuf;

/// File-path configuration for the two persistent stores.
///
/// Both files are created if absent at boot.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Path of the SQLite document store file.
    pub document_path: PathBuf,

    /// Path of the quad log file.
    pub graph_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            document_path: PathBuf::from("./documents.db"),
            graph_path: PathBuf::from("./links.db"),
        }
    }
}

impl Settings {
    /// Creates settings with default paths.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document store path.
    #[must_use]
    pub fn document_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.document_path = path.into();
        self
    }

    /// Sets the quad log path.
    #[must_use]
    pub fn graph_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.graph_path = path.into();
        self
    }
}
