//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io;
use std::path::Path;

use crate::config::SessionConfig;
use crate::domain::{
    ColumnInfo, DataRequest, DataTable, DatasetName, EngineStatus, SubmitOutput, TableSummary,
};
use crate::infrastructure::SessionError;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// An open session with the computation engine.
///
/// All calls block until the engine has answered.
pub trait Session: Send {
    /// Submit program text and collect its log and listing.
    fn submit(&mut self, code: &str) -> Result<SubmitOutput, SessionError>;

    /// Error code and text left behind by the last submission.
    fn status(&mut self) -> Result<EngineStatus, SessionError>;

    /// Members of a library.
    fn list_tables(&mut self, libref: &str) -> Result<Vec<TableSummary>, SessionError>;

    /// Column metadata of a dataset; empty when the dataset does not exist.
    fn columns(&mut self, dataset: &DatasetName) -> Result<Vec<ColumnInfo>, SessionError>;

    /// Rows of a dataset, filtered as requested.
    fn fetch(&mut self, request: &DataRequest) -> Result<DataTable, SessionError>;

    /// End the engine session.
    fn close(&mut self) -> Result<(), SessionError>;
}

/// Opens engine sessions.
pub trait SessionFactory: Send + Sync {
    fn open(&self, config: &SessionConfig) -> Result<Box<dyn Session>, SessionError>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
