//! Context for I/O failures
//!
//! Services read program files, write to output sinks and tail run logs. A
//! bare `io::Error` says none of that, so each call site names its action.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add the action and the path it was applied to.
    ///
    /// ```ignore
    /// fs.read_to_string(program)
    ///     .with_path_context("read program", program)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;

    /// Add free-form context.
    fn with_context(self, context: &str) -> ApplicationResult<T>;

    /// Failure to write to the caller's output sink (stdout, usually a pipe).
    fn written(self) -> ApplicationResult<T>
    where
        Self: Sized,
    {
        self.with_context("write output")
    }
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.with_context(&format!("{}: {}", action, path.display()))
    }

    fn with_context(self, context: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: context.to_string(),
            source: Box::new(e),
        })
    }
}
