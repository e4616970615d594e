//! Program file validation

use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Extension a program file must carry.
pub const PROGRAM_EXTENSION: &str = "sas";

/// Typed argument error for program paths.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'{}' does not exist or is not a valid .sas file", .0.display())]
    InvalidProgramFile(PathBuf),
}

/// Check that `path` names a readable `.sas` file.
///
/// Signature fits clap's `value_parser`, so a bad path is rejected while
/// arguments are parsed.
pub fn valid_sas_file(path: &str) -> Result<PathBuf, ValidationError> {
    let candidate = PathBuf::from(path);
    if is_valid_file(&candidate) {
        Ok(candidate)
    } else {
        debug!("rejected program file: {}", path);
        Err(ValidationError::InvalidProgramFile(candidate))
    }
}

/// True when `path` ends in `.sas`, in any letter case.
pub fn has_program_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(PROGRAM_EXTENSION))
}

fn is_valid_file(path: &Path) -> bool {
    has_program_extension(path) && path.is_file() && File::open(path).is_ok()
}
