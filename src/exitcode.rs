//! Process exit codes

/// Successful termination
pub const OK: i32 = 0;

/// Engine-reported error, invalid arguments, configuration or connection failure
pub const FAILURE: i32 = 1;
