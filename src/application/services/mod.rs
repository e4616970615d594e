//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, Session)
//! but are themselves concrete structs, not traits.

mod inspector;
mod runner;
mod tail;

pub use inspector::{DataOptions, Inspector};
pub use runner::ProgramRunner;
pub use tail::LogTail;
