//! Domain layer: entities and engine language
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod program;
pub mod table;

pub use entities::*;
pub use error::{DomainError, DomainResult};
