//! sascli: run SAS programs and inspect SAS libraries from the command line.
//!
//! Layers, innermost first: [`domain`] (entities, generated engine code and
//! its parsers), [`application`] (services), [`infrastructure`] (engine
//! process, filesystem, wiring) and [`cli`].

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
