//! Helpers shared by unit and integration tests

use std::path::{Path, PathBuf};
use std::sync::Once;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

static TEST_SETUP: Once = Once::new();

/// Install one trace subscriber per test binary.
///
/// Output goes through the test writer, so it only shows for failing tests
/// or with `--nocapture`. `RUST_LOG` overrides the `debug` default.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let layer = fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(filter);

        if let Err(e) = tracing_subscriber::registry().with(layer).try_init() {
            eprintln!("test logging not installed: {e}");
        }
        tracing::debug!("test setup complete");
    });
}

/// Write a program file `name` with `body` into `dir`.
pub fn sas_program(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    if let Err(e) = std::fs::write(&path, body) {
        panic!("cannot write test program {}: {e}", path.display());
    }
    path
}
