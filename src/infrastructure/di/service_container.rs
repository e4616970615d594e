//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use tracing::{error, warn};

use crate::application::services::{Inspector, ProgramRunner};
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::infrastructure::session::StdioSessionFactory;
use crate::infrastructure::traits::{FileSystem, RealFileSystem, Session, SessionFactory};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Engine session factory
    pub sessions: Arc<dyn SessionFactory>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(StdioSessionFactory),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        sessions: Arc<dyn SessionFactory>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            sessions,
        }
    }

    pub fn program_runner(&self) -> ProgramRunner {
        ProgramRunner::new(Arc::clone(&self.fs), Arc::clone(&self.settings))
    }

    pub fn inspector(&self) -> Inspector {
        Inspector::new(Arc::clone(&self.settings))
    }

    /// Open an engine session.
    ///
    /// Configuration-class failures are reported here with the offending
    /// setting; connection failures are passed through as they are.
    pub fn open_session(&self) -> ApplicationResult<Box<dyn Session>> {
        self.sessions.open(&self.settings.session).map_err(|e| {
            if e.is_config() {
                error!(
                    "session settings rejected (saspath={}): {}",
                    self.settings.session.saspath.display(),
                    e
                );
            }
            e.into()
        })
    }

    /// Run `f` against a fresh session, closing it afterwards whatever `f` returned.
    pub fn with_session<T>(
        &self,
        f: impl FnOnce(&mut dyn Session) -> ApplicationResult<T>,
    ) -> ApplicationResult<T> {
        let mut session = self.open_session()?;
        let result = f(session.as_mut());
        if let Err(e) = session.close() {
            warn!("closing session failed: {}", e);
        }
        result
    }
}
