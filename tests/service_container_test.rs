//! Tests for ServiceContainer session handling

use std::sync::{Arc, Mutex};

use sascli::application::ApplicationError;
use sascli::config::{SessionConfig, Settings};
use sascli::domain::{
    ColumnInfo, DataRequest, DataTable, DatasetName, EngineStatus, SubmitOutput, TableSummary,
};
use sascli::infrastructure::di::ServiceContainer;
use sascli::infrastructure::traits::{RealFileSystem, Session, SessionFactory};
use sascli::infrastructure::SessionError;

// ============================================================
// Mocks
// ============================================================

#[derive(Debug, Default)]
struct Events {
    opened: usize,
    closed: usize,
}

struct MockSession {
    events: Arc<Mutex<Events>>,
}

impl Session for MockSession {
    fn submit(&mut self, _code: &str) -> Result<SubmitOutput, SessionError> {
        Ok(SubmitOutput::default())
    }

    fn status(&mut self) -> Result<EngineStatus, SessionError> {
        Ok(EngineStatus::default())
    }

    fn list_tables(&mut self, _libref: &str) -> Result<Vec<TableSummary>, SessionError> {
        Ok(Vec::new())
    }

    fn columns(&mut self, _dataset: &DatasetName) -> Result<Vec<ColumnInfo>, SessionError> {
        Ok(Vec::new())
    }

    fn fetch(&mut self, _request: &DataRequest) -> Result<DataTable, SessionError> {
        Ok(DataTable::default())
    }

    fn close(&mut self) -> Result<(), SessionError> {
        self.events.lock().unwrap().closed += 1;
        Ok(())
    }
}

/// How the factory refuses to open a session
#[derive(Clone, Copy)]
enum Refusal {
    None,
    MissingEngine,
    EngineDied,
}

struct MockFactory {
    events: Arc<Mutex<Events>>,
    refusal: Refusal,
}

impl SessionFactory for MockFactory {
    fn open(&self, config: &SessionConfig) -> Result<Box<dyn Session>, SessionError> {
        match self.refusal {
            Refusal::None => {}
            Refusal::MissingEngine => {
                return Err(SessionError::config(format!(
                    "saspath does not exist: {}",
                    config.saspath.display()
                )));
            }
            Refusal::EngineDied => return Err(SessionError::disconnected()),
        }
        self.events.lock().unwrap().opened += 1;
        Ok(Box::new(MockSession {
            events: Arc::clone(&self.events),
        }))
    }
}

fn container(refusal: Refusal) -> (ServiceContainer, Arc<Mutex<Events>>) {
    let events = Arc::new(Mutex::new(Events::default()));
    let factory = MockFactory {
        events: Arc::clone(&events),
        refusal,
    };
    let container =
        ServiceContainer::with_deps(Settings::default(), Arc::new(RealFileSystem), Arc::new(factory));
    (container, events)
}

// ============================================================
// with_session() tests
// ============================================================

#[test]
fn given_successful_work_when_with_session_then_session_closed() {
    let (container, events) = container(Refusal::None);

    let tables = container
        .with_session(|session| Ok(session.list_tables("WORK")?.len()))
        .unwrap();

    assert_eq!(tables, 0);
    let events = events.lock().unwrap();
    assert_eq!(events.opened, 1);
    assert_eq!(events.closed, 1);
}

#[test]
fn given_failing_work_when_with_session_then_session_still_closed() {
    let (container, events) = container(Refusal::None);

    let result: Result<(), _> = container
        .with_session(|_session| Err(ApplicationError::DatasetNotFound("WORK.NOPE".into())));

    assert!(matches!(result, Err(ApplicationError::DatasetNotFound(_))));
    assert_eq!(events.lock().unwrap().closed, 1);
}

#[test]
fn given_refused_session_when_with_session_then_config_error_and_work_skipped() {
    let (container, events) = container(Refusal::MissingEngine);
    let mut ran = false;

    let result = container.with_session(|_session| {
        ran = true;
        Ok(())
    });

    match result {
        Err(ApplicationError::Session(e)) => {
            assert!(e.is_config());
            assert!(e.to_string().contains("saspath does not exist: sas"));
        }
        other => panic!("expected session config error, got {other:?}"),
    }
    assert!(!ran);
    assert_eq!(events.lock().unwrap().opened, 0);
}

#[test]
fn given_engine_exiting_during_startup_when_with_session_then_connection_error() {
    let (container, events) = container(Refusal::EngineDied);
    let mut ran = false;

    let result = container.with_session(|_session| {
        ran = true;
        Ok(())
    });

    match result {
        Err(ApplicationError::Session(e)) => {
            assert!(matches!(e, SessionError::Connection(_)));
            assert!(!e.is_config());
        }
        other => panic!("expected session connection error, got {other:?}"),
    }
    assert!(!ran);
    assert_eq!(events.lock().unwrap().closed, 0);
}

#[test]
fn given_engine_exiting_during_startup_when_open_session_then_connection_error() {
    let (container, _events) = container(Refusal::EngineDied);

    let err = container.open_session().err().unwrap();

    assert!(matches!(
        err,
        ApplicationError::Session(SessionError::Connection(_))
    ));
}
