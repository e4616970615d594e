//! Tests for Inspector (`data` and `lib` commands)

use std::sync::{Arc, Mutex};

use rstest::rstest;

use sascli::application::services::{DataOptions, Inspector};
use sascli::application::ApplicationError;
use sascli::config::{OutputConfig, Settings};
use sascli::domain::{
    ColumnInfo, ColumnKind, DataRequest, DataTable, DatasetName, DomainError, EngineStatus,
    SubmitOutput, TableSummary,
};
use sascli::infrastructure::traits::Session;
use sascli::infrastructure::SessionError;

// ============================================================
// Mock session
// ============================================================

#[derive(Debug, Default)]
struct Calls {
    list_tables: Vec<String>,
    columns: Vec<DatasetName>,
    fetch: Vec<DataRequest>,
}

#[derive(Default)]
struct MockSession {
    calls: Arc<Mutex<Calls>>,
    tables: Vec<TableSummary>,
    columns: Vec<ColumnInfo>,
    rows: DataTable,
}

impl MockSession {
    fn with_class_dataset() -> Self {
        Self {
            columns: vec![
                ColumnInfo {
                    name: "Name".into(),
                    kind: ColumnKind::Character,
                    length: 8,
                    format: String::new(),
                    label: String::new(),
                },
                ColumnInfo {
                    name: "Age".into(),
                    kind: ColumnKind::Numeric,
                    length: 8,
                    format: "BEST12.".into(),
                    label: "Age in years".into(),
                },
            ],
            rows: DataTable {
                columns: vec!["Name".into(), "Age".into()],
                rows: vec![
                    vec!["Alfred".into(), "14".into()],
                    vec!["Alice".into(), "13".into()],
                ],
            },
            ..Self::default()
        }
    }
}

impl Session for MockSession {
    fn submit(&mut self, _code: &str) -> Result<SubmitOutput, SessionError> {
        unimplemented!("not used by the inspector")
    }

    fn status(&mut self) -> Result<EngineStatus, SessionError> {
        unimplemented!("not used by the inspector")
    }

    fn list_tables(&mut self, libref: &str) -> Result<Vec<TableSummary>, SessionError> {
        self.calls.lock().unwrap().list_tables.push(libref.to_string());
        Ok(self.tables.clone())
    }

    fn columns(&mut self, dataset: &DatasetName) -> Result<Vec<ColumnInfo>, SessionError> {
        self.calls.lock().unwrap().columns.push(dataset.clone());
        Ok(self.columns.clone())
    }

    fn fetch(&mut self, request: &DataRequest) -> Result<DataTable, SessionError> {
        self.calls.lock().unwrap().fetch.push(request.clone());
        Ok(self.rows.clone())
    }

    fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

fn inspector() -> Inspector {
    Inspector::new(Arc::new(Settings::default()))
}

fn options(dataset: &str) -> DataOptions {
    DataOptions {
        dataset: dataset.into(),
        ..DataOptions::default()
    }
}

// ============================================================
// describe() tests
// ============================================================

#[rstest]
#[case(true, 0)]
#[case(false, 1)]
fn given_info_only_flag_when_describe_then_columns_once_and_fetch_as_needed(
    #[case] info_only: bool,
    #[case] expected_fetches: usize,
) {
    let mut session = MockSession::with_class_dataset();
    let calls = Arc::clone(&session.calls);
    let mut out = Vec::new();

    let code = inspector()
        .describe(
            &mut session,
            &DataOptions {
                info_only,
                ..options("sashelp.class")
            },
            &mut out,
        )
        .unwrap();

    assert_eq!(code, 0);
    let calls = calls.lock().unwrap();
    assert_eq!(calls.columns.len(), 1);
    assert_eq!(calls.columns[0].to_string(), "SASHELP.CLASS");
    assert_eq!(calls.fetch.len(), expected_fetches);

    let out = String::from_utf8(out).unwrap();
    assert!(out.starts_with("SASHELP.CLASS\n"));
    assert!(out.contains("Age in years"));
    assert_eq!(out.contains("Alfred"), !info_only);
}

#[test]
fn given_no_obs_when_describe_then_configured_default_applies() {
    let mut session = MockSession::with_class_dataset();
    let calls = Arc::clone(&session.calls);
    let settings = Settings {
        output: OutputConfig { obs: 3 },
        ..Settings::default()
    };

    Inspector::new(Arc::new(settings))
        .describe(&mut session, &options("class"), &mut Vec::new())
        .unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.fetch[0].obs, Some(3));
    assert_eq!(calls.fetch[0].dataset.libref, "WORK");
}

#[test]
fn given_filters_when_describe_then_forwarded_verbatim() {
    let mut session = MockSession::with_class_dataset();
    let calls = Arc::clone(&session.calls);
    let opts = DataOptions {
        libref: Some("mylib".into()),
        obs: Some(25),
        keep: vec!["name".into(), "age".into()],
        drop: vec!["height".into()],
        where_clause: Some("age > 12 and sex = 'F'".into()),
        ..options("other.class")
    };

    inspector()
        .describe(&mut session, &opts, &mut Vec::new())
        .unwrap();

    let calls = calls.lock().unwrap();
    let request = &calls.fetch[0];
    assert_eq!(request.dataset.to_string(), "MYLIB.CLASS", "--libref wins");
    assert_eq!(request.obs, Some(25));
    assert_eq!(request.keep, vec!["name", "age"]);
    assert_eq!(request.drop, vec!["height"]);
    assert_eq!(request.where_clause.as_deref(), Some("age > 12 and sex = 'F'"));
}

#[test]
fn given_no_matching_rows_when_describe_then_says_so() {
    let mut session = MockSession {
        rows: DataTable {
            columns: vec!["Name".into()],
            rows: Vec::new(),
        },
        ..MockSession::with_class_dataset()
    };
    let mut out = Vec::new();

    inspector()
        .describe(&mut session, &options("class"), &mut out)
        .unwrap();

    assert!(String::from_utf8(out).unwrap().ends_with("No rows selected\n"));
}

#[test]
fn given_unknown_dataset_when_describe_then_not_found_and_no_fetch() {
    let mut session = MockSession::default();
    let calls = Arc::clone(&session.calls);

    let result = inspector().describe(&mut session, &options("work.nope"), &mut Vec::new());

    match result {
        Err(ApplicationError::DatasetNotFound(name)) => assert_eq!(name, "WORK.NOPE"),
        other => panic!("expected DatasetNotFound, got {other:?}"),
    }
    assert!(calls.lock().unwrap().fetch.is_empty());
}

#[test]
fn given_invalid_dataset_name_when_describe_then_domain_error_before_engine() {
    let mut session = MockSession::default();
    let calls = Arc::clone(&session.calls);

    let result = inspector().describe(&mut session, &options("1bad.name"), &mut Vec::new());

    assert!(matches!(result, Err(ApplicationError::Domain(_))));
    assert!(calls.lock().unwrap().columns.is_empty());
}

// ============================================================
// list_library() tests
// ============================================================

#[test]
fn given_tables_when_list_library_then_prints_exactly_listing() {
    let mut session = MockSession {
        tables: vec![
            TableSummary {
                name: "CARS".into(),
                kind: "DATA".into(),
            },
            TableSummary {
                name: "CLASSFIT".into(),
                kind: "VIEW".into(),
            },
        ],
        ..MockSession::default()
    };
    let calls = Arc::clone(&session.calls);
    let mut out = Vec::new();

    let code = inspector()
        .list_library(&mut session, "sashelp", &mut out)
        .unwrap();

    assert_eq!(code, 0);
    assert_eq!(calls.lock().unwrap().list_tables, vec!["SASHELP"]);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "CARS      DATA\nCLASSFIT  VIEW\n"
    );
}

#[test]
fn given_empty_library_when_list_library_then_message_and_exit_zero() {
    let mut session = MockSession::default();
    let mut out = Vec::new();

    let code = inspector()
        .list_library(&mut session, "work", &mut out)
        .unwrap();

    assert_eq!(code, 0);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "No tables found in library WORK\n"
    );
}

#[test]
fn given_invalid_libref_when_list_library_then_error() {
    let mut session = MockSession::default();

    let result = inspector().list_library(&mut session, "waytoolongname", &mut Vec::new());

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidLibref(_)))
    ));
}
