//! Domain entities: core data structures

use std::fmt;

use crate::domain::error::{DomainError, DomainResult};

/// Libref used when a dataset name carries none.
pub const DEFAULT_LIBREF: &str = "WORK";

const MAX_LIBREF_LEN: usize = 8;
const MAX_MEMBER_LEN: usize = 32;

/// Post-submission status reported by the engine (`SYSERR` / `SYSERRORTEXT`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStatus {
    pub code: i64,
    pub text: String,
}

impl EngineStatus {
    pub fn new(code: i64, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    /// Any non-zero code or any error text counts as a failed run.
    pub fn is_error(&self) -> bool {
        self.code != 0 || !self.text.trim().is_empty()
    }

    /// Codes 1 to 4 are warnings. They still fail the run.
    pub fn is_warning(&self) -> bool {
        (1..5).contains(&self.code)
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.text.trim();
        if text.is_empty() {
            write!(f, "SYSERR={}", self.code)
        } else {
            write!(f, "SYSERR={}: {}", self.code, text)
        }
    }
}

/// Log and listing produced by one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOutput {
    pub log: String,
    pub listing: String,
}

/// A member of a library as reported by the engine's dictionary tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub name: String,
    /// Member type, e.g. `DATA` or `VIEW`
    pub kind: String,
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Character,
}

impl ColumnKind {
    /// Parse the engine's one-word type (`num` / `char`).
    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "num" | "numeric" => Ok(Self::Numeric),
            "char" | "character" => Ok(Self::Character),
            other => Err(DomainError::MalformedResponse {
                message: format!("unknown column type '{other}'"),
            }),
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => f.write_str("Num"),
            Self::Character => f.write_str("Char"),
        }
    }
}

/// Column metadata of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
    pub length: u32,
    pub format: String,
    pub label: String,
}

/// Fully qualified `LIBREF.TABLE` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetName {
    pub libref: String,
    pub table: String,
}

impl DatasetName {
    /// Parse `[libref.]table`.
    ///
    /// An explicit `libref_override` replaces any libref contained in `input`.
    /// Names are upper-cased, which is how the engine's dictionary stores them.
    pub fn parse(input: &str, libref_override: Option<&str>) -> DomainResult<Self> {
        let input = input.trim();
        let (libref, table) = match input.split_once('.') {
            Some((lib, table)) => (Some(lib), table),
            None => (None, input),
        };

        let libref = match libref_override.or(libref) {
            Some(lib) => validate_libref(lib)?,
            None => DEFAULT_LIBREF.to_string(),
        };

        if !is_sas_name(table, MAX_MEMBER_LEN) {
            return Err(DomainError::InvalidDatasetName(input.to_string()));
        }

        Ok(Self {
            libref,
            table: table.to_ascii_uppercase(),
        })
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.libref, self.table)
    }
}

/// Row query against a dataset. Filter values are passed to the engine verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub dataset: DatasetName,
    pub obs: Option<usize>,
    pub keep: Vec<String>,
    pub drop: Vec<String>,
    pub where_clause: Option<String>,
}

impl DataRequest {
    pub fn new(dataset: DatasetName) -> Self {
        Self {
            dataset,
            obs: None,
            keep: Vec::new(),
            drop: Vec::new(),
            where_clause: None,
        }
    }
}

/// Rows fetched from a dataset, all values rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Validate a libref and return its upper-cased form.
pub fn validate_libref(libref: &str) -> DomainResult<String> {
    let libref = libref.trim();
    if is_sas_name(libref, MAX_LIBREF_LEN) {
        Ok(libref.to_ascii_uppercase())
    } else {
        Err(DomainError::InvalidLibref(libref.to_string()))
    }
}

fn is_sas_name(name: &str, max_len: usize) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= max_len && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Expand environment variables in a path string.
///
/// Supports `$VAR`, `${VAR}` and `~` for the home directory.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
