//! SAS code generation and log parsing
//!
//! Metadata queries are sent to the engine as ordinary programs. Their results
//! are written to the log behind a line prefix and read back from there, so the
//! only channel the session needs is "submit code, get log and listing".

use itertools::Itertools;

use crate::domain::entities::{
    ColumnInfo, ColumnKind, DataRequest, DataTable, DatasetName, EngineStatus, TableSummary,
};
use crate::domain::error::{DomainError, DomainResult};

const SYSERR_PREFIX: &str = "SASCLI_SYSERR=";
const SYSERRORTEXT_PREFIX: &str = "SASCLI_SYSERRORTEXT=";
const TABLE_TAG: &str = "SASCLI_TBL";
const COLUMN_TAG: &str = "SASCLI_COL";
const ROW_TAG: &str = "SASCLI_ROW";

/// Follows a tag on the last (or only) chunk of a record.
const LAST_CHUNK: char = ':';
/// Follows a tag on a chunk that the next tagged line continues.
const MORE_CHUNK: char = '>';
/// Payload characters per log line. Tag plus chunk stays under the minimum
/// `LINESIZE` of 64.
const CHUNK_WIDTH: usize = 50;

const SAVED_SYSERR: &str = "sascli_syserr";
const SAVED_SYSERRORTEXT: &str = "sascli_syserrortext";

/// Closes any open quote, comment or statement left behind by user code.
const STATEMENT_RESET: &str = ";*';*\";*/;";

/// Append the end-of-submission block to `code`.
///
/// The block saves `SYSERR`/`SYSERRORTEXT` of the submitted code before any
/// step of its own runs, restores default log routing, reopens the listing
/// destination in case the code closed it, then writes a marker to the
/// listing (`file print`) and to the log (`%put`). The log marker is always
/// written; the listing marker can still go missing.
pub fn terminate_with_marker(code: &str, marker: &str) -> String {
    format!(
        "{code}\n{STATEMENT_RESET}\n\
         %let {SAVED_SYSERR}=&syserr;\n\
         %let {SAVED_SYSERRORTEXT}=%superq(syserrortext);\n\
         proc printto; run;\n\
         ods listing;\n\
         data _null_; file print notitles; put \"{marker}\"; run;\n\
         %put {marker};\n"
    )
}

/// Whether an engine output line is the end-of-submission marker.
///
/// Source echo lines in the log start with a line number, so only the output
/// of the `%put` / `put` matches.
pub fn is_marker_line(line: &str, marker: &str) -> bool {
    line.trim_start().starts_with(marker)
}

/// Route the log of `code` into `log_path` on the engine host.
///
/// Routing stays active until the end-of-submission block of
/// [`terminate_with_marker`] resets it, so the saved status still belongs to
/// `code`.
pub fn wrap_with_printto(code: &str, log_path: &str) -> String {
    format!(
        "proc printto log=\"{}\" new; run;\n{code}\n",
        quote_escape(log_path)
    )
}

/// Program that prints the last error code and text to the log.
///
/// Reads the values saved by the previous submission's end block.
pub fn status_query() -> String {
    format!(
        "%put {SYSERR_PREFIX}&{SAVED_SYSERR};\n%put {SYSERRORTEXT_PREFIX}&{SAVED_SYSERRORTEXT};\n"
    )
}

/// Parse the log of [`status_query`].
pub fn parse_status(log: &str) -> DomainResult<EngineStatus> {
    let mut code = None;
    let mut text = String::new();

    for line in log.lines() {
        if let Some(value) = line.strip_prefix(SYSERR_PREFIX) {
            let value = value.trim();
            code = Some(value.parse::<i64>().map_err(|_| DomainError::MalformedResponse {
                message: format!("SYSERR is not a number: '{value}'"),
            })?);
        } else if let Some(value) = line.strip_prefix(SYSERRORTEXT_PREFIX) {
            text = value.trim().to_string();
        }
    }

    code.map(|code| EngineStatus { code, text })
        .ok_or_else(|| DomainError::MalformedResponse {
            message: "no SYSERR value in log".into(),
        })
}

/// Program listing the members of a library.
pub fn list_tables_query(libref: &str) -> String {
    format!(
        "data _null_;\n\
         \x20 set sashelp.vtable(where=(libname=\"{libref}\"));\n\
         \x20 length __line $200;\n\
         \x20 __line = cat(strip(memname), '|', strip(memtype));\n\
         {put}\
         run;\n",
        put = put_chunked(TABLE_TAG),
    )
}

/// Parse the log of [`list_tables_query`].
pub fn parse_tables(log: &str) -> DomainResult<Vec<TableSummary>> {
    tagged_records(log, TABLE_TAG)
        .into_iter()
        .map(|payload| {
            let (name, kind) =
                payload
                    .split_once('|')
                    .ok_or_else(|| DomainError::MalformedResponse {
                        message: format!("table line without type: '{payload}'"),
                    })?;
            Ok(TableSummary {
                name: name.trim().to_string(),
                kind: kind.trim().to_string(),
            })
        })
        .collect()
}

/// Program describing the columns of a dataset.
pub fn columns_query(dataset: &DatasetName) -> String {
    format!(
        "data _null_;\n\
         \x20 set sashelp.vcolumn(where=(libname=\"{lib}\" and memname=\"{table}\"));\n\
         \x20 length __line $1000;\n\
         \x20 __line = cat(strip(name), '|', strip(type), '|', strip(put(length, best.)), '|',\n\
         \x20              strip(format), '|', strip(label));\n\
         {put}\
         run;\n",
        lib = dataset.libref,
        table = dataset.table,
        put = put_chunked(COLUMN_TAG),
    )
}

/// Parse the log of [`columns_query`].
pub fn parse_columns(log: &str) -> DomainResult<Vec<ColumnInfo>> {
    tagged_records(log, COLUMN_TAG)
        .into_iter()
        .map(|payload| {
            let fields: Vec<&str> = payload.splitn(5, '|').collect();
            if fields.len() < 5 {
                return Err(DomainError::MalformedResponse {
                    message: format!("column line has {} fields: '{payload}'", fields.len()),
                });
            }
            let length = fields[2]
                .trim()
                .parse::<u32>()
                .map_err(|_| DomainError::MalformedResponse {
                    message: format!("column length is not a number: '{}'", fields[2]),
                })?;
            Ok(ColumnInfo {
                name: fields[0].trim().to_string(),
                kind: ColumnKind::parse(fields[1])?,
                length,
                format: fields[3].trim().to_string(),
                label: fields[4].trim().to_string(),
            })
        })
        .collect()
}

/// Dataset options for a request, e.g. `(obs=10 keep=a b where=(x > 1))`.
///
/// Empty when no filter is set.
pub fn dataset_options(request: &DataRequest) -> String {
    let mut options = Vec::new();
    if let Some(obs) = request.obs {
        options.push(format!("obs={obs}"));
    }
    if !request.keep.is_empty() {
        options.push(format!("keep={}", request.keep.iter().join(" ")));
    }
    if !request.drop.is_empty() {
        options.push(format!("drop={}", request.drop.iter().join(" ")));
    }
    if let Some(clause) = request.where_clause.as_deref().filter(|c| !c.trim().is_empty()) {
        options.push(format!("where=({clause})"));
    }

    if options.is_empty() {
        String::new()
    } else {
        format!("({})", options.join(" "))
    }
}

/// Program exporting the requested rows as tab-separated lines into the log.
pub fn fetch_query(request: &DataRequest) -> String {
    format!(
        "filename __sasout temp;\n\
         proc export data={dataset}{options} outfile=__sasout dbms=tab replace;\n\
         \x20 putnames=yes;\n\
         run;\n\
         data _null_;\n\
         \x20 infile __sasout lrecl=32767;\n\
         \x20 input;\n\
         \x20 length __line $32767;\n\
         \x20 __line = _infile_;\n\
         {put}\
         run;\n\
         filename __sasout clear;\n",
        dataset = request.dataset,
        options = dataset_options(request),
        put = put_chunked(ROW_TAG),
    )
}

/// Parse the log of [`fetch_query`]. The first exported line is the header.
pub fn parse_rows(log: &str) -> DataTable {
    let mut lines = tagged_records(log, ROW_TAG)
        .into_iter()
        .map(|record| split_tab_record(&record));
    let columns = lines.next().unwrap_or_default();
    DataTable {
        columns,
        rows: lines.collect(),
    }
}

/// Data step statements writing `__line` to the log in tagged chunks.
///
/// Each chunk is put at a fixed column behind its tag, so blanks at a chunk
/// boundary survive. `$varying` writes exactly `__clen` characters.
fn put_chunked(tag: &str) -> String {
    let column = tag.len() + 2;
    format!(
        "\x20 length __chunk ${w};\n\
         \x20 __len = lengthn(__line);\n\
         \x20 if __len = 0 then put @1 \"{tag}{LAST_CHUNK}\";\n\
         \x20 do __pos = 1 to __len by {w};\n\
         \x20   __clen = min({w}, __len - __pos + 1);\n\
         \x20   __chunk = substr(__line, __pos, __clen);\n\
         \x20   if __pos + __clen > __len then\n\
         \x20     put @1 \"{tag}{LAST_CHUNK}\" @{column} __chunk $varying{w}. __clen;\n\
         \x20   else put @1 \"{tag}{MORE_CHUNK}\" @{column} __chunk $varying{w}. __clen;\n\
         \x20 end;\n",
        w = CHUNK_WIDTH,
    )
}

/// Records written by [`put_chunked`] under `tag`, continuation chunks joined.
///
/// Source echo lines start with a line number and never match. A record cut
/// off without its last chunk is kept as far as it got.
fn tagged_records(log: &str, tag: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut pending = String::new();

    for line in log.lines() {
        let Some(rest) = line.trim_start_matches('\u{c}').strip_prefix(tag) else {
            continue;
        };
        let rest = rest.trim_end_matches('\r');
        if let Some(chunk) = rest.strip_prefix(MORE_CHUNK) {
            pending.push_str(chunk);
        } else if let Some(chunk) = rest.strip_prefix(LAST_CHUNK) {
            pending.push_str(chunk);
            records.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        records.push(pending);
    }
    records
}

fn split_tab_record(line: &str) -> Vec<String> {
    line.split('\t').map(|v| unquote(v.trim_end())).collect()
}

fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value[1..value.len() - 1].replace("\"\"", "\"")
    } else {
        value.to_string()
    }
}

fn quote_escape(s: &str) -> String {
    s.replace('"', "\"\"")
}
