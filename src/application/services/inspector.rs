//! Library and dataset inspection service

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::table::{render_columns, render_rows, render_tables};
use crate::domain::{validate_libref, DataRequest, DatasetName};
use crate::exitcode;
use crate::infrastructure::traits::Session;

/// Filters for a dataset query, as given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataOptions {
    /// `[libref.]table`
    pub dataset: String,
    pub libref: Option<String>,
    /// Row limit; the configured default applies when unset
    pub obs: Option<usize>,
    pub keep: Vec<String>,
    pub drop: Vec<String>,
    pub where_clause: Option<String>,
    /// Show column information only
    pub info_only: bool,
}

/// Prints library listings, column information and sample rows.
pub struct Inspector {
    settings: Arc<Settings>,
}

impl Inspector {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Print column information and, unless `info_only`, the selected rows.
    #[instrument(skip(self, session, out))]
    pub fn describe(
        &self,
        session: &mut dyn Session,
        options: &DataOptions,
        out: &mut dyn Write,
    ) -> ApplicationResult<i32> {
        let dataset = DatasetName::parse(&options.dataset, options.libref.as_deref())?;

        let columns = session.columns(&dataset)?;
        if columns.is_empty() {
            return Err(ApplicationError::DatasetNotFound(dataset.to_string()));
        }
        debug!("{}: {} columns", dataset, columns.len());

        writeln!(out, "{dataset}").written()?;
        out.write_all(render_columns(&columns).as_bytes())
            .written()?;

        if options.info_only {
            return Ok(exitcode::OK);
        }

        let request = DataRequest {
            obs: Some(options.obs.unwrap_or(self.settings.output.obs)),
            keep: options.keep.clone(),
            drop: options.drop.clone(),
            where_clause: options.where_clause.clone(),
            ..DataRequest::new(dataset)
        };
        let table = session.fetch(&request)?;
        debug!("fetched {} rows", table.rows.len());

        writeln!(out).written()?;
        if table.is_empty() {
            writeln!(out, "No rows selected").written()?;
        } else {
            out.write_all(render_rows(&table).as_bytes())
                .written()?;
        }
        Ok(exitcode::OK)
    }

    /// Print the members of a library, one per line.
    #[instrument(skip(self, session, out))]
    pub fn list_library(
        &self,
        session: &mut dyn Session,
        libref: &str,
        out: &mut dyn Write,
    ) -> ApplicationResult<i32> {
        let libref = validate_libref(libref)?;
        let tables = session.list_tables(&libref)?;
        debug!("{}: {} members", libref, tables.len());

        if tables.is_empty() {
            writeln!(out, "No tables found in library {libref}").written()?;
        } else {
            out.write_all(render_tables(&tables).as_bytes())
                .written()?;
        }
        Ok(exitcode::OK)
    }
}
