//! Program submission service
//!
//! Reads a program file, submits it and turns the engine's post-run status
//! into an exit code. With live logging the submission runs on a worker
//! thread while the caller's thread tails the run log.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::Local;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::application::services::tail::LogTail;
use crate::application::validate::has_program_extension;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt, ValidationError};
use crate::config::Settings;
use crate::domain::{program, SubmitOutput};
use crate::exitcode;
use crate::infrastructure::traits::{FileSystem, Session};

/// Submits program files and reports engine errors.
pub struct ProgramRunner {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

/// Clears the running flag when the worker finishes, panics included.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ProgramRunner {
    /// Create a new program runner.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Submit `program` and return the process exit code.
    ///
    /// Listing output goes to `out`. When the engine reports an error, the
    /// log (unless it was already shown live) and a message with the error
    /// code and text go to `err` and the result is [`exitcode::FAILURE`].
    #[instrument(skip(self, session, out, err))]
    pub fn run(
        &self,
        session: &mut dyn Session,
        program: &Path,
        show_log: bool,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> ApplicationResult<i32> {
        if !has_program_extension(program) {
            return Err(ValidationError::InvalidProgramFile(program.to_path_buf()).into());
        }
        let code = self
            .fs
            .read_to_string(program)
            .with_path_context("read program", program)?;
        debug!("run: {} bytes from {}", code.len(), program.display());

        let output = if show_log {
            self.submit_with_live_log(session, &code, out)?
        } else {
            session.submit(&code)?
        };
        write_block(out, &output.listing)?;

        let status = session.status()?;
        if status.is_error() {
            warn!("engine reported an error: {}", status);
            if !show_log {
                write_block(err, &output.log)?;
            }
            let headline = if status.is_warning() {
                format!("SAS reported SYSERR={} (warning)", status.code)
            } else {
                format!("SAS reported an error (SYSERR={})", status.code)
            };
            let text = status.text.trim();
            if text.is_empty() {
                writeln!(err, "{headline}")
            } else {
                writeln!(err, "{headline}: {text}")
            }
            .with_context("write error")?;
            return Ok(exitcode::FAILURE);
        }

        info!("program finished without errors");
        Ok(exitcode::OK)
    }

    fn submit_with_live_log(
        &self,
        session: &mut dyn Session,
        code: &str,
        out: &mut dyn Write,
    ) -> ApplicationResult<SubmitOutput> {
        let (remote_dir, local_dir) =
            self.settings
                .logging
                .live_dirs()
                .ok_or_else(|| ApplicationError::Config {
                    message: "--show-log needs remote_dir and local_dir in the [LOGGING] section"
                        .into(),
                })?;
        if !self.fs.is_dir(local_dir) {
            return Err(ApplicationError::Config {
                message: format!("local log directory not found: {}", local_dir.display()),
            });
        }

        let name = run_log_name();
        let remote_path = join_remote(remote_dir, &name);
        let wrapped = program::wrap_with_printto(code, &remote_path);
        let mut tail = LogTail::new(local_dir.join(&name));
        let interval = self.settings.logging.poll_interval();
        info!("engine log: {} (local {})", remote_path, tail.path().display());

        let running = AtomicBool::new(true);
        thread::scope(|scope| -> ApplicationResult<SubmitOutput> {
            let worker = scope.spawn(|| {
                let _guard = RunningGuard(&running);
                session.submit(&wrapped)
            });

            let tailed = tail.follow(&running, interval, out);
            let submitted = worker
                .join()
                .map_err(|_| ApplicationError::WorkerPanicked)?;
            tailed.with_context("follow run log")?;
            Ok(submitted?)
        })
    }
}

/// Unique run log file name.
fn run_log_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!(
        "sascli-{}-{}.log",
        Local::now().format("%Y%m%d-%H%M%S"),
        &id[..8]
    )
}

/// Join on the engine host, which may not share this machine's separator.
fn join_remote(dir: &str, name: &str) -> String {
    let sep = if dir.contains('\\') && !dir.contains('/') {
        '\\'
    } else {
        '/'
    };
    format!("{}{}{}", dir.trim_end_matches(&['/', '\\'][..]), sep, name)
}

fn write_block(sink: &mut dyn Write, text: &str) -> ApplicationResult<()> {
    if text.trim().is_empty() {
        return Ok(());
    }
    sink.write_all(text.as_bytes())
        .and_then(|_| {
            if text.ends_with('\n') {
                Ok(())
            } else {
                sink.write_all(b"\n")
            }
        })
        .written()
}
