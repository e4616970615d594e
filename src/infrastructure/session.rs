//! Line-mode engine backend
//!
//! Drives the engine's `-stdio` mode: program text goes to stdin, the log comes
//! back on stderr and the listing on stdout. Each stream is drained by its own
//! reader thread into a channel so neither pipe can fill up while the other
//! one is being read.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::domain::program;
use crate::domain::{
    ColumnInfo, DataRequest, DataTable, DatasetName, EngineStatus, SubmitOutput, TableSummary,
};
use crate::infrastructure::traits::{Session, SessionFactory};
use crate::infrastructure::SessionError;

/// Engine arguments for a non-interactive line-mode session.
pub const STDIO_ARGS: &[&str] = &[
    "-nodms",
    "-stdio",
    "-terminal",
    "-nosyntaxcheck",
    "-pagesize",
    "MAX",
    "-linesize",
    "MAX",
    "-nonews",
];

/// Start of every end-of-submission marker.
const MARKER_PREFIX: &str = "SASCLI_END_";

/// How long the listing may trail the log marker before it is cut off.
const LISTING_GRACE: Duration = Duration::from_secs(3);

/// Opens [`StdioSession`]s.
#[derive(Debug, Default)]
pub struct StdioSessionFactory;

impl SessionFactory for StdioSessionFactory {
    fn open(&self, config: &SessionConfig) -> Result<Box<dyn Session>, SessionError> {
        Ok(Box::new(StdioSession::spawn(config)?))
    }
}

/// Session backed by a child engine process.
pub struct StdioSession {
    child: Child,
    stdin: Option<ChildStdin>,
    log: Receiver<String>,
    listing: Receiver<String>,
    readers: Vec<JoinHandle<()>>,
}

impl StdioSession {
    /// Start the engine and wait until it answers a first (empty) submission.
    #[instrument(skip(config), fields(saspath = %config.saspath.display()))]
    pub fn spawn(config: &SessionConfig) -> Result<Self, SessionError> {
        let saspath = &config.saspath;
        if saspath.as_os_str().is_empty() {
            return Err(SessionError::config("saspath is not set"));
        }
        // bare program names are looked up on PATH by the OS
        if saspath.components().count() > 1 && !saspath.is_file() {
            return Err(SessionError::config(format!(
                "saspath does not exist: {}",
                saspath.display()
            )));
        }

        let args = config.extra_args();
        debug!("spawning engine with {:?} {:?}", STDIO_ARGS, args);
        let mut child = Command::new(saspath)
            .args(STDIO_ARGS)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                    SessionError::config(format!("cannot start {}: {}", saspath.display(), e))
                }
                _ => SessionError::Connection(e),
            })?;

        let stdin = child.stdin.take();
        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(out), Some(err)) => (out, err),
            _ => {
                let _ = child.kill();
                return Err(SessionError::Connection(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "engine pipes not available",
                )));
            }
        };

        let (log_tx, log) = mpsc::channel();
        let (listing_tx, listing) = mpsc::channel();
        let readers = vec![
            spawn_reader("sas-log", stderr, log_tx).map_err(SessionError::Connection)?,
            spawn_reader("sas-listing", stdout, listing_tx).map_err(SessionError::Connection)?,
        ];

        let mut session = Self {
            child,
            stdin,
            log,
            listing,
            readers,
        };
        session.submit("")?;
        info!("engine session started");
        Ok(session)
    }

    fn submit_for_log(&mut self, code: &str) -> Result<String, SessionError> {
        Ok(self.submit(code)?.log)
    }
}

impl Session for StdioSession {
    fn submit(&mut self, code: &str) -> Result<SubmitOutput, SessionError> {
        let marker = format!("{MARKER_PREFIX}{}", Uuid::new_v4().simple());
        let text = program::terminate_with_marker(code, &marker);

        let stdin = self.stdin.as_mut().ok_or_else(|| {
            SessionError::Connection(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "session already closed",
            ))
        })?;
        stdin
            .write_all(text.as_bytes())
            .and_then(|_| stdin.flush())
            .map_err(SessionError::Connection)?;
        debug!("submitted {} bytes, waiting for {}", text.len(), marker);

        // the %put marker always reaches the log; the listing one needs ODS
        let log = collect_until(&self.log, &marker)?;
        let listing = drain_listing(&self.listing, &marker, LISTING_GRACE)?;
        Ok(SubmitOutput { log, listing })
    }

    fn status(&mut self) -> Result<EngineStatus, SessionError> {
        let log = self.submit_for_log(&program::status_query())?;
        Ok(program::parse_status(&log)?)
    }

    fn list_tables(&mut self, libref: &str) -> Result<Vec<TableSummary>, SessionError> {
        let log = self.submit_for_log(&program::list_tables_query(libref))?;
        Ok(program::parse_tables(&log)?)
    }

    fn columns(&mut self, dataset: &DatasetName) -> Result<Vec<ColumnInfo>, SessionError> {
        let log = self.submit_for_log(&program::columns_query(dataset))?;
        Ok(program::parse_columns(&log)?)
    }

    fn fetch(&mut self, request: &DataRequest) -> Result<DataTable, SessionError> {
        let log = self.submit_for_log(&program::fetch_query(request))?;
        Ok(program::parse_rows(&log))
    }

    fn close(&mut self) -> Result<(), SessionError> {
        let Some(mut stdin) = self.stdin.take() else {
            return Ok(());
        };
        if let Err(e) = stdin.write_all(b";*';*\";*/;\nendsas;\n") {
            warn!("could not send endsas: {}", e);
        }
        drop(stdin);

        let status = self.child.wait().map_err(SessionError::Connection)?;
        for reader in self.readers.drain(..) {
            let _ = reader.join();
        }
        info!("engine session ended: {}", status);
        Ok(())
    }
}

impl Drop for StdioSession {
    fn drop(&mut self) {
        if self.stdin.is_some() {
            debug!("session dropped without close, killing engine");
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    name: &str,
    stream: R,
    tx: Sender<String>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name(name.to_string()).spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(&['\r', '\n'][..])
                        .to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

/// Receive lines up to (not including) the marker line.
fn collect_until(rx: &Receiver<String>, marker: &str) -> Result<String, SessionError> {
    let mut out = String::new();
    loop {
        let line = rx.recv().map_err(|_| SessionError::disconnected())?;
        if program::is_marker_line(&line, marker) {
            return Ok(out);
        }
        out.push_str(&line);
        out.push('\n');
    }
}

/// Receive listing lines up to the marker, waiting at most `grace` per line.
///
/// Markers of earlier submissions that arrived late are dropped.
fn drain_listing(
    rx: &Receiver<String>,
    marker: &str,
    grace: Duration,
) -> Result<String, SessionError> {
    let mut out = String::new();
    loop {
        let line = match rx.recv_timeout(grace) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => {
                warn!("listing marker not seen within {:?}, listing may be incomplete", grace);
                return Ok(out);
            }
            Err(RecvTimeoutError::Disconnected) => return Err(SessionError::disconnected()),
        };
        if program::is_marker_line(&line, marker) {
            return Ok(out);
        }
        if program::is_marker_line(&line, MARKER_PREFIX) {
            debug!("dropping stale listing marker {}", line.trim());
            continue;
        }
        out.push_str(&line);
        out.push('\n');
    }
}
