//! Incremental reader for a log file that another process is still writing

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

/// Follows a growing log file and forwards complete lines to a sink.
#[derive(Debug)]
pub struct LogTail {
    path: PathBuf,
    offset: u64,
    pending: Vec<u8>,
}

impl LogTail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            pending: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read whatever was appended since the last poll.
    ///
    /// Only complete lines are written; a trailing partial line is kept until
    /// its newline arrives. A file that does not exist yet yields nothing.
    pub fn poll(&mut self, sink: &mut dyn Write) -> io::Result<usize> {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let len = file.metadata()?.len();
        if len < self.offset {
            debug!("log file shrank, restarting from top: {}", self.path.display());
            self.offset = 0;
            self.pending.clear();
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let mut buf = Vec::new();
        let read = file.read_to_end(&mut buf)?;
        self.offset += read as u64;
        self.pending.extend_from_slice(&buf);

        let mut emitted = 0;
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            write_line(sink, &line)?;
            emitted += 1;
        }
        if emitted > 0 {
            trace!("tail emitted {} lines", emitted);
            sink.flush()?;
        }
        Ok(emitted)
    }

    /// Final poll, then flush a pending partial line.
    pub fn finish(&mut self, sink: &mut dyn Write) -> io::Result<usize> {
        let mut emitted = self.poll(sink)?;
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            write_line(sink, &rest)?;
            sink.flush()?;
            emitted += 1;
        }
        Ok(emitted)
    }

    /// Poll every `interval` while `running` is set, then [`finish`](Self::finish).
    pub fn follow(
        &mut self,
        running: &AtomicBool,
        interval: Duration,
        sink: &mut dyn Write,
    ) -> io::Result<usize> {
        let mut emitted = 0;
        while running.load(Ordering::Acquire) {
            emitted += self.poll(sink)?;
            thread::sleep(interval);
        }
        emitted += self.finish(sink)?;
        debug!("tail finished: {} lines from {}", emitted, self.path.display());
        Ok(emitted)
    }
}

fn write_line(sink: &mut dyn Write, raw: &[u8]) -> io::Result<()> {
    let text = String::from_utf8_lossy(raw);
    sink.write_all(text.trim_end_matches(&['\r', '\n'][..]).as_bytes())?;
    sink.write_all(b"\n")
}
