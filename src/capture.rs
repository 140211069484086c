//! Capture of the output a test produces during one attempt.
//!
//! A [Capture] owns the stdout and stderr buffers for the whole run. The
//! tracker opens a scope when an attempt starts and closes it when the attempt
//! reaches a terminal state; the buffers are truncated on both edges so every
//! attempt sees fresh buffers. Tests only ever get `&mut Capture` for the
//! duration of their attempt, so at most one scope can be open at a time.
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, Write};
use tracing::warn;

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("valid ansi regex"));

// Prefix emitted by colored loggers in front of a `DESCRIBE:` line.
static DESCRIBE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*?DESCRIBE:\s*").expect("valid describe regex"));

/// Stream a chunk of test output was written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// In-memory buffers standing in for the process stdout/stderr of a test.
#[derive(Debug, Default)]
pub struct Capture {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    active: bool,
    /// Also echo captured writes to the real console.
    tee: bool,
}

impl Capture {
    pub fn new(tee: bool) -> Self {
        Self {
            tee,
            ..Self::default()
        }
    }

    /// Open a capture scope for a new attempt.
    pub(crate) fn begin(&mut self) {
        self.stdout.clear();
        self.stderr.clear();
        self.active = true;
    }

    /// Close the current scope and return the captured text, stdout first.
    /// Closing an already closed scope yields an empty string.
    pub(crate) fn end(&mut self) -> String {
        if !self.active {
            return String::new();
        }
        self.active = false;

        let mut text = clean(&decode(Stream::Stdout, &self.stdout));
        text.push_str(&clean(&decode(Stream::Stderr, &self.stderr)));

        self.stdout.clear();
        self.stderr.clear();
        text
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Append raw bytes to one of the streams. Writes outside of a scope are
    /// dropped.
    pub fn write_stream(&mut self, stream: Stream, bytes: &[u8]) {
        if self.tee {
            // Echo failures must not affect the attempt.
            let _ = match stream {
                Stream::Stdout => io::stdout().write_all(bytes),
                Stream::Stderr => io::stderr().write_all(bytes),
            };
        }
        if !self.active {
            return;
        }
        match stream {
            Stream::Stdout => self.stdout.extend_from_slice(bytes),
            Stream::Stderr => self.stderr.extend_from_slice(bytes),
        }
    }

    pub fn stdout(&mut self) -> Sink<'_> {
        Sink {
            capture: self,
            stream: Stream::Stdout,
        }
    }

    pub fn stderr(&mut self) -> Sink<'_> {
        Sink {
            capture: self,
            stream: Stream::Stderr,
        }
    }
}

/// [Write] handle for one captured stream.
pub struct Sink<'a> {
    capture: &'a mut Capture,
    stream: Stream,
}

impl Write for Sink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.capture.write_stream(self.stream, buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn decode(stream: Stream, bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(err) => {
            warn!(?stream, %err, "captured output is not valid UTF-8");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Normalize line endings and scrub logger noise from error and describe
/// lines. Non-empty output always ends with a newline.
fn clean(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut buf = String::with_capacity(text.len() + 1);
    for line in text.replace("\r\n", "\n").split_terminator('\n') {
        if line.contains("DESCRIBE:") {
            let plain = ANSI_ESCAPE.replace_all(line, "");
            buf.push_str(&DESCRIBE_PREFIX.replace(&plain, ""));
        } else if line.contains("ERROR:") {
            buf.push_str(&ANSI_ESCAPE.replace_all(line, ""));
        } else {
            buf.push_str(line);
        }
        buf.push('\n');
    }
    buf
}
