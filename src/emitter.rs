//! Build log output
//!
//! Buildpack output is read by people scrolling through `pack build` logs,
//! so every message is written at a fixed indentation level:
//!
//! ```text
//! Conda Env Update Buildpack 0.3.0
//!   Executing build process
//!     Running conda create ...
//!       Completed in 1.52s
//! ```
//!
//! Messages are also forwarded to `tracing` at debug level.

use console::Style;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing::debug;

const PROCESS_INDENT: usize = 2;
const SUBPROCESS_INDENT: usize = 4;
const ACTION_INDENT: usize = 6;
const DETAIL_INDENT: usize = 8;

/// Writes indented build log lines to a shared sink
#[derive(Clone)]
pub struct Emitter {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
    color: bool,
}

impl Emitter {
    /// Emitter writing plain text to an arbitrary sink
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
            color: false,
        }
    }

    /// Emitter writing to stdout, styled when the terminal supports it
    pub fn stdout() -> Self {
        let color = console::Term::stdout().features().colors_supported();
        Self {
            out: Arc::new(Mutex::new(Box::new(io::stdout()))),
            color,
        }
    }

    /// Buildpack name and version banner
    pub fn title(&self, message: impl fmt::Display) {
        let style = Style::new().blue().bold().force_styling(self.color);
        self.write_line(0, &style.apply_to(message.to_string()).to_string());
    }

    /// A phase of the build (e.g. "Executing build process")
    pub fn process(&self, message: impl fmt::Display) {
        self.write_line(PROCESS_INDENT, &message.to_string());
    }

    /// A command being run within a phase
    pub fn subprocess(&self, message: impl fmt::Display) {
        self.write_line(SUBPROCESS_INDENT, &message.to_string());
    }

    /// Outcome of a step (timing, failures)
    pub fn action(&self, message: impl fmt::Display) {
        self.write_line(ACTION_INDENT, &message.to_string());
    }

    /// Multi-line detail such as captured command output
    pub fn detail(&self, message: impl fmt::Display) {
        let message = message.to_string();
        let style = Style::new().dim().force_styling(self.color);
        for line in message.lines() {
            self.write_line(DETAIL_INDENT, &style.apply_to(line).to_string());
        }
    }

    /// Empty separator line
    pub fn break_line(&self) {
        self.write_raw("\n");
    }

    fn write_line(&self, indent: usize, message: &str) {
        debug!("{}", message);
        self.write_raw(&format!("{:indent$}{}\n", "", message, indent = indent));
    }

    // Log output is best effort: a closed pipe must not fail the build.
    fn write_raw(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            out.write_all(text.as_bytes()).ok();
            out.flush().ok();
        }
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

/// In-memory sink that can be read back after handing a clone to an `Emitter`
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self
            .0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?;
        inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
