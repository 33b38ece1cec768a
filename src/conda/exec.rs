//! Running the conda executable
//!
//! [`Executable`] is the seam between the build logic and the real `conda`
//! binary. The production implementation spawns the process with piped
//! output, streams each line to debug tracing as it arrives and hands the
//! collected lines back for error reporting.

use crate::error::{CondaEnvError, CondaEnvResult};
use async_trait::async_trait;
use std::ffi::OsString;
use std::fmt;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::debug;

/// Max number of output lines to include in error messages.
const ERROR_TAIL_LINES: usize = 50;

/// A single conda invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Arguments after the executable name
    pub args: Vec<String>,
    /// Extra environment variables, on top of the inherited environment
    pub env: Vec<(String, String)>,
}

impl Execution {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Value of an extra environment variable, if set
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Renders as the shell command a user would type, e.g.
/// `CONDA_PKGS_DIRS=/layers/cache conda clean --packages`
impl fmt::Display for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, value)?;
        }
        write!(f, "conda {}", self.args.join(" "))
    }
}

/// Result of a finished invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Combined stdout and stderr lines
    pub lines: Vec<String>,
}

impl ExecutionOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Human-readable reason for a failed invocation
    pub fn failure_reason(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }

    /// The useful tail of the output for diagnostics.
    ///
    /// Returns at most the last `ERROR_TAIL_LINES` lines so error messages
    /// stay actionable without being overwhelming.
    pub fn tail(&self) -> String {
        let start = self.lines.len().saturating_sub(ERROR_TAIL_LINES);
        self.lines[start..].join("\n")
    }
}

/// Runs an invocation of the package manager
#[async_trait]
pub trait Executable: Send + Sync {
    /// Run to completion.
    ///
    /// A non-zero exit is reported through [`ExecutionOutput`]; `Err` means
    /// the process could not be run at all.
    async fn execute(&self, execution: &Execution) -> CondaEnvResult<ExecutionOutput>;
}

/// Executes the real `conda` binary
#[derive(Debug, Clone)]
pub struct CondaExecutable {
    program: OsString,
}

impl CondaExecutable {
    /// `program` is a name looked up on `PATH` or a path to the binary
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CondaExecutable {
    fn default() -> Self {
        Self::new("conda")
    }
}

#[async_trait]
impl Executable for CondaExecutable {
    async fn execute(&self, execution: &Execution) -> CondaEnvResult<ExecutionOutput> {
        debug!("Executing: {}", execution);

        let mut child = Command::new(&self.program)
            .args(&execution.args)
            .envs(execution.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CondaEnvError::command_failed(execution.to_string(), e))?;

        let lines =
            stream_child_output(&mut child, &|line: &str| debug!("conda: {}", line)).await;

        let status = child
            .wait()
            .await
            .map_err(|e| CondaEnvError::command_failed(execution.to_string(), e))?;

        Ok(ExecutionOutput {
            code: status.code(),
            lines,
        })
    }
}

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Returns all collected output lines, interleaved in arrival order. Bytes
/// that are not valid UTF-8 are replaced rather than ending the stream, so
/// both pipes are always drained until the child closes them.
async fn stream_child_output(
    child: &mut Child,
    on_output: &(dyn Fn(&str) + Send + Sync),
) -> Vec<String> {
    let mut all_output = Vec::new();
    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return all_output;
    };

    let mut stdout_reader = BufReader::new(stdout);
    let mut stderr_reader = BufReader::new(stderr);
    // Partial reads survive a lost select! race in these buffers
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();
    let mut stdout_done = false;
    let mut stderr_done = false;

    while !stdout_done || !stderr_done {
        tokio::select! {
            read = stdout_reader.read_until(b'\n', &mut stdout_buf), if !stdout_done => {
                stdout_done = take_line(read, &mut stdout_buf, &mut all_output, on_output);
            }
            read = stderr_reader.read_until(b'\n', &mut stderr_buf), if !stderr_done => {
                stderr_done = take_line(read, &mut stderr_buf, &mut all_output, on_output);
            }
        }
    }

    all_output
}

/// Consume one `read_until` result. Returns `true` once the stream is finished.
fn take_line(
    read: std::io::Result<usize>,
    buf: &mut Vec<u8>,
    output: &mut Vec<String>,
    on_output: &(dyn Fn(&str) + Send + Sync),
) -> bool {
    match read {
        Ok(0) => true,
        Ok(_) => {
            if buf.ends_with(b"\n") {
                buf.pop();
                if buf.ends_with(b"\r") {
                    buf.pop();
                }
            }
            let line = String::from_utf8_lossy(buf).into_owned();
            buf.clear();
            on_output(&line);
            output.push(line);
            false
        }
        Err(e) => {
            debug!("Stopped reading conda output: {}", e);
            true
        }
    }
}
