// src/system/executor.rs

use std::io::{self, Read, Write};
use std::process::{Command as StdCommand, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use thiserror::Error;

/// The transcript sink shared by the console, the run log and child process output.
pub type SharedSink = Arc<Mutex<dyn Write + Send>>;

/// Errors raised while spawning or streaming a command.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, #[source] io::Error),
    #[error("Output of command '{0}' could not be forwarded: {1}")]
    OutputForward(String, #[source] io::Error),
}

/// What an external process left behind once it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
}

impl ProcessOutput {
    /// True when the process exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs an argument vector to completion.
///
/// Implementations block until the process exits. A non-zero exit is reported through
/// [`ProcessOutput::code`], not as an error; errors are reserved for processes that
/// could not be run at all.
pub trait ProcessRunner {
    fn run(
        &mut self,
        argv: &[String],
        env_overrides: &[(&str, &str)],
    ) -> Result<ProcessOutput, ExecutionError>;
}

/// Renders an argument vector as a copy-pasteable shell line.
pub fn display_command(argv: &[String]) -> String {
    shlex::try_join(argv.iter().map(String::as_str)).unwrap_or_else(|_| argv.join(" "))
}

/// Writes `bytes` to the shared sink.
pub fn write_sink(sink: &SharedSink, bytes: &[u8]) -> io::Result<()> {
    let mut guard = sink
        .lock()
        .map_err(|_| io::Error::other("output sink lock poisoned"))?;
    guard.write_all(bytes)?;
    guard.flush()
}

/// Runs processes while streaming both of their output streams to a shared sink.
/// Stdout is additionally captured so the caller can inspect it.
#[derive(Clone)]
pub struct StreamingRunner {
    sink: SharedSink,
}

impl std::fmt::Debug for StreamingRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingRunner").finish_non_exhaustive()
    }
}

impl StreamingRunner {
    /// Creates a runner forwarding stdout and stderr to `sink`.
    pub fn new(sink: SharedSink) -> Self {
        Self { sink }
    }
}

impl ProcessRunner for StreamingRunner {
    fn run(
        &mut self,
        argv: &[String],
        env_overrides: &[(&str, &str)],
    ) -> Result<ProcessOutput, ExecutionError> {
        let (program, args) = argv.split_first().ok_or(ExecutionError::EmptyCommand)?;
        let command_line = display_command(argv);
        log::debug!("spawning: {}", command_line);

        let mut child = StdCommand::new(program)
            .args(args)
            .envs(env_overrides.iter().copied())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?;

        let mut stdout = child.stdout.take().ok_or_else(|| {
            ExecutionError::CommandFailed(command_line.clone(), io::Error::other("stdout was not piped"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            ExecutionError::CommandFailed(command_line.clone(), io::Error::other("stderr was not piped"))
        })?;

        // Stderr is drained on its own thread so neither pipe can fill up and block the child.
        let stderr_sink = Arc::clone(&self.sink);
        let stderr_handle = thread::spawn(move || forward_stream(stderr, &stderr_sink, None));

        let mut captured = Vec::new();
        let stdout_result = forward_stream(&mut stdout, &self.sink, Some(&mut captured));

        // The run has failed; a read error may also have left the child blocked on a full pipe.
        if stdout_result.is_err()
            && let Err(e) = child.kill()
        {
            log::debug!("could not kill '{}': {}", command_line, e);
        }

        let status = child
            .wait()
            .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?;
        let stderr_result = stderr_handle
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stderr forwarding thread panicked")));

        stdout_result.map_err(|e| ExecutionError::OutputForward(command_line.clone(), e))?;
        stderr_result.map_err(|e| ExecutionError::OutputForward(command_line.clone(), e))?;

        log::debug!("'{}' exited with {:?}", command_line, status.code());
        Ok(ProcessOutput {
            code: status.code(),
            stdout: captured,
        })
    }
}

/// Copies `stream` into the sink until EOF, optionally capturing it too.
///
/// A failed sink write does not stop the reading: the rest of the stream is still
/// drained (and captured) so the child can run to completion, and the first write
/// error is returned at EOF.
fn forward_stream(
    mut stream: impl Read,
    sink: &SharedSink,
    mut capture: Option<&mut Vec<u8>>,
) -> io::Result<()> {
    let mut buf = [0u8; 8192];
    let mut write_error: Option<io::Error> = None;
    loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return write_error.map_or(Ok(()), Err);
        }
        let chunk = buf.get(..n).unwrap_or_default();
        if write_error.is_none()
            && let Err(e) = write_sink(sink, chunk)
        {
            log::debug!("output sink failed, draining the rest: {}", e);
            write_error = Some(e);
        }
        if let Some(capture) = capture.as_deref_mut() {
            capture.extend_from_slice(chunk);
        }
    }
}

/// Output of a quiet, fully captured process run.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Executes a command and captures both output streams without streaming them anywhere.
/// Intended for short, non-interactive probes.
pub fn run_captured(
    argv: &[String],
    env_overrides: &[(&str, &str)],
) -> Result<CapturedOutput, ExecutionError> {
    let (program, args) = argv.split_first().ok_or(ExecutionError::EmptyCommand)?;
    let command_line = display_command(argv);

    let output = StdCommand::new(program)
        .args(args)
        .envs(env_overrides.iter().copied())
        .stdin(Stdio::null())
        .output()
        .map_err(|e| ExecutionError::CommandFailed(command_line, e))?;

    Ok(CapturedOutput {
        code: output.status.code(),
        stdout: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}
