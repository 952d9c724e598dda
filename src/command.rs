//! Running external administration CLIs (`qconf`, `glsproject`, `ldapsearch`, ...).
//!
//! Both output pipes are drained on their own threads, and both readers are
//! joined before the exit status is collected, so a chatty command can never
//! block on a full pipe. There is no timeout: a hung command hangs the run.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread;

use tracing::debug;

use crate::error::AclError;

/// A single external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Added on top of the inherited environment.
    pub env: Vec<(String, String)>,
    /// Indexes into `args` that are masked when displayed.
    redacted: Vec<usize>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            redacted: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// An argument that must not show up in logs or error messages.
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.redacted.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl Display for Invocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.program)?;
        for (idx, arg) in self.args.iter().enumerate() {
            if self.redacted.contains(&idx) {
                write!(f, " ****")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Captured output of a command that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

/// Executes invocations. Adapters take this as a seam so they can be driven
/// by a scripted runner in tests.
pub trait CommandRunner: Send + Sync {
    /// Run to completion. A non-zero exit status is an error.
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, AclError>;
}

/// Runs commands as child processes of this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, AclError> {
        debug!(event = "Command", phase = "Start", command = %invocation);

        let command_error = |message: String, stderr: String| AclError::Command {
            command: invocation.to_string(),
            message,
            stderr,
        };

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| command_error(format!("could not start: {e}"), String::new()))?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let (stdout, stderr) = thread::scope(|scope| {
            let out = scope.spawn(move || drain(stdout_pipe));
            let err = scope.spawn(move || drain(stderr_pipe));
            (joined(out.join()), joined(err.join()))
        });

        // Reap the child before judging the streams so it is never left behind.
        let status = child.wait();
        let stderr = stderr
            .map_err(|e| command_error(format!("could not read stderr: {e}"), String::new()))?;
        let stdout = stdout
            .map_err(|e| command_error(format!("could not read stdout: {e}"), stderr.clone()))?;
        let status = status
            .map_err(|e| command_error(format!("could not wait for exit: {e}"), stderr.clone()))?;

        debug!(
            event = "Command",
            phase = "Exit",
            command = %invocation,
            status = %status,
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len()
        );

        if !status.success() {
            let detail = stderr.trim();
            let message = if detail.is_empty() {
                format!("exited with {status}")
            } else {
                format!("exited with {status}: {detail}")
            };
            return Err(command_error(message, stderr));
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

/// Read a pipe to its end. A read error fails the whole stream: partial
/// output must never pass for a complete listing.
fn drain<R: Read>(pipe: Option<R>) -> io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn joined(result: thread::Result<io::Result<String>>) -> io::Result<String> {
    result.unwrap_or_else(|_| Err(io::Error::other("output reader panicked")))
}

/// Non-empty trimmed lines of command output.
pub(crate) fn output_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
