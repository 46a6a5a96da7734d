//! # External Process Invocation
//!
//! The aligner and the symmetrizer are native programs. They are started
//! from a structured argument list, never through a shell, and behind the
//! [`ProcessRunner`] trait so tests can substitute a fake.

use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

/// A single program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to execute.
    pub program: PathBuf,
    /// Arguments, passed verbatim.
    pub args: Vec<OsString>,
    /// When set, stdout and stderr both go to this file instead of being
    /// captured in memory.
    pub output_file: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            output_file: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append a flag followed by its value.
    pub fn flag(self, flag: &str, value: impl AsRef<OsStr>) -> Self {
        self.arg(flag).arg(value)
    }

    /// Send stdout and stderr to `path`.
    pub fn redirect_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Value following `flag` in the argument list, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(OsString::as_os_str)
    }
}

/// Exit status and captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Whether the process exited with status 0.
    pub success: bool,
    /// Exit code, `None` if terminated by a signal.
    pub code: Option<i32>,
    /// stdout followed by stderr. Empty when output was redirected to a file.
    pub output: Vec<u8>,
}

impl ProcessOutput {
    /// Captured output decoded lossily as UTF-8.
    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Runs external programs to completion.
///
/// Implementations must not keep per-invocation state: one runner is shared
/// by every request.
pub trait ProcessRunner: Send + Sync {
    /// Run `invocation` and block until it exits.
    ///
    /// Returns `Err` only when the process could not be started; a non-zero
    /// exit is reported through [`ProcessOutput::success`].
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput>;
}

/// [`ProcessRunner`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn redirected(command: &mut Command, path: &Path) -> io::Result<ProcessOutput> {
        let file = File::create(path)?;
        command
            .stdout(Stdio::from(file.try_clone()?))
            .stderr(Stdio::from(file));
        let status = command.status()?;
        Ok(ProcessOutput {
            success: status.success(),
            code: status.code(),
            output: Vec::new(),
        })
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        debug!(program = %invocation.program.display(), args = ?invocation.args, "spawning");

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).stdin(Stdio::null());

        if let Some(path) = &invocation.output_file {
            return Self::redirected(&mut command, path);
        }

        let out = command.output()?;
        let mut output = out.stdout;
        output.extend_from_slice(&out.stderr);
        Ok(ProcessOutput {
            success: out.status.success(),
            code: out.status.code(),
            output,
        })
    }
}
