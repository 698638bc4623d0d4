//! Typed external-command execution with deadlines.
//!
//! Every third-party extractor is invoked through `CommandSpec`: a structured
//! program + argument list, never a shell string. The runner captures stdout
//! and stderr, enforces a deadline, and on expiry kills the child's whole
//! process group so no descendant survives the timeout.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Errors surfaced by command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command '{program}' timed out after {timeout_secs}s")]
    Timeout { program: String, timeout_secs: u64 },

    #[error("command '{program}' cancelled by shutdown")]
    Cancelled { program: String },

    #[error("command '{program}' could not be spawned: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("command '{program}' exited with status {status}")]
    NonZeroExit { program: String, status: i32 },

    #[error("io error while running '{program}': {source}")]
    Io {
        program: String,
        source: std::io::Error,
    },
}

/// Captured output of a completed command.
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status: i32,
}

impl CommandOutput {
    /// Stdout decoded lossily as UTF-8.
    #[must_use]
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// A structured external command: program, arguments, optional cwd.
///
/// Values, not strings composed at call time. Built once by an adapter,
/// executed by `run` under the adapter's timeout category.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: String,
    args: Vec<OsString>,
    cwd: Option<OsString>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.as_os_str().to_os_string());
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run to completion under `timeout`, capturing both output streams.
    ///
    /// On deadline or cancellation the child's process group is killed so
    /// helper processes spawned by the extractor die with it. A non-zero
    /// exit is an error; callers that tolerate it use `run_lenient`.
    pub async fn run(
        self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, CommandError> {
        let program = self.program.clone();
        let output = self.run_lenient(timeout, cancel).await?;
        if output.status != 0 {
            return Err(CommandError::NonZeroExit {
                program,
                status: output.status,
            });
        }
        Ok(output)
    }

    /// Like `run`, but a non-zero exit status is returned in the output
    /// instead of as an error. Several extractors exit non-zero on partially
    /// damaged inputs while still producing usable text.
    pub async fn run_lenient(
        self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, CommandError> {
        let program = self.program.clone();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        // A fresh process group lets the deadline path kill the extractor
        // together with every descendant it spawned.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;

        #[cfg(unix)]
        let child_pid = child.id();

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();

        let capture = async {
            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            if let Some(pipe) = stdout_pipe.as_mut() {
                pipe.read_to_end(&mut stdout).await.map_err(|source| {
                    CommandError::Io {
                        program: program.clone(),
                        source,
                    }
                })?;
            }
            if let Some(pipe) = stderr_pipe.as_mut() {
                pipe.read_to_end(&mut stderr).await.map_err(|source| {
                    CommandError::Io {
                        program: program.clone(),
                        source,
                    }
                })?;
            }
            let status = child.wait().await.map_err(|source| CommandError::Io {
                program: program.clone(),
                source,
            })?;
            Ok::<_, CommandError>(CommandOutput {
                stdout,
                stderr,
                status: status.code().unwrap_or(-1),
            })
        };

        tokio::select! {
            result = tokio::time::timeout(timeout, capture) => match result {
                Ok(output) => {
                    let output = output?;
                    debug!(
                        program = %program,
                        status = output.status,
                        stdout_bytes = output.stdout.len(),
                        "command completed"
                    );
                    Ok(output)
                }
                Err(_elapsed) => {
                    warn!(program = %program, timeout_secs = timeout.as_secs(), "command deadline expired, killing process group");
                    #[cfg(unix)]
                    kill_process_group(child_pid);
                    Err(CommandError::Timeout {
                        program: program.clone(),
                        timeout_secs: timeout.as_secs(),
                    })
                }
            },
            () = cancel.cancelled() => {
                warn!(program = %program, "command cancelled by shutdown, killing process group");
                #[cfg(unix)]
                kill_process_group(child_pid);
                Err(CommandError::Cancelled { program: program.clone() })
            }
        }
    }
}

/// Kill a child's entire process group. The child was spawned with
/// `process_group(0)`, so its pid doubles as the pgid.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        // kill_on_drop reaps the direct child; killpg reaches its descendants.
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }
}

/// True when `program` resolves on PATH. Used at startup to log which
/// extractor tools are available, not to gate dispatch.
#[must_use]
pub fn tool_available(program: &str) -> bool {
    which_on_path(program).is_some()
}

fn which_on_path(program: &str) -> Option<std::path::PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Run a quick helper command (probes, `which`-style checks) with a short
/// fixed deadline and no cancellation wiring.
pub async fn run_probe(spec: CommandSpec) -> Result<CommandOutput> {
    let cancel = CancellationToken::new();
    spec.run_lenient(Duration::from_secs(10), &cancel)
        .await
        .context("probe command failed")
}
