//! Runs validated commands with the sandbox as working directory.
//!
//! Command strings go through `<shell> -c`, so pipes, redirection, globbing
//! and `;` chaining are available to the caller. [`ProcessExecutor::run_args`]
//! is the shell-free entry point for callers that can build an argument
//! vector. Output is buffered until the process exits.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use super::{CommandValidator, SandboxError, SandboxLocks, SandboxManager};
use crate::config::ExecutorConfig;

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `-1` when the process was killed by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout on success, the captured stderr wrapped in an error otherwise.
    pub fn into_result(self) -> Result<String, SandboxError> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(SandboxError::Execution {
                status: self.exit_code,
                stderr: self.stderr,
            })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    validator: CommandValidator,
    shell: String,
    timeout: Option<Duration>,
    locks: SandboxLocks,
}

impl ProcessExecutor {
    pub fn new(validator: CommandValidator, shell: impl Into<String>) -> Self {
        Self {
            validator,
            shell: shell.into(),
            timeout: None,
            locks: SandboxLocks::new(),
        }
    }

    pub fn from_config(cfg: &ExecutorConfig, locks: SandboxLocks) -> Self {
        Self::new(CommandValidator::new(cfg.tool.clone()), cfg.shell.clone())
            .with_timeout(cfg.timeout())
            .with_locks(locks)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_locks(mut self, locks: SandboxLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn validator(&self) -> &CommandValidator {
        &self.validator
    }

    /// Run a shell command string inside `sandbox`.
    ///
    /// Returns stdout when the command exits zero and
    /// [`SandboxError::Execution`] carrying stderr otherwise. Precondition
    /// failures are reported before anything is spawned.
    #[instrument(skip_all, fields(sandbox = %sandbox))]
    pub async fn run(&self, sandbox: &str, command: &str) -> Result<String, SandboxError> {
        let dir = self
            .preconditions(sandbox, self.validator.validate(command))
            .await?;

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command);

        debug!(command, "Running shell command");
        self.spawn(&dir, cmd).await?.into_result()
    }

    /// Run an argument vector directly, without a shell.
    #[instrument(skip_all, fields(sandbox = %sandbox))]
    pub async fn run_args(&self, sandbox: &str, args: &[String]) -> Result<String, SandboxError> {
        let dir = self
            .preconditions(sandbox, self.validator.validate_args(args))
            .await?;

        let mut cmd = Command::new(&args[0]);
        cmd.args(&args[1..]);

        debug!(?args, "Running argument vector");
        self.spawn(&dir, cmd).await?.into_result()
    }

    async fn preconditions(
        &self,
        sandbox: &str,
        validated: Result<(), SandboxError>,
    ) -> Result<PathBuf, SandboxError> {
        let dir = SandboxManager::require_sandbox(sandbox)?;
        validated?;
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(dir),
            _ => Err(SandboxError::DoesNotExist(dir)),
        }
    }

    async fn spawn(&self, dir: &Path, mut cmd: Command) -> Result<CommandOutput, SandboxError> {
        let _guard = self.locks.lock(dir).await;

        cmd.current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let started = Instant::now();
        let child = cmd.spawn().map_err(SandboxError::Spawn)?;
        // Declared after the sandbox lock so the group dies before it is released.
        let mut group = ProcessGroupGuard::new(child.id());

        let output = match self.timeout {
            None => child.wait_with_output().await.map_err(SandboxError::Spawn)?,
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result.map_err(SandboxError::Spawn)?,
                Err(_) => {
                    warn!(?limit, "Command timed out, killing process group");
                    return Err(SandboxError::TimedOut(limit));
                }
            },
        };
        group.disarm();

        let exit_code = output.status.code().unwrap_or(-1);
        info!(
            exit_code,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
        })
    }
}

/// Kills the child's process group on drop unless the child was reaped.
///
/// `kill_on_drop` only reaches the direct child. When the future running a
/// command is dropped (executor timeout, gateway timeout, client gone), this
/// also takes down everything the shell started.
struct ProcessGroupGuard {
    pid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self { pid }
    }

    fn disarm(&mut self) {
        self.pid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if let Some(pid) = self.pid.take() {
            kill_process_group(pid);
        }
    }
}

/// SIGKILL the whole group so children of the shell die with it.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    // SAFETY: killpg only sends a signal; the group was created for this child.
    let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if rc != 0 {
        debug!(pid, "killpg failed: {}", std::io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}
