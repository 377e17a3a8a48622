//! Validation capability: decides whether a pinned candidate is acceptable

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::upgrade::error::ValidationError;

/// Trait for checking the project against the current requirements file
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Validator: Send + Sync {
    /// Runs the validation once
    ///
    /// # Returns
    /// * `Ok(())` - The project accepts the current pins
    /// * `Err(ValidationError)` - Anything else; the caller rolls back
    async fn run(&self) -> Result<(), ValidationError>;
}

/// Validator that runs a shell command and treats exit status 0 as success
#[derive(Debug, Clone)]
pub struct CommandValidator {
    command: String,
    timeout: Option<Duration>,
    quiet: bool,
}

impl CommandValidator {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: None,
            quiet: false,
        }
    }

    /// Fail the validation if the command runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Discard the command's stdout and stderr
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn build_command(&self) -> Command {
        let mut command = shell_command(&self.command);
        if self.quiet {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }
        command.stdin(Stdio::null()).kill_on_drop(true);
        // A timeout kills the whole group; untimed commands stay in the foreground group.
        #[cfg(unix)]
        {
            if self.timeout.is_some() {
                command.process_group(0);
            }
        }
        command
    }
}

/// Kill the command and every process in its group, then reap it
#[cfg(unix)]
async fn terminate(child: &mut Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    if let Some(pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) {
        if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
            warn!("Failed to kill process group {}: {}", pid, e);
        }
    }
    if let Err(e) = child.kill().await {
        warn!("Failed to kill validation command: {}", e);
    }
}

#[cfg(not(unix))]
async fn terminate(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!("Failed to kill validation command: {}", e);
    }
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[async_trait]
impl Validator for CommandValidator {
    async fn run(&self) -> Result<(), ValidationError> {
        debug!("Running validation command: {}", self.command);

        let mut child = self.build_command().spawn()?;

        let status = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    warn!("Validation command timed out after {:?}, killing it", limit);
                    terminate(&mut child).await;
                    return Err(ValidationError::Timeout(limit));
                }
            },
            None => child.wait().await?,
        };

        if status.success() {
            Ok(())
        } else {
            Err(ValidationError::Failed {
                code: status.code(),
            })
        }
    }
}
