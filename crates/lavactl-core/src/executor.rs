//! Host command execution
//!
//! Every device operation eventually becomes a command line run on the
//! host. [`CommandExecutor`] is the seam between the lifecycle logic and the
//! host so the lifecycle can be exercised against a recording executor.

use std::process::Command;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::session::{ChildSession, InteractiveSession};

/// Runs host commands
pub trait CommandExecutor {
    /// Run `command` synchronously
    ///
    /// A non-zero exit fails with [`Error::CommandFailed`] unless
    /// `tolerate_failure` is set, in which case the exit status is ignored.
    fn run(&self, command: &str, tolerate_failure: bool) -> Result<()>;

    /// Start `command` as a long-lived interactive session
    fn spawn(&self, command: &str, timeout: Duration) -> Result<Box<dyn InteractiveSession>>;

    /// Run `command` and return its standard output with trailing whitespace trimmed
    fn run_capture(&self, command: &str) -> Result<String>;

    /// Block for a fixed settle delay
    fn settle(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Executes commands through `sh -c` on the host
#[derive(Debug, Default, Clone, Copy)]
pub struct HostExecutor;

impl HostExecutor {
    /// Create a host executor
    pub fn new() -> Self {
        Self
    }
}

fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

impl CommandExecutor for HostExecutor {
    fn run(&self, command: &str, tolerate_failure: bool) -> Result<()> {
        log::debug!("Running: {}", command);
        let result = shell(command).status();

        if tolerate_failure {
            match result {
                Ok(status) if !status.success() => {
                    log::debug!("Ignoring failure of `{}` ({})", command, status)
                }
                Err(e) => log::debug!("Ignoring failure of `{}` ({})", command, e),
                Ok(_) => {}
            }
            return Ok(());
        }

        let status = result?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::CommandFailed {
                command: command.to_string(),
                code: status.code(),
            })
        }
    }

    fn spawn(&self, command: &str, timeout: Duration) -> Result<Box<dyn InteractiveSession>> {
        Ok(Box::new(ChildSession::spawn(command, timeout)?))
    }

    fn run_capture(&self, command: &str) -> Result<String> {
        log::debug!("Capturing: {}", command);
        let output = shell(command).output()?;
        if !output.status.success() {
            return Err(Error::CommandFailed {
                command: command.to_string(),
                code: output.status.code(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_success() {
        HostExecutor::new().run("true", false).unwrap();
    }

    #[test]
    fn test_run_failure() {
        match HostExecutor::new().run("exit 3", false) {
            Err(Error::CommandFailed { command, code }) => {
                assert_eq!(command, "exit 3");
                assert_eq!(code, Some(3));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_run_tolerated_failure() {
        HostExecutor::new().run("exit 3", true).unwrap();
    }

    #[test]
    fn test_run_capture_trims() {
        let out = HostExecutor::new().run_capture("printf 'v1.0.31\\n\\n'").unwrap();
        assert_eq!(out, "v1.0.31");
    }

    #[test]
    fn test_run_capture_failure() {
        assert!(matches!(
            HostExecutor::new().run_capture("false"),
            Err(Error::CommandFailed { .. })
        ));
    }
}
