//! Device transport operations
//!
//! All knowledge of the host tool command lines lives here. The lifecycle
//! only ever passes argument strings.

use std::time::Duration;

use lavactl_core::config::BoardConfig;
use lavactl_core::error::Result;
use lavactl_core::executor::CommandExecutor;
use lavactl_core::session::InteractiveSession;

/// Control-tool and shell-tool commands for one board
pub struct DeviceTransport<E> {
    executor: E,
    control_command: String,
    shell_command: String,
    session_timeout: Duration,
}

impl<E: CommandExecutor> DeviceTransport<E> {
    /// Bind the board's tool prefixes to an executor
    pub fn new(executor: E, board: &BoardConfig) -> Self {
        Self {
            executor,
            control_command: board.control_command.clone(),
            shell_command: board.shell_command.clone(),
            session_timeout: board.timing.session_timeout(),
        }
    }

    /// Run `<control tool> <args>`
    pub fn control(&self, args: &str, tolerate_failure: bool) -> Result<()> {
        self.executor
            .run(&format!("{} {}", self.control_command, args), tolerate_failure)
    }

    /// Run `<shell tool> <args>`
    pub fn shell(&self, args: &str, tolerate_failure: bool) -> Result<()> {
        self.executor
            .run(&format!("{} {}", self.shell_command, args), tolerate_failure)
    }

    /// Spawn `<shell tool> <args>` as an interactive session
    pub fn shell_interactive(&self, args: &str) -> Result<Box<dyn InteractiveSession>> {
        self.executor
            .spawn(&format!("{} {}", self.shell_command, args), self.session_timeout)
    }

    /// Run `<shell tool> <args>` and capture its output
    pub fn shell_capture(&self, args: &str) -> Result<String> {
        self.executor
            .run_capture(&format!("{} {}", self.shell_command, args))
    }

    /// Wait out a settle delay
    pub fn settle(&self, duration: Duration) {
        log::debug!("Waiting {:?} for the device to settle", duration);
        self.executor.settle(duration);
    }

    /// The executor commands run on
    pub fn executor(&self) -> &E {
        &self.executor
    }
}
