//! Module drivers
//!
//! A driver carries out a mode change on one physical module. The wire
//! protocol to the modules lives in an external helper; [`CommandDriver`]
//! invokes it through the host's command executor.

use lavactl_core::config::LmpConfig;
use lavactl_core::executor::{CommandExecutor, HostExecutor};

use crate::command::{ModeRequest, ModuleKind};
use crate::error::Result;

/// Helper invoked when the board does not name one
pub const DEFAULT_LMP_COMMAND: &str = "lava-lmp";

/// Switches accessory modules into a requested mode
pub trait ModuleDriver {
    /// Put the module with `serial` into `request`, returning once it is there
    fn set_mode(&self, kind: ModuleKind, serial: &str, request: ModeRequest) -> Result<()>;
}

impl<D: ModuleDriver + ?Sized> ModuleDriver for &D {
    fn set_mode(&self, kind: ModuleKind, serial: &str, request: ModeRequest) -> Result<()> {
        (**self).set_mode(kind, serial, request)
    }
}

/// Driver that runs `<helper> <serial> <mode> <option>` on the host
pub struct CommandDriver<E> {
    executor: E,
    command: String,
}

impl CommandDriver<HostExecutor> {
    /// Driver running the board's helper on this host
    pub fn host(config: &LmpConfig) -> Self {
        Self::from_config(HostExecutor::new(), config)
    }
}

impl<E: CommandExecutor> CommandDriver<E> {
    /// Driver running `command` through `executor`
    pub fn new(executor: E, command: impl Into<String>) -> Self {
        Self {
            executor,
            command: command.into(),
        }
    }

    /// Driver using the helper named in `config`, or the default helper
    pub fn from_config(executor: E, config: &LmpConfig) -> Self {
        let command = config.command.as_deref().unwrap_or(DEFAULT_LMP_COMMAND);
        Self::new(executor, command)
    }
}

impl<E: CommandExecutor> ModuleDriver for CommandDriver<E> {
    fn set_mode(&self, kind: ModuleKind, serial: &str, request: ModeRequest) -> Result<()> {
        log::debug!(
            "LMP {} {}: {} -> {}",
            kind,
            serial,
            request.mode,
            request.option
        );
        self.executor.run(
            &format!(
                "{} {} {} {}",
                self.command, serial, request.mode, request.option
            ),
            false,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lavactl_dummy::DummyHost;

    #[test]
    fn test_helper_command_line() {
        let host = DummyHost::new();
        let driver = CommandDriver::new(host.clone(), "lmp-switch");
        driver
            .set_mode(
                ModuleKind::Sata,
                "LL190000000001",
                ModeRequest {
                    mode: "sata",
                    option: "passthru",
                },
            )
            .unwrap();
        assert_eq!(host.commands(), vec!["lmp-switch LL190000000001 sata passthru"]);
    }

    #[test]
    fn test_default_helper() {
        let host = DummyHost::new();
        let driver = CommandDriver::from_config(host.clone(), &LmpConfig::default());
        driver
            .set_mode(
                ModuleKind::Usb,
                "42",
                ModeRequest {
                    mode: "usb",
                    option: "host",
                },
            )
            .unwrap();
        assert_eq!(host.commands(), vec!["lava-lmp 42 usb host"]);
    }

    #[test]
    fn test_helper_failure() {
        let host = DummyHost::new();
        host.fail("lava-lmp 42 usb host");
        let driver = CommandDriver::new(host, DEFAULT_LMP_COMMAND);
        let request = ModeRequest {
            mode: "usb",
            option: "host",
        };
        assert!(matches!(
            driver.set_mode(ModuleKind::Usb, "42", request),
            Err(crate::LmpError::Driver(_))
        ));
    }
}
