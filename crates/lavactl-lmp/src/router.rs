//! Signal routing
//!
//! A signal names a module type, a command keyword and optionally a
//! specific module. The router resolves the module's serial from the
//! board configuration, drives the mode change and acknowledges it over
//! the connection the signal arrived on.

use std::io::Write;

use lavactl_core::config::LmpConfig;
use lavactl_core::session::InteractiveSession;

use crate::command::{ModeRequest, ModuleKind, SignalCommand};
use crate::driver::ModuleDriver;
use crate::error::{LmpError, Result};

/// Where completion markers are written
pub trait SignalConnection {
    /// Send one line
    fn send_line(&mut self, line: &str) -> Result<()>;
}

impl SignalConnection for Box<dyn InteractiveSession> {
    fn send_line(&mut self, line: &str) -> Result<()> {
        InteractiveSession::send_line(self.as_mut(), line)
            .map_err(|e| LmpError::Io(std::io::Error::other(e.to_string())))
    }
}

/// Connection over any writer, one marker per line
pub struct WriteConnection<W> {
    writer: W,
}

impl<W: Write> WriteConnection<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SignalConnection for WriteConnection<W> {
    fn send_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Routes signals to accessory modules
pub struct SignalRouter<'c, D> {
    config: &'c LmpConfig,
    driver: D,
}

impl<'c, D: ModuleDriver> SignalRouter<'c, D> {
    /// Router over the board's module wiring
    pub fn new(config: &'c LmpConfig, driver: D) -> Self {
        Self { config, driver }
    }

    /// Serial of the module a signal is for
    pub fn resolve(&self, kind: ModuleKind, module_name: Option<&str>) -> Result<&'c str> {
        self.config
            .module_serial(kind.name(), module_name)
            .ok_or_else(|| LmpError::NoSerial {
                kind: kind.name(),
                module_name: module_name.map(str::to_string),
            })
    }

    /// Carry out `keyword` on a `kind` module and acknowledge it
    ///
    /// Nothing is driven and no marker is written unless the keyword is
    /// valid for the module type and a module serial is known.
    pub fn handle(
        &self,
        connection: &mut dyn SignalConnection,
        kind: ModuleKind,
        keyword: &str,
        module_name: Option<&str>,
    ) -> Result<ModeRequest> {
        let command = SignalCommand::parse(kind, keyword)?;
        let serial = self.resolve(kind, module_name)?;
        log::debug!("Handling signal <LAVA_{} {}>", kind.name().to_uppercase(), keyword);

        let request = command.mode_request();
        self.driver.set_mode(kind, serial, request)?;
        connection.send_line(&kind.completion_marker())?;
        log::info!("{} module {} now {} {}", kind, serial, request.mode, request.option);
        Ok(request)
    }
}
