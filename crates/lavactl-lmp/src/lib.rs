//! lavactl-lmp - Accessory module signal routing
//!
//! LMP accessory modules sit between the test host and the device under
//! test and switch USB, HDMI, SATA, Ethernet and GPIO lines on request.
//! Test code running on the device asks for a switch by signalling a
//! module type and a command keyword, and waits for a completion marker.
//!
//! This crate parses those requests into typed commands, resolves which
//! physical module to talk to, hands the mode change to a [`ModuleDriver`]
//! and writes the `<LAVA_<TYPE>_COMPLETE>` marker back.
//!
//! ```ignore
//! use lavactl_lmp::{CommandDriver, ModuleKind, SignalRouter, WriteConnection};
//!
//! let router = SignalRouter::new(&board.lmp, CommandDriver::host(&board.lmp));
//! let mut out = WriteConnection::new(std::io::stdout());
//! router.handle(&mut out, ModuleKind::Lsgpio, "a_in", None)?;
//! ```

#![warn(missing_docs)]

mod command;
mod driver;
mod error;
mod router;

pub use command::{
    EthCommand, HdmiCommand, LsgpioCommand, ModeRequest, ModuleKind, SataCommand, SignalCommand,
    UsbCommand,
};
pub use driver::{CommandDriver, ModuleDriver, DEFAULT_LMP_COMMAND};
pub use error::{LmpError, Result};
pub use router::{SignalConnection, SignalRouter, WriteConnection};
