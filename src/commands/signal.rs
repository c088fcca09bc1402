//! Signal command implementation

use lavactl_core::BoardConfig;
use lavactl_lmp::{CommandDriver, ModuleKind, SignalRouter, WriteConnection};

/// Route one signal to the board's accessory modules
///
/// The completion marker goes to stdout so scripts can wait for it.
pub fn run_signal(
    board: &BoardConfig,
    module: &str,
    command: &str,
    name: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let kind: ModuleKind = module.parse()?;
    let router = SignalRouter::new(&board.lmp, CommandDriver::host(&board.lmp));
    let mut connection = WriteConnection::new(std::io::stdout().lock());
    router.handle(&mut connection, kind, command, name)?;
    Ok(())
}
