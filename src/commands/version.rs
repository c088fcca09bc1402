//! Version command implementation

use lavactl_core::BoardConfig;
use lavactl_target::Target;
use std::sync::Arc;

/// Print the version of the board's device shell tool
pub fn run_version(board: Arc<BoardConfig>) -> Result<(), Box<dyn std::error::Error>> {
    let target = Target::host(board);
    println!("{}", target.device_version()?);
    Ok(())
}
