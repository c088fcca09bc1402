//! Deploy command implementation

use lavactl_core::{BoardConfig, CommandExecutor, ImageSource};
use lavactl_target::Target;
use std::sync::Arc;

use super::with_spinner;
use crate::cli::ImageArgs;

/// Flash `images` onto the board, optionally booting it and running commands
pub fn run_deploy(
    board: Arc<BoardConfig>,
    images: &ImageArgs,
    power_on: bool,
    commands: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut target = Target::host(board);
    deploy(&mut target, images)?;

    if power_on || !commands.is_empty() {
        boot(&mut target)?;
    }

    for command in commands {
        let output = target.run(command)?;
        print!("{}", output);
    }

    Ok(())
}

/// Deploy under a spinner
pub(super) fn deploy<E: CommandExecutor, I: ImageSource>(
    target: &mut Target<E, I>,
    images: &ImageArgs,
) -> lavactl_core::Result<()> {
    let message = format!("Deploying to {}", target.board().name);
    with_spinner(&message, || {
        target.deploy(&images.boot, &images.system, &images.userdata)
    })
}

/// Power on under a spinner
pub(super) fn boot<E: CommandExecutor, I: ImageSource>(
    target: &mut Target<E, I>,
) -> lavactl_core::Result<()> {
    let message = format!("Booting {}", target.board().name);
    with_spinner(&message, || target.power_on().map(|_| ()))
}
