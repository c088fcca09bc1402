//! Push command implementation

use lavactl_core::BoardConfig;
use lavactl_target::Target;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use super::deploy::{boot, deploy};
use crate::cli::ImageArgs;

/// Deploy and boot, then copy `input` into `dest` inside `partition`
pub fn run_push(
    board: Arc<BoardConfig>,
    images: &ImageArgs,
    partition: &str,
    dest: &str,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.is_dir() {
        return Err(format!("Not a directory: {}", input.display()).into());
    }

    let mut target = Target::host(board);
    deploy(&mut target, images)?;
    boot(&mut target)?;

    let copied = target.with_device_directory(partition, dest, |mirror| {
        Ok(copy_tree(input, mirror)?)
    })?;

    println!("Pushed {} files from {} to {}:{}", copied, input.display(), partition, dest);
    Ok(())
}

/// Copy the contents of `from` into `to`, returning the number of files copied
fn copy_tree(from: &Path, to: &Path) -> io::Result<usize> {
    let mut copied = 0;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            fs::create_dir_all(&target)?;
            copied += copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}
