//! Partition file exchange
//!
//! Mirrors a device directory into the scratch area, lets the caller edit
//! the mirror, and pushes it back with the partition held writable.

use std::path::{Component, Path, PathBuf};

use lavactl_core::error::{Error, Result};
use lavactl_core::executor::CommandExecutor;
use lavactl_core::image::ImageSource;
use lavactl_core::mount::with_writable_mount;
use lavactl_core::runner::ShellRunner;

use crate::target::Target;

fn device_path(mount_point: &str, relative_dir: &str) -> String {
    let relative = relative_dir.trim_matches('/');
    if relative.is_empty() {
        mount_point.to_string()
    } else {
        format!("{}/{}", mount_point.trim_end_matches('/'), relative)
    }
}

impl<E: CommandExecutor, I: ImageSource> Target<E, I> {
    /// Host directory mirroring `relative_dir` of a partition
    ///
    /// Fails for directories that climb out of the partition with `..`.
    pub fn mirror_path(&self, relative_dir: &str) -> Result<PathBuf> {
        let relative = Path::new(relative_dir.trim_matches('/'));
        if relative.components().any(|c| c == Component::ParentDir) {
            return Err(Error::Config(format!(
                "directory {:?} leaves the partition",
                relative_dir
            )));
        }
        Ok(self.board.scratch_dir.join("mnt").join(relative))
    }

    /// Run `f` on a host mirror of `relative_dir` inside `partition`
    ///
    /// The device is powered on first if needed. A failed pull is expected
    /// on first use and ignored. The mirror is pushed back only when `f`
    /// succeeds, and a failed push is an error. The partition is made
    /// read-only again afterwards in every case.
    pub fn with_device_directory<T, F>(&mut self, partition: &str, relative_dir: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Path) -> Result<T>,
    {
        let mount_point = self.board.mount_point(partition)?.to_string();
        let host_dir = self.mirror_path(relative_dir)?;

        if !self.powered_on() {
            self.power_on()?;
        }

        std::fs::create_dir_all(&host_dir)?;
        let target_dir = device_path(&mount_point, relative_dir);
        log::debug!("Mirroring {} at {}", target_dir, host_dir.display());

        let Target { transport, booted, .. } = self;
        let booted = booted.as_mut().ok_or(Error::NotPoweredOn)?;
        let runner = ShellRunner::new(booted.session.as_mut(), &booted.prompt);

        with_writable_mount(runner, &mount_point, |_| {
            transport.shell(&format!("pull {} {}", target_dir, host_dir.display()), true)?;
            let value = f(&host_dir)?;
            transport.shell(&format!("push {} {}", host_dir.display(), target_dir), false)?;
            Ok(value)
        })
    }
}
