//! Scoped read-write access to device mount points
//!
//! Test setup sometimes needs to write to a partition that the device keeps
//! mounted read-only. [`MountGuard`] remounts it read-write for the
//! duration of a scope and puts it back to read-only when the scope ends,
//! whether the scope succeeded, failed or unwound.
//!
//! Only the system mount point is remounted. Writability of every other
//! mount point is left to the caller.

use std::ops::{Deref, DerefMut};

use crate::error::{Error, Result};
use crate::runner::ShellRunner;

/// The only mount point whose mode is switched by the guard
pub const SYSTEM_MOUNT_POINT: &str = "/system";

fn remount_command(mode: &str, mount_point: &str) -> String {
    format!("mount -o remount,{} {}", mode, mount_point)
}

/// Holds a mount point read-write until released or dropped
///
/// The guard owns the runner for its lifetime and derefs to it, so
/// commands can be issued while the mount point is writable.
pub struct MountGuard<'s> {
    runner: ShellRunner<'s>,
    mount_point: String,
    armed: bool,
}

impl<'s> MountGuard<'s> {
    /// Remount `mount_point` read-write if it is the system mount point
    pub fn acquire(mut runner: ShellRunner<'s>, mount_point: &str) -> Result<Self> {
        let armed = mount_point == SYSTEM_MOUNT_POINT;
        if armed {
            runner.run(&remount_command("rw", mount_point))?;
            log::debug!("{} is now read-write", mount_point);
        }
        Ok(Self {
            runner,
            mount_point: mount_point.to_string(),
            armed,
        })
    }

    /// Mount point held by this guard
    pub fn mount_point(&self) -> &str {
        &self.mount_point
    }

    /// Restore the mount point to read-only and report the outcome
    pub fn release(mut self) -> Result<()> {
        self.restore()
    }

    fn restore(&mut self) -> Result<()> {
        if !self.armed {
            return Ok(());
        }
        // Disarm first so a failed restore is not retried from drop
        self.armed = false;
        self.runner
            .run(&remount_command("ro", &self.mount_point))
            .map(|_| log::debug!("{} is read-only again", self.mount_point))
    }
}

impl<'s> Deref for MountGuard<'s> {
    type Target = ShellRunner<'s>;

    fn deref(&self) -> &Self::Target {
        &self.runner
    }
}

impl<'s> DerefMut for MountGuard<'s> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.runner
    }
}

impl Drop for MountGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.restore() {
                log::error!("Failed to restore {} read-only: {}", self.mount_point, e);
            }
        }
    }
}

/// Run `body` with `mount_point` writable
///
/// The read-only restore always runs after `body`. An error from `body` is
/// returned after the restore; if the restore fails as well both failures
/// are reported through [`Error::MountRestore`].
pub fn with_writable_mount<'s, T, F>(runner: ShellRunner<'s>, mount_point: &str, body: F) -> Result<T>
where
    F: FnOnce(&mut ShellRunner<'s>) -> Result<T>,
{
    let mut guard = MountGuard::acquire(runner, mount_point)?;
    let outcome = body(&mut *guard);
    let restored = guard.release();

    match (outcome, restored) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(restore)) => Err(restore),
        (Err(body), Ok(())) => Err(body),
        (Err(body), Err(restore)) => Err(Error::MountRestore {
            mount_point: mount_point.to_string(),
            restore: Box::new(restore),
            body: Box::new(body),
        }),
    }
}
