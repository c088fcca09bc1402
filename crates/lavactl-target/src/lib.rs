//! High-level device-under-test lifecycle
//!
//! This crate drives a board through its test lifecycle: flash a new
//! software image, boot it, get a shell on it, and move files in and out of
//! its partitions. The CLI only talks to [`Target`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CLI (bin/lavactl)                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  lavactl-target (this crate)                 │
//! │  - Target: deploy / power_on / reboot / file exchange       │
//! │  - DeviceTransport: control-tool and shell-tool commands    │
//! │  - DeploymentData: what the last deploy left behind         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       lavactl-core                           │
//! │  - CommandExecutor, InteractiveSession, ShellRunner         │
//! │  - MountGuard, BoardConfig, ImageSource                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lavactl_target::Target;
//!
//! let mut target = Target::host(Arc::new(board));
//! target.deploy("boot.img", "system.img", "userdata.img")?;
//! target.power_on()?;
//! target.with_device_directory("system_partition", "etc/testdata", |dir| {
//!     std::fs::write(dir.join("marker"), b"ok")?;
//!     Ok(())
//! })?;
//! ```

#![warn(missing_docs)]

mod deployment;
mod exchange;
mod target;
mod transport;

pub use deployment::{DeploymentData, ANDROID_TESTER_PS1};
pub use target::{SessionId, Target, TargetState};
pub use transport::DeviceTransport;

// Re-export core types the CLI needs
pub use lavactl_core::{BoardConfig, Error, Result};
