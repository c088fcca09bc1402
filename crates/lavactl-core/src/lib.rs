//! lavactl-core - Building blocks for driving a device under test
//!
//! This crate holds the pieces every lab operation is assembled from:
//!
//! - **Board configuration** - per-device tool prefixes, partition mount
//!   points and timing, loaded from RON or TOML files
//! - **Command executor** - runs host commands synchronously or spawns a
//!   long-lived interactive session
//! - **Shell runner** - runs commands over an interactive session and
//!   checks their exit status
//! - **Mount guard** - scoped read-write access to a device mount point
//! - **Image sources** - stage a software image into a host directory
//!
//! The lifecycle state machine built on top of these lives in
//! `lavactl-target`.
//!
//! # Example
//!
//! ```ignore
//! use lavactl_core::executor::{CommandExecutor, HostExecutor};
//!
//! let host = HostExecutor::new();
//! let version = host.run_capture("adb version | sed 's/.* version //'")?;
//! println!("adb {}", version);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod executor;
pub mod image;
pub mod mount;
pub mod runner;
pub mod session;

pub use config::{BoardConfig, BoardDatabase, LmpConfig, Timing};
pub use error::{Error, Result};
pub use executor::{CommandExecutor, HostExecutor};
pub use image::{ImageSource, LocalImageSource};
pub use mount::{with_writable_mount, MountGuard, SYSTEM_MOUNT_POINT};
pub use runner::ShellRunner;
pub use session::{ChildSession, InteractiveSession};
