//! Error types for lavactl-core
//!
//! A single error type is shared by every layer of the lifecycle so that a
//! failure deep in a host command reaches the caller unmodified.

use std::time::Duration;

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// A host command exited unsuccessfully and failure was not tolerated
    #[error("command `{command}` failed{}", exit_suffix(.code))]
    CommandFailed {
        /// The full command line
        command: String,
        /// Exit code, `None` if the process was killed by a signal
        code: Option<i32>,
    },

    /// An interactive session could not be started
    #[error("failed to spawn `{command}`: {reason}")]
    SpawnFailed {
        /// The full command line
        command: String,
        /// Why the spawn failed
        reason: String,
    },

    /// Power-on was attempted before any successful deploy
    #[error("no operating system deployed, run deploy first")]
    NotDeployed,

    /// A file exchange was requested for a partition with no mount point
    #[error("unknown partition: {0}")]
    UnknownPartition(String),

    /// The operation has no implementation for this target
    #[error("{0} is not implemented for this target")]
    NotImplemented(&'static str),

    /// The operation needs a booted device with a live session
    #[error("target is not powered on")]
    NotPoweredOn,

    /// A session token from an earlier boot was used
    #[error("session {generation} is stale (current boot is {current})")]
    StaleSession {
        /// Generation the token was issued for
        generation: u64,
        /// Generation of the live session, 0 if none
        current: u64,
    },

    /// The expected output did not appear in time
    #[error("timed out after {timeout:?} waiting for {pattern:?}")]
    SessionTimeout {
        /// Text that was being waited for
        pattern: String,
        /// How long we waited
        timeout: Duration,
    },

    /// The session process went away
    #[error("interactive session closed")]
    SessionClosed,

    /// Restoring a mount point to read-only failed after the body failed
    #[error("failed to restore {mount_point} read-only ({restore}) after: {body}")]
    MountRestore {
        /// Mount point that may still be writable
        mount_point: String,
        /// The restore failure
        restore: Box<Error>,
        /// The failure of the guarded operation
        body: Box<Error>,
    },

    /// Board configuration is missing or invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error on the host
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {}", code),
        None => " (terminated by signal)".to_string(),
    }
}

/// Result type alias using the core Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_display() {
        let err = Error::CommandFailed {
            command: "fastboot erase boot".into(),
            code: Some(1),
        };
        assert_eq!(
            err.to_string(),
            "command `fastboot erase boot` failed with exit code 1"
        );

        let err = Error::CommandFailed {
            command: "adb reboot".into(),
            code: None,
        };
        assert_eq!(
            err.to_string(),
            "command `adb reboot` failed (terminated by signal)"
        );
    }

    #[test]
    fn test_mount_restore_display() {
        let err = Error::MountRestore {
            mount_point: "/system".into(),
            restore: Box::new(Error::SessionClosed),
            body: Box::new(Error::NotPoweredOn),
        };
        assert!(err.to_string().contains("/system"));
        assert!(err.to_string().contains("target is not powered on"));
    }
}
