//! Error types for signal routing

use thiserror::Error;

/// Errors from routing a signal to an accessory module
#[derive(Error, Debug)]
pub enum LmpError {
    /// Keyword not in the module type's vocabulary
    #[error("unknown {kind} command: {keyword}")]
    UnknownCommand {
        /// Module type
        kind: &'static str,
        /// Rejected keyword
        keyword: String,
    },

    /// Module type name not recognized
    #[error("unknown module type: {0}")]
    UnknownModule(String),

    /// No module serial configured for the request
    #[error("no {kind} module serial configured{}", .module_name.as_ref().map(|n| format!(" for module {}", n)).unwrap_or_default())]
    NoSerial {
        /// Module type
        kind: &'static str,
        /// Module name asked for, if any
        module_name: Option<String>,
    },

    /// The driver failed to switch the module
    #[error("module driver failed: {0}")]
    Driver(#[from] lavactl_core::Error),

    /// The completion marker could not be delivered
    #[error("failed to signal completion: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for signal routing
pub type Result<T> = std::result::Result<T, LmpError>;
