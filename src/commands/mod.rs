//! CLI command implementations
//!
//! Each command builds a host [`Target`](lavactl_target::Target) for the
//! selected board and drives it through the part of the lifecycle the
//! command needs. Long steps run under a spinner.

mod deploy;
mod list;
mod push;
mod signal;
mod version;

pub use deploy::run_deploy;
pub use list::{list_boards, list_modules};
pub use push::run_push;
pub use signal::run_signal;
pub use version::run_version;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Run `step` under a spinner showing `message`
fn with_spinner<T, E>(message: &str, step: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = step();
    match &result {
        Ok(_) => pb.finish_with_message(format!("{} done", message)),
        Err(_) => pb.abandon_with_message(format!("{} failed", message)),
    }
    result
}
