//! Commands over an interactive shell session
//!
//! [`ShellRunner`] binds a session to the prompt the device shell was told
//! to print, which is how we know a command has finished.

use crate::error::{Error, Result};
use crate::session::InteractiveSession;

/// Query sent after each command to recover its exit status
///
/// The leading `echo` ends any unterminated output line so the status
/// always starts a line of its own.
pub const STATUS_QUERY: &str = "echo; echo __LAVACTL_RC=$?";
const STATUS_SENTINEL: &str = "__LAVACTL_RC=";

/// Whether `line` is the exit status query sent by [`ShellRunner::run`]
pub fn is_status_query(line: &str) -> bool {
    line == STATUS_QUERY
}

/// What a shell prints in answer to the status query for `code`
pub fn status_report(code: i32) -> String {
    format!("\n{}{}\n", STATUS_SENTINEL, code)
}

/// Runs shell commands over an interactive session
pub struct ShellRunner<'s> {
    session: &'s mut dyn InteractiveSession,
    prompt: &'s str,
}

/// Split accumulated output at the exit status line
///
/// Returns the output of `command` and its status. The terminal echo of the
/// command line and of the status query is dropped, as is the line break
/// added by the query. A later status line wins over an earlier one.
fn split_exit_status(command: &str, output: &str) -> Option<(String, i32)> {
    let mut found = None;
    let mut before = String::new();
    let mut echo_seen = false;
    for line in output.split_inclusive('\n') {
        let trimmed = line.trim();
        if let Some(code) = trimmed.strip_prefix(STATUS_SENTINEL) {
            if let Ok(code) = code.trim().parse() {
                found = Some((before.clone(), code));
                continue;
            }
        }
        if trimmed.contains(STATUS_QUERY) {
            continue;
        }
        if !echo_seen && !command.is_empty() && trimmed == command {
            echo_seen = true;
            continue;
        }
        before.push_str(line);
    }

    found.map(|(mut before, code)| {
        if before.ends_with("\r\n") {
            before.truncate(before.len() - 2);
        } else if before.ends_with('\n') {
            before.truncate(before.len() - 1);
        }
        (before, code)
    })
}

impl<'s> ShellRunner<'s> {
    /// Bind a runner to `session`, which must already print `prompt`
    pub fn new(session: &'s mut dyn InteractiveSession, prompt: &'s str) -> Self {
        Self { session, prompt }
    }

    /// The prompt commands are terminated by
    pub fn prompt(&self) -> &str {
        self.prompt
    }

    /// Run `command` and fail with [`Error::CommandFailed`] if it exits non-zero
    ///
    /// The exit status query is queued right behind the command, and prompts
    /// are consumed until the status shows up, so a stray prompt left over
    /// from earlier input cannot desynchronize the runner.
    ///
    /// Returns the output printed by the command.
    pub fn run(&mut self, command: &str) -> Result<String> {
        log::debug!("On target: {}", command);
        self.session.send_line(command)?;
        self.session.send_line(STATUS_QUERY)?;

        let mut output = String::new();
        loop {
            output.push_str(&self.session.expect(self.prompt)?);
            if let Some((before, code)) = split_exit_status(command, &output) {
                if code == 0 {
                    return Ok(before);
                }
                return Err(Error::CommandFailed {
                    command: command.to_string(),
                    code: Some(code),
                });
            }
        }
    }

    /// Run `command` without checking its exit status
    pub fn run_tolerant(&mut self, command: &str) -> Result<String> {
        log::debug!("On target: {}", command);
        self.session.send_line(command)?;
        self.session.expect(self.prompt)
    }
}
