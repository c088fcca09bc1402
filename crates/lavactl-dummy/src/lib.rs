//! lavactl-dummy - Recording host emulator for testing
//!
//! This crate provides a command executor that never touches the host. It
//! records every command, settle delay, image acquisition and shell line in
//! a single ordered log, so tests can assert on exactly what a lifecycle
//! operation would have done to a real device.
//!
//! Commands can be scripted to fail, both host commands and commands typed
//! into a spawned shell session.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use lavactl_core::error::{Error, Result};
use lavactl_core::executor::CommandExecutor;
use lavactl_core::image::ImageSource;
use lavactl_core::runner::{is_status_query, status_report};
use lavactl_core::session::InteractiveSession;

/// Something the emulated host was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Synchronous host command
    Run {
        /// Full command line
        command: String,
        /// Whether failure was tolerated
        tolerate_failure: bool,
    },
    /// Host command whose output was captured
    Capture(String),
    /// Interactive session started
    Spawn {
        /// Full command line
        command: String,
        /// Session number, starting at 1
        session: u64,
    },
    /// Line typed into a session
    SessionLine {
        /// Session number
        session: u64,
        /// The line, without newline
        line: String,
    },
    /// Session closed
    SessionClosed(u64),
    /// Settle delay
    Settle(Duration),
    /// Image staged
    Acquire {
        /// Image reference
        reference: String,
        /// Whether decompression was requested
        decompress: bool,
    },
}

#[derive(Debug, Default)]
struct State {
    events: Vec<Event>,
    failing: HashSet<String>,
    outputs: HashMap<String, String>,
    fail_spawn: bool,
    sessions: u64,
}

/// Emulated host
///
/// Clones share the same log and script, so a test can hand one clone to
/// the code under test and inspect another.
#[derive(Debug, Clone, Default)]
pub struct DummyHost {
    state: Rc<RefCell<State>>,
}

impl DummyHost {
    /// Create an emulated host where every command succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `command` fail, on the host or in a session
    pub fn fail(&self, command: &str) {
        self.state.borrow_mut().failing.insert(command.to_string());
    }

    /// Make `command` succeed again
    pub fn succeed(&self, command: &str) {
        self.state.borrow_mut().failing.remove(command);
    }

    /// Make every interactive spawn fail
    pub fn fail_spawn(&self, fail: bool) {
        self.state.borrow_mut().fail_spawn = fail;
    }

    /// Set the output captured from `command`
    pub fn set_output(&self, command: &str, output: &str) {
        self.state
            .borrow_mut()
            .outputs
            .insert(command.to_string(), output.to_string());
    }

    /// Image source that records into this host's log
    pub fn images(&self) -> DummyImages {
        DummyImages { host: self.clone() }
    }

    /// Everything recorded so far
    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.state.borrow_mut().events.clear();
    }

    /// Synchronous host command lines, in order
    pub fn commands(&self) -> Vec<String> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Run { command, .. } => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    /// Lines typed into session `session`, without exit status queries
    pub fn session_commands(&self, session: u64) -> Vec<String> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                Event::SessionLine { session: s, line } if *s == session && !is_status_query(line) => {
                    Some(line.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Number of sessions spawned
    pub fn sessions_spawned(&self) -> u64 {
        self.state.borrow().sessions
    }

    /// Index of the first event matching `pred`
    pub fn position(&self, pred: impl Fn(&Event) -> bool) -> Option<usize> {
        self.state.borrow().events.iter().position(pred)
    }

    fn record(&self, event: Event) {
        log::trace!("dummy: {:?}", event);
        self.state.borrow_mut().events.push(event);
    }

    fn is_failing(&self, command: &str) -> bool {
        self.state.borrow().failing.contains(command)
    }
}

impl CommandExecutor for DummyHost {
    fn run(&self, command: &str, tolerate_failure: bool) -> Result<()> {
        self.record(Event::Run {
            command: command.to_string(),
            tolerate_failure,
        });
        if self.is_failing(command) && !tolerate_failure {
            return Err(Error::CommandFailed {
                command: command.to_string(),
                code: Some(1),
            });
        }
        Ok(())
    }

    fn spawn(&self, command: &str, _timeout: Duration) -> Result<Box<dyn InteractiveSession>> {
        if self.state.borrow().fail_spawn {
            return Err(Error::SpawnFailed {
                command: command.to_string(),
                reason: "spawn disabled".to_string(),
            });
        }
        let id = {
            let mut state = self.state.borrow_mut();
            state.sessions += 1;
            state.sessions
        };
        self.record(Event::Spawn {
            command: command.to_string(),
            session: id,
        });
        Ok(Box::new(DummySession {
            host: self.clone(),
            id,
            last_command: String::new(),
            last_line: String::new(),
            closed: false,
        }))
    }

    fn run_capture(&self, command: &str) -> Result<String> {
        self.record(Event::Capture(command.to_string()));
        if self.is_failing(command) {
            return Err(Error::CommandFailed {
                command: command.to_string(),
                code: Some(1),
            });
        }
        let output = self.state.borrow().outputs.get(command).cloned().unwrap_or_default();
        Ok(output.trim_end().to_string())
    }

    fn settle(&self, duration: Duration) {
        self.record(Event::Settle(duration));
    }
}

/// Emulated device shell
///
/// Answers every exit status query with 0, or 1 when the preceding command
/// was scripted to fail.
pub struct DummySession {
    host: DummyHost,
    id: u64,
    last_command: String,
    last_line: String,
    closed: bool,
}

impl InteractiveSession for DummySession {
    fn send_line(&mut self, line: &str) -> Result<()> {
        if self.closed {
            return Err(Error::SessionClosed);
        }
        self.host.record(Event::SessionLine {
            session: self.id,
            line: line.to_string(),
        });
        if !is_status_query(line) {
            self.last_command = line.to_string();
        }
        self.last_line = line.to_string();
        Ok(())
    }

    fn expect(&mut self, _pattern: &str) -> Result<String> {
        if self.closed {
            return Err(Error::SessionClosed);
        }
        if is_status_query(&self.last_line) {
            let rc = if self.host.is_failing(&self.last_command) { 1 } else { 0 };
            Ok(status_report(rc))
        } else {
            Ok(String::new())
        }
    }

    fn is_alive(&mut self) -> bool {
        !self.closed
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.host.record(Event::SessionClosed(self.id));
        }
        Ok(())
    }
}

/// Image source that hands back the reference unchanged
#[derive(Debug, Clone)]
pub struct DummyImages {
    host: DummyHost,
}

impl ImageSource for DummyImages {
    fn acquire(&self, reference: &str, _destination: &Path, decompress: bool) -> Result<PathBuf> {
        self.host.record(Event::Acquire {
            reference: reference.to_string(),
            decompress,
        });
        if self.host.is_failing(reference) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such image: {}", reference),
            )));
        }
        Ok(PathBuf::from(reference))
    }
}
