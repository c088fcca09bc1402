//! Interactive sessions
//!
//! A session is a live, line-oriented channel to a process on the host,
//! normally the device shell tool. The caller sends lines and waits for
//! literal text to show up in the output.

use std::io::{Read, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use portable_pty::{native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtySize};

use crate::error::{Error, Result};

/// Line-oriented bidirectional channel to a running process
pub trait InteractiveSession {
    /// Send `line` followed by a newline
    fn send_line(&mut self, line: &str) -> Result<()>;

    /// Wait until `pattern` appears in the output
    ///
    /// Returns the output that preceded the pattern. Output up to and
    /// including the pattern is consumed.
    fn expect(&mut self, pattern: &str) -> Result<String>;

    /// Whether the underlying process is still running
    fn is_alive(&mut self) -> bool;

    /// Terminate the session
    fn close(&mut self) -> Result<()>;
}

/// Terminal size the session is started with, wide enough not to wrap commands
const PTY_SIZE: PtySize = PtySize {
    rows: 24,
    cols: 512,
    pixel_width: 0,
    pixel_height: 0,
};

/// Interactive session backed by a host child process on a pseudo-terminal
///
/// Tools like `adb shell` only start an interactive device shell, one that
/// prints a prompt, when their own stdin is a terminal.
pub struct ChildSession {
    command: String,
    child: Box<dyn Child + Send + Sync>,
    master: Option<Box<dyn MasterPty + Send>>,
    writer: Option<Box<dyn Write + Send>>,
    output: Receiver<Vec<u8>>,
    buffer: Vec<u8>,
    timeout: Duration,
}

fn pump<R: Read + Send + 'static>(mut reader: R, tx: Sender<Vec<u8>>) {
    thread::spawn(move || {
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk) {
                // A pty master reports EIO once the child side is gone
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(chunk[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

impl ChildSession {
    /// Start `command` through `sh -c` on a new pseudo-terminal
    ///
    /// `timeout` bounds every subsequent [`InteractiveSession::expect`].
    pub fn spawn(command: &str, timeout: Duration) -> Result<Self> {
        let spawn_failed = |reason: String| Error::SpawnFailed {
            command: command.to_string(),
            reason,
        };

        let pair = native_pty_system()
            .openpty(PTY_SIZE)
            .map_err(|e| spawn_failed(format!("no pseudo-terminal: {}", e)))?;

        let mut cmd = CommandBuilder::new("sh");
        cmd.arg("-c");
        cmd.arg(command);
        cmd.env("TERM", "dumb");
        if let Ok(dir) = std::env::current_dir() {
            cmd.cwd(dir);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| spawn_failed(e.to_string()))?;
        // Only the child holds the slave side, so its exit closes the reader
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| spawn_failed(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| spawn_failed(e.to_string()))?;

        let (tx, rx) = mpsc::channel();
        pump(reader, tx);

        log::debug!("Spawned interactive session: {}", command);

        Ok(Self {
            command: command.to_string(),
            child,
            master: Some(pair.master),
            writer: Some(writer),
            output: rx,
            buffer: Vec::new(),
            timeout,
        })
    }

    /// Command line the session was started with
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl InteractiveSession for ChildSession {
    fn send_line(&mut self, line: &str) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(Error::SessionClosed)?;
        log::trace!("session <- {}", line);
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    fn expect(&mut self, pattern: &str) -> Result<String> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(pos) = find(&self.buffer, pattern.as_bytes()) {
                let before = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
                self.buffer.drain(..pos + pattern.len());
                log::trace!("session -> {}{}", before, pattern);
                return Ok(before);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::SessionTimeout {
                    pattern: pattern.to_string(),
                    timeout: self.timeout,
                });
            }

            match self.output.recv_timeout(remaining) {
                Ok(chunk) => self.buffer.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(Error::SessionTimeout {
                        pattern: pattern.to_string(),
                        timeout: self.timeout,
                    })
                }
                Err(RecvTimeoutError::Disconnected) => return Err(Error::SessionClosed),
            }
        }
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn close(&mut self) -> Result<()> {
        self.writer.take();
        if self.is_alive() {
            self.child.kill()?;
        }
        self.child.wait()?;
        self.master.take();
        log::debug!("Closed interactive session: {}", self.command);
        Ok(())
    }
}

impl Drop for ChildSession {
    fn drop(&mut self) {
        if self.writer.is_some() || self.is_alive() {
            if let Err(e) = self.close() {
                log::warn!("Failed to close session {}: {}", self.command, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find() {
        assert_eq!(find(b"root@linaro# ", b"# "), Some(11));
        assert_eq!(find(b"abc", b"d"), None);
        assert_eq!(find(b"abc", b""), Some(0));
    }

    #[test]
    fn test_echo_through_cat() {
        let mut session = ChildSession::spawn("cat", Duration::from_secs(5)).unwrap();
        session.send_line("hello world").unwrap();
        assert_eq!(session.expect("world").unwrap(), "hello ");
        assert!(session.is_alive());
        session.close().unwrap();
        assert!(!session.is_alive());
    }

    #[test]
    fn test_expect_times_out() {
        let mut session = ChildSession::spawn("cat", Duration::from_millis(100)).unwrap();
        assert!(matches!(
            session.expect("never"),
            Err(Error::SessionTimeout { .. })
        ));
    }

    #[test]
    fn test_send_after_close() {
        let mut session = ChildSession::spawn("cat", Duration::from_secs(1)).unwrap();
        session.close().unwrap();
        assert!(matches!(session.send_line("x"), Err(Error::SessionClosed)));
    }

    #[test]
    fn test_shell_on_terminal_prints_prompt() {
        use crate::runner::ShellRunner;

        let mut session = ChildSession::spawn("sh", Duration::from_secs(10)).unwrap();
        session.send_line("").unwrap();
        session.send_line("export PS1='root@linaro# '").unwrap();

        let mut runner = ShellRunner::new(&mut session, "root@linaro# ");
        runner.run("true").unwrap();
        assert!(runner.run("printf foo").unwrap().contains("foo"));
        assert!(matches!(
            runner.run("echo RC=0; false"),
            Err(Error::CommandFailed { code: Some(1), .. })
        ));
        drop(runner);
        session.close().unwrap();
    }
}
