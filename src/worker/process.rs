//! Subprocess-backed amplifier.
//!
//! Each handle owns one child process started as `executable program`, with
//! stdin and stdout piped. Lines are written and flushed one at a time; the
//! amplifier blocks on its own input, so every send/receive pair is a
//! synchronization point.
//!
//! # Receive timeout
//!
//! Without a timeout, `recv_line` reads straight from a `BufReader` over the
//! child's stdout and blocks for as long as the amplifier does. With a
//! timeout, a relay thread owns stdout and forwards each line over a channel
//! that is drained with `recv_timeout`. The relay thread is detached and
//! exits when the pipe closes, which normally happens when the child is
//! killed. If the amplifier is a wrapper whose own children inherited its
//! stdout, the pipe stays open after `terminate` and the relay thread lives
//! until those descendants exit. Teardown never joins it, so a session still
//! ends on time.

use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::{Launcher, Worker};
use crate::error::{LaunchError, RecvError, WriteError};
use crate::signal::{self, Signal};

/// How to start one amplifier.
#[derive(Debug, Clone)]
pub struct WorkerSpec {
    /// Amplifier executable (the virtual machine).
    pub executable: PathBuf,

    /// Program file passed as the single argument. Never read by us.
    pub program: PathBuf,

    /// Upper bound on a single `recv_line`. `None` blocks indefinitely.
    pub recv_timeout: Option<Duration>,

    /// Discard the amplifier's stderr instead of inheriting it.
    pub quiet: bool,
}

impl WorkerSpec {
    pub fn new(executable: impl Into<PathBuf>, program: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            program: program.into(),
            recv_timeout: None,
            quiet: false,
        }
    }

    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = Some(timeout);
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

impl Launcher for WorkerSpec {
    type Worker = ProcessWorker;

    fn launch(&self, position: usize) -> Result<ProcessWorker, LaunchError> {
        ProcessWorker::start(position, self)
    }
}

enum LineSource {
    Direct(BufReader<ChildStdout>),
    Relayed {
        lines: Receiver<io::Result<String>>,
        timeout: Duration,
    },
}

/// A running amplifier process.
pub struct ProcessWorker {
    position: usize,
    child: Child,
    /// `None` once the input side is known to be closed.
    stdin: Option<ChildStdin>,
    output: LineSource,
    reaped: bool,
}

impl ProcessWorker {
    /// Spawn the amplifier and capture its pipes.
    pub fn start(position: usize, spec: &WorkerSpec) -> Result<Self, LaunchError> {
        let mut child = Command::new(&spec.executable)
            .arg(&spec.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(if spec.quiet { Stdio::null() } else { Stdio::inherit() })
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                executable: spec.executable.clone(),
                source,
            })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            (stdin, _) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(LaunchError::MissingPipe {
                    executable: spec.executable.clone(),
                    stream: if stdin.is_none() { "stdin" } else { "stdout" },
                });
            }
        };

        let output = match spec.recv_timeout {
            Some(timeout) => LineSource::Relayed {
                lines: relay_lines(stdout),
                timeout,
            },
            None => LineSource::Direct(BufReader::new(stdout)),
        };

        debug!(position, pid = child.id(), executable = %spec.executable.display(), "amplifier started");

        Ok(Self {
            position,
            child,
            stdin: Some(stdin),
            output,
            reaped: false,
        })
    }

    /// OS process id of the amplifier.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

/// Move stdout onto a relay thread so reads can be bounded by a timeout.
fn relay_lines(stdout: ChildStdout) -> Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut reader = BufReader::new(stdout);
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(Ok(line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }
    });
    rx
}

impl Worker for ProcessWorker {
    fn position(&self) -> usize {
        self.position
    }

    fn send_line(&mut self, value: i64) -> Result<(), WriteError> {
        let stdin = self.stdin.as_mut().ok_or(WriteError::Closed)?;
        let line = signal::encode(value);

        let result = stdin
            .write_all(line.as_bytes())
            .and_then(|()| stdin.flush());

        match result {
            Ok(()) => {
                trace!(position = self.position, value, "sent");
                Ok(())
            }
            Err(e) => {
                self.stdin = None;
                if e.kind() == io::ErrorKind::BrokenPipe {
                    Err(WriteError::Closed)
                } else {
                    Err(WriteError::Io(e))
                }
            }
        }
    }

    fn recv_line(&mut self) -> Result<Signal, RecvError> {
        let line = match &mut self.output {
            LineSource::Direct(reader) => {
                let mut line = String::new();
                if reader.read_line(&mut line)? == 0 {
                    return Err(RecvError::Terminated);
                }
                line
            }
            LineSource::Relayed { lines, timeout } => match lines.recv_timeout(*timeout) {
                Ok(line) => line?,
                Err(RecvTimeoutError::Timeout) => return Err(RecvError::TimedOut(*timeout)),
                Err(RecvTimeoutError::Disconnected) => return Err(RecvError::Terminated),
            },
        };

        let value = signal::parse(&line)?;
        trace!(position = self.position, value, "received");
        Ok(value)
    }

    fn is_alive(&mut self) -> bool {
        if self.reaped {
            return false;
        }
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(position = self.position, %status, "amplifier exited");
                self.reaped = true;
                false
            }
            Err(e) => {
                warn!(position = self.position, error = %e, "liveness check failed");
                false
            }
        }
    }

    fn terminate(&mut self) {
        if self.reaped {
            return;
        }
        self.stdin = None;
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
        self.reaped = true;
        trace!(position = self.position, "amplifier reaped");
    }
}

impl Drop for ProcessWorker {
    fn drop(&mut self) {
        self.terminate();
    }
}
