//! In-process amplifier for tests.
//!
//! `MockWorker` runs a [`StubMachine`] directly instead of a subprocess, so
//! scheduler and search behavior can be tested deterministically with no I/O.
//! It mirrors pipe semantics closely enough for the ring protocol:
//!
//! - lines written after the program finished fail with `WriteError::Closed`
//! - output produced before exit stays readable, then `Terminated`
//! - a live worker with nothing queued reports `TimedOut(0)` instead of
//!   blocking forever
//!
//! `MockLauncher` tracks how many workers it started and how many were torn
//! down, so tests can assert that no session leaks a worker.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{Launcher, StubMachine, StubProgram, Worker};
use crate::error::{LaunchError, RecvError, WriteError};
use crate::signal::Signal;

pub struct MockWorker {
    position: usize,
    machine: StubMachine,
    pending: VecDeque<Signal>,
    alive: bool,
    /// Every line this worker was sent, in order.
    received: Vec<i64>,
    terminated: bool,
    reaped: Arc<AtomicUsize>,
}

impl MockWorker {
    pub fn new(position: usize, program: StubProgram) -> Self {
        Self {
            position,
            machine: StubMachine::new(program),
            pending: VecDeque::new(),
            alive: true,
            received: Vec::new(),
            terminated: false,
            reaped: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn received(&self) -> &[i64] {
        &self.received
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl Worker for MockWorker {
    fn position(&self) -> usize {
        self.position
    }

    fn send_line(&mut self, value: i64) -> Result<(), WriteError> {
        if !self.alive {
            return Err(WriteError::Closed);
        }
        self.received.push(value);
        let feed = self.machine.feed(value);
        self.pending.extend(feed.output);
        if feed.finished {
            self.alive = false;
        }
        Ok(())
    }

    fn recv_line(&mut self) -> Result<Signal, RecvError> {
        match self.pending.pop_front() {
            Some(value) => Ok(value),
            None if !self.alive => Err(RecvError::Terminated),
            None => Err(RecvError::TimedOut(Duration::ZERO)),
        }
    }

    fn is_alive(&mut self) -> bool {
        self.alive
    }

    fn terminate(&mut self) {
        self.alive = false;
        if !self.terminated {
            self.terminated = true;
            self.reaped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MockWorker {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Launches [`MockWorker`]s running a shared stub program.
pub struct MockLauncher {
    program: StubProgram,
    overrides: HashMap<usize, StubProgram>,
    /// Launches at this position and beyond fail.
    fail_from: Option<usize>,
    launched: AtomicUsize,
    reaped: Arc<AtomicUsize>,
}

impl MockLauncher {
    pub fn new(program: StubProgram) -> Self {
        Self {
            program,
            overrides: HashMap::new(),
            fail_from: None,
            launched: AtomicUsize::new(0),
            reaped: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Run a different program at one ring position.
    pub fn with_program_at(mut self, position: usize, program: StubProgram) -> Self {
        self.overrides.insert(position, program);
        self
    }

    /// Every launch fails as if the executable were missing.
    pub fn failing(program: StubProgram) -> Self {
        Self::failing_at(program, 0)
    }

    /// Launches succeed below `position` and fail from there on.
    pub fn failing_at(program: StubProgram, position: usize) -> Self {
        Self {
            fail_from: Some(position),
            ..Self::new(program)
        }
    }

    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn reaped(&self) -> usize {
        self.reaped.load(Ordering::SeqCst)
    }
}

impl Launcher for MockLauncher {
    type Worker = MockWorker;

    fn launch(&self, position: usize) -> Result<MockWorker, LaunchError> {
        if self.fail_from.is_some_and(|from| position >= from) {
            return Err(LaunchError::Spawn {
                executable: "mock-amplifier".into(),
                source: io::Error::new(io::ErrorKind::NotFound, "mock launch failure"),
            });
        }
        self.launched.fetch_add(1, Ordering::SeqCst);
        let program = self
            .overrides
            .get(&position)
            .unwrap_or(&self.program)
            .clone();
        let mut worker = MockWorker::new(position, program);
        worker.reaped = Arc::clone(&self.reaped);
        Ok(worker)
    }
}
