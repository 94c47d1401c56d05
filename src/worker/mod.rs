//! Amplifier handles.
//!
//! An amplifier is an external program that reads newline-delimited integers
//! on stdin and writes newline-delimited integers on stdout. This module wraps
//! one running amplifier behind the [`Worker`] trait so the ring and the
//! scheduler never touch process plumbing directly.
//!
//! # Architecture
//!
//! ```text
//! Launcher ──launch(position)──▶ Worker
//!   ├── WorkerSpec   → ProcessWorker   # spawned executable, piped stdio
//!   └── MockLauncher → MockWorker      # in-process StubMachine, no I/O
//! ```
//!
//! # Lifecycle
//!
//! 1. `launch` spawns the program (`LaunchError` if it cannot start)
//! 2. `send_line` / `recv_line` exchange one line at a time, flushed eagerly
//! 3. End of stream on output is reported as `RecvError::Terminated`
//! 4. `terminate` kills and reaps; calling it again is a no-op
//!
//! `is_alive` is a liveness probe only. A live worker may still have nothing
//! to say, and a worker that just exited may still have a final line buffered.

mod mock;
mod process;
mod stub;

pub use mock::{MockLauncher, MockWorker};
pub use process::{ProcessWorker, WorkerSpec};
pub use stub::{Feed, StubMachine, StubOp, StubProgram};

use crate::error::{LaunchError, RecvError, WriteError};
use crate::signal::Signal;

/// One running amplifier and its two directional streams.
pub trait Worker {
    /// Position of this worker in its ring (0..N-1).
    fn position(&self) -> usize;

    /// Write `value` as one line and flush it.
    fn send_line(&mut self, value: i64) -> Result<(), WriteError>;

    /// Block until one line is available and parse it.
    ///
    /// Returns `RecvError::Terminated` once the output stream is exhausted.
    fn recv_line(&mut self) -> Result<Signal, RecvError>;

    /// Non-blocking liveness check.
    fn is_alive(&mut self) -> bool;

    /// Best-effort kill and reap. Idempotent.
    fn terminate(&mut self);
}

/// Starts workers for a ring.
///
/// Implemented by [`WorkerSpec`] for real processes and by [`MockLauncher`]
/// for tests, so the scheduler and search can be generic over both.
pub trait Launcher {
    type Worker: Worker;

    fn launch(&self, position: usize) -> Result<Self::Worker, LaunchError>;
}
