//! ampring - amplifier feedback ring orchestrator
//!
//! Drives N external amplifier processes wired stdout→stdin in a cycle and
//! searches every ordering of their phase settings for the one that yields
//! the largest final signal.
//!
//! # Architecture
//!
//! ```text
//! Permutation Search → Ring → Feedback Scheduler → Worker
//!        ↓              ↓            ↓                ↓
//!   N! orderings   N handles    round robin      child process
//!   best-so-far    i → i+1      to quiescence    line pipes
//! ```
//!
//! The amplifier program itself is opaque: anything that reads and writes
//! newline-delimited integers on stdio works. `ampring-stub` is a small
//! arithmetic amplifier for tests and demos.

pub mod chain;
pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod ring;
pub mod scheduler;
pub mod search;
pub mod signal;
pub mod worker;

pub use error::{LaunchError, RecvError, SearchError, WriteError};
pub use ring::Ring;
pub use scheduler::{run_session, SessionEnd, SessionReport};
pub use search::{search, search_with, BestResult, Mode, SearchOutcome, TrialOutcome};
pub use signal::{PhaseSetting, Signal};
pub use worker::{Launcher, ProcessWorker, Worker, WorkerSpec};
