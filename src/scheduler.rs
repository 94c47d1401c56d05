//! Feedback scheduler: runs one ring to quiescence.
//!
//! ```text
//!   init:   phase₀,0 ─▶ [0] ─▶ phase₁,s ─▶ [1] ─▶ … ─▶ [N-1] ─┐
//!                                                              │ s
//!   steady: ┌─▶ [0] ─▶ [1] ─▶ … ─▶ [N-1] ─┐                    │
//!           └──────────── s ──────────────┘ ◀──────────────────┘
//! ```
//!
//! Exactly one signal is in flight. It is sent to one handle, that handle's
//! single reply replaces it, and only then is the next handle touched.
//!
//! The session ends the first time a handle is found dead at the moment it
//! would receive the signal; that handle is neither written to nor read from.
//! A failed write, end of stream, an unparseable line or an expired receive
//! timeout end the session the same way. In every case the result is the last
//! signal successfully received.

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::{RecvError, WriteError};
use crate::ring::Ring;
use crate::signal::{Signal, INITIAL_SIGNAL};
use crate::worker::Worker;

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum SessionEnd {
    /// A handle was found not alive before its turn.
    Quiescent { position: usize },
    /// A handle's output hit end of stream mid-exchange.
    StreamClosed { position: usize },
    /// A handle's input could not be written.
    WriteFailed { position: usize },
    /// A handle produced a line that is not an integer.
    Malformed { position: usize },
    /// A handle produced nothing within the receive timeout.
    TimedOut { position: usize },
    /// Every handle ran once (serial chain only).
    Completed,
}

impl SessionEnd {
    /// True for the expected ways a session ends.
    pub fn is_clean(&self) -> bool {
        matches!(
            self,
            SessionEnd::Quiescent { .. } | SessionEnd::StreamClosed { .. } | SessionEnd::Completed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    /// Final signal of the session.
    pub signal: Signal,
    pub end: SessionEnd,
    /// Completed send/receive pairs, initialization included.
    pub exchanges: usize,
}

pub(crate) fn write_failed(position: usize, err: &WriteError) -> SessionEnd {
    trace!(position, error = %err, "write failed");
    SessionEnd::WriteFailed { position }
}

pub(crate) fn recv_failed(position: usize, err: &RecvError) -> SessionEnd {
    match err {
        RecvError::Terminated => SessionEnd::StreamClosed { position },
        RecvError::TimedOut(timeout) => {
            warn!(position, ?timeout, "amplifier timed out");
            SessionEnd::TimedOut { position }
        }
        RecvError::Malformed(e) => {
            warn!(position, error = %e, "amplifier produced malformed output");
            SessionEnd::Malformed { position }
        }
        RecvError::Io(e) => {
            warn!(position, error = %e, "read from amplifier failed");
            SessionEnd::StreamClosed { position }
        }
    }
}

/// Send one signal and take the single reply.
pub(crate) fn exchange<W: Worker>(worker: &mut W, signal: Signal) -> Result<Signal, SessionEnd> {
    let position = worker.position();
    worker
        .send_line(signal)
        .map_err(|e| write_failed(position, &e))?;
    worker.recv_line().map_err(|e| recv_failed(position, &e))
}

/// Drive `ring` until a handle terminates, then tear the ring down.
pub fn run_session<W: Worker>(ring: &mut Ring<W>) -> SessionReport {
    let mut signal = INITIAL_SIGNAL;
    let mut exchanges = 0;

    let end = match initialize(ring, &mut signal, &mut exchanges) {
        Ok(()) => steady_state(ring, &mut signal, &mut exchanges),
        Err(end) => end,
    };

    ring.teardown();
    debug!(signal, exchanges, ?end, "session finished");

    SessionReport {
        signal,
        end,
        exchanges,
    }
}

/// Phase then signal to each handle, strictly in order 0..N-1.
fn initialize<W: Worker>(
    ring: &mut Ring<W>,
    signal: &mut Signal,
    exchanges: &mut usize,
) -> Result<(), SessionEnd> {
    for position in 0..ring.len() {
        let phase = ring.phase(position);
        let worker = ring.handle_mut(position);
        worker
            .send_line(phase)
            .map_err(|e| write_failed(position, &e))?;
        *signal = exchange(worker, *signal)?;
        *exchanges += 1;
    }
    Ok(())
}

fn steady_state<W: Worker>(
    ring: &mut Ring<W>,
    signal: &mut Signal,
    exchanges: &mut usize,
) -> SessionEnd {
    if ring.is_empty() {
        return SessionEnd::Completed;
    }
    let mut position = 0;
    loop {
        let worker = ring.handle_mut(position);
        if !worker.is_alive() {
            return SessionEnd::Quiescent { position };
        }
        match exchange(worker, *signal) {
            Ok(next) => {
                *signal = next;
                *exchanges += 1;
            }
            Err(end) => return end,
        }
        position = ring.successor(position);
    }
}
