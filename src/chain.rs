//! Single-pass amplifier chain, no feedback.
//!
//! Each amplifier is started, given its phase and the current signal, and
//! asked for exactly one line before it is torn down and the next one is
//! started. Only one amplifier is alive at a time.

use tracing::debug;

use crate::error::LaunchError;
use crate::scheduler::{exchange, write_failed, SessionEnd, SessionReport};
use crate::signal::{PhaseSetting, INITIAL_SIGNAL};
use crate::worker::{Launcher, Worker};

/// Run one pass through the chain for `phases`.
///
/// A worker that fails mid-exchange stops the pass with the last signal
/// received. Only a launch failure is returned as an error.
pub fn run_chain<L: Launcher>(
    launcher: &L,
    phases: &[PhaseSetting],
) -> Result<SessionReport, LaunchError> {
    let mut signal = INITIAL_SIGNAL;
    let mut exchanges = 0;
    let mut end = SessionEnd::Completed;

    for (position, &phase) in phases.iter().enumerate() {
        let mut worker = launcher.launch(position)?;
        let step = worker
            .send_line(phase)
            .map_err(|e| write_failed(position, &e))
            .and_then(|()| exchange(&mut worker, signal));
        worker.terminate();

        match step {
            Ok(next) => {
                signal = next;
                exchanges += 1;
            }
            Err(stop) => {
                end = stop;
                break;
            }
        }
    }

    debug!(signal, exchanges, ?end, "chain finished");
    Ok(SessionReport {
        signal,
        end,
        exchanges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::{MockLauncher, StubOp, StubProgram};

    #[test]
    fn test_chain_passes_signal_forward() {
        let launcher = MockLauncher::new(StubProgram::new(StubOp::Add));
        let report = run_chain(&launcher, &[4, 3, 2, 1, 0]).unwrap();
        assert_eq!(report.signal, 10);
        assert_eq!(report.exchanges, 5);
        assert_eq!(report.end, SessionEnd::Completed);
        assert_eq!(launcher.launched(), 5);
        assert_eq!(launcher.reaped(), 5);
    }

    #[test]
    fn test_chain_order_matters_for_mul() {
        let launcher = MockLauncher::new(StubProgram::new(StubOp::Mul).exchanges(1));
        // Starts at 0, so everything multiplies to 0.
        assert_eq!(run_chain(&launcher, &[2, 3]).unwrap().signal, 0);
    }

    #[test]
    fn test_chain_stops_at_silent_worker() {
        let launcher = MockLauncher::new(StubProgram::new(StubOp::Add))
            .with_program_at(1, StubProgram::new(StubOp::Add).silent());
        let report = run_chain(&launcher, &[4, 3, 2]).unwrap();
        assert_eq!(report.signal, 4);
        assert_eq!(report.end, SessionEnd::WriteFailed { position: 1 });
        assert_eq!(launcher.launched(), 2);
    }

    #[test]
    fn test_chain_launch_failure() {
        let launcher = MockLauncher::failing(StubProgram::new(StubOp::Add));
        assert!(run_chain(&launcher, &[0, 1]).is_err());
    }
}
