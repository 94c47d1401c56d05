//! The ordered set of amplifiers for one session.
//!
//! Handle `i` feeds handle `(i + 1) mod N`; the last handle feeds the first.
//! A ring is built for exactly one phase ordering and torn down when the
//! session ends, whether it ended cleanly or not. Dropping a ring tears it
//! down too, so a panic or early return never leaves processes running.

use tracing::debug;

use crate::error::LaunchError;
use crate::signal::PhaseSetting;
use crate::worker::{Launcher, Worker};

pub struct Ring<W: Worker> {
    handles: Vec<W>,
    phases: Vec<PhaseSetting>,
}

impl<W: Worker> Ring<W> {
    /// Start one worker per phase, in ring order.
    ///
    /// If any launch fails, the workers already started are torn down before
    /// the error is returned.
    pub fn launch<L>(launcher: &L, phases: &[PhaseSetting]) -> Result<Self, LaunchError>
    where
        L: Launcher<Worker = W>,
    {
        let mut ring = Ring {
            handles: Vec::with_capacity(phases.len()),
            phases: phases.to_vec(),
        };
        for position in 0..phases.len() {
            ring.handles.push(launcher.launch(position)?);
        }
        debug!(size = ring.len(), "ring launched");
        Ok(ring)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Position that receives what `position` produces.
    pub fn successor(&self, position: usize) -> usize {
        (position + 1) % self.len()
    }

    pub fn phase(&self, position: usize) -> PhaseSetting {
        self.phases[position]
    }

    pub fn phases(&self) -> &[PhaseSetting] {
        &self.phases
    }

    pub fn handle(&self, position: usize) -> &W {
        &self.handles[position]
    }

    pub fn handle_mut(&mut self, position: usize) -> &mut W {
        &mut self.handles[position]
    }

    /// Terminate every handle regardless of its reported liveness.
    pub fn teardown(&mut self) {
        for handle in &mut self.handles {
            handle.terminate();
        }
    }
}

impl<W: Worker> Drop for Ring<W> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::{MockLauncher, StubOp, StubProgram};

    #[test]
    fn test_successor_wraps() {
        let launcher = MockLauncher::new(StubProgram::new(StubOp::Add));
        let ring = Ring::launch(&launcher, &[5, 6, 7]).unwrap();
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.successor(0), 1);
        assert_eq!(ring.successor(1), 2);
        assert_eq!(ring.successor(2), 0);
        assert_eq!(ring.phase(2), 7);
        assert_eq!(ring.handle(1).position(), 1);
    }

    #[test]
    fn test_single_handle_feeds_itself() {
        let launcher = MockLauncher::new(StubProgram::new(StubOp::Add));
        let ring = Ring::launch(&launcher, &[5]).unwrap();
        assert_eq!(ring.successor(0), 0);
    }

    #[test]
    fn test_drop_tears_down_every_handle() {
        let launcher = MockLauncher::new(StubProgram::new(StubOp::Add));
        {
            let mut ring = Ring::launch(&launcher, &[1, 2, 3, 4]).unwrap();
            ring.teardown();
            assert!(ring.handle(3).is_terminated());
        }
        assert_eq!(launcher.launched(), 4);
        assert_eq!(launcher.reaped(), 4);
    }

    #[test]
    fn test_partial_launch_reaps_started_handles() {
        let launcher = MockLauncher::failing_at(StubProgram::new(StubOp::Add), 2);
        let result = Ring::launch(&launcher, &[5, 6, 7]);
        assert!(matches!(result, Err(LaunchError::Spawn { .. })));
        assert_eq!(launcher.launched(), 2);
        assert_eq!(launcher.reaped(), 2);
    }
}
