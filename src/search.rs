//! Permutation search over phase orderings.
//!
//! Every ordering of the phase set is tried exactly once, each on a fresh
//! ring, and the ordering with the strictly largest final signal wins.
//! Orderings are enumerated lexicographically by input position, so for a
//! sorted phase set the first ordering is the set itself and ties resolve to
//! whichever ordering came first.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chain::run_chain;
use crate::error::SearchError;
use crate::ring::Ring;
use crate::scheduler::{run_session, SessionReport};
use crate::signal::{format_ordering, PhaseSetting, Signal};
use crate::worker::Launcher;

/// How amplifiers are wired for each trial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Ring with the last amplifier feeding the first, run to quiescence.
    #[default]
    Feedback,
    /// One pass through the chain, each amplifier used once.
    Serial,
}

impl Mode {
    /// Phase set used when none is configured.
    pub fn default_phases(self) -> Vec<PhaseSetting> {
        match self {
            Mode::Feedback => (5..=9).collect(),
            Mode::Serial => (0..=4).collect(),
        }
    }
}

/// Best ordering seen so far and its final signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestResult {
    pub ordering: Vec<PhaseSetting>,
    pub signal: Signal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    pub best: BestResult,
    /// Number of orderings evaluated.
    pub trials: usize,
}

/// One evaluated ordering, handed to the search observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialOutcome {
    pub index: usize,
    pub ordering: Vec<PhaseSetting>,
    pub report: SessionReport,
}

/// Try every ordering of `phases` and return the best.
pub fn search<L: Launcher>(
    launcher: &L,
    phases: &[PhaseSetting],
    mode: Mode,
) -> Result<SearchOutcome, SearchError> {
    search_with(launcher, phases, mode, |_| {})
}

/// Like [`search`], calling `observe` after every trial.
pub fn search_with<L, F>(
    launcher: &L,
    phases: &[PhaseSetting],
    mode: Mode,
    mut observe: F,
) -> Result<SearchOutcome, SearchError>
where
    L: Launcher,
    F: FnMut(&TrialOutcome),
{
    validate_phases(phases)?;
    info!(phases = %format_ordering(phases), ?mode, "starting permutation search");

    let mut best: Option<BestResult> = None;
    let mut trials = 0;

    for ordering in Permutations::new(phases.to_vec()) {
        let report = match mode {
            Mode::Feedback => {
                let mut ring = Ring::launch(launcher, &ordering)?;
                run_session(&mut ring)
            }
            Mode::Serial => run_chain(launcher, &ordering)?,
        };

        debug!(
            trial = trials,
            ordering = %format_ordering(&ordering),
            signal = report.signal,
            "trial finished"
        );

        let improves = best.as_ref().map_or(true, |b| report.signal > b.signal);
        let trial = TrialOutcome {
            index: trials,
            ordering,
            report,
        };
        observe(&trial);
        if improves {
            best = Some(BestResult {
                ordering: trial.ordering,
                signal: report.signal,
            });
        }
        trials += 1;
    }

    // validate_phases rejects the empty set, so at least one trial ran.
    let best = best.ok_or_else(|| SearchError::InvalidPhases(phases.to_vec()))?;
    info!(
        ordering = %format_ordering(&best.ordering),
        signal = best.signal,
        trials,
        "search finished"
    );
    Ok(SearchOutcome { best, trials })
}

fn validate_phases(phases: &[PhaseSetting]) -> Result<(), SearchError> {
    let distinct: HashSet<_> = phases.iter().collect();
    if phases.is_empty() || distinct.len() != phases.len() {
        return Err(SearchError::InvalidPhases(phases.to_vec()));
    }
    Ok(())
}

/// All orderings of a list, in lexicographic order of input positions.
pub struct Permutations<T> {
    items: Vec<T>,
    indices: Vec<usize>,
    done: bool,
}

impl<T: Clone> Permutations<T> {
    pub fn new(items: Vec<T>) -> Self {
        let indices = (0..items.len()).collect();
        Self {
            items,
            indices,
            done: false,
        }
    }
}

impl<T: Clone> Iterator for Permutations<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        if self.done {
            return None;
        }
        let current = self.indices.iter().map(|&i| self.items[i].clone()).collect();
        self.done = !next_permutation(&mut self.indices);
        Some(current)
    }
}

/// Advance to the next lexicographic permutation. False after the last one.
fn next_permutation(indices: &mut [usize]) -> bool {
    let n = indices.len();
    if n < 2 {
        return false;
    }
    let mut i = n - 1;
    while i > 0 && indices[i - 1] >= indices[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = n - 1;
    while indices[j] <= indices[i - 1] {
        j -= 1;
    }
    indices.swap(i - 1, j);
    indices[i..].reverse();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LaunchError;
    use crate::worker::{MockLauncher, StubOp, StubProgram};

    #[test]
    fn test_permutation_order() {
        let all: Vec<_> = Permutations::new(vec![1, 2, 3]).collect();
        assert_eq!(
            all,
            vec![
                vec![1, 2, 3],
                vec![1, 3, 2],
                vec![2, 1, 3],
                vec![2, 3, 1],
                vec![3, 1, 2],
                vec![3, 2, 1],
            ]
        );
    }

    #[test]
    fn test_permutation_counts() {
        assert_eq!(Permutations::new(vec![7]).count(), 1);
        assert_eq!(Permutations::new(vec![5, 6, 7, 8, 9]).count(), 120);
        let distinct: HashSet<_> = Permutations::new(vec![0, 1, 2, 3, 4, 5]).collect();
        assert_eq!(distinct.len(), 720);
    }

    #[test]
    fn test_every_ordering_evaluated_once() {
        let launcher = MockLauncher::new(StubProgram::new(StubOp::Add).exchanges(2));
        let mut seen = HashSet::new();
        let outcome = search_with(&launcher, &[5, 6, 7, 8], Mode::Feedback, |trial| {
            assert!(seen.insert(trial.ordering.clone()), "duplicate ordering");
        })
        .unwrap();
        assert_eq!(outcome.trials, 24);
        assert_eq!(seen.len(), 24);
        assert_eq!(launcher.launched(), 24 * 4);
        assert_eq!(launcher.reaped(), 24 * 4);
    }

    #[test]
    fn test_feedback_add_ties_keep_first() {
        // out = in + phase, two signals each: every ordering sums to 2 * 35.
        let launcher = MockLauncher::new(StubProgram::new(StubOp::Add).exchanges(2));
        let outcome = search(&launcher, &[5, 6, 7, 8, 9], Mode::Feedback).unwrap();
        assert_eq!(outcome.best.signal, 70);
        assert_eq!(outcome.best.ordering, vec![5, 6, 7, 8, 9]);
        assert_eq!(outcome.trials, 120);
    }

    #[test]
    fn test_first_of_equal_maxima_wins() {
        // Position 0 multiplies, the rest add. For ordering [a, b, c] the
        // final signal is (a + 1) * (b + c): 10 for a = 1, 12 for a = 2 or 3.
        let launcher = MockLauncher::new(StubProgram::new(StubOp::Add).exchanges(2))
            .with_program_at(0, StubProgram::new(StubOp::Mul).exchanges(2));
        let mut signals = Vec::new();
        let outcome = search_with(&launcher, &[1, 2, 3], Mode::Feedback, |trial| {
            signals.push(trial.report.signal)
        })
        .unwrap();
        assert_eq!(signals, vec![10, 10, 12, 12, 12, 12]);
        assert_eq!(outcome.best.ordering, vec![2, 1, 3]);
        assert_eq!(outcome.best.signal, 12);
    }

    #[test]
    fn test_serial_mode() {
        let launcher = MockLauncher::new(StubProgram::new(StubOp::Add));
        let outcome = search(&launcher, &[0, 1, 2, 3, 4], Mode::Serial).unwrap();
        assert_eq!(outcome.best.signal, 10);
        assert_eq!(outcome.best.ordering, vec![0, 1, 2, 3, 4]);
        assert_eq!(outcome.trials, 120);
    }

    #[test]
    fn test_invalid_phases() {
        let launcher = MockLauncher::new(StubProgram::new(StubOp::Add));
        assert!(matches!(
            search(&launcher, &[], Mode::Feedback),
            Err(SearchError::InvalidPhases(_))
        ));
        assert!(matches!(
            search(&launcher, &[5, 5, 6], Mode::Feedback),
            Err(SearchError::InvalidPhases(p)) if p == vec![5, 5, 6]
        ));
        assert_eq!(launcher.launched(), 0);
    }

    #[test]
    fn test_launch_failure_aborts_search() {
        let launcher = MockLauncher::failing(StubProgram::new(StubOp::Add));
        let mut trials = 0;
        let result = search_with(&launcher, &[5, 6], Mode::Feedback, |_| trials += 1);
        assert!(matches!(result, Err(SearchError::Launch(LaunchError::Spawn { .. }))));
        assert_eq!(trials, 0);
    }

    #[test]
    fn test_default_phases() {
        assert_eq!(Mode::Feedback.default_phases(), vec![5, 6, 7, 8, 9]);
        assert_eq!(Mode::Serial.default_phases(), vec![0, 1, 2, 3, 4]);
    }
}
