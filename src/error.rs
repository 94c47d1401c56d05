use std::path::PathBuf;

use thiserror::Error;

use crate::signal::{ParseSignalError, PhaseSetting};

/// An amplifier could not be started.
///
/// The executable is the same for every trial, so a launch failure means no
/// trial can succeed and the search stops.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to spawn amplifier {}: {source}. Check that the path exists and is executable.", executable.display())]
    Spawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("amplifier {} started without a piped {stream}", executable.display())]
    MissingPipe {
        executable: PathBuf,
        stream: &'static str,
    },
}

/// A line could not be delivered to an amplifier's input.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("amplifier input is closed")]
    Closed,

    #[error("write to amplifier failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A line could not be taken from an amplifier's output.
#[derive(Debug, Error)]
pub enum RecvError {
    /// End of stream: the amplifier exited. This is how sessions normally end.
    #[error("amplifier output reached end of stream")]
    Terminated,

    #[error(transparent)]
    Malformed(#[from] ParseSignalError),

    #[error("no output from amplifier within {0:?}")]
    TimedOut(std::time::Duration),

    #[error("read from amplifier failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that escape a permutation search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("phase settings must be non-empty and distinct, got {0:?}")]
    InvalidPhases(Vec<PhaseSetting>),
}
