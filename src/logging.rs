//! Tracing subscriber setup for the ampring binaries.
//!
//! Logs go to stderr so stdout carries only the search result.
//!
//! # Filter priority (highest to lowest)
//!
//! 1. `AMPRING_LOG` env var (directives, e.g. `ampring=trace,warn`)
//! 2. `RUST_LOG`
//! 3. `-v` / `-q` flags
//! 4. `warn`

use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Crate-specific filter variable.
pub const LOG_ENV: &str = "AMPRING_LOG";

/// Target prefix of every event this crate emits.
pub const TARGET_PREFIX: &str = "ampring";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// Verbose wins when both flags are given.
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    pub const fn default_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
        }
    }

    /// Filter used when no env var is set.
    ///
    /// Verbose raises only this crate to debug; dependencies stay at warn.
    pub fn default_directive(self) -> String {
        if self == Self::Verbose {
            format!("{},{TARGET_PREFIX}=debug", Level::WARN)
        } else {
            self.default_level().to_string()
        }
    }
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init_subscriber(verbosity: Verbosity, no_color: bool) {
    let use_ansi = !no_color && std::io::IsTerminal::is_terminal(&std::io::stderr());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi)
        .with_target(true)
        .without_time()
        .compact();

    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(build_env_filter(verbosity))
        .with(fmt_layer)
        .try_init();
}

fn build_env_filter(verbosity: Verbosity) -> EnvFilter {
    if let Ok(directives) = std::env::var(LOG_ENV) {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let directive = verbosity.default_directive();
    EnvFilter::try_new(&directive)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_level().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Verbose);
    }

    #[test]
    fn test_default_directives_parse() {
        for verbosity in [Verbosity::Quiet, Verbosity::Normal, Verbosity::Verbose] {
            let directive = verbosity.default_directive();
            assert!(EnvFilter::try_new(&directive).is_ok(), "{directive}");
        }
        assert_eq!(Verbosity::Verbose.default_directive(), "WARN,ampring=debug");
        assert_eq!(Verbosity::Normal.default_directive(), "WARN");
        assert_eq!(Verbosity::Quiet.default_directive(), "ERROR");
    }
}
