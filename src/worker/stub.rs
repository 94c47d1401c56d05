//! Arithmetic stand-in for a real amplifier program.
//!
//! A stub program is a small TOML file:
//!
//! ```toml
//! op = "add"      # add | mul | double
//! exchanges = 2   # signals consumed before exiting; omit to run forever
//! silent = false  # exit right after reading the phase
//! ```
//!
//! The same [`StubMachine`] drives both the `ampring-stub` binary and the
//! in-process [`MockWorker`](super::MockWorker), so tests against either one
//! see identical arithmetic.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::signal::{self, PhaseSetting, Signal};

/// Arithmetic applied to every received signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StubOp {
    /// `signal + phase`
    Add,
    /// `signal * phase`
    Mul,
    /// `signal * 2`, phase ignored
    Double,
}

impl StubOp {
    pub fn apply(self, signal: Signal, phase: PhaseSetting) -> Signal {
        match self {
            StubOp::Add => signal.wrapping_add(phase),
            StubOp::Mul => signal.wrapping_mul(phase),
            StubOp::Double => signal.wrapping_mul(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StubProgram {
    pub op: StubOp,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchanges: Option<u32>,

    #[serde(default)]
    pub silent: bool,
}

impl StubProgram {
    pub fn new(op: StubOp) -> Self {
        Self {
            op,
            exchanges: None,
            silent: false,
        }
    }

    /// Exit after consuming `count` signals.
    pub fn exchanges(mut self, count: u32) -> Self {
        self.exchanges = Some(count);
        self
    }

    /// Exit right after reading the phase, without producing output.
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid stub program")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read stub program {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).context("failed to serialize stub program")
    }

    /// Serve the amplifier protocol over a line reader and writer.
    ///
    /// Returns when the program finishes or the input is exhausted. Each
    /// output line is flushed before the next input line is read.
    pub fn run(&self, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
        let mut machine = StubMachine::new(self.clone());
        for line in input.lines() {
            let value = signal::parse(&line?)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let feed = machine.feed(value);
            if let Some(out) = feed.output {
                output.write_all(signal::encode(out).as_bytes())?;
                output.flush()?;
            }
            if feed.finished {
                break;
            }
        }
        Ok(())
    }
}

/// Result of feeding one input line to a [`StubMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feed {
    pub output: Option<Signal>,
    /// The program has exited; no further input is accepted.
    pub finished: bool,
}

/// Line-at-a-time state of a stub program.
#[derive(Debug, Clone)]
pub struct StubMachine {
    program: StubProgram,
    phase: Option<PhaseSetting>,
    consumed: u32,
}

impl StubMachine {
    pub fn new(program: StubProgram) -> Self {
        Self {
            program,
            phase: None,
            consumed: 0,
        }
    }

    pub fn feed(&mut self, value: i64) -> Feed {
        let Some(phase) = self.phase else {
            self.phase = Some(value);
            return Feed {
                output: None,
                finished: self.program.silent,
            };
        };

        self.consumed += 1;
        Feed {
            output: Some(self.program.op.apply(value, phase)),
            finished: self.program.exchanges.is_some_and(|limit| self.consumed >= limit),
        }
    }
}
