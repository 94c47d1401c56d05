//! ampring-stub: arithmetic amplifier for tests and demos.
//!
//! Speaks the amplifier protocol on stdio: the first input line is the phase
//! setting, every later line is a signal answered with exactly one output
//! line. Behavior comes from the program file given as the only argument.
//!
//! ```bash
//! printf 'op = "add"\nexchanges = 2\n' > add.toml
//! ampring ./target/debug/ampring-stub add.toml
//! ```

use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use ampring::worker::StubProgram;

#[derive(Parser, Debug)]
#[command(name = "ampring-stub")]
#[command(about = "Arithmetic amplifier speaking the ampring line protocol")]
struct Args {
    /// TOML stub program (op, exchanges, silent)
    program: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let program = StubProgram::load(&args.program)?;

    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());
    program
        .run(stdin, stdout)
        .context("amplifier protocol error")?;

    Ok(())
}
