//! Configuration loading from ampring.toml.
//!
//! ## Example
//!
//! ```toml
//! executable = "./intcode"
//! program = "input/day7-part2-input.txt"
//! mode = "feedback"
//! phases = [5, 6, 7, 8, 9]
//! timeout-ms = 5000
//! quiet-workers = true
//! ```
//!
//! Every key is optional in the file. Command-line flags override file
//! values; `executable` and `program` must be known after merging.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::warn;

use crate::search::Mode;
use crate::signal::{format_ordering, PhaseSetting};
use crate::worker::WorkerSpec;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "ampring.toml";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Source file for this config (for display).
    pub source: Option<PathBuf>,

    /// Amplifier executable.
    pub executable: Option<PathBuf>,

    /// Program file handed to every amplifier.
    pub program: Option<PathBuf>,

    pub mode: Mode,

    /// Phase set to permute. Falls back to the mode's default.
    pub phases: Option<Vec<PhaseSetting>>,

    /// Receive timeout per line, in milliseconds.
    pub timeout_ms: Option<u64>,

    /// Discard amplifier stderr.
    pub quiet_workers: bool,
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    executable: Option<PathBuf>,
    program: Option<PathBuf>,
    mode: Option<Mode>,
    phases: Option<Vec<PhaseSetting>>,
    timeout_ms: Option<u64>,
    quiet_workers: Option<bool>,
}

/// Values given on the command line. `None` leaves the file value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub executable: Option<PathBuf>,
    pub program: Option<PathBuf>,
    pub mode: Option<Mode>,
    pub phases: Option<Vec<PhaseSetting>>,
    pub timeout_ms: Option<u64>,
    pub quiet_workers: Option<bool>,
}

impl Config {
    /// Load `ampring.toml` from `directory` if present.
    ///
    /// A missing file yields the defaults. An unreadable or invalid file is
    /// reported and also yields the defaults.
    pub fn load(directory: &Path) -> Self {
        let path = directory.join(CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }
        match Self::load_file(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{e:#}"), "ignoring config file");
                Self::default()
            }
        }
    }

    /// Load an explicitly requested config file. Any failure is an error.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let raw: RawConfig = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(Self::from_raw(raw, path.to_path_buf()))
    }

    fn from_raw(raw: RawConfig, source: PathBuf) -> Self {
        Self {
            source: Some(source),
            executable: raw.executable,
            program: raw.program,
            mode: raw.mode.unwrap_or_default(),
            phases: raw.phases,
            timeout_ms: raw.timeout_ms,
            quiet_workers: raw.quiet_workers.unwrap_or(false),
        }
    }

    /// Apply command-line values on top of this config.
    pub fn merge(mut self, overrides: Overrides) -> Self {
        if overrides.executable.is_some() {
            self.executable = overrides.executable;
        }
        if overrides.program.is_some() {
            self.program = overrides.program;
        }
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if overrides.phases.is_some() {
            self.phases = overrides.phases;
        }
        if overrides.timeout_ms.is_some() {
            self.timeout_ms = overrides.timeout_ms;
        }
        if let Some(quiet) = overrides.quiet_workers {
            self.quiet_workers = quiet;
        }
        self
    }

    pub fn effective_phases(&self) -> Vec<PhaseSetting> {
        self.phases
            .clone()
            .unwrap_or_else(|| self.mode.default_phases())
    }

    /// Build the amplifier launch spec.
    pub fn worker_spec(&self) -> Result<WorkerSpec> {
        let Some(executable) = &self.executable else {
            bail!("no amplifier executable given (pass EXECUTABLE or set `executable` in {CONFIG_FILE})");
        };
        let Some(program) = &self.program else {
            bail!("no program file given (pass PROGRAM or set `program` in {CONFIG_FILE})");
        };

        let mut spec = WorkerSpec::new(executable, program).quiet(self.quiet_workers);
        if let Some(ms) = self.timeout_ms {
            spec = spec.with_recv_timeout(Duration::from_millis(ms));
        }
        Ok(spec)
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let mut lines = Vec::new();

        match &self.source {
            Some(source) => lines.push(format!("   Config: {}", source.display())),
            None => lines.push("   Config: (defaults)".to_string()),
        }
        if let Some(executable) = &self.executable {
            lines.push(format!("   Amplifier: {}", executable.display()));
        }
        if let Some(program) = &self.program {
            lines.push(format!("   Program: {}", program.display()));
        }
        lines.push(format!("   Mode: {:?}", self.mode));
        lines.push(format!("   Phases: {}", format_ordering(&self.effective_phases())));
        if let Some(ms) = self.timeout_ms {
            lines.push(format!("   Timeout: {ms}ms"));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILE);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path());
        assert_eq!(config, Config::default());
        assert_eq!(config.effective_phases(), vec![5, 6, 7, 8, 9]);
        assert!(config.worker_spec().is_err());
    }

    #[test]
    fn test_load_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
executable = "./intcode"
program = "day7.txt"
mode = "serial"
phases = [4, 3, 2]
timeout-ms = 250
quiet-workers = true
"#,
        );
        let config = Config::load(dir.path());
        assert_eq!(config.source, Some(path));
        assert_eq!(config.mode, Mode::Serial);
        assert_eq!(config.effective_phases(), vec![4, 3, 2]);

        let spec = config.worker_spec().unwrap();
        assert_eq!(spec.executable, PathBuf::from("./intcode"));
        assert_eq!(spec.program, PathBuf::from("day7.txt"));
        assert_eq!(spec.recv_timeout, Some(Duration::from_millis(250)));
        assert!(spec.quiet);
    }

    #[test]
    fn test_serial_mode_default_phases() {
        let config = Config {
            mode: Mode::Serial,
            ..Default::default()
        };
        assert_eq!(config.effective_phases(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_invalid_file_falls_back_but_explicit_load_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "mode = \"sideways\"\n");
        assert_eq!(Config::load(dir.path()), Config::default());
        assert!(Config::load_file(&path).is_err());

        write_config(dir.path(), "phasez = [1]\n");
        assert!(Config::load_file(&path).is_err());
    }

    #[test]
    fn test_merge_overrides() {
        let base = Config {
            executable: Some("./intcode".into()),
            program: Some("a.txt".into()),
            timeout_ms: Some(100),
            ..Default::default()
        };
        let merged = base.merge(Overrides {
            program: Some("b.txt".into()),
            mode: Some(Mode::Serial),
            phases: Some(vec![1, 2]),
            quiet_workers: Some(true),
            ..Default::default()
        });
        assert_eq!(merged.executable, Some(PathBuf::from("./intcode")));
        assert_eq!(merged.program, Some(PathBuf::from("b.txt")));
        assert_eq!(merged.mode, Mode::Serial);
        assert_eq!(merged.phases, Some(vec![1, 2]));
        assert_eq!(merged.timeout_ms, Some(100));
        assert!(merged.quiet_workers);
    }

    #[test]
    fn test_cli_can_unset_quiet_workers() {
        let base = Config {
            quiet_workers: true,
            ..Default::default()
        };
        assert!(base.clone().merge(Overrides::default()).quiet_workers);
        let merged = base.merge(Overrides {
            quiet_workers: Some(false),
            ..Default::default()
        });
        assert!(!merged.quiet_workers);
    }
}
