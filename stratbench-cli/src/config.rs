//! Configuration loading from stratbench.toml
//!
//! Settings can be placed in a `stratbench.toml` discovered by walking up
//! from the current directory. CLI flags always win over file values; the
//! file only changes defaults.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StratConfig {
    /// Task-set and worker-count defaults.
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Workload parameter defaults.
    #[serde(default)]
    pub workload: WorkloadConfig,
}

/// Which CPU-bound workload the comparison runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CpuKind {
    /// Trial-division prime counting (the original demonstration's choice).
    #[default]
    Primes,
    /// Sum of squares.
    Squares,
}

/// Runner defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Number of tasks per comparison.
    #[serde(default = "default_tasks")]
    pub tasks: usize,
    /// Worker count for the pooled strategies. `None` means one worker per
    /// available core.
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tasks: default_tasks(),
            workers: None,
        }
    }
}

/// Workload parameter defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// CPU workload kind: "primes" or "squares".
    #[serde(default)]
    pub cpu_kind: CpuKind,
    /// Upper bound for the CPU workload.
    #[serde(default = "default_cpu_limit")]
    pub cpu_limit: u64,
    /// Simulated wait per I/O task (e.g. "250ms", "1s").
    #[serde(default = "default_io_wait")]
    pub io_wait: String,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            cpu_kind: CpuKind::default(),
            cpu_limit: default_cpu_limit(),
            io_wait: default_io_wait(),
        }
    }
}

fn default_tasks() -> usize {
    4
}
fn default_cpu_limit() -> u64 {
    50_000
}
fn default_io_wait() -> String {
    "1s".to_string()
}

impl StratConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Discover and load `stratbench.toml` by walking up from the current
    /// directory. Returns `None` if no file is found or it fails to parse.
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("stratbench.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }
}

/// Parse a duration string like "500ms", "1.5s", "2m" into a [`Duration`].
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("empty duration string");
    }

    let (num_part, unit_part) = s
        .char_indices()
        .find(|(_, c)| c.is_alphabetic())
        .map(|(i, _)| s.split_at(i))
        .unwrap_or((s, "s"));

    let value: f64 = num_part
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid duration number: {num_part}"))?;
    if !value.is_finite() || value < 0.0 {
        anyhow::bail!("duration must be non-negative and finite: {s}");
    }

    let nanos_per_unit: f64 = match unit_part.to_lowercase().as_str() {
        "ns" => 1.0,
        "us" | "µs" => 1_000.0,
        "ms" => 1_000_000.0,
        "s" | "" => 1_000_000_000.0,
        "m" | "min" => 60_000_000_000.0,
        other => anyhow::bail!("unknown duration unit: {other}"),
    };

    Ok(Duration::from_nanos((value * nanos_per_unit) as u64))
}
