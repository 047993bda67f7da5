#![warn(missing_docs)]
//! Stratbench CLI
//!
//! Entry point for the `stratbench` binary: parses flags, merges them with
//! an optional `stratbench.toml`, runs the selected workload comparisons,
//! and prints a human-readable report.
//!
//! The same binary doubles as the pool worker: the process-pool supervisor
//! re-executes it with the hidden `--pool-worker` flag, which switches it
//! into the IPC command loop before anything else initializes.

mod config;
mod driver;
mod report;
mod supervisor;

pub use config::{parse_duration, CpuKind, RunnerConfig, StratConfig, WorkloadConfig};
pub use driver::{
    build_cpu_tasks, build_io_tasks, compare, Comparison, StrategyKind, StrategyRun,
};
pub use report::{format_duration, render};
pub use supervisor::{ProcessPool, SupervisorError, WorkerHandle};

use clap::{Parser, ValueEnum};
use stratbench_core::{TaskSpec, WorkerMain};

/// Which workload comparisons to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum WorkloadChoice {
    /// CPU-bound comparison only.
    Cpu,
    /// I/O-bound comparison only.
    Io,
    /// Both, CPU first.
    #[default]
    All,
}

/// Stratbench CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "stratbench")]
#[command(
    version,
    about = "Compare sequential, thread-pool, and process-pool execution"
)]
pub struct Cli {
    /// Which workload comparison to run
    #[arg(long, value_enum, default_value = "all")]
    pub workload: WorkloadChoice,

    /// Number of tasks per comparison
    #[arg(long)]
    pub tasks: Option<usize>,

    /// Worker count for the pooled strategies (default: available cores)
    #[arg(long)]
    pub workers: Option<usize>,

    /// CPU workload kind
    #[arg(long, value_enum)]
    pub cpu_kind: Option<CpuKind>,

    /// Upper bound for the CPU workload
    #[arg(long)]
    pub cpu_limit: Option<u64>,

    /// Simulated wait per I/O task (e.g. "250ms", "1s")
    #[arg(long)]
    pub io_wait: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Internal: run as a pool worker (used by the process-pool supervisor)
    #[arg(long, hide = true)]
    pub pool_worker: bool,

    /// Internal: append a task that always fails, to exercise error
    /// reporting end to end
    #[arg(long, hide = true)]
    pub inject_failure: bool,
}

/// Parse arguments and run. Main entry point for the binary.
pub fn run() -> anyhow::Result<()> {
    run_with_cli(Cli::parse())
}

/// Run with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Worker mode first, before logging or config touch anything.
    if cli.pool_worker {
        let mut worker = WorkerMain::new();
        return worker.run().map_err(|e| anyhow::anyhow!("worker error: {e}"));
    }

    let filter = if cli.verbose {
        "stratbench=debug"
    } else {
        "stratbench=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = StratConfig::discover().unwrap_or_default();
    let settings = Settings::resolve(&cli, &config)?;

    tracing::debug!(
        tasks = settings.tasks,
        workers = settings.workers,
        "resolved settings"
    );

    let mut comparisons = Vec::new();
    if matches!(cli.workload, WorkloadChoice::Cpu | WorkloadChoice::All) {
        comparisons.push(run_cpu_comparison(&cli, &settings));
    }
    if matches!(cli.workload, WorkloadChoice::Io | WorkloadChoice::All) {
        comparisons.push(run_io_comparison(&cli, &settings));
    }

    print!("{}", render(&comparisons));

    let failed: usize = comparisons.iter().map(Comparison::failures).sum();
    if failed > 0 {
        anyhow::bail!("{failed} strategy run(s) failed");
    }
    Ok(())
}

/// CLI flags merged with file configuration; flags win.
struct Settings {
    tasks: usize,
    workers: usize,
    cpu_kind: CpuKind,
    cpu_limit: u64,
    io_wait: std::time::Duration,
}

impl Settings {
    fn resolve(cli: &Cli, config: &StratConfig) -> anyhow::Result<Self> {
        let workers = cli
            .workers
            .or(config.runner.workers)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|p| p.get())
                    .unwrap_or(1)
            })
            .max(1);
        let io_wait = match &cli.io_wait {
            Some(s) => parse_duration(s)?,
            None => parse_duration(&config.workload.io_wait)?,
        };
        Ok(Self {
            tasks: cli.tasks.unwrap_or(config.runner.tasks),
            workers,
            cpu_kind: cli.cpu_kind.unwrap_or(config.workload.cpu_kind),
            cpu_limit: cli.cpu_limit.unwrap_or(config.workload.cpu_limit),
            io_wait,
        })
    }
}

fn run_cpu_comparison(cli: &Cli, settings: &Settings) -> Comparison {
    let mut tasks = build_cpu_tasks(settings.cpu_kind, settings.cpu_limit, settings.tasks);
    let label = match settings.cpu_kind {
        CpuKind::Primes => "cpu/count-primes",
        CpuKind::Squares => "cpu/sum-squares",
    };
    maybe_inject_failure(cli, &mut tasks);
    compare(label, &tasks, settings.workers)
}

fn run_io_comparison(cli: &Cli, settings: &Settings) -> Comparison {
    let mut tasks = build_io_tasks(settings.io_wait, settings.tasks);
    maybe_inject_failure(cli, &mut tasks);
    compare("io/sleep", &tasks, settings.workers)
}

fn maybe_inject_failure(cli: &Cli, tasks: &mut Vec<TaskSpec>) {
    if cli.inject_failure {
        tasks.push(TaskSpec::Fail {
            message: "injected failure".to_string(),
        });
    }
}
