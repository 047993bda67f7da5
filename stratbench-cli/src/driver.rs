//! Driver / Comparator
//!
//! Runs one identical task set under all three strategies in a fixed order
//! (sequential, threads, processes), timing each end to end. A strategy
//! failure is recorded and the remaining strategies still run; there is no
//! retry logic anywhere.

use crate::config::CpuKind;
use crate::supervisor::ProcessPool;
use std::fmt;
use std::time::Duration;
use stratbench_core::{run_sequential, run_thread_pool, TaskOutcome, TaskSpec, Timer};

/// The three execution strategies under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// One task after another in the calling thread.
    Sequential,
    /// Fixed-size pool of worker threads in this process.
    ThreadPool,
    /// Fixed-size pool of independent worker processes.
    ProcessPool,
}

impl StrategyKind {
    /// Name used in the report.
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Sequential => "sequential",
            StrategyKind::ThreadPool => "threads",
            StrategyKind::ProcessPool => "processes",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One timed strategy invocation.
#[derive(Debug)]
pub struct StrategyRun {
    /// Which strategy ran.
    pub strategy: StrategyKind,
    /// End-to-end wall-clock time of the invocation, including pool setup
    /// and teardown.
    pub elapsed: Duration,
    /// Outcomes sorted by task index, or the strategy's error rendered for
    /// the report.
    pub outcome: Result<Vec<TaskOutcome>, String>,
}

impl StrategyRun {
    /// Whether the strategy completed without error.
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// All three strategy runs over one task set.
#[derive(Debug)]
pub struct Comparison {
    /// Workload label, e.g. "cpu/count-primes".
    pub workload: String,
    /// Number of tasks in the set.
    pub task_count: usize,
    /// Worker count used by the pooled strategies.
    pub workers: usize,
    /// Runs in driver order: sequential, threads, processes.
    pub runs: Vec<StrategyRun>,
    /// Whether every successful strategy produced the same result values.
    pub results_consistent: bool,
}

impl Comparison {
    /// Number of failed strategy runs.
    pub fn failures(&self) -> usize {
        self.runs.iter().filter(|run| !run.succeeded()).count()
    }
}

/// Build the CPU-bound task set.
pub fn build_cpu_tasks(kind: CpuKind, limit: u64, count: usize) -> Vec<TaskSpec> {
    let spec = match kind {
        CpuKind::Primes => TaskSpec::CountPrimes { limit },
        CpuKind::Squares => TaskSpec::SumSquares { limit },
    };
    vec![spec; count]
}

/// Build the I/O-bound task set.
pub fn build_io_tasks(wait: Duration, count: usize) -> Vec<TaskSpec> {
    vec![
        TaskSpec::Sleep {
            millis: wait.as_millis() as u64
        };
        count
    ]
}

/// Run `tasks` under all three strategies and collect the timings.
pub fn compare(workload: &str, tasks: &[TaskSpec], workers: usize) -> Comparison {
    let mut runs = Vec::with_capacity(3);

    runs.push(run_timed(StrategyKind::Sequential, || {
        run_sequential(tasks).map_err(|e| e.to_string())
    }));
    runs.push(run_timed(StrategyKind::ThreadPool, || {
        run_thread_pool(tasks, workers).map_err(|e| e.to_string())
    }));
    runs.push(run_timed(StrategyKind::ProcessPool, || {
        ProcessPool::new(workers).run(tasks).map_err(|e| e.to_string())
    }));

    Comparison {
        workload: workload.to_string(),
        task_count: tasks.len(),
        workers,
        results_consistent: results_match(&runs),
        runs,
    }
}

fn run_timed<F>(strategy: StrategyKind, body: F) -> StrategyRun
where
    F: FnOnce() -> Result<Vec<TaskOutcome>, String>,
{
    tracing::debug!(%strategy, "starting strategy run");
    let timer = Timer::start();
    let outcome = body();
    let elapsed = timer.stop();
    match &outcome {
        Ok(outcomes) => {
            tracing::info!(%strategy, tasks = outcomes.len(), ?elapsed, "strategy completed")
        }
        Err(message) => tracing::warn!(%strategy, %message, "strategy failed"),
    }
    StrategyRun {
        strategy,
        elapsed,
        outcome,
    }
}

/// True if every successful run returned the same values in the same index
/// order. Failed runs are excluded; with fewer than two successes there is
/// nothing to disagree.
pub fn results_match(runs: &[StrategyRun]) -> bool {
    let mut value_sets = runs.iter().filter_map(|run| {
        run.outcome
            .as_ref()
            .ok()
            .map(|outcomes| outcomes.iter().map(|o| (o.index, o.value)).collect::<Vec<_>>())
    });
    let Some(first) = value_sets.next() else {
        return true;
    };
    value_sets.all(|values| values == first)
}
