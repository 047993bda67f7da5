//! Sequential and Thread-Pool Strategies
//!
//! Both strategies take the same task list and return outcomes sorted by
//! task index, so callers can compare result sets across strategies
//! without caring about completion order.
//!
//! Unlike the interpreter-locked runtime this demonstration is modeled on,
//! Rust threads are never serialized by a global lock: the thread pool
//! achieves real parallelism for CPU-bound work too, not just for blocking
//! waits. That divergence is intentional and surfaces in the timings.

use crate::task::{execute, panic_message, TaskError, TaskOutcome};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::panic::{catch_unwind, AssertUnwindSafe};
use stratbench_ipc::TaskSpec;
use thiserror::Error;

/// Errors from the in-process strategies.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// A workload function raised during execution.
    #[error(transparent)]
    Task(#[from] TaskError),

    /// A task panicked inside a pool worker. The panic is contained to that
    /// task; the rest of the pool ran to completion.
    #[error("task {index} panicked: {message}")]
    Panic {
        /// Index of the panicking task.
        index: usize,
        /// Panic payload, if it was a string.
        message: String,
    },

    /// The worker-thread pool could not be created.
    #[error("failed to build thread pool: {0}")]
    PoolSetup(String),
}

/// Run all tasks one after another in the caller's thread.
///
/// Execution and result order are the submission order. The first task
/// failure propagates immediately and halts the remaining tasks.
pub fn run_sequential(tasks: &[TaskSpec]) -> Result<Vec<TaskOutcome>, StrategyError> {
    let mut outcomes = Vec::with_capacity(tasks.len());
    for (index, spec) in tasks.iter().enumerate() {
        outcomes.push(execute(index, spec)?);
    }
    Ok(outcomes)
}

/// Run all tasks across a fixed-size pool of `workers` threads.
///
/// The pool is created fresh for this call and torn down on return, success
/// or failure. Per-task panics are caught so one bad task cannot take the
/// others down; after every task has settled, the lowest failing index (if
/// any) is surfaced as the error.
pub fn run_thread_pool(
    tasks: &[TaskSpec],
    workers: usize,
) -> Result<Vec<TaskOutcome>, StrategyError> {
    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("strat-worker-{i}"))
        .build()
        .map_err(|e| StrategyError::PoolSetup(e.to_string()))?;

    let mut settled: Vec<(usize, Result<TaskOutcome, StrategyError>)> = pool.install(|| {
        tasks
            .par_iter()
            .enumerate()
            .map(|(index, spec)| {
                let result = match catch_unwind(AssertUnwindSafe(|| execute(index, spec))) {
                    Ok(Ok(outcome)) => Ok(outcome),
                    Ok(Err(task_err)) => Err(StrategyError::Task(task_err)),
                    Err(panic) => Err(StrategyError::Panic {
                        index,
                        message: panic_message(panic),
                    }),
                };
                (index, result)
            })
            .collect()
    });

    settled.sort_by_key(|(index, _)| *index);
    let mut outcomes = Vec::with_capacity(settled.len());
    for (_, result) in settled {
        outcomes.push(result?);
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cpu_tasks(count: usize, limit: u64) -> Vec<TaskSpec> {
        (0..count).map(|_| TaskSpec::CountPrimes { limit }).collect()
    }

    #[test]
    fn sequential_preserves_submission_order() {
        let tasks = vec![
            TaskSpec::CountPrimes { limit: 10 },
            TaskSpec::SumSquares { limit: 10 },
            TaskSpec::CountPrimes { limit: 100 },
        ];
        let outcomes = run_sequential(&tasks).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            outcomes.iter().map(|o| o.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(
            outcomes.iter().map(|o| o.value).collect::<Vec<_>>(),
            vec![4, 385, 25]
        );
    }

    #[test]
    fn sequential_halts_at_first_failure() {
        let tasks = vec![
            TaskSpec::CountPrimes { limit: 10 },
            TaskSpec::Fail {
                message: "midway".to_string(),
            },
            TaskSpec::CountPrimes { limit: 10 },
        ];
        let err = run_sequential(&tasks).unwrap_err();
        match err {
            StrategyError::Task(task_err) => assert_eq!(task_err.index, 1),
            other => panic!("expected task error, got {other:?}"),
        }
    }

    #[test]
    fn thread_pool_matches_sequential_results() {
        let tasks = cpu_tasks(6, 2_000);
        let sequential = run_sequential(&tasks).unwrap();
        let threaded = run_thread_pool(&tasks, 4).unwrap();

        assert_eq!(sequential.len(), threaded.len());
        for (seq, thr) in sequential.iter().zip(threaded.iter()) {
            assert_eq!(seq.index, thr.index);
            assert_eq!(seq.value, thr.value);
        }
    }

    #[test]
    fn thread_pool_overlaps_blocking_waits() {
        // 8 tasks of 25 ms on 4 workers: two waves, so roughly 50 ms total.
        let tasks: Vec<TaskSpec> = (0..8).map(|_| TaskSpec::Sleep { millis: 25 }).collect();
        let start = std::time::Instant::now();
        let outcomes = run_thread_pool(&tasks, 4).unwrap();
        let elapsed = start.elapsed();

        assert_eq!(outcomes.len(), 8);
        assert!(elapsed >= Duration::from_millis(45));
        // Well under the 200 ms a sequential run would need.
        assert!(elapsed < Duration::from_millis(190), "took {elapsed:?}");
    }

    #[test]
    fn thread_pool_reports_lowest_failing_index() {
        let tasks = vec![
            TaskSpec::CountPrimes { limit: 100 },
            TaskSpec::Fail {
                message: "second".to_string(),
            },
            TaskSpec::CountPrimes { limit: 100 },
            TaskSpec::Fail {
                message: "fourth".to_string(),
            },
        ];
        let err = run_thread_pool(&tasks, 2).unwrap_err();
        match err {
            StrategyError::Task(task_err) => {
                assert_eq!(task_err.index, 1);
                assert_eq!(task_err.message, "second");
            }
            other => panic!("expected task error, got {other:?}"),
        }
    }

    #[test]
    fn empty_task_list_is_a_noop_for_both() {
        assert!(run_sequential(&[]).unwrap().is_empty());
        assert!(run_thread_pool(&[], 4).unwrap().is_empty());
    }

    #[test]
    fn single_worker_pool_still_completes() {
        let tasks = cpu_tasks(3, 500);
        let outcomes = run_thread_pool(&tasks, 1).unwrap();
        assert_eq!(outcomes.len(), 3);
    }

    #[test]
    fn repeat_runs_are_idempotent() {
        let tasks = cpu_tasks(4, 1_000);
        let first = run_thread_pool(&tasks, 4).unwrap();
        let second = run_thread_pool(&tasks, 4).unwrap();
        let values = |outcomes: &[TaskOutcome]| {
            outcomes.iter().map(|o| o.value).collect::<Vec<_>>()
        };
        assert_eq!(values(&first), values(&second));
        assert!(first.iter().all(|o| o.duration > Duration::ZERO));
    }
}
