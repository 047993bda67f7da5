//! Task Execution
//!
//! A task is a [`TaskSpec`] plus its position in the submitted set. The
//! index travels with the result through every strategy (and across the
//! process boundary), so outcomes can always be matched to their
//! originating task regardless of completion order.

use crate::measure::Timer;
use crate::workload;
use std::time::Duration;
use stratbench_ipc::TaskSpec;
use thiserror::Error;

/// A workload function raised during execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task {index} ({label}) failed: {message}")]
pub struct TaskError {
    /// Index of the failing task in the submitted set.
    pub index: usize,
    /// Workload label of the failing task.
    pub label: &'static str,
    /// What went wrong.
    pub message: String,
}

/// Result of one task execution, tagged with its originating task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Index of the task in the submitted set.
    pub index: usize,
    /// Workload return value.
    pub value: u64,
    /// Wall-clock duration of this task alone.
    pub duration: Duration,
}

/// Run one task to completion in the calling thread, timing it.
pub fn execute(index: usize, spec: &TaskSpec) -> Result<TaskOutcome, TaskError> {
    let timer = Timer::start();
    let value = match spec {
        TaskSpec::CountPrimes { limit } => workload::count_primes(*limit),
        TaskSpec::SumSquares { limit } => workload::sum_squares(*limit),
        TaskSpec::Sleep { millis } => {
            workload::simulate_io(Duration::from_millis(*millis)).as_millis() as u64
        }
        TaskSpec::Fail { message } => {
            return Err(TaskError {
                index,
                label: spec.label(),
                message: message.clone(),
            });
        }
    };
    Ok(TaskOutcome {
        index,
        value,
        duration: timer.stop(),
    })
}

/// Turn a `catch_unwind` payload into a readable message.
pub(crate) fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_carries_the_index() {
        let outcome = execute(3, &TaskSpec::CountPrimes { limit: 10 }).unwrap();
        assert_eq!(outcome.index, 3);
        assert_eq!(outcome.value, 4);
        assert!(outcome.duration > Duration::ZERO);
    }

    #[test]
    fn execute_sleep_reports_the_wait() {
        let outcome = execute(0, &TaskSpec::Sleep { millis: 15 }).unwrap();
        assert_eq!(outcome.value, 15);
        assert!(outcome.duration >= Duration::from_millis(10));
    }

    #[test]
    fn execute_fail_surfaces_the_message() {
        let err = execute(1, &TaskSpec::Fail { message: "no disk".to_string() }).unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.message, "no disk");
        assert!(err.to_string().contains("task 1"));
    }

    #[test]
    fn panic_message_downcasts() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static str panic");
        assert_eq!(panic_message(payload), "static str panic");
        let payload: Box<dyn std::any::Any + Send> = Box::new("owned".to_string());
        assert_eq!(panic_message(payload), "owned");
        let payload: Box<dyn std::any::Any + Send> = Box::new(42u64);
        assert_eq!(panic_message(payload), "unknown panic");
    }
}
