//! IPC Message Types
//!
//! Everything that crosses the process boundary lives here. Task inputs and
//! results are plain copyable data; workers share no memory with the
//! supervisor.

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};

/// Description of one unit of work. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum TaskSpec {
    /// CPU-bound: count primes below `limit` by trial division.
    CountPrimes {
        /// Exclusive upper bound of the search range.
        limit: u64,
    },
    /// CPU-bound: sum of k² for k in `1..=limit` (wrapping).
    SumSquares {
        /// Inclusive upper bound of the summation.
        limit: u64,
    },
    /// I/O-bound: block for `millis` milliseconds without computing.
    Sleep {
        /// Wait duration in milliseconds.
        millis: u64,
    },
    /// Always fails with `message`. Exists so the failure path from worker
    /// to driver can be exercised end to end.
    Fail {
        /// Error text the task fails with.
        message: String,
    },
}

impl TaskSpec {
    /// Short label for reports and logs.
    pub fn label(&self) -> &'static str {
        match self {
            TaskSpec::CountPrimes { .. } => "count-primes",
            TaskSpec::SumSquares { .. } => "sum-squares",
            TaskSpec::Sleep { .. } => "sleep",
            TaskSpec::Fail { .. } => "fail",
        }
    }
}

/// Worker identity advertised during the Hello handshake.
#[derive(Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct WorkerCapabilities {
    /// Protocol version, checked by the supervisor before any task is sent.
    pub protocol_version: u32,
    /// Logical CPUs visible to the worker.
    pub cpu_count: u32,
    /// CPU model string, surfaced in the supervisor's worker-ready log.
    pub cpu_model: String,
}

impl Default for WorkerCapabilities {
    fn default() -> Self {
        Self {
            protocol_version: crate::PROTOCOL_VERSION,
            cpu_count: num_cpus(),
            cpu_model: cpu_model_string(),
        }
    }
}

/// Commands sent from supervisor to worker.
#[derive(Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum WorkerCommand {
    /// Execute one task and reply with `Done` or `Failed`.
    Run {
        /// Index of the task in the submitted set; echoed back in the reply.
        index: u64,
        /// The work to perform.
        spec: TaskSpec,
    },
    /// Health check, no reply expected.
    Ping,
    /// Exit the command loop and terminate.
    Shutdown,
}

/// Replies sent from worker to supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum WorkerReply {
    /// First message after spawn; carries the worker's capabilities.
    Hello(WorkerCapabilities),
    /// Task completed.
    Done {
        /// Index of the originating task.
        index: u64,
        /// Workload return value.
        value: u64,
        /// Wall-clock duration of the task in nanoseconds.
        duration_nanos: u64,
    },
    /// Task failed or panicked inside the worker.
    Failed {
        /// Index of the originating task.
        index: u64,
        /// Error or panic message.
        message: String,
    },
}

fn num_cpus() -> u32 {
    std::thread::available_parallelism()
        .map(|p| p.get() as u32)
        .unwrap_or(1)
}

fn cpu_model_string() -> String {
    #[cfg(target_os = "linux")]
    if let Ok(cpuinfo) = std::fs::read_to_string("/proc/cpuinfo") {
        // First "model name" line; all cores report the same model.
        for line in cpuinfo.lines() {
            if let Some(rest) = line.strip_prefix("model name") {
                if let Some(model) = rest.split(':').nth(1) {
                    return model.trim().to_string();
                }
            }
        }
    }
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_default() {
        let caps = WorkerCapabilities::default();
        assert_eq!(caps.protocol_version, crate::PROTOCOL_VERSION);
        assert!(caps.cpu_count >= 1);
        assert!(!caps.cpu_model.is_empty());
    }

    #[test]
    fn task_labels() {
        assert_eq!(TaskSpec::CountPrimes { limit: 10 }.label(), "count-primes");
        assert_eq!(TaskSpec::SumSquares { limit: 10 }.label(), "sum-squares");
        assert_eq!(TaskSpec::Sleep { millis: 1 }.label(), "sleep");
        assert_eq!(
            TaskSpec::Fail {
                message: String::new()
            }
            .label(),
            "fail"
        );
    }
}
