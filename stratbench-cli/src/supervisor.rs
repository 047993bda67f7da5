//! Process-Pool Strategy
//!
//! Supervisor side: spawns worker processes by re-executing the current
//! binary with the hidden `--pool-worker` flag and distributes tasks to
//! them over framed stdin/stdout IPC.
//!
//! Each worker gets its own address space, so unlike the thread pool there
//! is genuinely nothing shared: task inputs and results are copied across
//! the process boundary. The price is process creation and serialization
//! overhead on every run.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;
use stratbench_core::TaskOutcome;
use stratbench_ipc::{
    FrameError, FrameReader, FrameWriter, TaskSpec, WorkerCapabilities, WorkerCommand, WorkerReply,
    PROTOCOL_VERSION,
};
use thiserror::Error;

/// Errors from the process-pool strategy.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The worker process could not be spawned.
    #[error("failed to spawn worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// The IPC channel to a worker broke mid-conversation.
    #[error("ipc error: {0}")]
    Ipc(String),

    /// A worker exited or closed its pipes when a reply was still owed.
    #[error("worker exited unexpectedly: {0}")]
    WorkerGone(String),

    /// The worker spoke a different protocol than expected.
    #[error("worker protocol error: expected {expected}, got {got}")]
    Protocol {
        /// What the supervisor was waiting for.
        expected: String,
        /// What actually arrived.
        got: String,
    },

    /// A task failed inside a worker (workload error or contained panic).
    #[error("task {index} failed in worker: {message}")]
    Task {
        /// Index of the failing task.
        index: usize,
        /// Error or panic message relayed by the worker.
        message: String,
    },

    /// The supervisor-side fan-out pool could not be created.
    #[error("failed to build supervisor pool: {0}")]
    PoolSetup(String),
}

/// Handle to one spawned worker process.
pub struct WorkerHandle {
    child: Child,
    reader: FrameReader<ChildStdout>,
    writer: FrameWriter<ChildStdin>,
    capabilities: WorkerCapabilities,
}

impl WorkerHandle {
    /// Spawn a worker by re-executing the current binary.
    pub fn spawn() -> Result<Self, SupervisorError> {
        let binary = std::env::current_exe()?;
        Self::spawn_binary(&binary)
    }

    /// Spawn a worker from a specific binary (for tests).
    pub fn spawn_binary(binary: &Path) -> Result<Self, SupervisorError> {
        let mut child = Command::new(binary)
            .arg("--pool-worker")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SupervisorError::WorkerGone("worker stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SupervisorError::WorkerGone("worker stdout not captured".to_string()))?;

        let mut handle = Self {
            child,
            reader: FrameReader::new(stdout),
            writer: FrameWriter::new(stdin),
            capabilities: WorkerCapabilities::default(),
        };
        handle.wait_for_hello()?;
        handle.ping()?;
        tracing::debug!(
            pid = handle.child.id(),
            cpus = handle.capabilities().cpu_count,
            cpu_model = %handle.capabilities().cpu_model,
            "worker ready"
        );
        Ok(handle)
    }

    /// Post-handshake health check: confirms the command channel accepts
    /// writes before any task is committed to this worker.
    fn ping(&mut self) -> Result<(), SupervisorError> {
        self.writer
            .send(&WorkerCommand::Ping)
            .map_err(|e| self.channel_error(e))
    }

    /// Wait for the Hello handshake and validate the protocol version.
    fn wait_for_hello(&mut self) -> Result<(), SupervisorError> {
        match self.reader.recv::<WorkerReply>() {
            Ok(WorkerReply::Hello(caps)) => {
                if caps.protocol_version != PROTOCOL_VERSION {
                    return Err(SupervisorError::Protocol {
                        expected: format!("protocol version {PROTOCOL_VERSION}"),
                        got: format!("protocol version {}", caps.protocol_version),
                    });
                }
                self.capabilities = caps;
                Ok(())
            }
            Ok(other) => Err(SupervisorError::Protocol {
                expected: "Hello".to_string(),
                got: format!("{other:?}"),
            }),
            Err(e) => Err(self.channel_error(e)),
        }
    }

    /// Capabilities the worker advertised during the handshake.
    pub fn capabilities(&self) -> &WorkerCapabilities {
        &self.capabilities
    }

    /// Send one task to this worker and block for its reply.
    pub fn run_task(
        &mut self,
        index: usize,
        spec: &TaskSpec,
    ) -> Result<TaskOutcome, SupervisorError> {
        self.writer
            .send(&WorkerCommand::Run {
                index: index as u64,
                spec: spec.clone(),
            })
            .map_err(|e| self.channel_error(e))?;

        match self.reader.recv::<WorkerReply>() {
            Ok(WorkerReply::Done {
                index,
                value,
                duration_nanos,
            }) => Ok(TaskOutcome {
                index: index as usize,
                value,
                duration: Duration::from_nanos(duration_nanos),
            }),
            Ok(WorkerReply::Failed { index, message }) => Err(SupervisorError::Task {
                index: index as usize,
                message,
            }),
            Ok(WorkerReply::Hello(_)) => Err(SupervisorError::Protocol {
                expected: "Done or Failed".to_string(),
                got: "Hello".to_string(),
            }),
            Err(e) => Err(self.channel_error(e)),
        }
    }

    /// Request a graceful shutdown and reap the child.
    pub fn shutdown(mut self) {
        let _ = self.writer.send(&WorkerCommand::Shutdown);
        let _ = self.child.wait();
    }

    /// Map a frame error on this channel, distinguishing a dead worker from
    /// a corrupt stream.
    fn channel_error(&mut self, e: FrameError) -> SupervisorError {
        if matches!(e, FrameError::EndOfStream) {
            return SupervisorError::WorkerGone("worker closed the reply channel".to_string());
        }
        if !self.is_alive() {
            return SupervisorError::WorkerGone(format!("worker died mid-frame: {e}"));
        }
        SupervisorError::Ipc(e.to_string())
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        // Guaranteed teardown even on an error path: kill anything still
        // running, and always reap.
        if self.is_alive() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

/// Fixed-size pool of worker processes, created fresh per strategy
/// invocation and torn down when `run` returns.
pub struct ProcessPool {
    workers: usize,
}

impl ProcessPool {
    /// Create a pool description with the given worker-process count.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Distribute `tasks` across the worker processes and collect all
    /// outcomes, sorted by task index.
    ///
    /// Tasks are sharded round-robin: worker `k` owns indices `k`, `k+w`,
    /// `k+2w`, … and runs its shard in submission order. Shards execute
    /// concurrently, each driven by one supervisor-side thread. On failure
    /// the surviving shards finish first, then the first failing shard's
    /// error is returned and every child is reaped.
    pub fn run(&self, tasks: &[TaskSpec]) -> Result<Vec<TaskOutcome>, SupervisorError> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let worker_count = self.workers.min(tasks.len());
        let mut shards: Vec<Vec<(usize, &TaskSpec)>> = vec![Vec::new(); worker_count];
        for (index, spec) in tasks.iter().enumerate() {
            shards[index % worker_count].push((index, spec));
        }

        let shard_results: Vec<Result<Vec<TaskOutcome>, SupervisorError>> = if worker_count == 1 {
            vec![Self::run_shard(&shards[0])]
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(worker_count)
                .thread_name(|i| format!("strat-supervisor-{i}"))
                .build()
                .map_err(|e| SupervisorError::PoolSetup(e.to_string()))?;
            pool.install(|| {
                shards
                    .par_iter()
                    .map(|shard| Self::run_shard(shard))
                    .collect()
            })
        };

        let mut outcomes = Vec::with_capacity(tasks.len());
        for result in shard_results {
            outcomes.extend(result?);
        }
        outcomes.sort_by_key(|outcome| outcome.index);
        Ok(outcomes)
    }

    /// Drive one worker process through one shard of tasks.
    fn run_shard(shard: &[(usize, &TaskSpec)]) -> Result<Vec<TaskOutcome>, SupervisorError> {
        let mut worker = WorkerHandle::spawn()?;
        let mut outcomes = Vec::with_capacity(shard.len());
        for &(index, spec) in shard {
            outcomes.push(worker.run_task(index, spec)?);
        }
        worker.shutdown();
        Ok(outcomes)
    }
}
