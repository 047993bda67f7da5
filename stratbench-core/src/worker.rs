//! Worker Process Entry Point
//!
//! The worker side of the process-pool strategy. The supervisor re-executes
//! the current binary with a hidden flag and speaks length-prefixed frames
//! over the child's stdin/stdout, so the worker owns both standard streams
//! for IPC. Workloads never print, which keeps the channel clean.
//!
//! Each worker is an independent process: its own address space, its own
//! runtime, nothing shared with the supervisor beyond the task and reply
//! payloads.

use crate::task::{execute, panic_message};
use std::io::{Stdin, Stdout};
use std::panic::{catch_unwind, AssertUnwindSafe};
use stratbench_ipc::{
    FrameError, FrameReader, FrameWriter, TaskSpec, WorkerCapabilities, WorkerCommand, WorkerReply,
};
use thiserror::Error;

/// Errors that end a worker's command loop.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The IPC channel to the supervisor broke.
    #[error("ipc error: {0}")]
    Ipc(#[from] FrameError),
}

/// Command loop for one worker process.
pub struct WorkerMain {
    reader: FrameReader<Stdin>,
    writer: FrameWriter<Stdout>,
}

impl WorkerMain {
    /// Attach to the supervisor over stdin/stdout.
    pub fn new() -> Self {
        Self {
            reader: FrameReader::new(std::io::stdin()),
            writer: FrameWriter::new(std::io::stdout()),
        }
    }

    /// Run the command loop until `Shutdown` or until the supervisor closes
    /// the channel.
    pub fn run(&mut self) -> Result<(), WorkerError> {
        self.writer
            .send(&WorkerReply::Hello(WorkerCapabilities::default()))?;

        loop {
            let command: WorkerCommand = match self.reader.recv() {
                Ok(command) => command,
                // Supervisor dropped its end; treat like a shutdown.
                Err(FrameError::EndOfStream) => break,
                Err(e) => return Err(e.into()),
            };

            match command {
                WorkerCommand::Run { index, spec } => {
                    self.run_task(index as usize, &spec)?;
                }
                WorkerCommand::Ping => {}
                WorkerCommand::Shutdown => break,
            }
        }

        Ok(())
    }

    /// Execute one task and reply with `Done` or `Failed`. Panics are
    /// caught so a bad task reports instead of killing the worker.
    fn run_task(&mut self, index: usize, spec: &TaskSpec) -> Result<(), WorkerError> {
        let reply = match catch_unwind(AssertUnwindSafe(|| execute(index, spec))) {
            Ok(Ok(outcome)) => WorkerReply::Done {
                index: outcome.index as u64,
                value: outcome.value,
                duration_nanos: outcome.duration.as_nanos() as u64,
            },
            Ok(Err(task_err)) => WorkerReply::Failed {
                index: index as u64,
                message: task_err.message,
            },
            Err(panic) => WorkerReply::Failed {
                index: index as u64,
                message: panic_message(panic),
            },
        };
        self.writer.send(&reply)?;
        Ok(())
    }
}

impl Default for WorkerMain {
    fn default() -> Self {
        Self::new()
    }
}
