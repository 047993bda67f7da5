#![warn(missing_docs)]
//! Stratbench Core - Workloads and Execution Strategies
//!
//! This crate provides everything that runs inside a worker, whatever kind
//! of worker that is:
//! - the CPU-bound and I/O-bound workload functions
//! - task execution with per-task wall-clock timing
//! - the sequential and thread-pool strategies
//! - the main loop for process-pool worker processes
//!
//! The process-pool supervisor itself lives in `stratbench-cli`, next to
//! the binary it re-executes.

mod measure;
mod strategy;
mod task;
mod worker;
pub mod workload;

pub use measure::Timer;
pub use strategy::{run_sequential, run_thread_pool, StrategyError};
pub use task::{execute, TaskError, TaskOutcome};
pub use worker::{WorkerError, WorkerMain};

pub use stratbench_ipc::TaskSpec;
