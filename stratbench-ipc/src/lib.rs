#![warn(missing_docs)]
//! Stratbench IPC Protocol
//!
//! Binary protocol spoken between the process-pool supervisor and its worker
//! processes. Messages are rkyv-serialized and carried as length-prefixed
//! frames over the worker's stdin/stdout, so the only shared state between
//! the two sides is the task/result payload itself.

mod framing;
mod messages;

pub use framing::{FrameError, FrameReader, FrameWriter, MAX_FRAME_LEN};
pub use messages::{TaskSpec, WorkerCapabilities, WorkerCommand, WorkerReply};

/// Protocol version checked during the Hello handshake.
pub const PROTOCOL_VERSION: u32 = 1;
