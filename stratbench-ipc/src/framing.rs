//! Length-Prefixed Frame Encoding
//!
//! Gives the stream-based worker channel (stdin/stdout) reliable message
//! boundaries: a 4-byte little-endian length followed by an rkyv payload.

use rkyv::ser::serializers::AllocSerializer;
use rkyv::validation::validators::DefaultValidator;
use rkyv::{Archive, CheckBytes, Deserialize, Infallible, Serialize};
use std::io::{BufReader, BufWriter, Read, Write};
use thiserror::Error;

/// Maximum payload size for a single frame. Commands and replies are tiny;
/// anything near this limit indicates a corrupt length prefix.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

const STREAM_BUF_LEN: usize = 8 * 1024;

/// Errors from encoding or decoding frames.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Underlying I/O failure on the channel.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The message could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// The payload failed validation or did not match the expected type.
    #[error("decode error: {0}")]
    Decode(String),

    /// Declared frame length exceeds [`MAX_FRAME_LEN`].
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_LEN} byte limit")]
    TooLarge(usize),

    /// The peer closed the channel between frames.
    #[error("end of stream")]
    EndOfStream,
}

/// Writes framed messages to a byte stream.
pub struct FrameWriter<W: Write> {
    inner: BufWriter<W>,
}

impl<W: Write> FrameWriter<W> {
    /// Wrap a writer. The buffer is flushed after every frame so the peer
    /// never waits on a partially written message.
    pub fn new(writer: W) -> Self {
        Self {
            inner: BufWriter::with_capacity(STREAM_BUF_LEN, writer),
        }
    }

    /// Serialize `message` and write it as one frame.
    pub fn send<T>(&mut self, message: &T) -> Result<(), FrameError>
    where
        T: Serialize<AllocSerializer<256>>,
    {
        let bytes =
            rkyv::to_bytes::<_, 256>(message).map_err(|e| FrameError::Encode(e.to_string()))?;
        if bytes.len() > MAX_FRAME_LEN {
            return Err(FrameError::TooLarge(bytes.len()));
        }

        self.inner.write_all(&(bytes.len() as u32).to_le_bytes())?;
        self.inner.write_all(&bytes)?;
        self.inner.flush()?;
        Ok(())
    }
}

/// Reads framed messages from a byte stream.
pub struct FrameReader<R: Read> {
    inner: BufReader<R>,
}

impl<R: Read> FrameReader<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::with_capacity(STREAM_BUF_LEN, reader),
        }
    }

    /// Read and deserialize the next frame, blocking until it arrives.
    ///
    /// Returns [`FrameError::EndOfStream`] if the peer closed the channel
    /// cleanly before the length prefix.
    pub fn recv<T>(&mut self) -> Result<T, FrameError>
    where
        T: Archive,
        T::Archived: for<'a> CheckBytes<DefaultValidator<'a>> + Deserialize<T, Infallible>,
    {
        let mut len_buf = [0u8; 4];
        match self.inner.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(FrameError::EndOfStream);
            }
            Err(e) => return Err(FrameError::Io(e)),
        }

        let len = u32::from_le_bytes(len_buf) as usize;
        if len == 0 {
            return Err(FrameError::Decode("zero-length frame".to_string()));
        }
        if len > MAX_FRAME_LEN {
            return Err(FrameError::TooLarge(len));
        }

        // rkyv validation requires an aligned buffer.
        let mut buf = rkyv::AlignedVec::with_capacity(len);
        buf.resize(len, 0);
        self.inner.read_exact(&mut buf)?;

        let archived = rkyv::check_archived_root::<T>(&buf)
            .map_err(|e| FrameError::Decode(e.to_string()))?;
        let value: T = archived
            .deserialize(&mut Infallible)
            .expect("infallible deserialization");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{TaskSpec, WorkerCommand, WorkerReply};
    use std::io::Cursor;

    #[test]
    fn command_roundtrip() {
        let command = WorkerCommand::Run {
            index: 7,
            spec: TaskSpec::CountPrimes { limit: 50_000 },
        };

        let mut buffer = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut buffer);
            writer.send(&command).unwrap();
        }

        let mut reader = FrameReader::new(Cursor::new(buffer));
        let decoded: WorkerCommand = reader.recv().unwrap();
        assert_eq!(command, decoded);
    }

    #[test]
    fn interleaved_replies_keep_order() {
        let replies = vec![
            WorkerReply::Done {
                index: 0,
                value: 5133,
                duration_nanos: 12_000_000,
            },
            WorkerReply::Failed {
                index: 1,
                message: "boom".to_string(),
            },
            WorkerReply::Done {
                index: 2,
                value: 1,
                duration_nanos: 900,
            },
        ];

        let mut buffer = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut buffer);
            for reply in &replies {
                writer.send(reply).unwrap();
            }
        }

        let mut reader = FrameReader::new(Cursor::new(buffer));
        for expected in &replies {
            let decoded: WorkerReply = reader.recv().unwrap();
            assert_eq!(expected, &decoded);
        }
    }

    #[test]
    fn payload_free_commands_frame_cleanly() {
        let mut buffer = Vec::new();
        {
            let mut writer = FrameWriter::new(&mut buffer);
            writer.send(&WorkerCommand::Ping).unwrap();
            writer.send(&WorkerCommand::Shutdown).unwrap();
        }

        let mut reader = FrameReader::new(Cursor::new(buffer));
        assert_eq!(reader.recv::<WorkerCommand>().unwrap(), WorkerCommand::Ping);
        assert_eq!(
            reader.recv::<WorkerCommand>().unwrap(),
            WorkerCommand::Shutdown
        );
    }

    #[test]
    fn empty_stream_is_end_of_stream() {
        let mut reader = FrameReader::new(Cursor::new(Vec::new()));
        let result: Result<WorkerCommand, _> = reader.recv();
        assert!(matches!(result, Err(FrameError::EndOfStream)));
    }

    #[test]
    fn corrupt_length_prefix_is_rejected() {
        // Length prefix claims 16 MB, which is over the cap.
        let buffer = (16u32 * 1024 * 1024).to_le_bytes().to_vec();
        let mut reader = FrameReader::new(Cursor::new(buffer));
        let result: Result<WorkerCommand, _> = reader.recv();
        assert!(matches!(result, Err(FrameError::TooLarge(_))));
    }

    #[test]
    fn oversized_message_is_rejected_on_send() {
        let reply = WorkerReply::Failed {
            index: 0,
            message: "x".repeat(MAX_FRAME_LEN + 1),
        };
        let mut buffer = Vec::new();
        let mut writer = FrameWriter::new(&mut buffer);
        assert!(matches!(writer.send(&reply), Err(FrameError::TooLarge(_))));
    }
}
