use std::io::{self, ErrorKind, Read};

use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;
use tracing::trace;

/// Size of the big-endian length prefix in front of every frame
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Upper bound on the up-front payload allocation; larger frames grow as read
const INITIAL_PAYLOAD_CAPACITY: usize = 1 << 20;

/// Errors reading the frame layer. All of them end the scan.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("truncated length prefix in frame {frame}: got {got} of 4 bytes")]
    TruncatedPrefix { frame: u64, got: usize },

    #[error("truncated frame {frame}: expected {expected} payload bytes, got {got}")]
    TruncatedPayload {
        frame: u64,
        expected: u32,
        got: usize,
    },

    #[error("read error in frame {frame}: {source}")]
    Io {
        frame: u64,
        #[source]
        source: io::Error,
    },
}

impl FrameError {
    /// Index of the frame the error occurred in
    pub fn frame(&self) -> u64 {
        match self {
            Self::TruncatedPrefix { frame, .. }
            | Self::TruncatedPayload { frame, .. }
            | Self::Io { frame, .. } => *frame,
        }
    }
}

/// Source of compressed chunk payloads
pub trait ChunkSource {
    /// Read the next chunk payload.
    ///
    /// Returns `Ok(None)` once the stream ends cleanly on a frame boundary.
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FrameError>;
}

/// Reads length-prefixed frames from a byte stream
pub struct FrameReader<R> {
    inner: R,

    /// Complete frames read so far
    frames: u64,

    /// Bytes consumed so far, prefixes included
    bytes: u64,

    /// Set at end of stream or after the first error
    finished: bool,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            frames: 0,
            bytes: 0,
            finished: false,
        }
    }

    /// Number of complete frames read
    pub fn frames_read(&self) -> u64 {
        self.frames
    }

    /// Number of bytes consumed from the stream
    pub fn bytes_read(&self) -> u64 {
        self.bytes
    }

    /// Read the length prefix. `Ok(None)` means no bytes were left at all.
    fn read_prefix(&mut self) -> Result<Option<u32>, FrameError> {
        let mut buf = [0u8; LENGTH_PREFIX_SIZE];
        let mut filled = 0;

        while filled < LENGTH_PREFIX_SIZE {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(FrameError::Io {
                        frame: self.frames,
                        source,
                    });
                }
            }
        }

        match filled {
            0 => Ok(None),
            LENGTH_PREFIX_SIZE => Ok(Some(BigEndian::read_u32(&buf))),
            got => Err(FrameError::TruncatedPrefix {
                frame: self.frames,
                got,
            }),
        }
    }

    fn read_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        let Some(len) = self.read_prefix()? else {
            trace!(frames = self.frames, bytes = self.bytes, "clean end of stream");
            return Ok(None);
        };

        let mut payload = Vec::with_capacity((len as usize).min(INITIAL_PAYLOAD_CAPACITY));
        (&mut self.inner)
            .take(u64::from(len))
            .read_to_end(&mut payload)
            .map_err(|source| FrameError::Io {
                frame: self.frames,
                source,
            })?;

        if payload.len() != len as usize {
            return Err(FrameError::TruncatedPayload {
                frame: self.frames,
                expected: len,
                got: payload.len(),
            });
        }

        trace!(frame = self.frames, len, "read frame");
        self.frames += 1;
        self.bytes += LENGTH_PREFIX_SIZE as u64 + u64::from(len);

        Ok(Some(payload))
    }
}

impl<R: Read> ChunkSource for FrameReader<R> {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        if self.finished {
            return Ok(None);
        }

        let result = self.read_frame();
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<Vec<u8>, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}
