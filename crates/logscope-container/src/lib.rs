//! Container access for logscope
//!
//! Log archives are a sequence of frames, each a 4-byte big-endian length
//! followed by that many bytes of one zstd-compressed chunk. This crate reads
//! the frames one at a time and decompresses each chunk independently.

mod chunk;
mod frame;

pub use chunk::{ChunkError, decompress_chunk};
pub use frame::{ChunkSource, FrameError, FrameReader, LENGTH_PREFIX_SIZE};
