use std::io::{self, Read};

use thiserror::Error;
use tracing::trace;

/// A chunk payload that is not valid zstd
#[derive(Debug, Error)]
#[error("zstd decode: {0}")]
pub struct ChunkError(#[from] io::Error);

/// Decompress one chunk payload.
///
/// Every chunk is an independent zstd stream: the decoder is created for this
/// payload, drained to the end and dropped before returning.
pub fn decompress_chunk(payload: &[u8]) -> Result<Vec<u8>, ChunkError> {
    let mut decoder = zstd::Decoder::new(payload)?;
    let mut out = Vec::with_capacity(payload.len().saturating_mul(4));
    decoder.read_to_end(&mut out)?;

    trace!(compressed = payload.len(), decompressed = out.len(), "decompressed chunk");
    Ok(out)
}
