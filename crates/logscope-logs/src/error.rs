use std::io;

use thiserror::Error;

use logscope_container::{ChunkError, FrameError};

use crate::tag::TagError;

/// Errors that end a scan
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Framing(#[from] FrameError),

    #[error("failed to decompress frame {frame}: {source}")]
    Decompression {
        frame: u64,
        #[source]
        source: ChunkError,
    },

    #[error("malformed log batch in frame {frame}: {source}")]
    Decode {
        frame: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

impl PipelineError {
    /// Index of the frame being processed when the error occurred
    pub fn frame(&self) -> Option<u64> {
        match self {
            Self::Framing(e) => Some(e.frame()),
            Self::Decompression { frame, .. } | Self::Decode { frame, .. } => Some(*frame),
            Self::Output(_) => None,
        }
    }
}

/// Why a single record was dropped. Never fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkipReason {
    #[error("body is neither a string nor a key/value list")]
    UnsupportedBody,

    #[error("body does not match the {0} strategy")]
    StrategyMismatch(&'static str),

    #[error("malformed key/value entry: {0}")]
    MalformedKeyValue(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{0}' is not a string")]
    NotAString(&'static str),

    #[error("field '{0}' is not a key/value list")]
    NotAList(&'static str),

    #[error("bad fluent tag: {0}")]
    Tag(#[from] TagError),

    #[error("no usable timestamp")]
    MissingTimestamp,
}
