//! Log processing for logscope
//!
//! This crate decodes OTLP-shaped log batches, extracts the workload and
//! message of each record, filters records and writes the survivors out.

mod decoder;
mod duration;
mod emitter;
mod error;
mod extract;
mod filter;
mod pipeline;
mod tag;

pub use decoder::{decode_batch, flatten_entries, flatten_kvlist};
pub use duration::{DurationError, parse_duration};
pub use emitter::{LineEmitter, RecordSink, format_line};
pub use error::{PipelineError, SkipReason};
pub use extract::{extract, extract_attributes, extract_kubernetes};
pub use filter::RecordFilter;
pub use pipeline::{Pipeline, PipelineOptions, ScanStats};
pub use tag::{TagError, parse_fluent_tag};

// Re-export types used in our public API
pub use logscope_container::{ChunkSource, FrameReader};
pub use logscope_types::{ExtractedRecord, LogBatch, LogRecord, MatchCriteria, Strategy, TimePolicy};
