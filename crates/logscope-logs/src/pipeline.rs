use tracing::{debug, info, trace, warn};

use logscope_container::{ChunkSource, decompress_chunk};
use logscope_types::{LogBatch, MatchCriteria, Strategy, TimePolicy};

use crate::decoder::decode_batch;
use crate::emitter::RecordSink;
use crate::error::{PipelineError, SkipReason};
use crate::extract::extract;
use crate::filter::RecordFilter;

/// Run options beyond the match criteria
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub strategy: Strategy,
    pub time_policy: TimePolicy,
}

/// Counters for one scan
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Frames read
    pub frames: u64,

    /// Records decoded
    pub records: u64,

    /// Records written to the sink
    pub emitted: u64,

    /// Records rejected by the match criteria
    pub filtered: u64,

    /// Records whose fields could not be extracted
    pub skipped: u64,
}

/// Frame -> decompress -> decode -> extract -> filter -> emit, one chunk at a time
pub struct Pipeline {
    filter: RecordFilter,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(criteria: &MatchCriteria, options: PipelineOptions) -> Self {
        Self::with_filter(RecordFilter::new(criteria), options)
    }

    /// Create a pipeline around an already resolved filter
    pub fn with_filter(filter: RecordFilter, options: PipelineOptions) -> Self {
        Self { filter, options }
    }

    /// Process every chunk until the source ends cleanly.
    ///
    /// Framing, decompression, batch decoding and output errors stop the
    /// scan; records that cannot be extracted are counted and skipped.
    pub fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<ScanStats, PipelineError>
    where
        S: ChunkSource + ?Sized,
        K: RecordSink + ?Sized,
    {
        let mut stats = ScanStats::default();

        while let Some(payload) = source.next_chunk()? {
            let frame = stats.frames;
            stats.frames += 1;

            let batch = Self::decode_chunk(frame, &payload)?;
            self.process_batch(frame, &batch, sink, &mut stats)?;
        }

        sink.flush().map_err(PipelineError::Output)?;

        info!(
            frames = stats.frames,
            records = stats.records,
            emitted = stats.emitted,
            filtered = stats.filtered,
            skipped = stats.skipped,
            "scan complete"
        );
        Ok(stats)
    }

    fn decode_chunk(frame: u64, payload: &[u8]) -> Result<LogBatch, PipelineError> {
        let json = decompress_chunk(payload)
            .map_err(|source| PipelineError::Decompression { frame, source })?;
        if json.is_empty() {
            warn!(frame, "chunk decompressed to nothing");
        }

        decode_batch(&json).map_err(|source| PipelineError::Decode { frame, source })
    }

    fn process_batch<K>(
        &self,
        frame: u64,
        batch: &LogBatch,
        sink: &mut K,
        stats: &mut ScanStats,
    ) -> Result<(), PipelineError>
    where
        K: RecordSink + ?Sized,
    {
        trace!(frame, records = batch.record_count(), "decoded batch");

        for (index, record) in batch.records().enumerate() {
            stats.records += 1;

            let extracted = extract(record, self.options.strategy).and_then(|rec| {
                if self.options.time_policy == TimePolicy::Always && rec.timestamp.is_none() {
                    Err(SkipReason::MissingTimestamp)
                } else {
                    Ok(rec)
                }
            });

            let rec = match extracted {
                Ok(rec) => rec,
                Err(reason) => {
                    debug!(frame, record = index, %reason, "skipping record");
                    stats.skipped += 1;
                    continue;
                }
            };

            if !self.filter.matches(&rec) {
                stats.filtered += 1;
                continue;
            }

            sink.emit(&rec).map_err(PipelineError::Output)?;
            stats.emitted += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_container::FrameError;
    use logscope_types::ExtractedRecord;
    use serde_json::json;
    use std::collections::VecDeque;

    /// In-memory chunk source with an optional terminal error
    struct Chunks {
        chunks: VecDeque<Vec<u8>>,
        fail_with: Option<FrameError>,
    }

    impl Chunks {
        fn new(batches: &[serde_json::Value]) -> Self {
            Self {
                chunks: batches
                    .iter()
                    .map(|b| zstd::encode_all(b.to_string().as_bytes(), 0).unwrap())
                    .collect(),
                fail_with: None,
            }
        }
    }

    impl ChunkSource for Chunks {
        fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
            match self.chunks.pop_front() {
                Some(chunk) => Ok(Some(chunk)),
                None => self.fail_with.take().map_or(Ok(None), Err),
            }
        }
    }

    fn tagged(tag: &str, message: &str) -> serde_json::Value {
        json!({
            "body": {"stringValue": message},
            "attributes": [{"key": "fluent.tag", "value": {"stringValue": tag}}]
        })
    }

    fn batch(records: Vec<serde_json::Value>) -> serde_json::Value {
        json!({"resourceLogs": [{"scopeLogs": [{"logRecords": records}]}]})
    }

    #[test]
    fn test_skips_bad_records_and_continues() {
        let mut source = Chunks::new(&[
            batch(vec![
                tagged("kube.var.log.containers.a_ns_c-1.log", "first"),
                tagged("not-a-kube-tag", "dropped"),
                json!({"body": {"boolValue": true}}),
            ]),
            batch(vec![tagged("kube.var.log.containers.b_ns_c-2.log", "second")]),
        ]);
        let mut sink: Vec<ExtractedRecord> = Vec::new();

        let pipeline = Pipeline::new(&MatchCriteria::new(), PipelineOptions::default());
        let stats = pipeline.run(&mut source, &mut sink).unwrap();

        let messages: Vec<&str> = sink.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.records, 4);
        assert_eq!(stats.emitted, 2);
        assert_eq!(stats.skipped, 2);
    }

    #[test]
    fn test_odd_record_is_skipped_between_good_ones() {
        let mut source = Chunks::new(&[batch(vec![
            tagged("kube.var.log.containers.a_ns_c-1.log", "before"),
            json!({"timeUnixNano": true, "body": {"stringValue": "odd"}, "attributes": "x"}),
            json!({"timeUnixNano": -5, "body": {"stringValue": "odd"}}),
            tagged("kube.var.log.containers.b_ns_c-2.log", "after"),
        ])]);
        let mut sink: Vec<ExtractedRecord> = Vec::new();

        let stats = Pipeline::new(&MatchCriteria::new(), PipelineOptions::default())
            .run(&mut source, &mut sink)
            .unwrap();

        let messages: Vec<&str> = sink.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["before", "after"]);
        assert_eq!(stats.skipped, 2);
    }

    #[test]
    fn test_filtered_records_are_counted() {
        let mut source = Chunks::new(&[batch(vec![
            tagged("kube.var.log.containers.a_prod_c-1.log", "keep"),
            tagged("kube.var.log.containers.a_dev_c-1.log", "drop"),
        ])]);
        let mut sink: Vec<ExtractedRecord> = Vec::new();

        let pipeline = Pipeline::new(
            &MatchCriteria::new().with_namespace("prod"),
            PipelineOptions::default(),
        );
        let stats = pipeline.run(&mut source, &mut sink).unwrap();

        assert_eq!(sink.len(), 1);
        assert_eq!(stats.filtered, 1);
    }

    #[test]
    fn test_require_time_policy() {
        let mut source = Chunks::new(&[batch(vec![tagged(
            "kube.var.log.containers.a_prod_c-1.log",
            "no time",
        )])]);
        let mut sink: Vec<ExtractedRecord> = Vec::new();

        let options = PipelineOptions {
            time_policy: TimePolicy::Always,
            ..Default::default()
        };
        let stats = Pipeline::new(&MatchCriteria::new(), options)
            .run(&mut source, &mut sink)
            .unwrap();

        assert!(sink.is_empty());
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_malformed_batch_is_fatal() {
        let mut source = Chunks::new(&[
            batch(vec![tagged("kube.var.log.containers.a_ns_c-1.log", "first")]),
            json!({"resourceLogs": {"oops": true}}),
        ]);
        let mut sink: Vec<ExtractedRecord> = Vec::new();

        let err = Pipeline::new(&MatchCriteria::new(), PipelineOptions::default())
            .run(&mut source, &mut sink)
            .unwrap_err();

        assert!(matches!(err, PipelineError::Decode { frame: 1, .. }));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_corrupt_chunk_is_fatal() {
        let mut source = Chunks {
            chunks: VecDeque::from(vec![b"definitely not zstd".to_vec()]),
            fail_with: None,
        };
        let mut sink: Vec<ExtractedRecord> = Vec::new();

        let err = Pipeline::new(&MatchCriteria::new(), PipelineOptions::default())
            .run(&mut source, &mut sink)
            .unwrap_err();

        assert!(matches!(err, PipelineError::Decompression { frame: 0, .. }));
        assert_eq!(err.frame(), Some(0));
    }

    #[test]
    fn test_framing_error_is_fatal() {
        let mut source = Chunks::new(&[batch(vec![tagged(
            "kube.var.log.containers.a_ns_c-1.log",
            "first",
        )])]);
        source.fail_with = Some(FrameError::TruncatedPayload {
            frame: 1,
            expected: 10,
            got: 9,
        });
        let mut sink: Vec<ExtractedRecord> = Vec::new();

        let err = Pipeline::new(&MatchCriteria::new(), PipelineOptions::default())
            .run(&mut source, &mut sink)
            .unwrap_err();

        assert!(matches!(err, PipelineError::Framing(_)));
        assert_eq!(sink.len(), 1);
    }
}
