use std::io::{self, Write};

use logscope_types::ExtractedRecord;

/// Destination for records that passed the filter
pub trait RecordSink {
    fn emit(&mut self, record: &ExtractedRecord) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes one tab-separated line per record:
/// `namespace/pod<TAB>container<TAB>[timestamp<TAB>]message`
pub struct LineEmitter<W: Write> {
    out: W,
}

impl<W: Write> LineEmitter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for LineEmitter<W> {
    fn emit(&mut self, record: &ExtractedRecord) -> io::Result<()> {
        self.out.write_all(format_line(record).as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Collects records in memory
impl RecordSink for Vec<ExtractedRecord> {
    fn emit(&mut self, record: &ExtractedRecord) -> io::Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Format a record as a single newline-terminated output line
pub fn format_line(record: &ExtractedRecord) -> String {
    let message = record
        .message
        .strip_suffix('\n')
        .map(|m| m.strip_suffix('\r').unwrap_or(m))
        .unwrap_or(record.message.as_str());

    match record.timestamp_rfc3339() {
        Some(ts) => format!(
            "{}/{}\t{}\t{}\t{}\n",
            record.namespace(),
            record.pod(),
            record.container(),
            ts,
            message
        ),
        None => format!(
            "{}/{}\t{}\t{}\n",
            record.namespace(),
            record.pod(),
            record.container(),
            message
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use logscope_types::Workload;

    fn record(message: &str) -> ExtractedRecord {
        ExtractedRecord::new(Workload::new("prod", "web-1", "app"), message.to_string())
    }

    #[test]
    fn test_line_without_timestamp() {
        assert_eq!(format_line(&record("boot ok")), "prod/web-1\tapp\tboot ok\n");
    }

    #[test]
    fn test_line_with_timestamp() {
        let ts = DateTime::parse_from_rfc3339("2024-01-15T10:30:00.5+02:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            format_line(&record("ready").with_timestamp(Some(ts))),
            "prod/web-1\tapp\t2024-01-15T08:30:00.500Z\tready\n"
        );
    }

    #[test]
    fn test_single_trailing_newline() {
        assert_eq!(format_line(&record("line\n")), "prod/web-1\tapp\tline\n");
        assert_eq!(format_line(&record("line\r\n")), "prod/web-1\tapp\tline\n");
        assert_eq!(format_line(&record("a\nb")), "prod/web-1\tapp\ta\nb\n");
    }

    #[test]
    fn test_interior_newlines_are_verbatim() {
        let out = format_line(&record("panic: boom\n\tat main.go:12\n\n"));
        assert_eq!(out, "prod/web-1\tapp\tpanic: boom\n\tat main.go:12\n\n");
        assert_eq!(out.lines().count(), 3);
        assert!(!out.lines().nth(1).unwrap().starts_with("prod/"));
    }

    #[test]
    fn test_line_emitter_writes_in_order() {
        let mut emitter = LineEmitter::new(Vec::new());
        emitter.emit(&record("one")).unwrap();
        emitter.emit(&record("two")).unwrap();
        emitter.flush().unwrap();

        let out = String::from_utf8(emitter.into_inner()).unwrap();
        assert_eq!(out, "prod/web-1\tapp\tone\nprod/web-1\tapp\ttwo\n");
    }
}
