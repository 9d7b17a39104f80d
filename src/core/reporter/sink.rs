//! Report sink implementations.

use super::{BigKeyRecord, ScanSummary};
use crate::error::ReportError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Destination for qualifying keys.
///
/// The scanner appends one record per big key as it is found, then calls
/// `finish` exactly once when traversal completes (or is cancelled).
/// Implement this trait to stream results somewhere else.
pub trait ReportSink {
    /// Append one qualifying key
    fn append(&mut self, record: &BigKeyRecord) -> Result<(), ReportError>;

    /// End-of-scan signal with the final summary
    fn finish(&mut self, summary: &ScanSummary) -> Result<(), ReportError> {
        let _ = summary;
        Ok(())
    }
}

/// Collects records in memory. Used by the CLI to print results after
/// the scan, and by tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: Vec<BigKeyRecord>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[BigKeyRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<BigKeyRecord> {
        self.records
    }
}

impl ReportSink for CollectingSink {
    fn append(&mut self, record: &BigKeyRecord) -> Result<(), ReportError> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Streams records to a file as JSON lines, one object per key, with the
/// summary as the final line. Written incrementally so a cancelled scan
/// still leaves every record found so far on disk.
pub struct JsonLinesSink {
    path: String,
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    pub fn create(path: &Path) -> Result<Self, ReportError> {
        let file = File::create(path).map_err(|source| ReportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            path: path.display().to_string(),
            writer: BufWriter::new(file),
        })
    }

    fn write_line(&mut self, json: String) -> Result<(), ReportError> {
        writeln!(self.writer, "{}", json).map_err(|source| ReportError::Io {
            path: self.path.clone(),
            source,
        })?;
        // One flush per record keeps partial output usable after Ctrl-C
        self.writer.flush().map_err(|source| ReportError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl ReportSink for JsonLinesSink {
    fn append(&mut self, record: &BigKeyRecord) -> Result<(), ReportError> {
        let json = serde_json::to_string(record)?;
        self.write_line(json)
    }

    fn finish(&mut self, summary: &ScanSummary) -> Result<(), ReportError> {
        let json = serde_json::to_string(summary)?;
        self.write_line(json)
    }
}

/// Fans appends out to a pair of sinks. Lets the CLI collect records for
/// terminal output while also streaming them to a report file.
pub struct TeeSink<'a> {
    first: &'a mut dyn ReportSink,
    second: &'a mut dyn ReportSink,
}

impl<'a> TeeSink<'a> {
    pub fn new(first: &'a mut dyn ReportSink, second: &'a mut dyn ReportSink) -> Self {
        Self { first, second }
    }
}

impl ReportSink for TeeSink<'_> {
    fn append(&mut self, record: &BigKeyRecord) -> Result<(), ReportError> {
        self.first.append(record)?;
        self.second.append(record)
    }

    fn finish(&mut self, summary: &ScanSummary) -> Result<(), ReportError> {
        self.first.finish(summary)?;
        self.second.finish(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::{KeyType, MemberCount};
    use crate::core::reporter::ScanKey;
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_record(key: &str) -> BigKeyRecord {
        BigKeyRecord {
            key: ScanKey::new(key.as_bytes()),
            key_type: KeyType::Set,
            size_bytes: 15_000,
            member_count: MemberCount::Count(3),
        }
    }

    fn sample_summary() -> ScanSummary {
        ScanSummary {
            shards: 1,
            keys_visited: 10,
            big_keys_found: 1,
            keys_skipped: 0,
            cancelled: false,
            started_at: Utc::now(),
            duration_ms: 12,
        }
    }

    #[test]
    fn collecting_sink_keeps_append_order() {
        let mut sink = CollectingSink::new();
        sink.append(&sample_record("a")).unwrap();
        sink.append(&sample_record("b")).unwrap();

        let keys: Vec<_> = sink.records().iter().map(|r| r.key.render()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn json_lines_sink_writes_one_object_per_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.jsonl");

        let mut sink = JsonLinesSink::create(&path).unwrap();
        sink.append(&sample_record("a")).unwrap();
        sink.append(&sample_record("b")).unwrap();
        sink.finish(&sample_summary()).unwrap();
        drop(sink);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: BigKeyRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.key.render(), "a");
        let summary: ScanSummary = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(summary.big_keys_found, 1);
    }

    #[test]
    fn tee_sink_appends_to_both() {
        let mut left = CollectingSink::new();
        let mut right = CollectingSink::new();
        {
            let mut tee = TeeSink::new(&mut left, &mut right);
            tee.append(&sample_record("a")).unwrap();
        }
        assert_eq!(left.records().len(), 1);
        assert_eq!(right.records().len(), 1);
    }
}
