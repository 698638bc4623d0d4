//! CSV to search-index bridge.
//!
//! Reads a completed (or still-growing) output CSV and upserts its records
//! into the full-text index in batches. The CSV is append-only and
//! line-oriented, so partial files index cleanly; malformed lines are
//! counted and skipped, never fatal.

use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{info, warn};

use super::engine::{DocRecord, SearchEngine};
use crate::writer::decode_fields;

/// Default records per upsert batch.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Outcome of one bridge run.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct BridgeReport {
    pub indexed: usize,
    pub skipped: usize,
    pub batches: usize,
}

/// Title for a record: the innermost name along the URL's nesting chain,
/// else the last path segment.
#[must_use]
pub fn title_of(url: &str) -> String {
    let name = match url.rsplit_once('#') {
        Some((_, fragment)) if !fragment.is_empty() => fragment,
        _ => url.rsplit('/').next().unwrap_or(url),
    };
    name.to_string()
}

fn record_from_fields(fields: [String; 8]) -> DocRecord {
    let [timestamp, url, _physical, server, share, ext, class, content] = fields;
    DocRecord {
        title: title_of(&url),
        url,
        content,
        filetype: class,
        ext,
        timestamp: timestamp.parse().unwrap_or(0),
        server,
        share,
    }
}

/// Index every parseable record of `csv_path` into `engine`.
pub fn index_csv(
    engine: &SearchEngine,
    csv_path: &Path,
    batch_size: usize,
) -> Result<BridgeReport> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let reader = BufReader::new(file);

    let mut report = BridgeReport {
        indexed: 0,
        skipped: 0,
        batches: 0,
    };
    let mut pending: Vec<(usize, String)> = Vec::with_capacity(batch_size);

    let mut flush = |pending: &mut Vec<(usize, String)>, report: &mut BridgeReport| -> Result<()> {
        if pending.is_empty() {
            return Ok(());
        }
        // Decode in parallel, upsert in submission order.
        let decoded: Vec<(usize, Option<DocRecord>)> = pending
            .par_iter()
            .map(|(line_no, line)| (*line_no, decode_fields(line).map(record_from_fields)))
            .collect();
        let mut batch = Vec::with_capacity(decoded.len());
        for (line_no, record) in decoded {
            match record {
                Some(record) => batch.push(record),
                None => {
                    warn!(line = line_no, "skipping malformed CSV line");
                    report.skipped += 1;
                }
            }
        }
        report.indexed += engine.upsert_batch(&batch).context("batch upsert failed")?;
        report.batches += 1;
        pending.clear();
        Ok(())
    };

    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read error at line {}", index + 1))?;
        if line.is_empty() {
            continue;
        }
        pending.push((index + 1, line));
        if pending.len() >= batch_size {
            flush(&mut pending, &mut report)?;
        }
    }
    flush(&mut pending, &mut report)?;

    info!(
        indexed = report.indexed,
        skipped = report.skipped,
        batches = report.batches,
        "bridge run complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::DocClass;
    use crate::writer::{FileRecord, IndexWriter};

    #[test]
    fn title_prefers_nested_fragment() {
        assert_eq!(title_of("file://fs01/share/a/b.zip#report.pdf"), "report.pdf");
        assert_eq!(title_of("file://fs01/share/a/b.txt"), "b.txt");
        assert_eq!(title_of("local/data/notes.txt"), "notes.txt");
    }

    #[test]
    fn bridge_indexes_written_records_and_skips_noise() {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv = dir.path().join("out.csv");

        let writer = IndexWriter::create(&csv, 16, false).expect("writer");
        for (name, content) in [
            ("alpha.txt", "alpha document body"),
            ("beta.txt", "beta document body"),
        ] {
            writer
                .append(&FileRecord {
                    timestamp: 1_700_000_000,
                    logical_url: format!("file://fs01/share/{name}"),
                    physical_path: format!("smb/fs01/share/{name}"),
                    server: "fs01".into(),
                    share: "share".into(),
                    extension: "txt".into(),
                    class: DocClass::Text,
                    content: content.into(),
                })
                .expect("append");
        }
        writer.flush().expect("flush");

        // A truncated tail line, as an in-progress crawl would leave.
        std::fs::OpenOptions::new()
            .append(true)
            .open(&csv)
            .and_then(|mut f| {
                use std::io::Write;
                writeln!(f, "1700000001,\"file://fs01/share/torn")
            })
            .expect("append torn line");

        let index_dir = dir.path().join("index");
        let engine = SearchEngine::open(&index_dir).expect("open");
        let report = index_csv(&engine, &csv, DEFAULT_BATCH_SIZE).expect("bridge");

        assert_eq!(report.indexed, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(engine.num_docs(), 2);

        let doc = engine
            .doc_by_url("file://fs01/share/alpha.txt")
            .expect("lookup");
        assert_eq!(doc.title, "alpha.txt");
        assert_eq!(doc.content, "alpha document body");
    }

    #[test]
    fn bridge_rerun_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv = dir.path().join("out.csv");
        let writer = IndexWriter::create(&csv, 16, false).expect("writer");
        writer
            .append(&FileRecord {
                timestamp: 1,
                logical_url: "file://fs01/share/one.txt".into(),
                physical_path: "smb/fs01/share/one.txt".into(),
                server: "fs01".into(),
                share: "share".into(),
                extension: "txt".into(),
                class: DocClass::Text,
                content: "same record".into(),
            })
            .expect("append");
        writer.flush().expect("flush");

        let engine = SearchEngine::open(&dir.path().join("index")).expect("open");
        index_csv(&engine, &csv, 10).expect("first run");
        index_csv(&engine, &csv, 10).expect("second run");
        assert_eq!(engine.num_docs(), 1);
    }
}
