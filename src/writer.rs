//! Concurrency-safe buffered CSV index writer.
//!
//! One record per emitted file: eight comma-separated fields, fields 2–8
//! always double-quoted with interior quotes doubled. Records accumulate in
//! an in-memory buffer that is appended to the output file when it exceeds
//! the configured size and on flush. Appends are serialized behind a mutex;
//! an exclusive file lock is taken per append when several processes share
//! one output file.

use std::io::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use fs2::FileExt;
use parking_lot::Mutex;
use tracing::debug;

use crate::classify::DocClass;

/// One row of the output index.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// Unix seconds at emission.
    pub timestamp: i64,
    pub logical_url: String,
    /// On-disk location actually read; the containing document for nested
    /// files.
    pub physical_path: String,
    pub server: String,
    pub share: String,
    pub extension: String,
    pub class: DocClass,
    /// Extracted text, already free of control characters and commas.
    pub content: String,
}

/// Strip characters that would break the line-oriented format. Applied
/// defensively to every field at encode time; adapters strip earlier.
fn sanitize_field(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '\0' && *c != '\r' && *c != '\n')
        .collect()
}

/// Content cleanup applied when a record is built: control characters and
/// commas become spaces (NULs are dropped outright), keeping the content
/// field free of every character the format reserves.
#[must_use]
pub fn clean_content(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '\0')
        .map(|c| {
            if c == ',' || c.is_control() {
                ' '
            } else {
                c
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn quoted(field: &str, out: &mut String) {
    out.push('"');
    for c in sanitize_field(field).chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
}

/// Encode one record as a CSV line, without the trailing newline.
#[must_use]
pub fn encode_record(record: &FileRecord) -> String {
    let mut line = String::with_capacity(128 + record.content.len());
    line.push_str(&record.timestamp.to_string());
    for field in [
        record.logical_url.as_str(),
        record.physical_path.as_str(),
        record.server.as_str(),
        record.share.as_str(),
        record.extension.as_str(),
        record.class.as_str(),
        record.content.as_str(),
    ] {
        line.push(',');
        quoted(field, &mut line);
    }
    line
}

/// Decode one CSV line back into its eight fields. Returns `None` on any
/// structural violation; the bridge skips such lines with a warning.
#[must_use]
pub fn decode_fields(line: &str) -> Option<[String; 8]> {
    let mut fields: Vec<String> = Vec::with_capacity(8);
    let mut chars = line.chars().peekable();

    // Field 1: unquoted timestamp.
    let mut ts = String::new();
    for c in chars.by_ref() {
        if c == ',' {
            break;
        }
        ts.push(c);
    }
    fields.push(ts);

    // Fields 2-8: always quoted.
    while fields.len() < 8 {
        if chars.next()? != '"' {
            return None;
        }
        let mut field = String::new();
        loop {
            match chars.next()? {
                '"' => match chars.peek() {
                    Some('"') => {
                        chars.next();
                        field.push('"');
                    }
                    _ => break,
                },
                c => field.push(c),
            }
        }
        fields.push(field);
        if fields.len() < 8 && chars.next() != Some(',') {
            return None;
        }
    }

    if chars.next().is_some() {
        return None;
    }
    fields.try_into().ok()
}

struct WriterInner {
    buf: String,
    file: std::fs::File,
}

/// Buffered appender for the CSV index file.
pub struct IndexWriter {
    inner: Mutex<WriterInner>,
    buffer_cap: usize,
    lock_output: bool,
}

impl IndexWriter {
    /// Open the output file for append, creating it if missing.
    pub fn create(path: &Path, buffer_cap: usize, lock_output: bool) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output dir {}", parent.display()))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open index file {}", path.display()))?;

        Ok(Self {
            inner: Mutex::new(WriterInner {
                buf: String::with_capacity(buffer_cap + 4096),
                file,
            }),
            buffer_cap,
            lock_output,
        })
    }

    /// Append one record to the buffer, flushing when the buffer exceeds the
    /// configured size. Errors here are fatal to the run.
    pub fn append(&self, record: &FileRecord) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.buf.push_str(&encode_record(record));
        inner.buf.push('\n');
        if inner.buf.len() >= self.buffer_cap {
            self.flush_locked(&mut inner)?;
        }
        Ok(())
    }

    /// Write out everything buffered. Called at run completion and on
    /// signal-triggered shutdown.
    pub fn flush(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        self.flush_locked(&mut inner)
    }

    fn flush_locked(&self, inner: &mut WriterInner) -> Result<()> {
        if inner.buf.is_empty() {
            return Ok(());
        }
        if self.lock_output {
            inner
                .file
                .lock_exclusive()
                .context("failed to lock index file")?;
        }
        let result = inner
            .file
            .write_all(inner.buf.as_bytes())
            .and_then(|()| inner.file.flush())
            .context("failed to append to index file");
        if self.lock_output {
            let _ = fs2::FileExt::unlock(&inner.file);
        }
        result?;
        debug!(bytes = inner.buf.len(), "flushed index buffer");
        inner.buf.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content: &str) -> FileRecord {
        FileRecord {
            timestamp: 1_700_000_000,
            logical_url: "file://fs01/share/doc.txt".into(),
            physical_path: "smb/fs01/share/doc.txt".into(),
            server: "fs01".into(),
            share: "share".into(),
            extension: "txt".into(),
            class: DocClass::Text,
            content: content.into(),
        }
    }

    #[test]
    fn encoding_quotes_fields_two_through_eight() {
        let line = encode_record(&record("hello world"));
        assert_eq!(
            line,
            "1700000000,\"file://fs01/share/doc.txt\",\"smb/fs01/share/doc.txt\",\"fs01\",\"share\",\"txt\",\"text\",\"hello world\""
        );
    }

    #[test]
    fn interior_quotes_are_doubled() {
        let line = encode_record(&record("say \"hi\" twice"));
        assert!(line.ends_with("\"say \"\"hi\"\" twice\""));
        let fields = decode_fields(&line).expect("decode");
        assert_eq!(fields[7], "say \"hi\" twice");
    }

    #[test]
    fn clean_content_strips_reserved_characters() {
        assert_eq!(clean_content("hello,world\n\"quote\""), "hello world \"quote\"");
        assert_eq!(clean_content("nul\0byte"), "nulbyte");
        assert_eq!(clean_content("tab\there"), "tab here");
        assert_eq!(clean_content("  padded  "), "padded");
    }

    #[test]
    fn decode_rejects_malformed_lines() {
        assert!(decode_fields("123,unquoted,\"x\"").is_none());
        assert!(decode_fields("123,\"only\",\"three\"").is_none());
        let good = encode_record(&record("fine"));
        assert!(decode_fields(&format!("{good},\"extra\"")).is_none());
    }

    #[test]
    fn buffer_flushes_at_capacity_and_on_demand() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.csv");
        let writer = IndexWriter::create(&path, 64, false).expect("create");

        writer.append(&record("first")).expect("append");
        // Tiny capacity: the first append already crossed it and flushed.
        let on_disk = std::fs::read_to_string(&path).expect("read");
        assert!(on_disk.contains("\"first\""));

        let writer = IndexWriter::create(&path, 1024 * 1024, false).expect("create");
        writer.append(&record("second")).expect("append");
        assert!(
            !std::fs::read_to_string(&path)
                .expect("read")
                .contains("\"second\"")
        );
        writer.flush().expect("flush");
        assert!(
            std::fs::read_to_string(&path)
                .expect("read")
                .contains("\"second\"")
        );
    }

    #[test]
    fn field_count_is_always_eight() {
        let adversarial = record("quotes \"\" and unicode ☃ and spaces");
        let line = encode_record(&adversarial);
        let fields = decode_fields(&line).expect("decode");
        assert_eq!(fields.len(), 8);
        assert_eq!(fields[0], "1700000000");
        assert_eq!(fields[6], "text");
    }
}
