//! JSON-lines match feed and JSON export
//!
//! Each non-blank feed line is one [`MatchOutcome`] object. Lines starting
//! with `#` are comments. A malformed line is an `InvalidMatch` carrying its
//! line number; the reader keeps going so callers can skip it.

use crate::error::{RatingError, Result};
use crate::types::{MatchOutcome, RatingRecord};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Iterator over the matches of a JSON-lines feed
pub struct FeedReader<R> {
    lines: std::io::Lines<R>,
    line_number: usize,
}

impl<R: BufRead> FeedReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }

    /// Line number of the most recently read line
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl FeedReader<BufReader<File>> {
    /// Open a feed file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open feed {}: {}", path.display(), e))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for FeedReader<R> {
    type Item = Result<MatchOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_number += 1;

            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(RatingError::InvalidMatch {
                        reason: format!("line {}: {}", self.line_number, e),
                    }
                    .into()))
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            return Some(serde_json::from_str(trimmed).map_err(|e| {
                RatingError::InvalidMatch {
                    reason: format!("line {}: {}", self.line_number, e),
                }
                .into()
            }));
        }
    }
}

/// Write records as a JSON array, one record per line. Returns how many were
/// written.
pub fn write_export<W, I>(mut writer: W, records: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = RatingRecord>,
{
    let mut count = 0;
    writer.write_all(b"[")?;

    for record in records {
        if count > 0 {
            writer.write_all(b",")?;
        }
        writer.write_all(b"\n  ")?;
        serde_json::to_writer(&mut writer, &record)?;
        count += 1;
    }

    if count > 0 {
        writer.write_all(b"\n")?;
    }
    writer.write_all(b"]\n")?;
    writer.flush()?;

    Ok(count)
}

/// Write records to a file
pub fn export_to_file<I>(path: impl AsRef<Path>, records: I) -> Result<usize>
where
    I: IntoIterator<Item = RatingRecord>,
{
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| anyhow::anyhow!("Failed to create {}: {}", path.display(), e))?;
    write_export(std::io::BufWriter::new(file), records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::classify;
    use crate::types::{EntityId, MatchResult};
    use std::io::Cursor;

    const FEED: &str = r#"
# TI qualifiers
{"match_id": "1", "entity_a": "team:1", "entity_b": "team:2", "result": "win", "played_at": "2024-06-01T10:00:00Z", "tier": "qualifier"}

{"entity_a": "team:2", "entity_b": "team:3", "result": "sideways", "played_at": "2024-06-01T12:00:00Z"}
{"entity_a": "team:1", "entity_b": "team:3", "result": "loss", "played_at": "2024-06-02T10:00:00Z"}
"#;

    #[test]
    fn test_reads_matches_and_reports_bad_lines() {
        let items: Vec<Result<MatchOutcome>> = FeedReader::new(Cursor::new(FEED)).collect();
        assert_eq!(items.len(), 3);

        let first = items[0].as_ref().unwrap();
        assert_eq!(first.match_id.as_deref(), Some("1"));
        assert_eq!(first.entity_a, EntityId::team("1"));
        assert_eq!(first.tier, "qualifier");

        let err = items[1].as_ref().unwrap_err();
        assert_eq!(classify(err).map(|e| e.kind()), Some("invalid_match"));
        assert!(err.to_string().contains("line 5"));

        assert_eq!(items[2].as_ref().unwrap().result, MatchResult::Loss);
    }

    #[test]
    fn test_unreadable_line_keeps_numbering() {
        let feed: &[u8] = b"\xff\xfe bad\nnot json\n";
        let items: Vec<Result<MatchOutcome>> = FeedReader::new(Cursor::new(feed)).collect();
        assert_eq!(items.len(), 2);

        let first = items[0].as_ref().unwrap_err();
        assert_eq!(classify(first).map(|e| e.kind()), Some("invalid_match"));
        assert!(first.to_string().contains("line 1"));

        let second = items[1].as_ref().unwrap_err();
        assert!(second.to_string().contains("line 2"));
    }

    #[test]
    fn test_export_preserves_exact_ratings() {
        let mut record = RatingRecord::new(EntityId::team("liquid"), 1500.0);
        record.push_point(1500.6644133092445, chrono::Utc::now());

        let mut out = Vec::new();
        write_export(&mut out, vec![record.clone()]).unwrap();

        let parsed: Vec<RatingRecord> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0].rating.to_bits(), record.rating.to_bits());
        assert_eq!(parsed[0].history, record.history);
    }

    #[test]
    fn test_write_export() {
        let mut record = RatingRecord::new(EntityId::player("7"), 1500.0);
        record.rating = 1532.5;

        let mut out = Vec::new();
        let count = write_export(&mut out, vec![record.clone()]).unwrap();
        assert_eq!(count, 1);

        let parsed: Vec<RatingRecord> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, vec![record]);

        let mut empty = Vec::new();
        assert_eq!(write_export(&mut empty, Vec::new()).unwrap(), 0);
        let parsed: Vec<RatingRecord> = serde_json::from_slice(&empty).unwrap();
        assert!(parsed.is_empty());
    }
}
