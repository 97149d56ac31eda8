/*!
 * Core types and data structures shared across the teinline application
 */

use std::time::Duration;

use serde::Serialize;
use strum::Display;

/// Classification of a single file's transformation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum Status {
    /// A notes division was found, references were inlined, cleanup ran
    #[strum(serialize = "processed successfully")]
    #[serde(rename = "processed successfully")]
    Processed,
    /// No `back/div[@type="notes"]` in the document; passed through unchanged
    #[strum(serialize = "no endnotes found")]
    #[serde(rename = "no endnotes found")]
    NoEndnotes,
    /// Malformed input or structural violation; nothing was written
    #[strum(serialize = "error")]
    #[serde(rename = "error")]
    Error,
}

/// Per-document transformation statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    /// Number of endnotes found in the notes division (unique identifiers)
    pub endnotes_found: usize,
    /// Number of `ref` elements replaced with inline notes
    pub references_inlined: usize,
    /// Number of internal references that named no known endnote
    pub dangling_references: usize,
    /// Warning-level conditions encountered during the transformation
    pub warnings: Vec<String>,
}

/// Outcome of one document transformation
#[derive(Debug, Clone)]
pub struct Outcome {
    pub status: Status,
    pub stats: Stats,
}

/// Result row for a single processed file
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    /// Input path relative to the input directory
    pub file: String,
    pub status: Status,
    /// Human-readable outcome details (counts or the error message)
    pub details: String,
    pub stats: Stats,
}

/// Aggregated results for one batch run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Output directory path
    pub output_dir: String,
    /// Wall-clock time for the whole batch
    pub duration: Duration,
    /// Per-file records, one per input file
    pub records: Vec<FileRecord>,
}

impl RunReport {
    pub fn count_with(&self, status: Status) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    pub fn total_endnotes(&self) -> usize {
        self.records.iter().map(|r| r.stats.endnotes_found).sum()
    }

    pub fn total_inlined(&self) -> usize {
        self.records.iter().map(|r| r.stats.references_inlined).sum()
    }

    pub fn total_dangling(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.stats.dangling_references)
            .sum()
    }
}
