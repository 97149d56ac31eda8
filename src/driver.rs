/*!
 * Batch processing of a directory of TEI XML files
 *
 * Each file is an independent failure domain: a file that cannot be parsed
 * or transformed is recorded as an error and the batch continues. Output is
 * all-or-nothing per file; results are staged next to the target and renamed
 * into place only once fully written.
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use glob_match::glob_match;
use indicatif::ProgressBar;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::Result;
use crate::report::log_line;
use crate::transform::transform;
use crate::types::{FileRecord, Outcome, RunReport, Stats, Status};
use crate::xml;

/// Driver for transforming every XML file under the input directory
pub struct Driver {
    /// Driver configuration
    config: Config,
    /// Progress bar
    pub progress: Arc<ProgressBar>,
}

impl Driver {
    /// Create a new driver
    pub fn new(config: Config, progress: Arc<ProgressBar>) -> Self {
        Self { config, progress }
    }

    /// Enumerate the XML files to process, relative to the input directory
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.config.input_dir)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !is_xml(path) || self.should_ignore(path) || !self.should_include(path) {
                continue;
            }
            let rel = path
                .strip_prefix(&self.config.input_dir)
                .unwrap_or(path)
                .to_path_buf();
            files.push(rel);
        }
        files.sort();
        Ok(files)
    }

    /// Transform every selected file and aggregate the per-file records
    pub fn run(&self) -> Result<RunReport> {
        let files = self.collect_files()?;
        fs::create_dir_all(&self.config.output_dir)?;

        let start = Instant::now();

        // Files are independent; records come back in input order
        let records: Vec<FileRecord> = files
            .par_iter()
            .map(|rel| self.process_file(rel))
            .collect();

        Ok(RunReport {
            output_dir: self.config.output_dir.display().to_string(),
            duration: start.elapsed(),
            records,
        })
    }

    /// Transform a single file, folding any failure into its record
    fn process_file(&self, rel: &Path) -> FileRecord {
        let name = rel.display().to_string();
        self.progress.set_message(name.clone());

        let record = match self.transform_file(rel) {
            Ok(outcome) => FileRecord {
                file: name,
                status: outcome.status,
                details: describe(&outcome),
                stats: outcome.stats,
            },
            Err(e) => FileRecord {
                file: name,
                status: Status::Error,
                details: e.to_string(),
                stats: Stats::default(),
            },
        };

        if !self.config.quiet {
            self.progress.println(log_line(&record));
        }
        self.progress.inc(1);

        record
    }

    /// Parse, transform and atomically write one file
    fn transform_file(&self, rel: &Path) -> Result<Outcome> {
        let input_path = self.config.input_dir.join(rel);
        let output_path = self.config.output_dir.join(rel);

        let source = fs::read_to_string(&input_path)?;
        let mut doc = xml::parse_str(&source)?;
        let outcome = transform(&mut doc)?;
        let bytes = xml::write_document(&doc)?;

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Complete output or nothing: stage next to the target, then rename
        let staged = output_path.with_extension("xml.tmp");
        if let Err(e) = fs::write(&staged, &bytes).and_then(|()| fs::rename(&staged, &output_path))
        {
            let _ = fs::remove_file(&staged);
            return Err(e.into());
        }

        Ok(outcome)
    }

    /// Check if a file should be ignored based on patterns
    pub fn should_ignore(&self, path: &Path) -> bool {
        let file_name = path.file_name().unwrap_or_default().to_string_lossy();
        self.config
            .ignore_patterns
            .iter()
            .any(|pattern| glob_match(pattern, &file_name))
    }

    /// Check if a file should be included based on patterns
    pub fn should_include(&self, path: &Path) -> bool {
        // If no include patterns, include everything
        if self.config.include_patterns.is_empty() {
            return true;
        }

        let file_name = path.file_name().unwrap_or_default().to_string_lossy();
        self.config
            .include_patterns
            .iter()
            .any(|pattern| glob_match(pattern, &file_name))
    }
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}

/// Human-readable details for the report table
fn describe(outcome: &Outcome) -> String {
    match outcome.status {
        Status::NoEndnotes => "no notes division".to_string(),
        _ => {
            let mut details = format!(
                "{} endnotes, {} references inlined",
                outcome.stats.endnotes_found, outcome.stats.references_inlined
            );
            if outcome.stats.dangling_references > 0 {
                details.push_str(&format!(
                    ", {} dangling",
                    outcome.stats.dangling_references
                ));
            }
            details
        }
    }
}
