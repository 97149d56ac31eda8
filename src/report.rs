/*!
 * Reporting functionality for teinline
 *
 * Renders per-file results and the run summary using the tabled library,
 * and writes the machine-readable CSV / JSON summaries and the run log.
 * The reporting layer consumes the structured records produced by the
 * driver; nothing is ever parsed back out of log text.
 */

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Local;
use clap::ValueEnum;
use serde_json::json;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::error::Result;
use crate::types::{FileRecord, RunReport, Status};

/// Format of the report output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Console table output
    Table,
    /// JSON document on stdout
    Json,
}

/// Report generator for batch results
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Generate a report string based on the run results
    pub fn generate_report(&self, report: &RunReport) -> Result<String> {
        match self.format {
            ReportFormat::Table => Ok(self.generate_console_report(report)),
            ReportFormat::Json => self.generate_json_report(report),
        }
    }

    /// Print the report to stdout
    pub fn print_report(&self, report: &RunReport) -> Result<()> {
        println!("\n{}", self.generate_report(report)?);
        Ok(())
    }

    // Create the per-file table using the tabled crate
    fn create_files_table(&self, report: &RunReport) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File")]
            file: String,

            #[tabled(rename = "Status")]
            status: String,

            #[tabled(rename = "Details")]
            details: String,
        }

        let rows: Vec<FileRow> = report
            .records
            .iter()
            .map(|record| FileRow {
                file: record.file.clone(),
                status: record.status.to_string(),
                details: record.details.clone(),
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    // Create the run summary table using the tabled crate
    fn create_summary_table(&self, report: &RunReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let rows = vec![
            SummaryRow {
                key: "📂 Output Directory".to_string(),
                value: report.output_dir.clone(),
            },
            SummaryRow {
                key: "⏱️ Process Time".to_string(),
                value: format!("{:.4?}", report.duration),
            },
            SummaryRow {
                key: "📄 Files Processed".to_string(),
                value: report.records.len().to_string(),
            },
            SummaryRow {
                key: "✅ Successful".to_string(),
                value: report.count_with(Status::Processed).to_string(),
            },
            SummaryRow {
                key: "⬜ Without Endnotes".to_string(),
                value: report.count_with(Status::NoEndnotes).to_string(),
            },
            SummaryRow {
                key: "❌ Errors".to_string(),
                value: report.count_with(Status::Error).to_string(),
            },
            SummaryRow {
                key: "🗒️ Endnotes Found".to_string(),
                value: report.total_endnotes().to_string(),
            },
            SummaryRow {
                key: "🔗 References Inlined".to_string(),
                value: report.total_inlined().to_string(),
            },
            SummaryRow {
                key: "⚠️ Dangling References".to_string(),
                value: report.total_dangling().to_string(),
            },
        ];

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    // Generate a console table report
    fn generate_console_report(&self, report: &RunReport) -> String {
        let files_table = self.create_files_table(report);
        let summary_table = self.create_summary_table(report);

        format!(
            "📋  PROCESSED FILES\n{}\n\n✅  TRANSFORMATION COMPLETE\n{}",
            files_table, summary_table
        )
    }

    // Generate a JSON report with per-file records and run totals
    fn generate_json_report(&self, report: &RunReport) -> Result<String> {
        let value = json!({
            "output_dir": report.output_dir,
            "duration_secs": report.duration.as_secs_f64(),
            "files_processed": report.records.len(),
            "successful": report.count_with(Status::Processed),
            "no_endnotes": report.count_with(Status::NoEndnotes),
            "errors": report.count_with(Status::Error),
            "endnotes_found": report.total_endnotes(),
            "references_inlined": report.total_inlined(),
            "dangling_references": report.total_dangling(),
            "files": report.records,
        });
        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// Write the `file,status,details` summary table as CSV
    pub fn write_csv(&self, report: &RunReport, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);

        writeln!(out, "file,status,details")?;
        for record in &report.records {
            writeln!(
                out,
                "{},{},{}",
                csv_field(&record.file),
                csv_field(&record.status.to_string()),
                csv_field(&record.details)
            )?;
        }

        out.flush()?;
        Ok(())
    }

    /// Write the run log: a timestamped header, one line per file, warnings beneath
    pub fn write_log(&self, report: &RunReport, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);

        writeln!(out, "teinline run at {}", Local::now().to_rfc3339())?;
        writeln!(out, "output directory: {}", report.output_dir)?;
        writeln!(out)?;

        for record in &report.records {
            writeln!(out, "{}", log_line(record))?;
            for warning in &record.stats.warnings {
                writeln!(out, "  warning: {warning}")?;
            }
        }

        writeln!(out)?;
        writeln!(
            out,
            "{} files, {} successful, {} without endnotes, {} errors",
            report.records.len(),
            report.count_with(Status::Processed),
            report.count_with(Status::NoEndnotes),
            report.count_with(Status::Error)
        )?;

        out.flush()?;
        Ok(())
    }
}

/// Run-log line for one file, also used for the console per-file output
pub fn log_line(record: &FileRecord) -> String {
    match record.status {
        Status::Processed => format!("Successfully processed {}", record.file),
        Status::NoEndnotes => format!("No endnotes found in {}", record.file),
        Status::Error => format!("ERROR processing {}: {}", record.file, record.details),
    }
}

// Quote a CSV field when it contains a delimiter, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
