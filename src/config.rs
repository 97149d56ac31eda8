/*!
 * Configuration handling for teinline
 */

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use crate::ensure;
use crate::error::Result;
use crate::report::ReportFormat;

/// Command-line arguments for teinline
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "teinline",
    version = env!("CARGO_PKG_VERSION"),
    about = "Inline TEI P5 endnotes at their reference sites",
    long_about = "Rewrites ELTeC-style TEI P5 documents so that endnotes stored in <back><div type=\"notes\"> appear as inline notes at each reference site, the shape expected by publisher-style rendering pipelines."
)]
pub struct Args {
    /// Directory containing the TEI XML files to transform
    #[clap(required_unless_present = "generate")]
    pub input_dir: Option<String>,

    /// Directory receiving the transformed files (mirrors the input layout)
    #[clap(required_unless_present = "generate")]
    pub output_dir: Option<String>,

    /// Comma-separated list of file name patterns to ignore
    #[clap(long, value_delimiter = ',')]
    pub ignore_patterns: Vec<String>,

    /// Comma-separated list of file name patterns to include (if specified, only matching files are processed)
    #[clap(long, value_delimiter = ',')]
    pub include_patterns: Vec<String>,

    /// Number of threads to use for processing
    #[clap(long, default_value = "4")]
    pub threads: usize,

    /// Write the summary table (file, status, details) to a CSV file
    #[clap(long)]
    pub csv: Option<String>,

    /// Write the run log to a file
    #[clap(long)]
    pub log_file: Option<String>,

    /// Report format printed after the run
    #[clap(long, value_enum, default_value_t = ReportFormat::Table)]
    pub format: ReportFormat,

    /// Suppress the progress bar and per-file log lines
    #[clap(long)]
    pub quiet: bool,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory holding the input documents
    pub input_dir: PathBuf,

    /// Directory receiving the transformed documents
    pub output_dir: PathBuf,

    /// Patterns to ignore
    pub ignore_patterns: Vec<String>,

    /// Patterns to include (if empty, include all)
    pub include_patterns: Vec<String>,

    /// Number of threads to use for processing
    pub num_threads: usize,

    /// Optional CSV summary destination
    pub csv_file: Option<PathBuf>,

    /// Optional run log destination
    pub log_file: Option<PathBuf>,

    /// Report format printed after the run
    pub format: ReportFormat,

    /// Whether to suppress progress output
    pub quiet: bool,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Self {
        Self {
            input_dir: PathBuf::from(args.input_dir.unwrap_or_default()),
            output_dir: PathBuf::from(args.output_dir.unwrap_or_default()),
            ignore_patterns: args.ignore_patterns,
            include_patterns: args.include_patterns,
            num_threads: args.threads,
            csv_file: args.csv.map(PathBuf::from),
            log_file: args.log_file.map(PathBuf::from),
            format: args.format,
            quiet: args.quiet,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.input_dir.as_os_str().is_empty(),
            Config,
            "missing input directory"
        );
        ensure!(
            self.input_dir.is_dir(),
            Config,
            "input directory not found: {}",
            self.input_dir.display()
        );
        ensure!(
            !self.output_dir.as_os_str().is_empty(),
            Config,
            "missing output directory"
        );
        if self.output_dir.exists() {
            ensure!(
                self.output_dir.is_dir(),
                Config,
                "output path is not a directory: {}",
                self.output_dir.display()
            );
        }
        ensure!(
            self.input_dir != self.output_dir,
            Config,
            "input and output directories must differ"
        );
        Ok(())
    }
}
