/*!
 * Command-line interface for teinline
 */

use std::io;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPoolBuilder;

use teinline::config::{Args, Config};
use teinline::driver::Driver;
use teinline::error::Result;
use teinline::report::Reporter;
use teinline::utils::count_files;

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Generate shell completions and exit
    if let Some(shell) = args.generate {
        clap_complete::generate(shell, &mut Args::command(), "teinline", &mut io::stdout());
        return Ok(());
    }

    // Create configuration
    let config = Config::from_args(args);

    // Validate configuration
    config.validate()?;

    // Configure thread pool
    if let Err(e) = ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build_global()
    {
        eprintln!("Warning: Failed to set thread pool size: {}", e);
    }

    // Create progress bar
    let progress = if config.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    if !config.quiet {
        progress.set_style(ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len} ({percent}%) ⏱️  Elapsed: {elapsed_precise}  Remaining: {eta_precise}")
            .unwrap());
        progress.enable_steady_tick(std::time::Duration::from_millis(100));
        progress.set_prefix("📄 Processing");
        progress.set_message(format!(
            "📂 Scanning directory: {}",
            config.input_dir.display()
        ));
    }

    // Count files for progress tracking
    let total_files = match count_files(&config) {
        Ok(count) => {
            progress.set_message(format!("🔎 Found {} files to process", count));
            count
        }
        Err(e) => {
            progress.set_message(format!("⚠️ Warning: Failed to count files: {}", e));
            0
        }
    };
    progress.set_length(total_files);

    // Transform the batch
    let driver = Driver::new(config.clone(), Arc::new(progress.clone()));
    let report = driver.run()?;

    // Clear the progress bar
    progress.finish_and_clear();

    // Print the report
    let reporter = Reporter::new(config.format);
    reporter.print_report(&report)?;

    // Write the machine-readable summary and the run log when requested
    if let Some(path) = &config.csv_file {
        reporter.write_csv(&report, path)?;
    }
    if let Some(path) = &config.log_file {
        reporter.write_log(&report, path)?;
    }

    Ok(())
}
