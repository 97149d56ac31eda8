/*!
 * Utility functions for teinline
 */

use std::sync::Arc;

use indicatif::ProgressBar;

use crate::config::Config;
use crate::driver::Driver;
use crate::error::Result;

/// Count the files selected for processing, for progress tracking
pub fn count_files(config: &Config) -> Result<u64> {
    let driver = Driver::new(config.clone(), Arc::new(ProgressBar::hidden()));
    Ok(driver.collect_files()?.len() as u64)
}
