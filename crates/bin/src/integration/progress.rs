//! Progress bars for the per-day window loops.

use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;

/// A bar over `len` window end dates, hidden when there is nothing to evaluate.
pub(crate) fn window_progress(len: usize, message: &str) -> Result<ProgressBar, Box<dyn Error>> {
    if len == 0 {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    pb.set_message(message.to_string());
    Ok(pb)
}
