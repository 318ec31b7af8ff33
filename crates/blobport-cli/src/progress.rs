//! Progress bar helpers for the migration phases.

use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar for a phase. The length is set by the migrator once the
/// record count is known.
pub fn phase_progress(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}
