//! Progress bar rendering for the CLI

use std::path::Path;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use partdl_core::RateEstimator;
use partdl_types::ProgressEvent;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {wide_msg}";

/// Renders the session's progress events as an indicatif bar whose message
/// is the rate estimator's status line. Stalled events update the message
/// but not the position, so retries are visible without resetting the bar.
pub struct ProgressRenderer {
    bar: ProgressBar,
    estimator: RateEstimator,
}

impl ProgressRenderer {
    pub fn new(total: u64, ascii: bool) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .expect("static template")
                .progress_chars(if ascii { "#>-" } else { "█▓▒░  " }),
        );
        Self {
            bar,
            estimator: RateEstimator::new().ascii(ascii),
        }
    }

    pub fn handle(&mut self, event: &ProgressEvent) {
        let status = self.estimator.update(event);
        if !event.is_stalled() {
            self.bar.set_position(event.bytes_so_far);
        }
        self.bar.set_message(status);
    }

    pub fn finish(&self, destination: &Path) {
        self.bar.finish_with_message(format!(
            "{} saved {}",
            style("✓").green().bold(),
            style(destination.display().to_string()).cyan()
        ));
    }
}
