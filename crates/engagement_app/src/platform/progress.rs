use std::sync::OnceLock;

use engagement_engine::{ProgressSink, RunEvent};
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{msg:<28} [{bar:40}] {pos}/{len} ({eta})";

/// Terminal progress: one bar for batches, one for the fallback rows.
pub struct ProgressBars {
    batches: ProgressBar,
    fallback: OnceLock<ProgressBar>,
}

impl ProgressBars {
    pub fn new() -> Self {
        Self {
            batches: styled_bar(0, "Collecting in batches"),
            fallback: OnceLock::new(),
        }
    }

    pub fn finish(&self) {
        self.batches.finish();
        if let Some(bar) = self.fallback.get() {
            bar.finish();
        }
    }
}

impl Default for ProgressBars {
    fn default() -> Self {
        Self::new()
    }
}

fn styled_bar(len: u64, message: &'static str) -> ProgressBar {
    let style = ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    ProgressBar::new(len).with_style(style).with_message(message)
}

impl ProgressSink for ProgressBars {
    fn emit(&self, event: RunEvent) {
        match event {
            RunEvent::BatchesPlanned { batches, .. } => self.batches.set_length(batches as u64),
            RunEvent::BatchCompleted { .. } => self.batches.inc(1),
            RunEvent::BatchFailed { batch, cause, .. } => {
                self.batches.println(format!("batch {batch} failed: {cause}"));
                self.batches.inc(1);
            }
            RunEvent::FallbackPlanned { rows } => {
                self.batches.finish();
                let _ = self
                    .fallback
                    .set(styled_bar(rows as u64, "Collecting failed rows"));
            }
            RunEvent::FallbackRowCompleted { .. } => {
                if let Some(bar) = self.fallback.get() {
                    bar.inc(1);
                }
            }
        }
    }
}
