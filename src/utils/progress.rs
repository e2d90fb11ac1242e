use indicatif::{ProgressBar, ProgressStyle};
use std::cell::Cell;
use std::time::Duration;

/// Progress over a known number of work units.
///
/// The counter is kept here whether or not a terminal bar is shown, so
/// callers and tests can read `position()` with the bar hidden.
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
    position: Cell<u64>,
    total: u64,
}

impl ProgressReporter {
    pub fn new(total: u64, message: &str, silent: bool) -> Self {
        let progress_bar = (!silent).then(|| {
            let pb = ProgressBar::new(total);
            let style = ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            pb.set_style(style);
            pb.set_message(message.to_string());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        Self {
            progress_bar,
            position: Cell::new(0),
            total,
        }
    }

    pub fn position(&self) -> u64 {
        self.position.get()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn increment(&self, delta: u64) {
        self.position.set(self.position.get() + delta);
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    pub fn finish_with_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish();
        }
    }
}
