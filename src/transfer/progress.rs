// 进度显示
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}";

/// Byte counter for one SCP stream, drawn on stderr.
pub struct ProgressTracker {
    progress_bar: ProgressBar,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(description: &str) -> Self {
        Self::with_bar(ProgressBar::new(0), description)
    }

    /// Counts bytes without drawing anything.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden(), "")
    }

    fn with_bar(progress_bar: ProgressBar, description: &str) -> Self {
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        progress_bar.set_style(style);
        progress_bar.set_message(description.to_string());

        Self {
            progress_bar,
            start_time: Instant::now(),
        }
    }

    pub fn set_total(&self, total: u64) {
        self.progress_bar.set_length(total);
    }

    pub fn add_bytes(&self, bytes: u64) {
        self.progress_bar.inc(bytes);
    }

    pub fn transferred(&self) -> u64 {
        self.progress_bar.position()
    }

    pub fn finish(&self) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let total = self.transferred();
        let avg_speed = if elapsed > 0.0 {
            (total as f64 / elapsed) as u64
        } else {
            total
        };
        self.progress_bar
            .finish_with_message(format!("avg speed: {}", format_speed(avg_speed)));
    }

    pub fn finish_with_error(&self, error: &str) {
        self.progress_bar.abandon_with_message(format!("failed: {}", error));
    }
}

fn format_speed(bytes_per_sec: u64) -> String {
    if bytes_per_sec < 1024 {
        format!("{} B/s", bytes_per_sec)
    } else if bytes_per_sec < 1024 * 1024 {
        format!("{:.2} KB/s", bytes_per_sec as f64 / 1024.0)
    } else if bytes_per_sec < 1024 * 1024 * 1024 {
        format!("{:.2} MB/s", bytes_per_sec as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB/s", bytes_per_sec as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_bytes_when_hidden() {
        let progress = ProgressTracker::hidden();
        progress.set_total(10);
        progress.add_bytes(4);
        progress.add_bytes(6);
        assert_eq!(progress.transferred(), 10);
        progress.finish();
    }

    #[test]
    fn speed_units() {
        assert_eq!(format_speed(512), "512 B/s");
        assert_eq!(format_speed(2048), "2.00 KB/s");
        assert_eq!(format_speed(3 * 1024 * 1024), "3.00 MB/s");
        assert_eq!(format_speed(1024 * 1024 * 1024), "1.00 GB/s");
    }
}
