use anyhow::Result;
use framepulse_core::indicator::Indicator;
use indicatif::{ProgressBar, ProgressStyle};

pub fn bar_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template("{msg:24} [{bar:40}] {pos}/{len} frames ({eta})")?
        .progress_chars("=> "))
}

/// Terminal bar whose message tracks the aggregator description.
pub struct BarIndicator {
    bar: ProgressBar,
}

impl BarIndicator {
    pub fn new(total: u64, description: &str, style: ProgressStyle) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(style);
        bar.set_message(description.to_string());
        Self { bar }
    }
}

impl Indicator for BarIndicator {
    fn set_description(&mut self, description: &str) {
        self.bar.set_message(description.to_string());
    }

    fn advance(&mut self, n: u64) {
        self.bar.inc(n);
    }

    fn position(&self) -> u64 {
        self.bar.position()
    }

    fn total(&self) -> u64 {
        self.bar.length().unwrap_or(0)
    }

    fn close(&mut self) {
        self.bar.finish();
    }
}
