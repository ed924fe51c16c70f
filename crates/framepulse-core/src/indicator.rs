use tracing::info;

use crate::consts::PROGRESS_LOG_TARGET;

/// Rendering target for overall progress: a terminal bar, a log line, etc.
///
/// `advance` callers are expected to stay within `total() - position()`;
/// the aggregator clips its increments accordingly.
pub trait Indicator: Send {
    fn set_description(&mut self, description: &str);
    fn advance(&mut self, n: u64);
    fn position(&self) -> u64;
    fn total(&self) -> u64;
    fn close(&mut self);
}

/// Indicator that only keeps counts. Used when nothing is displayed.
#[derive(Clone, Debug, Default)]
pub struct HeadlessIndicator {
    description: String,
    position: u64,
    total: u64,
    closed: bool,
}

impl HeadlessIndicator {
    pub fn new(total: u64, description: &str) -> Self {
        Self {
            description: description.to_string(),
            position: 0,
            total,
            closed: false,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Indicator for HeadlessIndicator {
    fn set_description(&mut self, description: &str) {
        self.description.clear();
        self.description.push_str(description);
    }

    fn advance(&mut self, n: u64) {
        self.position = self.position.saturating_add(n).min(self.total);
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn total(&self) -> u64 {
        self.total
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Indicator that reports through `tracing` whenever the description changes.
///
/// Lines are logged at `info` under [`PROGRESS_LOG_TARGET`].
pub struct LogIndicator {
    inner: HeadlessIndicator,
}

impl LogIndicator {
    pub fn new(total: u64, description: &str) -> Self {
        info!(target: PROGRESS_LOG_TARGET, total, "{description}");
        Self {
            inner: HeadlessIndicator::new(total, description),
        }
    }
}

impl Indicator for LogIndicator {
    fn set_description(&mut self, description: &str) {
        if description != self.inner.description() {
            info!(
                target: PROGRESS_LOG_TARGET,
                position = self.inner.position(),
                total = self.inner.total(),
                "{description}"
            );
        }
        self.inner.set_description(description);
    }

    fn advance(&mut self, n: u64) {
        self.inner.advance(n);
    }

    fn position(&self) -> u64 {
        self.inner.position()
    }

    fn total(&self) -> u64 {
        self.inner.total()
    }

    fn close(&mut self) {
        info!(
            target: PROGRESS_LOG_TARGET,
            position = self.inner.position(),
            total = self.inner.total(),
            "{} done",
            self.inner.description()
        );
        self.inner.close();
    }
}
