/// Total unit processing time below which a unit is considered fast enough
/// to skip intermediate progress messages. Default: 4 seconds.
pub const DEFAULT_THRESHOLD_PART_TIME_SECS: f64 = 4.0;

/// Minimum wall-clock time between two chunk messages of one unit.
pub const DEFAULT_MIN_MESSAGE_INTERVAL_SECS: f64 = 1.0;

/// Description suffix naming the unit of the indicator's counter.
pub const ITEMS_LABEL: &str = "Items";

/// `tracing` target of [`LogIndicator`](crate::indicator::LogIndicator) lines.
pub const PROGRESS_LOG_TARGET: &str = "framepulse::progress";

/// Name of the dispatcher's monitoring thread.
pub const MONITOR_THREAD_NAME: &str = "framepulse-monitor";

/// Default number of frames in a synthetic dataset.
pub const DEFAULT_FRAME_COUNT: usize = 256;

/// Default signal (frame) shape of a synthetic dataset.
pub const DEFAULT_SIG_SHAPE: (usize, usize) = (64, 64);

/// Default number of partitions a dataset is split into.
pub const DEFAULT_PARTITION_COUNT: usize = 8;

/// Default number of frames per tile.
pub const DEFAULT_TILE_FRAMES: usize = 4;
