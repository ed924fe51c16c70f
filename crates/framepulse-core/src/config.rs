use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_FRAME_COUNT, DEFAULT_MIN_MESSAGE_INTERVAL_SECS, DEFAULT_PARTITION_COUNT,
    DEFAULT_SIG_SHAPE, DEFAULT_THRESHOLD_PART_TIME_SECS, DEFAULT_TILE_FRAMES,
};
use crate::error::{ProgressError, Result};
use crate::unit::Roi;

/// Settings for the worker-side rate limiter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// When disabled, emitters are no-ops and no aggregator is created.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Units expected to finish faster than this send no chunk messages.
    #[serde(default = "default_threshold_part_time")]
    pub threshold_part_time_secs: f64,
    #[serde(default = "default_min_message_interval")]
    pub min_message_interval_secs: f64,
}

fn default_true() -> bool {
    true
}
fn default_threshold_part_time() -> f64 {
    DEFAULT_THRESHOLD_PART_TIME_SECS
}
fn default_min_message_interval() -> f64 {
    DEFAULT_MIN_MESSAGE_INTERVAL_SECS
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_part_time_secs: DEFAULT_THRESHOLD_PART_TIME_SECS,
            min_message_interval_secs: DEFAULT_MIN_MESSAGE_INTERVAL_SECS,
        }
    }
}

impl ProgressConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.threshold_part_time_secs.is_finite() && self.threshold_part_time_secs > 0.0) {
            return Err(ProgressError::Config(format!(
                "threshold_part_time_secs must be positive, got {}",
                self.threshold_part_time_secs
            )));
        }
        if !(self.min_message_interval_secs.is_finite() && self.min_message_interval_secs >= 0.0) {
            return Err(ProgressError::Config(format!(
                "min_message_interval_secs must be non-negative, got {}",
                self.min_message_interval_secs
            )));
        }
        Ok(())
    }
}

/// Shape and partitioning of a synthetic in-memory dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_frames")]
    pub frames: usize,
    #[serde(default = "default_sig_height")]
    pub sig_height: usize,
    #[serde(default = "default_sig_width")]
    pub sig_width: usize,
    #[serde(default = "default_partitions")]
    pub partitions: usize,
    #[serde(default = "default_tile_frames")]
    pub tile_frames: usize,
    /// Fraction of frames selected by the region of interest (0.0..=1.0).
    #[serde(default = "default_roi_fraction")]
    pub roi_fraction: f32,
}

fn default_frames() -> usize {
    DEFAULT_FRAME_COUNT
}
fn default_sig_height() -> usize {
    DEFAULT_SIG_SHAPE.0
}
fn default_sig_width() -> usize {
    DEFAULT_SIG_SHAPE.1
}
fn default_partitions() -> usize {
    DEFAULT_PARTITION_COUNT
}
fn default_tile_frames() -> usize {
    DEFAULT_TILE_FRAMES
}
fn default_roi_fraction() -> f32 {
    1.0
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            frames: DEFAULT_FRAME_COUNT,
            sig_height: DEFAULT_SIG_SHAPE.0,
            sig_width: DEFAULT_SIG_SHAPE.1,
            partitions: DEFAULT_PARTITION_COUNT,
            tile_frames: DEFAULT_TILE_FRAMES,
            roi_fraction: 1.0,
        }
    }
}

impl DatasetConfig {
    /// Region of interest implied by `roi_fraction`; `None` selects everything.
    pub fn roi(&self) -> Option<Roi> {
        (self.roi_fraction < 1.0).then(|| Roi::from_fraction(self.frames, self.roi_fraction))
    }

    pub fn validate(&self) -> Result<()> {
        if self.frames == 0 || self.sig_height == 0 || self.sig_width == 0 {
            return Err(ProgressError::Config(format!(
                "dataset shape must be non-empty, got {}x({}x{})",
                self.frames, self.sig_height, self.sig_width
            )));
        }
        if self.partitions == 0 || self.tile_frames == 0 {
            return Err(ProgressError::Config(
                "partitions and tile_frames must be at least 1".into(),
            ));
        }
        if !(self.roi_fraction > 0.0 && self.roi_fraction <= 1.0) {
            return Err(ProgressError::Config(format!(
                "roi_fraction must be in (0, 1], got {}",
                self.roi_fraction
            )));
        }
        Ok(())
    }
}

/// A complete synthetic job: dataset, progress settings and simulated load.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    /// Artificial delay after each tile, to make progress visible.
    #[serde(default)]
    pub tile_delay_ms: u64,
}

impl JobConfig {
    pub fn validate(&self) -> Result<()> {
        self.dataset.validate()?;
        self.progress.validate()
    }
}
