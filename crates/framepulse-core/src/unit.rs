use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use ndarray::Array1;

use crate::queue::SignalChannel;

/// Identity of one work unit, stable for the unit's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

/// Boolean region-of-interest mask over all frames of a dataset.
#[derive(Clone, Debug)]
pub struct Roi {
    mask: Array1<bool>,
}

impl Roi {
    pub fn new(mask: Array1<bool>) -> Self {
        Self { mask }
    }

    /// Select every `step`-th frame out of `len`.
    pub fn every_nth(len: usize, step: usize) -> Self {
        let step = step.max(1);
        Self::new(Array1::from_shape_fn(len, |i| i % step == 0))
    }

    /// Select an evenly spread `fraction` of `len` frames.
    pub fn from_fraction(len: usize, fraction: f32) -> Self {
        let fraction = fraction.clamp(0.0, 1.0);
        Self::new(Array1::from_shape_fn(len, |i| {
            ((i + 1) as f32 * fraction).floor() > (i as f32 * fraction).floor()
        }))
    }

    pub fn len(&self) -> usize {
        self.mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// Whether frame `index` is selected. Frames beyond the mask are not.
    pub fn contains(&self, index: usize) -> bool {
        self.mask.get(index).copied().unwrap_or(false)
    }

    /// Number of selected frames within `frames`.
    pub fn count_in(&self, frames: Range<usize>) -> usize {
        frames.filter(|&i| self.contains(i)).count()
    }

    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&v| v).count()
    }
}

/// A planned unit of work as seen by the progress subsystem.
pub trait WorkUnit {
    fn ident(&self) -> UnitId;

    /// Number of frames this unit will process, accounting for `roi`.
    fn frame_count(&self, roi: Option<&Roi>) -> u64;

    /// Number of raw elements in one frame.
    fn sig_size(&self) -> u64;

    /// Channel to the aggregating side. `None` outside distributed execution.
    fn signal_channel(&self) -> Option<Arc<dyn SignalChannel>> {
        None
    }
}

/// A slice of a work unit processed in one step.
pub trait Chunk {
    /// Size of the chunk in raw elements.
    fn size(&self) -> u64;
}
