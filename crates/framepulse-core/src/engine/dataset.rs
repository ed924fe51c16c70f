use std::ops::Range;
use std::sync::Arc;

use ndarray::{Array2, Array3, Axis};

use crate::config::DatasetConfig;
use crate::error::{ProgressError, Result};
use crate::queue::SignalChannel;
use crate::unit::{Chunk, Roi, UnitId, WorkUnit};

/// A stack of frames held in memory, shape = (frames, height, width).
#[derive(Clone, Debug)]
pub struct MemoryDataset {
    data: Arc<Array3<f32>>,
    num_partitions: usize,
    tile_frames: usize,
}

impl MemoryDataset {
    pub fn new(data: Array3<f32>, num_partitions: usize, tile_frames: usize) -> Result<Self> {
        let (frames, h, w) = data.dim();
        if frames == 0 || h == 0 || w == 0 {
            return Err(ProgressError::Config(format!(
                "dataset shape must be non-empty, got {frames}x({h}x{w})"
            )));
        }
        if num_partitions == 0 || tile_frames == 0 {
            return Err(ProgressError::Config(
                "partitions and tile_frames must be at least 1".into(),
            ));
        }
        Ok(Self {
            data: Arc::new(data),
            num_partitions,
            tile_frames,
        })
    }

    /// Deterministic test pattern with the configured shape.
    pub fn synthetic(config: &DatasetConfig) -> Result<Self> {
        config.validate()?;
        let data = Array3::from_shape_fn(
            (config.frames, config.sig_height, config.sig_width),
            |(f, y, x)| ((f + 3 * y + 7 * x) % 17) as f32 / 16.0,
        );
        Self::new(data, config.partitions, config.tile_frames)
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn frame_count(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn sig_shape(&self) -> (usize, usize) {
        let (_, h, w) = self.data.dim();
        (h, w)
    }

    pub fn sig_size(&self) -> usize {
        let (h, w) = self.sig_shape();
        h * w
    }

    /// Split the frames into contiguous partitions of near-equal length.
    /// Never yields an empty partition.
    pub fn partitions(&self, channel: Option<Arc<dyn SignalChannel>>) -> Vec<Partition> {
        let n = self.frame_count();
        let parts = self.num_partitions.min(n);
        let base = n / parts;
        let extra = n % parts;

        let mut start = 0;
        (0..parts)
            .map(|i| {
                let len = base + usize::from(i < extra);
                let frames = start..start + len;
                start += len;
                Partition {
                    ident: UnitId(i as u64),
                    frames,
                    data: Arc::clone(&self.data),
                    tile_frames: self.tile_frames,
                    channel: channel.clone(),
                }
            })
            .collect()
    }
}

/// A contiguous range of frames processed as one work unit.
pub struct Partition {
    ident: UnitId,
    frames: Range<usize>,
    data: Arc<Array3<f32>>,
    tile_frames: usize,
    channel: Option<Arc<dyn SignalChannel>>,
}

impl Partition {
    pub fn frames(&self) -> Range<usize> {
        self.frames.clone()
    }

    pub fn sig_shape(&self) -> (usize, usize) {
        let (_, h, w) = self.data.dim();
        (h, w)
    }

    /// Tiles of up to `tile_frames` frames, skipping frames outside `roi`.
    pub fn tiles<'a>(&'a self, roi: Option<&'a Roi>) -> impl Iterator<Item = Tile<'a>> + 'a {
        let selected: Vec<usize> = self
            .frames
            .clone()
            .filter(|&i| roi.map_or(true, |r| r.contains(i)))
            .collect();
        let chunks: Vec<Vec<usize>> = selected
            .chunks(self.tile_frames)
            .map(<[usize]>::to_vec)
            .collect();
        chunks.into_iter().map(move |indices| Tile {
            indices,
            data: &*self.data,
        })
    }
}

impl WorkUnit for Partition {
    fn ident(&self) -> UnitId {
        self.ident
    }

    fn frame_count(&self, roi: Option<&Roi>) -> u64 {
        match roi {
            Some(r) => r.count_in(self.frames.clone()) as u64,
            None => self.frames.len() as u64,
        }
    }

    fn sig_size(&self) -> u64 {
        let (_, h, w) = self.data.dim();
        (h * w) as u64
    }

    fn signal_channel(&self) -> Option<Arc<dyn SignalChannel>> {
        self.channel.clone()
    }
}

/// A stack of frames from one partition.
pub struct Tile<'a> {
    indices: Vec<usize>,
    data: &'a Array3<f32>,
}

impl Tile<'_> {
    pub fn frame_indices(&self) -> &[usize] {
        &self.indices
    }

    /// Add every frame of this tile to `acc`.
    pub fn sum_into(&self, acc: &mut Array2<f32>) {
        for &i in &self.indices {
            *acc += &self.data.index_axis(Axis(0), i);
        }
    }
}

impl Chunk for Tile<'_> {
    fn size(&self) -> u64 {
        let (_, h, w) = self.data.dim();
        (self.indices.len() * h * w) as u64
    }
}
