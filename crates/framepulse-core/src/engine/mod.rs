//! Producer side of a run: an in-memory dataset split into partitions and a
//! parallel executor that reports progress while it works.

mod dataset;
mod executor;

pub use dataset::{MemoryDataset, Partition, Tile};
pub use executor::{run_sum, RunOptions, RunSummary, SumResult};
