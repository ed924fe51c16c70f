use std::sync::Arc;
use std::time::{Duration, Instant};

use ndarray::Array2;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::aggregator::{ProgressAggregator, ProgressSnapshot};
use crate::config::{JobConfig, ProgressConfig};
use crate::dispatcher::Dispatcher;
use crate::emitter::make_emitter;
use crate::error::Result;
use crate::indicator::Indicator;
use crate::queue::{SignalChannel, WorkerQueue};
use crate::unit::{Roi, UnitId, WorkUnit};

use super::dataset::{MemoryDataset, Partition};

/// Per-run settings that do not describe the dataset itself.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    pub progress: ProgressConfig,
    /// Sleep after each tile; simulates expensive per-tile work.
    pub tile_delay: Duration,
}

impl From<&JobConfig> for RunOptions {
    fn from(config: &JobConfig) -> Self {
        Self {
            progress: config.progress.clone(),
            tile_delay: Duration::from_millis(config.tile_delay_ms),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RunSummary {
    pub units: usize,
    pub frames: u64,
    pub elapsed: Duration,
    /// Final aggregator state; `None` when progress was disabled.
    pub progress: Option<ProgressSnapshot>,
}

#[derive(Clone, Debug)]
pub struct SumResult {
    /// Sum over all selected frames, shape = sig shape.
    pub intensity: Array2<f32>,
    pub summary: RunSummary,
}

/// Sum all frames selected by `roi`, one partition per rayon task.
///
/// With progress enabled, each partition drives a tracking emitter into a
/// shared queue and a dispatcher feeds the aggregator. Partition results are
/// collected on the calling thread, which also finalises each unit directly,
/// so the indicator reaches its total even when no chunk message was sent.
pub fn run_sum<F>(
    dataset: &MemoryDataset,
    roi: Option<&Roi>,
    options: &RunOptions,
    make_indicator: F,
) -> Result<SumResult>
where
    F: FnOnce(u64, &str) -> Box<dyn Indicator>,
{
    options.progress.validate()?;
    let started = Instant::now();

    let queue = options
        .progress
        .enabled
        .then(|| Arc::new(WorkerQueue::new()));
    let channel = queue
        .as_ref()
        .map(|q| Arc::clone(q) as Arc<dyn SignalChannel>);
    let partitions = dataset.partitions(channel);
    let frames: u64 = partitions.iter().map(|p| p.frame_count(roi)).sum();

    let aggregator = match &queue {
        Some(_) => Some(Arc::new(ProgressAggregator::new(
            &partitions,
            roi,
            make_indicator,
        )?)),
        None => None,
    };
    let mut dispatcher = match (&queue, &aggregator) {
        (Some(queue), Some(aggregator)) => {
            let mut dispatcher = Dispatcher::new(Arc::clone(queue));
            aggregator.connect(&mut dispatcher);
            dispatcher.start()?;
            Some(dispatcher)
        }
        _ => None,
    };

    info!(
        units = partitions.len(),
        frames,
        progress = options.progress.enabled,
        "running sum"
    );

    let (h, w) = dataset.sig_shape();
    let mut intensity = Array2::<f32>::zeros((h, w));
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<(UnitId, Array2<f32>)>();

    let partitions_ref = &partitions;
    std::thread::scope(|s| {
        s.spawn(move || {
            partitions_ref
                .par_iter()
                .for_each_with(result_tx, |tx, partition| {
                    let unit = partition.ident();
                    let partial = process_partition(partition, roi, options);
                    if tx.send((unit, partial)).is_err() {
                        warn!(%unit, "result collector gone, dropping partition result");
                    }
                });
        });

        for (unit, partial) in result_rx.iter() {
            intensity += &partial;
            if let Some(aggregator) = &aggregator {
                aggregator.finalize_unit(unit);
            }
            debug!(%unit, "partition result collected");
        }
    });

    let progress = finish_progress(dispatcher.take(), aggregator.as_deref())?;

    let summary = RunSummary {
        units: partitions.len(),
        frames,
        elapsed: started.elapsed(),
        progress,
    };
    info!(elapsed_ms = summary.elapsed.as_millis() as u64, "sum complete");
    Ok(SumResult { intensity, summary })
}

/// Stop the dispatcher and close the aggregator. The aggregator is closed
/// even when the dispatcher reports an error, so the indicator is always
/// finished.
fn finish_progress(
    dispatcher: Option<Dispatcher>,
    aggregator: Option<&ProgressAggregator>,
) -> Result<Option<ProgressSnapshot>> {
    let stopped = match dispatcher {
        Some(mut dispatcher) => dispatcher.stop(),
        None => Ok(()),
    };
    let progress = aggregator.map(|aggregator| {
        aggregator.close();
        aggregator.snapshot()
    });
    stopped.map(|()| progress)
}

fn process_partition(partition: &Partition, roi: Option<&Roi>, options: &RunOptions) -> Array2<f32> {
    let (h, w) = partition.sig_shape();
    let mut acc = Array2::<f32>::zeros((h, w));
    let mut emitter = make_emitter(partition, roi, &options.progress);

    emitter.signal_start();
    for tile in partition.tiles(roi) {
        tile.sum_into(&mut acc);
        if !options.tile_delay.is_zero() {
            std::thread::sleep(options.tile_delay);
        }
        emitter.signal_chunk(&tile);
    }
    acc
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::error::ProgressError;
    use crate::message::{Message, Topic};
    use ndarray::Array3;

    struct CloseFlag(Arc<AtomicBool>);

    impl Indicator for CloseFlag {
        fn set_description(&mut self, _description: &str) {}
        fn advance(&mut self, _n: u64) {}
        fn position(&self) -> u64 {
            0
        }
        fn total(&self) -> u64 {
            0
        }
        fn close(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_aggregator_closed_when_dispatcher_fails() {
        let dataset = MemoryDataset::new(Array3::zeros((4, 2, 2)), 2, 1).unwrap();
        let partitions = dataset.partitions(None);
        let closed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&closed);
        let aggregator = ProgressAggregator::new(&partitions, None, move |_, _| {
            Box::new(CloseFlag(flag)) as Box<dyn Indicator>
        })
        .unwrap();

        let queue = Arc::new(WorkerQueue::new());
        let mut dispatcher = Dispatcher::new(Arc::clone(&queue));
        dispatcher.subscribe(Topic::UnitStart, |_| Err(ProgressError::Disconnected));
        dispatcher.start().unwrap();
        queue.put(Message::UnitStart {
            unit: partitions[0].ident(),
        });

        let result = finish_progress(Some(dispatcher), Some(&aggregator));
        assert!(matches!(result, Err(ProgressError::Disconnected)));
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_finish_without_progress() {
        assert!(matches!(finish_progress(None, None), Ok(None)));
    }
}
