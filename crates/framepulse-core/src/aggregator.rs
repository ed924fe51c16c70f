//! Aggregation of per-unit progress into one overall indicator.
//!
//! Chunk messages are converted from raw elements into (fractional) frames
//! using the signal size shared by all units. Only whole frames are pushed to
//! the indicator; the fractional remainder accumulates in the per-unit
//! counter. When a unit completes, whatever its chunk history left
//! unaccounted is pushed in one step, so the indicator converges to the
//! exact total even if chunk messages were never sent.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::consts::ITEMS_LABEL;
use crate::dispatcher::Dispatcher;
use crate::error::{ProgressError, Result};
use crate::indicator::Indicator;
use crate::message::{Message, Topic};
use crate::unit::{Roi, UnitId, WorkUnit};

/// Format the indicator description from the unit tallies.
pub fn describe(num_complete: usize, num_in_progress: usize, num_total: usize) -> String {
    if num_in_progress > 0 {
        format!("Units {num_complete}({num_in_progress})/{num_total}, {ITEMS_LABEL}")
    } else {
        format!("Units {num_complete}/{num_total}, {ITEMS_LABEL}")
    }
}

/// Point-in-time copy of the aggregated state.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressSnapshot {
    pub num_total: usize,
    pub num_complete: usize,
    pub num_in_progress: usize,
    pub position: u64,
    pub total: u64,
    pub description: String,
}

struct Tally {
    unit_max: HashMap<UnitId, u64>,
    /// Frames processed per unit. Fractional because chunks need not hold
    /// whole frames.
    completed: HashMap<UnitId, f64>,
    finished: HashSet<UnitId>,
    sig_size: f64,
    num_total: usize,
    num_complete: usize,
    num_in_progress: usize,
    indicator: Box<dyn Indicator>,
    closed: bool,
}

impl Tally {
    fn description(&self) -> String {
        describe(self.num_complete, self.num_in_progress, self.num_total)
    }

    fn refresh_description(&mut self) {
        let description = self.description();
        self.indicator.set_description(&description);
    }

    /// Advance the indicator, clipped so it never passes its total.
    fn update_indicator(&mut self, n: u64) {
        let max_update = self
            .indicator
            .total()
            .saturating_sub(self.indicator.position());
        if max_update > 0 && n > 0 {
            self.indicator.advance(n.min(max_update));
        }
    }

    fn complete_unit(&mut self, unit: UnitId) {
        let Some(&max) = self.unit_max.get(&unit) else {
            warn!(%unit, "completion for unknown unit");
            return;
        };
        if !self.finished.insert(unit) {
            trace!(%unit, "unit already complete");
            return;
        }
        let done = self.completed.get(&unit).copied().unwrap_or(0.0);
        let remain = max.saturating_sub(done.floor() as u64);
        if remain > 0 {
            self.update_indicator(remain);
        }
        self.completed.insert(unit, max as f64);
        self.num_complete += 1;
        self.num_in_progress = self.num_in_progress.saturating_sub(1);
        self.refresh_description();
        debug!(%unit, remain, "unit complete");
    }
}

/// Owner of all progress state for one run.
///
/// State sits behind a mutex: handlers run on the dispatcher's monitoring
/// thread while [`finalize_unit`](Self::finalize_unit) is called from the
/// result-collection side.
pub struct ProgressAggregator {
    state: Mutex<Tally>,
}

impl ProgressAggregator {
    /// Build the aggregator for the units planned for this run.
    ///
    /// `make_indicator` receives the grand total in frames and the initial
    /// description.
    pub fn new<U, F>(units: &[U], roi: Option<&Roi>, make_indicator: F) -> Result<Self>
    where
        U: WorkUnit,
        F: FnOnce(u64, &str) -> Box<dyn Indicator>,
    {
        let first = units.first().ok_or(ProgressError::NoUnits)?;
        let sig_size = first.sig_size().max(1) as f64;

        let unit_max: HashMap<UnitId, u64> = units
            .iter()
            .map(|u| (u.ident(), u.frame_count(roi)))
            .collect();
        let completed = unit_max.keys().map(|&k| (k, 0.0)).collect();
        let total_frames: u64 = unit_max.values().sum();
        let num_total = unit_max.len();

        let indicator = make_indicator(total_frames, &describe(0, 0, num_total));
        debug!(units = num_total, total_frames, "progress aggregator created");

        Ok(Self {
            state: Mutex::new(Tally {
                unit_max,
                completed,
                finished: HashSet::new(),
                sig_size,
                num_total,
                num_complete: 0,
                num_in_progress: 0,
                indicator,
                closed: false,
            }),
        })
    }

    /// Subscribe the handlers to the dispatcher's topics.
    pub fn connect(self: &Arc<Self>, dispatcher: &mut Dispatcher) {
        let this = Arc::clone(self);
        dispatcher.subscribe(Topic::UnitStart, move |m| this.handle_start(m));
        let this = Arc::clone(self);
        dispatcher.subscribe(Topic::UnitComplete, move |m| this.handle_end(m));
        let this = Arc::clone(self);
        dispatcher.subscribe(Topic::ChunkComplete, move |m| this.handle_chunk(m));
    }

    pub fn handle_start(&self, message: &Message) -> Result<()> {
        let &Message::UnitStart { unit } = message else {
            return Err(unexpected(Topic::UnitStart, message));
        };
        let mut state = self.state.lock();
        if state.finished.contains(&unit) {
            // Start dispatched after the unit was already finalised directly.
            trace!(%unit, "discarding start for complete unit");
            return Ok(());
        }
        state.num_in_progress += 1;
        state.refresh_description();
        Ok(())
    }

    pub fn handle_chunk(&self, message: &Message) -> Result<()> {
        let &Message::ChunkComplete { unit, elements } = message else {
            return Err(unexpected(Topic::ChunkComplete, message));
        };
        let mut state = self.state.lock();
        let Some(&max) = state.unit_max.get(&unit) else {
            warn!(%unit, "chunk for unknown unit");
            return Ok(());
        };
        let done = state.completed.get(&unit).copied().unwrap_or(0.0);
        if done >= max as f64 {
            trace!(%unit, elements, "discarding chunk for complete unit");
            return Ok(());
        }
        let frames = elements as f64 / state.sig_size;
        let total = done + frames;
        // Whole frames crossed by this chunk, capped at the unit's maximum.
        let whole = |v: f64| v.min(max as f64).floor() as u64;
        state.update_indicator(whole(total) - whole(done));
        state.completed.insert(unit, total);
        Ok(())
    }

    pub fn handle_end(&self, message: &Message) -> Result<()> {
        let &Message::UnitComplete { unit } = message else {
            return Err(unexpected(Topic::UnitComplete, message));
        };
        self.state.lock().complete_unit(unit);
        Ok(())
    }

    /// Mark `unit` complete from outside the message flow, e.g. when its
    /// result has been collected. Unknown units are ignored.
    pub fn finalize_unit(&self, unit: UnitId) {
        let mut state = self.state.lock();
        if state.unit_max.contains_key(&unit) {
            state.complete_unit(unit);
        }
    }

    /// Final description refresh; closes the indicator.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.refresh_description();
        state.indicator.close();
        state.closed = true;
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let state = self.state.lock();
        ProgressSnapshot {
            num_total: state.num_total,
            num_complete: state.num_complete,
            num_in_progress: state.num_in_progress,
            position: state.indicator.position(),
            total: state.indicator.total(),
            description: state.description(),
        }
    }

    /// Frames accounted for `unit` so far.
    pub fn completed(&self, unit: UnitId) -> Option<f64> {
        self.state.lock().completed.get(&unit).copied()
    }
}

fn unexpected(expected: Topic, message: &Message) -> ProgressError {
    ProgressError::UnexpectedTopic {
        expected,
        found: message.name(),
    }
}
