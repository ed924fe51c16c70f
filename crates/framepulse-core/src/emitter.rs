//! Worker-side progress signalling.
//!
//! Each work unit owns one [`ProgressEmitter`]. The tracking variant measures
//! the unit's throughput and only sends chunk messages when the unit is slow
//! enough for intermediate progress to be worth the message traffic.

use std::sync::Arc;
use std::time::Duration;

use crate::clock::{secs, Clock, SystemClock};
use crate::config::ProgressConfig;
use crate::message::Message;
use crate::queue::SignalChannel;
use crate::unit::{Chunk, Roi, UnitId, WorkUnit};

/// Progress signals a work unit sends while it is processed.
///
/// None of these methods fail; the only observable effect is whether a
/// message was put on the signal channel.
pub trait ProgressEmitter: Send {
    /// The unit has begun processing.
    fn signal_start(&mut self);

    /// `elements` more raw elements have been processed.
    fn signal_chunk_complete(&mut self, elements: u64);

    /// The unit has finished. Optional: the aggregator reconciles
    /// completion on its own when this never arrives.
    fn signal_complete(&mut self);

    fn signal_chunk(&mut self, chunk: &dyn Chunk) {
        self.signal_chunk_complete(chunk.size());
    }
}

/// Emitter used when progress reporting is disabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpEmitter;

impl ProgressEmitter for NoOpEmitter {
    #[inline]
    fn signal_start(&mut self) {}

    #[inline]
    fn signal_chunk_complete(&mut self, _elements: u64) {}

    #[inline]
    fn signal_complete(&mut self) {}
}

/// Rate-limited emitter for one work unit.
pub struct TrackingEmitter {
    unit: UnitId,
    channel: Option<Arc<dyn SignalChannel>>,
    clock: Arc<dyn Clock>,
    pending_elements: u64,
    last_sent: Option<Duration>,
    min_message_interval: Duration,
    /// Elements per second a unit must sustain to finish within the
    /// threshold time.
    threshold_rate: f64,
}

impl TrackingEmitter {
    pub fn new<U: WorkUnit + ?Sized>(unit: &U, roi: Option<&Roi>, config: &ProgressConfig) -> Self {
        Self::with_clock(unit, roi, config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock<U: WorkUnit + ?Sized>(
        unit: &U,
        roi: Option<&Roi>,
        config: &ProgressConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let expected_elements = unit.frame_count(roi) as f64 * unit.sig_size() as f64;
        Self {
            unit: unit.ident(),
            channel: unit.signal_channel(),
            clock,
            pending_elements: 0,
            last_sent: None,
            min_message_interval: secs(config.min_message_interval_secs),
            threshold_rate: expected_elements / config.threshold_part_time_secs,
        }
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn threshold_rate(&self) -> f64 {
        self.threshold_rate
    }

    pub fn pending_elements(&self) -> u64 {
        self.pending_elements
    }

    /// Record `elements` newly processed elements and decide whether to send
    /// a chunk message. Returns the element count to send, if any.
    ///
    /// The first call never sends: it may carry warm-up cost that would skew
    /// the rate estimate. Its elements stay pending for the next decision.
    ///
    /// `last_sent` is set once and never moved, so the average rate after
    /// the first send is measured over the unit's whole remaining lifetime.
    pub fn should_send(&mut self, elements: u64) -> Option<u64> {
        let now = self.clock.now();
        self.pending_elements += elements;

        let Some(last_sent) = self.last_sent else {
            self.last_sent = Some(now);
            return None;
        };

        let elapsed = now.saturating_sub(last_sent);
        let avg_rate = self.pending_elements as f64 / elapsed.as_secs_f64();

        let is_slow = avg_rate < self.threshold_rate;
        let not_rate_limited = elapsed > self.min_message_interval;
        if is_slow && not_rate_limited {
            return Some(std::mem::take(&mut self.pending_elements));
        }
        None
    }
}

impl ProgressEmitter for TrackingEmitter {
    fn signal_start(&mut self) {
        if let Some(channel) = &self.channel {
            channel.signal(Message::UnitStart { unit: self.unit });
        }
    }

    fn signal_chunk_complete(&mut self, elements: u64) {
        if self.channel.is_none() {
            return;
        }
        if let Some(elements) = self.should_send(elements) {
            if let Some(channel) = &self.channel {
                channel.signal(Message::ChunkComplete {
                    unit: self.unit,
                    elements,
                });
            }
        }
    }

    fn signal_complete(&mut self) {
        if let Some(channel) = &self.channel {
            channel.signal(Message::UnitComplete { unit: self.unit });
        }
    }
}

/// Pick the emitter implementation for a unit once, up front.
pub fn make_emitter<U: WorkUnit + ?Sized>(
    unit: &U,
    roi: Option<&Roi>,
    config: &ProgressConfig,
) -> Box<dyn ProgressEmitter> {
    if config.enabled {
        Box::new(TrackingEmitter::new(unit, roi, config))
    } else {
        Box::new(NoOpEmitter)
    }
}
