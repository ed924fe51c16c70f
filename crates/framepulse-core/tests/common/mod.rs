#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use framepulse_core::clock::ManualClock;
use framepulse_core::indicator::{HeadlessIndicator, Indicator};
use framepulse_core::message::Message;
use framepulse_core::queue::SignalChannel;
use framepulse_core::unit::{Roi, UnitId, WorkUnit};

/// Work unit with fixed frame count and signal size.
pub struct FakeUnit {
    pub id: UnitId,
    pub frames: u64,
    pub sig_size: u64,
    pub channel: Option<Arc<dyn SignalChannel>>,
}

impl FakeUnit {
    pub fn new(id: u64, frames: u64, sig_size: u64) -> Self {
        Self {
            id: UnitId(id),
            frames,
            sig_size,
            channel: None,
        }
    }

    pub fn with_channel(mut self, channel: Arc<dyn SignalChannel>) -> Self {
        self.channel = Some(channel);
        self
    }
}

impl WorkUnit for FakeUnit {
    fn ident(&self) -> UnitId {
        self.id
    }

    fn frame_count(&self, roi: Option<&Roi>) -> u64 {
        match roi {
            Some(r) => r.count_in(0..self.frames as usize) as u64,
            None => self.frames,
        }
    }

    fn sig_size(&self) -> u64 {
        self.sig_size
    }

    fn signal_channel(&self) -> Option<Arc<dyn SignalChannel>> {
        self.channel.clone()
    }
}

/// Signal channel that keeps every message it receives.
#[derive(Default)]
pub struct RecordingChannel {
    messages: Mutex<Vec<Message>>,
}

impl RecordingChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

impl SignalChannel for RecordingChannel {
    fn signal(&self, message: Message) {
        self.messages.lock().unwrap().push(message);
    }
}

/// Indicator whose state stays observable after it is handed to an aggregator.
#[derive(Clone, Default)]
pub struct SharedIndicator {
    inner: Arc<Mutex<HeadlessIndicator>>,
}

impl SharedIndicator {
    /// Replace the wrapped indicator, keeping every clone connected.
    pub fn reset(&self, total: u64, description: &str) {
        *self.inner.lock().unwrap() = HeadlessIndicator::new(total, description);
    }

    pub fn description(&self) -> String {
        self.inner.lock().unwrap().description().to_string()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().is_closed()
    }
}

impl Indicator for SharedIndicator {
    fn set_description(&mut self, description: &str) {
        self.inner.lock().unwrap().set_description(description);
    }

    fn advance(&mut self, n: u64) {
        self.inner.lock().unwrap().advance(n);
    }

    fn position(&self) -> u64 {
        self.inner.lock().unwrap().position()
    }

    fn total(&self) -> u64 {
        self.inner.lock().unwrap().total()
    }

    fn close(&mut self) {
        self.inner.lock().unwrap().close();
    }
}

/// Indicator that neither clamps nor drops increments; it records every
/// `advance(n)` so the caller's own bounds can be checked.
#[derive(Clone, Default)]
pub struct RecordingIndicator {
    total: u64,
    advances: Arc<Mutex<Vec<u64>>>,
}

impl RecordingIndicator {
    /// A handle with its own `total` that records into the same log.
    pub fn sized(&self, total: u64) -> Self {
        Self {
            total,
            advances: Arc::clone(&self.advances),
        }
    }

    pub fn advances(&self) -> Vec<u64> {
        self.advances.lock().unwrap().clone()
    }

    pub fn advanced(&self) -> u64 {
        self.advances.lock().unwrap().iter().sum()
    }
}

impl Indicator for RecordingIndicator {
    fn set_description(&mut self, _description: &str) {}

    fn advance(&mut self, n: u64) {
        self.advances.lock().unwrap().push(n);
    }

    fn position(&self) -> u64 {
        self.advanced()
    }

    fn total(&self) -> u64 {
        self.total
    }

    fn close(&mut self) {}
}

pub fn headless(total: u64, description: &str) -> Box<dyn Indicator> {
    Box::new(HeadlessIndicator::new(total, description))
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new())
}

pub fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}
