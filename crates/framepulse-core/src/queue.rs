use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use thiserror::Error;
use tracing::trace;

use crate::message::Message;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue is empty")]
    Empty,
    #[error("queue is disconnected")]
    Disconnected,
}

/// Worker-side handle for sending progress messages to the aggregating side.
///
/// Implementations must not block and must be safe to call from many
/// threads at once.
pub trait SignalChannel: Send + Sync {
    fn signal(&self, message: Message);
}

/// Unbounded multi-producer FIFO carrying progress messages.
///
/// Any number of threads may `put`; the dispatcher is the single consumer.
pub struct WorkerQueue {
    tx: Sender<Message>,
    rx: Receiver<Message>,
    in_flight: AtomicUsize,
}

impl WorkerQueue {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn put(&self, message: Message) {
        // The queue owns its receiver, so the channel cannot disconnect while
        // `self` is alive.
        if self.tx.send(message).is_err() {
            trace!("dropping message on disconnected queue");
        }
    }

    /// Receive one message. With `block == false` an empty queue yields
    /// [`QueueError::Empty`] instead of waiting.
    ///
    /// The returned guard keeps the receive slot claimed until it is dropped.
    pub fn get(&self, block: bool) -> Result<Received<'_>, QueueError> {
        let message = if block {
            self.rx.recv().map_err(|_| QueueError::Disconnected)?
        } else {
            self.rx.try_recv().map_err(|e| match e {
                TryRecvError::Empty => QueueError::Empty,
                TryRecvError::Disconnected => QueueError::Disconnected,
            })?
        };
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        Ok(Received {
            message,
            queue: self,
        })
    }

    /// Messages waiting to be received.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Received messages whose guard has not been dropped yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Default for WorkerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalChannel for WorkerQueue {
    fn signal(&self, message: Message) {
        self.put(message);
    }
}

/// A received message. Releases its receive slot on drop, including when
/// processing the message returns early or unwinds.
pub struct Received<'a> {
    message: Message,
    queue: &'a WorkerQueue,
}

impl Received<'_> {
    pub fn message(&self) -> &Message {
        &self.message
    }
}

impl Drop for Received<'_> {
    fn drop(&mut self) {
        self.queue.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
