//! Single-consumer dispatch of progress messages.
//!
//! The [`Dispatcher`] owns one monitoring thread that receives messages from a
//! [`WorkerQueue`] and runs the callbacks subscribed to each message's topic,
//! in the order the messages were received. Callbacks for different messages
//! never run concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, error, trace, warn};

use crate::consts::MONITOR_THREAD_NAME;
use crate::error::{ProgressError, Result};
use crate::message::{Message, Topic};
use crate::queue::{QueueError, WorkerQueue};

/// Subscriber callback. Runs on the monitoring thread; should be cheap.
pub type Callback = Arc<dyn Fn(&Message) -> Result<()> + Send + Sync>;

type Subscriptions = HashMap<Topic, Vec<Callback>>;

pub struct Dispatcher {
    queue: Arc<WorkerQueue>,
    subscriptions: Subscriptions,
    monitor: Option<JoinHandle<Result<()>>>,
}

impl Dispatcher {
    pub fn new(queue: Arc<WorkerQueue>) -> Self {
        Self {
            queue,
            subscriptions: HashMap::new(),
            monitor: None,
        }
    }

    /// Register `callback` for `topic`. Callbacks run in registration order.
    ///
    /// Subscriptions are captured by [`start`](Self::start); a callback added
    /// while running takes effect on the next start.
    pub fn subscribe<F>(&mut self, topic: Topic, callback: F)
    where
        F: Fn(&Message) -> Result<()> + Send + Sync + 'static,
    {
        if self.is_running() {
            warn!(%topic, "subscription added while running; applies after restart");
        }
        self.subscriptions
            .entry(topic)
            .or_default()
            .push(Arc::new(callback));
    }

    pub fn is_running(&self) -> bool {
        self.monitor.is_some()
    }

    /// Launch the monitoring thread.
    pub fn start(&mut self) -> Result<()> {
        if self.monitor.is_some() {
            return Err(ProgressError::AlreadyRunning);
        }
        let queue = Arc::clone(&self.queue);
        let subscriptions = self.subscriptions.clone();
        let handle = std::thread::Builder::new()
            .name(MONITOR_THREAD_NAME.into())
            .spawn(move || monitor_queue(&queue, &subscriptions))?;
        self.monitor = Some(handle);
        debug!("dispatcher started");
        Ok(())
    }

    /// Stop the monitoring thread and discard anything left in the queue.
    ///
    /// Returns the monitoring loop's outcome: a callback error that ended the
    /// loop early is reported here. Messages put after the drain finishes
    /// stay queued for the next run.
    pub fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.monitor.take() else {
            return Ok(());
        };
        self.queue.put(Message::Stop);
        let outcome = handle.join().unwrap_or(Err(ProgressError::MonitorPanicked));

        let mut discarded = 0usize;
        while let Ok(received) = self.queue.get(false) {
            trace!(message = received.message().name(), "discarding residual message");
            discarded += 1;
        }
        debug!(discarded, "dispatcher stopped");
        outcome
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!(error = %e, "dispatcher stopped with error");
        }
    }
}

/// Receive and dispatch messages until [`Message::Stop`] arrives.
fn monitor_queue(queue: &WorkerQueue, subscriptions: &Subscriptions) -> Result<()> {
    loop {
        let received = queue.get(true).map_err(|e| match e {
            QueueError::Empty | QueueError::Disconnected => ProgressError::Disconnected,
        })?;
        let message = received.message();
        let Some(topic) = message.topic() else {
            return Ok(());
        };
        let Some(callbacks) = subscriptions.get(&topic) else {
            trace!(%topic, "no subscribers");
            continue;
        };
        for callback in callbacks {
            if let Err(e) = callback(message) {
                error!(%topic, error = %e, "callback failed, stopping monitor");
                return Err(e);
            }
        }
    }
}
