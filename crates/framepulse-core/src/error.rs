use thiserror::Error;

use crate::message::Topic;

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("Cannot display progress for an empty set of work units")]
    NoUnits,

    #[error("Dispatcher is already running")]
    AlreadyRunning,

    #[error("Unrecognized topic: expected {expected}, got {found}")]
    UnexpectedTopic { expected: Topic, found: &'static str },

    #[error("Message queue disconnected")]
    Disconnected,

    #[error("Monitor thread panicked")]
    MonitorPanicked,

    #[error("Failed to spawn monitor thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ProgressError>;
