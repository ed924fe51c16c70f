use std::fmt;

use crate::unit::UnitId;

/// Subscribable message kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    UnitStart,
    ChunkComplete,
    UnitComplete,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnitStart => "unit_start",
            Self::ChunkComplete => "chunk_complete",
            Self::UnitComplete => "unit_complete",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message travelling from the emitters to the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    UnitStart { unit: UnitId },
    /// `elements` counts raw elements, before conversion to frames.
    ChunkComplete { unit: UnitId, elements: u64 },
    UnitComplete { unit: UnitId },
    /// Terminates the monitoring loop. Never forwarded to subscribers.
    Stop,
}

impl Message {
    /// The subscription topic, or `None` for the control message.
    pub fn topic(&self) -> Option<Topic> {
        match self {
            Self::UnitStart { .. } => Some(Topic::UnitStart),
            Self::ChunkComplete { .. } => Some(Topic::ChunkComplete),
            Self::UnitComplete { .. } => Some(Topic::UnitComplete),
            Self::Stop => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.topic().map_or("STOP", |t| t.as_str())
    }

    pub fn unit(&self) -> Option<UnitId> {
        match self {
            Self::UnitStart { unit }
            | Self::ChunkComplete { unit, .. }
            | Self::UnitComplete { unit } => Some(*unit),
            Self::Stop => None,
        }
    }
}
