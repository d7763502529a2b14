//! Caller-supplied session state

use serde::{Deserialize, Serialize};

/// Read-only view of the streamer's state
///
/// Supplied by the caller on every `ensure_stream`; the controller never
/// mutates it.
pub trait SessionState: Send + Sync {
    /// Whether the video source is delivering a signal
    fn source_online(&self) -> bool;
}

/// State broadcast by the streamer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamerState {
    #[serde(default)]
    pub source: SourceState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceState {
    #[serde(default)]
    pub online: bool,

    #[serde(default)]
    pub resolution: SourceResolution,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceResolution {
    pub width: u32,
    pub height: u32,
}

impl SessionState for StreamerState {
    fn source_online(&self) -> bool {
        self.source.online
    }
}

impl SessionState for bool {
    fn source_online(&self) -> bool {
        *self
    }
}
