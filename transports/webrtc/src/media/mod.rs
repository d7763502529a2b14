//! Received media tracks and their presentation
//!
//! - [`tracks`]: remote WebRTC tracks wrapped as [`MediaTrack`]s
//! - [`sink`]: the presentation sink seam and a headless implementation
//! - [`track_sink`]: the adapter that is the only path tracks take into or out of a sink

pub mod sink;
pub mod track_sink;
pub mod tracks;

use std::fmt;

pub use sink::{FrameCounters, HeadlessSink, PresentationSink, Resolution, SinkDimensions};
pub use track_sink::TrackSinkAdapter;
pub use tracks::RemoteMediaTrack;

/// Kind of a media track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Audio => write!(f, "audio"),
        }
    }
}

/// One received media elementary stream
pub trait MediaTrack: Send + Sync + fmt::Debug {
    /// Identity of the track; two tracks with the same id are the same track
    fn id(&self) -> String;

    fn kind(&self) -> TrackKind;

    /// Stop the track; it delivers no more media afterwards
    fn stop(&self);

    fn is_stopped(&self) -> bool;

    /// Number of complete frames delivered so far, if the track counts them
    fn frame_count(&self) -> Option<u64> {
        None
    }
}
