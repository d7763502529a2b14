//! Presentation sink seam

use super::{MediaTrack, TrackKind};
use parking_lot::Mutex;
use std::sync::Arc;

/// The tracks held by a sink container
pub type TrackSet = Vec<Arc<dyn MediaTrack>>;

/// Frame counters exposed by a sink, when the platform provides them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCounters {
    /// Total frames decoded
    pub decoded: Option<u64>,
    /// Total frames painted
    pub painted: Option<u64>,
}

impl FrameCounters {
    /// The counter to sample: decoded if present, else painted
    pub fn frames(&self) -> Option<u64> {
        self.decoded.or(self.painted)
    }
}

/// Native (decoded) and displayed sizes of a sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkDimensions {
    /// Unknown before the first frame
    pub native: Option<(u32, u32)>,
    pub view: (u32, u32),
}

/// Presented resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolution {
    pub real_width: u32,
    pub real_height: u32,
    pub view_width: u32,
    pub view_height: u32,
}

impl From<SinkDimensions> for Resolution {
    fn from(dims: SinkDimensions) -> Self {
        let (view_width, view_height) = dims.view;
        let (real_width, real_height) = dims.native.unwrap_or(dims.view);
        Self {
            real_width,
            real_height,
            view_width,
            view_height,
        }
    }
}

/// The element that accepts tracks for display or playback
///
/// Shared with whoever renders it, so all methods take `&self`. Only
/// [`TrackSinkAdapter`](super::TrackSinkAdapter) should change the source.
pub trait PresentationSink: Send + Sync {
    /// Current container; `None` when released
    fn source(&self) -> Option<TrackSet>;

    fn set_source(&self, source: Option<TrackSet>);

    fn frame_counters(&self) -> FrameCounters {
        FrameCounters::default()
    }

    fn dimensions(&self) -> SinkDimensions;
}

#[derive(Default)]
struct HeadlessInner {
    source: Option<TrackSet>,
    retired_frames: u64,
    native: Option<(u32, u32)>,
    view: (u32, u32),
}

impl HeadlessInner {
    fn live_frames(&self) -> u64 {
        self.source
            .iter()
            .flatten()
            .filter(|t| t.kind() == TrackKind::Video)
            .filter_map(|t| t.frame_count())
            .sum()
    }
}

/// In-process sink with no renderer attached
///
/// The decoded counter totals the frames of every video track attached since
/// the container was created, including tracks removed from it, so it never
/// decreases while the container lives. Releasing the container restarts it.
#[derive(Default)]
pub struct HeadlessSink {
    inner: Mutex<HeadlessInner>,
}

impl HeadlessSink {
    pub fn new(view_width: u32, view_height: u32) -> Self {
        Self {
            inner: Mutex::new(HeadlessInner {
                view: (view_width, view_height),
                ..Default::default()
            }),
        }
    }

    /// Record the decoded size once it is known
    pub fn set_native_size(&self, size: Option<(u32, u32)>) {
        self.inner.lock().native = size;
    }

    pub fn set_view_size(&self, width: u32, height: u32) {
        self.inner.lock().view = (width, height);
    }

    /// Number of tracks currently held
    pub fn track_count(&self) -> usize {
        self.inner.lock().source.as_ref().map_or(0, Vec::len)
    }
}

impl PresentationSink for HeadlessSink {
    fn source(&self) -> Option<TrackSet> {
        self.inner.lock().source.clone()
    }

    fn set_source(&self, source: Option<TrackSet>) {
        let mut inner = self.inner.lock();
        let keep: Vec<String> = source.iter().flatten().map(|t| t.id()).collect();
        let retired: u64 = inner
            .source
            .iter()
            .flatten()
            .filter(|t| t.kind() == TrackKind::Video && !keep.contains(&t.id()))
            .filter_map(|t| t.frame_count())
            .sum();
        if source.is_some() {
            inner.retired_frames += retired;
        } else {
            inner.retired_frames = 0;
        }
        inner.source = source;
    }

    fn frame_counters(&self) -> FrameCounters {
        let inner = self.inner.lock();
        FrameCounters {
            decoded: Some(inner.retired_frames + inner.live_frames()),
            painted: None,
        }
    }

    fn dimensions(&self) -> SinkDimensions {
        let inner = self.inner.lock();
        SinkDimensions {
            native: inner.native,
            view: inner.view,
        }
    }
}

impl std::fmt::Debug for HeadlessSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("HeadlessSink")
            .field("tracks", &inner.source.as_ref().map(Vec::len))
            .field("native", &inner.native)
            .field("view", &inner.view)
            .finish()
    }
}
