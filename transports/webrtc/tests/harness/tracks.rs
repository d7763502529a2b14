//! Fake media tracks

use remotemedia_webrtc_viewer::{MediaTrack, TrackKind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
pub struct FakeTrack {
    id: String,
    kind: TrackKind,
    frames: AtomicU64,
    stopped: AtomicBool,
}

impl FakeTrack {
    pub fn video(id: &str) -> Arc<Self> {
        Self::new(id, TrackKind::Video)
    }

    pub fn audio(id: &str) -> Arc<Self> {
        Self::new(id, TrackKind::Audio)
    }

    fn new(id: &str, kind: TrackKind) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            kind,
            frames: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
        })
    }

    /// Set the total number of frames delivered
    pub fn set_frames(&self, frames: u64) {
        self.frames.store(frames, Ordering::SeqCst);
    }
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.frames.load(Ordering::SeqCst))
    }
}
