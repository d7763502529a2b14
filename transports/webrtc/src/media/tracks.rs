//! Remote WebRTC tracks

use super::{MediaTrack, TrackKind};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_remote::TrackRemote;

impl From<RTPCodecType> for TrackKind {
    fn from(codec_type: RTPCodecType) -> Self {
        match codec_type {
            RTPCodecType::Video => TrackKind::Video,
            _ => TrackKind::Audio,
        }
    }
}

/// A track received over the peer session
///
/// A reader task drains RTP from the remote track and counts completed
/// frames (packets carrying the RTP marker bit). Stopping the track ends
/// the reader.
pub struct RemoteMediaTrack {
    id: String,
    kind: TrackKind,
    remote: Arc<TrackRemote>,
    frames: Arc<AtomicU64>,
    stopped: AtomicBool,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteMediaTrack {
    /// Wrap a remote track and start draining it
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(remote: Arc<TrackRemote>) -> Self {
        let id = remote.id();
        let kind = TrackKind::from(remote.kind());
        let frames = Arc::new(AtomicU64::new(0));

        let reader = tokio::spawn(read_frames(
            Arc::clone(&remote),
            Arc::clone(&frames),
            id.clone(),
        ));

        Self {
            id,
            kind,
            remote,
            frames,
            stopped: AtomicBool::new(false),
            reader: Mutex::new(Some(reader)),
        }
    }

    /// The underlying WebRTC track
    pub fn remote(&self) -> &Arc<TrackRemote> {
        &self.remote
    }
}

async fn read_frames(remote: Arc<TrackRemote>, frames: Arc<AtomicU64>, id: String) {
    loop {
        match remote.read_rtp().await {
            Ok((packet, _attributes)) => {
                if packet.header.marker {
                    frames.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => {
                debug!("RTP read ended for track {}: {}", id, e);
                break;
            }
        }
    }
}

impl MediaTrack for RemoteMediaTrack {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            debug!("Stopping {} track {}", self.kind, self.id);
        }
        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.frames.load(Ordering::Relaxed))
    }
}

impl fmt::Debug for RemoteMediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteMediaTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("frames", &self.frames.load(Ordering::Relaxed))
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl Drop for RemoteMediaTrack {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.get_mut().take() {
            reader.abort();
        }
    }
}
