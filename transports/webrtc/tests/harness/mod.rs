//! Viewer test harness
//!
//! Provides scripted stand-ins for everything the controller talks to:
//! - [`MockTransport`]: signaling connections the test opens, closes and feeds
//! - [`MockPeerFactory`]: peer sessions that record what was applied to them
//! - [`FakeTrack`]: media tracks with a settable frame counter

#![allow(dead_code)]

pub mod peer;
pub mod signaling;
pub mod tracks;

use remotemedia_webrtc_viewer::StreamEvent;
use tokio::sync::mpsc;

#[allow(unused_imports)]
pub use peer::{MockPeerFactory, MockPeerSession};
#[allow(unused_imports)]
pub use signaling::{MockConnection, MockTransport};
#[allow(unused_imports)]
pub use tracks::FakeTrack;

/// Let every ready task run until the runtime is idle again
///
/// Does not advance a paused clock.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Take every event received so far
pub fn drain(events: &mut mpsc::UnboundedReceiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

/// Info texts among `events`, in order
pub fn info_texts(events: &[StreamEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Info(info) => Some(info.text.clone()),
            _ => None,
        })
        .collect()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
