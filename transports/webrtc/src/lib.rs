//! Self-healing WebRTC stream viewer for RemoteMedia
//!
//! This crate consumes one live video/audio stream from a Live777-style
//! streamer: it signals over a WebSocket, answers the streamer's WebRTC offer,
//! presents the received tracks on a sink and reports a small status string.
//! Any failure tears the session down and reconnects after a fixed delay until
//! the caller stops the stream.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Caller (UI / CLI)                                       │
//! │  ↓ ensure_stream / stop_stream      ↑ StreamEvent        │
//! │  StreamController (handle)                               │
//! │  └─ controller task (single select! loop)                │
//! │     ├─ SignalingChannel  (WebSocket, JSON messages)      │
//! │     ├─ PeerSessionManager (webrtc-rs, serial worker)     │
//! │     ├─ TrackSinkAdapter → PresentationSink               │
//! │     ├─ TelemetrySampler  (1 s, "N fps dynamic")          │
//! │     └─ retry timer       (flat 5 s)                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use remotemedia_webrtc_viewer::{SessionOptions, StreamConfig};
//!
//! let config = StreamConfig::new("wss://pikvm.local/api/live777/ws");
//! assert!(config.validate().is_ok());
//!
//! // Mic is meaningless without audio
//! let options = SessionOptions::new(0, false, true);
//! assert!(!options.allow_mic());
//! ```
//!
//! ## Async Usage
//!
//! ```no_run
//! use remotemedia_webrtc_viewer::{
//!     HeadlessSink, SessionOptions, StreamConfig, StreamController, StreamerState,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> remotemedia_webrtc_viewer::Result<()> {
//! let sink = Arc::new(HeadlessSink::new(1280, 720));
//! let (controller, mut events) = StreamController::new(
//!     StreamConfig::new("ws://localhost:8080/live777/ws"),
//!     SessionOptions::new(0, true, false),
//!     sink,
//! )?;
//!
//! controller.ensure_stream(Arc::new(StreamerState::default()))?;
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod generation;
pub mod media;
pub mod peer;
pub mod session;
pub mod signaling;
pub mod telemetry;

pub use config::{IceServerConfig, SessionOptions, StreamConfig, TurnServerConfig};
pub use error::{Error, Result};
pub use generation::{Generation, Tagged};
pub use media::{
    FrameCounters, HeadlessSink, MediaTrack, PresentationSink, Resolution, SinkDimensions,
    TrackKind, TrackSinkAdapter,
};
pub use peer::{is_webrtc_available, PeerSession, PeerSessionFactory};
pub use session::{
    ControllerStatus, SessionState, StreamController, StreamEvent, StreamInfo, StreamerState,
};
pub use signaling::{SignalingTransport, SocketLink, WebSocketTransport};
pub use telemetry::TelemetrySampler;

/// Get the version of this crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
