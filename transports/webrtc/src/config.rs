//! Configuration types for the viewer session

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed delay between a teardown and the next connection attempt
pub const DEFAULT_RETRY_DELAY_MS: u64 = 5000;

/// Telemetry sampling period
pub const DEFAULT_INFO_INTERVAL_MS: u64 = 1000;

/// Main configuration for a viewer session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// WebSocket signaling endpoint (ws:// or wss://)
    pub signaling_url: String,

    /// STUN server URLs (may be empty)
    pub stun_servers: Vec<String>,

    /// TURN server configurations (optional)
    pub turn_servers: Vec<TurnServerConfig>,

    /// Delay before reconnecting after a teardown (default: 5000ms)
    ///
    /// The delay is flat: every retry waits the same amount and retries are
    /// unbounded until the stream is explicitly stopped.
    pub retry_delay_ms: u64,

    /// Telemetry sampling period (default: 1000ms)
    pub info_interval_ms: u64,
}

/// TURN server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnServerConfig {
    /// TURN server URL (turn: or turns:)
    pub url: String,

    /// Username for TURN authentication
    pub username: String,

    /// Credential for TURN authentication
    pub credential: String,
}

/// One relay/reflection server handed to the peer session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: String,
    pub credential: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            signaling_url: "ws://localhost:8080/live777/ws".to_string(),
            stun_servers: Vec::new(),
            turn_servers: Vec::new(),
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            info_interval_ms: DEFAULT_INFO_INTERVAL_MS,
        }
    }
}

impl StreamConfig {
    /// Create a configuration with default timings for the given endpoint
    pub fn new(signaling_url: impl Into<String>) -> Self {
        Self {
            signaling_url: signaling_url.into(),
            ..Default::default()
        }
    }

    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `signaling_url` is not a WebSocket URL
    /// - `retry_delay_ms` or `info_interval_ms` is zero
    /// - a TURN server has an empty URL
    pub fn validate(&self) -> Result<()> {
        if !self.signaling_url.starts_with("ws://") && !self.signaling_url.starts_with("wss://") {
            return Err(Error::InvalidConfig(format!(
                "signaling_url must start with ws:// or wss://, got {}",
                self.signaling_url
            )));
        }

        if self.retry_delay_ms == 0 {
            return Err(Error::InvalidConfig(
                "retry_delay_ms must be greater than zero".to_string(),
            ));
        }

        if self.info_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "info_interval_ms must be greater than zero".to_string(),
            ));
        }

        if let Some(turn) = self.turn_servers.iter().find(|t| t.url.is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "TURN server URL cannot be empty (username: {})",
                turn.username
            )));
        }

        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn info_interval(&self) -> Duration {
        Duration::from_millis(self.info_interval_ms)
    }

    /// Flatten STUN and TURN settings into the server list for a peer session
    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.stun_servers
            .iter()
            .map(|url| IceServerConfig {
                urls: vec![with_ice_scheme(url, "stun:")],
                ..Default::default()
            })
            .chain(self.turn_servers.iter().map(|turn| IceServerConfig {
                urls: vec![with_ice_scheme(&turn.url, "turn:")],
                username: turn.username.clone(),
                credential: turn.credential.clone(),
            }))
            .collect()
    }
}

/// Prefix a bare `host:port` with the given ICE scheme
fn with_ice_scheme(url: &str, scheme: &str) -> String {
    const SCHEMES: [&str; 4] = ["stun:", "stuns:", "turn:", "turns:"];
    if SCHEMES.iter().any(|s| url.starts_with(s)) {
        url.to_string()
    } else {
        format!("{}{}", scheme, url)
    }
}

/// Per-viewer session options, fixed at construction
///
/// The microphone is only meaningful together with audio, so `allow_mic`
/// is forced off whenever `allow_audio` is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    orientation: u16,
    allow_audio: bool,
    allow_mic: bool,
}

impl SessionOptions {
    pub fn new(orientation: u16, allow_audio: bool, allow_mic: bool) -> Self {
        Self {
            orientation,
            allow_audio,
            allow_mic: allow_audio && allow_mic,
        }
    }

    /// Requested orientation in degrees
    pub fn orientation(&self) -> u16 {
        self.orientation
    }

    pub fn allow_audio(&self) -> bool {
        self.allow_audio
    }

    pub fn allow_mic(&self) -> bool {
        self.allow_mic
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new(0, false, false)
    }
}
