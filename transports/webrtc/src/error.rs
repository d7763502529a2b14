//! Error types for the WebRTC viewer session

/// Result type alias using the viewer Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a viewer session
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Signaling channel error
    #[error("Signaling error: {0}")]
    SignalingError(String),

    /// Message sent before the signaling channel reported "opened"
    #[error("Signaling channel is not open")]
    ChannelNotOpen,

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Malformed inbound signaling message
    #[error("Invalid signaling message: {0}")]
    InvalidMessage(String),

    /// WebRTC peer connection error
    #[error("Peer connection error: {0}")]
    PeerConnectionError(String),

    /// ICE connectivity failed
    #[error("ICE connection failed: {0}")]
    IceConnectionFailed(String),

    /// ICE candidate error
    #[error("ICE candidate error: {0}")]
    IceCandidateError(String),

    /// SDP negotiation error
    #[error("SDP negotiation error: {0}")]
    SdpError(String),

    /// The controller task is gone
    #[error("Controller stopped: {0}")]
    ControllerStopped(String),

    /// WebRTC library error
    #[error("WebRTC error: {0}")]
    WebRtcError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Transport-class failures that drive teardown and a reconnect
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::SignalingError(_)
                | Error::WebSocketError(_)
                | Error::IceConnectionFailed(_)
                | Error::PeerConnectionError(_)
                | Error::IoError(_)
        )
    }

    /// Check if this error is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }

    /// Failures that only abort the current offer/answer or candidate step
    pub fn is_negotiation_error(&self) -> bool {
        matches!(self, Error::SdpError(_) | Error::IceCandidateError(_))
    }
}

impl From<webrtc::Error> for Error {
    fn from(e: webrtc::Error) -> Self {
        Error::WebRtcError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidConfig("test".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: test");
        assert_eq!(Error::ChannelNotOpen.to_string(), "Signaling channel is not open");
    }

    #[test]
    fn test_error_is_retryable() {
        assert!(Error::SignalingError("test".to_string()).is_retryable());
        assert!(Error::IceConnectionFailed("failed".to_string()).is_retryable());
        assert!(!Error::SdpError("bad offer".to_string()).is_retryable());
        assert!(!Error::InvalidConfig("test".to_string()).is_retryable());
    }

    #[test]
    fn test_error_is_negotiation_error() {
        assert!(Error::SdpError("test".to_string()).is_negotiation_error());
        assert!(Error::IceCandidateError("stale".to_string()).is_negotiation_error());
        assert!(!Error::WebSocketError("test".to_string()).is_negotiation_error());
    }

    #[test]
    fn test_serde_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = Error::from(json_err);
        assert!(matches!(err, Error::SerializationError(_)));
    }
}
