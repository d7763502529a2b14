//! WebRTC peer session on top of the `webrtc` crate

use super::session::{IceConnectionState, PeerEventSender, PeerSession, PeerSessionFactory};
use crate::config::IceServerConfig;
use crate::generation::Generation;
use crate::media::{MediaTrack, RemoteMediaTrack};
use crate::signaling::{IceCandidate, SdpKind, SessionDescription};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{APIBuilder, API};
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_remote::TrackRemote;

/// Build the WebRTC API with default codecs and interceptors
fn build_api() -> Result<API> {
    let mut media_engine = MediaEngine::default();
    media_engine
        .register_default_codecs()
        .map_err(|e| Error::WebRtcError(format!("Failed to register codecs: {}", e)))?;

    let registry = register_default_interceptors(Registry::new(), &mut media_engine)
        .map_err(|e| Error::WebRtcError(format!("Failed to register interceptors: {}", e)))?;

    Ok(APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .build())
}

/// Whether peer sessions can be created in this environment
pub fn is_webrtc_available() -> bool {
    match build_api() {
        Ok(_) => true,
        Err(e) => {
            debug!("WebRTC unavailable: {}", e);
            false
        }
    }
}

impl TryFrom<SessionDescription> for RTCSessionDescription {
    type Error = Error;

    fn try_from(desc: SessionDescription) -> Result<Self> {
        let parsed = match desc.kind {
            SdpKind::Offer => RTCSessionDescription::offer(desc.sdp),
            SdpKind::Answer => RTCSessionDescription::answer(desc.sdp),
            SdpKind::Pranswer => RTCSessionDescription::pranswer(desc.sdp),
            SdpKind::Rollback => {
                let mut rollback = RTCSessionDescription::default();
                rollback.sdp_type = RTCSdpType::Rollback;
                rollback.sdp = desc.sdp;
                return Ok(rollback);
            }
        };
        parsed.map_err(|e| Error::SdpError(format!("Failed to parse {:?}: {}", desc.kind, e)))
    }
}

impl TryFrom<RTCSessionDescription> for SessionDescription {
    type Error = Error;

    fn try_from(desc: RTCSessionDescription) -> Result<Self> {
        let kind = match desc.sdp_type {
            RTCSdpType::Offer => SdpKind::Offer,
            RTCSdpType::Answer => SdpKind::Answer,
            RTCSdpType::Pranswer => SdpKind::Pranswer,
            RTCSdpType::Rollback => SdpKind::Rollback,
            RTCSdpType::Unspecified => {
                return Err(Error::SdpError("Unspecified description type".to_string()))
            }
        };
        Ok(SessionDescription {
            kind,
            sdp: desc.sdp,
        })
    }
}

impl From<IceCandidate> for RTCIceCandidateInit {
    fn from(c: IceCandidate) -> Self {
        RTCIceCandidateInit {
            candidate: c.candidate,
            sdp_mid: c.sdp_mid,
            sdp_mline_index: c.sdp_mline_index,
            username_fragment: c.username_fragment,
        }
    }
}

/// Creates [`RtcPeerSession`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct RtcPeerSessionFactory;

impl RtcPeerSessionFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PeerSessionFactory for RtcPeerSessionFactory {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        events: PeerEventSender,
    ) -> Result<Arc<dyn PeerSession>> {
        let session = RtcPeerSession::new(ice_servers, events).await?;
        Ok(Arc::new(session))
    }
}

/// Receive-side peer session backed by an `RTCPeerConnection`
pub struct RtcPeerSession {
    generation: Generation,
    peer_connection: Arc<RTCPeerConnection>,
}

impl RtcPeerSession {
    /// Create a peer connection and hook its track and ICE callbacks to `events`
    #[instrument(skip_all, fields(peer = %events.generation()))]
    pub async fn new(ice_servers: &[IceServerConfig], events: PeerEventSender) -> Result<Self> {
        let api = build_api()?;

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone(),
                    credential: server.credential.clone(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await.map_err(|e| {
            Error::PeerConnectionError(format!("Failed to create peer connection: {}", e))
        })?);

        let track_events = events.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();
                Box::pin(async move {
                    let track = RemoteMediaTrack::new(track);
                    info!("Got {} track {}", track.kind(), track.id());
                    events.track(Arc::new(track));
                })
            },
        ));

        let ice_events = events.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |state: RTCIceConnectionState| {
                let events = ice_events.clone();
                Box::pin(async move {
                    let state = IceConnectionState::from(state);
                    info!("ICE connection state: {}", state);
                    events.ice_connection_state(state);
                })
            },
        ));

        Ok(Self {
            generation: events.generation(),
            peer_connection,
        })
    }

    pub fn peer_connection(&self) -> &Arc<RTCPeerConnection> {
        &self.peer_connection
    }
}

#[async_trait]
impl PeerSession for RtcPeerSession {
    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let description = RTCSessionDescription::try_from(description)?;
        self.peer_connection
            .set_remote_description(description)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to set remote description: {}", e)))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to create answer: {}", e)))?;
        SessionDescription::try_from(answer)
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        let description = RTCSessionDescription::try_from(description)?;
        self.peer_connection
            .set_local_description(description)
            .await
            .map_err(|e| Error::SdpError(format!("Failed to set local description: {}", e)))
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        let local = self.peer_connection.local_description().await?;
        SessionDescription::try_from(local).ok()
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        debug!("Adding ICE candidate: {}", candidate.candidate);
        self.peer_connection
            .add_ice_candidate(candidate.into())
            .await
            .map_err(|e| Error::IceCandidateError(format!("Failed to add ICE candidate: {}", e)))
    }

    async fn close(&self) -> Result<()> {
        debug!("Closing peer connection {}", self.generation);
        self.peer_connection
            .close()
            .await
            .map_err(|e| Error::PeerConnectionError(format!("Failed to close connection: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::manager::negotiate;
    use tokio::sync::mpsc;

    fn events() -> PeerEventSender {
        let (tx, _rx) = mpsc::unbounded_channel();
        PeerEventSender::new(Generation::new(1), tx)
    }

    #[test]
    fn test_webrtc_is_available() {
        assert!(is_webrtc_available());
    }

    #[test]
    fn test_candidate_conversion() {
        let init = RTCIceCandidateInit::from(IceCandidate {
            candidate: "candidate:1 1 udp 2130706431 192.168.1.2 50000 typ host".to_string(),
            sdp_mid: Some("0".to_string()),
            sdp_mline_index: Some(0),
            username_fragment: None,
        });
        assert_eq!(init.sdp_mid.as_deref(), Some("0"));
        assert_eq!(init.sdp_mline_index, Some(0));
    }

    #[test]
    fn test_unspecified_description_is_rejected() {
        let err = SessionDescription::try_from(RTCSessionDescription::default()).unwrap_err();
        assert!(err.is_negotiation_error());
    }

    #[tokio::test]
    async fn test_create_and_close_session() {
        let session = RtcPeerSession::new(&[], events()).await.unwrap();
        assert!(session.local_description().await.is_none());
        session.close().await.unwrap();
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_offer_is_an_sdp_error() {
        let session = RtcPeerSession::new(&[], events()).await.unwrap();
        let err = session
            .set_remote_description(SessionDescription::offer("not an sdp"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SdpError(_)));
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_answers_offer_from_another_peer() {
        use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;

        let offerer = build_api()
            .unwrap()
            .new_peer_connection(RTCConfiguration::default())
            .await
            .unwrap();
        offerer
            .add_transceiver_from_kind(RTPCodecType::Video, None)
            .await
            .unwrap();
        let offer = offerer.create_offer(None).await.unwrap();
        offerer.set_local_description(offer.clone()).await.unwrap();

        let session = RtcPeerSession::new(&[], events()).await.unwrap();
        let answer = negotiate(&session, SessionDescription::offer(offer.sdp))
            .await
            .unwrap();

        assert_eq!(answer.kind, SdpKind::Answer);
        assert!(answer.sdp.contains("m=video"));

        session.close().await.unwrap();
        offerer.close().await.unwrap();
    }
}
