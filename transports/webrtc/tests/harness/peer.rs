//! Scripted peer sessions

use async_trait::async_trait;
use parking_lot::Mutex;
use remotemedia_webrtc_viewer::config::IceServerConfig;
use remotemedia_webrtc_viewer::peer::{
    IceConnectionState, PeerEventSender, PeerSession, PeerSessionFactory,
};
use remotemedia_webrtc_viewer::signaling::{IceCandidate, SessionDescription};
use remotemedia_webrtc_viewer::{Error, MediaTrack, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Peer session that answers any offer whose SDP starts with `v=0`
pub struct MockPeerSession {
    events: PeerEventSender,
    remote: Mutex<Option<SessionDescription>>,
    local: Mutex<Option<SessionDescription>>,
    candidates: Mutex<Vec<IceCandidate>>,
    closes: AtomicUsize,
}

impl MockPeerSession {
    fn new(events: PeerEventSender) -> Self {
        Self {
            events,
            remote: Mutex::new(None),
            local: Mutex::new(None),
            candidates: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
        }
    }

    /// Simulate a received track
    pub fn emit_track(&self, track: Arc<dyn MediaTrack>) {
        self.events.track(track);
    }

    pub fn emit_ice_state(&self, state: IceConnectionState) {
        self.events.ice_connection_state(state);
    }

    pub fn remote_description(&self) -> Option<SessionDescription> {
        self.remote.lock().clone()
    }

    pub fn candidates(&self) -> Vec<IceCandidate> {
        self.candidates.lock().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PeerSession for MockPeerSession {
    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        if !description.sdp.starts_with("v=0") {
            return Err(Error::SdpError("malformed SDP".to_string()));
        }
        *self.remote.lock() = Some(description);
        Ok(())
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        Ok(SessionDescription::answer("v=0\r\ns=mock-answer\r\n"))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        *self.local.lock() = Some(description);
        Ok(())
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        self.local.lock().clone()
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        if candidate.candidate.is_empty() {
            return Err(Error::IceCandidateError("empty candidate".to_string()));
        }
        self.candidates.lock().push(candidate);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct FactoryState {
    sessions: Vec<Arc<MockPeerSession>>,
    failures_left: usize,
    ice_servers: Vec<Vec<IceServerConfig>>,
}

/// Creates [`MockPeerSession`]s, optionally failing the first few attempts
#[derive(Clone, Default)]
pub struct MockPeerFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl MockPeerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` creations fail
    pub fn fail_next(&self, count: usize) {
        self.state.lock().failures_left = count;
    }

    pub fn session_count(&self) -> usize {
        self.state.lock().sessions.len()
    }

    pub fn session(&self, index: usize) -> Arc<MockPeerSession> {
        Arc::clone(&self.state.lock().sessions[index])
    }

    pub fn last(&self) -> Arc<MockPeerSession> {
        self.state
            .lock()
            .sessions
            .last()
            .cloned()
            .expect("no peer session was created")
    }

    /// Sessions created and not yet closed
    pub fn live_sessions(&self) -> usize {
        self.state
            .lock()
            .sessions
            .iter()
            .filter(|s| s.close_count() == 0)
            .count()
    }

    pub fn ice_servers_seen(&self) -> Vec<Vec<IceServerConfig>> {
        self.state.lock().ice_servers.clone()
    }
}

#[async_trait]
impl PeerSessionFactory for MockPeerFactory {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        events: PeerEventSender,
    ) -> Result<Arc<dyn PeerSession>> {
        let mut state = self.state.lock();
        state.ice_servers.push(ice_servers.to_vec());
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(Error::PeerConnectionError(
                "peer connection unavailable".to_string(),
            ));
        }
        let session = Arc::new(MockPeerSession::new(events));
        state.sessions.push(Arc::clone(&session));
        Ok(session)
    }
}
