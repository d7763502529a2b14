//! Peer session ownership and negotiation
//!
//! A [`PeerSessionManager`] owns one [`PeerSession`]. Offers and remote
//! candidates are queued onto a per-session worker so they are applied in
//! arrival order without blocking the controller.

use super::session::{PeerEventSender, PeerSession, PeerSessionFactory};
use crate::config::IceServerConfig;
use crate::generation::Generation;
use crate::signaling::{IceCandidate, SessionDescription};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

enum PeerOp {
    Offer(SessionDescription),
    Candidate(IceCandidate),
}

/// Owner of the live peer session
pub struct PeerSessionManager {
    generation: Generation,
    session: Option<Arc<dyn PeerSession>>,
    ops: Option<mpsc::UnboundedSender<PeerOp>>,
    worker: Option<JoinHandle<()>>,
}

impl PeerSessionManager {
    /// Create the peer session and its worker
    ///
    /// # Errors
    ///
    /// Returns the factory's error if the session cannot be constructed.
    pub async fn start(
        factory: &dyn PeerSessionFactory,
        ice_servers: &[IceServerConfig],
        events: PeerEventSender,
    ) -> Result<Self> {
        let generation = events.generation();
        let session = factory.create(ice_servers, events.clone()).await?;
        info!(
            "Peer session {} created with {} ICE server(s)",
            generation,
            ice_servers.len()
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(Arc::clone(&session), rx, events));

        Ok(Self {
            generation,
            session: Some(session),
            ops: Some(tx),
            worker: Some(worker),
        })
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    /// Queue negotiation against a remote offer
    ///
    /// On success the worker reports the answer as `AnswerReady`; failures
    /// are logged and abort only this negotiation.
    pub fn handle_offer(&self, offer: SessionDescription) {
        self.enqueue(PeerOp::Offer(offer));
    }

    /// Queue a remote ICE candidate; failures are logged and ignored
    pub fn handle_candidate(&self, candidate: IceCandidate) {
        self.enqueue(PeerOp::Candidate(candidate));
    }

    fn enqueue(&self, op: PeerOp) {
        let queued = self.ops.as_ref().is_some_and(|ops| ops.send(op).is_ok());
        if !queued {
            debug!("Peer session {} is closed, dropping operation", self.generation);
        }
    }

    /// Release the session; idempotent
    pub async fn close(&mut self) {
        self.ops = None;
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
        if let Some(session) = self.session.take() {
            debug!("Closing peer session {}", self.generation);
            if let Err(e) = session.close().await {
                warn!("Failed to close peer session {}: {}", self.generation, e);
            }
        }
    }
}

impl Drop for PeerSessionManager {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
        if let Some(session) = self.session.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        let _ = session.close().await;
                    });
                }
                Err(_) => warn!(
                    "Peer session {} dropped outside a runtime without close",
                    self.generation
                ),
            }
        }
    }
}

impl std::fmt::Debug for PeerSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerSessionManager")
            .field("generation", &self.generation)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[instrument(skip_all, fields(peer = %events.generation()))]
async fn run_worker(
    session: Arc<dyn PeerSession>,
    mut ops: mpsc::UnboundedReceiver<PeerOp>,
    events: PeerEventSender,
) {
    while let Some(op) = ops.recv().await {
        match op {
            PeerOp::Offer(offer) => match negotiate(session.as_ref(), offer).await {
                Ok(answer) => {
                    debug!("Negotiation complete, answer ready");
                    events.answer_ready(answer);
                }
                Err(e) => error!("Error handling offer: {}", e),
            },
            PeerOp::Candidate(candidate) => {
                if let Err(e) = session.add_ice_candidate(candidate).await {
                    warn!("Error adding ICE candidate: {}", e);
                }
            }
        }
    }
    debug!("Peer worker terminated");
}

/// Apply the offer, answer it and return the applied local description
pub async fn negotiate(
    session: &dyn PeerSession,
    offer: SessionDescription,
) -> Result<SessionDescription> {
    session.set_remote_description(offer).await?;
    let answer = session.create_answer().await?;
    session.set_local_description(answer).await?;
    session
        .local_description()
        .await
        .ok_or_else(|| Error::SdpError("No local description after setting answer".to_string()))
}
