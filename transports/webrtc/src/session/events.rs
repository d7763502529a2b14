//! Notifications delivered to the caller

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Status details of an info update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamInfo {
    pub active: bool,
    /// The source is delivering a signal
    pub online: bool,
    /// Short status text, e.g. `"30 fps dynamic"` or `"WebSocket error"`
    pub text: String,
}

/// What the controller reports to its caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Active,
    Inactive,
    Info(StreamInfo),
}

/// Sends [`StreamEvent`]s; a dropped receiver is not an error
#[derive(Debug, Clone)]
pub(crate) struct EventEmitter {
    session_id: Uuid,
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl EventEmitter {
    pub(crate) fn new(session_id: Uuid, tx: mpsc::UnboundedSender<StreamEvent>) -> Self {
        Self { session_id, tx }
    }

    pub(crate) fn active(&self) {
        self.emit(StreamEvent::Active);
    }

    pub(crate) fn inactive(&self) {
        self.emit(StreamEvent::Inactive);
    }

    pub(crate) fn info(&self, active: bool, online: bool, text: impl Into<String>) {
        self.emit(StreamEvent::Info(StreamInfo {
            active,
            online,
            text: text.into(),
        }));
    }

    fn emit(&self, event: StreamEvent) {
        if self.tx.send(event).is_err() {
            debug!("Session {}: event receiver dropped", self.session_id);
        }
    }
}
