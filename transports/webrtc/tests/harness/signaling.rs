//! Scripted signaling transport

use parking_lot::Mutex;
use remotemedia_webrtc_viewer::signaling::{ChannelEventSender, SignalingTransport, SocketLink};
use remotemedia_webrtc_viewer::Result;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One connection opened by the controller
#[derive(Clone)]
pub struct MockConnection {
    pub url: String,
    events: ChannelEventSender,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl MockConnection {
    /// Report the connection as established
    pub fn open(&self) {
        self.events.opened();
    }

    /// The server closed the connection
    pub fn close_remote(&self) {
        self.events.closed();
    }

    pub fn fail(&self, description: &str) {
        self.events.error(description);
    }

    /// Deliver a raw inbound frame
    pub fn receive(&self, text: &str) {
        self.events.message(text);
    }

    pub fn receive_json(&self, value: Value) {
        self.events.message(&value.to_string());
    }

    /// Everything the controller sent, decoded
    pub fn sent(&self) -> Vec<Value> {
        self.sent
            .lock()
            .iter()
            .map(|s| serde_json::from_str(s).expect("controller sent invalid JSON"))
            .collect()
    }

    /// Sent messages of the given type
    pub fn sent_of_type(&self, kind: &str) -> Vec<Value> {
        self.sent()
            .into_iter()
            .filter(|m| m["type"] == kind)
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct MockLink {
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl SocketLink for MockLink {
    fn send_text(&self, text: String) -> Result<()> {
        self.sent.lock().push(text);
        Ok(())
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Records every connection; nothing happens on the wire until the test says so
#[derive(Clone, Default)]
pub struct MockTransport {
    connections: Arc<Mutex<Vec<MockConnection>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total connections ever opened
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Connections not yet closed by the controller
    pub fn live_connections(&self) -> usize {
        self.connections
            .lock()
            .iter()
            .filter(|c| !c.is_closed())
            .count()
    }

    pub fn connection(&self, index: usize) -> MockConnection {
        self.connections.lock()[index].clone()
    }

    pub fn last(&self) -> MockConnection {
        self.connections
            .lock()
            .last()
            .cloned()
            .expect("no connection was opened")
    }
}

impl SignalingTransport for MockTransport {
    fn connect(&self, url: &str, events: ChannelEventSender) -> Box<dyn SocketLink> {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        self.connections.lock().push(MockConnection {
            url: url.to_string(),
            events,
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        });
        Box::new(MockLink { sent, closed })
    }
}
