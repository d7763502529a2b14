//! Signaling channel ownership and event reporting
//!
//! A [`SignalingChannel`] owns one message connection created through a
//! [`SignalingTransport`]. The transport reports what happens on the wire
//! through a [`ChannelEventSender`], which stamps every event with the
//! channel's generation and decodes inbound text frames.

use super::protocol::{decode_inbound, InboundMessage, OutboundMessage};
use crate::generation::{Generation, Tagged};
use crate::{Error, Result};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Events reported by a signaling channel to its owner
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The connection is established; messages may be sent
    Opened,
    /// The connection closed
    Closed,
    /// The connection failed; carries an opaque description
    Error(String),
    /// A decoded inbound message
    Message(InboundMessage),
}

/// Reports wire events for one channel generation
#[derive(Debug, Clone)]
pub struct ChannelEventSender {
    generation: Generation,
    tx: mpsc::UnboundedSender<Tagged<ChannelEvent>>,
}

impl ChannelEventSender {
    pub fn new(generation: Generation, tx: mpsc::UnboundedSender<Tagged<ChannelEvent>>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn opened(&self) {
        self.emit(ChannelEvent::Opened);
    }

    pub fn closed(&self) {
        self.emit(ChannelEvent::Closed);
    }

    pub fn error(&self, description: impl Into<String>) {
        self.emit(ChannelEvent::Error(description.into()));
    }

    /// Decode and report one inbound text frame
    ///
    /// A frame that does not decode is logged and dropped; the channel stays open.
    pub fn message(&self, raw: &str) {
        match decode_inbound(raw) {
            Ok(message) => self.emit(ChannelEvent::Message(message)),
            Err(e) => warn!(
                "Dropping undecodable signaling message on channel {}: {}",
                self.generation, e
            ),
        }
    }

    fn emit(&self, event: ChannelEvent) {
        if self.tx.send(Tagged::new(self.generation, event)).is_err() {
            debug!(
                "Channel {} event dropped: controller is gone",
                self.generation
            );
        }
    }
}

/// Factory for message connections
pub trait SignalingTransport: Send + Sync {
    /// Begin connecting to `url`
    ///
    /// Returns immediately. Progress is reported through `events`: `opened`
    /// once the connection is usable, then messages, and finally `closed`
    /// and/or `error`.
    fn connect(&self, url: &str, events: ChannelEventSender) -> Box<dyn SocketLink>;
}

/// Write side of one message connection
pub trait SocketLink: Send {
    /// Queue a text frame for sending
    fn send_text(&self, text: String) -> Result<()>;

    /// Close the connection; safe to call repeatedly and before it opened
    fn close(&mut self);
}

/// One live signaling connection
pub struct SignalingChannel {
    generation: Generation,
    link: Option<Box<dyn SocketLink>>,
    opened: bool,
}

impl SignalingChannel {
    /// Start connecting; events arrive through `events`
    pub fn open(transport: &dyn SignalingTransport, url: &str, events: ChannelEventSender) -> Self {
        let generation = events.generation();
        debug!("Opening signaling channel {} to {}", generation, url);
        let link = transport.connect(url, events);
        Self {
            generation,
            link: Some(link),
            opened: false,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Record that the transport reported "opened"
    pub fn mark_opened(&mut self) {
        self.opened = self.link.is_some();
    }

    pub fn is_open(&self) -> bool {
        self.opened && self.link.is_some()
    }

    /// Encode and send a message
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelNotOpen`] before the channel opened or after it closed.
    pub fn send(&self, message: &OutboundMessage) -> Result<()> {
        let link = match (&self.link, self.opened) {
            (Some(link), true) => link,
            _ => return Err(Error::ChannelNotOpen),
        };
        link.send_text(message.to_json()?)
    }

    /// Close the connection; idempotent
    pub fn close(&mut self) {
        if let Some(mut link) = self.link.take() {
            debug!("Closing signaling channel {}", self.generation);
            link.close();
        }
        self.opened = false;
    }
}

impl Drop for SignalingChannel {
    fn drop(&mut self) {
        self.close();
    }
}
