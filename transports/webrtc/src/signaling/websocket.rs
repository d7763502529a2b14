//! WebSocket signaling transport
//!
//! One background task per connection multiplexes queued outbound frames
//! and inbound messages, reporting everything through the channel's
//! [`ChannelEventSender`].

use super::channel::{ChannelEventSender, SignalingTransport, SocketLink};
use crate::{Error, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, instrument};

/// [`SignalingTransport`] backed by `tokio-tungstenite`
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

impl SignalingTransport for WebSocketTransport {
    fn connect(&self, url: &str, events: ChannelEventSender) -> Box<dyn SocketLink> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(socket_task(url.to_string(), rx, events));
        Box::new(WebSocketLink { tx: Some(tx) })
    }
}

/// Outbound half of a WebSocket connection
///
/// Dropping the queue ends the socket task, which sends a Close frame if the
/// connection was established.
struct WebSocketLink {
    tx: Option<mpsc::UnboundedSender<Message>>,
}

impl SocketLink for WebSocketLink {
    fn send_text(&self, text: String) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| Error::WebSocketError("socket already closed".to_string()))?;
        tx.send(Message::Text(text))
            .map_err(|_| Error::WebSocketError("socket task has exited".to_string()))
    }

    fn close(&mut self) {
        self.tx = None;
    }
}

impl Drop for WebSocketLink {
    fn drop(&mut self) {
        self.close();
    }
}

#[instrument(skip(outbound, events), fields(channel = %events.generation()))]
async fn socket_task(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    events: ChannelEventSender,
) {
    let ws_stream = tokio::select! {
        result = connect_async(url.as_str()) => match result {
            Ok((stream, _response)) => stream,
            Err(e) => {
                error!("Failed to connect to signaling server {}: {}", url, e);
                events.error(e.to_string());
                events.closed();
                return;
            }
        },
        // Nothing is queued before "opened", so any wake-up here is the link closing
        _ = outbound.recv() => {
            debug!("Signaling link closed while connecting to {}", url);
            return;
        }
    };

    info!("Connected to signaling server {}", url);
    events.opened();

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            outgoing = outbound.recv() => match outgoing {
                Some(msg) => {
                    if let Err(e) = write.send(msg).await {
                        error!("Failed to send WebSocket message: {}", e);
                        events.error(e.to_string());
                        events.closed();
                        break;
                    }
                }
                None => {
                    debug!("Signaling link closed locally");
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => events.message(&text),
                Some(Ok(Message::Close(_))) | None => {
                    info!("WebSocket connection closed by server");
                    events.closed();
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    error!("WebSocket error: {}", e);
                    events.error(e.to_string());
                    events.closed();
                    break;
                }
            },
        }
    }

    debug!("Signaling socket task terminated");
}
