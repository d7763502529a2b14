//! Live stream session controller
//!
//! [`StreamController`] is a cheap handle; all state lives in a single
//! controller task that owns the signaling channel, the peer session, the
//! retry timer and the telemetry sampler. The task waits on one
//! `tokio::select!` over caller commands, channel events, peer events and the
//! two timers, so every transition runs to completion before the next event
//! is looked at.
//!
//! Every failure path funnels into one teardown. Unless the caller stopped
//! the stream, teardown schedules a single reconnect after a flat delay.

use super::events::{EventEmitter, StreamEvent};
use super::state::SessionState;
use crate::config::{SessionOptions, StreamConfig};
use crate::generation::{Generation, Tagged};
use crate::media::{PresentationSink, Resolution, TrackKind, TrackSinkAdapter};
use crate::peer::{
    PeerEvent, PeerEventSender, PeerSessionFactory, PeerSessionManager, RtcPeerSessionFactory,
};
use crate::signaling::{
    ChannelEvent, ChannelEventSender, InboundMessage, OutboundMessage, SignalingChannel,
    SignalingTransport, WebSocketTransport,
};
use crate::telemetry::TelemetrySampler;
use crate::{Error, Result};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Sleep};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Mode tag of this stream transport
pub const MODE: &str = "live777";

const BASE_NAME: &str = "Live777 H.264";

/// Snapshot of the controller's internal state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerStatus {
    pub session_id: Uuid,
    /// Generation of the most recent connection attempt
    pub generation: Generation,
    pub channel_present: bool,
    pub channel_open: bool,
    pub peer_present: bool,
    pub retry_pending: bool,
    pub telemetry_running: bool,
    pub stopped: bool,
    /// Cause of the most recent teardown; cleared once a channel opens
    pub last_error: Option<String>,
}

enum Command {
    Ensure(Arc<dyn SessionState>),
    Stop,
    Status(oneshot::Sender<ControllerStatus>),
    Shutdown(oneshot::Sender<()>),
}

/// Handle to one live stream session
pub struct StreamController {
    session_id: Uuid,
    options: SessionOptions,
    sink: Arc<dyn PresentationSink>,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl StreamController {
    /// Create a controller using the WebSocket and WebRTC backends
    ///
    /// Must be called from within a Tokio runtime. Returns the handle and the
    /// receiver for [`StreamEvent`]s.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` does not validate.
    pub fn new(
        config: StreamConfig,
        options: SessionOptions,
        sink: Arc<dyn PresentationSink>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<StreamEvent>)> {
        Self::with_backends(
            config,
            options,
            sink,
            Arc::new(WebSocketTransport::new()),
            Arc::new(RtcPeerSessionFactory::new()),
        )
    }

    /// Create a controller with explicit signaling and peer backends
    pub fn with_backends(
        config: StreamConfig,
        options: SessionOptions,
        sink: Arc<dyn PresentationSink>,
        transport: Arc<dyn SignalingTransport>,
        factory: Arc<dyn PeerSessionFactory>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<StreamEvent>)> {
        config.validate()?;

        let session_id = Uuid::new_v4();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (channel_tx, channel_rx) = mpsc::unbounded_channel();
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();

        info!(
            "Creating stream session {}: {} (orientation={})",
            session_id,
            display_name(&options),
            options.orientation()
        );

        let task = ControllerTask {
            session_id,
            sampler: TelemetrySampler::new(config.info_interval()),
            config,
            options,
            transport,
            factory,
            adapter: TrackSinkAdapter::new(Arc::clone(&sink)),
            events: EventEmitter::new(session_id, event_tx),
            channel_tx,
            peer_tx,
            state: None,
            stop: false,
            ensuring: false,
            generation: Generation::default(),
            channel: None,
            peer: None,
            retry: None,
            last_error: None,
        };
        let task = tokio::spawn(task.run(command_rx, channel_rx, peer_rx));

        Ok((
            Self {
                session_id,
                options,
                sink,
                commands: command_tx,
                task,
            },
            event_rx,
        ))
    }

    /// Record the latest state and connect unless already connecting or connected
    pub fn ensure_stream(&self, state: Arc<dyn SessionState>) -> Result<()> {
        self.send(Command::Ensure(state))
    }

    /// Stop the stream, release both connections and empty the sink
    pub fn stop_stream(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    pub async fn status(&self) -> Result<ControllerStatus> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Status(tx))?;
        rx.await
            .map_err(|_| Error::ControllerStopped("status request dropped".to_string()))
    }

    /// Stop the stream and wait for the controller task to end
    pub async fn shutdown(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown(tx))?;
        rx.await
            .map_err(|_| Error::ControllerStopped("shutdown request dropped".to_string()))?;
        self.task
            .await
            .map_err(|e| Error::ControllerStopped(format!("controller task failed: {}", e)))
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| Error::ControllerStopped(format!("session {}", self.session_id)))
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn orientation(&self) -> u16 {
        self.options.orientation()
    }

    pub fn is_audio_allowed(&self) -> bool {
        self.options.allow_audio()
    }

    pub fn is_mic_allowed(&self) -> bool {
        self.options.allow_mic()
    }

    /// Display name, e.g. `"Live777 H.264 + Audio + Mic"`
    pub fn name(&self) -> String {
        display_name(&self.options)
    }

    pub fn mode(&self) -> &'static str {
        MODE
    }

    /// Presented resolution; native size falls back to the view size
    pub fn resolution(&self) -> Resolution {
        Resolution::from(self.sink.dimensions())
    }
}

impl std::fmt::Debug for StreamController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamController")
            .field("session_id", &self.session_id)
            .field("options", &self.options)
            .finish()
    }
}

fn display_name(options: &SessionOptions) -> String {
    let mut name = String::from(BASE_NAME);
    if options.allow_audio() {
        name.push_str(" + Audio");
        if options.allow_mic() {
            name.push_str(" + Mic");
        }
    }
    name
}

async fn wait_retry(retry: &mut Option<Pin<Box<Sleep>>>) {
    match retry {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

struct ControllerTask {
    session_id: Uuid,
    config: StreamConfig,
    options: SessionOptions,
    transport: Arc<dyn SignalingTransport>,
    factory: Arc<dyn PeerSessionFactory>,
    adapter: TrackSinkAdapter,
    events: EventEmitter,
    channel_tx: mpsc::UnboundedSender<Tagged<ChannelEvent>>,
    peer_tx: mpsc::UnboundedSender<Tagged<PeerEvent>>,

    state: Option<Arc<dyn SessionState>>,
    stop: bool,
    ensuring: bool,
    generation: Generation,
    channel: Option<SignalingChannel>,
    peer: Option<PeerSessionManager>,
    retry: Option<Pin<Box<Sleep>>>,
    sampler: TelemetrySampler,
    last_error: Option<String>,
}

impl ControllerTask {
    #[instrument(name = "stream", skip_all, fields(session = %self.session_id))]
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut channel_events: mpsc::UnboundedReceiver<Tagged<ChannelEvent>>,
        mut peer_events: mpsc::UnboundedReceiver<Tagged<PeerEvent>>,
    ) {
        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(Command::Ensure(state)) => self.ensure_stream(state),
                    Some(Command::Stop) => self.stop_stream().await,
                    Some(Command::Status(reply)) => {
                        let _ = reply.send(self.status());
                    }
                    Some(Command::Shutdown(done)) => {
                        self.stop_stream().await;
                        let _ = done.send(());
                        break;
                    }
                    None => {
                        debug!("Controller handle dropped");
                        self.stop_stream().await;
                        break;
                    }
                },
                Some(event) = channel_events.recv() => self.on_channel_event(event).await,
                Some(event) = peer_events.recv() => self.on_peer_event(event).await,
                _ = wait_retry(&mut self.retry) => {
                    self.retry = None;
                    self.ensure(true);
                }
                _ = self.sampler.tick() => self.update_info(),
            }
        }

        info!("Stream session terminated");
    }

    fn status(&self) -> ControllerStatus {
        ControllerStatus {
            session_id: self.session_id,
            generation: self.generation,
            channel_present: self.channel.is_some(),
            channel_open: self.channel.as_ref().is_some_and(SignalingChannel::is_open),
            peer_present: self.peer.is_some(),
            retry_pending: self.retry.is_some(),
            telemetry_running: self.sampler.is_running(),
            stopped: self.stop,
            last_error: self.last_error.clone(),
        }
    }

    fn ensure_stream(&mut self, state: Arc<dyn SessionState>) {
        self.state = Some(state);
        self.stop = false;
        self.ensure(false);
    }

    async fn stop_stream(&mut self) {
        self.stop = true;
        self.destroy(None).await;
    }

    /// Open a new channel unless one is live, the stream is stopped, or an
    /// attempt is already pending (the retry timer may re-arm a pending attempt)
    fn ensure(&mut self, internal: bool) {
        if self.channel.is_some() || self.stop || (self.ensuring && !internal) {
            return;
        }

        self.ensuring = true;
        self.events.inactive();
        self.events.info(false, false, "");

        self.generation = self.generation.next();
        info!("Starting Live777 connection {} ...", self.generation);

        let events = ChannelEventSender::new(self.generation, self.channel_tx.clone());
        self.channel = Some(SignalingChannel::open(
            self.transport.as_ref(),
            &self.config.signaling_url,
            events,
        ));
    }

    async fn on_channel_event(&mut self, tagged: Tagged<ChannelEvent>) {
        let live = self.channel.as_ref().map(SignalingChannel::generation);
        if !tagged.is_current(live) {
            debug!("Ignoring stale channel event from {}", tagged.generation);
            return;
        }

        match tagged.event {
            ChannelEvent::Opened => self.on_channel_opened().await,
            ChannelEvent::Closed => {
                let cause = Error::SignalingError("WebSocket closed".to_string());
                self.finish(Some(cause)).await;
            }
            ChannelEvent::Error(description) => {
                self.events.info(false, false, "WebSocket error");
                self.finish(Some(Error::WebSocketError(description))).await;
            }
            ChannelEvent::Message(message) => self.on_message(message),
        }
    }

    async fn on_channel_opened(&mut self) {
        info!("Live777 WebSocket connected");
        self.last_error = None;
        if let Some(channel) = self.channel.as_mut() {
            channel.mark_opened();
        }
        if self.peer.is_some() {
            return;
        }

        let events = PeerEventSender::new(self.generation, self.peer_tx.clone());
        let ice_servers = self.config.ice_servers();
        match PeerSessionManager::start(self.factory.as_ref(), &ice_servers, events).await {
            Ok(peer) => {
                self.peer = Some(peer);
                self.send_watch();
            }
            Err(e) => self.finish(Some(e)).await,
        }
    }

    fn send_watch(&self) {
        let Some(channel) = self.channel.as_ref().filter(|c| c.is_open()) else {
            return;
        };
        info!(
            "Sending WATCH(orient={}, audio={}, mic={}) ...",
            self.options.orientation(),
            self.options.allow_audio(),
            self.options.allow_mic()
        );
        if let Err(e) = channel.send(&OutboundMessage::watch(&self.options)) {
            warn!("Failed to send watch request: {}", e);
        }
    }

    fn on_message(&mut self, message: InboundMessage) {
        debug!("Got {} message", message.kind());
        match message {
            InboundMessage::Offer(offer) => match &self.peer {
                Some(peer) => peer.handle_offer(offer),
                None => debug!("No peer session, ignoring offer"),
            },
            InboundMessage::IceCandidate(candidate) => match &self.peer {
                Some(peer) => peer.handle_candidate(candidate),
                None => debug!("No peer session, ignoring ICE candidate"),
            },
            InboundMessage::ServerError(message) => {
                warn!("Signaling server reported an error: {}", message)
            }
            InboundMessage::Other(_) => {}
        }
    }

    async fn on_peer_event(&mut self, tagged: Tagged<PeerEvent>) {
        let live = self.peer.as_ref().map(PeerSessionManager::generation);
        if !tagged.is_current(live) {
            debug!("Ignoring stale peer event from {}", tagged.generation);
            return;
        }

        match tagged.event {
            PeerEvent::Track(track) => {
                info!("Got track: {}", track.kind());
                let is_video = track.kind() == TrackKind::Video;
                self.adapter.attach(track);
                if is_video {
                    self.start_info();
                }
            }
            PeerEvent::IceConnectionState(state) => {
                info!("ICE connection state: {}", state);
                if state.is_failed() {
                    let cause = Error::IceConnectionFailed(state.to_string());
                    self.destroy(Some(cause)).await;
                }
            }
            PeerEvent::AnswerReady(answer) => {
                let Some(channel) = self.channel.as_ref() else {
                    return;
                };
                if let Err(e) = channel.send(&OutboundMessage::answer(answer)) {
                    warn!("Failed to send answer: {}", e);
                }
            }
        }
    }

    /// Teardown shared by every exit path
    ///
    /// Every failure reconnects; the cause only decides how loudly it is logged.
    async fn finish(&mut self, cause: Option<Error>) {
        if let Some(cause) = cause {
            if cause.is_retryable() {
                warn!("Live777 connection lost: {}", cause);
            } else {
                error!("Live777 session failed: {}", cause);
            }
            self.last_error = Some(cause.to_string());
        }

        if self.stop {
            self.retry = None;
            self.ensuring = false;
        } else if self.retry.is_none() {
            info!("Reconnecting in {:?}", self.config.retry_delay());
            self.retry = Some(Box::pin(time::sleep(self.config.retry_delay())));
        }

        self.stop_info();
        if let Some(mut peer) = self.peer.take() {
            peer.close().await;
        }
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }

        self.events.inactive();
        if self.stop {
            self.events.info(false, false, "");
        }
    }

    async fn destroy(&mut self, cause: Option<Error>) {
        self.finish(cause).await;
        self.adapter.detach_all();
    }

    fn start_info(&mut self) {
        self.stop_info();
        self.events.active();
        self.sampler.start();
        self.update_info();
    }

    fn stop_info(&mut self) {
        self.sampler.stop();
    }

    fn update_info(&mut self) {
        if self.peer.is_none() {
            return;
        }
        let text = self.sampler.sample(self.adapter.sink().as_ref());
        let online = self.state.as_ref().is_some_and(|s| s.source_online());
        self.events.info(true, online, text);
    }
}
