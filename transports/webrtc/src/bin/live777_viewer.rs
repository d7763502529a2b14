//! Headless Live777 stream viewer
//!
//! Keeps one stream ensured against a signaling endpoint and logs what the
//! session reports until Ctrl+C.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin live777_viewer -- \
//!   --signaling-url wss://pikvm.local/api/live777/ws \
//!   --audio \
//!   --stun-servers stun.l.google.com:19302
//!
//! # TURN relay
//! cargo run --bin live777_viewer -- \
//!   --turn-servers turn:relay.example.com:3478:viewer:secret
//! ```

use anyhow::{anyhow, Context};
use clap::{ArgAction, Parser};
use remotemedia_webrtc_viewer::{
    is_webrtc_available, HeadlessSink, SessionOptions, StreamConfig, StreamController,
    StreamEvent, TurnServerConfig,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Live777 stream viewer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket signaling URL
    #[arg(
        long,
        default_value = "ws://localhost:8080/live777/ws",
        env = "LIVE777_SIGNALING_URL"
    )]
    signaling_url: String,

    /// Requested orientation in degrees
    #[arg(long, default_value_t = 0, env = "LIVE777_ORIENTATION")]
    orientation: u16,

    /// Receive audio
    #[arg(long, env = "LIVE777_AUDIO")]
    audio: bool,

    /// Enable the microphone (requires --audio)
    #[arg(long, env = "LIVE777_MIC")]
    mic: bool,

    /// STUN servers (comma-separated)
    #[arg(long, value_delimiter = ',', env = "LIVE777_STUN_SERVERS")]
    stun_servers: Vec<String>,

    /// TURN servers (format: turn:host:port:username:password, comma-separated)
    #[arg(long, value_delimiter = ',', env = "LIVE777_TURN_SERVERS")]
    turn_servers: Vec<String>,

    /// Delay before reconnecting, in milliseconds
    #[arg(long, default_value_t = 5000, env = "LIVE777_RETRY_DELAY_MS")]
    retry_delay_ms: u64,

    /// Status sampling period, in milliseconds
    #[arg(long, default_value_t = 1000, env = "LIVE777_INFO_INTERVAL_MS")]
    info_interval_ms: u64,

    /// Report the video source as online (`--source-online false` to mark it offline)
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        env = "LIVE777_SOURCE_ONLINE"
    )]
    source_online: bool,
}

/// Parse `turn:host:port:username:password` (or `turns:`)
fn parse_turn_server(s: &str) -> anyhow::Result<TurnServerConfig> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() < 5 {
        return Err(anyhow!(
            "Invalid TURN server format: '{}'. Expected: turn:host:port:username:password",
            s
        ));
    }

    let protocol = parts[0];
    if protocol != "turn" && protocol != "turns" {
        return Err(anyhow!(
            "Invalid TURN protocol: '{}'. Expected 'turn' or 'turns'",
            protocol
        ));
    }

    Ok(TurnServerConfig {
        url: format!("{}:{}:{}", protocol, parts[1], parts[2]),
        username: parts[3].to_string(),
        // Password may contain colons
        credential: parts[4..].join(":"),
    })
}

fn build_config(args: &Args) -> anyhow::Result<StreamConfig> {
    let turn_servers = args
        .turn_servers
        .iter()
        .map(|s| parse_turn_server(s))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let config = StreamConfig {
        signaling_url: args.signaling_url.clone(),
        stun_servers: args.stun_servers.clone(),
        turn_servers,
        retry_delay_ms: args.retry_delay_ms,
        info_interval_ms: args.info_interval_ms,
    };
    config.validate()?;
    Ok(config)
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("invalid log filter")?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("failed to install tracing subscriber")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        signaling_url = %args.signaling_url,
        "Live777 viewer starting"
    );

    if !is_webrtc_available() {
        return Err(anyhow!("WebRTC is not available in this environment"));
    }
    if args.mic && !args.audio {
        warn!("--mic has no effect without --audio");
    }

    let config = build_config(&args)?;
    let options = SessionOptions::new(args.orientation, args.audio, args.mic);
    let sink = Arc::new(HeadlessSink::new(1280, 720));

    let (controller, mut events) = StreamController::new(config, options, sink.clone())?;
    info!(
        session = %controller.session_id(),
        name = %controller.name(),
        mode = controller.mode(),
        "Viewer session created"
    );
    controller.ensure_stream(Arc::new(args.source_online))?;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Ctrl+C received, stopping stream");
                break;
            }
            event = events.recv() => match event {
                Some(StreamEvent::Active) => info!("Stream active"),
                Some(StreamEvent::Inactive) => info!("Stream inactive"),
                Some(StreamEvent::Info(info)) => info!(
                    active = info.active,
                    online = info.online,
                    tracks = sink.track_count(),
                    "{}",
                    info.text
                ),
                None => break,
            },
        }
    }

    controller.shutdown().await?;
    info!("Viewer stopped");
    Ok(())
}
