//! Standalone headless client binary.
//!
//! Usage:
//!   cargo run -p webgame_client -- [--url ws://127.0.0.1:2000] [--name Player] [--tick-hz 60]
//!
//! Connects, completes the handshake, then runs the simulation loop with
//! an idle input sample until the server closes the connection. Useful as
//! a smoke client against a live server.

use std::env;
use std::time::{Duration, Instant};

use tracing::info;
use webgame_client::client::GameClient;
use webgame_client::input::InputSample;
use webgame_client::render::{render_world, NullRenderer};
use webgame_client::session::ConnectionState;
use webgame_shared::config::ClientConfig;

fn parse_args() -> ClientConfig {
    let mut cfg = ClientConfig::default();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--url" if i + 1 < args.len() => {
                cfg.server_url = args[i + 1].clone();
                i += 2;
            }
            "--name" if i + 1 < args.len() => {
                cfg.player_name = args[i + 1].clone();
                i += 2;
            }
            "--tick-hz" if i + 1 < args.len() => {
                if let Ok(hz) = args[i + 1].parse() {
                    cfg.tick_hz = hz;
                }
                i += 2;
            }
            _ => i += 1,
        }
    }
    cfg
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args();
    info!(server = %cfg.server_url, name = %cfg.player_name, "Starting client");

    let mut client = GameClient::connect(&cfg).await?;

    let tick_interval = Duration::from_secs_f32(1.0 / cfg.tick_hz.max(1) as f32);
    let mut renderer = NullRenderer;
    let input = InputSample::default();
    let mut previous = Instant::now();
    let mut last_status = Instant::now();

    while client.state() != ConnectionState::Closed {
        tokio::time::sleep(tick_interval).await;
        let dt = previous.elapsed().as_secs_f32();
        previous = Instant::now();

        client.poll().await?;
        client.tick(dt, &input).await?;
        render_world(
            client.session().registry(),
            client.session().camera(),
            &mut renderer,
        );

        if last_status.elapsed() >= Duration::from_secs(5) {
            last_status = Instant::now();
            info!(
                state = ?client.state(),
                entities = client.session().registry().len(),
                "Status"
            );
        }
    }

    info!("Disconnected from server");
    Ok(())
}
