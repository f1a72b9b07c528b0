//! Standalone client binary.
//!
//! Usage:
//!   cargo run -p arena_client -- [--addr 127.0.0.1:40000] [--name Player]
//!
//! The client connects to the server, loads the mockup templates, sends aim
//! commands, and reconciles received snapshots into rendered frames. Without
//! a graphics backend it runs headless against the null renderer and logs
//! frame statistics.

use std::env;
use std::time::Duration;

use anyhow::Context;
use arena_client::client::{ClientState, GameClient};
use arena_client::input::InputState;
use arena_client::reconcile::{Reconciler, Viewport};
use arena_client::scene;
use arena_shared::config::ClientConfig;
use arena_shared::math::Vec2;
use arena_shared::render::NullRenderer;
use tracing::info;

fn parse_args() -> ClientConfig {
    let mut cfg = ClientConfig::default();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.server_addr = args[i + 1].clone();
                i += 2;
            }
            "--name" if i + 1 < args.len() => {
                cfg.player_name = args[i + 1].clone();
                i += 2;
            }
            "--fps" if i + 1 < args.len() => {
                cfg.frame_hz = args[i + 1].parse().unwrap_or(cfg.frame_hz);
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
    info!(server = %cfg.server_addr, fps = cfg.frame_hz, "Starting client");

    let mut client = GameClient::connect(&cfg).await.context("connect")?;
    info!(client_id = ?client.client_id, "Connected to server");

    let viewport = Viewport {
        width: cfg.viewport_width,
        height: cfg.viewport_height,
    };
    let reconciler = Reconciler::default();
    let mut backend = NullRenderer;

    let frame_interval = Duration::from_secs_f32(1.0 / cfg.frame_hz as f32);
    let mut frame: u64 = 0;

    loop {
        // Lifecycle events, mockup data, disconnects.
        client.poll_reliable().await?;

        if client.state == ClientState::Disconnected {
            println!("Disconnected from server.");
            break;
        }

        if client.state == ClientState::Ready {
            // Headless input stub; a real client samples the mouse here.
            let input = InputState::default();
            if let Err(e) = client.frame(input, viewport).await {
                println!("Frame error: {}", e);
            }

            client.recv_snapshot().await?;

            let poses = reconciler.tick(&mut client.world, viewport);
            let camera = client.world.player_pos().unwrap_or(Vec2::ZERO);
            scene::draw_frame(
                &mut backend,
                &poses,
                client.world.mockups(),
                client.world.arena(),
                camera,
                viewport,
            );

            if frame % 64 == 0 {
                info!(frame, entities = poses.len(), "Frame");
            }
            frame += 1;
        }

        tokio::time::sleep(frame_interval).await;
    }

    Ok(())
}
