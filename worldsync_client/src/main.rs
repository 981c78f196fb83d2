//! Headless client binary.
//!
//! Usage:
//!   cargo run -p worldsync_client --bin client -- [--addr 127.0.0.1:40000] [--name Ada] [--config client.json]
//!
//! Connects, applies server ticks to a headless world and prints UI
//! notifications. Console lines typed on stdin go to the cvar console,
//! except:
//!   status    - Show session status
//!   spectate  - Spectate after game over
//!   quit      - Leave the game

use std::env;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::info;
use worldsync_client::{notify::UiEvent, session::SessionState, GameClient};
use worldsync_shared::{config::ClientConfig, protocol::GasPhase, render::NullScene};

fn parse_args() -> anyhow::Result<ClientConfig> {
    let args: Vec<String> = env::args().collect();

    let mut config_path = None;
    let mut addr = None;
    let mut name = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                config_path = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--addr" if i + 1 < args.len() => {
                addr = Some(args[i + 1].clone());
                i += 2;
            }
            "--name" if i + 1 < args.len() => {
                name = Some(args[i + 1].clone());
                i += 2;
            }
            _ => i += 1,
        }
    }

    let mut cfg = match config_path {
        Some(path) => ClientConfig::load(&path)?,
        None => ClientConfig::default(),
    };
    if let Some(addr) = addr {
        cfg.server_addr = addr;
    }
    if let Some(name) = name {
        cfg.player_name = name;
    }
    Ok(cfg)
}

/// Prints UI events; returns true if the client must exit with an error.
fn report(events: Vec<UiEvent>) -> bool {
    let mut fatal = false;
    for event in events {
        match event {
            UiEvent::Splash(msg) => {
                println!("! {msg}");
                fatal = true;
            }
            UiEvent::ForceReload { query } => {
                println!("! Client out of date, reload with {query}");
                fatal = true;
            }
            UiEvent::ConnectionLost => println!("! Connection lost"),
            UiEvent::GameStarted { team_id, team_mode } => {
                println!("Game started (team {team_id}, team mode: {team_mode})")
            }
            UiEvent::GameOver { won, rank, kills } => {
                let outcome = if won { "Winner" } else { "Eliminated" };
                println!("{outcome}: rank #{rank}, {kills} kills");
            }
            UiEvent::KillFeed(line) => println!("{line}"),
            UiEvent::Pickup { item, message } => match message {
                Some(message) => println!("Picked up {item}: {message}"),
                None => println!("Picked up {item}"),
            },
            UiEvent::Ping(rtt) => info!(rtt_ms = rtt.as_millis() as u64, "Ping"),
            other => tracing::debug!(?other, "UI event"),
        }
    }
    fatal
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args().context("parse arguments")?;
    info!(server = %cfg.server_addr, name = %cfg.player_name, "Starting client");

    let addr = cfg.server_addr.clone();
    let mut client: GameClient = GameClient::new(cfg, Box::new(NullScene));

    // Console input channel.
    let (console_tx, mut console_rx) = mpsc::channel::<String>(32);

    // Stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    client.connect(&addr).await;
    let mut fatal = report(client.session.drain_ui());

    while client.is_connected() {
        // Console lines are handled between wakeups so a pump is never cut
        // off in the middle of a write.
        while let Ok(line) = console_rx.try_recv() {
            match line.as_str() {
                "quit" | "exit" => client.disconnect().await,
                "spectate" => {
                    if !client.session.spectate() {
                        println!("Nothing to spectate");
                    }
                }
                "status" => {
                    let session = &client.session;
                    println!("State: {:?}", session.state());
                    println!("Objects: {}", session.world().pool().len());
                    if let Some(rtt) = session.rtt() {
                        println!("RTT: {} ms", rtt.as_millis());
                    }
                    if let Some(alive) = session.world().alive_count() {
                        println!("Alive: {alive}");
                    }
                    let gas = session.world().gas();
                    if gas.phase() != GasPhase::Inactive {
                        println!("Gas: {:?}, {}s left", gas.phase(), gas.time_remaining().as_secs());
                    }
                }
                other => match client.session.exec_console(other) {
                    Ok(output) => {
                        for line in output {
                            println!("{line}");
                        }
                    }
                    Err(e) => println!("Error: {e}"),
                },
            }
        }

        client.pump().await;
        fatal |= report(client.session.drain_ui());
        // No audio or effects backend in the headless client.
        for effect in client.session.drain_effects() {
            tracing::trace!(?effect, "Effect");
        }
        for sound in client.session.drain_sounds() {
            tracing::trace!(sound = %sound.name, "Sound");
        }
    }

    if client.session.state() == SessionState::Over {
        client.session.finish_end_screen();
    }
    fatal |= report(client.session.drain_ui());

    Ok(if fatal { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
