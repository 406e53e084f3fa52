use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use maze_chase_core::config::GameConfig;
use maze_chase_core::protocol::parse_command;
use maze_chase_core::runtime::spawn_session;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Plays one interactive game: JSON commands on stdin, one JSON snapshot per
/// line on stdout.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long)]
    lives: Option<u32>,
    /// How often the frame clock fires, in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match GameConfig::load(cli.config.as_deref()).and_then(|mut config| {
        if let Some(seed) = cli.seed {
            config.seed = seed;
        }
        if let Some(lives) = cli.lives {
            config.initial_lives = lives;
        }
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "invalid configuration");
            std::process::exit(2);
        }
    };

    let mut session = match spawn_session(config, Duration::from_millis(cli.frame_ms.max(1))) {
        Ok(session) => session,
        Err(error) => {
            error!(%error, "session could not start");
            std::process::exit(2);
        }
    };
    println!("{}", json!({ "type": "world", "world": session.world() }));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match parse_command(line) {
                        Some(command) => {
                            if !session.send(command).await {
                                break;
                            }
                        }
                        None => warn!(line, "ignoring unrecognized command"),
                    }
                }
                Ok(None) => {
                    info!("stdin closed");
                    break;
                }
                Err(error) => {
                    error!(%error, "failed to read stdin");
                    break;
                }
            },
            snapshot = session.next_snapshot() => match snapshot {
                Some(snapshot) => {
                    println!("{}", json!({ "type": "state", "snapshot": snapshot }));
                }
                None => break,
            },
        }
    }

    if let Some(engine) = session.shutdown().await {
        info!(
            ticks = engine.tick_count(),
            score = engine.score(),
            phase = ?engine.phase(),
            "session ended"
        );
    }
}
