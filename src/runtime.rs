use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::engine::GameEngine;
use crate::error::ConfigError;
use crate::protocol::Command;
use crate::types::{Snapshot, WorldInit};

const COMMAND_QUEUE: usize = 64;
const SNAPSHOT_QUEUE: usize = 256;

/// A game running on its own tokio task. The engine is owned by that task;
/// commands go in and snapshots come out over channels.
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: mpsc::Receiver<Snapshot>,
    world: WorldInit,
    task: JoinHandle<GameEngine>,
}

impl SessionHandle {
    pub fn world(&self) -> &WorldInit {
        &self.world
    }

    /// Returns false once the session has stopped.
    pub async fn send(&self, command: Command) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub async fn next_snapshot(&mut self) -> Option<Snapshot> {
        self.snapshots.recv().await
    }

    /// Stops the loop and hands back the engine in its final state.
    pub async fn shutdown(self) -> Option<GameEngine> {
        let Self {
            commands,
            snapshots,
            task,
            ..
        } = self;
        drop(commands);
        drop(snapshots);
        task.await.ok()
    }
}

/// Starts a session driven by a frame timer firing every `frame_interval`.
/// Game ticks are still gated by the configured tick rate.
pub fn spawn_session(
    config: GameConfig,
    frame_interval: Duration,
) -> Result<SessionHandle, ConfigError> {
    let engine = GameEngine::new(config, 0)?;
    let world = engine.world_init();
    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE);
    let (snapshot_tx, snapshot_rx) = mpsc::channel(SNAPSHOT_QUEUE);
    let task = tokio::spawn(run_session(engine, frame_interval, command_rx, snapshot_tx));
    Ok(SessionHandle {
        commands: command_tx,
        snapshots: snapshot_rx,
        world,
        task,
    })
}

async fn run_session(
    mut engine: GameEngine,
    frame_interval: Duration,
    mut commands: mpsc::Receiver<Command>,
    snapshots: mpsc::Sender<Snapshot>,
) -> GameEngine {
    let started = Instant::now();
    let mut frames = tokio::time::interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(
        frame_ms = frame_interval.as_millis() as u64,
        "session started"
    );

    publish(&mut engine, &snapshots);
    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                let now_ms = started.elapsed().as_millis() as u64;
                if apply_command(&mut engine, command, now_ms) {
                    publish(&mut engine, &snapshots);
                }
            }
            _ = frames.tick() => {
                let now_ms = started.elapsed().as_millis() as u64;
                if engine.on_frame(now_ms) {
                    publish(&mut engine, &snapshots);
                }
            }
        }
        if snapshots.is_closed() {
            break;
        }
    }

    info!(
        ticks = engine.tick_count(),
        score = engine.score(),
        phase = ?engine.phase(),
        "session stopped"
    );
    engine
}

/// Returns whether the command changed something worth publishing at once.
fn apply_command(engine: &mut GameEngine, command: Command, now_ms: u64) -> bool {
    match command {
        Command::Turn(dir) => {
            engine.set_next_direction(dir);
            false
        }
        Command::Reset => {
            engine.reset(now_ms);
            true
        }
        #[cfg(feature = "debug-tools")]
        Command::CycleDebugMode => {
            engine.cycle_debug_mode();
            true
        }
        #[cfg(feature = "debug-tools")]
        Command::TogglePursuerRange => {
            engine.toggle_pursuer_range();
            true
        }
        #[cfg(not(feature = "debug-tools"))]
        Command::CycleDebugMode | Command::TogglePursuerRange => {
            debug!(?command, "debug tools are disabled");
            false
        }
    }
}

/// Events stay queued in the engine while the consumer is behind and ride
/// along with the next snapshot that gets through, up to the engine's
/// pending-event cap.
fn publish(engine: &mut GameEngine, snapshots: &mpsc::Sender<Snapshot>) {
    if snapshots.capacity() == 0 {
        debug!(tick = engine.tick_count(), "snapshot consumer is behind");
        return;
    }
    // Capacity was checked above and this task is the only sender.
    let _ = snapshots.try_send(engine.build_snapshot(true));
}
