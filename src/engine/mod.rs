use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::GameConfig;
use crate::constants::{
    pursuer_range, pursuer_speed, tick_interval_ms, BLOCK_SIZE, PLAYER_ANIMATION_FRAMES,
    PURSUER_VARIANTS, WANDER_WAYPOINT_COUNT,
};
use crate::entity::{Body, Player, Pursuer};
use crate::error::ConfigError;
use crate::movement::{step, Moveable};
use crate::scheduler::{FrameClock, Scheduler, TaskKind};
use crate::types::{
    Direction, GamePhase, GridCell, Position, RuntimeEvent, Snapshot, Vec2, WorldInit,
};
use crate::world::GridMap;

#[cfg(feature = "debug-tools")]
use crate::constants::{DEBUG_FAST_DELAY_MS, DEBUG_FRAME_OVERHEAD_MS, DEBUG_SLOW_DELAY_MS};
#[cfg(feature = "debug-tools")]
use crate::types::{DebugMode, DebugView};
#[cfg(feature = "debug-tools")]
use tokio_util::sync::CancellationToken;

mod pursuit;
mod spawn_system;
mod utils;

pub use self::pursuit::{is_alerted, next_step_direction, next_step_to_food, PathCache};
use self::utils::{grid_index, push_event};

#[cfg(feature = "debug-tools")]
#[derive(Clone, Debug)]
struct DebugState {
    mode: DebugMode,
    show_pursuer_range: bool,
    paused: bool,
    pause_token: Option<CancellationToken>,
}

#[cfg(feature = "debug-tools")]
impl DebugState {
    fn new() -> Self {
        Self {
            mode: DebugMode::Off,
            show_pursuer_range: false,
            paused: false,
            pause_token: None,
        }
    }

    fn clear_pause(&mut self) {
        if let Some(token) = self.pause_token.take() {
            token.cancel();
        }
        self.paused = false;
    }
}

/// One game: the maze, its entities and every timer driving them. Ticks are
/// applied either directly through [`GameEngine::step`] or gated by wall-clock
/// time through [`GameEngine::on_frame`].
#[derive(Debug)]
pub struct GameEngine {
    config: GameConfig,
    map: GridMap,
    waypoints: [Vec2; WANDER_WAYPOINT_COUNT],
    player: Player,
    pursuers: Vec<Pursuer>,

    rng: StdRng,
    scheduler: Scheduler,
    clock: FrameClock,
    path_cache: PathCache,
    events: Vec<RuntimeEvent>,

    phase: GamePhase,
    score: u32,
    lives: u32,
    max_score: u32,
    tick_counter: u64,
    now_ms: u64,

    #[cfg(feature = "debug-tools")]
    debug: DebugState,
}

impl GameEngine {
    pub fn new(config: GameConfig, now_ms: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let map = config.build_map()?;
        let waypoints = map.wander_waypoints();
        let max_score = map.count_food_cells() as u32;

        let mut engine = Self {
            player: Self::initial_player(&config),
            pursuers: Vec::new(),
            waypoints,
            rng: StdRng::seed_from_u64(u64::from(config.seed)),
            scheduler: Scheduler::new(),
            clock: FrameClock::new(tick_interval_ms(config.tick_rate), now_ms),
            path_cache: PathCache::new(config.cache_paths),
            events: Vec::new(),
            phase: GamePhase::Running,
            score: 0,
            lives: config.initial_lives,
            max_score,
            tick_counter: 0,
            now_ms,
            #[cfg(feature = "debug-tools")]
            debug: DebugState::new(),
            map,
            config,
        };
        engine.spawn_pursuers();
        engine.arm_timers();
        info!(
            width = engine.map.width(),
            height = engine.map.height(),
            food = max_score,
            pursuers = engine.pursuers.len(),
            seed = engine.config.seed,
            "game created"
        );
        Ok(engine)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives_remaining(&self) -> u32 {
        self.lives
    }

    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn pursuers(&self) -> &[Pursuer] {
        &self.pursuers
    }

    pub fn world_init(&self) -> WorldInit {
        self.map.to_world_init()
    }

    /// Queues a turn; the latest request wins and is retried every tick until
    /// the maze allows it.
    pub fn set_next_direction(&mut self, dir: Direction) {
        self.player.next_direction = dir;
    }

    /// Applies exactly one simulation tick. Does nothing once the game is over.
    ///
    /// Events raised by the tick wait for `build_snapshot(true)`. Callers that
    /// never drain them keep only the newest `MAX_PENDING_EVENTS`.
    pub fn step(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        self.tick_counter += 1;

        self.update_player();
        self.update_pursuers();
        self.resolve_captures();
        self.check_game_over();
    }

    /// Advances timers to `now_ms` and applies a tick when one is due.
    /// Returns whether a tick was applied.
    pub fn on_frame(&mut self, now_ms: u64) -> bool {
        self.now_ms = self.now_ms.max(now_ms);
        for task in self.scheduler.take_due(self.now_ms) {
            self.run_task(task);
        }

        if self.phase.is_terminal() || self.is_paused() {
            return false;
        }
        if !self.clock.is_due(self.now_ms) {
            return false;
        }
        self.clock.mark(self.now_ms);
        self.step();
        #[cfg(feature = "debug-tools")]
        self.schedule_debug_pause();
        true
    }

    /// Starts a new game on the same maze and configuration.
    pub fn reset(&mut self, now_ms: u64) {
        self.scheduler.cancel_all();
        #[cfg(feature = "debug-tools")]
        self.debug.clear_pause();

        self.now_ms = now_ms;
        self.map.reset();
        self.score = 0;
        self.lives = self.config.initial_lives;
        self.tick_counter = 0;
        self.clock = FrameClock::new(tick_interval_ms(self.config.tick_rate), now_ms);
        self.player = Self::initial_player(&self.config);
        self.spawn_pursuers();
        self.arm_timers();

        push_event(&mut self.events, RuntimeEvent::GameReset);
        if self.phase != GamePhase::Running {
            self.set_phase(GamePhase::Running);
        }
        info!(lives = self.lives, "game reset");
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        Snapshot {
            tick: self.tick_counter,
            phase: self.phase,
            score: self.score,
            max_score: self.max_score,
            lives_remaining: self.lives,
            player: self.player.view(),
            pursuers: self.pursuers.iter().map(Pursuer::view).collect(),
            #[cfg(feature = "debug-tools")]
            debug: Some(DebugView {
                mode: self.debug.mode,
                show_pursuer_range: self.debug.show_pursuer_range,
            }),
            #[cfg(not(feature = "debug-tools"))]
            debug: None,
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    /// Off, fast, slow, off. Leaving a debug mode drops any pending pause.
    #[cfg(feature = "debug-tools")]
    pub fn cycle_debug_mode(&mut self) -> DebugMode {
        self.debug.mode = self.debug.mode.next();
        if self.debug.mode == DebugMode::Off {
            self.debug.clear_pause();
        }
        tracing::debug!(mode = ?self.debug.mode, "debug mode changed");
        self.debug.mode
    }

    #[cfg(feature = "debug-tools")]
    pub fn toggle_pursuer_range(&mut self) -> bool {
        self.debug.show_pursuer_range = !self.debug.show_pursuer_range;
        self.debug.show_pursuer_range
    }

    #[cfg(feature = "debug-tools")]
    pub fn debug_mode(&self) -> DebugMode {
        self.debug.mode
    }

    /// True while a debug pause holds back the next tick.
    #[cfg(feature = "debug-tools")]
    pub fn is_paused(&self) -> bool {
        self.debug.paused
    }

    #[cfg(not(feature = "debug-tools"))]
    pub fn is_paused(&self) -> bool {
        false
    }

    fn run_task(&mut self, task: TaskKind) {
        match task {
            TaskKind::WanderRotation => self.rotate_wander_targets(),
            TaskKind::Animation => self.player.advance_animation(PLAYER_ANIMATION_FRAMES),
            TaskKind::DebugResume => {
                #[cfg(feature = "debug-tools")]
                {
                    self.debug.pause_token = None;
                    self.debug.paused = false;
                }
            }
        }
    }

    #[cfg(feature = "debug-tools")]
    fn schedule_debug_pause(&mut self) {
        let delay_ms = match self.debug.mode {
            DebugMode::Off => return,
            DebugMode::Fast => DEBUG_FAST_DELAY_MS,
            DebugMode::Slow => DEBUG_SLOW_DELAY_MS,
        };
        if self.phase.is_terminal() {
            return;
        }
        self.debug.clear_pause();
        let token = self.scheduler.token().child_token();
        self.scheduler.schedule_once_with(
            TaskKind::DebugResume,
            self.now_ms + delay_ms * 3 + DEBUG_FRAME_OVERHEAD_MS,
            token.clone(),
        );
        self.debug.pause_token = Some(token);
        self.debug.paused = true;
    }

    fn update_player(&mut self) {
        let desired = self.player.next_direction;
        step(&mut self.player, Some(desired), &self.map);

        let cell = self.player.grid_cell();
        let Some((row, col)) = grid_index(&self.map, cell) else {
            return;
        };
        if self.map.consume_food_at(row, col) {
            self.score += 1;
            let event = RuntimeEvent::FoodEaten {
                row,
                col,
                score: self.score,
            };
            push_event(&mut self.events, event);
        }
    }

    fn resolve_captures(&mut self) {
        let player_cell = self.player.grid_cell();
        let Some(captor) = self
            .pursuers
            .iter()
            .find(|pursuer| pursuer.grid_cell() == player_cell)
            .map(|pursuer| pursuer.id)
        else {
            return;
        };

        self.lives = self.lives.saturating_sub(1);
        info!(
            pursuer = captor,
            lives_remaining = self.lives,
            tick = self.tick_counter,
            "player captured"
        );
        let event = RuntimeEvent::PlayerCaptured {
            pursuer_id: captor,
            lives_remaining: self.lives,
        };
        push_event(&mut self.events, event);
        self.respawn_entities();
    }

    fn check_game_over(&mut self) {
        if self.lives == 0 {
            self.set_phase(GamePhase::Lost);
        } else if self.score >= self.max_score {
            self.set_phase(GamePhase::Won);
        }
    }

    fn set_phase(&mut self, phase: GamePhase) {
        self.phase = phase;
        info!(
            ?phase,
            score = self.score,
            lives_remaining = self.lives,
            tick = self.tick_counter,
            "phase changed"
        );
        push_event(&mut self.events, RuntimeEvent::PhaseChanged { phase });
        if phase.is_terminal() {
            self.scheduler.cancel_all();
            #[cfg(feature = "debug-tools")]
            self.debug.clear_pause();
        }
    }
}
