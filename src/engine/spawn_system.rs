use super::*;

impl GameEngine {
    pub(super) fn initial_player(config: &GameConfig) -> Player {
        Player {
            body: body_at(config.player_start, config.player_speed),
            next_direction: Direction::Right,
            animation_frame: 1,
        }
    }

    /// Replaces every pursuer with a fresh one at its start cell. Wander
    /// waypoints are drawn from the engine's seeded rng.
    pub(super) fn spawn_pursuers(&mut self) {
        let speed = pursuer_speed(self.config.player_speed);
        let starts = &self.config.pursuer_starts;
        let mut pursuers = Vec::with_capacity(self.config.pursuer_count);
        for id in 0..self.config.pursuer_count {
            let start = starts[id % starts.len()];
            let wander_index = self.rng.random_range(0..WANDER_WAYPOINT_COUNT);
            pursuers.push(Pursuer {
                id,
                body: body_at(start, speed),
                variant: id % PURSUER_VARIANTS,
                chase_range: pursuer_range(self.config.pursuer_range_base, id),
                wander_index,
                target: self.waypoints[wander_index],
                alerted: false,
            });
        }
        self.pursuers = pursuers;
    }

    /// After a capture: everyone back to the start, food left as it is, and the
    /// wander rotation restarted for the new pursuers.
    pub(super) fn respawn_entities(&mut self) {
        self.player = Self::initial_player(&self.config);
        self.spawn_pursuers();
        self.scheduler.cancel_kind(TaskKind::WanderRotation);
        self.scheduler.schedule_repeating(
            TaskKind::WanderRotation,
            self.now_ms + self.config.wander_period_ms,
            self.config.wander_period_ms,
        );
    }

    pub(super) fn arm_timers(&mut self) {
        let now_ms = self.now_ms;
        self.scheduler.schedule_repeating(
            TaskKind::WanderRotation,
            now_ms + self.config.wander_period_ms,
            self.config.wander_period_ms,
        );
        self.scheduler.schedule_repeating(
            TaskKind::Animation,
            now_ms + self.config.animation_period_ms,
            self.config.animation_period_ms,
        );
    }
}

fn body_at(cell: Vec2, speed: f32) -> Body {
    Body {
        position: Position::new(cell.x as f32 * BLOCK_SIZE, cell.y as f32 * BLOCK_SIZE),
        width: BLOCK_SIZE,
        height: BLOCK_SIZE,
        speed,
        direction: Direction::Right,
    }
}
