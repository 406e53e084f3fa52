pub const BLOCK_SIZE: f32 = 20.0;
pub const COLLISION_EPSILON: f32 = 0.9999;

pub const TICK_RATE: u32 = 35;
pub const INITIAL_LIVES: u32 = 3;

pub const PLAYER_SPEED: f32 = BLOCK_SIZE / 5.0;
pub const PLAYER_ANIMATION_FRAMES: u8 = 7;
pub const ANIMATION_PERIOD_MS: u64 = 100;

pub const PURSUER_COUNT: usize = 8;
pub const PURSUER_RANGE_BASE: u32 = 6;
pub const PURSUER_VARIANTS: usize = 4;
pub const WANDER_PERIOD_MS: u64 = 10_000;
pub const WANDER_WAYPOINT_COUNT: usize = 4;

pub const DEBUG_FAST_DELAY_MS: u64 = 50;
pub const DEBUG_SLOW_DELAY_MS: u64 = 1_500;
/// Extra pause the debug view holds after drawing entities and the HUD.
/// Per-wall redraw delays are left out; the pause does not grow with the maze.
pub const DEBUG_FRAME_OVERHEAD_MS: u64 = 4_000;

pub const MAX_PURSUERS: usize = 64;
/// Undrained events kept by the engine; older ones are dropped past this.
pub const MAX_PENDING_EVENTS: usize = 1_024;

pub fn tick_interval_ms(tick_rate: u32) -> f64 {
    1000.0 / tick_rate.max(1) as f64
}

pub fn pursuer_speed(player_speed: f32) -> f32 {
    player_speed / 2.0
}

pub fn pursuer_range(base: u32, index: usize) -> u32 {
    base + index as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_tick_interval_is_just_under_29ms() {
        let interval = tick_interval_ms(TICK_RATE);
        assert!(interval > 28.5 && interval < 28.6);
    }

    #[test]
    fn zero_tick_rate_does_not_divide_by_zero() {
        assert_eq!(tick_interval_ms(0), 1000.0);
    }

    #[test]
    fn pursuers_move_at_half_player_speed() {
        assert_eq!(pursuer_speed(PLAYER_SPEED), 2.0);
        assert_eq!(pursuer_range(PURSUER_RANGE_BASE, 3), 9);
    }
}
