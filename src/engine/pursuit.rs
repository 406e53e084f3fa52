use std::collections::{HashMap, VecDeque};

use tracing::trace;

use super::utils::{euclidean, grid_index, push_event};
use super::*;

/// Neighbour expansion order. Ties between equally short paths resolve in
/// this order.
const SEARCH_ORDER: [Direction; 4] = [
    Direction::Left,
    Direction::Right,
    Direction::Up,
    Direction::Down,
];

/// First move of a shortest 4-neighbour path from `from` to `target`, or
/// `None` when the target is unreachable or already reached.
pub fn next_step_direction(map: &GridMap, from: Vec2, target: Vec2) -> Option<Direction> {
    first_step_towards(map, from, |cell| cell == target)
}

/// First move towards the closest remaining food cell.
pub fn next_step_to_food(map: &GridMap, from: Vec2) -> Option<Direction> {
    first_step_towards(map, from, |cell| {
        map.get(cell.x, cell.y) == Some(GridCell::Food)
    })
}

fn first_step_towards<F>(map: &GridMap, from: Vec2, is_goal: F) -> Option<Direction>
where
    F: Fn(Vec2) -> bool,
{
    let (start_row, start_col) = grid_index(map, from)?;
    if is_goal(from) {
        return None;
    }

    let width = map.width();
    let mut visited = vec![false; width * map.height()];
    visited[start_row * width + start_col] = true;
    let mut queue: VecDeque<(Vec2, Option<Direction>)> = VecDeque::new();
    queue.push_back((from, None));

    while let Some((cell, first)) = queue.pop_front() {
        if first.is_some() && is_goal(cell) {
            return first;
        }
        for dir in SEARCH_ORDER {
            let next = cell.offset(dir);
            let Some((row, col)) = grid_index(map, next) else {
                continue;
            };
            let index = row * width + col;
            if visited[index] || map.cell_at(row, col) == GridCell::Wall {
                continue;
            }
            visited[index] = true;
            queue.push_back((next, first.or(Some(dir))));
        }
    }
    None
}

pub fn is_alerted(pursuer_cell: Vec2, player_cell: Vec2, chase_range: u32) -> bool {
    euclidean(pursuer_cell, player_cell) <= chase_range as f64
}

/// Memoised `next_step_direction`. Entries stay valid for as long as the wall
/// layout does, which never changes during a game.
#[derive(Clone, Debug, Default)]
pub struct PathCache {
    enabled: bool,
    entries: HashMap<(Vec2, Vec2), Option<Direction>>,
}

impl PathCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: HashMap::new(),
        }
    }

    pub fn next_step(&mut self, map: &GridMap, from: Vec2, target: Vec2) -> Option<Direction> {
        if !self.enabled {
            return next_step_direction(map, from, target);
        }
        *self
            .entries
            .entry((from, target))
            .or_insert_with(|| next_step_direction(map, from, target))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GameEngine {
    pub(super) fn update_pursuers(&mut self) {
        let player_cell = self.player.grid_cell();
        for pursuer in &mut self.pursuers {
            let cell = pursuer.grid_cell();
            let alerted = is_alerted(cell, player_cell, pursuer.chase_range);
            if alerted != pursuer.alerted {
                pursuer.alerted = alerted;
                trace!(pursuer = pursuer.id, alerted, "pursuer alert changed");
                let event = if alerted {
                    RuntimeEvent::PursuerAlerted {
                        pursuer_id: pursuer.id,
                    }
                } else {
                    RuntimeEvent::PursuerCalmed {
                        pursuer_id: pursuer.id,
                    }
                };
                push_event(&mut self.events, event);
            }

            pursuer.target = if alerted {
                player_cell
            } else {
                self.waypoints[pursuer.wander_index % WANDER_WAYPOINT_COUNT]
            };
            let dir = self.path_cache.next_step(&self.map, cell, pursuer.target);
            step(pursuer, dir, &self.map);
        }
    }

    pub(super) fn rotate_wander_targets(&mut self) {
        for pursuer in &mut self.pursuers {
            pursuer.wander_index = (pursuer.wander_index + 1) % WANDER_WAYPOINT_COUNT;
        }
    }
}
