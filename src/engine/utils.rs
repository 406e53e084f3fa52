use tracing::debug;

use crate::constants::MAX_PENDING_EVENTS;
use crate::types::{RuntimeEvent, Vec2};
use crate::world::GridMap;

/// Straight-line distance between two cells, in cells.
pub(super) fn euclidean(a: Vec2, b: Vec2) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// `(row, col)` of `cell` when it lies inside the grid.
pub(super) fn grid_index(map: &GridMap, cell: Vec2) -> Option<(usize, usize)> {
    if cell.x < 0 || cell.y < 0 {
        return None;
    }
    let (row, col) = (cell.y as usize, cell.x as usize);
    (row < map.height() && col < map.width()).then_some((row, col))
}

/// Queues `event` for the next draining snapshot, dropping the oldest ones
/// once `MAX_PENDING_EVENTS` are waiting.
pub(super) fn push_event(events: &mut Vec<RuntimeEvent>, event: RuntimeEvent) {
    if events.len() >= MAX_PENDING_EVENTS {
        let dropped = events.len() + 1 - MAX_PENDING_EVENTS;
        events.drain(..dropped);
        debug!(dropped, "event queue full");
    }
    events.push(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_uses_both_axes() {
        assert_eq!(euclidean(Vec2::new(0, 0), Vec2::new(3, 4)), 5.0);
        assert_eq!(euclidean(Vec2::new(2, 2), Vec2::new(2, 2)), 0.0);
    }

    #[test]
    fn grid_index_rejects_cells_outside_the_map() {
        let map = GridMap::parse(&["...", "..."]).expect("valid map");
        assert_eq!(grid_index(&map, Vec2::new(2, 1)), Some((1, 2)));
        assert_eq!(grid_index(&map, Vec2::new(3, 1)), None);
        assert_eq!(grid_index(&map, Vec2::new(0, 2)), None);
        assert_eq!(grid_index(&map, Vec2::new(-1, 0)), None);
    }

    #[test]
    fn push_event_keeps_only_the_newest_events() {
        let mut events = Vec::new();
        for score in 0..MAX_PENDING_EVENTS as u32 + 10 {
            let event = RuntimeEvent::FoodEaten {
                row: 0,
                col: 0,
                score,
            };
            push_event(&mut events, event);
        }
        assert_eq!(events.len(), MAX_PENDING_EVENTS);
        let RuntimeEvent::FoodEaten { score, .. } = events[0] else {
            panic!("expected a food event, got {:?}", events[0]);
        };
        assert_eq!(score, 10);
    }
}
