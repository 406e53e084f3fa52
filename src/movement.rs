use crate::collision::{grid_cell_of, overlaps_wall};
use crate::types::{Direction, Position, Vec2};
use crate::world::GridMap;

/// Anything that travels through the maze at a fixed speed along one of the
/// four directions. Player and pursuers share the same movement rules.
pub trait Moveable {
    fn position(&self) -> Position;
    fn position_mut(&mut self) -> &mut Position;
    fn size(&self) -> (f32, f32);
    fn speed(&self) -> f32;
    fn direction(&self) -> Direction;
    fn set_direction(&mut self, dir: Direction);

    fn advance(&mut self) {
        displace(self, 1.0);
    }

    /// Undo of `advance`: moves back by one step against the current direction.
    fn retreat(&mut self) {
        displace(self, -1.0);
    }

    fn grid_cell(&self) -> Vec2 {
        let position = self.position();
        grid_cell_of(position.x, position.y)
    }

    fn overlaps_wall(&self, map: &GridMap) -> bool {
        let position = self.position();
        let (width, height) = self.size();
        overlaps_wall(map, position.x, position.y, width, height)
    }
}

fn displace<M: Moveable + ?Sized>(entity: &mut M, sign: f32) {
    let step = entity.speed() * sign;
    let dir = entity.direction();
    let position = entity.position_mut();
    match dir {
        Direction::Right => position.x += step,
        Direction::Left => position.x -= step,
        Direction::Up => position.y -= step,
        Direction::Down => position.y += step,
    }
}

/// Tries `desired` by probing one step ahead. Only the heading is committed;
/// the position always ends where it started. Returns whether the heading
/// changed.
pub fn attempt_direction_change<M: Moveable + ?Sized>(
    entity: &mut M,
    desired: Direction,
    map: &GridMap,
) -> bool {
    let previous = entity.direction();
    if previous == desired {
        return false;
    }
    entity.set_direction(desired);
    entity.advance();
    let blocked = entity.overlaps_wall(map);
    entity.retreat();
    if blocked {
        entity.set_direction(previous);
        return false;
    }
    true
}

/// One tick of motion: probe the turn, commit a step forward, and undo the
/// step if it ran into a wall. Returns whether the entity moved.
pub fn step<M: Moveable + ?Sized>(
    entity: &mut M,
    desired: Option<Direction>,
    map: &GridMap,
) -> bool {
    if let Some(desired) = desired {
        attempt_direction_change(entity, desired, map);
    }
    entity.advance();
    if entity.overlaps_wall(map) {
        entity.retreat();
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BLOCK_SIZE;

    #[derive(Debug)]
    struct Probe {
        position: Position,
        dir: Direction,
        speed: f32,
    }

    impl Moveable for Probe {
        fn position(&self) -> Position {
            self.position
        }

        fn position_mut(&mut self) -> &mut Position {
            &mut self.position
        }

        fn size(&self) -> (f32, f32) {
            (BLOCK_SIZE, BLOCK_SIZE)
        }

        fn speed(&self) -> f32 {
            self.speed
        }

        fn direction(&self) -> Direction {
            self.dir
        }

        fn set_direction(&mut self, dir: Direction) {
            self.dir = dir;
        }
    }

    fn corridor() -> GridMap {
        GridMap::parse(&["#######", "#.....#", "###.###", "#######"]).expect("valid map")
    }

    fn probe(x: f32, y: f32, dir: Direction) -> Probe {
        Probe {
            position: Position::new(x, y),
            dir,
            speed: 4.0,
        }
    }

    #[test]
    fn advance_and_retreat_are_inverse_in_every_direction() {
        for dir in Direction::ALL {
            let mut entity = probe(40.0, 20.0, dir);
            entity.advance();
            assert_ne!(entity.position(), Position::new(40.0, 20.0));
            entity.retreat();
            assert_eq!(entity.position(), Position::new(40.0, 20.0));
        }
    }

    #[test]
    fn advance_uses_screen_axes() {
        let mut entity = probe(40.0, 40.0, Direction::Up);
        entity.advance();
        assert_eq!(entity.position(), Position::new(40.0, 36.0));
        entity.set_direction(Direction::Right);
        entity.advance();
        assert_eq!(entity.position(), Position::new(44.0, 36.0));
    }

    #[test]
    fn same_direction_request_is_a_no_op() {
        let map = corridor();
        let mut entity = probe(40.0, 20.0, Direction::Right);
        let turned = attempt_direction_change(&mut entity, Direction::Right, &map);
        assert!(!turned);
        assert_eq!(entity.position(), Position::new(40.0, 20.0));
        assert_eq!(entity.direction(), Direction::Right);
    }

    #[test]
    fn blocked_turn_is_rejected_without_moving() {
        let map = corridor();
        let mut entity = probe(40.0, 20.0, Direction::Right);
        assert!(!attempt_direction_change(&mut entity, Direction::Up, &map));
        assert_eq!(entity.direction(), Direction::Right);
        assert_eq!(entity.position(), Position::new(40.0, 20.0));
    }

    #[test]
    fn feasible_turn_commits_heading_but_not_position() {
        let map = corridor();
        let mut entity = probe(60.0, 20.0, Direction::Right);
        assert!(attempt_direction_change(&mut entity, Direction::Down, &map));
        assert_eq!(entity.direction(), Direction::Down);
        assert_eq!(entity.position(), Position::new(60.0, 20.0));
    }

    #[test]
    fn misaligned_turn_into_side_passage_is_rejected() {
        let map = corridor();
        let mut entity = probe(56.0, 20.0, Direction::Right);
        let turned = attempt_direction_change(&mut entity, Direction::Down, &map);
        assert!(!turned);
        assert_eq!(entity.direction(), Direction::Right);
    }

    #[test]
    fn step_into_wall_is_undone() {
        let map = corridor();
        let mut entity = probe(100.0, 20.0, Direction::Right);
        assert!(!step(&mut entity, None, &map));
        assert_eq!(entity.position(), Position::new(100.0, 20.0));
    }

    #[test]
    fn step_turns_then_moves() {
        let map = corridor();
        let mut entity = probe(60.0, 20.0, Direction::Left);
        assert!(step(&mut entity, Some(Direction::Down), &map));
        assert_eq!(entity.direction(), Direction::Down);
        assert_eq!(entity.position(), Position::new(60.0, 24.0));
    }

    #[test]
    fn accepted_turn_survives_a_blocked_forward_step() {
        // Once the accepted heading runs into the wall, the step is undone
        // and the heading stays.
        let map = GridMap::parse(&["#####", "#...#", "#####"]).expect("valid map");
        let mut entity = probe(22.0, 20.0, Direction::Right);
        entity.speed = 2.0;
        assert!(step(&mut entity, Some(Direction::Left), &map));
        assert_eq!(entity.direction(), Direction::Left);
        assert_eq!(entity.position(), Position::new(20.0, 20.0));
        assert!(!step(&mut entity, Some(Direction::Left), &map));
        assert_eq!(entity.direction(), Direction::Left);
        assert_eq!(entity.position(), Position::new(20.0, 20.0));
    }
}
