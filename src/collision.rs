use crate::constants::{BLOCK_SIZE, COLLISION_EPSILON};
use crate::types::{GridCell, Vec2};
use crate::world::GridMap;

pub fn grid_coordinate(coordinate: f32) -> i32 {
    (coordinate / BLOCK_SIZE).floor() as i32
}

pub fn grid_cell_of(x: f32, y: f32) -> Vec2 {
    Vec2::new(grid_coordinate(x), grid_coordinate(y))
}

/// Samples the four corners of the box, with the far edges pulled in by
/// `COLLISION_EPSILON` so a box flush against a cell boundary does not touch
/// the neighbouring cell. Points outside the grid count as wall.
pub fn overlaps_wall(map: &GridMap, x: f32, y: f32, width: f32, height: f32) -> bool {
    let far_x = x + width * COLLISION_EPSILON;
    let far_y = y + height * COLLISION_EPSILON;
    [(x, y), (x, far_y), (far_x, y), (far_x, far_y)]
        .into_iter()
        .any(|(px, py)| is_wall_at(map, px, py))
}

fn is_wall_at(map: &GridMap, x: f32, y: f32) -> bool {
    let cell = grid_cell_of(x, y);
    !matches!(
        map.get(cell.x, cell.y),
        Some(GridCell::Empty | GridCell::Food)
    )
}
