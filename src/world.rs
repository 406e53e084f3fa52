use crate::constants::{BLOCK_SIZE, WANDER_WAYPOINT_COUNT};
use crate::error::MapError;
use crate::types::{CellView, GridCell, Vec2, WorldInit};

/// Authored maze: `#` wall, `.` food, ` ` empty.
pub const REFERENCE_LAYOUT: [&str; 23] = [
    "#####################",
    "#.........#.........#",
    "#.###.###.#.###.###.#",
    "#.###.###.#.###.###.#",
    "#...................#",
    "#.###.#.#####.#.###.#",
    "#.....#...#...#.....#",
    "#####.###.#.###.#####",
    "    #.#.......#.#    ",
    "#####.#.## ##.#.#####",
    "#.......#   #.......#",
    "#####.#.#   #.#.#####",
    "    #.#.#####.#.#    ",
    "    #.#.......#.#    ",
    "#####...#####...#####",
    "#.........#.........#",
    "#.###.###.#.###.###.#",
    "#...#.....#.....#...#",
    "##..#.#.#####.#.#..##",
    "#.....#...#...#.....#",
    "#.#######.#.#######.#",
    "#...................#",
    "#####################",
];

#[derive(Clone, Debug)]
pub struct GridMap {
    width: usize,
    height: usize,
    initial: Vec<Vec<GridCell>>,
    cells: Vec<Vec<GridCell>>,
    food_total: usize,
}

impl GridMap {
    pub fn reference() -> Self {
        // The authored layout is a compile-time constant and always parses.
        match Self::parse(&REFERENCE_LAYOUT) {
            Ok(map) => map,
            Err(error) => panic!("reference layout is invalid: {error}"),
        }
    }

    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, MapError> {
        let Some(first) = rows.first() else {
            return Err(MapError::Empty);
        };
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(MapError::Empty);
        }

        let mut initial = Vec::with_capacity(rows.len());
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(MapError::Ragged {
                    row,
                    expected: width,
                    found,
                });
            }
            let mut cells = Vec::with_capacity(width);
            for (col, glyph) in line.chars().enumerate() {
                let cell = match glyph {
                    '#' => GridCell::Wall,
                    '.' => GridCell::Food,
                    ' ' => GridCell::Empty,
                    _ => return Err(MapError::UnknownGlyph { row, col, glyph }),
                };
                cells.push(cell);
            }
            initial.push(cells);
        }

        let food_total = count_food(&initial);
        Ok(Self {
            width,
            height: initial.len(),
            cells: initial.clone(),
            initial,
            food_total,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Panics when `(row, col)` lies outside the grid; callers bounds-check first.
    pub fn cell_at(&self, row: usize, col: usize) -> GridCell {
        assert!(
            row < self.height && col < self.width,
            "grid lookup out of range: row={row}, col={col}"
        );
        self.cells[row][col]
    }

    pub fn get(&self, x: i32, y: i32) -> Option<GridCell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.cells
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
    }

    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        matches!(self.get(x, y), Some(cell) if cell != GridCell::Wall)
    }

    pub fn consume_food_at(&mut self, row: usize, col: usize) -> bool {
        if self.cell_at(row, col) != GridCell::Food {
            return false;
        }
        self.cells[row][col] = GridCell::Empty;
        true
    }

    /// Food count of the authored layout, i.e. the win threshold.
    pub fn count_food_cells(&self) -> usize {
        self.food_total
    }

    pub fn remaining_food(&self) -> usize {
        count_food(&self.cells)
    }

    pub fn reset(&mut self) {
        self.cells = self.initial.clone();
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, GridCell)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, line)| {
            line.iter()
                .enumerate()
                .map(move |(col, cell)| (row, col, *cell))
        })
    }

    /// Corner cells pursuers roam between when they are not chasing.
    pub fn wander_waypoints(&self) -> [Vec2; WANDER_WAYPOINT_COUNT] {
        let far_x = self.width as i32 - 2;
        let far_y = self.height as i32 - 2;
        [
            Vec2::new(1, 1),
            Vec2::new(1, far_y),
            Vec2::new(far_x, 1),
            Vec2::new(far_x, far_y),
        ]
    }

    pub fn to_world_init(&self) -> WorldInit {
        WorldInit {
            width: self.width,
            height: self.height,
            block_size: BLOCK_SIZE,
            cells: self
                .cells()
                .map(|(row, col, cell)| CellView { row, col, cell })
                .collect(),
        }
    }
}

fn count_food(cells: &[Vec<GridCell>]) -> usize {
    cells
        .iter()
        .flat_map(|row| row.iter())
        .filter(|cell| **cell == GridCell::Food)
        .count()
}
