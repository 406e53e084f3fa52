use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn rotate_cw(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
        }
    }

    pub fn rotate_ccw(self) -> Self {
        self.rotate_cw().opposite()
    }

    /// Quarter turns clockwise from Right, used by renderers to rotate sprites.
    pub fn quarter_turns(self) -> u8 {
        match self {
            Self::Right => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Up => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GridCell {
    Empty,
    Wall,
    Food,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Running,
    Lost,
    Won,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        self != Self::Running
    }
}

/// Grid coordinate: `x` is the column, `y` the row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dir: Direction) -> Self {
        match dir {
            Direction::Up => Self::new(self.x, self.y - 1),
            Direction::Down => Self::new(self.x, self.y + 1),
            Direction::Left => Self::new(self.x - 1, self.y),
            Direction::Right => Self::new(self.x + 1, self.y),
        }
    }
}

/// Continuous position in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugMode {
    Off,
    Fast,
    Slow,
}

impl DebugMode {
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::Fast,
            Self::Fast => Self::Slow,
            Self::Slow => Self::Off,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub dir: Direction,
    #[serde(rename = "nextDir")]
    pub next_dir: Direction,
    #[serde(rename = "animationFrame")]
    pub animation_frame: u8,
}

#[derive(Clone, Debug, Serialize)]
pub struct PursuerView {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub dir: Direction,
    pub variant: usize,
    #[serde(rename = "chaseRange")]
    pub chase_range: u32,
    pub alerted: bool,
    pub target: Vec2,
}

#[derive(Clone, Debug, Serialize)]
pub struct CellView {
    pub row: usize,
    pub col: usize,
    pub cell: GridCell,
}

#[derive(Clone, Debug, Serialize)]
pub struct WorldInit {
    pub width: usize,
    pub height: usize,
    #[serde(rename = "blockSize")]
    pub block_size: f32,
    pub cells: Vec<CellView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugView {
    pub mode: DebugMode,
    #[serde(rename = "showPursuerRange")]
    pub show_pursuer_range: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    FoodEaten {
        row: usize,
        col: usize,
        score: u32,
    },
    PlayerCaptured {
        #[serde(rename = "pursuerId")]
        pursuer_id: usize,
        #[serde(rename = "livesRemaining")]
        lives_remaining: u32,
    },
    PursuerAlerted {
        #[serde(rename = "pursuerId")]
        pursuer_id: usize,
    },
    PursuerCalmed {
        #[serde(rename = "pursuerId")]
        pursuer_id: usize,
    },
    PhaseChanged {
        phase: GamePhase,
    },
    GameReset,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub score: u32,
    #[serde(rename = "maxScore")]
    pub max_score: u32,
    #[serde(rename = "livesRemaining")]
    pub lives_remaining: u32,
    pub player: PlayerView,
    pub pursuers: Vec<PursuerView>,
    pub debug: Option<DebugView>,
    pub events: Vec<RuntimeEvent>,
}
