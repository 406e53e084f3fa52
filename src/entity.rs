use crate::movement::Moveable;
use crate::types::{Direction, PlayerView, Position, PursuerView, Vec2};

#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub position: Position,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub direction: Direction,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub body: Body,
    pub next_direction: Direction,
    pub animation_frame: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pursuer {
    pub id: usize,
    pub body: Body,
    pub variant: usize,
    pub chase_range: u32,
    pub wander_index: usize,
    pub target: Vec2,
    pub alerted: bool,
}

macro_rules! impl_moveable {
    ($ty:ty) => {
        impl Moveable for $ty {
            fn position(&self) -> Position {
                self.body.position
            }

            fn position_mut(&mut self) -> &mut Position {
                &mut self.body.position
            }

            fn size(&self) -> (f32, f32) {
                (self.body.width, self.body.height)
            }

            fn speed(&self) -> f32 {
                self.body.speed
            }

            fn direction(&self) -> Direction {
                self.body.direction
            }

            fn set_direction(&mut self, dir: Direction) {
                self.body.direction = dir;
            }
        }
    };
}

impl_moveable!(Player);
impl_moveable!(Pursuer);

impl Player {
    pub fn view(&self) -> PlayerView {
        PlayerView {
            x: self.body.position.x,
            y: self.body.position.y,
            width: self.body.width,
            height: self.body.height,
            dir: self.body.direction,
            next_dir: self.next_direction,
            animation_frame: self.animation_frame,
        }
    }

    pub fn advance_animation(&mut self, frame_count: u8) {
        self.animation_frame = if self.animation_frame >= frame_count {
            1
        } else {
            self.animation_frame + 1
        };
    }
}

impl Pursuer {
    pub fn view(&self) -> PursuerView {
        PursuerView {
            id: self.id,
            x: self.body.position.x,
            y: self.body.position.y,
            width: self.body.width,
            height: self.body.height,
            dir: self.body.direction,
            variant: self.variant,
            chase_range: self.chase_range,
            alerted: self.alerted,
            target: self.target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animation_wraps_after_last_frame() {
        let mut player = Player {
            body: Body {
                position: Position::new(20.0, 20.0),
                width: 20.0,
                height: 20.0,
                speed: 4.0,
                direction: Direction::Right,
            },
            next_direction: Direction::Right,
            animation_frame: 6,
        };
        player.advance_animation(7);
        assert_eq!(player.animation_frame, 7);
        player.advance_animation(7);
        assert_eq!(player.animation_frame, 1);
    }
}
