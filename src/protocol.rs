use serde_json::Value;

use crate::types::Direction;

/// Everything a front end can ask of a running game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Turn(Direction),
    Reset,
    CycleDebugMode,
    TogglePursuerRange,
}

/// Keyboard mapping: arrows and WASD steer.
pub fn direction_for_key(code: &str) -> Option<Direction> {
    match code {
        "ArrowUp" | "KeyW" => Some(Direction::Up),
        "ArrowDown" | "KeyS" => Some(Direction::Down),
        "ArrowLeft" | "KeyA" => Some(Direction::Left),
        "ArrowRight" | "KeyD" => Some(Direction::Right),
        _ => None,
    }
}

/// Parses one JSON command line. Unknown or malformed lines yield `None`.
pub fn parse_command(raw: &str) -> Option<Command> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "input" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(Command::Turn(dir))
        }
        "key" => {
            let dir = direction_for_key(object.get("code")?.as_str()?)?;
            Some(Command::Turn(dir))
        }
        "reset" => Some(Command::Reset),
        "debug" => Some(Command::CycleDebugMode),
        "ghost_range" => Some(Command::TogglePursuerRange),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_wasd_map_to_the_same_directions() {
        assert_eq!(direction_for_key("ArrowUp"), Some(Direction::Up));
        assert_eq!(direction_for_key("KeyW"), Some(Direction::Up));
        assert_eq!(direction_for_key("ArrowDown"), Some(Direction::Down));
        assert_eq!(direction_for_key("KeyS"), Some(Direction::Down));
        assert_eq!(direction_for_key("ArrowLeft"), Some(Direction::Left));
        assert_eq!(direction_for_key("KeyA"), Some(Direction::Left));
        assert_eq!(direction_for_key("ArrowRight"), Some(Direction::Right));
        assert_eq!(direction_for_key("KeyD"), Some(Direction::Right));
        assert_eq!(direction_for_key("Space"), None);
    }

    #[test]
    fn parse_input_and_control_commands() {
        assert_eq!(
            parse_command(r#"{"type":"input","dir":"up"}"#),
            Some(Command::Turn(Direction::Up))
        );
        assert_eq!(
            parse_command(r#"{"type":"key","code":"KeyA"}"#),
            Some(Command::Turn(Direction::Left))
        );
        assert_eq!(parse_command(r#"{"type":"reset"}"#), Some(Command::Reset));
        assert_eq!(
            parse_command(r#"{"type":"debug"}"#),
            Some(Command::CycleDebugMode)
        );
        assert_eq!(
            parse_command(r#"{"type":"ghost_range"}"#),
            Some(Command::TogglePursuerRange)
        );
    }

    #[test]
    fn reject_malformed_commands() {
        assert_eq!(parse_command("not json"), None);
        assert_eq!(parse_command(r#"["input"]"#), None);
        assert_eq!(parse_command(r#"{"type":"input"}"#), None);
        assert_eq!(parse_command(r#"{"type":"input","dir":"north"}"#), None);
        assert_eq!(parse_command(r#"{"type":"input","dir":1}"#), None);
        assert_eq!(parse_command(r#"{"type":"warp"}"#), None);
    }
}
