//! Global keyboard shortcuts while a trail is playing.

use std::convert::Infallible;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    ArrowRight,
    ArrowLeft,
    Enter,
    Escape,
    Other(String),
}

impl FromStr for Key {
    type Err = Infallible;

    /// Accepts DOM `KeyboardEvent.key` names and short aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "arrowright" | "right" => Key::ArrowRight,
            "arrowleft" | "left" => Key::ArrowLeft,
            "enter" | "return" => Key::Enter,
            "escape" | "esc" => Key::Escape,
            _ => Key::Other(s.trim().to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Next,
    Prev,
    Skip,
}

pub fn command_for(key: &Key) -> Option<KeyCommand> {
    match key {
        Key::ArrowRight | Key::Enter => Some(KeyCommand::Next),
        Key::ArrowLeft => Some(KeyCommand::Prev),
        Key::Escape => Some(KeyCommand::Skip),
        Key::Other(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!("ArrowRight".parse::<Key>().unwrap(), Key::ArrowRight);
        assert_eq!("esc".parse::<Key>().unwrap(), Key::Escape);
        assert_eq!("Tab".parse::<Key>().unwrap(), Key::Other("Tab".into()));
    }

    #[test]
    fn test_bindings() {
        assert_eq!(command_for(&Key::Enter), Some(KeyCommand::Next));
        assert_eq!(command_for(&Key::ArrowRight), Some(KeyCommand::Next));
        assert_eq!(command_for(&Key::ArrowLeft), Some(KeyCommand::Prev));
        assert_eq!(command_for(&Key::Escape), Some(KeyCommand::Skip));
        assert_eq!(command_for(&Key::Other("a".into())), None);
    }
}
