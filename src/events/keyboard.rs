use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a synthesized key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
}

impl KeyState {
    /// evdev `EV_KEY` value for this phase
    pub fn value(self) -> i32 {
        match self {
            KeyState::Pressed => 1,
            KeyState::Released => 0,
        }
    }
}

/// Key code (evdev codes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub const fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KEY_{}", self.0)
    }
}

/// Modifier flags carried by a synthesized event.
///
/// Only shift is ever synthesized; the flag mirrors what the receiving side
/// should see as held while the character key goes down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { shift: false };
    pub const SHIFT: Modifiers = Modifiers { shift: true };

    pub fn is_empty(&self) -> bool {
        !self.shift
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shift {
            write!(f, "shift")
        } else {
            write!(f, "none")
        }
    }
}

/// What a synthesized event carries: a physical key or a raw code point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPayload {
    Key(KeyCode),
    Unicode(char),
}

impl fmt::Display for KeyPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPayload::Key(code) => write!(f, "{}", code),
            KeyPayload::Unicode(ch) => write!(f, "U+{:04X}", u32::from(*ch)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state_values() {
        assert_eq!(KeyState::Pressed.value(), 1);
        assert_eq!(KeyState::Released.value(), 0);
    }

    #[test]
    fn test_modifiers_display() {
        assert_eq!(Modifiers::SHIFT.to_string(), "shift");
        assert_eq!(Modifiers::NONE.to_string(), "none");
        assert!(Modifiers::default().is_empty());
    }

    #[test]
    fn test_payload_display() {
        assert_eq!(KeyPayload::Key(KeyCode::new(30)).to_string(), "KEY_30");
        assert_eq!(KeyPayload::Unicode('中').to_string(), "U+4E2D");
        assert_eq!(KeyPayload::Unicode('é').to_string(), "U+00E9");
    }
}
