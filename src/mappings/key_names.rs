//! Key names accepted in the configuration (trigger keys, shift key) and
//! their evdev codes.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Name/code pairs. The first name listed for a code is the canonical one.
const KEY_NAMES: &[(&str, u16)] = &[
    // Function keys
    ("f1", 59),   // KEY_F1
    ("f2", 60),   // KEY_F2
    ("f3", 61),   // KEY_F3
    ("f4", 62),   // KEY_F4
    ("f5", 63),   // KEY_F5
    ("f6", 64),   // KEY_F6
    ("f7", 65),   // KEY_F7
    ("f8", 66),   // KEY_F8
    ("f9", 67),   // KEY_F9
    ("f10", 68),  // KEY_F10
    ("f11", 87),  // KEY_F11
    ("f12", 88),  // KEY_F12
    ("f13", 183), // KEY_F13
    ("f14", 184), // KEY_F14
    ("f15", 185), // KEY_F15
    ("f16", 186), // KEY_F16
    ("f17", 187), // KEY_F17
    ("f18", 188), // KEY_F18
    ("f19", 189), // KEY_F19
    ("f20", 190), // KEY_F20
    // Editing / navigation
    ("escape", 1),       // KEY_ESC
    ("esc", 1),
    ("backspace", 14),   // KEY_BACKSPACE
    ("tab", 15),         // KEY_TAB
    ("enter", 28),       // KEY_ENTER
    ("return", 28),
    ("space", 57),       // KEY_SPACE
    ("insert", 110),     // KEY_INSERT
    ("delete", 111),     // KEY_DELETE
    ("home", 102),       // KEY_HOME
    ("end", 107),        // KEY_END
    ("pageup", 104),     // KEY_PAGEUP
    ("pagedown", 109),   // KEY_PAGEDOWN
    ("up", 103),         // KEY_UP
    ("down", 108),       // KEY_DOWN
    ("left", 105),       // KEY_LEFT
    ("right", 106),      // KEY_RIGHT
    // System
    ("printscreen", 99), // KEY_SYSRQ
    ("scrolllock", 70),  // KEY_SCROLLLOCK
    ("pause", 119),      // KEY_PAUSE
    // Modifiers
    ("left_shift", 42),  // KEY_LEFTSHIFT
    ("shift", 42),
    ("right_shift", 54), // KEY_RIGHTSHIFT
    ("left_ctrl", 29),   // KEY_LEFTCTRL
    ("ctrl", 29),
    ("right_ctrl", 97),  // KEY_RIGHTCTRL
    ("left_alt", 56),    // KEY_LEFTALT
    ("alt", 56),
    ("right_alt", 100),  // KEY_RIGHTALT
    ("left_super", 125), // KEY_LEFTMETA
    ("super", 125),
    ("right_super", 126), // KEY_RIGHTMETA
];

static NAME_TO_CODE: Lazy<HashMap<&'static str, u16>> =
    Lazy::new(|| KEY_NAMES.iter().copied().collect());

static CODE_TO_NAME: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for &(name, code) in KEY_NAMES {
        map.entry(code).or_insert(name);
    }
    map
});

pub struct KeyNames;

impl KeyNames {
    /// evdev code for a configured key name (case-insensitive)
    pub fn translate(key_name: &str) -> Result<u16, String> {
        let normalized = key_name.trim().to_lowercase().replace('-', "_");
        NAME_TO_CODE
            .get(normalized.as_str())
            .copied()
            .ok_or_else(|| format!("Unknown key: {}", key_name))
    }

    /// Canonical name of an evdev code, if it is one we know by name
    pub fn reverse_translate(code: u16) -> Option<&'static str> {
        CODE_TO_NAME.get(&code).copied()
    }

    pub fn is_shift(code: u16) -> bool {
        matches!(code, 42 | 54)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_keys() {
        assert_eq!(KeyNames::translate("f10").unwrap(), 68);
        assert_eq!(KeyNames::translate("F12").unwrap(), 88);
        assert_eq!(KeyNames::translate(" pause ").unwrap(), 119);
    }

    #[test]
    fn test_shift_aliases() {
        assert_eq!(KeyNames::translate("left_shift").unwrap(), 42);
        assert_eq!(KeyNames::translate("left-shift").unwrap(), 42);
        assert_eq!(KeyNames::translate("shift").unwrap(), 42);
        assert_eq!(KeyNames::translate("right_shift").unwrap(), 54);
        assert!(KeyNames::is_shift(54));
        assert!(!KeyNames::is_shift(29));
    }

    #[test]
    fn test_reverse_uses_canonical_name() {
        assert_eq!(KeyNames::reverse_translate(42), Some("left_shift"));
        assert_eq!(KeyNames::reverse_translate(1), Some("escape"));
        assert_eq!(KeyNames::reverse_translate(68), Some("f10"));
        assert_eq!(KeyNames::reverse_translate(30), None);
    }

    #[test]
    fn test_unknown_key() {
        assert!(KeyNames::translate("hyper").is_err());
    }
}
