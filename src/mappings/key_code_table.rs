//! Character → physical key translation for a US QWERTY layout.
//!
//! The table is built at compile time and indexed by ASCII byte, so a lookup
//! is a bounds check and an array read. Adding a character means editing
//! [`build_table`]; there is no runtime registration.

use crate::events::KeyCode;

/// Physical key plus whether shift must be held to produce the character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyMapping {
    pub key_code: KeyCode,
    pub needs_shift: bool,
}

impl KeyMapping {
    const fn plain(code: u16) -> Option<Self> {
        Some(Self { key_code: KeyCode::new(code), needs_shift: false })
    }

    const fn shifted(code: u16) -> Option<Self> {
        Some(Self { key_code: KeyCode::new(code), needs_shift: true })
    }
}

/// KEY_ENTER, used for both `\n` and `\r`
pub const COMMIT_KEY: KeyCode = KeyCode::new(28);
pub const LEFT_SHIFT: KeyCode = KeyCode::new(42);
pub const RIGHT_SHIFT: KeyCode = KeyCode::new(54);

/// evdev codes for a..z in alphabetical order
const LETTER_CODES: [u16; 26] = [
    30, 48, 46, 32, 18, 33, 34, 35, 23, 36, 37, 38, 50, // a..m
    49, 24, 25, 16, 19, 31, 20, 22, 47, 17, 45, 21, 44, // n..z
];

/// evdev codes for the top row digits 1..9 then 0
const DIGIT_ROW: [u16; 10] = [2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

const TABLE_SIZE: usize = 128;

static TABLE: [Option<KeyMapping>; TABLE_SIZE] = build_table();

const fn build_table() -> [Option<KeyMapping>; TABLE_SIZE] {
    let mut t: [Option<KeyMapping>; TABLE_SIZE] = [None; TABLE_SIZE];

    let mut i = 0;
    while i < 26 {
        t[(b'a' + i as u8) as usize] = KeyMapping::plain(LETTER_CODES[i]);
        t[(b'A' + i as u8) as usize] = KeyMapping::shifted(LETTER_CODES[i]);
        i += 1;
    }

    // '1'..'9' then '0', and the symbols printed above them
    let shifted_digits = *b"!@#$%^&*()";
    let digits = *b"1234567890";
    let mut i = 0;
    while i < 10 {
        t[digits[i] as usize] = KeyMapping::plain(DIGIT_ROW[i]);
        t[shifted_digits[i] as usize] = KeyMapping::shifted(DIGIT_ROW[i]);
        i += 1;
    }

    t[b'-' as usize] = KeyMapping::plain(12); // KEY_MINUS
    t[b'_' as usize] = KeyMapping::shifted(12);
    t[b'=' as usize] = KeyMapping::plain(13); // KEY_EQUAL
    t[b'+' as usize] = KeyMapping::shifted(13);
    t[b'[' as usize] = KeyMapping::plain(26); // KEY_LEFTBRACE
    t[b'{' as usize] = KeyMapping::shifted(26);
    t[b']' as usize] = KeyMapping::plain(27); // KEY_RIGHTBRACE
    t[b'}' as usize] = KeyMapping::shifted(27);
    t[b'\\' as usize] = KeyMapping::plain(43); // KEY_BACKSLASH
    t[b'|' as usize] = KeyMapping::shifted(43);
    t[b';' as usize] = KeyMapping::plain(39); // KEY_SEMICOLON
    t[b':' as usize] = KeyMapping::shifted(39);
    t[b'\'' as usize] = KeyMapping::plain(40); // KEY_APOSTROPHE
    t[b'"' as usize] = KeyMapping::shifted(40);
    t[b'`' as usize] = KeyMapping::plain(41); // KEY_GRAVE
    t[b'~' as usize] = KeyMapping::shifted(41);
    t[b',' as usize] = KeyMapping::plain(51); // KEY_COMMA
    t[b'<' as usize] = KeyMapping::shifted(51);
    t[b'.' as usize] = KeyMapping::plain(52); // KEY_DOT
    t[b'>' as usize] = KeyMapping::shifted(52);
    t[b'/' as usize] = KeyMapping::plain(53); // KEY_SLASH
    t[b'?' as usize] = KeyMapping::shifted(53);

    t[b' ' as usize] = KeyMapping::plain(57); // KEY_SPACE
    t[b'\t' as usize] = KeyMapping::plain(15); // KEY_TAB
    t[b'\n' as usize] = KeyMapping::plain(COMMIT_KEY.value());
    t[b'\r' as usize] = KeyMapping::plain(COMMIT_KEY.value());

    t
}

pub struct KeyCodeTable;

impl KeyCodeTable {
    /// Key and shift state for `ch`, or `None` when it has no key on the
    /// layout and must go through raw-Unicode injection.
    pub fn resolve(ch: char) -> Option<KeyMapping> {
        let index = ch as usize;
        if index < TABLE_SIZE {
            TABLE[index]
        } else {
            None
        }
    }

    /// Line breaks always commit, whatever path the rest of the text takes.
    pub fn is_commit(ch: char) -> bool {
        matches!(ch, '\n' | '\r')
    }

    pub fn commit_key() -> KeyCode {
        COMMIT_KEY
    }

    /// All characters that resolve to a key
    pub fn covered() -> impl Iterator<Item = char> {
        (0u8..TABLE_SIZE as u8)
            .filter(|&b| TABLE[b as usize].is_some())
            .map(char::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_deterministic() {
        for ch in KeyCodeTable::covered() {
            assert_eq!(KeyCodeTable::resolve(ch), KeyCodeTable::resolve(ch));
        }
    }

    #[test]
    fn test_uppercase_uses_lowercase_key_with_shift() {
        for lower in 'a'..='z' {
            let upper = lower.to_ascii_uppercase();
            let l = KeyCodeTable::resolve(lower).unwrap();
            let u = KeyCodeTable::resolve(upper).unwrap();
            assert_eq!(l.key_code, u.key_code, "{} vs {}", lower, upper);
            assert!(!l.needs_shift);
            assert!(u.needs_shift);
        }
    }

    #[test]
    fn test_letters_and_digits() {
        assert_eq!(KeyCodeTable::resolve('a').unwrap().key_code, KeyCode::new(30));
        assert_eq!(KeyCodeTable::resolve('h').unwrap().key_code, KeyCode::new(35));
        assert_eq!(KeyCodeTable::resolve('z').unwrap().key_code, KeyCode::new(44));
        assert_eq!(KeyCodeTable::resolve('1').unwrap().key_code, KeyCode::new(2));
        assert_eq!(KeyCodeTable::resolve('0').unwrap().key_code, KeyCode::new(11));
    }

    #[test]
    fn test_shifted_symbols_share_base_key() {
        let pairs = [
            ('1', '!'), ('2', '@'), ('3', '#'), ('4', '$'), ('5', '%'),
            ('6', '^'), ('7', '&'), ('8', '*'), ('9', '('), ('0', ')'),
            ('-', '_'), ('=', '+'), ('[', '{'), (']', '}'), ('\\', '|'),
            (';', ':'), ('\'', '"'), ('`', '~'), (',', '<'), ('.', '>'),
            ('/', '?'),
        ];
        for (base, shifted) in pairs {
            let b = KeyCodeTable::resolve(base).unwrap();
            let s = KeyCodeTable::resolve(shifted).unwrap();
            assert_eq!(b.key_code, s.key_code, "{} vs {}", base, shifted);
            assert!(!b.needs_shift);
            assert!(s.needs_shift);
        }
    }

    #[test]
    fn test_whitespace_and_commit() {
        assert_eq!(KeyCodeTable::resolve(' ').unwrap().key_code, KeyCode::new(57));
        assert_eq!(KeyCodeTable::resolve('\t').unwrap().key_code, KeyCode::new(15));
        assert_eq!(KeyCodeTable::resolve('\n').unwrap().key_code, COMMIT_KEY);
        assert_eq!(KeyCodeTable::resolve('\r').unwrap().key_code, COMMIT_KEY);
        assert!(KeyCodeTable::is_commit('\n'));
        assert!(!KeyCodeTable::is_commit(' '));
    }

    #[test]
    fn test_unsupported_characters() {
        for ch in ['中', 'é', 'ß', '€', '😀', '\u{7f}', '\0'] {
            assert_eq!(KeyCodeTable::resolve(ch), None, "{:?}", ch);
        }
    }

    #[test]
    fn test_covered_set_size() {
        // 52 letters, 10 digits, 32 printable symbols, space, tab, \n, \r
        assert_eq!(KeyCodeTable::covered().count(), 98);
    }
}
