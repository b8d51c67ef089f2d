//! Key chords written as `modifier+modifier+key`, e.g. `ctrl+shift+e`.

use std::fmt;
use std::str::FromStr;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChordParseError {
    #[error("key chord is empty")]
    Empty,
    #[error("unknown modifier '{0}' (expected ctrl, shift or alt)")]
    UnknownModifier(String),
    #[error("unsupported key '{0}' (expected a single character or f1-f12)")]
    UnsupportedKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyChord {
    pub fn parse(input: &str) -> Result<Self, ChordParseError> {
        let parts: Vec<&str> = input
            .split('+')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        let Some((key, modifier_names)) = parts.split_last() else {
            return Err(ChordParseError::Empty);
        };

        let mut modifiers = KeyModifiers::NONE;
        for name in modifier_names {
            modifiers |= match name.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => KeyModifiers::CONTROL,
                "shift" => KeyModifiers::SHIFT,
                "alt" | "meta" => KeyModifiers::ALT,
                _ => return Err(ChordParseError::UnknownModifier(name.to_string())),
            };
        }

        Ok(Self {
            code: parse_key(key)?,
            modifiers,
        })
    }

    /// Whether `key` is a press of this chord.
    ///
    /// Letters are compared case-insensitively: with shift held, terminals
    /// report the upper-case character, sometimes without the shift flag.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return false;
        }
        match (self.code, key.code) {
            (KeyCode::Char(want), KeyCode::Char(got)) if want.is_ascii_alphabetic() => {
                if !want.eq_ignore_ascii_case(&got) {
                    return false;
                }
                let mut pressed = key.modifiers;
                if got.is_ascii_uppercase() {
                    pressed |= KeyModifiers::SHIFT;
                }
                pressed == self.modifiers
            }
            (want, got) => want == got && key.modifiers == self.modifiers,
        }
    }
}

fn parse_key(key: &str) -> Result<KeyCode, ChordParseError> {
    let lower = key.to_ascii_lowercase();
    let mut chars = lower.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c));
    }
    lower
        .strip_prefix('f')
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=12).contains(n))
        .map(KeyCode::F)
        .ok_or_else(|| ChordParseError::UnsupportedKey(key.to_string()))
}

impl FromStr for KeyChord {
    type Err = ChordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, name) in [
            (KeyModifiers::CONTROL, "Ctrl"),
            (KeyModifiers::SHIFT, "Shift"),
            (KeyModifiers::ALT, "Alt"),
        ] {
            if self.modifiers.contains(flag) {
                write!(f, "{name}+")?;
            }
        }
        match self.code {
            KeyCode::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
            KeyCode::F(n) => write!(f, "F{n}"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn parses_default_chord() {
        let chord = KeyChord::parse("ctrl+shift+e").unwrap();
        assert_eq!(chord.code, KeyCode::Char('e'));
        assert_eq!(chord.modifiers, KeyModifiers::CONTROL | KeyModifiers::SHIFT);
        assert_eq!(chord.to_string(), "Ctrl+Shift+E");
        assert_eq!("Ctrl + Shift + E".parse::<KeyChord>(), Ok(chord));
    }

    #[test]
    fn rejects_bad_chords() {
        assert_eq!(KeyChord::parse(""), Err(ChordParseError::Empty));
        assert_eq!(
            KeyChord::parse("hyper+e"),
            Err(ChordParseError::UnknownModifier("hyper".into()))
        );
        assert_eq!(
            KeyChord::parse("ctrl+enter"),
            Err(ChordParseError::UnsupportedKey("enter".into()))
        );
        assert!(KeyChord::parse("f13").is_err());
        assert_eq!(KeyChord::parse("f2").unwrap().code, KeyCode::F(2));
    }

    #[test]
    fn letter_matching_tolerates_terminal_reporting() {
        let chord = KeyChord::parse("ctrl+shift+e").unwrap();
        let both = KeyModifiers::CONTROL | KeyModifiers::SHIFT;

        assert!(chord.matches(&press(KeyCode::Char('e'), both)));
        assert!(chord.matches(&press(KeyCode::Char('E'), both)));
        assert!(chord.matches(&press(KeyCode::Char('E'), KeyModifiers::CONTROL)));
        assert!(!chord.matches(&press(KeyCode::Char('e'), KeyModifiers::CONTROL)));
        assert!(!chord.matches(&press(KeyCode::Char('e'), both | KeyModifiers::ALT)));
        assert!(!chord.matches(&press(KeyCode::Char('w'), both)));
    }

    #[test]
    fn releases_never_match() {
        let chord = KeyChord::parse("ctrl+shift+e").unwrap();
        let mut key = press(KeyCode::Char('E'), KeyModifiers::CONTROL | KeyModifiers::SHIFT);
        key.kind = KeyEventKind::Release;
        assert!(!chord.matches(&key));
    }
}
