// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{ConfigError, Key, KeyEvent, KeyEventKind, ModifierKeysMask, SpecialKey};
use serde::{Deserialize, Serialize};
use std::{fmt::{Display, Formatter, Result as FmtResult},
          str::FromStr};

/// What a [`KeyEvent`] means to the line reader. Produced by [`Keymap::classify()`].
#[derive(Debug, Clone, PartialEq, Eq, strum_macros::IntoStaticStr)]
pub enum KeyAction {
    /// Append text to the line.
    Insert(String),
    /// Remove one codepoint from the end of the line.
    DeleteLast,
    /// Erase the whole line.
    KillLine,
    /// Complete the pending read with the line.
    Submit,
    /// Cancel the pending read, or interrupt the compute engine when idle.
    Interrupt,
    /// Clear the screen, and re-render the pending read (if any).
    ClearScreen,
    Ignore,
}

impl KeyAction {
    /// Global actions are handled whether or not a read is pending.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, KeyAction::Interrupt | KeyAction::ClearScreen)
    }
}

/// A modifier + key combination, eg: `ctrl+c`, `meta+k`, `meta+backspace`.
///
/// - The key is either a single character or the name of a [`SpecialKey`].
/// - Modifier names are `ctrl`, `alt`, `shift`, `meta`. The aliases `control`,
///   `option`, `super`, `cmd` are accepted too.
/// - Parsing is case insensitive, and matching a character ignores its case and the
///   Shift key. So `ctrl+c` matches Ctrl+C and Ctrl+Shift+C.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyChord {
    pub modifiers: ModifierKeysMask,
    pub key: Key,
}

mod key_chord_impl {
    use super::{ConfigError, Display, FmtResult, Formatter, FromStr, Key, KeyChord,
                KeyEvent, KeyEventKind, ModifierKeysMask, SpecialKey};

    impl KeyChord {
        #[must_use]
        pub fn new(modifiers: ModifierKeysMask, key: Key) -> Self { Self { modifiers, key } }

        #[must_use]
        pub fn ctrl(ch: char) -> Self {
            Self::new(ModifierKeysMask::new().with_ctrl(), Key::Character(ch))
        }

        #[must_use]
        pub fn meta(ch: char) -> Self {
            Self::new(ModifierKeysMask::new().with_meta(), Key::Character(ch))
        }

        #[must_use]
        pub fn with_special_key(modifiers: ModifierKeysMask, special_key: SpecialKey) -> Self {
            Self::new(modifiers, Key::SpecialKey(special_key))
        }

        #[must_use]
        pub fn matches(&self, event: &KeyEvent) -> bool {
            if event.kind == KeyEventKind::Release {
                return false;
            }

            let this = &self.modifiers;
            let other = &event.modifiers;
            if this.is_ctrl() != other.is_ctrl()
                || this.is_alt() != other.is_alt()
                || this.is_meta() != other.is_meta()
            {
                return false;
            }

            match (&self.key, &event.key.normalized()) {
                (Key::Character(lhs), Key::Character(rhs)) => {
                    lhs.to_lowercase().eq(rhs.to_lowercase())
                }
                (Key::SpecialKey(lhs), Key::SpecialKey(rhs)) => lhs == rhs,
                _ => false,
            }
        }
    }

    impl FromStr for KeyChord {
        type Err = ConfigError;

        fn from_str(input: &str) -> Result<Self, Self::Err> {
            let invalid = |reason: &str| ConfigError::InvalidKeyChord {
                chord: input.to_string(),
                reason: reason.to_string(),
            };

            let trimmed = input.trim();
            if trimmed.is_empty() {
                return Err(invalid("it is empty"));
            }

            // The key itself may be `+`, eg: `ctrl++`.
            let (modifier_part, key_part) = match trimmed.strip_suffix("++") {
                Some(rest) => (rest, "+"),
                None => match trimmed.rsplit_once('+') {
                    Some((rest, key)) => (rest, key),
                    None => ("", trimmed),
                },
            };

            let mut modifiers = ModifierKeysMask::new();
            for name in modifier_part.split('+').filter(|it| !it.is_empty()) {
                modifiers = match name.trim().to_ascii_lowercase().as_str() {
                    "ctrl" | "control" => modifiers.with_ctrl(),
                    "alt" | "option" => modifiers.with_alt(),
                    "shift" => modifiers.with_shift(),
                    "meta" | "super" | "cmd" => modifiers.with_meta(),
                    _ => return Err(invalid("unknown modifier")),
                };
            }

            let key_part = key_part.trim();
            let mut chars = key_part.chars();
            let key = match (chars.next(), chars.next()) {
                (None, _) => return Err(invalid("the key is missing")),
                (Some(ch), None) => Key::Character(ch.to_ascii_lowercase()),
                _ => match SpecialKey::from_str(key_part) {
                    Ok(special_key) => Key::SpecialKey(special_key),
                    Err(_) => return Err(invalid("unknown key name")),
                },
            };

            Ok(KeyChord::new(modifiers, key))
        }
    }

    impl Display for KeyChord {
        fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
            let modifiers = [
                (self.modifiers.is_ctrl(), "ctrl+"),
                (self.modifiers.is_alt(), "alt+"),
                (self.modifiers.is_shift(), "shift+"),
                (self.modifiers.is_meta(), "meta+"),
            ];
            for (is_pressed, name) in modifiers {
                if is_pressed {
                    write!(f, "{name}")?;
                }
            }
            match &self.key {
                Key::Character(ch) => write!(f, "{ch}"),
                Key::SpecialKey(special_key) => write!(f, "{special_key}"),
                Key::Text(text) => write!(f, "{text}"),
            }
        }
    }

    impl TryFrom<String> for KeyChord {
        type Error = ConfigError;

        fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
    }

    impl From<KeyChord> for String {
        fn from(value: KeyChord) -> Self { value.to_string() }
    }
}

/// Maps [`KeyEvent`]s to [`KeyAction`]s. The chords are configurable (see
/// [`crate::LineReaderConfig`]). Enter and Backspace are fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keymap {
    pub interrupt: Vec<KeyChord>,
    pub clear_screen: Vec<KeyChord>,
    pub kill_line: Vec<KeyChord>,
    /// These are always inserted as text, whatever modifiers arrive with them.
    pub literal_punctuation: Vec<char>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            interrupt: vec![KeyChord::ctrl('c')],
            clear_screen: vec![KeyChord::meta('k'), KeyChord::ctrl('l')],
            kill_line: vec![
                KeyChord::with_special_key(
                    ModifierKeysMask::new().with_meta(),
                    SpecialKey::Backspace,
                ),
                KeyChord::ctrl('u'),
            ],
            literal_punctuation: vec!['{', '}', '[', ']', '|'],
        }
    }
}

impl Keymap {
    /// The order of the checks matters: chords first, then the fixed keys, then text.
    #[must_use]
    pub fn classify(&self, event: &KeyEvent) -> KeyAction {
        if event.kind == KeyEventKind::Release {
            return KeyAction::Ignore;
        }

        let matches_any = |chords: &[KeyChord]| chords.iter().any(|it| it.matches(event));
        if matches_any(&self.interrupt) {
            return KeyAction::Interrupt;
        }
        if matches_any(&self.clear_screen) {
            return KeyAction::ClearScreen;
        }
        if matches_any(&self.kill_line) {
            return KeyAction::KillLine;
        }

        let modifiers = &event.modifiers;
        match event.key.normalized() {
            Key::SpecialKey(SpecialKey::Enter) => KeyAction::Submit,
            Key::SpecialKey(SpecialKey::Backspace) => KeyAction::DeleteLast,
            Key::Character(ch) if self.literal_punctuation.contains(&ch) => {
                KeyAction::Insert(ch.to_string())
            }
            Key::Character(ch)
                if !ch.is_control()
                    && (modifiers.is_plain_or_shift() || modifiers.is_alt_gr()) =>
            {
                KeyAction::Insert(ch.to_string())
            }
            Key::Text(text) => {
                let printable: String = text
                    .chars()
                    .filter(|ch| !ch.is_control())
                    .collect();
                if printable.is_empty() {
                    KeyAction::Ignore
                } else {
                    KeyAction::Insert(printable)
                }
            }
            _ => KeyAction::Ignore,
        }
    }
}
