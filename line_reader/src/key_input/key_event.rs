// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crossterm::event::{Event as CTEvent, KeyCode, KeyEvent as CTKeyEvent,
                       KeyEventKind as CTKeyEventKind, KeyModifiers};
use serde::{Deserialize, Serialize};

/// One keystroke, as seen by the line reader. This is produced by converting a
/// [`crossterm::event::Event`] (see the [`TryFrom`] impl below), or built directly in
/// tests with [`KeyEvent::char()`], [`KeyEvent::special()`], etc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: ModifierKeysMask,
    pub kind: KeyEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Character(char),
    SpecialKey(SpecialKey),
    /// More than one codepoint arriving at once, eg: from a bracketed paste or an IME
    /// composition.
    Text(String),
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SpecialKey {
    Backspace,
    Enter,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Tab,
    BackTab,
    Delete,
    Insert,
    Esc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModifierKeysMask {
    pub shift_key_state: KeyState,
    pub ctrl_key_state: KeyState,
    pub alt_key_state: KeyState,
    /// The "Command" key on macOS, or the "Windows" key. Crossterm reports this as
    /// `SUPER` or `META` depending on the terminal.
    pub meta_key_state: KeyState,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyState {
    Pressed,
    #[default]
    NotPressed,
}

impl From<bool> for KeyState {
    fn from(is_pressed: bool) -> Self {
        if is_pressed {
            KeyState::Pressed
        } else {
            KeyState::NotPressed
        }
    }
}

mod modifier_keys_mask_impl {
    use super::{KeyState, ModifierKeysMask};

    impl ModifierKeysMask {
        #[must_use]
        pub fn new() -> Self { Self::default() }

        #[must_use]
        pub fn with_shift(mut self) -> Self {
            self.shift_key_state = KeyState::Pressed;
            self
        }

        #[must_use]
        pub fn with_ctrl(mut self) -> Self {
            self.ctrl_key_state = KeyState::Pressed;
            self
        }

        #[must_use]
        pub fn with_alt(mut self) -> Self {
            self.alt_key_state = KeyState::Pressed;
            self
        }

        #[must_use]
        pub fn with_meta(mut self) -> Self {
            self.meta_key_state = KeyState::Pressed;
            self
        }

        #[must_use]
        pub fn is_shift(&self) -> bool { self.shift_key_state == KeyState::Pressed }

        #[must_use]
        pub fn is_ctrl(&self) -> bool { self.ctrl_key_state == KeyState::Pressed }

        #[must_use]
        pub fn is_alt(&self) -> bool { self.alt_key_state == KeyState::Pressed }

        #[must_use]
        pub fn is_meta(&self) -> bool { self.meta_key_state == KeyState::Pressed }

        /// No modifiers, or only Shift.
        #[must_use]
        pub fn is_plain_or_shift(&self) -> bool {
            !self.is_ctrl() && !self.is_alt() && !self.is_meta()
        }

        /// Ctrl+Alt is what AltGr arrives as on many international keyboard layouts, and
        /// it is used to type symbols like `{`, `[`, `|`, `@`, etc.
        #[must_use]
        pub fn is_alt_gr(&self) -> bool {
            self.is_ctrl() && self.is_alt() && !self.is_meta()
        }
    }
}

mod key_event_impl {
    use super::{Key, KeyEvent, KeyEventKind, ModifierKeysMask, SpecialKey};

    impl KeyEvent {
        #[must_use]
        pub fn new(key: Key, modifiers: ModifierKeysMask) -> Self {
            Self {
                key,
                modifiers,
                kind: KeyEventKind::Press,
            }
        }

        #[must_use]
        pub fn char(ch: char) -> Self { Self::new(Key::Character(ch), ModifierKeysMask::new()) }

        #[must_use]
        pub fn special(special_key: SpecialKey) -> Self {
            Self::new(Key::SpecialKey(special_key), ModifierKeysMask::new())
        }

        #[must_use]
        pub fn ctrl(ch: char) -> Self {
            Self::new(Key::Character(ch), ModifierKeysMask::new().with_ctrl())
        }

        #[must_use]
        pub fn meta(ch: char) -> Self {
            Self::new(Key::Character(ch), ModifierKeysMask::new().with_meta())
        }

        #[must_use]
        pub fn text(text: impl Into<String>) -> Self {
            Self::new(Key::Text(text.into()), ModifierKeysMask::new())
        }

        /// One [`KeyEvent`] per codepoint of `text`. Handy to simulate typing.
        #[must_use]
        pub fn typed(text: &str) -> Vec<Self> { text.chars().map(Self::char).collect() }

        #[must_use]
        pub fn with_kind(mut self, kind: KeyEventKind) -> Self {
            self.kind = kind;
            self
        }
    }

    impl Key {
        /// Control characters that some terminals (and browsers) deliver as plain
        /// characters are mapped to the [`SpecialKey`] that they stand for. Eg: `\x7f`
        /// is what Backspace sends, and `\r` is what Enter sends.
        #[must_use]
        pub fn normalized(&self) -> Key {
            match self {
                Key::Character('\x7f' | '\x08') => Key::SpecialKey(SpecialKey::Backspace),
                Key::Character('\r' | '\n') => Key::SpecialKey(SpecialKey::Enter),
                Key::Character('\t') => Key::SpecialKey(SpecialKey::Tab),
                Key::Character('\x1b') => Key::SpecialKey(SpecialKey::Esc),
                other => other.clone(),
            }
        }
    }
}

/// Convert a [`crossterm::event::Event`] into a [`KeyEvent`]. Only keyboard events and
/// bracketed paste events are converted, everything else (mouse, resize, focus) is
/// rejected.
impl TryFrom<CTEvent> for KeyEvent {
    type Error = ();

    fn try_from(event: CTEvent) -> Result<Self, Self::Error> {
        match event {
            CTEvent::Key(key_event) => KeyEvent::try_from(key_event),
            CTEvent::Paste(text) => Ok(KeyEvent::text(text)),
            _ => Err(()),
        }
    }
}

impl TryFrom<CTKeyEvent> for KeyEvent {
    type Error = ();

    fn try_from(key_event: CTKeyEvent) -> Result<Self, Self::Error> {
        let key = match key_event.code {
            KeyCode::Char(character) => Key::Character(character),
            KeyCode::Backspace => Key::SpecialKey(SpecialKey::Backspace),
            KeyCode::Enter => Key::SpecialKey(SpecialKey::Enter),
            KeyCode::Left => Key::SpecialKey(SpecialKey::Left),
            KeyCode::Right => Key::SpecialKey(SpecialKey::Right),
            KeyCode::Up => Key::SpecialKey(SpecialKey::Up),
            KeyCode::Down => Key::SpecialKey(SpecialKey::Down),
            KeyCode::Home => Key::SpecialKey(SpecialKey::Home),
            KeyCode::End => Key::SpecialKey(SpecialKey::End),
            KeyCode::PageUp => Key::SpecialKey(SpecialKey::PageUp),
            KeyCode::PageDown => Key::SpecialKey(SpecialKey::PageDown),
            KeyCode::Tab => Key::SpecialKey(SpecialKey::Tab),
            KeyCode::BackTab => Key::SpecialKey(SpecialKey::BackTab),
            KeyCode::Delete => Key::SpecialKey(SpecialKey::Delete),
            KeyCode::Insert => Key::SpecialKey(SpecialKey::Insert),
            KeyCode::Esc => Key::SpecialKey(SpecialKey::Esc),
            _ => return Err(()),
        };

        let modifiers = ModifierKeysMask {
            shift_key_state: key_event.modifiers.intersects(KeyModifiers::SHIFT).into(),
            ctrl_key_state: key_event.modifiers.intersects(KeyModifiers::CONTROL).into(),
            alt_key_state: key_event.modifiers.intersects(KeyModifiers::ALT).into(),
            meta_key_state: key_event
                .modifiers
                .intersects(KeyModifiers::SUPER | KeyModifiers::META)
                .into(),
        };

        let kind = match key_event.kind {
            CTKeyEventKind::Press => KeyEventKind::Press,
            CTKeyEventKind::Repeat => KeyEventKind::Repeat,
            CTKeyEventKind::Release => KeyEventKind::Release,
        };

        Ok(KeyEvent {
            key,
            modifiers,
            kind,
        })
    }
}
