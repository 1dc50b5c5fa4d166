// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{gen_input_stream, gen_input_stream_with_delay};
use crate::{CrosstermEventResult, InputDevice, KeyEvent};
use crossterm::event::{Event, KeyCode, KeyModifiers};
use std::time::Duration;

pub trait InputDeviceExtMock {
    fn new_mock(generator_vec: Vec<CrosstermEventResult>) -> InputDevice;

    fn new_mock_with_delay(
        generator_vec: Vec<CrosstermEventResult>,
        delay: Duration,
    ) -> InputDevice;
}

impl InputDeviceExtMock for InputDevice {
    fn new_mock(generator_vec: Vec<CrosstermEventResult>) -> InputDevice {
        InputDevice {
            resource: gen_input_stream(generator_vec),
        }
    }

    fn new_mock_with_delay(
        generator_vec: Vec<CrosstermEventResult>,
        delay: Duration,
    ) -> InputDevice {
        InputDevice {
            resource: gen_input_stream_with_delay(generator_vec, delay),
        }
    }
}

/// Crossterm key press events that type `text`, one per codepoint. A `\r` or `\n` in
/// `text` becomes an Enter key press.
#[must_use]
pub fn gen_typed_events(text: &str) -> Vec<CrosstermEventResult> {
    text.chars()
        .map(|ch| {
            let code = match ch {
                '\r' | '\n' => KeyCode::Enter,
                _ => KeyCode::Char(ch),
            };
            Ok(Event::Key(crossterm::event::KeyEvent::new(
                code,
                KeyModifiers::NONE,
            )))
        })
        .collect()
}

/// A Ctrl+`ch` key press event.
#[must_use]
pub fn gen_ctrl_event(ch: char) -> CrosstermEventResult {
    Ok(Event::Key(crossterm::event::KeyEvent::new(
        KeyCode::Char(ch),
        KeyModifiers::CONTROL,
    )))
}

/// Converts the crossterm events back into [`KeyEvent`]s, skipping the ones that don't
/// convert.
#[must_use]
pub fn to_key_events(events: Vec<CrosstermEventResult>) -> Vec<KeyEvent> {
    events
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|it| KeyEvent::try_from(it).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SpecialKey;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_gen_typed_events() {
        let key_events = to_key_events(gen_typed_events("ab\n"));
        assert_eq!(
            key_events,
            vec![
                KeyEvent::char('a'),
                KeyEvent::char('b'),
                KeyEvent::special(SpecialKey::Enter)
            ]
        );
    }

    #[test]
    fn test_gen_ctrl_event() {
        assert_eq!(to_key_events(vec![gen_ctrl_event('c')]), vec![KeyEvent::ctrl('c')]);
    }
}
