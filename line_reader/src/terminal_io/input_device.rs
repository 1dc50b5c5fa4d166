// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{CrosstermEventResult, DEBUG_LINE_READER_MOD, KeyEvent, PinnedInputStream};
use crossterm::event::EventStream;
use futures_util::{FutureExt, StreamExt};

/// This struct represents an input device that can be used to read from the terminal. See
/// [`crate::InputDeviceExtMock`] for testing features.
#[allow(missing_debug_implementations)]
pub struct InputDevice {
    pub resource: PinnedInputStream<CrosstermEventResult>,
}

impl InputDevice {
    #[must_use]
    pub fn new_event_stream() -> InputDevice {
        InputDevice {
            resource: Box::pin(EventStream::new()),
        }
    }
}

impl InputDevice {
    /// Waits for the next event that converts into a [`KeyEvent`]. Mouse, resize, and
    /// focus events are skipped. Returns `None` once the stream has ended, or failed.
    pub async fn next_key_event(&mut self) -> Option<KeyEvent> {
        loop {
            match self.resource.next().fuse().await {
                Some(Ok(event)) => match KeyEvent::try_from(event) {
                    Ok(key_event) => return Some(key_event),
                    Err(()) => {
                        DEBUG_LINE_READER_MOD.then(|| {
                            tracing::debug!(message = "skipping non key event");
                        });
                    }
                },
                Some(Err(error)) => {
                    // % is Display, ? is Debug.
                    tracing::error!(message = "input device failed", error = ?error);
                    return None;
                }
                None => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InputDeviceExtMock;
    use crossterm::event::{Event, KeyCode, KeyModifiers};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_next_key_event_skips_other_events() {
        let mut input_device = InputDevice::new_mock(vec![
            Ok(Event::Resize(80, 24)),
            Ok(Event::Key(crossterm::event::KeyEvent::new(
                KeyCode::Char('x'),
                KeyModifiers::NONE,
            ))),
            Ok(Event::FocusLost),
        ]);

        assert_eq!(input_device.next_key_event().await, Some(KeyEvent::char('x')));
        assert_eq!(input_device.next_key_event().await, None);
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_next_key_event_stops_on_error() {
        let mut input_device = InputDevice::new_mock(vec![
            Err(std::io::Error::other("boom")),
            Ok(Event::Key(crossterm::event::KeyEvent::new(
                KeyCode::Char('x'),
                KeyModifiers::NONE,
            ))),
        ]);

        assert_eq!(input_device.next_key_event().await, None);
    }
}
