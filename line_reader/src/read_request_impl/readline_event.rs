// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Events emitted by [`crate::LineReader::read_line()`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ReadlineEvent {
    /// The user pressed Enter. The text is trimmed, and may be empty.
    Line(String),

    /// The user pressed Ctrl-C (or the host called [`crate::LineReader::interrupt()`]).
    /// This is different from an empty line.
    Interrupted,
}

impl ReadlineEvent {
    #[must_use]
    pub fn into_line(self) -> Option<String> {
        match self {
            ReadlineEvent::Line(line) => Some(line),
            ReadlineEvent::Interrupted => None,
        }
    }
}

/// Error returned from [`crate::LineReader::begin_read()`] and the [`crate::PendingLine`]
/// it returns.
#[derive(Debug, Error)]
pub enum ReadlineError {
    /// An internal I/O error occurred, while echoing to the display.
    #[error(transparent)]
    IO(#[from] io::Error),

    /// The [`crate::LineReader`] was dropped before the pending read was resolved, or
    /// the keystroke input has ended (see [`crate::LineReader::close_input()`]).
    #[error("line reader closed")]
    Closed,

    /// A read is already pending, and [`BusyReadPolicy::Reject`] is in effect.
    #[error("a line read is already pending")]
    BusyRead,
}

/// What to do when a new read is requested while another one is still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyReadPolicy {
    /// Fail the new request with [`ReadlineError::BusyRead`].
    #[default]
    Reject,
    /// Resolve the pending read with [`ReadlineEvent::Interrupted`], then start the new
    /// one.
    Supersede,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ReadState {
    Idle,
    Reading,
}
