// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The `r3bl_line_reader` library is the input layer of a terminal front end for a
//! compute engine (such as a shell or a REPL). It turns a stream of raw keystrokes into
//! completed lines of text, delivered to exactly one pending reader at a time, while the
//! engine concurrently streams its `stdout` and `stderr` bytes back to the display.
//!
//! # Mental model
//!
//! There are two core pieces:
//!
//! 1. [`LineEditor`] owns the in-progress [`LineBuffer`]. It applies insertion and
//!    deletion, and echoes the visible effect of each edit to the display.
//! 2. [`LineReader`] is the read-request controller. It holds at most one
//!    [`PendingRead`] in its [`ReadSlot`]. While a read is pending, a keystroke
//!    [`Subscription`] feeds classified keys into the editor. When Enter or the interrupt
//!    chord arrives, the pending read is taken out of the slot, its subscription is
//!    released, and the caller's [`PendingLine`] future resolves with a
//!    [`ReadlineEvent`].
//!
//! Keystrokes enter the system through a [`KeyEventSource`], which dispatches each
//! [`KeyEvent`] synchronously, in arrival order, to whoever is subscribed. A [`Keymap`]
//! classifies each event into a [`KeyAction`].
//!
//! ```text
//! crossterm::Event ──► KeyEvent ──► KeyEventSource::dispatch()
//!                                      ├─► global shortcuts (interrupt, clear screen)
//!                                      └─► pending read listener ──► LineEditor
//! ```
//!
//! # Input editing behavior
//!
//! - Printable characters (including pasted text) are appended to the line.
//! - Backspace: delete exactly one Unicode codepoint from the end of the line.
//! - Meta-Backspace, Ctrl-U: erase the whole line.
//! - Enter: submit the line (leading and trailing whitespace is trimmed).
//! - Ctrl-C: cancel the pending read with [`ReadlineEvent::Interrupted`]. When no read is
//!   pending, interrupt the compute engine instead.
//! - Meta-K, Ctrl-L: clear the screen. This never changes the line being edited.
//!
//! All of these chords can be changed in [`LineReaderConfig`].
//!
//! # How to use this crate
//!
//! 1. Create a [`TerminalSession`] with [`TerminalSession::try_new_interactive()`] (or
//!    [`TerminalSession::new()`] to supply your own [`OutputDevice`] for testing).
//! 2. Implement [`ComputeEngine`] for your engine. It receives an [`EngineContext`]
//!    with a [`LineReader`], writers for `stdout` and `stderr`, and an interrupt
//!    receiver.
//! 3. Call [`TerminalSession::run_engine()`] with an [`InputDevice`].
//!
//! Use [`tracing_setup::init()`] to configure logging to a file, since the display is
//! owned by the line reader while it runs.

// https://github.com/rust-lang/rust-clippy
// https://rust-lang.github.io/rust-clippy/master/index.html
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]
#![warn(rust_2018_idioms)]

// Attach sources.
pub mod key_input;
pub mod line_editor_impl;
pub mod public_api;
pub mod read_request_impl;
pub mod terminal_io;
pub mod test_fixtures;

// Re-export.
pub use key_input::*;
pub use line_editor_impl::*;
pub use public_api::*;
pub use read_request_impl::*;
pub use terminal_io::*;
pub use test_fixtures::*;

// Type aliases.
use futures_core::Stream;
use std::{pin::Pin,
          sync::{Arc, MutexGuard, PoisonError}};

pub type StdMutex<T> = std::sync::Mutex<T>;

pub type SendRawTerminal = dyn std::io::Write + Send;
pub type SafeRawTerminal = Arc<StdMutex<SendRawTerminal>>;

pub type SafeReadSlot = Arc<StdMutex<ReadSlot>>;

pub type CrosstermEventResult = Result<crossterm::event::Event, std::io::Error>;
pub type PinnedInputStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

// Constants.
pub const CHANNEL_CAPACITY: usize = 1_000;

/// Echoed when a pending read resolves, to move the caret to the start of a new line.
pub const CRLF: &str = "\r\n";

/// Echoed to visually erase exactly one column to the left of the caret.
pub const ERASE_ONE_COLUMN: &str = "\x08 \x08";

/// Turn this on to get per keystroke logging.
pub const DEBUG_LINE_READER_MOD: bool = false;

/// Poisoned locks are recovered. No lock in this crate guards state that a panic can
/// leave half updated.
pub(crate) fn lock_or_recover<T: ?Sized>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
