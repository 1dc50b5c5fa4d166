// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{ERASE_ONE_COLUMN, LineBuffer};
use crossterm::{QueueableCommand, cursor,
                terminal::{Clear, ClearType::CurrentLine}};
use std::io::{self, Write};

/// Owns the prompt and the [`LineBuffer`] for a single pending read, and echoes the
/// visible effect of every edit to `term`.
///
/// All the methods that write to the display take a `term: &mut dyn Write` so that they
/// can be driven by a real terminal or a [`crate::StdoutMock`] in tests. Every method
/// flushes `term` before returning. They don't log, since `term` is usually a locked
/// [`crate::OutputDevice`], and logs may be written to that same device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineEditor {
    prompt: String,
    buffer: LineBuffer,
}

impl LineEditor {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            buffer: LineBuffer::new(),
        }
    }

    #[must_use]
    pub fn prompt(&self) -> &str { &self.prompt }

    #[must_use]
    pub fn buffer(&self) -> &LineBuffer { &self.buffer }

    /// Prints the prompt followed by the current contents of the buffer. Used when the
    /// read begins, and after the screen is cleared.
    pub fn render(&self, term: &mut dyn Write) -> io::Result<()> {
        term.write_all(self.prompt.as_bytes())?;
        term.write_all(self.buffer.as_str().as_bytes())?;
        term.flush()
    }

    /// Appends `input` and echoes whatever the buffer accepted, verbatim.
    pub fn insert(&mut self, input: &str, term: &mut dyn Write) -> io::Result<()> {
        let accepted = self.buffer.insert(input);
        if accepted.is_empty() {
            return Ok(());
        }
        term.write_all(accepted.as_bytes())?;
        term.flush()
    }

    /// Removes the last codepoint and erases one column. When the buffer is already
    /// empty nothing is echoed. Returns whether a codepoint was removed.
    pub fn delete_last(&mut self, term: &mut dyn Write) -> io::Result<bool> {
        if self.buffer.pop_codepoint().is_none() {
            return Ok(false);
        }
        term.write_all(ERASE_ONE_COLUMN.as_bytes())?;
        term.flush()?;
        Ok(true)
    }

    /// Kills the whole line: empties the buffer, erases the current terminal row, and
    /// prints the prompt again. Rows above the current one are left untouched.
    pub fn clear_line(&mut self, term: &mut dyn Write) -> io::Result<()> {
        self.buffer.clear();
        term.queue(Clear(CurrentLine))?;
        term.queue(cursor::MoveToColumn(0))?;
        self.render(term)
    }

    /// Returns the trimmed text. The buffer is left empty. Echoing the newline is up to
    /// the caller, see [`crate::LineReader`].
    pub fn commit(&mut self) -> String { self.buffer.take_trimmed() }
}
