// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Codepoints that never make it into a [`LineBuffer`].
pub mod rejected_codepoints {
    pub const CARRIAGE_RETURN: char = '\r';
    pub const LINE_FEED: char = '\n';
    pub const DEL: char = '\x7f';
    pub const LINE_SEPARATOR: char = '\u{2028}';
    pub const PARAGRAPH_SEPARATOR: char = '\u{2029}';

    #[must_use]
    pub fn is_rejected(ch: char) -> bool {
        matches!(
            ch,
            CARRIAGE_RETURN | LINE_FEED | DEL | LINE_SEPARATOR | PARAGRAPH_SEPARATOR
        )
    }
}

/// The text of the line that is being composed. It is a sequence of Unicode codepoints,
/// and it never contains a line terminator or the DEL character. Those are filtered out
/// by [`LineBuffer::insert()`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    text: String,
}

impl LineBuffer {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Appends `input` to the end of the buffer, dropping any codepoint that is not
    /// allowed in a line. Returns the text that was actually appended, which is what
    /// should be echoed to the display. An empty return value means nothing changed.
    pub fn insert(&mut self, input: &str) -> String {
        let accepted: String = input
            .chars()
            .filter(|ch| !rejected_codepoints::is_rejected(*ch))
            .collect();
        self.text.push_str(&accepted);
        accepted
    }

    /// Removes exactly one codepoint from the end of the buffer. Surrogate pairs don't
    /// exist in a Rust [`String`], so an emoji such as `😀` is a single codepoint. A
    /// grapheme cluster made of several codepoints (eg: a flag) takes several calls.
    pub fn pop_codepoint(&mut self) -> Option<char> { self.text.pop() }

    pub fn clear(&mut self) { self.text.clear(); }

    /// Returns the trimmed text, and leaves the buffer empty.
    pub fn take_trimmed(&mut self) -> String {
        let text = std::mem::take(&mut self.text);
        text.trim().to_string()
    }

    #[must_use]
    pub fn as_str(&self) -> &str { &self.text }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.text.is_empty() }

    #[must_use]
    pub fn char_count(&self) -> usize { self.text.chars().count() }
}

impl Display for LineBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult { write!(f, "{}", self.text) }
}
