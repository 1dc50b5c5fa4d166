// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::io::{self, Write};

/// Wraps a [`Write`] and turns every bare `\n` into `\r\n`. A `\n` that is already
/// preceded by `\r` (even across two `write()` calls) is left alone.
#[derive(Debug)]
pub struct EolConvertingWriter<W: Write> {
    inner: W,
    last_byte_was_cr: bool,
}

impl<W: Write> EolConvertingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            last_byte_was_cr: false,
        }
    }

    pub fn into_inner(self) -> W { self.inner }
}

impl<W: Write> Write for EolConvertingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut converted = Vec::with_capacity(buf.len() + buf.len() / 8);
        for &byte in buf {
            if byte == b'\n' && !self.last_byte_was_cr {
                converted.push(b'\r');
            }
            converted.push(byte);
            self.last_byte_was_cr = byte == b'\r';
        }
        self.inner.write_all(&converted)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { self.inner.flush() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn convert(chunks: &[&str]) -> String {
        let mut writer = EolConvertingWriter::new(Vec::<u8>::new());
        for chunk in chunks {
            writer.write_all(chunk.as_bytes()).unwrap();
        }
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_bare_newline_is_converted() {
        assert_eq!(convert(&["sheep 1\nsheep 2\n"]), "sheep 1\r\nsheep 2\r\n");
    }

    #[test]
    fn test_crlf_is_untouched() {
        assert_eq!(convert(&["a\r\nb\r\n"]), "a\r\nb\r\n");
    }

    #[test]
    fn test_crlf_split_across_writes() {
        assert_eq!(convert(&["a\r", "\nb", "\n"]), "a\r\nb\r\n");
    }

    #[test]
    fn test_no_newline() {
        assert_eq!(convert(&["> ", "ls"]), "> ls");
    }
}
