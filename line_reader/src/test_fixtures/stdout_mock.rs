// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{StdMutex, lock_or_recover};
use std::{io::{Result, Write},
          sync::Arc};
use strip_ansi_escapes::strip;

/// In memory display sink for tests. You can safely clone this struct, since it only
/// contains an `Arc<StdMutex<Vec<u8>>>`. The inner `buffer` will not be cloned, just the
/// [Arc] will be cloned.
///
/// The main constructors are:
/// - [`StdoutMock::default`]
/// - [`super::OutputDeviceExt::new_mock()`]
#[derive(Clone, Debug, Default)]
pub struct StdoutMock {
    pub buffer: Arc<StdMutex<Vec<u8>>>,
}

impl StdoutMock {
    #[must_use]
    pub fn get_copy_of_buffer(&self) -> Vec<u8> { lock_or_recover(&self.buffer).clone() }

    /// Invalid UTF-8 is replaced, so a test can still see what was written.
    #[must_use]
    pub fn get_copy_of_buffer_as_string(&self) -> String {
        String::from_utf8_lossy(&lock_or_recover(&self.buffer)).into_owned()
    }

    #[must_use]
    pub fn get_copy_of_buffer_as_string_strip_ansi(&self) -> String {
        let stripped = strip(lock_or_recover(&self.buffer).as_slice());
        String::from_utf8_lossy(&stripped).into_owned()
    }

    pub fn clear(&self) { lock_or_recover(&self.buffer).clear(); }
}

impl Write for StdoutMock {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        lock_or_recover(&self.buffer).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> { Ok(()) }
}
