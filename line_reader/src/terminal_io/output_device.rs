// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{EolConvertingWriter, SafeRawTerminal, SendRawTerminal, StdMutex, lock_or_recover};
use crossterm::{QueueableCommand, cursor,
                terminal::{Clear, ClearType}};
use std::{io::{self, Write},
          sync::{Arc, MutexGuard}};

pub type LockedOutputDevice<'a> = &'a mut dyn std::io::Write;

/// Macro to simplify locking and getting a mutable reference to the output device.
/// Don't call this again in the same scope, it will deadlock! A safe approach is
/// to use this macro in a separate block scope.
///
/// Usage example:
/// ```
/// use r3bl_line_reader::{lock_output_device_as_mut, OutputDevice, LockedOutputDevice};
/// let device = OutputDevice::new_stdout(false);
/// { // Start a new block scope to avoid deadlock.
///     let mut_ref: LockedOutputDevice<'_> = lock_output_device_as_mut!(device);
///     let _ = mut_ref.write_all(b"Hello, world!\n");
/// } // The lock is released here.
/// ```
#[macro_export]
macro_rules! lock_output_device_as_mut {
    ($device:expr) => {
        &mut *$device.lock()
    };
}

/// The display sink. Bytes written to it show up in the terminal, verbatim.
/// - It is safe to clone.
/// - To write to it, see [`Self::lock()`] or the [`lock_output_device_as_mut`] macro.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct OutputDevice {
    pub resource: SafeRawTerminal,
    pub is_mock: bool,
}

impl OutputDevice {
    /// When `convert_eol` is true, a bare `\n` is written as `\r\n`. This is needed once
    /// the terminal is in raw mode, since output from the compute engine usually only
    /// contains `\n`.
    #[must_use]
    pub fn new_stdout(convert_eol: bool) -> Self {
        let resource: SafeRawTerminal = if convert_eol {
            Arc::new(StdMutex::new(EolConvertingWriter::new(io::stdout())))
        } else {
            Arc::new(StdMutex::new(io::stdout()))
        };
        Self {
            resource,
            is_mock: false,
        }
    }

    /// Locks the output device for writing.
    pub fn lock(&self) -> MutexGuard<'_, SendRawTerminal> { lock_or_recover(&self.resource) }

    /// Clears the whole screen and moves the caret to the top left corner. The caller is
    /// responsible for re-rendering anything that should stay visible.
    pub fn clear_screen(term: &mut dyn Write) -> io::Result<()> {
        term.queue(Clear(ClearType::All))?;
        term.queue(cursor::MoveTo(0, 0))?;
        term.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OutputDeviceExt, StdoutMock};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stdout_output_device_is_not_mock() {
        let device = OutputDevice::new_stdout(true);
        assert!(!device.is_mock);
    }

    #[test]
    fn test_clear_screen() {
        let mut stdout_mock = StdoutMock::default();
        OutputDevice::clear_screen(&mut stdout_mock).unwrap();
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "\x1b[2J\x1b[1;1H");
    }

    #[test]
    fn test_lock_output_device_as_mut() {
        let (device, stdout_mock) = OutputDevice::new_mock();
        {
            let mut_ref: LockedOutputDevice<'_> = lock_output_device_as_mut!(device);
            mut_ref.write_all(b"hello").unwrap();
        }
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "hello");
    }
}
