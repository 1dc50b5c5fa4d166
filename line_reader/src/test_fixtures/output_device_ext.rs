// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{EolConvertingWriter, OutputDevice, StdMutex, StdoutMock};
use std::sync::Arc;

pub trait OutputDeviceExt {
    fn new_mock() -> (OutputDevice, StdoutMock);

    /// Same as [`Self::new_mock()`], but bare `\n`s are written as `\r\n`, the way
    /// [`OutputDevice::new_stdout()`] does in raw mode.
    fn new_mock_with_eol_conversion() -> (OutputDevice, StdoutMock);
}

impl OutputDeviceExt for OutputDevice {
    fn new_mock() -> (OutputDevice, StdoutMock) {
        let stdout_mock = StdoutMock::default();
        let this = OutputDevice {
            resource: Arc::new(StdMutex::new(stdout_mock.clone())),
            is_mock: true,
        };
        (this, stdout_mock)
    }

    fn new_mock_with_eol_conversion() -> (OutputDevice, StdoutMock) {
        let stdout_mock = StdoutMock::default();
        let this = OutputDevice {
            resource: Arc::new(StdMutex::new(EolConvertingWriter::new(
                stdout_mock.clone(),
            ))),
            is_mock: true,
        };
        (this, stdout_mock)
    }
}
