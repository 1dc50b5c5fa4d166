// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod async_input_stream_mock;
pub mod input_device_ext_mock;
pub mod output_device_ext;
pub mod stdout_mock;

// Re-export.
pub use async_input_stream_mock::*;
pub use input_device_ext_mock::*;
pub use output_device_ext::*;
pub use stdout_mock::*;
