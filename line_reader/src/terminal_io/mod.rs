// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod eol_converting_writer;
pub mod input_device;
pub mod output_device;

// Re-export.
pub use eol_converting_writer::*;
pub use input_device::*;
pub use output_device::*;
