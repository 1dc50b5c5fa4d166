// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod line_buffer;
pub mod line_editor;

// Re-export.
pub use line_buffer::*;
pub use line_editor::*;
