// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod line_reader;
pub mod pending_line;
pub mod read_slot;
pub mod readline_event;

// Re-export.
pub use line_reader::*;
pub use pending_line::*;
pub use read_slot::*;
pub use readline_event::*;
