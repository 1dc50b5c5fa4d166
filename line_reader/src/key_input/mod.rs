// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod key_action;
pub mod key_event;
pub mod key_event_source;

// Re-export.
pub use key_action::*;
pub use key_event::*;
pub use key_event_source::*;
