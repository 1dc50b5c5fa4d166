// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod compute_engine;
pub mod config;
pub mod terminal_session;
pub mod tracing_setup;

// Re-export.
pub use compute_engine::*;
pub use config::*;
pub use terminal_session::*;
pub use tracing_setup::*;
