// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! `stream-shell` is a tiny shell that runs on top of [`r3bl_line_reader`]. It exists to
//! show a [`r3bl_line_reader::ComputeEngine`] that streams output while the user can
//! still interrupt it, or clear the screen.
//!
//! ```text
//! > iota 3
//! sheep 1
//! sheep 2
//! sheep 3
//! > exit
//! ```

// https://github.com/rust-lang/rust-clippy
// https://rust-lang.github.io/rust-clippy/master/index.html
#![warn(rust_2018_idioms)]

// Attach sources.
pub mod app;
pub mod builtin_command;
pub mod clap_config;
pub mod repl_engine;

// Re-export.
pub use app::*;
pub use builtin_command::*;
pub use clap_config::*;
pub use repl_engine::*;
