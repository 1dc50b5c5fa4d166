// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(bin_name = "stream-shell")]
#[command(about = "🐑 A tiny shell that streams output, and stops when you press Ctrl+C")]
#[command(version)]
#[command(next_line_help = true)]
/// More info: <https://docs.rs/clap/latest/clap/struct.Command.html#method.help_template>
#[command(
    help_template = "{about}\nVersion: {bin} {version} 💻\n\nUSAGE 📓:\n  stream-shell [\x1b[34mOptions\x1b[0m]\n\n{all-args}\n"
)]
/// More info:
/// - <https://docs.rs/clap/latest/clap/_derive/#overview>
pub struct CLIArg {
    #[arg(long, short = 'p', help = "Prompt to show, overrides the config file")]
    pub prompt: Option<String>,

    #[arg(
        long,
        short = 'c',
        value_name = "path",
        help = "Config file to use, instead of the one in your config folder"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        short = 'l',
        value_name = "path",
        help = "Log debug output to this file"
    )]
    pub log_file: Option<PathBuf>,
}
