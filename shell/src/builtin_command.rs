// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// One line of input, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinCommand {
    /// Blank line.
    Empty,
    /// Prints its arguments, separated by one space.
    Echo(String),
    /// Prints `sheep 1`, `sheep 2`, ... until the limit (if any) or an interrupt.
    Iota { maybe_limit: Option<u64> },
    Exit,
    /// Known command, bad argument.
    InvalidArgument { command: String, argument: String },
    Unknown(String),
}

impl BuiltinCommand {
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return BuiltinCommand::Empty;
        };

        match command {
            "echo" => BuiltinCommand::Echo(words.collect::<Vec<_>>().join(" ")),
            "exit" => BuiltinCommand::Exit,
            "iota" => match words.next() {
                None => BuiltinCommand::Iota { maybe_limit: None },
                Some(argument) => match argument.parse::<u64>() {
                    Ok(limit) => BuiltinCommand::Iota {
                        maybe_limit: Some(limit),
                    },
                    Err(_) => BuiltinCommand::InvalidArgument {
                        command: command.to_string(),
                        argument: argument.to_string(),
                    },
                },
            },
            _ => BuiltinCommand::Unknown(command.to_string()),
        }
    }
}

impl Display for BuiltinCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BuiltinCommand::Empty => write!(f, ""),
            BuiltinCommand::Echo(words) => write!(f, "echo {words}"),
            BuiltinCommand::Iota { maybe_limit: None } => write!(f, "iota"),
            BuiltinCommand::Iota {
                maybe_limit: Some(limit),
            } => write!(f, "iota {limit}"),
            BuiltinCommand::Exit => write!(f, "exit"),
            BuiltinCommand::InvalidArgument { command, argument } => {
                write!(f, "{command} {argument}")
            }
            BuiltinCommand::Unknown(command) => write!(f, "{command}"),
        }
    }
}
