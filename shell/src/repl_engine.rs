// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::BuiltinCommand;
use miette::IntoDiagnostic;
use r3bl_line_reader::{ComputeEngine, EngineContext, ReadlineError, ReadlineEvent};
use std::{io::Write, time::Duration};
use tokio::{select, sync::broadcast::error::TryRecvError};

/// How long `iota` waits between two sheep.
pub const DEFAULT_IOTA_DELAY: Duration = Duration::from_millis(250);

/// Reads a line, runs it, repeat. Ends on `exit`, when a read is interrupted, or when
/// the keyboard input ends.
#[derive(Debug, Clone)]
pub struct ReplEngine {
    pub iota_delay: Duration,
}

impl Default for ReplEngine {
    fn default() -> Self {
        Self {
            iota_delay: DEFAULT_IOTA_DELAY,
        }
    }
}

impl ComputeEngine for ReplEngine {
    async fn run(self, mut context: EngineContext) -> miette::Result<()> {
        loop {
            let line = match context.read_line(None).await {
                Ok(ReadlineEvent::Line(line)) => line,
                Ok(ReadlineEvent::Interrupted) => {
                    tracing::debug!(message = "read interrupted, exiting");
                    break;
                }
                Err(ReadlineError::Closed) => {
                    tracing::debug!(message = "input ended, exiting");
                    break;
                }
                Err(error) => return Err(error).into_diagnostic(),
            };

            let command = BuiltinCommand::parse(&line);
            // % is Display, ? is Debug.
            tracing::debug!(message = "run command", command = %command);

            match command {
                BuiltinCommand::Empty => {}
                BuiltinCommand::Exit => break,
                BuiltinCommand::Echo(words) => {
                    writeln!(context.stdout, "{words}").into_diagnostic()?;
                }
                BuiltinCommand::Iota { maybe_limit } => {
                    self.iota(maybe_limit, &mut context).await?;
                }
                BuiltinCommand::InvalidArgument { command, argument } => {
                    writeln!(context.stderr, "{command}: invalid argument: {argument}")
                        .into_diagnostic()?;
                }
                BuiltinCommand::Unknown(command) => {
                    writeln!(context.stderr, "stream-shell: command not found: {command}")
                        .into_diagnostic()?;
                }
            }
        }

        Ok(())
    }
}

impl ReplEngine {
    async fn iota(
        &self,
        maybe_limit: Option<u64>,
        context: &mut EngineContext,
    ) -> miette::Result<()> {
        // Interrupts that arrived before this command started don't count.
        loop {
            match context.interrupt_receiver.try_recv() {
                Ok(()) | Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        let mut count: u64 = 0;
        while maybe_limit.is_none_or(|limit| count < limit) {
            select! {
                _ = context.interrupt_receiver.recv() => {
                    writeln!(context.stderr, "^C").into_diagnostic()?;
                    tracing::debug!(message = "iota interrupted", count = %count);
                    break;
                }
                () = tokio::time::sleep(self.iota_delay) => {
                    count += 1;
                    writeln!(context.stdout, "sheep {count}").into_diagnostic()?;
                }
            }
        }

        Ok(())
    }
}
