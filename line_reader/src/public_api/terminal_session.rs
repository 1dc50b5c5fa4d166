// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{ComputeEngine, DEBUG_LINE_READER_MOD, EngineContext, EngineWriter, InputDevice,
            KeyEventSource, LineReader, LineReaderConfig, OutputChannel, OutputDevice,
            lock_output_device_as_mut, spawn_task_to_forward_engine_output};
use crossterm::{ExecutableCommand,
                event::{DisableBracketedPaste, EnableBracketedPaste},
                terminal::{disable_raw_mode, enable_raw_mode}};
use miette::IntoDiagnostic;
use std::io::{self, IsTerminal, Write};
use tokio::{select,
            sync::{broadcast, mpsc::unbounded_channel},
            task::JoinHandle};

/// Wires up the pieces that a terminal front end for a compute engine needs:
/// - an [`OutputDevice`] (the display),
/// - a [`KeyEventSource`] that the key pump feeds,
/// - the [`LineReader`] subscribed to it.
///
/// Use [`Self::try_new_interactive()`] for a real terminal, and [`Self::new()`] to supply
/// your own output device (eg, for tests).
#[allow(missing_debug_implementations)]
pub struct TerminalSession {
    pub line_reader: LineReader,
    pub key_event_source: KeyEventSource,
    pub output_device: OutputDevice,
    pub config: LineReaderConfig,
    /// When true, raw mode and bracketed paste are turned off on drop.
    is_raw_mode: bool,
}

impl TerminalSession {
    /// Writes the welcome message from the config (if any) to `output_device`.
    ///
    /// # Errors
    ///
    /// If the welcome message can't be written.
    pub fn new(output_device: OutputDevice, config: LineReaderConfig) -> miette::Result<Self> {
        let it = Self::assemble(output_device, config, false);
        it.write_welcome_message()?;
        Ok(it)
    }

    /// Returns `None` if stdin or stdout is not a terminal (eg, piped). Otherwise puts the
    /// terminal in raw mode with bracketed paste, until this is dropped.
    ///
    /// # Errors
    ///
    /// If raw mode can't be enabled, or the welcome message can't be written.
    pub fn try_new_interactive(config: LineReaderConfig) -> miette::Result<Option<Self>> {
        if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
            tracing::debug!(message = "stdin or stdout is not a terminal");
            return Ok(None);
        }

        // Enable raw mode. Drop will disable raw mode.
        enable_raw_mode().into_diagnostic()?;
        let output_device = OutputDevice::new_stdout(config.convert_eol);
        let it = Self::assemble(output_device, config, true);

        lock_output_device_as_mut!(it.output_device)
            .execute(EnableBracketedPaste)
            .into_diagnostic()?;
        it.write_welcome_message()?;

        Ok(Some(it))
    }

    fn assemble(output_device: OutputDevice, config: LineReaderConfig, is_raw_mode: bool) -> Self {
        let key_event_source = KeyEventSource::new();
        let line_reader =
            LineReader::new(output_device.clone(), key_event_source.clone(), &config);
        Self {
            line_reader,
            key_event_source,
            output_device,
            config,
            is_raw_mode,
        }
    }

    fn write_welcome_message(&self) -> miette::Result<()> {
        let Some(welcome_message) = &self.config.welcome_message else {
            return Ok(());
        };
        let term = lock_output_device_as_mut!(self.output_device);
        writeln!(term, "{welcome_message}").into_diagnostic()?;
        term.flush().into_diagnostic()
    }

    /// Reads events from `input_device`, and dispatches the key presses (and pastes) to
    /// the [`KeyEventSource`], in order. Stops when `shutdown_receiver` fires, or when
    /// the input ends (or fails). In the latter case the line reader's input is closed,
    /// so the engine isn't left waiting on a read that can never finish.
    pub fn spawn_key_pump(
        &self,
        mut input_device: InputDevice,
        mut shutdown_receiver: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let key_event_source = self.key_event_source.clone();
        let line_reader = self.line_reader.clone();
        tokio::spawn(async move {
            loop {
                select! {
                    maybe_key_event = input_device.next_key_event() => {
                        let Some(key_event) = maybe_key_event else {
                            tracing::debug!(message = "input ended, key pump stopping");
                            line_reader.close_input();
                            break;
                        };
                        DEBUG_LINE_READER_MOD.then(|| {
                            // % is Display, ? is Debug.
                            tracing::debug!(message = "key pump", key_event = ?key_event);
                        });
                        key_event_source.dispatch(&key_event);
                    }

                    _ = shutdown_receiver.recv() => {
                        break;
                    }
                }
            }
        })
    }

    /// Runs `engine` until it returns. Meanwhile keystrokes from `input_device` feed the
    /// line reader, and the engine's `stdout` and `stderr` are forwarded to the display.
    ///
    /// # Errors
    ///
    /// Whatever the engine returns, or a failure to join the helper tasks.
    pub async fn run_engine(
        &self,
        engine: impl ComputeEngine,
        input_device: InputDevice,
    ) -> miette::Result<()> {
        let (shutdown_sender, _) = broadcast::channel::<()>(1);
        let (output_sender, output_receiver) = unbounded_channel();

        let forwarder_handle = spawn_task_to_forward_engine_output(
            output_receiver,
            self.output_device.clone(),
            shutdown_sender.subscribe(),
        );
        let key_pump_handle = self.spawn_key_pump(input_device, shutdown_sender.subscribe());

        let context = EngineContext {
            line_reader: self.line_reader.clone(),
            stdout: EngineWriter::new(OutputChannel::Stdout, output_sender.clone()),
            stderr: EngineWriter::new(OutputChannel::Stderr, output_sender),
            interrupt_receiver: self.line_reader.subscribe_to_interrupts(),
        };

        let result = engine.run(context).await;
        tracing::debug!(message = "engine done", is_ok = %result.is_ok());

        // Err means both tasks have already stopped.
        shutdown_sender.send(()).ok();
        forwarder_handle.await.into_diagnostic()?;
        key_pump_handle.await.into_diagnostic()?;

        result
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if !self.is_raw_mode {
            return;
        }
        lock_output_device_as_mut!(self.output_device)
            .execute(DisableBracketedPaste)
            .ok();
        disable_raw_mode().ok();
    }
}
