// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{LineReader, OutputDevice, ReadlineError, ReadlineEvent,
            lock_output_device_as_mut};
use std::{future::Future,
          io::{self, Write}};
use tokio::{select,
            sync::{broadcast,
                   mpsc::{UnboundedReceiver, UnboundedSender},
                   oneshot},
            task::JoinHandle};

/// Which of the compute engine's output streams some bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum OutputChannel {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutput {
    pub channel: OutputChannel,
    pub bytes: Vec<u8>,
}

/// What travels from the [`EngineWriter`]s to the forwarder task.
#[derive(Debug)]
pub enum ForwarderMessage {
    Output(EngineOutput),
    /// Acknowledged once everything sent before it has been written to the display.
    Flush(oneshot::Sender<()>),
}

/// Cloneable [`Write`] that the compute engine uses for its `stdout` or `stderr`. The
/// bytes are not buffered or interpreted, each `write()` is sent as is to the task
/// started by [`spawn_task_to_forward_engine_output()`], which writes them to the
/// display in order.
#[derive(Debug, Clone)]
pub struct EngineWriter {
    pub channel: OutputChannel,
    pub sender: UnboundedSender<ForwarderMessage>,
}

impl EngineWriter {
    #[must_use]
    pub fn new(channel: OutputChannel, sender: UnboundedSender<ForwarderMessage>) -> Self {
        Self { channel, sender }
    }

    /// Waits until everything written so far (by any clone of any writer on the same
    /// channel) is on the display. [`Write::flush()`] can't do this, since it is not
    /// async.
    pub async fn flush_to_display(&self) {
        let (ack_sender, ack_receiver) = oneshot::channel();
        if self.sender.send(ForwarderMessage::Flush(ack_sender)).is_ok() {
            // An error means the forwarder is gone, there's nothing left to wait for.
            ack_receiver.await.ok();
        }
    }
}

impl Write for EngineWriter {
    fn write(&mut self, payload: &[u8]) -> io::Result<usize> {
        if payload.is_empty() {
            return Ok(0);
        }
        self.sender
            .send(ForwarderMessage::Output(EngineOutput {
                channel: self.channel,
                bytes: payload.to_vec(),
            }))
            .map_err(|_| io::Error::other("EngineWriter receiver has closed"))?;
        Ok(payload.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

/// Writes everything that arrives on `receiver` to `output_device`, until either all the
/// [`EngineWriter`]s are dropped, or `shutdown_receiver` fires. On shutdown, whatever is
/// already queued is still written.
pub fn spawn_task_to_forward_engine_output(
    mut receiver: UnboundedReceiver<ForwarderMessage>,
    output_device: OutputDevice,
    mut shutdown_receiver: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            select! {
                biased;

                maybe_message = receiver.recv() => {
                    match maybe_message {
                        Some(message) => handle(message, &output_device),
                        None => break,
                    }
                }

                _ = shutdown_receiver.recv() => {
                    while let Ok(message) = receiver.try_recv() {
                        handle(message, &output_device);
                    }
                    break;
                }
            }
        }
    })
}

fn handle(message: ForwarderMessage, output_device: &OutputDevice) {
    match message {
        ForwarderMessage::Output(output) => forward(&output, output_device),
        ForwarderMessage::Flush(ack_sender) => {
            ack_sender.send(()).ok();
        }
    }
}

fn forward(output: &EngineOutput, output_device: &OutputDevice) {
    // The lock is released before logging, logs may be written to this same device.
    let result = {
        let term = lock_output_device_as_mut!(output_device);
        term.write_all(&output.bytes).and_then(|()| term.flush())
    };
    if let Err(error) = result {
        // % is Display, ? is Debug.
        tracing::error!(
            message = "failed to forward engine output",
            channel = %output.channel,
            error = ?error
        );
    }
}

/// Everything a [`ComputeEngine`] gets to work with.
#[allow(missing_debug_implementations)]
pub struct EngineContext {
    /// Use [`LineReader::read_line()`] to get the next line of input.
    pub line_reader: LineReader,
    pub stdout: EngineWriter,
    pub stderr: EngineWriter,
    /// Receives a `()` when the interrupt chord is pressed while no read is pending, ie,
    /// while the engine is computing something.
    pub interrupt_receiver: broadcast::Receiver<()>,
}

impl EngineContext {
    /// Waits for the engine's output so far to reach the display, and then reads a line.
    /// Use this instead of calling [`LineReader::read_line()`] directly, so that the
    /// prompt never shows up ahead of output that was written before it.
    ///
    /// # Errors
    ///
    /// See [`LineReader::read_line()`].
    pub async fn read_line(
        &self,
        maybe_prompt: Option<&str>,
    ) -> Result<ReadlineEvent, ReadlineError> {
        self.stdout.flush_to_display().await;
        self.line_reader.read_line(maybe_prompt).await
    }
}

/// The thing that the line reader feeds lines into. It runs until it returns, which ends
/// the [`crate::TerminalSession::run_engine()`] call.
pub trait ComputeEngine {
    fn run(self, context: EngineContext) -> impl Future<Output = miette::Result<()>>;
}
