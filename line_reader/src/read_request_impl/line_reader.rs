// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{BusyReadPolicy, CHANNEL_CAPACITY, CRLF, DEBUG_LINE_READER_MOD, KeyAction,
            KeyEvent, KeyEventSource, Keymap, LineEditor, LineReaderConfig, OutputDevice,
            PendingLine, PendingRead, ReadId, ReadState, ReadlineError, ReadlineEvent,
            SafeReadSlot, StdMutex, Subscription, lock_or_recover,
            lock_output_device_as_mut};
use std::{io::{self, Write},
          sync::{Arc, Weak}};
use tokio::sync::{broadcast, oneshot};

/// # Mental model and overview
///
/// This is the read-request controller. It hands out lines of input, one read at a time,
/// to the compute engine (or any other caller). It is the async replacement for
/// [`std::io::BufRead::read_line`], and it never blocks a thread.
///
/// ```text
///            begin_read()                  Enter / Ctrl-C / interrupt()
///   Idle ───────────────────► Reading ─────────────────────────────────► Idle
///                              │    ▲       (PendingRead taken out of
///                              └────┘        the slot, and resolved)
///                           any other key
///                      (LineEditor insert, delete)
/// ```
///
/// - [`Self::begin_read()`] installs a [`PendingRead`] in the [`crate::ReadSlot`],
///   prints the prompt, and subscribes a listener to the [`KeyEventSource`] that feeds
///   the [`LineEditor`]. It returns a [`PendingLine`] future.
/// - When Enter arrives, a newline is echoed, and the pending read resolves with
///   [`ReadlineEvent::Line`] (trimmed).
/// - When the interrupt chord arrives (or [`Self::interrupt()`] is called), a newline is
///   echoed, and the pending read resolves with [`ReadlineEvent::Interrupted`]. If no read
///   is pending, the interrupt is broadcast to the compute engine instead (see
///   [`Self::subscribe_to_interrupts()`]).
/// - The clear screen chord works whether or not a read is pending. It never changes
///   the line that is being edited.
/// - When the keystroke input ends, the host calls [`Self::close_input()`]. The pending
///   read (if any) fails with [`ReadlineError::Closed`], and so does every later read.
///
/// Resolution always takes the [`PendingRead`] out of the slot first. So when Enter and
/// Ctrl-C race, the first one wins, and the other finds nothing to resolve. The
/// keystroke subscription of a read is dropped in the same callback that resolves it, so
/// no keystroke is ever delivered to a read that is done.
///
/// # Dependency injection
///
/// The display is an [`OutputDevice`], and keystrokes come from a [`KeyEventSource`].
/// Tests use [`crate::OutputDeviceExt::new_mock()`] and call
/// [`KeyEventSource::dispatch()`] directly.
///
/// # Cloning
///
/// It is safe to clone, all the clones share the same read slot. The global shortcut
/// listener is unsubscribed when the last clone is dropped.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct LineReader {
    pub safe_read_slot: SafeReadSlot,
    pub output_device: OutputDevice,
    pub key_event_source: KeyEventSource,
    pub keymap: Arc<Keymap>,
    pub busy_read_policy: BusyReadPolicy,
    pub default_prompt: Arc<str>,
    /// Used to tell the compute engine to stop what it is doing.
    pub interrupt_sender: broadcast::Sender<()>,
    /// Interrupt and clear screen are handled here, for the lifetime of the reader.
    global_shortcuts_subscription: Arc<Subscription>,
}

impl LineReader {
    pub fn new(
        output_device: OutputDevice,
        key_event_source: KeyEventSource,
        config: &LineReaderConfig,
    ) -> Self {
        let safe_read_slot: SafeReadSlot = Arc::new(StdMutex::new(Default::default()));
        let keymap = Arc::new(config.keymap.clone());
        let (interrupt_sender, _) = broadcast::channel(CHANNEL_CAPACITY);

        let global_shortcuts_subscription = {
            let weak_read_slot = Arc::downgrade(&safe_read_slot);
            let output_device = output_device.clone();
            let keymap = keymap.clone();
            let interrupt_sender = interrupt_sender.clone();
            key_event_source.subscribe(move |event: &KeyEvent| {
                global_shortcuts::handle(
                    event,
                    &keymap,
                    &weak_read_slot,
                    &output_device,
                    &interrupt_sender,
                );
            })
        };

        Self {
            safe_read_slot,
            output_device,
            key_event_source,
            keymap,
            busy_read_policy: config.busy_read_policy,
            default_prompt: Arc::from(config.prompt.as_str()),
            interrupt_sender,
            global_shortcuts_subscription: Arc::new(global_shortcuts_subscription),
        }
    }

    /// Starts a read. Prints `maybe_prompt` (or the default prompt from the config), and
    /// returns a [`PendingLine`] that resolves once Enter or the interrupt chord is
    /// pressed.
    ///
    /// # Errors
    ///
    /// - [`ReadlineError::BusyRead`] if a read is already pending, and the policy is
    ///   [`BusyReadPolicy::Reject`].
    /// - [`ReadlineError::IO`] if the prompt can't be printed.
    /// - [`ReadlineError::Closed`] if the keystroke input has ended.
    pub fn begin_read(&self, maybe_prompt: Option<&str>) -> Result<PendingLine, ReadlineError> {
        let mut read_slot = lock_or_recover(&self.safe_read_slot);

        if read_slot.is_input_closed() {
            return Err(ReadlineError::Closed);
        }

        let maybe_existing = read_slot
            .pending()
            .map(|it| (it.read_id, it.is_abandoned()));
        match (maybe_existing, self.busy_read_policy) {
            (None, _) => {}
            (Some((read_id, true)), _) => {
                drop(read_slot.take_pending());
                tracing::debug!(message = "dropped abandoned read", read_id = %read_id);
            }
            (Some((_, false)), BusyReadPolicy::Reject) => {
                return Err(ReadlineError::BusyRead);
            }
            (Some((read_id, false)), BusyReadPolicy::Supersede) => {
                if let Some(superseded) = read_slot.take_pending() {
                    echo_crlf(&self.output_device);
                    tracing::debug!(message = "superseded read", read_id = %read_id);
                    superseded.resolve(ReadlineEvent::Interrupted);
                }
            }
        }

        let read_id = read_slot.next_read_id();
        let prompt = maybe_prompt.unwrap_or(&self.default_prompt);
        let editor = LineEditor::new(prompt);
        editor.render(lock_output_device_as_mut!(self.output_device))?;

        let (resolver, receiver) = oneshot::channel();
        let subscription = {
            let weak_read_slot = Arc::downgrade(&self.safe_read_slot);
            let output_device = self.output_device.clone();
            let keymap = self.keymap.clone();
            self.key_event_source.subscribe(move |event: &KeyEvent| {
                pending_read_keys::handle(
                    event,
                    read_id,
                    &keymap,
                    &weak_read_slot,
                    &output_device,
                );
            })
        };

        read_slot.install(PendingRead {
            read_id,
            editor,
            resolver,
            subscription,
        });

        // % is Display, ? is Debug.
        tracing::debug!(message = "begin read", read_id = %read_id, prompt = ?prompt);

        Ok(PendingLine::new(
            read_id,
            receiver,
            Arc::downgrade(&self.safe_read_slot),
        ))
    }

    /// Convenience method that calls [`Self::begin_read()`] and awaits the result.
    ///
    /// # Errors
    ///
    /// See [`Self::begin_read()`]. Also [`ReadlineError::Closed`] if the reader goes away
    /// while the read is pending.
    pub async fn read_line(
        &self,
        maybe_prompt: Option<&str>,
    ) -> Result<ReadlineEvent, ReadlineError> {
        self.begin_read(maybe_prompt)?.await
    }

    /// Cancels the pending read with [`ReadlineEvent::Interrupted`], and returns `true`.
    /// If no read is pending, broadcasts an interrupt to the compute engine, and returns
    /// `false`.
    pub fn interrupt(&self) -> bool {
        interrupt_impl(
            &self.safe_read_slot,
            &self.output_device,
            &self.interrupt_sender,
        )
    }

    /// Called by the host once no more keystrokes will arrive (the input stream ended or
    /// failed). The pending read, if any, resolves with [`ReadlineError::Closed`] instead
    /// of waiting forever, and later reads fail right away.
    pub fn close_input(&self) {
        // Take it out while holding the lock, drop it after the lock is released.
        let maybe_pending_read = lock_or_recover(&self.safe_read_slot).close_input();
        match maybe_pending_read {
            Some(pending_read) => {
                echo_crlf(&self.output_device);
                tracing::debug!(message = "input closed", read_id = %pending_read.read_id);
                // Dropping the resolver wakes up the caller with an error.
                drop(pending_read);
            }
            None => tracing::debug!(message = "input closed while idle"),
        }
    }

    /// Clears the screen, and renders the pending read's prompt and line again (if any).
    ///
    /// # Errors
    ///
    /// If writing to the display fails.
    pub fn clear_screen(&self) -> io::Result<()> {
        clear_screen_impl(&self.safe_read_slot, &self.output_device)
    }

    #[must_use]
    pub fn state(&self) -> ReadState { lock_or_recover(&self.safe_read_slot).state() }

    /// A copy of the text of the pending read, if any.
    #[must_use]
    pub fn pending_text(&self) -> Option<String> {
        lock_or_recover(&self.safe_read_slot)
            .pending()
            .map(|it| it.editor.buffer().as_str().to_string())
    }

    /// The receiver gets a `()` each time the interrupt chord is pressed (or
    /// [`Self::interrupt()`] is called) while no read is pending.
    #[must_use]
    pub fn subscribe_to_interrupts(&self) -> broadcast::Receiver<()> {
        self.interrupt_sender.subscribe()
    }

    #[must_use]
    pub fn is_global_shortcuts_active(&self) -> bool {
        self.global_shortcuts_subscription.is_active()
    }
}

/// Best effort, there's nobody to report a display error to from inside a listener.
/// The lock is released before logging, since logs may be written to this same device.
fn echo_crlf(output_device: &OutputDevice) {
    let result = {
        let term = lock_output_device_as_mut!(output_device);
        term.write_all(CRLF.as_bytes()).and_then(|()| term.flush())
    };
    if let Err(error) = result {
        tracing::error!(message = "failed to echo newline", error = ?error);
    }
}

fn interrupt_impl(
    safe_read_slot: &SafeReadSlot,
    output_device: &OutputDevice,
    interrupt_sender: &broadcast::Sender<()>,
) -> bool {
    let maybe_pending_read = lock_or_recover(safe_read_slot).take_pending();
    match maybe_pending_read {
        Some(pending_read) => {
            echo_crlf(output_device);
            pending_read.resolve(ReadlineEvent::Interrupted);
            true
        }
        None => {
            let receiver_count = interrupt_sender.send(()).unwrap_or(0);
            tracing::debug!(
                message = "interrupt while idle, sent to compute engine",
                receiver_count = %receiver_count
            );
            false
        }
    }
}

fn clear_screen_impl(
    safe_read_slot: &SafeReadSlot,
    output_device: &OutputDevice,
) -> io::Result<()> {
    let read_slot = lock_or_recover(safe_read_slot);
    let term = lock_output_device_as_mut!(output_device);
    OutputDevice::clear_screen(term)?;
    if let Some(pending_read) = read_slot.pending() {
        pending_read.editor.render(term)?;
    }
    Ok(())
}

/// Interrupt and clear screen. These are active for the whole lifetime of the
/// [`LineReader`], whether or not a read is pending.
mod global_shortcuts {
    use super::{KeyAction, KeyEvent, Keymap, OutputDevice, SafeReadSlot, Weak,
                broadcast, clear_screen_impl, interrupt_impl};
    use crate::{ReadSlot, StdMutex};

    pub fn handle(
        event: &KeyEvent,
        keymap: &Keymap,
        weak_read_slot: &Weak<StdMutex<ReadSlot>>,
        output_device: &OutputDevice,
        interrupt_sender: &broadcast::Sender<()>,
    ) {
        let action = keymap.classify(event);
        if !action.is_global() {
            return;
        }
        let Some(safe_read_slot): Option<SafeReadSlot> = weak_read_slot.upgrade() else {
            return;
        };
        match action {
            KeyAction::Interrupt => {
                interrupt_impl(&safe_read_slot, output_device, interrupt_sender);
            }
            KeyAction::ClearScreen => {
                if let Err(error) = clear_screen_impl(&safe_read_slot, output_device) {
                    tracing::error!(message = "failed to clear screen", error = ?error);
                }
            }
            _ => {}
        }
    }
}

/// Keys for the one [`PendingRead`] identified by `read_id`. Keys that arrive after that
/// read has been resolved are dropped.
mod pending_read_keys {
    use super::{DEBUG_LINE_READER_MOD, KeyAction, KeyEvent, Keymap, OutputDevice, ReadId,
                ReadlineEvent, Weak, echo_crlf, lock_or_recover, lock_output_device_as_mut};
    use crate::{ReadSlot, StdMutex};
    use std::io;

    pub fn handle(
        event: &KeyEvent,
        read_id: ReadId,
        keymap: &Keymap,
        weak_read_slot: &Weak<StdMutex<ReadSlot>>,
        output_device: &OutputDevice,
    ) {
        let action = keymap.classify(event);
        if action.is_global() || action == KeyAction::Ignore {
            return;
        }
        let Some(safe_read_slot) = weak_read_slot.upgrade() else {
            return;
        };

        DEBUG_LINE_READER_MOD.then(|| {
            // % is Display, ? is Debug.
            tracing::debug!(
                message = "pending read key",
                read_id = %read_id,
                action = %<&'static str>::from(&action)
            );
        });

        let mut read_slot = lock_or_recover(&safe_read_slot);

        if action == KeyAction::Submit {
            let Some(mut pending_read) = read_slot.take_pending_for(read_id) else {
                return;
            };
            drop(read_slot);
            echo_crlf(output_device);
            let line = pending_read.editor.commit();
            pending_read.resolve(ReadlineEvent::Line(line));
            return;
        }

        let Some(pending_read) = read_slot.pending_mut_for(read_id) else {
            return;
        };
        // Release the output device before logging, logs may be written to it.
        let result: io::Result<()> = {
            let term = lock_output_device_as_mut!(output_device);
            match action {
                KeyAction::Insert(text) => pending_read.editor.insert(&text, term),
                KeyAction::DeleteLast => pending_read.editor.delete_last(term).map(|_| ()),
                KeyAction::KillLine => pending_read.editor.clear_line(term),
                _ => Ok(()),
            }
        };

        DEBUG_LINE_READER_MOD.then(|| {
            // % is Display, ? is Debug.
            tracing::debug!(
                message = "edited",
                read_id = %read_id,
                line = %pending_read.editor.buffer()
            );
        });

        if let Err(error) = result {
            tracing::error!(message = "failed to echo key", read_id = %read_id, error = ?error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DisplayPreference, Key, ModifierKeysMask, OutputDeviceExt, SpecialKey,
                StdoutMock, TracingConfig, WriterArg, try_create_layers};
    use pretty_assertions::assert_eq;
    use std::{sync::mpsc, thread, time::Duration};
    use tracing_subscriber::layer::SubscriberExt;

    /// Fails any single write of exactly `rejected`, everything else goes to the mock.
    struct RejectingWriter {
        stdout_mock: StdoutMock,
        rejected: &'static [u8],
    }

    impl Write for RejectingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf == self.rejected {
                return Err(io::Error::other("display unplugged"));
            }
            self.stdout_mock.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> { self.stdout_mock.flush() }
    }

    fn new_line_reader() -> (LineReader, KeyEventSource, StdoutMock) {
        new_line_reader_with_config(&LineReaderConfig::default())
    }

    fn new_line_reader_with_config(
        config: &LineReaderConfig,
    ) -> (LineReader, KeyEventSource, StdoutMock) {
        let (output_device, stdout_mock) = OutputDevice::new_mock();
        let key_event_source = KeyEventSource::new();
        let line_reader = LineReader::new(output_device, key_event_source.clone(), config);
        (line_reader, key_event_source, stdout_mock)
    }

    fn type_text(source: &KeyEventSource, text: &str) {
        for event in KeyEvent::typed(text) {
            source.dispatch(&event);
        }
    }

    fn press_enter(source: &KeyEventSource) {
        source.dispatch(&KeyEvent::special(SpecialKey::Enter));
    }

    fn press_backspace(source: &KeyEventSource) {
        source.dispatch(&KeyEvent::special(SpecialKey::Backspace));
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_typed_text_then_enter_resolves_trimmed_line() {
        let (line_reader, source, stdout_mock) = new_line_reader();

        let pending_line = line_reader.begin_read(Some("$ ")).unwrap();
        assert_eq!(line_reader.state(), ReadState::Reading);

        type_text(&source, "  echo hello  ");
        press_enter(&source);

        assert_eq!(
            pending_line.await.unwrap(),
            ReadlineEvent::Line("echo hello".to_string())
        );
        assert_eq!(line_reader.state(), ReadState::Idle);
        assert_eq!(
            stdout_mock.get_copy_of_buffer_as_string(),
            "$   echo hello  \r\n"
        );
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_default_prompt_from_config() {
        let config = LineReaderConfig {
            prompt: "stream-shell v0.1 🚀> ".to_string(),
            ..Default::default()
        };
        let (line_reader, source, stdout_mock) = new_line_reader_with_config(&config);

        let pending_line = line_reader.begin_read(None).unwrap();
        press_enter(&source);

        assert_eq!(pending_line.await.unwrap(), ReadlineEvent::Line(String::new()));
        assert_eq!(
            stdout_mock.get_copy_of_buffer_as_string(),
            "stream-shell v0.1 🚀> \r\n"
        );
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_backspace_removes_one_codepoint() {
        let (line_reader, source, _stdout_mock) = new_line_reader();

        let pending_line = line_reader.begin_read(Some("")).unwrap();
        type_text(&source, "a😀b");

        press_backspace(&source);
        assert_eq!(line_reader.pending_text(), Some("a😀".to_string()));

        press_backspace(&source);
        assert_eq!(line_reader.pending_text(), Some("a".to_string()));

        press_enter(&source);
        assert_eq!(pending_line.await.unwrap(), ReadlineEvent::Line("a".to_string()));
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_backspace_on_empty_line_echoes_nothing() {
        let (line_reader, source, stdout_mock) = new_line_reader();

        let _pending_line = line_reader.begin_read(Some("> ")).unwrap();
        press_backspace(&source);
        source.dispatch(&KeyEvent::char('\x7f'));

        assert_eq!(line_reader.pending_text(), Some(String::new()));
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "> ");
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_ctrl_c_resolves_interrupted() {
        let (line_reader, source, stdout_mock) = new_line_reader();

        let pending_line = line_reader.begin_read(Some("> ")).unwrap();
        type_text(&source, "rm -rf /");
        source.dispatch(&KeyEvent::ctrl('c'));

        assert_eq!(pending_line.await.unwrap(), ReadlineEvent::Interrupted);
        assert_eq!(line_reader.state(), ReadState::Idle);
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "> rm -rf /\r\n");
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_enter_and_ctrl_c_resolve_exactly_once() {
        let (line_reader, source, _stdout_mock) = new_line_reader();
        let mut interrupt_receiver = line_reader.subscribe_to_interrupts();

        let mut pending_line = line_reader.begin_read(Some("")).unwrap();
        type_text(&source, "ls");
        press_enter(&source);
        source.dispatch(&KeyEvent::ctrl('c'));

        assert_eq!(
            pending_line.try_resolved().unwrap().unwrap(),
            ReadlineEvent::Line("ls".to_string())
        );
        // The late Ctrl-C found no pending read, so it went to the compute engine.
        assert_eq!(interrupt_receiver.try_recv(), Ok(()));
        assert_eq!(line_reader.key_event_source.listener_count(), 1);
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_ctrl_c_then_enter_resolve_exactly_once() {
        let (line_reader, source, stdout_mock) = new_line_reader();

        let mut pending_line = line_reader.begin_read(Some("")).unwrap();
        type_text(&source, "ls");
        source.dispatch(&KeyEvent::ctrl('c'));
        press_enter(&source);

        assert_eq!(
            pending_line.try_resolved().unwrap().unwrap(),
            ReadlineEvent::Interrupted
        );
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "ls\r\n");
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_clear_screen_keeps_buffer() {
        let (line_reader, source, stdout_mock) = new_line_reader();

        let pending_line = line_reader.begin_read(Some("> ")).unwrap();
        type_text(&source, "ab");
        stdout_mock.clear();

        source.dispatch(&KeyEvent::meta('k'));
        assert_eq!(line_reader.state(), ReadState::Reading);
        assert_eq!(
            stdout_mock.get_copy_of_buffer_as_string(),
            "\x1b[2J\x1b[1;1H> ab"
        );

        type_text(&source, "c");
        press_enter(&source);

        assert_eq!(pending_line.await.unwrap(), ReadlineEvent::Line("abc".to_string()));
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_clear_screen_while_idle() {
        let (line_reader, source, stdout_mock) = new_line_reader();

        source.dispatch(&KeyEvent::ctrl('l'));

        assert_eq!(line_reader.state(), ReadState::Idle);
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "\x1b[2J\x1b[1;1H");
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_kill_line() {
        let (line_reader, source, stdout_mock) = new_line_reader();

        let pending_line = line_reader.begin_read(Some("> ")).unwrap();
        type_text(&source, "oops");
        source.dispatch(&KeyEvent::new(
            Key::Character('\x7f'),
            ModifierKeysMask::new().with_meta(),
        ));
        assert_eq!(line_reader.pending_text(), Some(String::new()));

        type_text(&source, "ok");
        press_enter(&source);

        assert_eq!(pending_line.await.unwrap(), ReadlineEvent::Line("ok".to_string()));
        assert_eq!(
            stdout_mock.get_copy_of_buffer_as_string(),
            "> oops\x1b[2K\x1b[1G> ok\r\n"
        );
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_next_read_starts_empty_without_duplicate_echo() {
        let (line_reader, source, stdout_mock) = new_line_reader();
        let base_listener_count = source.listener_count();

        let first = line_reader.begin_read(Some("")).unwrap();
        assert_eq!(source.listener_count(), base_listener_count + 1);
        type_text(&source, "one");
        press_enter(&source);
        assert_eq!(first.await.unwrap(), ReadlineEvent::Line("one".to_string()));
        assert_eq!(source.listener_count(), base_listener_count);

        let second = line_reader.begin_read(Some("")).unwrap();
        assert_eq!(line_reader.pending_text(), Some(String::new()));
        type_text(&source, "two");
        press_enter(&source);
        assert_eq!(second.await.unwrap(), ReadlineEvent::Line("two".to_string()));

        assert_eq!(source.listener_count(), base_listener_count);
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "one\r\ntwo\r\n");
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_busy_read_is_rejected() {
        let (line_reader, source, _stdout_mock) = new_line_reader();

        let first = line_reader.begin_read(Some("")).unwrap();
        let second = line_reader.begin_read(Some(""));
        assert!(matches!(second, Err(ReadlineError::BusyRead)));

        type_text(&source, "x");
        press_enter(&source);
        assert_eq!(first.await.unwrap(), ReadlineEvent::Line("x".to_string()));
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_busy_read_supersedes() {
        let config = LineReaderConfig {
            busy_read_policy: BusyReadPolicy::Supersede,
            ..Default::default()
        };
        let (line_reader, source, _stdout_mock) = new_line_reader_with_config(&config);

        let first = line_reader.begin_read(Some("")).unwrap();
        type_text(&source, "old");
        let second = line_reader.begin_read(Some("")).unwrap();

        assert_eq!(first.await.unwrap(), ReadlineEvent::Interrupted);

        type_text(&source, "new");
        press_enter(&source);
        assert_eq!(second.await.unwrap(), ReadlineEvent::Line("new".to_string()));
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_dropped_pending_line_abandons_read() {
        let (line_reader, source, _stdout_mock) = new_line_reader();
        let base_listener_count = source.listener_count();

        let pending_line = line_reader.begin_read(Some("")).unwrap();
        drop(pending_line);

        assert_eq!(line_reader.state(), ReadState::Idle);
        assert_eq!(source.listener_count(), base_listener_count);
        assert!(line_reader.begin_read(Some("")).is_ok());
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_interrupt_from_host() {
        let (line_reader, _source, _stdout_mock) = new_line_reader();
        let mut interrupt_receiver = line_reader.subscribe_to_interrupts();

        let pending_line = line_reader.begin_read(Some("")).unwrap();
        assert!(line_reader.interrupt());
        assert_eq!(pending_line.await.unwrap(), ReadlineEvent::Interrupted);
        assert!(interrupt_receiver.try_recv().is_err());

        assert!(!line_reader.interrupt());
        assert_eq!(interrupt_receiver.try_recv(), Ok(()));
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_punctuation_with_alt_gr_is_inserted() {
        let (line_reader, source, _stdout_mock) = new_line_reader();

        let pending_line = line_reader.begin_read(Some("")).unwrap();
        type_text(&source, "ls ");
        source.dispatch(&KeyEvent::new(
            Key::Character('|'),
            ModifierKeysMask::new().with_ctrl().with_alt(),
        ));
        type_text(&source, " wc");
        press_enter(&source);

        assert_eq!(
            pending_line.await.unwrap(),
            ReadlineEvent::Line("ls | wc".to_string())
        );
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_keys_while_idle_are_ignored() {
        let (line_reader, source, stdout_mock) = new_line_reader();

        type_text(&source, "lost");
        press_enter(&source);

        assert_eq!(line_reader.state(), ReadState::Idle);
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "");
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_reader_dropped_closes_pending_line() {
        let (line_reader, source, _stdout_mock) = new_line_reader();

        let pending_line = line_reader.begin_read(Some("")).unwrap();
        drop(line_reader);
        source.dispatch(&KeyEvent::char('x'));

        assert!(matches!(pending_line.await, Err(ReadlineError::Closed)));
        assert_eq!(source.listener_count(), 0);
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_close_input_fails_pending_and_later_reads() {
        let (line_reader, source, stdout_mock) = new_line_reader();
        let base_listener_count = source.listener_count();

        let pending_line = line_reader.begin_read(Some("> ")).unwrap();
        type_text(&source, "half");
        line_reader.close_input();

        assert!(matches!(pending_line.await, Err(ReadlineError::Closed)));
        assert_eq!(line_reader.state(), ReadState::Idle);
        assert_eq!(source.listener_count(), base_listener_count);
        assert!(matches!(
            line_reader.begin_read(None),
            Err(ReadlineError::Closed)
        ));
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "> half\r\n");
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_close_input_while_idle() {
        let (line_reader, _source, stdout_mock) = new_line_reader();

        line_reader.close_input();

        assert!(matches!(
            line_reader.read_line(Some("> ")).await,
            Err(ReadlineError::Closed)
        ));
        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "");
    }

    #[test]
    fn test_global_shortcuts_live_until_last_clone_dropped() {
        let (line_reader, source, _stdout_mock) = new_line_reader();
        assert!(line_reader.is_global_shortcuts_active());

        let clone = line_reader.clone();
        drop(line_reader);
        assert!(clone.is_global_shortcuts_active());
        assert_eq!(source.listener_count(), 1);

        drop(clone);
        assert_eq!(source.listener_count(), 0);
    }

    #[test]
    fn test_enter_and_interrupt_on_another_thread_resolve_exactly_once() {
        for _ in 0..100 {
            let (line_reader, source, stdout_mock) = new_line_reader();
            let mut interrupt_receiver = line_reader.subscribe_to_interrupts();
            let mut pending_line = line_reader.begin_read(Some("")).unwrap();
            type_text(&source, "ls");

            let interrupter = line_reader.clone();
            let interrupt_handle = thread::spawn(move || interrupter.interrupt());
            press_enter(&source);
            let was_pending_read_interrupted = interrupt_handle.join().unwrap();

            match pending_line.try_resolved().unwrap().unwrap() {
                ReadlineEvent::Line(line) => {
                    assert_eq!(line, "ls");
                    assert!(!was_pending_read_interrupted);
                    assert_eq!(interrupt_receiver.try_recv(), Ok(()));
                }
                ReadlineEvent::Interrupted => {
                    assert!(was_pending_read_interrupted);
                    assert!(interrupt_receiver.try_recv().is_err());
                }
            }
            assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "ls\r\n");
            assert_eq!(source.listener_count(), 1);
        }
    }

    /// Logs that go to the display take the output device lock. So an echo error must be
    /// logged after that lock is released, or the key dispatch never returns.
    #[test]
    fn test_echo_error_logged_to_the_same_display() {
        let stdout_mock = StdoutMock::default();
        let output_device = OutputDevice {
            resource: Arc::new(StdMutex::new(RejectingWriter {
                stdout_mock: stdout_mock.clone(),
                rejected: b"x",
            })),
            is_mock: true,
        };
        let source = KeyEventSource::new();
        let line_reader = LineReader::new(
            output_device.clone(),
            source.clone(),
            &LineReaderConfig::default(),
        );

        let tracing_config = TracingConfig {
            writers: vec![WriterArg::Display],
            level: tracing::Level::ERROR,
            tracing_log_file_path_and_prefix: String::new(),
            preferred_display: DisplayPreference::OutputDevice(output_device),
        };
        let layers = try_create_layers(&tracing_config).unwrap().unwrap();
        let subscriber = tracing_subscriber::registry().with(layers);

        let (done_sender, done_receiver) = mpsc::channel();
        thread::spawn(move || {
            tracing::subscriber::with_default(subscriber, || {
                let mut pending_line = line_reader.begin_read(Some("> ")).unwrap();
                source.dispatch(&KeyEvent::ctrl('l'));
                source.dispatch(&KeyEvent::char('x'));
                press_enter(&source);
                done_sender.send(pending_line.try_resolved()).ok();
            });
        });

        let resolved = done_receiver
            .recv_timeout(Duration::from_secs(2))
            .unwrap()
            .unwrap();
        assert_eq!(resolved.unwrap(), ReadlineEvent::Line("x".to_string()));
        assert!(
            stdout_mock
                .get_copy_of_buffer_as_string()
                .contains("failed to echo key")
        );
    }
}
