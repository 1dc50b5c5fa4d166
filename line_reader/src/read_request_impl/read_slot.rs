// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{LineEditor, ReadState, ReadlineEvent, Subscription};
use tokio::sync::oneshot;

pub type ReadId = u64;

/// Holds at most one [`PendingRead`]. This is the only mutable state of a
/// [`crate::LineReader`], and it is shared as a [`crate::SafeReadSlot`].
///
/// A pending read is resolved by *taking* it out of the slot, and calling
/// [`PendingRead::resolve()`] on it. Whoever takes it first wins, so a read can't be
/// resolved twice.
#[derive(Debug, Default)]
pub struct ReadSlot {
    pending: Option<PendingRead>,
    last_read_id: ReadId,
    /// Set once the keystroke input has ended. No read can be started after that.
    is_input_closed: bool,
}

impl ReadSlot {
    #[must_use]
    pub fn state(&self) -> ReadState {
        if self.pending.is_some() {
            ReadState::Reading
        } else {
            ReadState::Idle
        }
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingRead> { self.pending.as_ref() }

    /// Only returns the pending read if it is the one identified by `read_id`. Keys that
    /// are meant for a read that has already been resolved are dropped this way.
    pub fn pending_mut_for(&mut self, read_id: ReadId) -> Option<&mut PendingRead> {
        self.pending.as_mut().filter(|it| it.read_id == read_id)
    }

    pub fn take_pending(&mut self) -> Option<PendingRead> { self.pending.take() }

    pub fn take_pending_for(&mut self, read_id: ReadId) -> Option<PendingRead> {
        match &self.pending {
            Some(it) if it.read_id == read_id => self.pending.take(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_input_closed(&self) -> bool { self.is_input_closed }

    /// Marks the input as ended, and takes the pending read (if any) out of the slot.
    pub(crate) fn close_input(&mut self) -> Option<PendingRead> {
        self.is_input_closed = true;
        self.pending.take()
    }

    pub(crate) fn next_read_id(&mut self) -> ReadId {
        self.last_read_id += 1;
        self.last_read_id
    }

    pub(crate) fn install(&mut self, pending_read: PendingRead) {
        debug_assert!(self.pending.is_none());
        self.pending = Some(pending_read);
    }
}

/// The one in-flight read. It owns the editor, the keystroke subscription that feeds the
/// editor, and the sender half of the caller's [`crate::PendingLine`].
#[derive(Debug)]
pub struct PendingRead {
    pub read_id: ReadId,
    pub editor: LineEditor,
    pub(crate) resolver: oneshot::Sender<ReadlineEvent>,
    pub(crate) subscription: Subscription,
}

impl PendingRead {
    /// Consumes the pending read. The keystroke subscription is released before the
    /// caller is woken up. Returns `false` if the caller is no longer waiting.
    pub fn resolve(self, event: ReadlineEvent) -> bool {
        let PendingRead {
            read_id,
            resolver,
            subscription,
            ..
        } = self;
        drop(subscription);

        // % is Display, ? is Debug.
        tracing::debug!(message = "resolve read", read_id = %read_id, event = ?event);

        resolver.send(event).is_ok()
    }

    /// The caller dropped its [`crate::PendingLine`] without waiting for the result.
    #[must_use]
    pub fn is_abandoned(&self) -> bool { self.resolver.is_closed() }
}
