// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{ReadId, ReadSlot, ReadlineError, ReadlineEvent, StdMutex, lock_or_recover};
use std::{future::Future,
          pin::Pin,
          sync::Weak,
          task::{Context, Poll}};
use tokio::sync::oneshot::{self, error::TryRecvError};

/// Returned by [`crate::LineReader::begin_read()`]. Await it to get the outcome of the
/// read.
///
/// Dropping it before it resolves abandons the read: the keystroke subscription is
/// released, and the line reader goes back to idle.
#[derive(Debug)]
pub struct PendingLine {
    read_id: ReadId,
    receiver: oneshot::Receiver<ReadlineEvent>,
    read_slot: Weak<StdMutex<ReadSlot>>,
}

impl PendingLine {
    pub(crate) fn new(
        read_id: ReadId,
        receiver: oneshot::Receiver<ReadlineEvent>,
        read_slot: Weak<StdMutex<ReadSlot>>,
    ) -> Self {
        Self {
            read_id,
            receiver,
            read_slot,
        }
    }

    #[must_use]
    pub fn read_id(&self) -> ReadId { self.read_id }

    /// Non blocking check. Returns `None` while the read is still pending.
    pub fn try_resolved(&mut self) -> Option<Result<ReadlineEvent, ReadlineError>> {
        match self.receiver.try_recv() {
            Ok(event) => Some(Ok(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(ReadlineError::Closed)),
        }
    }
}

impl Future for PendingLine {
    type Output = Result<ReadlineEvent, ReadlineError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| ReadlineError::Closed))
    }
}

impl Drop for PendingLine {
    fn drop(&mut self) {
        let Some(safe_read_slot) = self.read_slot.upgrade() else {
            return;
        };
        // Take it out while holding the lock, drop it after the lock is released.
        let maybe_abandoned = lock_or_recover(&safe_read_slot).take_pending_for(self.read_id);
        if let Some(pending_read) = maybe_abandoned {
            tracing::debug!(message = "read abandoned", read_id = %self.read_id);
            drop(pending_read);
        }
    }
}
