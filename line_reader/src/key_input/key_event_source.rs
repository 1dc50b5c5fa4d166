// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{DEBUG_LINE_READER_MOD, KeyEvent, StdMutex, lock_or_recover};
use std::{fmt::{Debug, Formatter, Result as FmtResult},
          sync::{Arc, Weak}};

pub type KeyListener = Arc<dyn Fn(&KeyEvent) + Send + Sync>;
pub type SubscriptionId = u64;
pub type SafeListenerRegistry = Arc<StdMutex<ListenerRegistry>>;

#[derive(Default)]
pub struct ListenerRegistry {
    last_id: SubscriptionId,
    listeners: Vec<(SubscriptionId, KeyListener)>,
}

impl ListenerRegistry {
    fn add(&mut self, listener: KeyListener) -> SubscriptionId {
        self.last_id += 1;
        self.listeners.push((self.last_id, listener));
        self.last_id
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let count_before = self.listeners.len();
        self.listeners.retain(|(it, _)| *it != id);
        count_before != self.listeners.len()
    }

    fn contains(&self, id: SubscriptionId) -> bool {
        self.listeners.iter().any(|(it, _)| *it == id)
    }
}

impl Debug for ListenerRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ListenerRegistry")
            .field("last_id", &self.last_id)
            .field("listener_count", &self.listeners.len())
            .finish()
    }
}

/// The terminal's keystroke event source. Anyone can [`subscribe()`](Self::subscribe) to
/// it, and the host (see [`crate::TerminalSession`]) calls
/// [`dispatch()`](Self::dispatch) once for each keystroke, in arrival order.
///
/// - It is safe to clone, all the clones share the same listeners.
/// - Listeners are called synchronously, in the order in which they subscribed. No lock
///   is held while a listener runs, so a listener is free to subscribe, or drop any
///   [`Subscription`] (including its own).
/// - A listener that is unsubscribed while an event is being dispatched does not see
///   that event, even if it was subscribed when the dispatch started.
#[derive(Debug, Clone, Default)]
pub struct KeyEventSource {
    pub safe_registry: SafeListenerRegistry,
}

impl KeyEventSource {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// The listener stays subscribed until the returned [`Subscription`] is dropped or
    /// disposed.
    #[must_use = "the listener is unsubscribed when the Subscription is dropped"]
    pub fn subscribe(
        &self,
        listener: impl Fn(&KeyEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = lock_or_recover(&self.safe_registry).add(Arc::new(listener));
        Subscription {
            id,
            registry: Arc::downgrade(&self.safe_registry),
        }
    }

    pub fn dispatch(&self, event: &KeyEvent) {
        let snapshot: Vec<(SubscriptionId, KeyListener)> =
            lock_or_recover(&self.safe_registry).listeners.clone();

        DEBUG_LINE_READER_MOD.then(|| {
            // % is Display, ? is Debug.
            tracing::debug!(
                message = "dispatch",
                event = ?event,
                listener_count = %snapshot.len()
            );
        });

        for (id, listener) in snapshot {
            let is_still_subscribed = lock_or_recover(&self.safe_registry).contains(id);
            if is_still_subscribed {
                listener(event);
            }
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        lock_or_recover(&self.safe_registry).listeners.len()
    }
}

/// Handle to a listener registered with [`KeyEventSource::subscribe()`]. The listener is
/// removed when this is dropped, or when [`Self::dispose()`] is called.
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<StdMutex<ListenerRegistry>>,
}

impl Subscription {
    pub fn dispose(self) { drop(self); }

    #[must_use]
    pub fn is_active(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => lock_or_recover(&registry).contains(self.id),
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock_or_recover(&registry).remove(self.id);
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
