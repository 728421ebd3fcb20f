//! The waiter registry: keyed pending waits with single resolution.

use crate::error::{Result, WaitError};
use crate::types::{EventKind, SubjectId, WaitId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

use super::types::{EventFilter, WaitOptions};

/// A pending wait stored in the registry.
///
/// Owned exclusively by its store entry; the waiting task holds only the
/// receiving half of the completion handle.
struct PendingWait<E> {
    id: WaitId,
    kind: EventKind,
    filter: Option<Arc<dyn EventFilter<E>>>,
    /// Taken exactly once, on settlement. A record whose sender is gone is
    /// treated as absent by every reader.
    sender: Option<oneshot::Sender<Result<E>>>,
}

/// Registry of pending waits keyed by (subject, event kind).
///
/// At most one unsettled wait exists per key at any instant; registering
/// again for the same key pre-empts the previous record. Any settlement
/// (resolution, cancellation, timeout) removes the record from the store.
pub struct WaiterRegistry<E> {
    /// Pending waits by subject, then event kind. Subject entries are
    /// created lazily and an emptied inner map may linger.
    waits: RwLock<HashMap<SubjectId, HashMap<EventKind, PendingWait<E>>>>,
    /// Counter for generating wait ids.
    next_id: AtomicU64,
}

impl<E> WaiterRegistry<E> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            waits: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Cancel the pending wait for (subject, kind).
    ///
    /// The waiter observes [`WaitError::Cancelled`]. Cancelling a key with
    /// no pending wait, or one that has already settled, is a no-op and
    /// returns false. Safe to race with concurrent resolution: exactly one
    /// side consumes the completion handle.
    pub fn cancel_wait(&self, subject: SubjectId, kind: EventKind) -> bool {
        let sender = {
            let mut waits = self.waits.write();
            let Some(by_kind) = waits.get_mut(&subject) else {
                debug!(subject = %subject, kind = %kind, "Cancel: no pending waits for subject");
                return false;
            };
            let Some(mut record) = by_kind.remove(&kind) else {
                debug!(subject = %subject, kind = %kind, "Cancel: no pending wait for kind");
                return false;
            };
            match record.sender.take() {
                Some(sender) => sender,
                None => {
                    // Raced with a concurrent settlement; the stale entry
                    // is cleared either way.
                    debug!(subject = %subject, kind = %kind, "Cancel: wait already settled");
                    return false;
                }
            }
        };
        let _ = sender.send(Err(WaitError::Cancelled));
        true
    }

    // --- Introspection ---

    /// Number of unsettled pending waits across all subjects.
    pub fn pending_count(&self) -> usize {
        self.waits
            .read()
            .values()
            .flat_map(|by_kind| by_kind.values())
            .filter(|record| record.sender.is_some())
            .count()
    }

    /// Whether an unsettled wait exists for (subject, kind).
    pub fn is_waiting(&self, subject: SubjectId, kind: EventKind) -> bool {
        self.waits
            .read()
            .get(&subject)
            .and_then(|by_kind| by_kind.get(&kind))
            .is_some_and(|record| record.sender.is_some())
    }

    // --- Internal helpers ---

    /// Remove the (subject, kind) entry iff it still holds the record
    /// identified by `id`. Never removes a newer record that overwrote it.
    fn remove_if_current(&self, subject: SubjectId, kind: EventKind, id: WaitId) {
        let mut waits = self.waits.write();
        if let Some(by_kind) = waits.get_mut(&subject) {
            if matches!(by_kind.get(&kind), Some(record) if record.id == id) {
                by_kind.remove(&kind);
            }
        }
    }

    /// Settle the record identified by `id`, if it is still the current
    /// record for its key and unsettled. Returns whether a waiter was
    /// actually woken.
    fn settle(&self, subject: SubjectId, kind: EventKind, id: WaitId, outcome: Result<E>) -> bool {
        let sender = {
            let mut waits = self.waits.write();
            let Some(by_kind) = waits.get_mut(&subject) else {
                return false;
            };
            if !matches!(by_kind.get(&kind), Some(record) if record.id == id) {
                // Lost a race with cancellation or a newer registration.
                return false;
            }
            match by_kind
                .remove(&kind)
                .and_then(|mut record| record.sender.take())
            {
                Some(sender) => sender,
                None => return false,
            }
        };
        if sender.send(outcome).is_err() {
            // The waiting task went away between settlement and delivery.
            debug!(subject = %subject, kind = %kind, "Waiter gone before delivery");
            return false;
        }
        true
    }
}

impl<E> WaiterRegistry<E>
where
    E: Clone + Send + Sync,
{
    /// Register a wait for the next event matching (subject, kind) and
    /// suspend until it settles.
    ///
    /// Overwrites any prior unsettled record for the same key; the
    /// pre-empted waiter is never resolved by a future event and observes
    /// [`WaitError::Cancelled`].
    ///
    /// Returns the matched event payload, [`WaitError::Timeout`] if
    /// `options.timeout` elapses first, [`WaitError::Cancelled`] on
    /// explicit cancellation or pre-emption, or the error a failing filter
    /// raised while resolving.
    pub async fn register_wait(
        &self,
        subject: SubjectId,
        kind: EventKind,
        options: WaitOptions<E>,
    ) -> Result<E> {
        let id = WaitId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = oneshot::channel();
        let record = PendingWait {
            id,
            kind,
            filter: options.filter,
            sender: Some(sender),
        };

        {
            let mut waits = self.waits.write();
            if let Some(prev) = waits.entry(subject).or_default().insert(kind, record) {
                debug!(
                    subject = %subject,
                    kind = %prev.kind,
                    preempted = ?prev.id,
                    "New wait pre-empts an existing one"
                );
            }
        }

        // Removes the store entry on every exit path, including this
        // future being dropped mid-wait. Resolution and cancellation
        // remove eagerly; this is the identity-checked backstop.
        let _janitor = Janitor {
            registry: self,
            subject,
            kind,
            id,
        };

        let settled = match options.timeout {
            Some(limit) => match tokio::time::timeout(limit, receiver).await {
                Ok(settled) => settled,
                Err(_) => return Err(WaitError::Timeout(limit)),
            },
            None => receiver.await,
        };

        match settled {
            Ok(outcome) => outcome,
            // Sender dropped without settling: pre-empted by a newer
            // registration for the same key.
            Err(_) => Err(WaitError::Cancelled),
        }
    }

    /// Offer an inbound event to the registry.
    ///
    /// Returns whether a pending wait was resolved by it. The flag is
    /// informational only; the host routes the event through its normal
    /// handler chain either way. A failing filter settles the waiter with the error and
    /// propagates the same error to the caller.
    pub async fn on_event(&self, subject: SubjectId, kind: EventKind, event: &E) -> Result<bool> {
        // Snapshot the record so the lock is not held across filter
        // evaluation, which may suspend.
        let mut stale = None;
        let live = {
            let waits = self.waits.read();
            match waits.get(&subject).and_then(|by_kind| by_kind.get(&kind)) {
                None => None,
                Some(record) if record.sender.is_none() => {
                    stale = Some(record.id);
                    None
                }
                Some(record) => Some((record.id, record.filter.clone())),
            }
        };

        if let Some(id) = stale {
            // Settled but not yet removed; clear it and fall through to
            // normal routing.
            self.remove_if_current(subject, kind, id);
            return Ok(false);
        }
        let Some((id, filter)) = live else {
            debug!(subject = %subject, kind = %kind, "No pending wait for event");
            return Ok(false);
        };

        if let Some(filter) = filter {
            match filter.check(subject, event).await {
                Ok(true) => {}
                Ok(false) => return Ok(false),
                Err(err) => {
                    self.settle(subject, kind, id, Err(err.clone()));
                    return Err(err);
                }
            }
        }

        Ok(self.settle(subject, kind, id, Ok(event.clone())))
    }
}

impl<E> Default for WaiterRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity-checked removal of a wait's store entry, run when the waiting
/// future completes or is dropped.
struct Janitor<'a, E> {
    registry: &'a WaiterRegistry<E>,
    subject: SubjectId,
    kind: EventKind,
    id: WaitId,
}

impl<E> Drop for Janitor<'_, E> {
    fn drop(&mut self) {
        self.registry
            .remove_if_current(self.subject, self.kind, self.id);
    }
}
