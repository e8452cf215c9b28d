//! In-process storage change bus.
//!
//! Stands in for the storage medium's native "changed" event: every
//! registered context except the writer is told that storage changed.
//! Each subscriber holds at most one pending signal; a pending signal already
//! guarantees a reload, so further writes before the next drain coalesce.

use super::{ContextId, SyncMessage};
use crossbeam::channel::{Receiver, Sender, TrySendError};
use log::debug;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct BusState {
    subscribers: BTreeMap<ContextId, Sender<SyncMessage>>,
}

/// Fan-out of storage change signals. Clones share one subscriber set.
#[derive(Clone, Default)]
pub struct StorageBus {
    inner: Arc<Mutex<BusState>>,
}

impl StorageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `context`, replacing any earlier registration under the same id.
    pub fn subscribe(&self, context: ContextId) -> Receiver<SyncMessage> {
        let (sender, receiver) = crossbeam::channel::bounded(1);
        self.state().subscribers.insert(context, sender);
        receiver
    }

    pub fn unsubscribe(&self, context: ContextId) {
        self.state().subscribers.remove(&context);
    }

    pub fn subscriber_count(&self) -> usize {
        self.state().subscribers.len()
    }

    /// Delivers a change signal from `origin` to every other subscriber.
    ///
    /// Returns how many subscribers now have a signal pending, counting those
    /// that already had one. Subscribers whose receiver was dropped are pruned.
    pub fn publish(&self, origin: ContextId) -> usize {
        let mut state = self.state();
        let mut delivered = 0;
        let mut dropped = Vec::new();

        for (id, sender) in &state.subscribers {
            if *id == origin {
                continue;
            }
            match sender.try_send(SyncMessage::new(origin)) {
                Ok(()) | Err(TrySendError::Full(_)) => delivered += 1,
                Err(TrySendError::Disconnected(_)) => dropped.push(*id),
            }
        }

        for id in dropped {
            debug!("event=bus_prune module=sync context={id}");
            state.subscribers.remove(&id);
        }

        delivered
    }

    fn state(&self) -> MutexGuard<'_, BusState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
