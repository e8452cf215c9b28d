//! Write-side of the sync protocol.
//!
//! # Responsibility
//! - After each store commit, signal the storage-change path and then the
//!   direct opener/popup path.
//!
//! # Invariants
//! - Dead peer links are checked before posting and forgotten afterwards.
//! - The bus never echoes a signal back to its writer.

use super::bus::StorageBus;
use super::peer::PeerLink;
use super::{ChangePublisher, ContextId, SyncMessage};
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct PeerSlots {
    opener: Option<PeerLink>,
    popup: Option<PeerLink>,
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Contexts reached through the storage-change bus.
    pub storage: usize,
    /// Peers reached through direct messages.
    pub direct: usize,
}

/// Announces store writes of one context. Clones share peer slots.
#[derive(Clone)]
pub struct SyncBridge {
    context_id: ContextId,
    bus: StorageBus,
    peers: Arc<Mutex<PeerSlots>>,
}

impl SyncBridge {
    pub fn new(context_id: ContextId, bus: StorageBus) -> Self {
        Self {
            context_id,
            bus,
            peers: Arc::new(Mutex::new(PeerSlots::default())),
        }
    }

    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    pub fn bus(&self) -> &StorageBus {
        &self.bus
    }

    /// Sets the link to the context that opened this one.
    pub fn set_opener(&self, link: PeerLink) {
        self.peers().opener = Some(link);
    }

    /// Sets the link to the popup this context spawned, replacing any earlier one.
    pub fn set_popup(&self, link: PeerLink) {
        self.peers().popup = Some(link);
    }

    pub fn has_live_popup(&self) -> bool {
        self.peers()
            .popup
            .as_ref()
            .is_some_and(|link| !link.is_closed())
    }

    /// Signals every other context that storage changed.
    pub fn broadcast(&self) -> SyncReport {
        let storage = self.bus.publish(self.context_id);

        let mut direct = 0;
        let mut guard = self.peers();
        let peers = &mut *guard;
        for slot in [&mut peers.opener, &mut peers.popup] {
            let Some(link) = slot.as_ref() else {
                continue;
            };
            if link.post(SyncMessage::new(self.context_id)) {
                direct += 1;
            } else {
                *slot = None;
            }
        }

        debug!(
            "event=sync_broadcast module=sync context={} storage={} direct={}",
            self.context_id, storage, direct
        );
        SyncReport { storage, direct }
    }

    fn peers(&self) -> MutexGuard<'_, PeerSlots> {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChangePublisher for SyncBridge {
    fn publish_change(&self) {
        self.broadcast();
    }
}
