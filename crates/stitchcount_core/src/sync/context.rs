//! One live window context: a project store wired into the sync protocol.
//!
//! # Responsibility
//! - Own the context's store, its bus subscription, its mailbox and its
//!   storage watcher.
//! - Spawn popup contexts with opener/popup links wired both ways.
//! - Collapse pending signals into a single full reload.
//!
//! # Invariants
//! - Every commit of the owned store is announced through the bridge.
//! - A reload replaces the whole document; nothing is merged.
//! - A reload that cannot decode the slot keeps the last-known-good document.

use super::bridge::SyncBridge;
use super::bus::StorageBus;
use super::peer::{Mailbox, PeerLink};
use super::watcher::StorageWatcher;
use super::{ContextId, SyncMessage};
use crate::clock::Clock;
use crate::model::project::StoreDocument;
use crate::repo::slot_repo::SlotRepository;
use crate::store::{LoadSource, ProjectStore};
use crossbeam::channel::Receiver;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

type ReloadListener = Box<dyn FnMut(&StoreDocument) + Send>;

/// Project store of one context plus its sync endpoints.
pub struct SyncedStore<R: SlotRepository> {
    context_id: ContextId,
    store: ProjectStore<R>,
    bridge: SyncBridge,
    bus_rx: Receiver<SyncMessage>,
    mailbox: Mailbox,
    watcher: StorageWatcher,
    listeners: Vec<ReloadListener>,
    closed: bool,
}

impl<R: SlotRepository> SyncedStore<R> {
    /// Opens a top-level context on `repo` and registers it on `bus`.
    pub fn open(repo: R, clock: Arc<dyn Clock>, bus: &StorageBus) -> Self {
        Self::open_with_opener(repo, clock, bus, None)
    }

    fn open_with_opener(
        repo: R,
        clock: Arc<dyn Clock>,
        bus: &StorageBus,
        opener: Option<PeerLink>,
    ) -> Self {
        let context_id = Uuid::new_v4();
        let bridge = SyncBridge::new(context_id, bus.clone());
        if let Some(link) = opener {
            bridge.set_opener(link);
        }
        let bus_rx = bus.subscribe(context_id);
        let store = ProjectStore::with_publisher(repo, clock, Box::new(bridge.clone()));
        let mut watcher = StorageWatcher::new();
        watcher.prime(store.repository());

        info!(
            "event=context_open module=sync context={} source={}",
            context_id,
            store.last_load().as_str()
        );

        Self {
            context_id,
            store,
            bridge,
            bus_rx,
            mailbox: Mailbox::new(),
            watcher,
            listeners: Vec::new(),
            closed: false,
        }
    }

    /// Opens a popup context on `repo` (a separate connection to the same
    /// storage). Each side keeps a direct link to the other.
    pub fn open_popup(&mut self, repo: R) -> Self {
        let clock = Arc::clone(self.store.clock());
        let popup = Self::open_with_opener(repo, clock, self.bridge.bus(), Some(self.link()));
        self.bridge.set_popup(popup.link());
        popup
    }

    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    /// Direct link to this context, for an opener or popup.
    pub fn link(&self) -> PeerLink {
        self.mailbox.link()
    }

    pub fn bridge(&self) -> &SyncBridge {
        &self.bridge
    }

    pub fn store(&self) -> &ProjectStore<R> {
        &self.store
    }

    /// Mutable access for store operations; commits are announced automatically.
    pub fn store_mut(&mut self) -> &mut ProjectStore<R> {
        &mut self.store
    }

    pub fn document(&self) -> &StoreDocument {
        self.store.document()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Registers a callback run with the fresh document after every reload.
    pub fn on_reload(&mut self, listener: impl FnMut(&StoreDocument) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Drains every pending signal and, if any arrived, reloads once.
    ///
    /// Returns the number of signals consumed.
    pub fn pump(&mut self) -> usize {
        if self.closed {
            return 0;
        }

        let me = self.context_id;
        let mut signals = self
            .bus_rx
            .try_iter()
            .filter(|message| message.triggers_reload_for(me))
            .count();
        signals += self
            .mailbox
            .receiver()
            .try_iter()
            .filter(|message| message.triggers_reload_for(me))
            .count();
        if self.watcher.poll(self.store.repository()) {
            signals += 1;
        }

        if signals > 0 {
            let source = self.store.reload();
            info!(
                "event=sync_reload module=sync context={} signals={} source={}",
                me,
                signals,
                source.as_str()
            );
            if source != LoadSource::Stored {
                return signals;
            }
            let doc = self.store.document();
            for listener in &mut self.listeners {
                listener(doc);
            }
        }

        signals
    }

    /// Tears the context down: peers see it closed and the bus forgets it.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.mailbox.close();
        self.bridge.bus().unsubscribe(self.context_id);
        info!("event=context_close module=sync context={}", self.context_id);
    }
}

impl<R: SlotRepository> Drop for SyncedStore<R> {
    fn drop(&mut self) {
        self.close();
    }
}
