//! Cross-context synchronization.
//!
//! # Responsibility
//! - Announce every committed store write to the other live contexts.
//! - Turn incoming announcements into a full reload of the local store.
//!
//! # Invariants
//! - Two announcement paths exist: the storage-change path (bus and
//!   `data_version` watcher) and the direct opener/popup path.
//! - A context never treats its own write as an incoming signal.
//! - There is no merge: the last write the medium received wins.

use uuid::Uuid;

pub mod bridge;
pub mod bus;
pub mod context;
pub mod peer;
pub mod watcher;

pub use bridge::{SyncBridge, SyncReport};
pub use bus::StorageBus;
pub use context::SyncedStore;
pub use peer::{Mailbox, PeerLink};
pub use watcher::StorageWatcher;

/// Token carried by every sync message.
pub const SYNC_TOKEN: &str = "stitch-counter-sync";

/// Identity of one live window context.
pub type ContextId = Uuid;

/// Payload-free "storage changed" signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMessage {
    pub origin: ContextId,
    pub token: String,
}

impl SyncMessage {
    pub fn new(origin: ContextId) -> Self {
        Self {
            origin,
            token: SYNC_TOKEN.to_string(),
        }
    }

    /// Whether a context identified by `receiver` should reload on this message.
    pub fn triggers_reload_for(&self, receiver: ContextId) -> bool {
        self.token == SYNC_TOKEN && self.origin != receiver
    }
}

/// Hook invoked after every successful store commit.
pub trait ChangePublisher: Send {
    fn publish_change(&self);
}

/// Publisher for stores that live in a single context.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl ChangePublisher for NoopPublisher {
    fn publish_change(&self) {}
}

#[cfg(test)]
mod tests {
    use super::{SyncMessage, SYNC_TOKEN};
    use uuid::Uuid;

    #[test]
    fn messages_from_self_or_with_foreign_tokens_are_ignored() {
        let me = Uuid::new_v4();
        let peer = Uuid::new_v4();

        assert!(SyncMessage::new(peer).triggers_reload_for(me));
        assert!(!SyncMessage::new(me).triggers_reload_for(me));

        let foreign = SyncMessage {
            origin: peer,
            token: "something-else".to_string(),
        };
        assert!(!foreign.triggers_reload_for(me));
        assert_eq!(SyncMessage::new(peer).token, SYNC_TOKEN);
    }
}
