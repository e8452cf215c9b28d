//! Direct opener/popup messaging.
//!
//! A context owns one [`Mailbox`]; other contexts reach it through a
//! [`PeerLink`]. Closing the mailbox turns every link to it dead, and posts
//! on a dead link are skipped.

use super::SyncMessage;
use crossbeam::channel::{Receiver, Sender, TrySendError};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receiving end of direct messages addressed to one context.
pub struct Mailbox {
    sender: Sender<SyncMessage>,
    receiver: Receiver<SyncMessage>,
    open: Arc<AtomicBool>,
}

impl Mailbox {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam::channel::bounded(1);
        Self {
            sender,
            receiver,
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns a handle other contexts use to post to this mailbox.
    pub fn link(&self) -> PeerLink {
        PeerLink {
            sender: self.sender.clone(),
            open: Arc::clone(&self.open),
        }
    }

    pub fn receiver(&self) -> &Receiver<SyncMessage> {
        &self.receiver
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Marks the owning context closed and discards queued messages.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
        while self.receiver.try_recv().is_ok() {}
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to another context's mailbox (an opener or a popup).
#[derive(Clone)]
pub struct PeerLink {
    sender: Sender<SyncMessage>,
    open: Arc<AtomicBool>,
}

impl PeerLink {
    pub fn is_closed(&self) -> bool {
        !self.open.load(Ordering::Acquire)
    }

    /// Posts `message` unless the peer is closed. Returns whether the peer now
    /// has a signal pending; a full mailbox already has one.
    pub fn post(&self, message: SyncMessage) -> bool {
        if self.is_closed() {
            debug!("event=peer_post module=sync status=skipped reason=peer_closed");
            return false;
        }
        match self.sender.try_send(message) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}
