//! Storage change detection for contexts sharing one SQLite file.

use crate::repo::slot_repo::SlotRepository;
use log::warn;

/// Polls the repository change marker and reports writes made by other
/// connections since the previous poll.
#[derive(Debug, Default)]
pub struct StorageWatcher {
    last_marker: Option<i64>,
}

impl StorageWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the current marker as the baseline.
    pub fn prime<R: SlotRepository + ?Sized>(&mut self, repo: &R) {
        self.last_marker = repo.change_marker().ok();
    }

    /// Returns `true` when another connection committed since the last poll.
    pub fn poll<R: SlotRepository + ?Sized>(&mut self, repo: &R) -> bool {
        let marker = match repo.change_marker() {
            Ok(marker) => marker,
            Err(err) => {
                warn!("event=storage_watch module=sync status=error error={err}");
                return false;
            }
        };
        let changed = self.last_marker.is_some_and(|last| last != marker);
        self.last_marker = Some(marker);
        changed
    }
}
