//! Counter controls for the selected section.
//!
//! # Invariants
//! - Each control performs exactly one `update_selected_project` call.
//! - The interaction hook runs after every applied edit, whichever section
//!   the timer is running for.
//! - Counters never go below zero.

use crate::model::project::{CounterKind, DataField};
use crate::repo::slot_repo::SlotRepository;
use crate::store::{selectors, ProjectStore, StoreResult};
use crate::timer::InteractionHook;

/// Increment/decrement/reset controls bound to an interaction hook.
pub struct CounterService {
    on_interaction: InteractionHook,
}

impl CounterService {
    pub fn new(on_interaction: InteractionHook) -> Self {
        Self { on_interaction }
    }

    pub fn increment<R: SlotRepository>(
        &self,
        store: &mut ProjectStore<R>,
        kind: CounterKind,
    ) -> StoreResult<bool> {
        self.apply(store, kind, |value| value.saturating_add(1))
    }

    /// Decrements, saturating at zero.
    pub fn decrement<R: SlotRepository>(
        &self,
        store: &mut ProjectStore<R>,
        kind: CounterKind,
    ) -> StoreResult<bool> {
        self.apply(store, kind, |value| value.saturating_sub(1))
    }

    pub fn reset<R: SlotRepository>(
        &self,
        store: &mut ProjectStore<R>,
        kind: CounterKind,
    ) -> StoreResult<bool> {
        self.apply(store, kind, |_| 0)
    }

    pub fn set<R: SlotRepository>(
        &self,
        store: &mut ProjectStore<R>,
        kind: CounterKind,
        value: u64,
    ) -> StoreResult<bool> {
        self.apply(store, kind, |_| value)
    }

    fn apply<R: SlotRepository>(
        &self,
        store: &mut ProjectStore<R>,
        kind: CounterKind,
        next: impl FnOnce(u64) -> u64,
    ) -> StoreResult<bool> {
        let Some(section_id) = selectors::selected_section_id(store.document()).map(str::to_string)
        else {
            return Ok(false);
        };
        if selectors::selected_section(store.document()).is_none() {
            return Ok(false);
        }

        let applied = store.update_selected_project(DataField, |mut data| {
            if let Some(section) = data.sections.get_mut(&section_id) {
                let current = section.data.get(kind);
                section.data.set(kind, next(current));
            }
            data
        })?;
        if applied {
            (self.on_interaction)();
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::CounterService;
    use crate::clock::{Clock, ManualClock};
    use crate::model::project::CounterKind;
    use crate::repo::slot_repo::SqliteSlotRepository;
    use crate::store::{selectors, ProjectStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn service_with_counter() -> (CounterService, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let service = CounterService::new(Arc::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        (service, calls)
    }

    fn store() -> ProjectStore<SqliteSlotRepository> {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(1_000));
        ProjectStore::open(SqliteSlotRepository::open_in_memory().expect("repo"), clock)
    }

    #[test]
    fn edits_selected_section_and_marks_interaction() {
        let (service, calls) = service_with_counter();
        let mut store = store();
        let project_id = store.create_project().expect("create");
        store.add_section_to_project(&project_id).expect("add");

        service.increment(&mut store, CounterKind::Stitches).expect("inc");
        service.increment(&mut store, CounterKind::Stitches).expect("inc");
        service.decrement(&mut store, CounterKind::Stitches).expect("dec");
        service.set(&mut store, CounterKind::Rows, 7).expect("set");

        let doc = store.document();
        assert_eq!(selectors::section_counter(doc, CounterKind::Stitches), 1);
        assert_eq!(selectors::section_counter(doc, CounterKind::Rows), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn decrement_saturates_at_zero() {
        let (service, _) = service_with_counter();
        let mut store = store();
        let project_id = store.create_project().expect("create");
        store.add_section_to_project(&project_id).expect("add");

        assert!(service
            .decrement(&mut store, CounterKind::Repeats)
            .expect("dec"));
        assert_eq!(
            selectors::section_counter(store.document(), CounterKind::Repeats),
            0
        );
    }

    #[test]
    fn no_selection_means_no_edit_and_no_hook() {
        let (service, calls) = service_with_counter();
        let mut store = store();
        store.create_project().expect("create");

        assert!(!service
            .increment(&mut store, CounterKind::Rows)
            .expect("inc"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.commit_count(), 1);
    }
}
