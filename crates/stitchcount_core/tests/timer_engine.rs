use std::sync::{Arc, Mutex, OnceLock};

use stitchcount_core::model::project::OptionsField;
use stitchcount_core::store::selectors;
use stitchcount_core::timer::engine::{AUTO_STOP_MESSAGE, REMINDER_MESSAGE};
use stitchcount_core::timer::RecordingNotifier;
use stitchcount_core::{
    Clock, CounterKind, CounterService, ManualClock, ProjectStore, RepoResult, SectionRef,
    SlotRepository, SqliteSlotRepository, TimerEngine, TimerState,
};

struct Fixture {
    clock: ManualClock,
    store: ProjectStore<SqliteSlotRepository>,
    engine: Arc<TimerEngine>,
    notifier: Arc<RecordingNotifier>,
}

impl Fixture {
    fn new() -> Self {
        let clock = ManualClock::new(1_700_000_000_000);
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        let store = ProjectStore::open(
            SqliteSlotRepository::open_in_memory().unwrap(),
            Arc::clone(&shared),
        );
        let notifier = Arc::new(RecordingNotifier::new());
        let engine = TimerEngine::shared(shared, notifier.clone());
        Self {
            clock,
            store,
            engine,
            notifier,
        }
    }

    /// New project with `count` sections; the last one is selected.
    fn project_with_sections(&mut self, count: usize) -> (String, Vec<SectionRef>) {
        let project_id = self.store.create_project().unwrap();
        let sections = (0..count)
            .map(|_| {
                let section_id = self
                    .store
                    .add_section_to_project(&project_id)
                    .unwrap()
                    .unwrap();
                SectionRef::new(project_id.clone(), section_id)
            })
            .collect();
        (project_id, sections)
    }

    fn set_timer_options(&mut self, remind: Option<u32>, auto_off: Option<u32>) {
        self.store
            .update_selected_project(OptionsField, |mut options| {
                let timer = &mut options.timer_options;
                timer.remind_turn_on = remind.is_some();
                timer.auto_turn_off = auto_off.is_some();
                if let Some(delay) = remind {
                    timer.remind_turn_on_delay = delay;
                }
                if let Some(delay) = auto_off {
                    timer.auto_turn_off_delay = delay;
                }
                options
            })
            .unwrap();
    }

    fn stored_time(&self, section: &SectionRef) -> u64 {
        self.store.project(&section.project_id).unwrap().data.sections[&section.section_id]
            .data
            .time
    }
}

#[test]
fn starting_another_section_flushes_the_first() {
    let mut fx = Fixture::new();
    let (_, sections) = fx.project_with_sections(2);
    let (s1, s2) = (&sections[0], &sections[1]);
    fx.store.select_section(&s1.project_id, &s1.section_id).unwrap();

    fx.store
        .set_section_time(&s2.project_id, &s2.section_id, 42)
        .unwrap();

    let counters = CounterService::new(fx.engine.interaction_hook());
    counters
        .set(&mut fx.store, CounterKind::Stitches, 5)
        .unwrap();

    assert!(fx.engine.start(&mut fx.store, s1.clone()).unwrap());
    fx.clock.advance_secs(3);
    assert!(fx.engine.start(&mut fx.store, s2.clone()).unwrap());

    assert_eq!(fx.stored_time(s1), 3);
    assert_eq!(fx.stored_time(s2), 42);
    assert_eq!(fx.engine.display_seconds(fx.store.document(), s2), 42);
    fx.clock.advance_secs(2);
    assert_eq!(fx.engine.display_seconds(fx.store.document(), s2), 44);
    assert!(fx.engine.is_running(s2));
    assert!(!fx.engine.is_running(s1));
    assert_eq!(
        fx.store.project(&s1.project_id).unwrap().data.sections[&s1.section_id]
            .data
            .stitches,
        5
    );
}

#[test]
fn at_most_one_section_runs_under_interleaved_starts() {
    let mut fx = Fixture::new();
    let (_, sections) = fx.project_with_sections(3);

    let order = [0, 1, 0, 2, 2, 1, 0];
    for (step, index) in order.into_iter().enumerate() {
        fx.engine.start(&mut fx.store, sections[index].clone()).unwrap();
        fx.clock.advance_ms(1_500);
        fx.engine.tick(&mut fx.store).unwrap();

        let running: Vec<&SectionRef> = sections
            .iter()
            .filter(|section| fx.engine.is_running(section))
            .collect();
        assert_eq!(running.len(), 1, "step {step}");
        assert_eq!(running[0], &sections[index]);
    }
}

#[test]
fn stop_writes_final_elapsed_and_resume_accumulates() {
    let mut fx = Fixture::new();
    let (_, sections) = fx.project_with_sections(1);
    let section = &sections[0];

    fx.engine.start_selected(&mut fx.store).unwrap();
    fx.clock.advance_ms(4_900);
    assert_eq!(fx.engine.display_seconds(fx.store.document(), section), 4);
    assert_eq!(fx.engine.stop(&mut fx.store).unwrap(), Some(4));
    assert_eq!(fx.engine.stop(&mut fx.store).unwrap(), None);

    fx.engine.start_selected(&mut fx.store).unwrap();
    fx.clock.advance_secs(6);
    fx.engine.stop(&mut fx.store).unwrap();
    assert_eq!(fx.stored_time(section), 10);
    assert_eq!(fx.engine.state(), TimerState::Idle);
}

#[test]
fn reset_discards_the_running_timer() {
    let mut fx = Fixture::new();
    let (_, sections) = fx.project_with_sections(1);
    let section = &sections[0];

    fx.engine.start(&mut fx.store, section.clone()).unwrap();
    fx.clock.advance_secs(12);
    fx.engine.tick(&mut fx.store).unwrap();
    assert_eq!(fx.stored_time(section), 12);

    fx.engine.reset(&mut fx.store, section).unwrap();
    assert_eq!(fx.engine.state(), TimerState::Idle);
    assert_eq!(fx.stored_time(section), 0);

    fx.clock.advance_secs(5);
    fx.engine.tick(&mut fx.store).unwrap();
    assert_eq!(fx.stored_time(section), 0);
}

#[test]
fn tick_flushes_only_when_the_value_changes() {
    let mut fx = Fixture::new();
    let (_, sections) = fx.project_with_sections(1);
    fx.engine.start(&mut fx.store, sections[0].clone()).unwrap();
    let commits = fx.store.commit_count();

    fx.clock.advance_ms(400);
    assert_eq!(fx.engine.tick(&mut fx.store).unwrap().flushed_secs, None);
    fx.clock.advance_ms(600);
    assert_eq!(fx.engine.tick(&mut fx.store).unwrap().flushed_secs, Some(1));
    assert_eq!(fx.engine.tick(&mut fx.store).unwrap().flushed_secs, None);
    assert_eq!(fx.store.commit_count(), commits + 1);
}

#[test]
fn inactivity_auto_stops_and_notifies() {
    let mut fx = Fixture::new();
    let (_, sections) = fx.project_with_sections(1);
    fx.set_timer_options(None, Some(1));

    fx.engine.start(&mut fx.store, sections[0].clone()).unwrap();
    fx.clock.advance_secs(59);
    let outcome = fx.engine.tick(&mut fx.store).unwrap();
    assert!(!outcome.auto_stopped);

    fx.clock.advance_secs(1);
    let outcome = fx.engine.tick(&mut fx.store).unwrap();
    assert!(outcome.auto_stopped);
    assert_eq!(outcome.flushed_secs, Some(60));
    assert_eq!(fx.engine.state(), TimerState::Idle);
    assert_eq!(fx.stored_time(&sections[0]), 60);
    assert_eq!(fx.notifier.messages(), vec![AUTO_STOP_MESSAGE.to_string()]);
}

#[test]
fn counter_interaction_postpones_auto_stop() {
    let mut fx = Fixture::new();
    let (_, sections) = fx.project_with_sections(1);
    fx.set_timer_options(None, Some(1));
    let counters = CounterService::new(fx.engine.interaction_hook());

    fx.engine.start(&mut fx.store, sections[0].clone()).unwrap();
    fx.clock.advance_secs(50);
    counters.increment(&mut fx.store, CounterKind::Rows).unwrap();
    assert_eq!(fx.engine.last_interaction_ms(), fx.clock.now_ms());

    fx.clock.advance_secs(50);
    assert!(!fx.engine.tick(&mut fx.store).unwrap().auto_stopped);
    fx.clock.advance_secs(10);
    assert!(fx.engine.tick(&mut fx.store).unwrap().auto_stopped);
}

#[test]
fn auto_stop_is_off_by_default() {
    let mut fx = Fixture::new();
    let (_, sections) = fx.project_with_sections(1);

    fx.engine.start(&mut fx.store, sections[0].clone()).unwrap();
    fx.clock.advance_minutes(180);
    assert!(!fx.engine.tick(&mut fx.store).unwrap().auto_stopped);
    assert!(fx.engine.is_running(&sections[0]));
    assert!(fx.notifier.messages().is_empty());
}

#[test]
fn reminder_waits_a_full_delay_then_recurs() {
    let mut fx = Fixture::new();
    fx.project_with_sections(1);
    fx.set_timer_options(Some(1), None);

    assert!(!fx.engine.tick(&mut fx.store).unwrap().reminded);
    fx.clock.advance_secs(59);
    assert!(!fx.engine.tick(&mut fx.store).unwrap().reminded);
    fx.clock.advance_secs(1);
    assert!(fx.engine.tick(&mut fx.store).unwrap().reminded);
    fx.clock.advance_secs(30);
    assert!(!fx.engine.tick(&mut fx.store).unwrap().reminded);
    fx.clock.advance_secs(30);
    assert!(fx.engine.tick(&mut fx.store).unwrap().reminded);

    assert_eq!(
        fx.notifier.messages(),
        vec![REMINDER_MESSAGE.to_string(), REMINDER_MESSAGE.to_string()]
    );
}

#[test]
fn disabling_reminders_cancels_the_schedule() {
    let mut fx = Fixture::new();
    fx.project_with_sections(1);
    fx.set_timer_options(Some(1), None);
    fx.engine.tick(&mut fx.store).unwrap();

    fx.set_timer_options(None, None);
    fx.clock.advance_minutes(5);
    assert!(!fx.engine.tick(&mut fx.store).unwrap().reminded);

    fx.set_timer_options(Some(1), None);
    assert!(!fx.engine.tick(&mut fx.store).unwrap().reminded);
    assert!(fx.notifier.messages().is_empty());
}

#[test]
fn no_reminder_while_running() {
    let mut fx = Fixture::new();
    let (_, sections) = fx.project_with_sections(1);
    fx.set_timer_options(Some(1), None);

    fx.engine.start(&mut fx.store, sections[0].clone()).unwrap();
    for _ in 0..5 {
        fx.clock.advance_secs(60);
        assert!(!fx.engine.tick(&mut fx.store).unwrap().reminded);
    }
    assert!(fx.notifier.messages().is_empty());
}

#[test]
fn running_timer_survives_selection_change() {
    let mut fx = Fixture::new();
    let (first_project, sections) = fx.project_with_sections(1);
    let running = sections[0].clone();
    fx.engine.start(&mut fx.store, running.clone()).unwrap();

    let (other_project, _) = fx.project_with_sections(1);
    assert_eq!(
        selectors::selected_project_id(fx.store.document()),
        Some(other_project.as_str())
    );

    fx.clock.advance_secs(5);
    fx.engine.tick(&mut fx.store).unwrap();
    assert!(fx.engine.is_running(&running));
    assert_eq!(running.project_id, first_project);
    assert_eq!(fx.stored_time(&running), 5);
    assert_eq!(selectors::section_time(fx.store.document()), 0);
}

#[test]
fn starting_a_missing_section_is_refused() {
    let mut fx = Fixture::new();
    fx.project_with_sections(1);

    let missing = SectionRef::new("nope", "nope");
    assert!(!fx.engine.start(&mut fx.store, missing).unwrap());
    assert_eq!(fx.engine.state(), TimerState::Idle);
}

#[test]
fn deleting_the_running_section_releases_the_engine() {
    let mut fx = Fixture::new();
    let (project_id, sections) = fx.project_with_sections(2);
    let running = sections[1].clone();
    fx.set_timer_options(Some(1), None);

    assert!(fx.engine.start(&mut fx.store, running.clone()).unwrap());
    fx.clock.advance_secs(4);
    assert!(fx
        .store
        .delete_section(&project_id, &running.section_id)
        .unwrap());

    fx.clock.advance_secs(1);
    let outcome = fx.engine.tick(&mut fx.store).unwrap();
    assert!(outcome.orphaned);
    assert_eq!(outcome.flushed_secs, None);
    assert_eq!(fx.engine.running_section(), None);
    assert_eq!(fx.engine.state(), TimerState::Idle);
    assert_eq!(fx.stored_time(&sections[0]), 0);

    for _ in 0..179 {
        fx.clock.advance_secs(1);
        fx.engine.tick(&mut fx.store).unwrap();
    }
    assert_eq!(
        fx.notifier.messages(),
        vec![REMINDER_MESSAGE.to_string(), REMINDER_MESSAGE.to_string()]
    );
}

#[test]
fn switching_away_from_a_deleted_section_still_starts_the_new_one() {
    let mut fx = Fixture::new();
    let (project_id, sections) = fx.project_with_sections(2);
    fx.engine.start(&mut fx.store, sections[0].clone()).unwrap();
    fx.store
        .delete_section(&project_id, &sections[0].section_id)
        .unwrap();

    fx.clock.advance_secs(2);
    assert!(fx.engine.start(&mut fx.store, sections[1].clone()).unwrap());
    assert_eq!(fx.engine.running_section(), Some(sections[1].clone()));
    assert_eq!(fx.stored_time(&sections[1]), 0);
}

/// Records what the engine reports as running each time the store writes.
struct ObservingRepo {
    inner: SqliteSlotRepository,
    engine: Arc<OnceLock<Arc<TimerEngine>>>,
    seen: Arc<Mutex<Vec<Option<SectionRef>>>>,
}

impl SlotRepository for ObservingRepo {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        self.inner.read_slot(key)
    }

    fn write_slot(&self, key: &str, payload: &str) -> RepoResult<()> {
        if let Some(engine) = self.engine.get() {
            self.seen.lock().unwrap().push(engine.running_section());
        }
        self.inner.write_slot(key, payload)
    }

    fn change_marker(&self) -> RepoResult<i64> {
        self.inner.change_marker()
    }
}

#[test]
fn switch_flush_commits_without_the_engine_lock_and_before_the_new_start() {
    let clock = ManualClock::new(1_700_000_000_000);
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let slot = Arc::new(OnceLock::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let repo = ObservingRepo {
        inner: SqliteSlotRepository::open_in_memory().unwrap(),
        engine: Arc::clone(&slot),
        seen: Arc::clone(&seen),
    };
    let mut store = ProjectStore::open(repo, Arc::clone(&shared));
    let engine = TimerEngine::shared(shared, Arc::new(RecordingNotifier::new()));

    let project_id = store.create_project().unwrap();
    let first = SectionRef::new(
        project_id.clone(),
        store.add_section_to_project(&project_id).unwrap().unwrap(),
    );
    let second = SectionRef::new(
        project_id.clone(),
        store.add_section_to_project(&project_id).unwrap().unwrap(),
    );
    assert!(slot.set(Arc::clone(&engine)).is_ok());

    engine.start(&mut store, first.clone()).unwrap();
    clock.advance_secs(7);
    engine.start(&mut store, second.clone()).unwrap();
    clock.advance_secs(1);
    engine.tick(&mut store).unwrap();
    engine.stop(&mut store).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![None, Some(second.clone()), None]
    );
    let sections = &store.project(&project_id).unwrap().data.sections;
    assert_eq!(sections[&first.section_id].data.time, 7);
    assert_eq!(sections[&second.section_id].data.time, 1);
}
