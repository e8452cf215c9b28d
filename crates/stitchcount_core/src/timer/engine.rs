//! Timer engine state machine.
//!
//! # Responsibility
//! - Drive `Idle` / `Running` transitions for the single live timer.
//! - Compute elapsed seconds from the wall clock on demand.
//! - Evaluate the auto-stop and reminder policies on every tick.
//!
//! # Invariants
//! - Starting a section while another runs first stops and flushes the
//!   other one, so at most one section is ever running.
//! - Elapsed seconds are `accumulated + floor((now - started_at) / 1000)`.
//! - The running timer stays bound to its own project and section when the
//!   selection moves elsewhere.
//! - The first reminder fires one full delay after the engine is seen idle.
//! - A running section that disappears from the store (deleted here or by
//!   another context) releases the engine back to `Idle` on the next tick.
//! - The engine lock is never held across a store commit.

use super::notify::Notifier;
use crate::clock::Clock;
use crate::model::project::{ProjectId, SectionId, StoreDocument};
use crate::repo::slot_repo::SlotRepository;
use crate::store::{selectors, ProjectStore, StoreResult};
use log::info;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const AUTO_STOP_MESSAGE: &str = "Timer paused due to inactivity";
pub const REMINDER_MESSAGE: &str = "Timer is off. Don't forget to turn it back on!";

const MINUTE_MS: i64 = 60 * 1000;

/// Argument-free callable that resets the inactivity clock.
pub type InteractionHook = Arc<dyn Fn() + Send + Sync>;

/// Fully qualified section address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SectionRef {
    pub project_id: ProjectId,
    pub section_id: SectionId,
}

impl SectionRef {
    pub fn new(project_id: impl Into<ProjectId>, section_id: impl Into<SectionId>) -> Self {
        Self {
            project_id: project_id.into(),
            section_id: section_id.into(),
        }
    }

    /// The section currently shown: selected section of the selected project.
    pub fn selected(doc: &StoreDocument) -> Option<Self> {
        let project_id = selectors::selected_project_id(doc)?;
        let section_id = selectors::selected_section_id(doc)?;
        Some(Self::new(project_id, section_id))
    }

    fn persisted_time(&self, doc: &StoreDocument) -> Option<u64> {
        doc.projects
            .get(&self.project_id)
            .and_then(|project| project.section(&self.section_id))
            .map(|section| section.data.time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningTimer {
    pub section: SectionRef,
    pub started_at_ms: i64,
    pub accumulated_secs: u64,
}

impl RunningTimer {
    pub fn elapsed_secs(&self, now_ms: i64) -> u64 {
        let run_ms = (now_ms - self.started_at_ms).max(0);
        self.accumulated_secs + (run_ms / 1000) as u64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimerState {
    #[default]
    Idle,
    Running(RunningTimer),
}

/// What one [`TimerEngine::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Seconds written to the running section, when a flush happened.
    pub flushed_secs: Option<u64>,
    pub auto_stopped: bool,
    pub reminded: bool,
    /// The running section no longer exists; the engine went idle without a flush.
    pub orphaned: bool,
}

#[derive(Debug)]
struct ReminderSchedule {
    project_id: ProjectId,
    delay_minutes: u32,
    due_ms: i64,
}

#[derive(Debug)]
struct EngineState {
    timer: TimerState,
    last_interaction_ms: i64,
    last_flushed_secs: Option<u64>,
    reminder: Option<ReminderSchedule>,
}

impl EngineState {
    fn new(now_ms: i64) -> Self {
        Self {
            timer: TimerState::Idle,
            last_interaction_ms: now_ms,
            last_flushed_secs: None,
            reminder: None,
        }
    }

    fn enter_idle(&mut self) -> Option<RunningTimer> {
        self.last_flushed_secs = None;
        self.reminder = None;
        match std::mem::take(&mut self.timer) {
            TimerState::Running(running) => Some(running),
            TimerState::Idle => None,
        }
    }
}

/// Process-wide timer service. Share it as `Arc<TimerEngine>`.
pub struct TimerEngine {
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<EngineState>,
}

impl TimerEngine {
    pub fn new(clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        let now_ms = clock.now_ms();
        Self {
            clock,
            notifier,
            state: Mutex::new(EngineState::new(now_ms)),
        }
    }

    pub fn shared(clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Arc<Self> {
        Arc::new(Self::new(clock, notifier))
    }

    pub fn state(&self) -> TimerState {
        self.lock().timer.clone()
    }

    pub fn running_section(&self) -> Option<SectionRef> {
        match &self.lock().timer {
            TimerState::Running(running) => Some(running.section.clone()),
            TimerState::Idle => None,
        }
    }

    pub fn is_running(&self, section: &SectionRef) -> bool {
        matches!(&self.lock().timer, TimerState::Running(running) if running.section == *section)
    }

    /// Starts `section`, stopping and flushing any other running section first.
    ///
    /// Returns `false` when `section` does not exist or is already running.
    pub fn start<R: SlotRepository>(
        &self,
        store: &mut ProjectStore<R>,
        section: SectionRef,
    ) -> StoreResult<bool> {
        let now_ms = self.clock.now_ms();
        let Some(accumulated_secs) = section.persisted_time(store.document()) else {
            return Ok(false);
        };

        let previous = {
            let mut state = self.lock();
            if matches!(&state.timer, TimerState::Running(running) if running.section == section)
            {
                return Ok(false);
            }
            state.enter_idle()
        };
        if let Some(previous) = previous {
            self.flush_stopped(store, &previous, now_ms, "timer_switch")?;
        }

        let raced = {
            let mut state = self.lock();
            let raced = state.enter_idle();
            info!(
                "event=timer_start module=timer project={} section={} accumulated_s={}",
                section.project_id, section.section_id, accumulated_secs
            );
            state.timer = TimerState::Running(RunningTimer {
                section,
                started_at_ms: now_ms,
                accumulated_secs,
            });
            state.last_flushed_secs = Some(accumulated_secs);
            state.last_interaction_ms = now_ms;
            raced
        };
        // Another caller started a section while the switch flush ran.
        if let Some(raced) = raced {
            self.flush_stopped(store, &raced, now_ms, "timer_switch")?;
        }
        Ok(true)
    }

    /// Starts the currently selected section, if any.
    pub fn start_selected<R: SlotRepository>(
        &self,
        store: &mut ProjectStore<R>,
    ) -> StoreResult<bool> {
        match SectionRef::selected(store.document()) {
            Some(section) => self.start(store, section),
            None => Ok(false),
        }
    }

    /// Stops the running timer and writes its final elapsed seconds.
    ///
    /// Returns the flushed value, or `None` when nothing was running.
    pub fn stop<R: SlotRepository>(&self, store: &mut ProjectStore<R>) -> StoreResult<Option<u64>> {
        let now_ms = self.clock.now_ms();
        let mut state = self.lock();
        let Some(running) = state.enter_idle() else {
            return Ok(None);
        };
        state.last_interaction_ms = now_ms;
        drop(state);

        let elapsed = self.flush_stopped(store, &running, now_ms, "timer_stop")?;
        Ok(Some(elapsed))
    }

    /// Writes 0 to `section`; a running `section` is discarded and goes idle.
    pub fn reset<R: SlotRepository>(
        &self,
        store: &mut ProjectStore<R>,
        section: &SectionRef,
    ) -> StoreResult<bool> {
        let now_ms = self.clock.now_ms();
        let mut state = self.lock();
        if matches!(&state.timer, TimerState::Running(running) if running.section == *section) {
            state.enter_idle();
        }
        state.last_interaction_ms = now_ms;
        drop(state);

        store.set_section_time(&section.project_id, &section.section_id, 0)
    }

    /// Periodic work, expected roughly once per second.
    ///
    /// While running: applies auto-stop, otherwise flushes the elapsed value
    /// when it changed. While idle: advances the reminder schedule of the
    /// selected project.
    pub fn tick<R: SlotRepository>(&self, store: &mut ProjectStore<R>) -> StoreResult<TickOutcome> {
        let now_ms = self.clock.now_ms();
        let mut outcome = TickOutcome::default();
        let mut guard = self.lock();
        let state = &mut *guard;

        let running = match &state.timer {
            TimerState::Running(running) => Some(running.clone()),
            TimerState::Idle => None,
        };

        match running {
            Some(running) => {
                let elapsed = running.elapsed_secs(now_ms);
                if running.section.persisted_time(store.document()).is_none() {
                    state.enter_idle();
                    drop(guard);
                    info!(
                        "event=timer_orphaned module=timer project={} section={} elapsed_s={}",
                        running.section.project_id, running.section.section_id, elapsed
                    );
                    outcome.orphaned = true;
                    return Ok(outcome);
                }
                let auto_off = store
                    .project(&running.section.project_id)
                    .map(|project| project.options.timer_options)
                    .filter(|options| options.auto_turn_off && options.auto_turn_off_delay > 0)
                    .map(|options| i64::from(options.auto_turn_off_delay) * MINUTE_MS);
                let inactive_ms = now_ms - state.last_interaction_ms;

                if auto_off.is_some_and(|limit| inactive_ms >= limit) {
                    state.enter_idle();
                    outcome.auto_stopped = true;
                    info!(
                        "event=timer_auto_stop module=timer section={} inactive_ms={} elapsed_s={}",
                        running.section.section_id, inactive_ms, elapsed
                    );
                } else if state.last_flushed_secs == Some(elapsed) {
                    return Ok(outcome);
                } else {
                    state.last_flushed_secs = Some(elapsed);
                }
                drop(guard);

                let written = store.set_section_time(
                    &running.section.project_id,
                    &running.section.section_id,
                    elapsed,
                )?;
                if !written {
                    self.release_if_running(&running.section);
                    outcome.orphaned = true;
                    return Ok(outcome);
                }
                outcome.flushed_secs = Some(elapsed);
                if outcome.auto_stopped {
                    self.notifier.notify(AUTO_STOP_MESSAGE);
                }
            }
            None => {
                let reminder = selectors::selected_project(store.document())
                    .map(|project| project.options.timer_options)
                    .filter(|options| options.remind_turn_on && options.remind_turn_on_delay > 0)
                    .map(|options| options.remind_turn_on_delay)
                    .zip(selectors::selected_project_id(store.document()));

                match reminder {
                    Some((delay_minutes, project_id)) => {
                        let period_ms = i64::from(delay_minutes) * MINUTE_MS;
                        let same_schedule = state.reminder.as_ref().is_some_and(|schedule| {
                            schedule.project_id == project_id
                                && schedule.delay_minutes == delay_minutes
                        });
                        if !same_schedule {
                            state.reminder = Some(ReminderSchedule {
                                project_id: project_id.to_string(),
                                delay_minutes,
                                due_ms: now_ms + period_ms,
                            });
                        } else if let Some(schedule) = state.reminder.as_mut() {
                            if now_ms >= schedule.due_ms {
                                schedule.due_ms = now_ms + period_ms;
                                outcome.reminded = true;
                            }
                        }
                    }
                    None => state.reminder = None,
                }
                drop(guard);

                if outcome.reminded {
                    self.notifier.notify(REMINDER_MESSAGE);
                }
            }
        }

        Ok(outcome)
    }

    /// Seconds to display for `section`: live value when running, stored value otherwise.
    pub fn display_seconds(&self, doc: &StoreDocument, section: &SectionRef) -> u64 {
        let now_ms = self.clock.now_ms();
        match &self.lock().timer {
            TimerState::Running(running) if running.section == *section => {
                running.elapsed_secs(now_ms)
            }
            _ => section.persisted_time(doc).unwrap_or(0),
        }
    }

    /// Resets the inactivity clock used by auto-stop.
    pub fn mark_interaction(&self) {
        let now_ms = self.clock.now_ms();
        self.lock().last_interaction_ms = now_ms;
    }

    pub fn last_interaction_ms(&self) -> i64 {
        self.lock().last_interaction_ms
    }

    /// Hook handed to counter controls; calls [`Self::mark_interaction`].
    pub fn interaction_hook(self: &Arc<Self>) -> InteractionHook {
        let engine = Arc::clone(self);
        Arc::new(move || engine.mark_interaction())
    }

    /// Drops pending reminder schedules, e.g. when the owning view goes away.
    pub fn cancel_schedules(&self) {
        self.lock().reminder = None;
    }

    /// Returns the engine to a fresh idle state without touching the store.
    pub fn clear(&self) {
        let now_ms = self.clock.now_ms();
        *self.lock() = EngineState::new(now_ms);
    }

    fn flush_stopped<R: SlotRepository>(
        &self,
        store: &mut ProjectStore<R>,
        stopped: &RunningTimer,
        now_ms: i64,
        event: &'static str,
    ) -> StoreResult<u64> {
        let elapsed = stopped.elapsed_secs(now_ms);
        info!(
            "event={event} module=timer project={} section={} elapsed_s={}",
            stopped.section.project_id, stopped.section.section_id, elapsed
        );
        store.set_section_time(
            &stopped.section.project_id,
            &stopped.section.section_id,
            elapsed,
        )?;
        Ok(elapsed)
    }

    fn release_if_running(&self, section: &SectionRef) {
        let mut state = self.lock();
        if matches!(&state.timer, TimerState::Running(running) if running.section == *section) {
            state.enter_idle();
            info!(
                "event=timer_orphaned module=timer project={} section={}",
                section.project_id, section.section_id
            );
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
