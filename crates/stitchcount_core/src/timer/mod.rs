//! Single live section timer with reminder and auto-stop policies.
//!
//! # Responsibility
//! - Track the one running section timer of the process.
//! - Flush elapsed seconds into the store on stop, on switch and on tick.
//! - Raise inactivity and reminder notifications.
//!
//! # Invariants
//! - At most one section is running at any instant.
//! - Timer runtime state is never part of the persisted document.

pub mod driver;
pub mod engine;
pub mod notify;

pub use driver::TickDriver;
pub use engine::{InteractionHook, RunningTimer, SectionRef, TickOutcome, TimerEngine, TimerState};
pub use notify::{LogNotifier, Notifier, RecordingNotifier};

/// Formats seconds as `m:ss`, or `h:mm:ss` from one hour on.
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
