//! Core of the stitch counter: projects, sections, counters and the section timer.
//! Every write goes through [`ProjectStore`]; other live contexts learn about
//! it through the [`sync`] module.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod sync;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigError, ConfigInput};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::project::{
    CounterKind, Project, ProjectId, Section, SectionCounters, SectionId, StoreDocument,
};
pub use repo::slot_repo::{RepoError, RepoResult, SlotRepository, SqliteSlotRepository};
pub use service::counter_service::CounterService;
pub use store::{LoadSource, ProjectStore, StoreError, StoreResult};
pub use sync::{StorageBus, SyncedStore};
pub use timer::{LogNotifier, Notifier, SectionRef, TickDriver, TimerEngine, TimerState};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
