//! Project and section records.
//!
//! # Responsibility
//! - Define the canonical shape of a project, its options and its sections.
//! - Keep the serialized field names identical to the storage document
//!   (`lastModified`, `selectedSectionID`, `counterOptions`, ...).
//!
//! # Invariants
//! - Counters are non-negative integers; `time` is whole seconds.
//! - `selected_section_id` is either empty or a key of `data.sections` after
//!   any store operation that touches sections.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Opaque project identifier (key of `StoreDocument::projects`).
pub type ProjectId = String;

/// Opaque section identifier, unique within its project.
pub type SectionId = String;

/// Scalar counters tracked for one section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionCounters {
    #[serde(default)]
    pub stitches: u64,
    #[serde(default)]
    pub rows: u64,
    #[serde(default)]
    pub repeats: u64,
    /// Elapsed work time in seconds.
    #[serde(default)]
    pub time: u64,
}

/// User-editable counters (time is owned by the timer engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    Stitches,
    Rows,
    Repeats,
}

impl CounterKind {
    pub const ALL: [CounterKind; 3] = [Self::Stitches, Self::Rows, Self::Repeats];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stitches => "stitches",
            Self::Rows => "rows",
            Self::Repeats => "repeats",
        }
    }
}

impl SectionCounters {
    pub fn get(&self, kind: CounterKind) -> u64 {
        match kind {
            CounterKind::Stitches => self.stitches,
            CounterKind::Rows => self.rows,
            CounterKind::Repeats => self.repeats,
        }
    }

    pub fn set(&mut self, kind: CounterKind, value: u64) {
        match kind {
            CounterKind::Stitches => self.stitches = value,
            CounterKind::Rows => self.rows = value,
            CounterKind::Repeats => self.repeats = value,
        }
    }
}

/// Named sub-unit of work inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    /// Free-form notes blob. Older documents stored a list of lines.
    #[serde(default, deserialize_with = "deserialize_notes")]
    pub notes: String,
    #[serde(default)]
    pub data: SectionCounters,
}

impl Section {
    pub const DEFAULT_NAME: &'static str = "Untitled Section";

    /// Creates an empty section with zeroed counters.
    pub fn blank() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            notes: String::new(),
            data: SectionCounters::default(),
        }
    }
}

/// Which counters the UI shows for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterOptions {
    pub stitches: bool,
    pub rows: bool,
    pub repeats: bool,
    pub time: bool,
}

impl Default for CounterOptions {
    fn default() -> Self {
        Self {
            stitches: true,
            rows: true,
            repeats: true,
            time: true,
        }
    }
}

/// Reminder and auto-stop policy of the timer, delays in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimerOptions {
    pub remind_turn_on: bool,
    pub auto_turn_off: bool,
    pub remind_turn_on_delay: u32,
    pub auto_turn_off_delay: u32,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            remind_turn_on: false,
            auto_turn_off: false,
            remind_turn_on_delay: 30,
            auto_turn_off_delay: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectOptions {
    pub counter_options: CounterOptions,
    pub timer_options: TimerOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectData {
    #[serde(default)]
    pub sections: BTreeMap<SectionId, Section>,
}

/// Named, colored container of sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub options: ProjectOptions,
    #[serde(default)]
    pub data: ProjectData,
    pub name: String,
    pub color: String,
    /// Unix epoch milliseconds of the last mutation touching this project.
    #[serde(default)]
    pub last_modified: i64,
    /// Empty when no section is active.
    #[serde(rename = "selectedSectionID", default)]
    pub selected_section_id: SectionId,
}

impl Project {
    pub const DEFAULT_NAME: &'static str = "Untitled Project";
    pub const DEFAULT_COLOR: &'static str = "#808080";

    /// Creates a fresh project from template defaults with no sections.
    pub fn template(now_ms: i64) -> Self {
        Self {
            options: ProjectOptions::default(),
            data: ProjectData::default(),
            name: Self::DEFAULT_NAME.to_string(),
            color: Self::DEFAULT_COLOR.to_string(),
            last_modified: now_ms,
            selected_section_id: SectionId::new(),
        }
    }

    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.data.sections.get(section_id)
    }

    /// Returns the active section, or `None` when the pointer is empty or dangling.
    pub fn selected_section(&self) -> Option<&Section> {
        if self.selected_section_id.is_empty() {
            return None;
        }
        self.section(&self.selected_section_id)
    }

    /// Stamps `last_modified` without ever moving it backwards.
    pub fn touch(&mut self, now_ms: i64) {
        self.last_modified = self.last_modified.max(now_ms);
    }
}

/// Replicated store root: the unit of persistence and of cross-context sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub projects: BTreeMap<ProjectId, Project>,
    /// Empty when no project is selected.
    #[serde(rename = "selectedProjectID", default)]
    pub selected_project_id: ProjectId,
}

/// Top-level project field that may be rewritten through
/// `ProjectStore::update_selected_project`.
pub trait ProjectField {
    type Value: Clone;

    fn name(&self) -> &'static str;
    fn slot<'p>(&self, project: &'p mut Project) -> &'p mut Self::Value;
}

/// Selects `Project::options`.
#[derive(Debug, Clone, Copy)]
pub struct OptionsField;

/// Selects `Project::data`.
#[derive(Debug, Clone, Copy)]
pub struct DataField;

impl ProjectField for OptionsField {
    type Value = ProjectOptions;

    fn name(&self) -> &'static str {
        "options"
    }

    fn slot<'p>(&self, project: &'p mut Project) -> &'p mut ProjectOptions {
        &mut project.options
    }
}

impl ProjectField for DataField {
    type Value = ProjectData;

    fn name(&self) -> &'static str {
        "data"
    }

    fn slot<'p>(&self, project: &'p mut Project) -> &'p mut ProjectData {
        &mut project.data
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NotesRepr {
    Text(String),
    Lines(Vec<String>),
}

fn deserialize_notes<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NotesRepr>::deserialize(deserializer)? {
        Some(NotesRepr::Text(text)) => text,
        Some(NotesRepr::Lines(lines)) => lines.join("\n"),
        None => String::new(),
    })
}
