//! Pure read projections over a `StoreDocument`.
//!
//! Every selector treats an empty or dangling selection as "nothing
//! selected" and returns a neutral value instead of failing.

use crate::model::project::{
    CounterKind, Project, ProjectOptions, Section, SectionId, StoreDocument,
};

/// Single option flag of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionFlag {
    ShowStitches,
    ShowRows,
    ShowRepeats,
    ShowTime,
    RemindTurnOn,
    AutoTurnOff,
}

/// Notes of one section, as collected by [`project_totals`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionNotes {
    pub section_id: SectionId,
    pub section_name: String,
    pub notes: String,
}

/// Aggregate over all sections of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectTotals {
    pub stitches: u64,
    pub rows: u64,
    pub repeats: u64,
    /// Seconds.
    pub time: u64,
    pub section_count: usize,
    /// Non-empty notes only, in section id order.
    pub notes: Vec<SectionNotes>,
}

pub fn selected_project_id(doc: &StoreDocument) -> Option<&str> {
    if doc.selected_project_id.is_empty() {
        None
    } else {
        Some(doc.selected_project_id.as_str())
    }
}

pub fn selected_project(doc: &StoreDocument) -> Option<&Project> {
    selected_project_id(doc).and_then(|id| doc.projects.get(id))
}

pub fn selected_project_name(doc: &StoreDocument) -> Option<&str> {
    selected_project(doc).map(|project| project.name.as_str())
}

pub fn selected_project_color(doc: &StoreDocument) -> Option<&str> {
    selected_project(doc).map(|project| project.color.as_str())
}

pub fn selected_project_options(doc: &StoreDocument) -> Option<&ProjectOptions> {
    selected_project(doc).map(|project| &project.options)
}

pub fn selected_section_id(doc: &StoreDocument) -> Option<&str> {
    selected_project(doc)
        .map(|project| project.selected_section_id.as_str())
        .filter(|id| !id.is_empty())
}

pub fn selected_section(doc: &StoreDocument) -> Option<&Section> {
    selected_project(doc).and_then(Project::selected_section)
}

/// Reads one option flag of the selected project.
pub fn selected_option(doc: &StoreDocument, flag: OptionFlag) -> Option<bool> {
    selected_project_options(doc).map(|options| {
        let counters = &options.counter_options;
        let timer = &options.timer_options;
        match flag {
            OptionFlag::ShowStitches => counters.stitches,
            OptionFlag::ShowRows => counters.rows,
            OptionFlag::ShowRepeats => counters.repeats,
            OptionFlag::ShowTime => counters.time,
            OptionFlag::RemindTurnOn => timer.remind_turn_on,
            OptionFlag::AutoTurnOff => timer.auto_turn_off,
        }
    })
}

/// Counter of the selected section, 0 when nothing is selected.
pub fn section_counter(doc: &StoreDocument, kind: CounterKind) -> u64 {
    selected_section(doc).map_or(0, |section| section.data.get(kind))
}

/// Persisted elapsed seconds of the selected section, 0 when nothing is selected.
pub fn section_time(doc: &StoreDocument) -> u64 {
    selected_section(doc).map_or(0, |section| section.data.time)
}

/// Sums counters over every section of `project`; zeroed for `None`.
pub fn project_totals(project: Option<&Project>) -> ProjectTotals {
    let Some(project) = project else {
        return ProjectTotals::default();
    };

    project
        .data
        .sections
        .iter()
        .fold(ProjectTotals::default(), |mut totals, (section_id, section)| {
            totals.stitches += section.data.stitches;
            totals.rows += section.data.rows;
            totals.repeats += section.data.repeats;
            totals.time += section.data.time;
            totals.section_count += 1;
            if !section.notes.trim().is_empty() {
                totals.notes.push(SectionNotes {
                    section_id: section_id.clone(),
                    section_name: section.name.clone(),
                    notes: section.notes.clone(),
                });
            }
            totals
        })
}

pub fn selected_project_totals(doc: &StoreDocument) -> ProjectTotals {
    project_totals(selected_project(doc))
}

/// Project ids, most recently modified first, ties broken by id.
pub fn projects_by_recent(doc: &StoreDocument) -> Vec<&str> {
    let mut entries: Vec<(&str, i64)> = doc
        .projects
        .iter()
        .map(|(id, project)| (id.as_str(), project.last_modified))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries.into_iter().map(|(id, _)| id).collect()
}
