//! Project store: the single mutation surface of one context.
//!
//! # Responsibility
//! - Hold the current `StoreDocument` and apply named operations to it.
//! - Stamp `lastModified` on every project an operation touches.
//! - Commit each applied operation: whole-document write, then change
//!   announcement, as two explicit sequential steps.
//!
//! # Invariants
//! - Lookups fail closed: unknown ids return `Ok(false)` / `Ok(None)` and
//!   leave the document, the slot and every `lastModified` untouched.
//! - A project's `lastModified` never decreases.
//! - After a section delete the project's section pointer is empty or names
//!   an existing section.

use super::codec::{load_document, save_document, LoadSource};
use super::StoreResult;
use crate::clock::Clock;
use crate::model::id::unique_id;
use crate::model::project::{DataField, Project, ProjectField, ProjectId, Section, SectionId, StoreDocument};
use crate::repo::slot_repo::SlotRepository;
use crate::sync::{ChangePublisher, NoopPublisher};
use log::{debug, error, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid hex color regex")
});

/// In-memory store backed by one durable storage slot.
pub struct ProjectStore<R: SlotRepository> {
    repo: R,
    clock: Arc<dyn Clock>,
    publisher: Box<dyn ChangePublisher>,
    doc: StoreDocument,
    last_load: LoadSource,
    commits: u64,
}

impl<R: SlotRepository> ProjectStore<R> {
    /// Loads the store from `repo` without announcing writes to anyone.
    pub fn open(repo: R, clock: Arc<dyn Clock>) -> Self {
        Self::with_publisher(repo, clock, Box::new(NoopPublisher))
    }

    /// Loads the store from `repo`; every commit is announced via `publisher`.
    pub fn with_publisher(
        repo: R,
        clock: Arc<dyn Clock>,
        publisher: Box<dyn ChangePublisher>,
    ) -> Self {
        let (doc, last_load) = load_document(&repo, clock.now_ms());
        Self {
            repo,
            clock,
            publisher,
            doc,
            last_load,
            commits: 0,
        }
    }

    pub fn document(&self) -> &StoreDocument {
        &self.doc
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.doc.projects.get(project_id)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Source of the document produced by the most recent load.
    pub fn last_load(&self) -> LoadSource {
        self.last_load
    }

    /// Number of successful commits made by this store instance.
    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    /// Re-runs the codec load path.
    ///
    /// Only a decoded slot replaces the document. A missing, corrupt or
    /// unreadable slot keeps the current in-memory state; the example
    /// fallback applies to the initial load alone.
    pub fn reload(&mut self) -> LoadSource {
        let (doc, source) = load_document(&self.repo, self.clock.now_ms());
        self.last_load = source;
        if source == LoadSource::Stored {
            self.doc = doc;
        } else {
            warn!(
                "event=store_reload module=store status=kept source={} projects={}",
                source.as_str(),
                self.doc.projects.len()
            );
        }
        source
    }

    /// Replaces the in-memory document without writing it.
    pub fn replace_document(&mut self, doc: StoreDocument) {
        self.doc = doc;
    }

    /// Points the selection at `project_id`.
    ///
    /// The pointer is stored even when the id is unknown; readers treat a
    /// dangling selection as "nothing selected". Returns whether the id
    /// names an existing project.
    pub fn select_project(&mut self, project_id: &str) -> StoreResult<bool> {
        self.doc.selected_project_id = project_id.to_string();
        self.commit("select_project")?;
        Ok(self.doc.projects.contains_key(project_id))
    }

    /// Creates a template project under a fresh id and selects it.
    pub fn create_project(&mut self) -> StoreResult<ProjectId> {
        let projects = &self.doc.projects;
        let project_id = unique_id(|candidate| projects.contains_key(candidate));
        let project = Project::template(self.clock.now_ms());

        self.doc.projects.insert(project_id.clone(), project);
        self.doc.selected_project_id = project_id.clone();
        self.commit("create_project")?;
        Ok(project_id)
    }

    /// Renames a project. Blank names are rejected.
    pub fn rename_project(&mut self, project_id: &str, new_name: &str) -> StoreResult<bool> {
        let name = new_name.trim();
        if name.is_empty() {
            return Ok(skipped("rename_project", "blank_name"));
        }
        self.mutate_project(project_id, "rename_project", |project| {
            project.name = name.to_string();
            true
        })
    }

    /// Changes a project color. Only `#RGB` and `#RRGGBB` are accepted.
    pub fn recolor_project(&mut self, project_id: &str, color: &str) -> StoreResult<bool> {
        let color = color.trim();
        if !HEX_COLOR_RE.is_match(color) {
            return Ok(skipped("recolor_project", "invalid_color"));
        }
        self.mutate_project(project_id, "recolor_project", |project| {
            project.color = color.to_string();
            true
        })
    }

    /// Deletes a project and all of its sections.
    pub fn delete_project(&mut self, project_id: &str) -> StoreResult<bool> {
        if self.doc.projects.remove(project_id).is_none() {
            return Ok(skipped("delete_project", "not_found"));
        }
        if self.doc.selected_project_id == project_id {
            self.doc.selected_project_id.clear();
        }
        self.commit("delete_project")?;
        Ok(true)
    }

    /// Rewrites one top-level field of the selected project.
    ///
    /// Every counter, timer and option edit of the selected project goes
    /// through here so one logical edit produces exactly one commit.
    pub fn update_selected_project<F: ProjectField>(
        &mut self,
        field: F,
        update: impl FnOnce(F::Value) -> F::Value,
    ) -> StoreResult<bool> {
        if self.doc.selected_project_id.is_empty() {
            return Ok(skipped("update_selected_project", "no_selection"));
        }
        let project_id = self.doc.selected_project_id.clone();
        self.update_project(&project_id, field, update)
    }

    /// Rewrites one top-level field of the project `project_id`.
    ///
    /// Same contract as [`Self::update_selected_project`]; the timer engine
    /// uses it so a background timer keeps flushing into its own project.
    pub fn update_project<F: ProjectField>(
        &mut self,
        project_id: &str,
        field: F,
        update: impl FnOnce(F::Value) -> F::Value,
    ) -> StoreResult<bool> {
        let field_name = field.name();
        let applied = self.mutate_project(project_id, "update_project", |project| {
            let slot = field.slot(project);
            let next = update(slot.clone());
            *slot = next;
            repair_section_pointer(project);
            true
        })?;
        if applied {
            debug!("event=project_update module=store field={field_name}");
        }
        Ok(applied)
    }

    /// Makes `section_id` the active section of `project_id`.
    pub fn select_section(&mut self, project_id: &str, section_id: &str) -> StoreResult<bool> {
        self.mutate_project(project_id, "select_section", |project| {
            if !project.data.sections.contains_key(section_id) {
                return false;
            }
            project.selected_section_id = section_id.to_string();
            true
        })
    }

    /// Adds a blank section to `project_id` and makes it active.
    pub fn add_section_to_project(&mut self, project_id: &str) -> StoreResult<Option<SectionId>> {
        let mut created = None;
        self.mutate_project(project_id, "add_section", |project| {
            let sections = &project.data.sections;
            let section_id = unique_id(|candidate| sections.contains_key(candidate));
            project
                .data
                .sections
                .insert(section_id.clone(), Section::blank());
            project.selected_section_id = section_id.clone();
            created = Some(section_id);
            true
        })?;
        Ok(created)
    }

    /// Renames a section. Blank names are rejected.
    pub fn rename_section(
        &mut self,
        project_id: &str,
        section_id: &str,
        new_name: &str,
    ) -> StoreResult<bool> {
        let name = new_name.trim();
        if name.is_empty() {
            return Ok(skipped("rename_section", "blank_name"));
        }
        self.mutate_section(project_id, section_id, "rename_section", |section| {
            section.name = name.to_string();
        })
    }

    /// Replaces the notes blob of a section.
    pub fn set_section_notes(
        &mut self,
        project_id: &str,
        section_id: &str,
        notes: &str,
    ) -> StoreResult<bool> {
        self.mutate_section(project_id, section_id, "set_section_notes", |section| {
            section.notes = notes.to_string();
        })
    }

    /// Deletes a section; an active section hands selection to the first
    /// remaining section, or to none.
    pub fn delete_section(&mut self, project_id: &str, section_id: &str) -> StoreResult<bool> {
        self.mutate_project(project_id, "delete_section", |project| {
            if project.data.sections.remove(section_id).is_none() {
                return false;
            }
            if project.selected_section_id == section_id {
                project.selected_section_id = project
                    .data
                    .sections
                    .keys()
                    .next()
                    .cloned()
                    .unwrap_or_default();
            }
            true
        })
    }

    /// Overwrites the elapsed seconds of a section.
    pub fn set_section_time(
        &mut self,
        project_id: &str,
        section_id: &str,
        seconds: u64,
    ) -> StoreResult<bool> {
        if self
            .project(project_id)
            .and_then(|project| project.section(section_id))
            .is_none()
        {
            return Ok(skipped("set_section_time", "not_found"));
        }
        self.update_project(project_id, DataField, |mut data| {
            if let Some(section) = data.sections.get_mut(section_id) {
                section.data.time = seconds;
            }
            data
        })
    }

    fn mutate_section(
        &mut self,
        project_id: &str,
        section_id: &str,
        op: &'static str,
        apply: impl FnOnce(&mut Section),
    ) -> StoreResult<bool> {
        self.mutate_project(project_id, op, |project| {
            match project.data.sections.get_mut(section_id) {
                Some(section) => {
                    apply(section);
                    true
                }
                None => false,
            }
        })
    }

    /// Applies `apply` to one project; when it reports a change the project
    /// is stamped and the document committed.
    fn mutate_project(
        &mut self,
        project_id: &str,
        op: &'static str,
        apply: impl FnOnce(&mut Project) -> bool,
    ) -> StoreResult<bool> {
        let now_ms = self.clock.now_ms();
        let Some(project) = self.doc.projects.get_mut(project_id) else {
            return Ok(skipped(op, "not_found"));
        };
        if !apply(project) {
            return Ok(skipped(op, "not_found"));
        }
        project.touch(now_ms);
        self.commit(op)?;
        Ok(true)
    }

    /// Writes the whole document, then announces the change.
    fn commit(&mut self, op: &'static str) -> StoreResult<()> {
        if let Err(err) = save_document(&self.repo, &self.doc) {
            error!(
                "event=store_commit module=store status=error op={op} error={}",
                err
            );
            return Err(err);
        }
        self.commits += 1;
        debug!("event=store_commit module=store status=ok op={op}");
        self.publisher.publish_change();
        Ok(())
    }
}

fn repair_section_pointer(project: &mut Project) {
    if !project.selected_section_id.is_empty()
        && !project
            .data
            .sections
            .contains_key(&project.selected_section_id)
    {
        project.selected_section_id = project
            .data
            .sections
            .keys()
            .next()
            .cloned()
            .unwrap_or_default();
    }
}

fn skipped(op: &'static str, reason: &'static str) -> bool {
    debug!("event=store_mutation module=store status=skipped op={op} reason={reason}");
    false
}
