//! Open projects and the switch protocol.
//!
//! A session holds every open project as a record; exactly one is hydrated
//! into the [`CanvasEngine`]. Switching captures the active project, tears
//! the scene down, and rebuilds the target inside a restore guard so neither
//! history nor auto-save sees the rebuild.

use crate::engine::{CanvasEngine, EditorConfig};
use kurbo::{Size, Vec2};
use mosaic_core::{DEFAULT_NODE_SIZE, NodeKind, Project, ProjectId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no project at index {0}")]
    NoSuchProject(usize),
    #[error("no active project")]
    NoActiveProject,
    #[error("project {0} is not open")]
    NotOpen(ProjectId),
}

pub struct ProjectSession {
    projects: Vec<Project>,
    active: Option<usize>,
    /// Projects with changes the store has not seen, oldest first.
    unsaved: Vec<ProjectId>,
    pub engine: CanvasEngine,
}

impl ProjectSession {
    pub fn new(config: EditorConfig, screen: Size) -> Self {
        Self {
            projects: Vec::new(),
            active: None,
            unsaved: Vec::new(),
            engine: CanvasEngine::new(config, screen),
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// The active project's record. Entity data is only as fresh as the last
    /// capture; see [`capture_active`](Self::capture_active).
    pub fn active(&self) -> Option<&Project> {
        self.projects.get(self.active?)
    }

    pub fn active_mut(&mut self) -> Option<&mut Project> {
        self.projects.get_mut(self.active?)
    }

    pub fn index_of(&self, id: ProjectId) -> Option<usize> {
        self.projects.iter().position(|p| p.id == id)
    }

    /// Create an empty project, switch to it, and reset the view to home.
    pub fn new_project(&mut self, name: &str) -> usize {
        let mut record = Project::new(name);
        let home = self.engine.viewport.config().home;
        let mut probe = self.engine.viewport.clone();
        probe.reset_view(false, 0.0);
        record.view = probe.transform();
        log::debug!("session: new project '{}' centered on {home:?}", record.name);
        self.projects.push(record);
        let index = self.projects.len() - 1;
        // The index was just pushed.
        let _ = self.switch_to(index);
        index
    }

    /// Append a loaded record and switch to it with its stored view.
    pub fn open_project(&mut self, record: Project) -> usize {
        if let Some(existing) = self.index_of(record.id) {
            log::debug!("session: project {} already open, replacing", record.id);
            if self.active == Some(existing) {
                self.active = None;
            }
            self.unsaved.retain(|id| *id != record.id);
            self.projects[existing] = record;
            let _ = self.switch_to(existing);
            return existing;
        }
        self.projects.push(record);
        let index = self.projects.len() - 1;
        let _ = self.switch_to(index);
        index
    }

    /// Make project `index` the hydrated one.
    pub fn switch_to(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.projects.len() {
            return Err(SessionError::NoSuchProject(index));
        }
        let previous = self.active;
        if previous == Some(index) {
            // Already hydrated: the live scene is newer than the record.
            return Ok(());
        }
        // A change the caller has not collected yet belongs to the outgoing
        // project.
        if self.engine.has_changed()
            && let Some(id) = previous.and_then(|i| self.projects.get(i)).map(|p| p.id)
        {
            self.mark_unsaved(id);
        }

        let mut engine = self.engine.begin_restore();
        if let Some(prev) = previous
            && let Some(record) = self.projects.get_mut(prev)
        {
            engine.capture_into(record);
        }

        let record = &self.projects[index];
        log::debug!("session: switching to '{}' ({})", record.name, record.id);
        engine.load_project(record);
        if record.is_blank() {
            let home = engine.viewport.config().home;
            let origin = home - Vec2::new(DEFAULT_NODE_SIZE.width / 2.0, DEFAULT_NODE_SIZE.height / 2.0);
            engine.scene.create_node(NodeKind::Text, origin);
        }
        engine.history.clear();
        drop(engine);

        self.active = Some(index);
        Ok(())
    }

    /// Close project `index`. When it was active, the previous neighbour
    /// becomes active; closing the last project leaves none.
    pub fn close_project(&mut self, index: usize) -> Result<Project, SessionError> {
        if index >= self.projects.len() {
            return Err(SessionError::NoSuchProject(index));
        }
        let mut closed = self.projects.remove(index);
        if self.is_unsaved(closed.id) {
            log::warn!("session: closing '{}' with unsaved changes", closed.name);
            self.unsaved.retain(|id| *id != closed.id);
        }
        match self.active {
            Some(active) if active == index => {
                self.engine.capture_into(&mut closed);
                self.active = None;
                if self.projects.is_empty() {
                    let mut engine = self.engine.begin_restore();
                    engine.load_project(&Project::new(""));
                    drop(engine);
                    log::debug!("session: closed the last project");
                } else {
                    let next = index.saturating_sub(1).min(self.projects.len() - 1);
                    self.switch_to(next)?;
                }
            }
            Some(active) if active > index => self.active = Some(active - 1),
            _ => {}
        }
        log::debug!("session: closed '{}'", closed.name);
        Ok(closed)
    }

    pub fn rename_project(&mut self, index: usize, name: &str) -> Result<(), SessionError> {
        let record = self
            .projects
            .get_mut(index)
            .ok_or(SessionError::NoSuchProject(index))?;
        let name = name.trim();
        if !name.is_empty() {
            record.name = name.to_string();
        }
        Ok(())
    }

    /// Write the live scene and view into the active record and return it.
    pub fn capture_active(&mut self) -> Result<&Project, SessionError> {
        let index = self.active.ok_or(SessionError::NoActiveProject)?;
        let record = &mut self.projects[index];
        self.engine.capture_into(record);
        Ok(record)
    }

    /// Forward a change from the engine. The active project is remembered as
    /// unsaved until a write of it succeeds.
    pub fn take_changed(&mut self) -> bool {
        if !self.engine.take_changed() {
            return false;
        }
        if let Some(id) = self.active().map(|p| p.id) {
            self.mark_unsaved(id);
        }
        true
    }

    pub fn mark_unsaved(&mut self, id: ProjectId) {
        if self.index_of(id).is_some() && !self.unsaved.contains(&id) {
            self.unsaved.push(id);
        }
    }

    pub fn is_unsaved(&self, id: ProjectId) -> bool {
        self.unsaved.contains(&id)
    }

    pub fn has_unsaved(&self) -> bool {
        !self.unsaved.is_empty()
    }

    /// Pick the next record to write and stop tracking it as unsaved: the
    /// oldest unsaved project, or the active one when nothing is pending. An
    /// active record is refreshed from the live scene first. A failed write
    /// must hand the id back through [`mark_unsaved`](Self::mark_unsaved).
    pub fn take_save_target(&mut self) -> Result<&Project, SessionError> {
        let id = match self.unsaved.first() {
            Some(id) => *id,
            None => self.active().ok_or(SessionError::NoActiveProject)?.id,
        };
        self.unsaved.retain(|u| *u != id);
        let index = self.index_of(id).ok_or(SessionError::NotOpen(id))?;
        let record = &mut self.projects[index];
        if self.active == Some(index) {
            self.engine.capture_into(record);
        }
        Ok(record)
    }

    /// Record where a project now lives remotely.
    pub fn mark_saved(&mut self, project: ProjectId, remote_id: &str, modified_ms: u64) {
        if let Some(index) = self.index_of(project) {
            let record = &mut self.projects[index];
            record.remote_id = Some(remote_id.to_string());
            record.last_modified = Some(modified_ms);
        }
    }
}
