//! Undo/Redo command stack.
//!
//! Every recorded step is a pair of scene snapshots. A snapshot is the
//! project record of the scene (nodes, connections, groups) encoded with
//! MessagePack, so undo/redo replaces the whole entity set in one step and
//! never has to derive an inverse mutation.
//!
//! Drag gestures use **snapshot batching**: the scene is captured at the
//! start and end of the gesture, so every intermediate move collapses into
//! a single step. The view transform is never part of a snapshot.

use crate::engine::SceneMutation;
use mosaic_core::{Project, SceneGraph, ViewTransform};

/// One undoable step.
#[derive(Debug, Clone)]
pub struct Command {
    before: Vec<u8>,
    after: Vec<u8>,
    pub description: String,
}

/// Manages undo/redo stacks with batch grouping for drag gestures.
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Snapshot captured at the start of a batch.
    batch_snapshot: Option<Vec<u8>>,
    batch_description: String,
    /// Whether any mutation changed the scene during the current batch.
    batch_dirty: bool,
    /// Reused record for encoding, so snapshots share one project id.
    scratch: Project,
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(64)),
            redo_stack: Vec::new(),
            max_depth,
            batch_depth: 0,
            batch_snapshot: None,
            batch_description: String::new(),
            batch_dirty: false,
            scratch: Project::new("history"),
        }
    }

    fn snapshot(&mut self, scene: &SceneGraph) -> Option<Vec<u8>> {
        self.scratch.capture_from(scene, ViewTransform::default());
        match rmp_serde::to_vec_named(&self.scratch) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                log::error!("history: snapshot failed: {err}");
                None
            }
        }
    }

    fn restore(scene: &mut SceneGraph, bytes: &[u8]) -> bool {
        match rmp_serde::from_slice::<Project>(bytes) {
            Ok(record) => {
                *scene = record.build_scene();
                scene.mark_dirty();
                true
            }
            Err(err) => {
                log::error!("history: corrupt snapshot: {err}");
                false
            }
        }
    }

    fn push(&mut self, cmd: Command) {
        log::debug!("history: recorded '{}'", cmd.description);
        self.undo_stack.push(cmd);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
    }

    /// Start a batch group. Captures the current scene as a snapshot for
    /// undo. All mutations until `end_batch()` are applied live but tracked
    /// as one atomic undo step.
    pub fn begin_batch(&mut self, scene: &SceneGraph, description: &str) {
        if self.batch_depth == 0 {
            self.batch_snapshot = self.snapshot(scene);
            self.batch_description = description.to_string();
            self.batch_dirty = false;
        }
        self.batch_depth += 1;
    }

    /// End a batch group. When the outermost batch closes, if any
    /// mutations occurred, push one snapshot command to the undo stack.
    pub fn end_batch(&mut self, scene: &SceneGraph) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return;
        }
        let before = self.batch_snapshot.take();
        if self.batch_dirty
            && let Some(before) = before
            && let Some(after) = self.snapshot(scene)
            && before != after
        {
            let description = std::mem::take(&mut self.batch_description);
            self.push(Command {
                before,
                after,
                description,
            });
        }
        self.batch_dirty = false;
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Apply a mutation and record it. Returns whether the scene changed.
    pub fn execute(&mut self, scene: &mut SceneGraph, mutation: SceneMutation, description: &str) -> bool {
        self.execute_all(scene, vec![mutation], description)
    }

    /// Apply several mutations as one undo step.
    pub fn execute_all(
        &mut self,
        scene: &mut SceneGraph,
        mutations: Vec<SceneMutation>,
        description: &str,
    ) -> bool {
        if self.batch_depth > 0 {
            // Inside a batch: apply live; end_batch() captures the result.
            let mut changed = false;
            for m in mutations {
                changed |= m.apply(scene);
            }
            self.batch_dirty |= changed;
            return changed;
        }

        let before = self.snapshot(scene);
        let mut changed = false;
        for m in mutations {
            changed |= m.apply(scene);
        }
        if changed
            && let Some(before) = before
            && let Some(after) = self.snapshot(scene)
        {
            self.push(Command {
                before,
                after,
                description: description.to_string(),
            });
        }
        changed
    }

    /// Undo the last step. Returns its description.
    pub fn undo(&mut self, scene: &mut SceneGraph) -> Option<String> {
        let cmd = self.undo_stack.pop()?;
        if !Self::restore(scene, &cmd.before) {
            self.undo_stack.push(cmd);
            return None;
        }
        let desc = cmd.description.clone();
        self.redo_stack.push(cmd);
        Some(desc)
    }

    /// Redo the last undone step. Returns its description.
    pub fn redo(&mut self, scene: &mut SceneGraph) -> Option<String> {
        let cmd = self.redo_stack.pop()?;
        if !Self::restore(scene, &cmd.after) {
            self.redo_stack.push(cmd);
            return None;
        }
        let desc = cmd.description.clone();
        self.undo_stack.push(cmd);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Forget every step, e.g. after switching projects.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch_depth = 0;
        self.batch_snapshot = None;
        self.batch_dirty = false;
    }
}
