//! The canvas engine: one owned scene, viewport, route cache, and history.
//!
//! The host forwards normalized input through [`CanvasEngine::handle_event`]
//! and calls [`CanvasEngine::frame`] from `requestAnimationFrame`. Input only
//! mutates state and marks it dirty; routing and culling run at most once per
//! frame, against the last transform.

use crate::commands::CommandStack;
use crate::input::{InputEvent, Modifiers};
use crate::palette::PaletteCommand;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{ConnectTool, CutTool, Hit, Pointer, SelectTool, Tool, ToolContext, ToolEvent};
use kurbo::{CubicBez, Line, Point, Size, Vec2};
use mosaic_core::{
    ConnectionKey, GroupId, MindNode, NodeId, NodeKind, Project, SceneError, SceneGraph, ViewTransform,
    VisibilityMode,
};
use mosaic_view::hit::PIN_RADIUS;
use mosaic_view::{CullConfig, CullReport, Placement, RouteCache, ViewportConfig, ViewportModel, VisibilityCuller};
use serde::Deserialize;
use std::ops::{Deref, DerefMut};

// ─── Mutations ───────────────────────────────────────────────────────────

/// A change to the scene, produced by tools and commands.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneMutation {
    AddNode { node: Box<MindNode> },
    RemoveNode { id: NodeId },
    MoveNode { id: NodeId, delta: Vec2 },
    SetContent { id: NodeId, content: String },
    SetStripColor { id: NodeId, color: String },
    SetVisibility { id: NodeId, mode: VisibilityMode },
    SetKind { id: NodeId, kind: NodeKind },
    Connect { key: ConnectionKey, color: Option<String> },
    Disconnect { key: ConnectionKey },
    GroupNodes { ids: Vec<NodeId>, name: Option<String> },
    Ungroup { id: GroupId },
    RenameGroup { id: GroupId, name: String },
    SetGroupColor { id: GroupId, color: String },
}

impl SceneMutation {
    /// Apply to the scene. Returns whether anything changed; invalid
    /// targets are ignored.
    pub fn apply(self, scene: &mut SceneGraph) -> bool {
        let result = match self {
            SceneMutation::AddNode { node } => scene.add_node(*node).map(|_| ()),
            SceneMutation::RemoveNode { id } => scene
                .remove_node(id)
                .map(|_| ())
                .ok_or(SceneError::UnknownNode(id)),
            SceneMutation::MoveNode { id, delta } => scene.move_node(id, delta),
            SceneMutation::SetContent { id, content } => scene.set_content(id, content),
            SceneMutation::SetStripColor { id, color } => scene.set_strip_color(id, &color),
            SceneMutation::SetVisibility { id, mode } => scene.set_visibility(id, mode),
            SceneMutation::SetKind { id, kind } => scene.set_kind(id, kind),
            SceneMutation::Connect { key, color } => {
                // Duplicates and self links are declined silently.
                return scene.connect(key, color).is_some();
            }
            SceneMutation::Disconnect { key } => {
                return scene
                    .find_connection(&key)
                    .and_then(|edge| scene.disconnect(edge))
                    .is_some();
            }
            SceneMutation::GroupNodes { ids, name } => scene.create_group(&ids, name, None).map(|_| ()),
            SceneMutation::Ungroup { id } => scene.ungroup(id).map(|_| ()).ok_or(SceneError::UnknownGroup(id)),
            SceneMutation::RenameGroup { id, name } => scene.rename_group(id, &name),
            SceneMutation::SetGroupColor { id, color } => scene.set_group_color(id, &color),
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                log::debug!("engine: mutation ignored: {err}");
                false
            }
        }
    }
}

// ─── Configuration ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub viewport: ViewportConfig,
    pub cull: CullConfig,
    /// Maximum number of undo steps.
    pub history_depth: usize,
    /// Screen distance of a focused group's label corner from the top-left.
    pub group_focus_inset: f64,
    /// Logical radius around an anchor that counts as a hit.
    pub pin_radius: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            cull: CullConfig::default(),
            history_depth: 200,
            group_focus_inset: 40.0,
            pin_radius: PIN_RADIUS,
        }
    }
}

/// Offset from a group's top-left corner to its label.
pub const GROUP_LABEL_OFFSET: Vec2 = Vec2::new(20.0, 20.0);

// ─── Frame output ────────────────────────────────────────────────────────

/// What changed during one frame, for the host to render.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub view: ViewTransform,
    pub cull: CullReport,
    /// Routes were recomputed (all of them, or the dragged nodes' ones).
    pub routes_changed: bool,
    /// A view animation is still running.
    pub animating: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    None,
    Select,
    Connect,
    Cut,
    Pan,
}

// ─── Engine ──────────────────────────────────────────────────────────────

pub struct CanvasEngine {
    pub scene: SceneGraph,
    pub viewport: ViewportModel,
    pub routes: RouteCache,
    pub history: CommandStack,
    pub culler: VisibilityCuller,
    pub select: SelectTool,
    pub connect: ConnectTool,
    pub cut: CutTool,
    config: EditorConfig,
    gesture: Gesture,
    pan_last: Point,
    /// Set while a project is being rebuilt; suppresses history and change
    /// notifications.
    restoring: bool,
    /// A user-visible change happened since the last `take_changed`.
    changed: bool,
}

impl CanvasEngine {
    pub fn new(config: EditorConfig, screen: Size) -> Self {
        Self {
            scene: SceneGraph::new(),
            viewport: ViewportModel::new(config.viewport.clone(), screen),
            routes: RouteCache::new(),
            history: CommandStack::new(config.history_depth),
            culler: VisibilityCuller::new(config.cull.clone()),
            select: SelectTool::new(),
            connect: ConnectTool::new(),
            cut: CutTool::new(),
            config,
            gesture: Gesture::None,
            pan_last: Point::ZERO,
            restoring: false,
            changed: false,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    /// Whether a user change is waiting for [`take_changed`](Self::take_changed).
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Whether a user change happened since the last call. Resets the flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    pub fn selection(&self) -> &[NodeId] {
        &self.select.selected
    }

    /// The connection preview curve while dragging from an anchor.
    pub fn connection_preview(&self) -> Option<CubicBez> {
        self.connect.preview()
    }

    /// The cut line in screen space while drawing.
    pub fn removal_line(&self) -> Option<Line> {
        self.cut.removal_line()
    }

    // ── Mutations ──

    /// Apply one mutation as an undo step.
    pub fn apply(&mut self, mutation: SceneMutation, description: &str) -> bool {
        self.apply_all(vec![mutation], description)
    }

    /// Apply several mutations as one undo step.
    pub fn apply_all(&mut self, mutations: Vec<SceneMutation>, description: &str) -> bool {
        if mutations.is_empty() {
            return false;
        }
        if self.restoring {
            let mut changed = false;
            for m in mutations {
                changed |= m.apply(&mut self.scene);
            }
            return changed;
        }
        let changed = self.history.execute_all(&mut self.scene, mutations, description);
        self.changed |= changed;
        changed
    }

    /// Record the host-measured size of a node. Not an undo step.
    pub fn set_node_size(&mut self, id: NodeId, size: Size) -> Result<(), SceneError> {
        if self.scene.get(id).and_then(|n| n.size) == Some(size) {
            return Ok(());
        }
        self.scene.set_node_size(id, size)
    }

    /// Create a text node at a screen point unless one is already there.
    pub fn double_click(&mut self, screen: Point) -> Option<NodeId> {
        let logical = self.viewport.screen_to_logical(screen);
        if self.scene_hit(logical).node.is_some() {
            return None;
        }
        let node = MindNode::new(NodeId::fresh(), NodeKind::Text, logical);
        let id = node.id;
        self.apply(SceneMutation::AddNode { node: Box::new(node) }, "Add node")
            .then(|| {
                self.select.select_only(id);
                id
            })
    }

    pub fn delete_selection(&mut self) -> bool {
        let mutations: Vec<_> = self
            .select
            .selected
            .drain(..)
            .map(|id| SceneMutation::RemoveNode { id })
            .collect();
        self.apply_all(mutations, "Delete")
    }

    /// Group the current selection.
    pub fn group_selection(&mut self) -> Result<GroupId, SceneError> {
        let ids = self.select.selected.clone();
        let unique = ids
            .iter()
            .enumerate()
            .filter(|(i, id)| self.scene.contains(**id) && !ids[..*i].contains(id))
            .count();
        if unique < 2 {
            return Err(SceneError::GroupTooSmall(unique));
        }
        self.apply(SceneMutation::GroupNodes { ids, name: None }, "Group");
        self.scene
            .groups
            .last()
            .map(|g| g.id)
            .ok_or(SceneError::GroupTooSmall(unique))
    }

    pub fn undo(&mut self) -> Option<String> {
        if self.restoring {
            return None;
        }
        self.cancel_gesture();
        let culled = self.culled_state();
        let desc = self.history.undo(&mut self.scene)?;
        self.carry_culled_state(culled);
        self.select.prune(&self.scene);
        self.changed = true;
        Some(desc)
    }

    pub fn redo(&mut self) -> Option<String> {
        if self.restoring {
            return None;
        }
        self.cancel_gesture();
        let culled = self.culled_state();
        let desc = self.history.redo(&mut self.scene)?;
        self.carry_culled_state(culled);
        self.select.prune(&self.scene);
        self.changed = true;
        Some(desc)
    }

    /// Nodes and connections the host currently has hidden.
    fn culled_state(&self) -> (Vec<NodeId>, Vec<ConnectionKey>) {
        let nodes = self.scene.nodes().filter(|n| n.culled).map(|n| n.id).collect();
        let links = self
            .scene
            .connections()
            .filter(|(_, _, conn)| conn.culled)
            .map(|(_, key, _)| key)
            .collect();
        (nodes, links)
    }

    /// Re-apply hidden flags after a snapshot rebuilt the scene, so the next
    /// cull pass reports transitions against what the host actually shows.
    fn carry_culled_state(&mut self, (nodes, links): (Vec<NodeId>, Vec<ConnectionKey>)) {
        for id in nodes {
            if let Some(node) = self.scene.get_mut(id) {
                node.culled = true;
                for media in &mut node.media {
                    media.suspend();
                }
            }
        }
        for key in links {
            if let Some(edge) = self.scene.find_connection(&key) {
                self.scene.graph[edge].culled = true;
            }
        }
    }

    pub fn reset_view(&mut self, now: f64) {
        self.viewport.reset_view(true, now);
    }

    /// Carry out a confirmed palette command.
    pub fn execute_palette(&mut self, command: &PaletteCommand, now: f64) -> Option<NodeId> {
        match command {
            PaletteCommand::Create(kind) => {
                let node = MindNode::new(NodeId::fresh(), *kind, self.viewport.center_logical());
                let id = node.id;
                if !self.apply(SceneMutation::AddNode { node: Box::new(node) }, "Add node") {
                    return None;
                }
                self.select.select_only(id);
                self.focus_node(id, now);
                Some(id)
            }
            PaletteCommand::FocusNode { id, .. } => {
                if !self.scene.contains(*id) {
                    return None;
                }
                self.select.select_only(*id);
                self.focus_node(*id, now);
                Some(*id)
            }
            PaletteCommand::FocusGroup(id) => {
                if let Some(group) = self.scene.group(*id) {
                    let label = group.bounds.origin() + GROUP_LABEL_OFFSET;
                    let placement = Placement::TopLeft {
                        inset: self.config.group_focus_inset,
                    };
                    self.viewport.pan_to(label, placement, true, now);
                }
                None
            }
        }
    }

    /// Animate the view so a node's center is on the screen center.
    pub fn focus_node(&mut self, id: NodeId, now: f64) {
        if let Some(rect) = self.scene.node_rect(id) {
            self.viewport.pan_to(rect.center(), Placement::Center, true, now);
        }
    }

    // ── Input ──

    fn scene_hit(&self, logical: Point) -> Hit {
        Hit::at(&self.scene, logical, self.config.pin_radius)
    }

    fn pointer(&self, x: f64, y: f64, modifiers: Modifiers) -> Pointer {
        let screen = Point::new(x, y);
        Pointer {
            screen,
            logical: self.viewport.screen_to_logical(screen),
            modifiers,
        }
    }

    /// Feed one input event. Returns the shortcut actions the engine does not
    /// handle itself (palette, save, dismiss) for the caller to route.
    pub fn handle_event(&mut self, event: &InputEvent, now: f64) -> Option<ShortcutAction> {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => {
                self.pointer_down(self.pointer(*x, *y, *modifiers));
                None
            }
            InputEvent::PointerMove { x, y, modifiers } => {
                self.pointer_move(self.pointer(*x, *y, *modifiers));
                None
            }
            InputEvent::PointerUp { x, y, modifiers } => {
                self.pointer_up(self.pointer(*x, *y, *modifiers));
                None
            }
            InputEvent::DoubleClick { x, y } => {
                self.double_click(Point::new(*x, *y));
                None
            }
            InputEvent::Wheel { x, y, delta_y } => {
                self.viewport.wheel(Point::new(*x, *y), *delta_y);
                None
            }
            InputEvent::KeyDown { key, modifiers } => {
                let action = ShortcutMap::resolve(key, modifiers.ctrl, modifiers.shift, modifiers.alt, modifiers.meta)?;
                self.shortcut(action, now)
            }
            InputEvent::KeyUp { key, .. } => {
                if key == "Alt" {
                    self.cut.disarm();
                    if self.gesture == Gesture::Cut {
                        self.gesture = Gesture::None;
                    }
                }
                None
            }
        }
    }

    fn shortcut(&mut self, action: ShortcutAction, now: f64) -> Option<ShortcutAction> {
        match action {
            ShortcutAction::ArmCut => self.cut.arm(),
            ShortcutAction::Undo => {
                self.undo();
            }
            ShortcutAction::Redo => {
                self.redo();
            }
            ShortcutAction::Delete => {
                self.delete_selection();
            }
            ShortcutAction::GroupSelection => {
                if let Err(err) = self.group_selection() {
                    log::debug!("engine: group declined: {err}");
                }
            }
            ShortcutAction::ResetView => self.reset_view(now),
            ShortcutAction::Dismiss => {
                self.cancel_gesture();
                self.select.clear();
                return Some(action);
            }
            ShortcutAction::TogglePalette
            | ShortcutAction::MoveUp
            | ShortcutAction::MoveDown
            | ShortcutAction::Confirm
            | ShortcutAction::Save => return Some(action),
        }
        None
    }

    fn run_tool(&mut self, gesture: Gesture, event: ToolEvent) -> Vec<SceneMutation> {
        let hit = self.scene_hit(event.pointer().logical);
        let ctx = ToolContext {
            scene: &self.scene,
            routes: &self.routes,
        };
        let tool: &mut dyn Tool = match gesture {
            Gesture::Select => &mut self.select,
            Gesture::Connect => &mut self.connect,
            Gesture::Cut => &mut self.cut,
            Gesture::None | Gesture::Pan => return vec![],
        };
        tool.handle(&event, &hit, &ctx)
    }

    fn pointer_down(&mut self, p: Pointer) {
        self.cancel_gesture();
        if p.modifiers.alt {
            self.cut.arm();
        }
        let hit = self.scene_hit(p.logical);
        self.gesture = if self.cut.is_armed() {
            Gesture::Cut
        } else if hit.anchor.is_some() {
            Gesture::Connect
        } else if hit.node.is_some() || p.modifiers.shift {
            Gesture::Select
        } else {
            Gesture::Pan
        };
        log::trace!("engine: pointer down → {:?}", self.gesture);

        match self.gesture {
            Gesture::Pan => {
                self.select.clear();
                self.pan_last = p.screen;
            }
            gesture => {
                self.run_tool(gesture, ToolEvent::Down(p));
                if self.select.is_dragging() && !self.restoring {
                    self.history.begin_batch(&self.scene, "Move");
                }
            }
        }
    }

    fn pointer_move(&mut self, p: Pointer) {
        match self.gesture {
            Gesture::None => {}
            Gesture::Pan => {
                self.viewport.pan(p.screen - self.pan_last);
                self.pan_last = p.screen;
            }
            gesture => {
                let mutations = self.run_tool(gesture, ToolEvent::Move(p));
                self.apply_all(mutations, "Move");
            }
        }
    }

    fn pointer_up(&mut self, p: Pointer) {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::None);
        let mutations = self.run_tool(gesture, ToolEvent::Up(p));
        match gesture {
            Gesture::Connect => {
                self.apply_all(mutations, "Connect");
            }
            Gesture::Cut => {
                self.apply_all(mutations, "Cut connections");
            }
            Gesture::Select => {
                self.apply_all(mutations, "Move");
                if self.history.is_batching() {
                    self.history.end_batch(&self.scene);
                }
            }
            Gesture::Pan | Gesture::None => {}
        }
    }

    /// Abandon any gesture in progress. A drag keeps what it moved so far.
    pub fn cancel_gesture(&mut self) {
        self.select.cancel();
        self.connect.cancel();
        self.cut.cancel();
        if self.history.is_batching() {
            self.history.end_batch(&self.scene);
        }
        self.gesture = Gesture::None;
    }

    // ── Frame ──

    /// Advance animations and, if anything is dirty, update routes and run
    /// one cull pass. Returns `None` when nothing changed.
    pub fn frame(&mut self, now: f64) -> Option<FrameReport> {
        let animating = self.viewport.tick(now);
        let view_dirty = self.viewport.take_dirty();
        let scene_dirty = self.scene.take_dirty();
        if !view_dirty && !scene_dirty {
            return None;
        }

        if scene_dirty {
            let dragged = self.select.dragged();
            if dragged.is_empty() || self.routes.len() != self.scene.connection_count() {
                self.routes.rebuild(&self.scene);
            } else {
                for id in dragged {
                    self.routes.update_node(&self.scene, *id);
                }
            }
        }

        let cull = self
            .culler
            .cull(&mut self.scene, &self.viewport, self.select.dragged());
        // Culling flips transient flags only.
        self.scene.take_dirty();
        log::trace!(
            "engine: frame {}/{} nodes visible",
            cull.visible_nodes,
            cull.total_nodes
        );

        Some(FrameReport {
            view: self.viewport.transform(),
            cull,
            routes_changed: scene_dirty,
            animating,
        })
    }

    // ── Projects ──

    /// Enter restore mode until the guard drops.
    pub fn begin_restore(&mut self) -> RestoreGuard<'_> {
        self.restoring = true;
        log::debug!("engine: restoring");
        RestoreGuard { engine: self }
    }

    /// Replace the scene and view with a project record. History is cleared.
    pub fn load_project(&mut self, record: &Project) {
        self.cancel_gesture();
        self.cut.disarm();
        self.select.clear();
        self.scene = record.build_scene();
        self.scene.mark_dirty();
        self.viewport.set_transform(record.view);
        self.routes.rebuild(&self.scene);
        self.history.clear();
    }

    /// Write the live scene and view into a project record.
    pub fn capture_into(&self, record: &mut Project) {
        record.capture_from(&self.scene, self.viewport.transform());
    }
}

/// Keeps the engine in restore mode; leaving scope (even by panic or early
/// return) clears the flag.
pub struct RestoreGuard<'a> {
    engine: &'a mut CanvasEngine,
}

impl Deref for RestoreGuard<'_> {
    type Target = CanvasEngine;

    fn deref(&self) -> &CanvasEngine {
        self.engine
    }
}

impl DerefMut for RestoreGuard<'_> {
    fn deref_mut(&mut self) -> &mut CanvasEngine {
        self.engine
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        self.engine.restoring = false;
        log::debug!("engine: restore finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use pretty_assertions::assert_eq;

    fn engine() -> CanvasEngine {
        CanvasEngine::new(EditorConfig::default(), Size::new(1000.0, 800.0))
    }

    fn place(engine: &mut CanvasEngine, name: &str, x: f64, y: f64) -> NodeId {
        let id = NodeId::intern(name);
        let mut node = MindNode::new(id, NodeKind::Text, Point::new(x, y));
        node.size = Some(Size::new(100.0, 100.0));
        engine.scene.add_node(node).unwrap();
        id
    }

    #[test]
    fn mutation_apply_reports_changes() {
        let mut scene = SceneGraph::new();
        let a = scene.create_node(NodeKind::Text, Point::ZERO);
        assert!(
            SceneMutation::MoveNode {
                id: a,
                delta: Vec2::new(1.0, 0.0)
            }
            .apply(&mut scene)
        );
        assert!(!SceneMutation::RemoveNode { id: NodeId::intern("engine_nobody") }.apply(&mut scene));
        assert!(
            !SceneMutation::GroupNodes {
                ids: vec![a],
                name: None
            }
            .apply(&mut scene)
        );
    }

    #[test]
    fn drag_is_one_undo_step() {
        let mut engine = engine();
        let a = place(&mut engine, "engine_drag", 0.0, 0.0);

        engine.handle_event(&InputEvent::pointer_down(50.0, 50.0, Modifiers::NONE), 0.0);
        for step in 1..=4 {
            let x = 50.0 + step as f64 * 10.0;
            engine.handle_event(&InputEvent::pointer_move(x, 50.0, Modifiers::NONE), 0.0);
        }
        engine.handle_event(&InputEvent::pointer_up(90.0, 50.0, Modifiers::NONE), 0.0);

        assert_eq!(engine.scene.get(a).unwrap().position, Point::new(40.0, 0.0));
        assert!(engine.take_changed());
        assert_eq!(engine.undo(), Some("Move".to_string()));
        assert_eq!(engine.scene.get(a).unwrap().position, Point::ZERO);
        assert!(!engine.history.can_undo());
    }

    #[test]
    fn empty_canvas_drag_pans() {
        let mut engine = engine();
        engine.handle_event(&InputEvent::pointer_down(500.0, 500.0, Modifiers::NONE), 0.0);
        engine.handle_event(&InputEvent::pointer_move(530.0, 480.0, Modifiers::NONE), 0.0);
        engine.handle_event(&InputEvent::pointer_up(530.0, 480.0, Modifiers::NONE), 0.0);
        assert_eq!(engine.viewport.offset(), Point::new(30.0, -20.0));
        assert!(!engine.history.can_undo());
    }

    #[test]
    fn frame_coalesces_and_culls() {
        let mut engine = engine();
        let near = place(&mut engine, "engine_near", 0.0, 0.0);
        let far = place(&mut engine, "engine_far", 50_000.0, 0.0);

        let report = engine.frame(0.0).unwrap();
        assert_eq!(report.cull.hidden, vec![far]);
        assert_eq!(report.cull.visible_nodes, 1);
        assert!(!engine.scene.get(near).unwrap().culled);
        // Nothing dirty: no work.
        assert_eq!(engine.frame(16.0), None);

        engine.viewport.pan(Vec2::new(-50_000.0, 0.0));
        engine.viewport.pan(Vec2::new(10.0, 0.0));
        let report = engine.frame(32.0).unwrap();
        assert_eq!(report.cull.shown, vec![far]);
        assert_eq!(report.cull.hidden, vec![near]);
    }

    #[test]
    fn undo_keeps_culling_in_step_with_the_host() {
        let mut engine = engine();
        let a = place(&mut engine, "engine_cull_undo", 0.0, 0.0);
        assert!(engine.frame(0.0).unwrap().cull.hidden.is_empty());

        engine.apply(
            SceneMutation::MoveNode {
                id: a,
                delta: Vec2::new(50_000.0, 0.0),
            },
            "Move",
        );
        let report = engine.frame(16.0).unwrap();
        assert_eq!(report.cull.hidden, vec![a]);

        // Back on screen: the host must hear that it is shown again.
        engine.undo();
        let report = engine.frame(32.0).unwrap();
        assert_eq!(report.cull.shown, vec![a]);
        assert!(report.cull.hidden.is_empty());
        assert!(!engine.scene.get(a).unwrap().culled);

        engine.redo();
        let report = engine.frame(48.0).unwrap();
        assert_eq!(report.cull.hidden, vec![a]);
        assert!(report.cull.shown.is_empty());
        assert!(engine.scene.get(a).unwrap().culled);
    }

    #[test]
    fn escape_clears_the_selection() {
        let mut engine = engine();
        let a = place(&mut engine, "engine_escape", 0.0, 0.0);
        engine.select.selected = vec![a];
        assert_eq!(
            engine.handle_event(&InputEvent::key_down("Escape", Modifiers::NONE), 0.0),
            Some(ShortcutAction::Dismiss)
        );
        assert!(engine.selection().is_empty());
    }

    #[test]
    fn restore_suppresses_history_and_notifications() {
        let mut engine = engine();
        {
            let mut guard = engine.begin_restore();
            assert!(guard.is_restoring());
            guard.apply(
                SceneMutation::AddNode {
                    node: Box::new(MindNode::new(NodeId::fresh(), NodeKind::Text, Point::ZERO)),
                },
                "Add node",
            );
        }
        assert!(!engine.is_restoring());
        assert!(!engine.history.can_undo());
        assert!(!engine.take_changed());
        assert_eq!(engine.scene.node_count(), 1);
    }

    #[test]
    fn double_click_creates_selected_node() {
        let mut engine = engine();
        engine.viewport.set_transform(ViewTransform::new(Point::new(100.0, 100.0), 2.0));
        engine.handle_event(&InputEvent::DoubleClick { x: 300.0, y: 500.0 }, 0.0);
        let id = engine.selection()[0];
        assert_eq!(engine.scene.get(id).unwrap().position, Point::new(100.0, 200.0));
        // Double click on an existing node does nothing.
        assert_eq!(engine.double_click(Point::new(310.0, 510.0)), None);
        assert_eq!(engine.scene.node_count(), 1);
    }

    #[test]
    fn delete_and_group_selection() {
        let mut engine = engine();
        let a = place(&mut engine, "engine_sel_a", 0.0, 0.0);
        let b = place(&mut engine, "engine_sel_b", 200.0, 0.0);
        engine.select.selected = vec![a];
        assert_eq!(engine.group_selection(), Err(SceneError::GroupTooSmall(1)));

        engine.select.selected = vec![a, b];
        let gid = engine.group_selection().unwrap();
        assert_eq!(
            engine.scene.group(gid).unwrap().bounds,
            Rect::new(0.0, 0.0, 300.0, 100.0)
        );

        engine.handle_event(&InputEvent::key_down("Delete", Modifiers::NONE), 0.0);
        assert_eq!(engine.scene.node_count(), 0);
        assert!(engine.scene.groups.is_empty());
        engine.undo();
        assert_eq!(engine.scene.node_count(), 2);
    }

    #[test]
    fn unhandled_shortcuts_are_returned() {
        let mut engine = engine();
        let shift = Modifiers::SHIFT;
        assert_eq!(
            engine.handle_event(&InputEvent::key_down("A", shift), 0.0),
            Some(ShortcutAction::TogglePalette)
        );
        assert_eq!(
            engine.handle_event(&InputEvent::key_down("Alt", Modifiers::ALT), 0.0),
            None
        );
        assert!(engine.cut.is_armed());
        engine.handle_event(&InputEvent::key_up("Alt", Modifiers::NONE), 0.0);
        assert!(!engine.cut.is_armed());
    }
}
