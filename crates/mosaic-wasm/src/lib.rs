//! WASM bridge for Mosaic: exposes the canvas engine to the DOM host.
//!
//! Compiled via `wasm-pack build --target web`. The host owns the DOM, the
//! network, and the clock; it forwards input and `requestAnimationFrame`
//! timestamps here and renders what comes back. Structured results are JSON
//! strings; failures use `{"ok":false,"error":"..."}`.

mod svg;

use kurbo::{Point, Rect, Size};
use mosaic_core::{GroupId, MindNode, NodeId, NodeKind, Project, ProjectId, VisibilityMode, from_json, to_json};
use mosaic_editor::{
    AuthState, AutoSave, CommandPalette, EditorConfig, InputEvent, Modifiers, PaletteCommand, ProjectSession,
    SceneMutation, ShortcutAction, ShortcutMap, StoreError, SyncStatus,
};
use mosaic_view::ExportSnapshot;
use mosaic_view::route::path_data;
use serde_json::{Value, json};
use std::fmt::Display;
use wasm_bindgen::prelude::*;

pub use svg::{SvgTheme, escape, render_svg};

fn ok(mut value: Value) -> String {
    if let Value::Object(map) = &mut value {
        map.insert("ok".into(), Value::Bool(true));
    }
    value.to_string()
}

fn fail(err: impl Display) -> String {
    json!({ "ok": false, "error": err.to_string() }).to_string()
}

fn rect_json(r: Rect) -> Value {
    json!({ "x": r.x0, "y": r.y0, "width": r.width(), "height": r.height() })
}

fn node_json(node: &MindNode) -> Value {
    json!({
        "id": node.id.as_str(),
        "kind": node.kind.tag(),
        "x": node.position.x,
        "y": node.position.y,
        "width": node.size.map(|s| s.width),
        "height": node.size.map(|s| s.height),
        "content": node.content,
        "stripColor": node.strip_color,
        "contentOnly": node.visibility == VisibilityMode::ContentOnly,
        "culled": node.culled,
        "media": node.media.iter().map(|m| m.bound()).collect::<Vec<_>>(),
    })
}

fn parse_kind(tag: &str) -> Option<NodeKind> {
    NodeKind::ALL
        .into_iter()
        .find(|k| k.tag() == tag || k.label().eq_ignore_ascii_case(tag))
}

/// The main WASM-facing canvas controller.
///
/// Holds the project session (and through it the engine), the command
/// palette, and the save state. All interaction from the host goes through
/// this struct.
#[wasm_bindgen]
pub struct MosaicCanvas {
    session: ProjectSession,
    palette: CommandPalette,
    autosave: AutoSave,
    auth: AuthState,
    /// Project whose payload was handed out by `save_payload`.
    saving: Option<ProjectId>,
    /// Last timestamp seen from the host.
    clock: f64,
    dark_mode: bool,
}

#[wasm_bindgen]
impl MosaicCanvas {
    /// Create a controller for a canvas of the given size. `config_json` may
    /// override any `EditorConfig` field; empty or invalid input falls back
    /// to the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64, config_json: &str) -> Self {
        console_error_panic_hook_setup();

        let config = if config_json.trim().is_empty() {
            EditorConfig::default()
        } else {
            serde_json::from_str(config_json).unwrap_or_else(|err| {
                log::warn!("bridge: ignoring invalid config: {err}");
                EditorConfig::default()
            })
        };

        Self {
            session: ProjectSession::new(config, Size::new(width, height)),
            palette: CommandPalette::new(),
            autosave: AutoSave::default(),
            auth: AuthState::default(),
            saving: None,
            clock: 0.0,
            dark_mode: false,
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.session.engine.viewport.resize(Size::new(width, height));
    }

    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    // ── Input ──

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool, now: f64) {
        let mods = Modifiers { shift, ctrl, alt, meta };
        self.palette.clear_navigator();
        self.dispatch(InputEvent::pointer_down(x, y, mods), now);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_move(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool, now: f64) {
        let mods = Modifiers { shift, ctrl, alt, meta };
        self.dispatch(InputEvent::pointer_move(x, y, mods), now);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_up(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool, now: f64) {
        let mods = Modifiers { shift, ctrl, alt, meta };
        self.dispatch(InputEvent::pointer_up(x, y, mods), now);
    }

    pub fn handle_wheel(&mut self, x: f64, y: f64, delta_y: f64, now: f64) {
        self.dispatch(InputEvent::Wheel { x, y, delta_y }, now);
    }

    /// Create a text node at a screen point. Returns its id, or `""` when
    /// the point is on an existing node.
    pub fn handle_double_click(&mut self, x: f64, y: f64, now: f64) -> String {
        self.clock = now;
        let created = self.session.engine.double_click(Point::new(x, y));
        self.settle();
        created.map(|id| id.as_str().to_string()).unwrap_or_default()
    }

    /// Handle a key press. Returns what the host must do next: `"save"`
    /// (call `save_payload`), `"dismiss"`, or `""`.
    ///
    /// While the palette is open only palette keys are consumed; everything
    /// else belongs to the palette's text field.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_key(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool, now: f64) -> String {
        self.clock = now;
        if self.palette.is_open() {
            let action = ShortcutMap::resolve(key, ctrl, shift, alt, meta);
            return match action {
                Some(ShortcutAction::TogglePalette | ShortcutAction::Dismiss) => {
                    self.palette.close();
                    String::new()
                }
                Some(ShortcutAction::MoveUp) => {
                    self.palette.move_selection(-1);
                    String::new()
                }
                Some(ShortcutAction::MoveDown) => {
                    self.palette.move_selection(1);
                    String::new()
                }
                Some(ShortcutAction::Confirm) => {
                    self.palette_confirm(now);
                    String::new()
                }
                _ => String::new(),
            };
        }

        let mods = Modifiers { shift, ctrl, alt, meta };
        match self.dispatch(InputEvent::key_down(key, mods), now) {
            Some(ShortcutAction::TogglePalette) => {
                self.palette.open(&self.session.engine.scene);
                String::new()
            }
            Some(ShortcutAction::Dismiss) => {
                self.palette.clear_navigator();
                "dismiss".to_string()
            }
            Some(ShortcutAction::Save) => {
                if self.request_save() {
                    "save".to_string()
                } else {
                    String::new()
                }
            }
            _ => String::new(),
        }
    }

    pub fn handle_key_up(&mut self, key: &str, now: f64) {
        let event = InputEvent::KeyUp {
            key: key.to_string(),
            modifiers: Modifiers::NONE,
        };
        self.dispatch(event, now);
    }

    // ── Frame ──

    /// Advance one animation frame. Returns `""` when nothing changed,
    /// otherwise the view transform, culling transitions, and whether the
    /// routes need redrawing.
    pub fn frame(&mut self, now: f64) -> String {
        self.clock = now;
        let Some(report) = self.session.engine.frame(now) else {
            return String::new();
        };
        let scene = &self.session.engine.scene;
        let media = |ids: &[NodeId]| -> Value {
            ids.iter()
                .filter_map(|id| scene.get(*id))
                .filter(|n| !n.media.is_empty())
                .map(|n| {
                    let bound: Vec<&str> = n.media.iter().map(|m| m.bound()).collect();
                    (n.id.as_str().to_string(), json!(bound))
                })
                .collect::<serde_json::Map<_, _>>()
                .into()
        };
        let cull = &report.cull;
        let ids = |ids: &[NodeId]| ids.iter().map(|id| id.as_str().to_string()).collect::<Vec<_>>();
        json!({
            "view": {
                "x": report.view.offset.x,
                "y": report.view.offset.y,
                "scale": report.view.scale,
            },
            "shown": ids(&cull.shown),
            "hidden": ids(&cull.hidden),
            "connectionsShown": cull.connections_shown.iter().map(|k| k.to_string()).collect::<Vec<_>>(),
            "connectionsHidden": cull.connections_hidden.iter().map(|k| k.to_string()).collect::<Vec<_>>(),
            "media": media(&[cull.shown.as_slice(), cull.hidden.as_slice()].concat()),
            "stats": {
                "visibleNodes": cull.visible_nodes,
                "totalNodes": cull.total_nodes,
                "visibleConnections": cull.visible_connections,
                "totalConnections": cull.total_connections,
            },
            "routesChanged": report.routes_changed,
            "animating": report.animating,
        })
        .to_string()
    }

    // ── Scene queries ──

    pub fn nodes_json(&self) -> String {
        let nodes: Vec<Value> = self.session.engine.scene.nodes().map(node_json).collect();
        Value::Array(nodes).to_string()
    }

    pub fn groups_json(&self) -> String {
        let groups: Vec<Value> = self
            .session
            .engine
            .scene
            .groups
            .iter()
            .map(|g| {
                json!({
                    "id": g.id.as_str(),
                    "name": g.name,
                    "color": g.color,
                    "bounds": rect_json(g.bounds),
                    "members": g.members.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
                })
            })
            .collect();
        Value::Array(groups).to_string()
    }

    /// Cached connection paths (logical coordinates).
    pub fn routes_json(&self) -> String {
        let engine = &self.session.engine;
        let routes: Vec<Value> = engine
            .routes
            .iter()
            .map(|(edge, route)| {
                let conn = engine.scene.graph.edge_weight(edge);
                json!({
                    "key": route.key.to_string(),
                    "path": route.path_data(),
                    "color": conn.and_then(|c| c.color.clone()),
                    "culled": conn.is_some_and(|c| c.culled),
                })
            })
            .collect();
        Value::Array(routes).to_string()
    }

    /// Transient interaction state: selection and marquee and connection
    /// preview in logical coordinates, the cut line in screen coordinates.
    pub fn overlay_json(&self) -> String {
        let engine = &self.session.engine;
        let removal = engine.removal_line().map(|l| {
            json!({ "x1": l.p0.x, "y1": l.p0.y, "x2": l.p1.x, "y2": l.p1.y })
        });
        json!({
            "selection": engine.selection().iter().map(|id| id.as_str()).collect::<Vec<_>>(),
            "marquee": engine.select.marquee_rect.map(rect_json),
            "preview": engine.connection_preview().map(|c| path_data(&c)),
            "removal": removal,
            "cutArmed": engine.cut.is_armed(),
        })
        .to_string()
    }

    // ── Scene edits ──

    /// Record the host-measured size of a node.
    pub fn set_node_size(&mut self, node_id: &str, width: f64, height: f64) -> bool {
        self.session
            .engine
            .set_node_size(NodeId::intern(node_id), Size::new(width, height))
            .is_ok()
    }

    pub fn set_content(&mut self, node_id: &str, content: &str, now: f64) -> bool {
        let mutation = SceneMutation::SetContent {
            id: NodeId::intern(node_id),
            content: content.to_string(),
        };
        self.edit(mutation, "Edit content", now)
    }

    pub fn set_strip_color(&mut self, node_id: &str, color: &str, now: f64) -> bool {
        let mutation = SceneMutation::SetStripColor {
            id: NodeId::intern(node_id),
            color: color.to_string(),
        };
        self.edit(mutation, "Change color", now)
    }

    pub fn toggle_visibility(&mut self, node_id: &str, now: f64) -> bool {
        let id = NodeId::intern(node_id);
        let Some(mode) = self.session.engine.scene.get(id).map(|n| n.visibility.toggled()) else {
            return false;
        };
        self.edit(SceneMutation::SetVisibility { id, mode }, "Toggle frame", now)
    }

    pub fn set_kind(&mut self, node_id: &str, kind: &str, now: f64) -> bool {
        let Some(kind) = parse_kind(kind) else {
            return false;
        };
        self.edit(SceneMutation::SetKind { id: NodeId::intern(node_id), kind }, "Change type", now)
    }

    pub fn delete_selection(&mut self, now: f64) -> bool {
        self.clock = now;
        let changed = self.session.engine.delete_selection();
        self.settle();
        changed
    }

    /// Group the selection. Returns `{"ok":true,"id":...}` or an error.
    pub fn group_selection(&mut self, now: f64) -> String {
        self.clock = now;
        let result = self.session.engine.group_selection();
        self.settle();
        match result {
            Ok(id) => ok(json!({ "id": id.as_str() })),
            Err(err) => fail(err),
        }
    }

    pub fn rename_group(&mut self, group_id: &str, name: &str, now: f64) -> bool {
        let mutation = SceneMutation::RenameGroup {
            id: GroupId::intern(group_id),
            name: name.to_string(),
        };
        self.edit(mutation, "Rename group", now)
    }

    pub fn set_group_color(&mut self, group_id: &str, color: &str, now: f64) -> bool {
        let mutation = SceneMutation::SetGroupColor {
            id: GroupId::intern(group_id),
            color: color.to_string(),
        };
        self.edit(mutation, "Recolor group", now)
    }

    pub fn ungroup(&mut self, group_id: &str, now: f64) -> bool {
        let mutation = SceneMutation::Ungroup {
            id: GroupId::intern(group_id),
        };
        self.edit(mutation, "Ungroup", now)
    }

    pub fn undo(&mut self, now: f64) -> bool {
        self.clock = now;
        let done = self.session.engine.undo().is_some();
        self.settle();
        done
    }

    pub fn redo(&mut self, now: f64) -> bool {
        self.clock = now;
        let done = self.session.engine.redo().is_some();
        self.settle();
        done
    }

    pub fn can_undo(&self) -> bool {
        self.session.engine.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.engine.history.can_redo()
    }

    pub fn reset_view(&mut self, now: f64) {
        self.clock = now;
        self.session.engine.reset_view(now);
    }

    // ── Palette ──

    pub fn palette_toggle(&mut self) {
        self.palette.toggle(&self.session.engine.scene);
    }

    pub fn palette_set_query(&mut self, query: &str) {
        self.palette.set_query(query, &self.session.engine.scene);
    }

    pub fn palette_move(&mut self, delta: i32) {
        self.palette.move_selection(delta as isize);
    }

    /// Commit the highlighted result. Returns the focused node and the match
    /// range in its plain text, if any.
    pub fn palette_confirm(&mut self, now: f64) -> String {
        self.clock = now;
        let Some(command) = self.palette.confirm(&self.session.engine.scene) else {
            return fail("nothing selected");
        };
        self.run_palette(command, now)
    }

    pub fn palette_json(&self) -> String {
        let items: Vec<Value> = self
            .palette
            .items()
            .iter()
            .map(|item| {
                json!({
                    "category": item.category.label(),
                    "label": item.label,
                    "detail": item.detail,
                })
            })
            .collect();
        let navigator = self.palette.navigator().map(|nav| {
            let (index, total) = nav.position();
            json!({ "index": index, "total": total })
        });
        json!({
            "open": self.palette.is_open(),
            "query": self.palette.query(),
            "selected": self.palette.selected(),
            "items": items,
            "navigator": navigator,
        })
        .to_string()
    }

    pub fn navigator_next(&mut self, now: f64) -> String {
        let scene = &self.session.engine.scene;
        let command = self.palette.navigator_mut().and_then(|nav| nav.next(scene));
        match command {
            Some(command) => self.run_palette(command, now),
            None => fail("no search results"),
        }
    }

    pub fn navigator_prev(&mut self, now: f64) -> String {
        let scene = &self.session.engine.scene;
        let command = self.palette.navigator_mut().and_then(|nav| nav.prev(scene));
        match command {
            Some(command) => self.run_palette(command, now),
            None => fail("no search results"),
        }
    }

    // ── Projects ──

    pub fn new_project(&mut self, name: &str) -> usize {
        self.palette.close();
        self.palette.clear_navigator();
        self.session.new_project(name)
    }

    /// Open a project file. `remote_id` is the store id it was read from, or
    /// `""` for a local import.
    pub fn open_project(&mut self, text: &str, remote_id: &str) -> String {
        match from_json(text) {
            Ok(mut record) => {
                if !remote_id.is_empty() {
                    record.remote_id = Some(remote_id.to_string());
                }
                self.palette.clear_navigator();
                let index = self.session.open_project(record);
                ok(json!({ "index": index }))
            }
            Err(err) => fail(err),
        }
    }

    pub fn switch_project(&mut self, index: usize) -> String {
        self.palette.clear_navigator();
        match self.session.switch_to(index) {
            Ok(()) => ok(json!({ "index": index })),
            Err(err) => fail(err),
        }
    }

    /// Close a project. Returns its final file contents so the host can
    /// flush it if needed.
    pub fn close_project(&mut self, index: usize) -> String {
        let closed = match self.session.close_project(index) {
            Ok(closed) => closed,
            Err(err) => return fail(err),
        };
        if self.saving == Some(closed.id) {
            self.saving = None;
        }
        match to_json(&closed) {
            Ok(content) => ok(json!({ "name": closed.file_name(), "content": content })),
            Err(err) => fail(err),
        }
    }

    pub fn rename_project(&mut self, index: usize, name: &str) -> bool {
        self.session.rename_project(index, name).is_ok()
    }

    pub fn projects_json(&self) -> String {
        let active = self.session.active_index();
        let projects: Vec<Value> = self
            .session
            .projects()
            .iter()
            .enumerate()
            .map(|(i, p)| {
                json!({
                    "id": p.id.as_str(),
                    "name": p.name,
                    "remoteId": p.remote_id,
                    "lastModified": p.last_modified,
                    "active": active == Some(i),
                })
            })
            .collect();
        Value::Array(projects).to_string()
    }

    // ── Saving ──

    pub fn sign_in(&mut self) {
        self.auth.sign_in();
    }

    pub fn is_signed_in(&self) -> bool {
        self.auth.signed_in
    }

    pub fn needs_reauth(&self) -> bool {
        self.auth.needs_reauth
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.autosave.set_offline(offline);
    }

    pub fn sync_status(&self) -> String {
        serde_json::to_value(self.autosave.status())
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// Whether an auto-save attempt should start now. On `true` the host
    /// calls `save_payload`, writes it, and reports via `save_complete`.
    pub fn autosave_poll(&mut self, now: f64) -> bool {
        self.clock = now;
        if !self.autosave.poll(now) {
            return false;
        }
        self.check_signed_in()
    }

    /// The next project to write, as a file, for the attempt in flight:
    /// the oldest unsaved one, or the active project.
    pub fn save_payload(&mut self) -> String {
        let record = match self.session.take_save_target() {
            Ok(record) => record,
            Err(err) => {
                let err = err.to_string();
                self.autosave.complete(Err(&StoreError::Unavailable(err.clone())), self.clock);
                return fail(err);
            }
        };
        let (id, name, remote_id) = (record.id, record.file_name(), record.remote_id.clone());
        match to_json(record) {
            Ok(content) => {
                self.saving = Some(id);
                ok(json!({
                    "projectId": id.as_str(),
                    "remoteId": remote_id,
                    "name": name,
                    "content": content,
                }))
            }
            Err(err) => {
                self.session.mark_unsaved(id);
                self.autosave.complete(Err(&StoreError::Unavailable(err.to_string())), self.clock);
                fail(err)
            }
        }
    }

    /// Report the outcome of a write. `status` is the HTTP status (0 when
    /// the request never left the browser); `remote_id` is the stored file's
    /// id on success.
    pub fn save_complete(&mut self, status: u16, message: &str, remote_id: &str, epoch_ms: f64, now: f64) {
        self.clock = now;
        let project = self.saving.take();
        if (200..300).contains(&status) {
            if let Some(project) = project {
                self.session.mark_saved(project, remote_id, epoch_ms.max(0.0) as u64);
            }
            self.autosave.complete(Ok(()), now);
            if self.session.has_unsaved() {
                self.autosave.resume(now);
            }
        } else {
            if let Some(project) = project {
                self.session.mark_unsaved(project);
            }
            self.report_store_error(status, message);
            let err = StoreError::from_status(status, message);
            self.autosave.complete(Err(&err), now);
        }
    }

    /// Fold a failed list/read request into the sign-in state.
    pub fn report_store_error(&mut self, status: u16, message: &str) {
        let err = StoreError::from_status(status, message);
        log::error!("bridge: store request failed: {err}");
        self.auth.observe(&err);
    }

    // ── Export ──

    /// Render the scene (or only what is on screen) to a standalone SVG.
    pub fn export_svg(&self, visible_only: bool) -> String {
        let engine = &self.session.engine;
        let snapshot = ExportSnapshot::capture(&engine.scene, &engine.routes, visible_only);
        let theme = if self.dark_mode { SvgTheme::dark() } else { SvgTheme::light() };
        render_svg(&snapshot, &theme)
    }
}

impl MosaicCanvas {
    fn dispatch(&mut self, event: InputEvent, now: f64) -> Option<ShortcutAction> {
        self.clock = now;
        let action = self.session.engine.handle_event(&event, now);
        self.settle();
        action
    }

    fn edit(&mut self, mutation: SceneMutation, description: &str, now: f64) -> bool {
        self.clock = now;
        let changed = self.session.engine.apply(mutation, description);
        self.settle();
        changed
    }

    /// Forward engine changes to auto-save.
    fn settle(&mut self) {
        if self.session.take_changed() {
            self.autosave.notify(self.clock);
        }
    }

    fn request_save(&mut self) -> bool {
        self.autosave.start_now() && self.check_signed_in()
    }

    /// Fail the just-started attempt when nobody is signed in.
    fn check_signed_in(&mut self) -> bool {
        if self.auth.signed_in {
            return true;
        }
        let err = StoreError::Unauthorized;
        self.auth.observe(&err);
        self.autosave.complete(Err(&err), self.clock);
        false
    }

    fn run_palette(&mut self, command: PaletteCommand, now: f64) -> String {
        self.clock = now;
        let highlight = match &command {
            PaletteCommand::FocusNode { highlight, .. } => highlight.clone(),
            _ => None,
        };
        let node = self.session.engine.execute_palette(&command, now);
        self.settle();
        ok(json!({
            "node": node.map(|id| id.as_str().to_string()),
            "highlight": highlight.map(|r| [r.start, r.end]),
        }))
    }

    /// The engine, for native callers and tests.
    pub fn session(&self) -> &ProjectSession {
        &self.session
    }

    pub fn status(&self) -> SyncStatus {
        self.autosave.status()
    }
}

/// Install a panic hook that forwards panics to the browser console.
fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Mosaic WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

/// Validate a project file. Returns JSON: `{"ok":true,...}` with entity
/// counts or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_project(source: &str) -> String {
    match from_json(source) {
        Ok(project) => ok(json!({
            "name": project.name,
            "nodes": project.nodes.len(),
            "connections": project.connections.len(),
            "groups": project.groups.len(),
        })),
        Err(err) => fail(err),
    }
}

/// Blank project file with the given name, for "new file" flows that write
/// before opening.
#[wasm_bindgen]
pub fn blank_project(name: &str) -> String {
    match to_json(&Project::new(name)) {
        Ok(content) => ok(json!({ "content": content })),
        Err(err) => fail(err),
    }
}
