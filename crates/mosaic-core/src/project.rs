//! The serializable project record and its conversion to and from a live
//! [`SceneGraph`].
//!
//! A `Project` is what gets captured on save, switch, auto-save and history
//! snapshots. It owns plain data only; culling state and media suspension are
//! never part of it.

use crate::id::{GroupId, NodeId, ProjectId};
use crate::model::{
    Anchor, ConnectionKey, Group, MindNode, NodeKind, SceneGraph, VisibilityMode,
};
use kurbo::{Point, Rect, Size};
use regex::Regex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::LazyLock;

/// Extension of local project files.
pub const FILE_EXTENSION: &str = "mosaic";

/// Name given to projects created without one.
pub const UNTITLED: &str = "Untitled";

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 4.0;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("static regex"));
static DASH_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("static regex"));

// ─── View Transform ──────────────────────────────────────────────────────

/// Pan offset and zoom scale: `screen = logical * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub offset: Point,
    pub scale: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            offset: Point::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn new(offset: Point, scale: f64) -> Self {
        Self {
            offset,
            scale: clamp_scale(scale),
        }
    }

    pub fn to_screen(&self, logical: Point) -> Point {
        Point::new(
            logical.x * self.scale + self.offset.x,
            logical.y * self.scale + self.offset.y,
        )
    }

    pub fn to_logical(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset.x) / self.scale,
            (screen.y - self.offset.y) / self.scale,
        )
    }
}

/// Clamp a zoom scale to the supported range. Non-finite input maps to 1.
pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_finite() {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        1.0
    }
}

// ─── Records ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Point,
    pub content: String,
    pub strip_color: String,
    pub content_only: bool,
    pub size: Option<Size>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub start: NodeId,
    pub start_anchor: Anchor,
    pub end: NodeId,
    pub end_anchor: Anchor,
    pub color: Option<String>,
}

impl ConnectionRecord {
    pub fn key(&self) -> ConnectionKey {
        ConnectionKey::new(self.start, self.start_anchor, self.end, self.end_anchor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: GroupId,
    pub name: String,
    pub color: String,
    pub members: Vec<NodeId>,
    pub bounds: Rect,
}

/// A whole canvas: entities plus view state and sync metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub nodes: Vec<NodeRecord>,
    pub connections: Vec<ConnectionRecord>,
    pub groups: Vec<GroupRecord>,
    pub view: ViewTransform,
    /// Id of the backing file in the remote store, once saved there.
    pub remote_id: Option<String>,
    /// Milliseconds since the epoch of the last successful save.
    pub last_modified: Option<u64>,
}

impl Project {
    /// An empty project with a fresh id.
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        Self {
            id: ProjectId::fresh(),
            name: if name.is_empty() { UNTITLED } else { name }.to_string(),
            nodes: Vec::new(),
            connections: Vec::new(),
            groups: Vec::new(),
            view: ViewTransform::default(),
            remote_id: None,
            last_modified: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `{safe name}.mosaic`
    pub fn file_name(&self) -> String {
        format!("{}.{FILE_EXTENSION}", safe_filename(&self.name))
    }

    /// Replace entity and view data with the live state, keeping identity
    /// and sync metadata.
    pub fn capture_from(&mut self, scene: &SceneGraph, view: ViewTransform) {
        self.nodes = scene
            .nodes()
            .map(|n| NodeRecord {
                id: n.id,
                kind: n.kind,
                position: n.position,
                content: n.content.clone(),
                strip_color: n.strip_color.clone(),
                content_only: n.visibility == VisibilityMode::ContentOnly,
                size: n.size,
            })
            .collect();
        self.connections = scene
            .connections()
            .map(|(_, key, conn)| ConnectionRecord {
                start: key.start,
                start_anchor: key.start_anchor,
                end: key.end,
                end_anchor: key.end_anchor,
                color: conn.color.clone(),
            })
            .collect();
        self.groups = scene
            .groups
            .iter()
            .map(|g| GroupRecord {
                id: g.id,
                name: g.name.clone(),
                color: g.color.clone(),
                members: g.members.to_vec(),
                bounds: g.bounds,
            })
            .collect();
        self.view = view;
    }

    /// Build a live scene from the record.
    ///
    /// Duplicate nodes, connections with a missing endpoint, duplicate or
    /// self connections, and dangling group members are dropped with a
    /// warning. Nothing here fails.
    pub fn build_scene(&self) -> SceneGraph {
        let mut scene = SceneGraph::new();
        for rec in &self.nodes {
            let mut node = MindNode::new(rec.id, rec.kind, rec.position);
            node.set_content(rec.content.clone());
            node.strip_color = rec.strip_color.clone();
            node.visibility = if rec.content_only {
                VisibilityMode::ContentOnly
            } else {
                VisibilityMode::Full
            };
            node.size = rec.size;
            if let Err(err) = scene.add_node(node) {
                log::warn!("project {}: {err}, skipped", self.id);
            }
        }
        for rec in &self.connections {
            let key = rec.key();
            if !scene.contains(key.start) || !scene.contains(key.end) {
                log::warn!("project {}: connection {key} has a missing endpoint, dropped", self.id);
                continue;
            }
            if scene.connect(key, rec.color.clone()).is_none() {
                log::warn!("project {}: connection {key} is a duplicate or self link, dropped", self.id);
            }
        }
        for rec in &self.groups {
            scene.insert_group(Group {
                id: rec.id,
                name: rec.name.clone(),
                color: rec.color.clone(),
                members: rec.members.iter().copied().collect::<SmallVec<_>>(),
                bounds: rec.bounds,
            });
        }
        scene
    }
}

/// File-system-safe form of a project name.
///
/// Every run of characters outside `[A-Za-z0-9_-]` becomes one dash, dash
/// runs collapse, and leading/trailing dashes are trimmed. Empty results fall
/// back to `untitled`.
pub fn safe_filename(name: &str) -> String {
    let replaced = UNSAFE_CHARS.replace_all(name, "-");
    let collapsed = DASH_RUNS.replace_all(&replaced, "-");
    let trimmed = collapsed.trim_matches('-');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn safe_filenames() {
        assert_eq!(safe_filename("My Project: v2!"), "My-Project-v2");
        assert_eq!(safe_filename("--a---b--"), "a-b");
        assert_eq!(safe_filename("***"), "untitled");
        assert_eq!(safe_filename(""), "untitled");
        assert_eq!(Project::new("Road map").file_name(), "Road-map.mosaic");
    }

    #[test]
    fn blank_name_becomes_untitled() {
        assert_eq!(Project::new("  ").name, UNTITLED);
    }

    #[test]
    fn view_transform_inverts() {
        let view = ViewTransform::new(Point::new(40.0, -10.0), 2.0);
        let p = Point::new(13.0, 7.5);
        assert_eq!(view.to_logical(view.to_screen(p)), p);
        assert_eq!(ViewTransform::new(Point::ZERO, 9.0).scale, MAX_SCALE);
        assert_eq!(clamp_scale(f64::NAN), 1.0);
    }

    #[test]
    fn capture_then_build_preserves_topology() {
        let mut scene = SceneGraph::new();
        let a = scene.create_node(NodeKind::Text, Point::new(0.0, 0.0));
        let b = scene.create_node(NodeKind::Timer, Point::new(400.0, 0.0));
        scene.connect(ConnectionKey::new(a, Anchor::Right, b, Anchor::Left), None);
        scene.create_group(&[a, b], Some("pair".into()), None).unwrap();

        let mut project = Project::new("p");
        let view = ViewTransform::new(Point::new(5.0, 6.0), 1.5);
        project.capture_from(&scene, view);

        let rebuilt = project.build_scene();
        assert_eq!(rebuilt.node_ids(), vec![a, b]);
        assert_eq!(rebuilt.connection_count(), 1);
        assert_eq!(rebuilt.groups.len(), 1);
        assert_eq!(project.view, view);
    }

    #[test]
    fn dangling_references_are_dropped() {
        let a = NodeId::intern("project_dangling_a");
        let ghost = NodeId::intern("project_dangling_ghost");
        let mut project = Project::new("p");
        project.nodes.push(NodeRecord {
            id: a,
            kind: NodeKind::Text,
            position: Point::ZERO,
            content: "hi".into(),
            strip_color: "#fff".into(),
            content_only: false,
            size: None,
        });
        project.connections.push(ConnectionRecord {
            start: a,
            start_anchor: Anchor::Right,
            end: ghost,
            end_anchor: Anchor::Left,
            color: None,
        });
        project.groups.push(GroupRecord {
            id: GroupId::intern("project_dangling_group"),
            name: "g".into(),
            color: "#000".into(),
            members: vec![a, ghost],
            bounds: Rect::ZERO,
        });

        let scene = project.build_scene();
        assert_eq!(scene.connection_count(), 0);
        assert_eq!(scene.groups[0].members.as_slice(), &[a]);
    }
}
