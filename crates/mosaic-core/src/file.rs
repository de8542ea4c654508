//! `.mosaic` project files: pretty-printed camelCase JSON.
//!
//! Reading accepts the older layouts still found in the wild: node `x`/`y`
//! at the top level instead of `position`, `type` instead of `nodeType`,
//! and `source`/`target` instead of `startNode`/`endNode`.

use crate::id::{GroupId, NodeId, ProjectId};
use crate::model::{Anchor, DEFAULT_GROUP_COLOR, DEFAULT_STRIP_COLOR, NodeKind};
use crate::project::{
    ConnectionRecord, GroupRecord, NodeRecord, Project, UNTITLED, ViewTransform,
};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("malformed project file: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("node {0:?} has no position")]
    MissingPosition(String),
    #[error("node {id:?} has unsupported type {kind:?}")]
    UnsupportedKind { id: String, kind: String },
    #[error("connection {start:?} -> {end:?} has unsupported pin {pin:?}")]
    UnsupportedPin {
        start: String,
        end: String,
        pin: String,
    },
}

// ─── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct FilePoint {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct FileBounds {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileNode {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<FilePoint>,
    #[serde(default, skip_serializing)]
    x: Option<f64>,
    #[serde(default, skip_serializing)]
    y: Option<f64>,
    #[serde(default)]
    content: String,
    #[serde(default, alias = "type")]
    node_type: Option<String>,
    #[serde(default)]
    strip_color: Option<String>,
    #[serde(default)]
    content_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<Size>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConnection {
    #[serde(alias = "source")]
    start_node: String,
    #[serde(alias = "target")]
    end_node: String,
    #[serde(default)]
    start_pin: Option<String>,
    #[serde(default)]
    end_pin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileGroup {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    node_ids: Vec<String>,
    #[serde(default)]
    bounds: Option<FileBounds>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileProject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    nodes: Vec<FileNode>,
    #[serde(default)]
    connections: Vec<FileConnection>,
    #[serde(default)]
    groups: Vec<FileGroup>,
    #[serde(default)]
    canvas_offset: Option<FilePoint>,
    #[serde(default)]
    canvas_scale: Option<f64>,
    #[serde(default, alias = "driveFileId", skip_serializing_if = "Option::is_none")]
    remote_id: Option<String>,
    #[serde(default)]
    last_modified: Option<u64>,
}

fn kind_from_tag(id: &str, tag: Option<&str>) -> Result<NodeKind, LoadError> {
    match tag.unwrap_or("default") {
        "default" | "text" | "" => Ok(NodeKind::Text),
        "checklist" => Ok(NodeKind::Checklist),
        "timer" => Ok(NodeKind::Timer),
        other => Err(LoadError::UnsupportedKind {
            id: id.to_string(),
            kind: other.to_string(),
        }),
    }
}

fn anchor_from_pin(conn: &FileConnection, pin: Option<&str>, default: Anchor) -> Result<Anchor, LoadError> {
    match pin {
        None => Ok(default),
        Some("left") => Ok(Anchor::Left),
        Some("right") => Ok(Anchor::Right),
        Some(other) => Err(LoadError::UnsupportedPin {
            start: conn.start_node.clone(),
            end: conn.end_node.clone(),
            pin: other.to_string(),
        }),
    }
}

// ─── Read ────────────────────────────────────────────────────────────────

/// Parse a project file. On error nothing is produced; references between
/// entities are validated later when the scene is built.
pub fn from_json(text: &str) -> Result<Project, LoadError> {
    let file: FileProject = serde_json::from_str(text)?;

    let mut nodes = Vec::with_capacity(file.nodes.len());
    for n in &file.nodes {
        let position = match (n.position, n.x, n.y) {
            (Some(p), _, _) => Point::new(p.x, p.y),
            (None, Some(x), Some(y)) => Point::new(x, y),
            _ => return Err(LoadError::MissingPosition(n.id.clone())),
        };
        nodes.push(NodeRecord {
            id: NodeId::intern(&n.id),
            kind: kind_from_tag(&n.id, n.node_type.as_deref())?,
            position,
            content: n.content.clone(),
            strip_color: n
                .strip_color
                .clone()
                .unwrap_or_else(|| DEFAULT_STRIP_COLOR.to_string()),
            content_only: n.content_only,
            size: n.size,
        });
    }

    let mut connections = Vec::with_capacity(file.connections.len());
    for c in &file.connections {
        connections.push(ConnectionRecord {
            start: NodeId::intern(&c.start_node),
            start_anchor: anchor_from_pin(c, c.start_pin.as_deref(), Anchor::Right)?,
            end: NodeId::intern(&c.end_node),
            end_anchor: anchor_from_pin(c, c.end_pin.as_deref(), Anchor::Left)?,
            color: c.color.clone(),
        });
    }

    let groups = file
        .groups
        .iter()
        .map(|g| GroupRecord {
            id: GroupId::intern(&g.id),
            name: g.name.clone(),
            color: g
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_GROUP_COLOR.to_string()),
            members: g.node_ids.iter().map(|id| NodeId::intern(id)).collect(),
            bounds: g
                .bounds
                .map(|b| Rect::new(b.x, b.y, b.x + b.width, b.y + b.height))
                .unwrap_or(Rect::ZERO),
        })
        .collect();

    let offset = file
        .canvas_offset
        .map(|p| Point::new(p.x, p.y))
        .unwrap_or(Point::ZERO);
    let name = file
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(UNTITLED)
        .to_string();

    log::debug!(
        "file: read {name:?} ({} nodes, {} connections, {} groups)",
        nodes.len(),
        connections.len(),
        file.groups.len()
    );

    Ok(Project {
        id: file
            .id
            .as_deref()
            .map(ProjectId::intern)
            .unwrap_or_else(ProjectId::fresh),
        name,
        nodes,
        connections,
        groups,
        view: ViewTransform::new(offset, file.canvas_scale.unwrap_or(1.0)),
        remote_id: file.remote_id,
        last_modified: file.last_modified,
    })
}

// ─── Write ───────────────────────────────────────────────────────────────

/// Serialize a project in the current file layout.
pub fn to_json(project: &Project) -> Result<String, serde_json::Error> {
    let file = FileProject {
        id: Some(project.id.to_string()),
        name: Some(project.name.clone()),
        nodes: project
            .nodes
            .iter()
            .map(|n| FileNode {
                id: n.id.to_string(),
                position: Some(FilePoint {
                    x: n.position.x,
                    y: n.position.y,
                }),
                x: None,
                y: None,
                content: n.content.clone(),
                node_type: Some(n.kind.tag().to_string()),
                strip_color: Some(n.strip_color.clone()),
                content_only: n.content_only,
                size: n.size,
            })
            .collect(),
        connections: project
            .connections
            .iter()
            .map(|c| FileConnection {
                start_node: c.start.to_string(),
                end_node: c.end.to_string(),
                start_pin: Some(c.start_anchor.as_str().to_string()),
                end_pin: Some(c.end_anchor.as_str().to_string()),
                color: c.color.clone(),
            })
            .collect(),
        groups: project
            .groups
            .iter()
            .map(|g| FileGroup {
                id: g.id.to_string(),
                name: g.name.clone(),
                color: Some(g.color.clone()),
                node_ids: g.members.iter().map(ToString::to_string).collect(),
                bounds: Some(FileBounds {
                    x: g.bounds.x0,
                    y: g.bounds.y0,
                    width: g.bounds.width(),
                    height: g.bounds.height(),
                }),
            })
            .collect(),
        canvas_offset: Some(FilePoint {
            x: project.view.offset.x,
            y: project.view.offset.y,
        }),
        canvas_scale: Some(project.view.scale),
        remote_id: project.remote_id.clone(),
        last_modified: project.last_modified,
    };
    serde_json::to_string_pretty(&file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn legacy_layout_is_accepted() {
        let text = r#"{
            "name": "old",
            "nodes": [
                {"id": "file_legacy_a", "x": 10, "y": 20, "content": "a", "type": "checklist"},
                {"id": "file_legacy_b", "x": 300, "y": 20, "content": "b"}
            ],
            "connections": [{"source": "file_legacy_a", "target": "file_legacy_b"}],
            "driveFileId": "remote-1"
        }"#;
        let project = from_json(text).unwrap();
        assert_eq!(project.nodes[0].position, Point::new(10.0, 20.0));
        assert_eq!(project.nodes[0].kind, NodeKind::Checklist);
        assert_eq!(project.nodes[1].kind, NodeKind::Text);
        assert_eq!(project.connections[0].start_anchor, Anchor::Right);
        assert_eq!(project.connections[0].end_anchor, Anchor::Left);
        assert_eq!(project.remote_id.as_deref(), Some("remote-1"));
        assert_eq!(project.view, ViewTransform::default());
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(from_json("{nodes: ["), Err(LoadError::Malformed(_))));
    }

    #[test]
    fn unsupported_kind_is_rejected() {
        let text = r#"{"nodes":[{"id":"file_kind_a","position":{"x":0,"y":0},"nodeType":"video"}]}"#;
        assert!(matches!(
            from_json(text),
            Err(LoadError::UnsupportedKind { kind, .. }) if kind == "video"
        ));
    }

    #[test]
    fn missing_position_is_rejected() {
        let text = r#"{"nodes":[{"id":"file_nopos"}]}"#;
        assert!(matches!(from_json(text), Err(LoadError::MissingPosition(id)) if id == "file_nopos"));
    }

    #[test]
    fn written_file_uses_current_keys() {
        let mut project = Project::new("keys");
        project.nodes.push(NodeRecord {
            id: NodeId::intern("file_keys_a"),
            kind: NodeKind::Timer,
            position: Point::new(1.0, 2.0),
            content: "2026-01-01T09:00".into(),
            strip_color: "#abc".into(),
            content_only: true,
            size: None,
        });
        let json = to_json(&project).unwrap();
        assert!(json.contains("\"nodeType\": \"timer\""));
        assert!(json.contains("\"contentOnly\": true"));
        assert!(json.contains("\"canvasScale\": 1.0"));
        assert!(!json.contains("\"x\": null"));
        assert!(!json.contains("remoteId"));
    }
}
