//! Export snapshots: a self-contained, logical-space description of what is
//! on the canvas, for the host's image/PDF writers.

use crate::route::{RouteCache, path_data, route_for};
use kurbo::Rect;
use mosaic_core::{ConnectionKey, NodeId, NodeKind, SceneGraph, VisibilityMode};

/// Padding added around the exported content, in logical units.
pub const EXPORT_MARGIN: f64 = 40.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub rect: Rect,
    pub strip_color: String,
    pub content_only: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportConnection {
    pub key: ConnectionKey,
    pub path: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportGroup {
    pub name: String,
    pub color: String,
    pub bounds: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSnapshot {
    pub nodes: Vec<ExportNode>,
    pub connections: Vec<ExportConnection>,
    pub groups: Vec<ExportGroup>,
    /// Union of every exported rect, grown by [`EXPORT_MARGIN`].
    pub bounds: Rect,
}

impl ExportSnapshot {
    /// Capture the scene. With `visible_only`, culled nodes and connections
    /// are left out, and so are groups with no visible member.
    pub fn capture(scene: &SceneGraph, routes: &RouteCache, visible_only: bool) -> Self {
        let nodes: Vec<ExportNode> = scene
            .nodes()
            .filter(|n| !visible_only || !n.culled)
            .map(|n| ExportNode {
                id: n.id,
                kind: n.kind,
                rect: n.rect(),
                strip_color: n.strip_color.clone(),
                content_only: n.visibility == VisibilityMode::ContentOnly,
                text: n.plain_text(),
            })
            .collect();

        let connections = scene
            .connections()
            .filter(|(_, _, c)| !visible_only || !c.culled)
            .filter_map(|(edge, key, conn)| {
                let path = match routes.get(edge) {
                    Some(route) => route.path_data(),
                    None => path_data(&route_for(scene, edge)?.curve),
                };
                Some(ExportConnection {
                    key,
                    path,
                    color: conn.color.clone(),
                })
            })
            .collect();

        let groups: Vec<ExportGroup> = scene
            .groups
            .iter()
            .filter(|g| !visible_only || g.members.iter().any(|m| nodes.iter().any(|n| n.id == *m)))
            .map(|g| ExportGroup {
                name: g.name.clone(),
                color: g.color.clone(),
                bounds: g.bounds,
            })
            .collect();

        let bounds = nodes
            .iter()
            .map(|n| n.rect)
            .chain(groups.iter().map(|g| g.bounds))
            .reduce(|a, b| a.union(b))
            .map(|r| r.inflate(EXPORT_MARGIN, EXPORT_MARGIN))
            .unwrap_or(Rect::ZERO);

        Self {
            nodes,
            connections,
            groups,
            bounds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
