//! Hit testing in logical space: point → node, point → anchor, rect → nodes,
//! segment → connections.
//!
//! Walks nodes front-to-back (last painted = topmost).

use crate::route::{RouteCache, node_anchor, route_for};
use kurbo::{Line, Point, Rect};
use mosaic_core::geom::{polylines_intersect, rect_contains, rect_overlaps};
use mosaic_core::{Anchor, EdgeIndex, NodeId, SceneGraph};

/// Grab radius around an anchor, in logical units.
pub const PIN_RADIUS: f64 = 12.0;

/// Find the topmost node at `p`.
/// Returns `None` if no node is hit (background).
pub fn node_at(scene: &SceneGraph, p: Point) -> Option<NodeId> {
    scene
        .nodes()
        .rev()
        .find(|n| rect_contains(n.rect(), p))
        .map(|n| n.id)
}

/// Find the topmost anchor within `radius` of `p`.
pub fn anchor_at(scene: &SceneGraph, p: Point, radius: f64) -> Option<(NodeId, Anchor)> {
    for node in scene.nodes().rev() {
        for anchor in [Anchor::Left, Anchor::Right] {
            if node_anchor(node, anchor).distance(p) <= radius {
                return Some((node.id, anchor));
            }
        }
    }
    None
}

/// All nodes whose rect touches `rect`, bottom first. Used for marquee
/// selection.
pub fn nodes_in_rect(scene: &SceneGraph, rect: Rect) -> Vec<NodeId> {
    scene
        .nodes()
        .filter(|n| rect_overlaps(n.rect(), rect))
        .map(|n| n.id)
        .collect()
}

/// Connections whose sampled curve crosses `line`. Cached routes are used
/// when present.
pub fn connections_crossing(scene: &SceneGraph, routes: &RouteCache, line: Line) -> Vec<EdgeIndex> {
    let cut = [line.p0, line.p1];
    scene
        .connection_indices()
        .into_iter()
        .filter(|&edge| {
            let samples = match routes.get(edge) {
                Some(route) => route.samples(),
                None => match route_for(scene, edge) {
                    Some(route) => route.samples(),
                    None => return false,
                },
            };
            polylines_intersect(&samples, &cut)
        })
        .collect()
}
