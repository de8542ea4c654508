//! Connection routing: anchor points, cubic curves, and the per-edge cache.
//!
//! A connection leaves each anchor horizontally, outward from its node, with
//! control points pulled out by half the horizontal distance between the
//! endpoints.

use kurbo::{CubicBez, ParamCurve, Point, Rect};
use mosaic_core::{Anchor, ConnectionKey, EdgeIndex, MindNode, NodeId, SceneGraph};
use std::collections::HashMap;
use std::fmt::Write;

/// Number of parameter steps used when sampling a curve for the cut test.
pub const CUT_SAMPLES: usize = 20;

/// Where a connection attaches to a node rect.
pub fn anchor_point(rect: Rect, anchor: Anchor) -> Point {
    let x = match anchor {
        Anchor::Left => rect.x0,
        Anchor::Right => rect.x1,
    };
    Point::new(x, rect.y0 + rect.height() / 2.0)
}

pub fn node_anchor(node: &MindNode, anchor: Anchor) -> Point {
    anchor_point(node.rect(), anchor)
}

/// The curve between two anchored endpoints.
pub fn connection_curve(start: Point, start_anchor: Anchor, end: Point, end_anchor: Anchor) -> CubicBez {
    let dx = (end.x - start.x).abs() / 2.0;
    CubicBez::new(
        start,
        Point::new(start.x + start_anchor.outward() * dx, start.y),
        Point::new(end.x + end_anchor.outward() * dx, end.y),
        end,
    )
}

/// The rubber-band curve drawn while a connection is being dragged. The
/// pointer end behaves like the anchor opposite the start.
pub fn preview_curve(start: Point, start_anchor: Anchor, pointer: Point) -> CubicBez {
    connection_curve(start, start_anchor, pointer, start_anchor.opposite())
}

/// SVG path data: `M x,y C x,y x,y x,y`.
pub fn path_data(curve: &CubicBez) -> String {
    let mut out = String::with_capacity(64);
    let _ = write!(
        out,
        "M {},{} C {},{} {},{} {},{}",
        curve.p0.x, curve.p0.y, curve.p1.x, curve.p1.y, curve.p2.x, curve.p2.y, curve.p3.x, curve.p3.y
    );
    out
}

/// `samples + 1` evenly spaced points from `t = 0` to `t = 1`.
pub fn sample_curve(curve: &CubicBez, samples: usize) -> Vec<Point> {
    let samples = samples.max(1);
    (0..=samples)
        .map(|i| curve.eval(i as f64 / samples as f64))
        .collect()
}

/// A routed connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub key: ConnectionKey,
    pub curve: CubicBez,
}

impl Route {
    pub fn path_data(&self) -> String {
        path_data(&self.curve)
    }

    pub fn samples(&self) -> Vec<Point> {
        sample_curve(&self.curve, CUT_SAMPLES)
    }
}

/// Route one connection from the current node rects.
pub fn route_for(scene: &SceneGraph, edge: EdgeIndex) -> Option<Route> {
    let key = scene.connection_key(edge)?;
    let start = scene.get(key.start)?;
    let end = scene.get(key.end)?;
    Some(Route {
        key,
        curve: connection_curve(
            node_anchor(start, key.start_anchor),
            key.start_anchor,
            node_anchor(end, key.end_anchor),
            key.end_anchor,
        ),
    })
}

/// Cached routes keyed by edge.
#[derive(Debug, Clone, Default)]
pub struct RouteCache {
    routes: HashMap<EdgeIndex, Route>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute every route. Routes of removed connections are dropped.
    pub fn rebuild(&mut self, scene: &SceneGraph) {
        self.routes.clear();
        for edge in scene.connection_indices() {
            if let Some(route) = route_for(scene, edge) {
                self.routes.insert(edge, route);
            }
        }
        log::trace!("route: rebuilt {} routes", self.routes.len());
    }

    /// Recompute only the connections touching `node` (live drag).
    pub fn update_node(&mut self, scene: &SceneGraph, node: NodeId) -> Vec<EdgeIndex> {
        let edges = scene.connections_of(node);
        for &edge in &edges {
            match route_for(scene, edge) {
                Some(route) => {
                    self.routes.insert(edge, route);
                }
                None => {
                    self.routes.remove(&edge);
                }
            }
        }
        edges
    }

    pub fn get(&self, edge: EdgeIndex) -> Option<&Route> {
        self.routes.get(&edge)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EdgeIndex, &Route)> + '_ {
        self.routes.iter().map(|(e, r)| (*e, r))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
