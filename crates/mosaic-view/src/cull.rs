//! Visibility culling: hide what is far off-screen and release its media.
//!
//! Each pass compares every node's logical rect against the visible rect
//! grown by a screen-space buffer. Only transitions are applied, so a node
//! that stays visible (or hidden) is not touched twice.

use crate::viewport::ViewportModel;
use mosaic_core::geom::rect_overlaps;
use mosaic_core::{ConnectionKey, NodeId, SceneGraph};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CullConfig {
    /// Margin around the screen, in screen pixels.
    pub buffer: f64,
    /// When off, every node is kept visible.
    pub enabled: bool,
}

impl Default for CullConfig {
    fn default() -> Self {
        Self {
            buffer: 500.0,
            enabled: true,
        }
    }
}

/// Transitions applied by one pass, plus overall counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CullReport {
    pub shown: Vec<NodeId>,
    pub hidden: Vec<NodeId>,
    pub connections_shown: Vec<ConnectionKey>,
    pub connections_hidden: Vec<ConnectionKey>,
    pub visible_nodes: usize,
    pub total_nodes: usize,
    pub visible_connections: usize,
    pub total_connections: usize,
}

impl CullReport {
    pub fn has_changes(&self) -> bool {
        !(self.shown.is_empty()
            && self.hidden.is_empty()
            && self.connections_shown.is_empty()
            && self.connections_hidden.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct VisibilityCuller {
    pub config: CullConfig,
}

impl VisibilityCuller {
    pub fn new(config: CullConfig) -> Self {
        Self { config }
    }

    /// Run one pass. Nodes in `dragged` are always visible.
    pub fn cull(
        &self,
        scene: &mut SceneGraph,
        viewport: &ViewportModel,
        dragged: &[NodeId],
    ) -> CullReport {
        let area = viewport.visible_rect(self.config.buffer);
        let mut report = CullReport {
            total_nodes: scene.node_count(),
            total_connections: scene.connection_count(),
            ..CullReport::default()
        };

        for node in scene.nodes_mut() {
            let visible = !self.config.enabled
                || dragged.contains(&node.id)
                || rect_overlaps(node.rect(), area);
            if visible {
                report.visible_nodes += 1;
                if node.culled {
                    node.culled = false;
                    for media in &mut node.media {
                        media.resume();
                    }
                    report.shown.push(node.id);
                }
            } else if !node.culled {
                node.culled = true;
                for media in &mut node.media {
                    media.suspend();
                }
                report.hidden.push(node.id);
            }
        }

        let verdicts: Vec<_> = scene
            .graph
            .edge_indices()
            .filter_map(|e| {
                let (a, b) = scene.graph.edge_endpoints(e)?;
                Some((e, !scene.graph[a].culled || !scene.graph[b].culled))
            })
            .collect();
        for (edge, visible) in verdicts {
            let Some(key) = scene.connection_key(edge) else {
                continue;
            };
            let conn = &mut scene.graph[edge];
            if visible {
                report.visible_connections += 1;
                if conn.culled {
                    conn.culled = false;
                    report.connections_shown.push(key);
                }
            } else if !conn.culled {
                conn.culled = true;
                report.connections_hidden.push(key);
            }
        }

        if report.has_changes() {
            log::debug!(
                "cull: +{} -{} nodes, {}/{} visible",
                report.shown.len(),
                report.hidden.len(),
                report.visible_nodes,
                report.total_nodes
            );
        } else {
            log::trace!("cull: no transitions");
        }
        report
    }
}
