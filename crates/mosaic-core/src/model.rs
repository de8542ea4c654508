//! Core scene-graph data model for Mosaic canvases.
//!
//! Nodes are cards placed at logical canvas positions. Connections are
//! `petgraph` edges between two nodes, each end pinned to the node's left or
//! right anchor. Groups aggregate nodes by id and cache the union of their
//! member rects. Removing a node removes every edge touching it, so a
//! connection can never outlive either endpoint.

use crate::content;
use crate::id::{GroupId, NodeId};
use kurbo::{Point, Rect, Size, Vec2};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Size assumed for a node the host has not measured yet.
pub const DEFAULT_NODE_SIZE: Size = Size::new(300.0, 200.0);

/// Strip color of a node created without one.
pub const DEFAULT_STRIP_COLOR: &str = "#c2f8cb";

/// Color given to new groups.
pub const DEFAULT_GROUP_COLOR: &str = "#6c5ce7";

/// 1×1 transparent GIF bound in place of suspended media.
pub const MEDIA_PLACEHOLDER: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

// ─── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("unknown group {0}")]
    UnknownGroup(GroupId),
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("a group needs at least 2 nodes, got {0}")]
    GroupTooSmall(usize),
}

// ─── Anchors & kinds ─────────────────────────────────────────────────────

/// Side of a node a connection attaches to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Left,
    #[default]
    Right,
}

impl Anchor {
    pub fn opposite(self) -> Self {
        match self {
            Anchor::Left => Anchor::Right,
            Anchor::Right => Anchor::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Anchor::Left => "left",
            Anchor::Right => "right",
        }
    }

    /// Horizontal direction a curve leaves this anchor in.
    pub fn outward(self) -> f64 {
        match self {
            Anchor::Left => -1.0,
            Anchor::Right => 1.0,
        }
    }
}

/// The card type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeKind {
    #[default]
    #[serde(rename = "default", alias = "text")]
    Text,
    #[serde(rename = "checklist")]
    Checklist,
    #[serde(rename = "timer")]
    Timer,
}

impl NodeKind {
    /// Every creatable kind, in palette order.
    pub const ALL: [NodeKind; 3] = [NodeKind::Text, NodeKind::Checklist, NodeKind::Timer];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Text => "Text",
            NodeKind::Checklist => "Checklist",
            NodeKind::Timer => "Timer",
        }
    }

    /// Tag used in project files.
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Text => "default",
            NodeKind::Checklist => "checklist",
            NodeKind::Timer => "timer",
        }
    }
}

/// Whether the node frame is drawn or only its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VisibilityMode {
    #[default]
    Full,
    ContentOnly,
}

impl VisibilityMode {
    pub fn toggled(self) -> Self {
        match self {
            VisibilityMode::Full => VisibilityMode::ContentOnly,
            VisibilityMode::ContentOnly => VisibilityMode::Full,
        }
    }
}

// ─── Media ───────────────────────────────────────────────────────────────

/// A heavy resource (embedded image) owned by a node.
///
/// The original reference is always retained. While suspended the renderer
/// is bound to [`MEDIA_PLACEHOLDER`] so the payload can be released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle {
    reference: String,
    suspended: bool,
}

impl MediaHandle {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            suspended: false,
        }
    }

    /// The retained original reference.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// What the renderer should currently display.
    pub fn bound(&self) -> &str {
        if self.suspended {
            MEDIA_PLACEHOLDER
        } else {
            &self.reference
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Release the payload. Returns true if the state changed.
    pub fn suspend(&mut self) -> bool {
        !std::mem::replace(&mut self.suspended, true)
    }

    /// Rebind the original reference. Returns true if the state changed.
    pub fn resume(&mut self) -> bool {
        std::mem::replace(&mut self.suspended, false)
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// A card on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct MindNode {
    /// Immutable once created.
    pub id: NodeId,
    pub kind: NodeKind,
    /// Top-left corner in logical canvas coordinates.
    pub position: Point,
    /// Raw content as stored (markup, checklist JSON, or timer target).
    pub content: String,
    pub strip_color: String,
    pub visibility: VisibilityMode,
    /// Measured by the host after layout. `None` until then.
    pub size: Option<Size>,
    pub media: SmallVec<[MediaHandle; 2]>,
    /// Transient culling state, recomputed every frame.
    pub culled: bool,
}

impl MindNode {
    /// A node of `kind` with that kind's default content.
    pub fn new(id: NodeId, kind: NodeKind, position: Point) -> Self {
        let mut node = Self {
            id,
            kind,
            position,
            content: String::new(),
            strip_color: DEFAULT_STRIP_COLOR.to_string(),
            visibility: VisibilityMode::Full,
            size: None,
            media: SmallVec::new(),
            culled: false,
        };
        node.set_content(content::default_content(kind));
        node
    }

    /// Replace the content and rediscover embedded media.
    ///
    /// Handles for references that survive the edit keep their suspension
    /// state; new ones follow the node's current culling state.
    pub fn set_content(&mut self, content: String) {
        let previous = std::mem::take(&mut self.media);
        self.media = content::image_sources(&content)
            .into_iter()
            .map(|src| {
                previous
                    .iter()
                    .find(|h| h.reference() == src)
                    .cloned()
                    .unwrap_or_else(|| {
                        let mut handle = MediaHandle::new(src);
                        if self.culled {
                            handle.suspend();
                        }
                        handle
                    })
            })
            .collect();
        self.content = content;
    }

    /// Measured size, or the conservative default before first layout.
    pub fn effective_size(&self) -> Size {
        self.size.unwrap_or(DEFAULT_NODE_SIZE)
    }

    /// Bounding box in logical coordinates.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.effective_size())
    }

    /// Text as shown to the user, for search and export.
    pub fn plain_text(&self) -> String {
        content::plain_text(self.kind, &self.content)
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

/// Edge weight of a connection. Endpoints are the edge's source and target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Connection {
    pub start_anchor: Anchor,
    pub end_anchor: Anchor,
    pub color: Option<String>,
    /// Transient culling state.
    pub culled: bool,
}

/// Identity of a connection: both endpoints with their anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub start: NodeId,
    pub start_anchor: Anchor,
    pub end: NodeId,
    pub end_anchor: Anchor,
}

impl ConnectionKey {
    pub fn new(start: NodeId, start_anchor: Anchor, end: NodeId, end_anchor: Anchor) -> Self {
        Self {
            start,
            start_anchor,
            end,
            end_anchor,
        }
    }

    /// The same link described from the other end.
    pub fn mirrored(self) -> Self {
        Self {
            start: self.end,
            start_anchor: self.end_anchor,
            end: self.start,
            end_anchor: self.start_anchor,
        }
    }

    /// Equal, or equal to the mirror.
    pub fn same_link(&self, other: &ConnectionKey) -> bool {
        *self == *other || *self == other.mirrored()
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.start == node || self.end == node
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}:{}",
            self.start,
            self.start_anchor.as_str(),
            self.end,
            self.end_anchor.as_str()
        )
    }
}

// ─── Groups ──────────────────────────────────────────────────────────────

/// A named, colored set of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub color: String,
    /// Weak references into the scene, without duplicates.
    pub members: SmallVec<[NodeId; 8]>,
    /// Cached union of member rects.
    pub bounds: Rect,
}

impl Group {
    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }
}

/// Everything removed along with a node.
#[derive(Debug, Clone)]
pub struct RemovedNode {
    pub node: MindNode,
    pub connections: Vec<ConnectionKey>,
    pub dissolved_groups: Vec<GroupId>,
}

// ─── Scene Graph ─────────────────────────────────────────────────────────

/// The live entity set of the active project.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    /// Nodes and connection edges.
    pub graph: StableDiGraph<MindNode, Connection>,

    /// Index from NodeId → NodeIndex for fast lookup.
    pub id_index: HashMap<NodeId, NodeIndex>,

    /// Paint order: later entries are on top.
    order: Vec<NodeIndex>,

    pub groups: Vec<Group>,

    /// Set by every mutation, consumed once per frame.
    dirty: bool,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Drop every node, connection, and group.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.id_index.clear();
        self.order.clear();
        self.groups.clear();
        self.dirty = true;
    }

    /// Whether anything changed since the last call. Resets the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // ── Nodes ──

    /// Insert a fully built node on top of the paint order.
    pub fn add_node(&mut self, node: MindNode) -> Result<NodeIndex, SceneError> {
        let id = node.id;
        if self.id_index.contains_key(&id) {
            return Err(SceneError::DuplicateNode(id));
        }
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        self.order.push(idx);
        self.dirty = true;
        log::debug!("scene: added node {id}");
        Ok(idx)
    }

    /// Create a node of `kind` at `position` with a fresh id and default content.
    pub fn create_node(&mut self, kind: NodeKind, position: Point) -> NodeId {
        let id = NodeId::fresh();
        let node = MindNode::new(id, kind, position);
        // Fresh ids are never interned before, so this cannot collide.
        let _ = self.add_node(node);
        id
    }

    /// Remove a node, its connections, and its group memberships.
    /// Groups left without members are deleted.
    pub fn remove_node(&mut self, id: NodeId) -> Option<RemovedNode> {
        let idx = self.id_index.remove(&id)?;
        let connections: Vec<ConnectionKey> = self
            .edges_of(idx)
            .into_iter()
            .filter_map(|e| self.connection_key(e))
            .collect();
        // StableGraph drops incident edges with the node.
        let node = self.graph.remove_node(idx)?;
        self.order.retain(|&i| i != idx);

        let mut dissolved_groups = Vec::new();
        let mut touched = Vec::new();
        for group in &mut self.groups {
            if let Some(pos) = group.members.iter().position(|m| *m == id) {
                group.members.remove(pos);
                if group.members.is_empty() {
                    dissolved_groups.push(group.id);
                } else {
                    touched.push(group.id);
                }
            }
        }
        self.groups.retain(|g| !dissolved_groups.contains(&g.id));
        for gid in touched {
            self.refresh_group_bounds(gid);
        }

        self.dirty = true;
        log::debug!(
            "scene: removed node {id} ({} connections, {} groups dissolved)",
            connections.len(),
            dissolved_groups.len()
        );
        Some(RemovedNode {
            node,
            connections,
            dissolved_groups,
        })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Look up a node by id.
    pub fn get(&self, id: NodeId) -> Option<&MindNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    /// Look up a node mutably. Callers that move or resize should go through
    /// the dedicated setters so group bounds stay current.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut MindNode> {
        self.dirty = true;
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    /// Nodes in paint order (bottom first).
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &MindNode> + '_ {
        self.order.iter().map(|idx| &self.graph[*idx])
    }

    /// Node ids in paint order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(|n| n.id).collect()
    }

    /// Mutable access to every node, for bulk passes such as culling.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut MindNode> + '_ {
        self.graph.node_weights_mut()
    }

    pub fn node_rect(&self, id: NodeId) -> Option<Rect> {
        self.get(id).map(MindNode::rect)
    }

    /// Translate a node by a logical delta.
    pub fn move_node(&mut self, id: NodeId, delta: Vec2) -> Result<(), SceneError> {
        let node = self.get_mut(id).ok_or(SceneError::UnknownNode(id))?;
        node.position += delta;
        self.refresh_bounds_containing(id);
        Ok(())
    }

    pub fn set_position(&mut self, id: NodeId, position: Point) -> Result<(), SceneError> {
        let node = self.get_mut(id).ok_or(SceneError::UnknownNode(id))?;
        node.position = position;
        self.refresh_bounds_containing(id);
        Ok(())
    }

    /// Record the host-measured size of a node.
    pub fn set_node_size(&mut self, id: NodeId, size: Size) -> Result<(), SceneError> {
        let node = self.get_mut(id).ok_or(SceneError::UnknownNode(id))?;
        node.size = Some(size);
        self.refresh_bounds_containing(id);
        Ok(())
    }

    pub fn set_content(&mut self, id: NodeId, content: String) -> Result<(), SceneError> {
        self.get_mut(id)
            .ok_or(SceneError::UnknownNode(id))?
            .set_content(content);
        Ok(())
    }

    pub fn set_strip_color(&mut self, id: NodeId, color: &str) -> Result<(), SceneError> {
        self.get_mut(id).ok_or(SceneError::UnknownNode(id))?.strip_color = color.to_string();
        Ok(())
    }

    pub fn set_visibility(&mut self, id: NodeId, mode: VisibilityMode) -> Result<(), SceneError> {
        self.get_mut(id).ok_or(SceneError::UnknownNode(id))?.visibility = mode;
        Ok(())
    }

    /// Change the card type. Content resets to the new kind's default.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) -> Result<(), SceneError> {
        let node = self.get_mut(id).ok_or(SceneError::UnknownNode(id))?;
        if node.kind != kind {
            node.kind = kind;
            node.set_content(content::default_content(kind));
        }
        Ok(())
    }

    /// Union of every node rect.
    pub fn content_bounds(&self) -> Option<Rect> {
        self.nodes().map(MindNode::rect).reduce(|a, b| a.union(b))
    }

    // ── Connections ──

    /// Connect two nodes. Returns `None` for unknown nodes, self-links, and
    /// links that already exist in either direction.
    pub fn connect(
        &mut self,
        key: ConnectionKey,
        color: Option<String>,
    ) -> Option<EdgeIndex> {
        if key.start == key.end {
            return None;
        }
        let a = self.index_of(key.start)?;
        let b = self.index_of(key.end)?;
        if self.find_connection(&key).is_some() {
            log::debug!("scene: declined duplicate connection {key}");
            return None;
        }
        let edge = self.graph.add_edge(
            a,
            b,
            Connection {
                start_anchor: key.start_anchor,
                end_anchor: key.end_anchor,
                color,
                culled: false,
            },
        );
        self.dirty = true;
        log::debug!("scene: connected {key}");
        Some(edge)
    }

    /// Find an existing connection equal to `key` or its mirror.
    pub fn find_connection(&self, key: &ConnectionKey) -> Option<EdgeIndex> {
        let a = self.index_of(key.start)?;
        let b = self.index_of(key.end)?;
        self.graph
            .edges_connecting(a, b)
            .chain(self.graph.edges_connecting(b, a))
            .find(|e| {
                self.connection_key(e.id())
                    .is_some_and(|existing| existing.same_link(key))
            })
            .map(|e| e.id())
    }

    pub fn disconnect(&mut self, edge: EdgeIndex) -> Option<ConnectionKey> {
        let key = self.connection_key(edge)?;
        self.graph.remove_edge(edge);
        self.dirty = true;
        log::debug!("scene: disconnected {key}");
        Some(key)
    }

    pub fn connection_key(&self, edge: EdgeIndex) -> Option<ConnectionKey> {
        let (a, b) = self.graph.edge_endpoints(edge)?;
        let conn = self.graph.edge_weight(edge)?;
        Some(ConnectionKey::new(
            self.graph[a].id,
            conn.start_anchor,
            self.graph[b].id,
            conn.end_anchor,
        ))
    }

    pub fn connection(&self, edge: EdgeIndex) -> Option<&Connection> {
        self.graph.edge_weight(edge)
    }

    /// Every connection with its key.
    pub fn connections(&self) -> impl Iterator<Item = (EdgeIndex, ConnectionKey, &Connection)> + '_ {
        self.graph.edge_references().map(|e| {
            let key = ConnectionKey::new(
                self.graph[e.source()].id,
                e.weight().start_anchor,
                self.graph[e.target()].id,
                e.weight().end_anchor,
            );
            (e.id(), key, e.weight())
        })
    }

    pub fn connection_indices(&self) -> Vec<EdgeIndex> {
        self.graph.edge_indices().collect()
    }

    /// Connections touching a node, in either direction.
    pub fn connections_of(&self, id: NodeId) -> Vec<EdgeIndex> {
        self.index_of(id)
            .map(|idx| self.edges_of(idx))
            .unwrap_or_default()
    }

    fn edges_of(&self, idx: NodeIndex) -> Vec<EdgeIndex> {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.id())
            .collect()
    }

    // ── Groups ──

    /// Group at least two existing nodes. Unknown ids are ignored, and so
    /// are repeats.
    pub fn create_group(
        &mut self,
        members: &[NodeId],
        name: Option<String>,
        color: Option<String>,
    ) -> Result<GroupId, SceneError> {
        let mut unique: SmallVec<[NodeId; 8]> = SmallVec::new();
        for id in members {
            if self.contains(*id) && !unique.contains(id) {
                unique.push(*id);
            }
        }
        if unique.len() < 2 {
            return Err(SceneError::GroupTooSmall(unique.len()));
        }
        let id = GroupId::fresh();
        let name = name.unwrap_or_else(|| format!("Group {}", self.groups.len() + 1));
        self.groups.push(Group {
            id,
            name,
            color: color.unwrap_or_else(|| DEFAULT_GROUP_COLOR.to_string()),
            members: unique,
            bounds: Rect::ZERO,
        });
        self.refresh_group_bounds(id);
        self.dirty = true;
        log::debug!("scene: created group {id}");
        Ok(id)
    }

    /// Insert a group record as loaded. Members missing from the scene are
    /// dropped; bounds are recomputed. Returns `None` if nothing is left.
    pub fn insert_group(&mut self, mut group: Group) -> Option<GroupId> {
        let before = group.members.len();
        group.members.retain(|m| self.id_index.contains_key(m));
        let mut seen: SmallVec<[NodeId; 8]> = SmallVec::new();
        group.members.retain(|m| {
            if seen.contains(m) {
                false
            } else {
                seen.push(*m);
                true
            }
        });
        if group.members.len() != before {
            log::warn!(
                "scene: group {} dropped {} dangling member(s)",
                group.id,
                before - group.members.len()
            );
        }
        if group.members.is_empty() {
            log::warn!("scene: group {} has no members left, skipped", group.id);
            return None;
        }
        let id = group.id;
        self.groups.retain(|g| g.id != id);
        self.groups.push(group);
        self.refresh_group_bounds(id);
        self.dirty = true;
        Some(id)
    }

    /// Remove the group record; member nodes stay untouched.
    pub fn ungroup(&mut self, id: GroupId) -> Option<Group> {
        let pos = self.groups.iter().position(|g| g.id == id)?;
        self.dirty = true;
        Some(self.groups.remove(pos))
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Groups a node belongs to.
    pub fn groups_of(&self, node: NodeId) -> Vec<GroupId> {
        self.groups
            .iter()
            .filter(|g| g.contains(node))
            .map(|g| g.id)
            .collect()
    }

    pub fn add_to_group(&mut self, group: GroupId, node: NodeId) -> Result<(), SceneError> {
        if !self.contains(node) {
            return Err(SceneError::UnknownNode(node));
        }
        let g = self
            .groups
            .iter_mut()
            .find(|g| g.id == group)
            .ok_or(SceneError::UnknownGroup(group))?;
        if !g.contains(node) {
            g.members.push(node);
        }
        self.refresh_group_bounds(group);
        self.dirty = true;
        Ok(())
    }

    /// Remove a member. The group is deleted when it becomes empty.
    pub fn remove_from_group(&mut self, group: GroupId, node: NodeId) -> Result<(), SceneError> {
        let g = self
            .groups
            .iter_mut()
            .find(|g| g.id == group)
            .ok_or(SceneError::UnknownGroup(group))?;
        g.members.retain(|m| *m != node);
        if g.members.is_empty() {
            self.groups.retain(|g| g.id != group);
        } else {
            self.refresh_group_bounds(group);
        }
        self.dirty = true;
        Ok(())
    }

    pub fn rename_group(&mut self, id: GroupId, name: &str) -> Result<(), SceneError> {
        let g = self
            .groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(SceneError::UnknownGroup(id))?;
        g.name = name.to_string();
        self.dirty = true;
        Ok(())
    }

    pub fn set_group_color(&mut self, id: GroupId, color: &str) -> Result<(), SceneError> {
        let g = self
            .groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(SceneError::UnknownGroup(id))?;
        g.color = color.to_string();
        self.dirty = true;
        Ok(())
    }

    /// Recompute one group's cached bounds from its members.
    pub fn refresh_group_bounds(&mut self, id: GroupId) {
        let Some(pos) = self.groups.iter().position(|g| g.id == id) else {
            return;
        };
        let bounds = self.groups[pos]
            .members
            .iter()
            .filter_map(|m| self.node_rect(*m))
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO);
        self.groups[pos].bounds = bounds;
    }

    /// Recompute the bounds of every group containing `node`.
    pub fn refresh_bounds_containing(&mut self, node: NodeId) {
        for gid in self.groups_of(node) {
            self.refresh_group_bounds(gid);
        }
    }
}
