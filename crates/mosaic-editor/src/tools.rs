//! Tool system for canvas interactions.
//!
//! Each tool translates pointer events into `SceneMutation` commands that
//! are applied via the `CanvasEngine`. The engine picks the tool that owns a
//! gesture on pointer-down and feeds it every event until pointer-up.
//!
//! ## Gesture routing
//!
//! | Pointer-down on | Modifier | Tool |
//! |-----------------|----------|------|
//! | anything        | Alt held | Cut (drag a removal line) |
//! | an anchor       | any      | Connect |
//! | a node          | Shift toggles selection | Select (drag) |
//! | empty canvas    | Shift    | Select (marquee) |
//! | empty canvas    | none     | Pan (engine) |

use crate::engine::SceneMutation;
use crate::input::Modifiers;
use kurbo::{CubicBez, Line, Point, Rect};
use mosaic_core::{Anchor, ConnectionKey, MindNode, NodeId, NodeKind, SceneGraph};
use mosaic_view::RouteCache;
use mosaic_view::hit::{anchor_at, connections_crossing, node_at, nodes_in_rect};
use mosaic_view::route::{node_anchor, preview_curve};

/// A pointer position in both coordinate systems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub screen: Point,
    pub logical: Point,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolEvent {
    Down(Pointer),
    Move(Pointer),
    Up(Pointer),
}

impl ToolEvent {
    pub fn pointer(&self) -> &Pointer {
        match self {
            ToolEvent::Down(p) | ToolEvent::Move(p) | ToolEvent::Up(p) => p,
        }
    }
}

/// What lies under the pointer, in logical space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Hit {
    pub node: Option<NodeId>,
    pub anchor: Option<(NodeId, Anchor)>,
}

impl Hit {
    pub fn at(scene: &SceneGraph, p: Point, pin_radius: f64) -> Self {
        Self {
            node: node_at(scene, p),
            anchor: anchor_at(scene, p, pin_radius),
        }
    }
}

/// Read-only state a tool may consult.
pub struct ToolContext<'a> {
    pub scene: &'a SceneGraph,
    pub routes: &'a RouteCache,
}

/// Trait for tools that handle input and produce mutations.
pub trait Tool {
    /// Handle an input event, returning zero or more mutations.
    fn handle(&mut self, event: &ToolEvent, hit: &Hit, ctx: &ToolContext<'_>) -> Vec<SceneMutation>;

    /// Abandon the current gesture without producing mutations.
    fn cancel(&mut self);
}

// ─── Select Tool ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SelectTool {
    /// Currently selected node(s), in selection order.
    pub selected: Vec<NodeId>,
    /// Drag state (moving the selected nodes).
    dragging: bool,
    last: Point,
    /// Marquee (rubber-band) selection, logical space.
    marquee_start: Option<Point>,
    pub marquee_rect: Option<Rect>,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Nodes currently being dragged.
    pub fn dragged(&self) -> &[NodeId] {
        if self.dragging { &self.selected } else { &[] }
    }

    pub fn select_only(&mut self, id: NodeId) {
        self.selected = vec![id];
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drop ids that no longer exist.
    pub fn prune(&mut self, scene: &SceneGraph) {
        self.selected.retain(|id| scene.contains(*id));
    }
}

impl Tool for SelectTool {
    fn handle(&mut self, event: &ToolEvent, hit: &Hit, ctx: &ToolContext<'_>) -> Vec<SceneMutation> {
        match event {
            ToolEvent::Down(p) => {
                self.marquee_start = None;
                self.marquee_rect = None;

                if let Some(hit_id) = hit.node {
                    // Shift+click: toggle node in/out of selection
                    if p.modifiers.shift {
                        if let Some(pos) = self.selected.iter().position(|id| *id == hit_id) {
                            self.selected.remove(pos);
                            return vec![];
                        }
                        self.selected.push(hit_id);
                    } else if !self.selected.contains(&hit_id) {
                        self.selected = vec![hit_id];
                    }
                    // Clicking an already-selected node keeps the selection for drag.
                    self.dragging = true;
                    self.last = p.logical;
                } else {
                    if !p.modifiers.shift {
                        self.selected.clear();
                    }
                    self.dragging = false;
                    self.marquee_start = Some(p.logical);
                    self.marquee_rect = Some(Rect::from_points(p.logical, p.logical));
                }
                vec![]
            }
            ToolEvent::Move(p) => {
                if let Some(start) = self.marquee_start {
                    self.marquee_rect = Some(Rect::from_points(start, p.logical));
                    return vec![];
                }
                if self.dragging && !self.selected.is_empty() {
                    let delta = p.logical - self.last;
                    self.last = p.logical;
                    if delta.x == 0.0 && delta.y == 0.0 {
                        return vec![];
                    }
                    return self
                        .selected
                        .iter()
                        .map(|id| SceneMutation::MoveNode { id: *id, delta })
                        .collect();
                }
                vec![]
            }
            ToolEvent::Up(_) => {
                if let Some(rect) = self.marquee_rect.take() {
                    for id in nodes_in_rect(ctx.scene, rect) {
                        if !self.selected.contains(&id) {
                            self.selected.push(id);
                        }
                    }
                }
                self.marquee_start = None;
                self.dragging = false;
                vec![]
            }
        }
    }

    fn cancel(&mut self) {
        self.dragging = false;
        self.marquee_start = None;
        self.marquee_rect = None;
    }
}

// ─── Connect Tool ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ConnectState {
    #[default]
    Idle,
    Dragging {
        source: NodeId,
        anchor: Anchor,
        /// Logical position of the source anchor.
        start: Point,
        pointer: Point,
    },
}

/// Drag from an anchor to create a connection.
#[derive(Debug, Default)]
pub struct ConnectTool {
    pub state: ConnectState,
}

impl ConnectTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The rubber-band curve to draw, while dragging.
    pub fn preview(&self) -> Option<CubicBez> {
        match self.state {
            ConnectState::Dragging {
                anchor,
                start,
                pointer,
                ..
            } => Some(preview_curve(start, anchor, pointer)),
            ConnectState::Idle => None,
        }
    }

    /// Resolve a release at `pointer` into mutations.
    fn drop_at(
        source: NodeId,
        anchor: Anchor,
        pointer: Point,
        hit: &Hit,
        scene: &SceneGraph,
    ) -> Vec<SceneMutation> {
        // Released on another node's anchor: use it as is.
        if let Some((target, end_anchor)) = hit.anchor
            && target != source
        {
            return vec![SceneMutation::Connect {
                key: ConnectionKey::new(source, anchor, target, end_anchor),
                color: None,
            }];
        }

        // Released on another node's body: pick the side facing the drop.
        if let Some(target) = hit.node
            && target != source
            && let Some(rect) = scene.node_rect(target)
        {
            let mid = rect.center().x;
            let end_anchor = match anchor {
                Anchor::Left if pointer.x < mid => Anchor::Left,
                Anchor::Right if pointer.x > mid => Anchor::Right,
                _ => anchor.opposite(),
            };
            return vec![SceneMutation::Connect {
                key: ConnectionKey::new(source, anchor, target, end_anchor),
                color: None,
            }];
        }

        // Empty canvas or the source itself: spawn a node that inherits the
        // source's look.
        let mut node = MindNode::new(NodeId::fresh(), NodeKind::Text, pointer);
        if let Some(src) = scene.get(source) {
            node.strip_color = src.strip_color.clone();
            node.visibility = src.visibility;
        }
        let key = ConnectionKey::new(source, anchor, node.id, anchor.opposite());
        vec![
            SceneMutation::AddNode {
                node: Box::new(node),
            },
            SceneMutation::Connect { key, color: None },
        ]
    }
}

impl Tool for ConnectTool {
    fn handle(&mut self, event: &ToolEvent, hit: &Hit, ctx: &ToolContext<'_>) -> Vec<SceneMutation> {
        match (event, self.state) {
            (ToolEvent::Down(p), ConnectState::Idle) => {
                if let Some((source, anchor)) = hit.anchor
                    && let Some(node) = ctx.scene.get(source)
                {
                    self.state = ConnectState::Dragging {
                        source,
                        anchor,
                        start: node_anchor(node, anchor),
                        pointer: p.logical,
                    };
                }
                vec![]
            }
            (
                ToolEvent::Move(p),
                ConnectState::Dragging {
                    source,
                    anchor,
                    start,
                    ..
                },
            ) => {
                self.state = ConnectState::Dragging {
                    source,
                    anchor,
                    start,
                    pointer: p.logical,
                };
                vec![]
            }
            (ToolEvent::Up(p), ConnectState::Dragging { source, anchor, .. }) => {
                self.state = ConnectState::Idle;
                if !ctx.scene.contains(source) {
                    return vec![];
                }
                Self::drop_at(source, anchor, p.logical, hit, ctx.scene)
            }
            _ => vec![],
        }
    }

    fn cancel(&mut self) {
        self.state = ConnectState::Idle;
    }
}

// ─── Cut Tool ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum CutState {
    #[default]
    Idle,
    /// Alt is held; the next pointer-down starts a removal line.
    Armed,
    Drawing { start: Pointer, end: Pointer },
}

/// Alt-drag a line across connections to delete them.
#[derive(Debug, Default)]
pub struct CutTool {
    pub state: CutState,
}

impl CutTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self) {
        if self.state == CutState::Idle {
            self.state = CutState::Armed;
        }
    }

    /// Alt released: back to idle from any state, line hidden.
    pub fn disarm(&mut self) {
        self.state = CutState::Idle;
    }

    pub fn is_armed(&self) -> bool {
        self.state != CutState::Idle
    }

    /// The removal line in screen space, while drawing.
    pub fn removal_line(&self) -> Option<Line> {
        match self.state {
            CutState::Drawing { start, end } => Some(Line::new(start.screen, end.screen)),
            _ => None,
        }
    }
}

impl Tool for CutTool {
    fn handle(&mut self, event: &ToolEvent, _hit: &Hit, ctx: &ToolContext<'_>) -> Vec<SceneMutation> {
        match (event, self.state) {
            (ToolEvent::Down(p), CutState::Armed) => {
                self.state = CutState::Drawing { start: *p, end: *p };
                vec![]
            }
            (ToolEvent::Move(p), CutState::Drawing { start, .. }) => {
                self.state = CutState::Drawing { start, end: *p };
                vec![]
            }
            (ToolEvent::Up(p), CutState::Drawing { start, .. }) => {
                self.state = CutState::Armed;
                let line = Line::new(start.logical, p.logical);
                connections_crossing(ctx.scene, ctx.routes, line)
                    .into_iter()
                    .filter_map(|edge| ctx.scene.connection_key(edge))
                    .map(|key| SceneMutation::Disconnect { key })
                    .collect()
            }
            _ => vec![],
        }
    }

    fn cancel(&mut self) {
        if let CutState::Drawing { .. } = self.state {
            self.state = CutState::Armed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;
    use pretty_assertions::assert_eq;

    fn at(x: f64, y: f64) -> Pointer {
        Pointer {
            screen: Point::new(x, y),
            logical: Point::new(x, y),
            modifiers: Modifiers::NONE,
        }
    }

    fn place(scene: &mut SceneGraph, name: &str, x: f64, y: f64) -> NodeId {
        let id = NodeId::intern(name);
        let mut node = MindNode::new(id, NodeKind::Text, Point::new(x, y));
        node.size = Some(Size::new(100.0, 100.0));
        scene.add_node(node).unwrap();
        id
    }

    fn run(tool: &mut dyn Tool, scene: &SceneGraph, event: ToolEvent) -> Vec<SceneMutation> {
        let routes = RouteCache::new();
        let ctx = ToolContext {
            scene,
            routes: &routes,
        };
        let hit = Hit::at(scene, event.pointer().logical, mosaic_view::hit::PIN_RADIUS);
        tool.handle(&event, &hit, &ctx)
    }

    #[test]
    fn select_tool_drag() {
        let mut scene = SceneGraph::new();
        let target = place(&mut scene, "tools_drag", 0.0, 0.0);
        let mut tool = SelectTool::new();

        assert!(run(&mut tool, &scene, ToolEvent::Down(at(50.0, 50.0))).is_empty());
        assert_eq!(tool.selected, vec![target]);
        assert_eq!(tool.dragged(), &[target]);

        let mutations = run(&mut tool, &scene, ToolEvent::Move(at(60.0, 55.0)));
        assert_eq!(
            mutations,
            vec![SceneMutation::MoveNode {
                id: target,
                delta: kurbo::Vec2::new(10.0, 5.0)
            }]
        );

        run(&mut tool, &scene, ToolEvent::Up(at(60.0, 55.0)));
        assert!(tool.dragged().is_empty());
    }

    #[test]
    fn select_tool_shift_toggles_and_marquee() {
        let mut scene = SceneGraph::new();
        let a = place(&mut scene, "tools_marquee_a", 0.0, 0.0);
        let b = place(&mut scene, "tools_marquee_b", 300.0, 0.0);
        let mut tool = SelectTool::new();
        let shift = |x, y| Pointer {
            modifiers: Modifiers::SHIFT,
            ..at(x, y)
        };

        run(&mut tool, &scene, ToolEvent::Down(shift(150.0, -50.0)));
        run(&mut tool, &scene, ToolEvent::Move(shift(350.0, 50.0)));
        run(&mut tool, &scene, ToolEvent::Up(shift(350.0, 50.0)));
        assert_eq!(tool.selected, vec![b]);

        run(&mut tool, &scene, ToolEvent::Down(shift(10.0, 10.0)));
        assert_eq!(tool.selected, vec![b, a]);
        run(&mut tool, &scene, ToolEvent::Up(shift(10.0, 10.0)));
        run(&mut tool, &scene, ToolEvent::Down(shift(310.0, 10.0)));
        assert_eq!(tool.selected, vec![a]);
    }

    #[test]
    fn connect_to_anchor() {
        let mut scene = SceneGraph::new();
        let a = place(&mut scene, "tools_conn_a", 0.0, 0.0);
        let b = place(&mut scene, "tools_conn_b", 300.0, 0.0);
        let mut tool = ConnectTool::new();

        run(&mut tool, &scene, ToolEvent::Down(at(100.0, 50.0)));
        run(&mut tool, &scene, ToolEvent::Move(at(200.0, 60.0)));
        let preview = tool.preview().unwrap();
        assert_eq!(preview.p0, Point::new(100.0, 50.0));
        assert_eq!(preview.p3, Point::new(200.0, 60.0));

        let mutations = run(&mut tool, &scene, ToolEvent::Up(at(402.0, 52.0)));
        assert_eq!(
            mutations,
            vec![SceneMutation::Connect {
                key: ConnectionKey::new(a, Anchor::Right, b, Anchor::Right),
                color: None
            }]
        );
        assert_eq!(tool.state, ConnectState::Idle);
    }

    #[test]
    fn connect_to_body_picks_facing_side() {
        let mut scene = SceneGraph::new();
        let a = place(&mut scene, "tools_body_a", 0.0, 0.0);
        let b = place(&mut scene, "tools_body_b", 300.0, 0.0);
        let mut tool = ConnectTool::new();

        // Right anchor, released left of b's middle → b's left.
        run(&mut tool, &scene, ToolEvent::Down(at(100.0, 50.0)));
        let mutations = run(&mut tool, &scene, ToolEvent::Up(at(330.0, 80.0)));
        assert_eq!(
            mutations,
            vec![SceneMutation::Connect {
                key: ConnectionKey::new(a, Anchor::Right, b, Anchor::Left),
                color: None
            }]
        );

        // Right anchor, released right of b's middle → b's right.
        run(&mut tool, &scene, ToolEvent::Down(at(100.0, 50.0)));
        let mutations = run(&mut tool, &scene, ToolEvent::Up(at(370.0, 80.0)));
        assert_eq!(
            mutations,
            vec![SceneMutation::Connect {
                key: ConnectionKey::new(a, Anchor::Right, b, Anchor::Right),
                color: None
            }]
        );

        // Left anchor, released right of a's middle... on b → default b's right.
        run(&mut tool, &scene, ToolEvent::Down(at(0.0, 50.0)));
        let mutations = run(&mut tool, &scene, ToolEvent::Up(at(370.0, 80.0)));
        assert_eq!(
            mutations,
            vec![SceneMutation::Connect {
                key: ConnectionKey::new(a, Anchor::Left, b, Anchor::Right),
                color: None
            }]
        );
    }

    #[test]
    fn connect_to_empty_canvas_spawns_node() {
        let mut scene = SceneGraph::new();
        let a = place(&mut scene, "tools_spawn_a", 0.0, 0.0);
        scene.set_strip_color(a, "#ff0000").unwrap();
        scene
            .set_visibility(a, mosaic_core::VisibilityMode::ContentOnly)
            .unwrap();
        let mut tool = ConnectTool::new();

        run(&mut tool, &scene, ToolEvent::Down(at(0.0, 50.0)));
        let mutations = run(&mut tool, &scene, ToolEvent::Up(at(-500.0, 200.0)));
        assert_eq!(mutations.len(), 2);
        let SceneMutation::AddNode { node } = &mutations[0] else {
            panic!("expected AddNode");
        };
        assert_eq!(node.position, Point::new(-500.0, 200.0));
        assert_eq!(node.strip_color, "#ff0000");
        assert_eq!(node.visibility, mosaic_core::VisibilityMode::ContentOnly);
        assert_eq!(
            mutations[1],
            SceneMutation::Connect {
                key: ConnectionKey::new(a, Anchor::Left, node.id, Anchor::Right),
                color: None
            }
        );
    }

    #[test]
    fn connect_released_on_source_spawns_node() {
        let mut scene = SceneGraph::new();
        place(&mut scene, "tools_self", 0.0, 0.0);
        let mut tool = ConnectTool::new();
        run(&mut tool, &scene, ToolEvent::Down(at(100.0, 50.0)));
        let mutations = run(&mut tool, &scene, ToolEvent::Up(at(50.0, 50.0)));
        assert!(matches!(mutations[0], SceneMutation::AddNode { .. }));
    }

    #[test]
    fn cut_tool_state_machine() {
        let mut scene = SceneGraph::new();
        let a = place(&mut scene, "tools_cut_a", 0.0, 0.0);
        let b = place(&mut scene, "tools_cut_b", 300.0, 0.0);
        let key = ConnectionKey::new(a, Anchor::Right, b, Anchor::Left);
        scene.connect(key, None).unwrap();
        let mut tool = CutTool::new();

        // Not armed: pointer-down does nothing.
        run(&mut tool, &scene, ToolEvent::Down(at(200.0, -50.0)));
        assert_eq!(tool.state, CutState::Idle);

        tool.arm();
        run(&mut tool, &scene, ToolEvent::Down(at(200.0, -50.0)));
        run(&mut tool, &scene, ToolEvent::Move(at(200.0, 150.0)));
        assert_eq!(
            tool.removal_line(),
            Some(Line::new((200.0, -50.0), (200.0, 150.0)))
        );
        let mutations = run(&mut tool, &scene, ToolEvent::Up(at(200.0, 150.0)));
        assert_eq!(mutations, vec![SceneMutation::Disconnect { key }]);
        assert_eq!(tool.state, CutState::Armed);

        run(&mut tool, &scene, ToolEvent::Down(at(0.0, 0.0)));
        tool.disarm();
        assert_eq!(tool.state, CutState::Idle);
        assert_eq!(tool.removal_line(), None);
    }
}
