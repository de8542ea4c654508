//! Integration tests: connection gestures and the cut line (mosaic-editor).
//!
//! Drives the engine with screen-space input only. The view is left at the
//! identity transform so screen and logical coordinates coincide.

use kurbo::{Point, Size};
use mosaic_core::{Anchor, ConnectionKey, MindNode, NodeId, NodeKind, SceneGraph};
use mosaic_editor::{CanvasEngine, EditorConfig, InputEvent, Modifiers};
use pretty_assertions::assert_eq;

fn engine() -> CanvasEngine {
    let mut engine = CanvasEngine::new(EditorConfig::default(), Size::new(1280.0, 800.0));
    engine.viewport.set_transform(Default::default());
    engine
}

fn place(scene: &mut SceneGraph, name: &str, x: f64, y: f64) -> NodeId {
    let id = NodeId::intern(name);
    let mut node = MindNode::new(id, NodeKind::Text, Point::new(x, y));
    node.size = Some(Size::new(100.0, 100.0));
    scene.add_node(node).unwrap();
    id
}

fn drag(engine: &mut CanvasEngine, from: (f64, f64), to: (f64, f64), modifiers: Modifiers) {
    engine.handle_event(&InputEvent::pointer_down(from.0, from.1, modifiers), 0.0);
    engine.handle_event(&InputEvent::pointer_move(to.0, to.1, modifiers), 0.0);
    engine.handle_event(&InputEvent::pointer_up(to.0, to.1, modifiers), 0.0);
}

/// A(0,0) right anchor at (100,50) → B(300,0) left anchor at (300,50).
fn connected_pair(engine: &mut CanvasEngine, prefix: &str) -> (NodeId, NodeId, ConnectionKey) {
    let a = place(&mut engine.scene, &format!("{prefix}_a"), 0.0, 0.0);
    let b = place(&mut engine.scene, &format!("{prefix}_b"), 300.0, 0.0);
    drag(engine, (100.0, 50.0), (301.0, 49.0), Modifiers::NONE);
    engine.frame(0.0);
    (a, b, ConnectionKey::new(a, Anchor::Right, b, Anchor::Left))
}

fn cut(engine: &mut CanvasEngine, from: (f64, f64), to: (f64, f64)) {
    engine.handle_event(&InputEvent::key_down("Alt", Modifiers::ALT), 0.0);
    drag(engine, from, to, Modifiers::ALT);
    engine.handle_event(&InputEvent::key_up("Alt", Modifiers::NONE), 0.0);
}

// ─── Connect ────────────────────────────────────────────────────────────

#[test]
fn drag_between_anchors_connects() {
    let mut engine = engine();
    let (_, _, key) = connected_pair(&mut engine, "cc_anchor");
    let keys: Vec<_> = engine.scene.connections().map(|(_, k, _)| k).collect();
    assert_eq!(keys, vec![key]);
    assert_eq!(engine.routes.len(), 1);
    assert!(engine.connection_preview().is_none());
}

#[test]
fn repeated_and_mirrored_drags_are_declined() {
    let mut engine = engine();
    connected_pair(&mut engine, "cc_dup");
    drag(&mut engine, (100.0, 50.0), (300.0, 50.0), Modifiers::NONE);
    // Same link, drawn from the other end.
    drag(&mut engine, (300.0, 50.0), (100.0, 50.0), Modifiers::NONE);
    assert_eq!(engine.scene.connection_count(), 1);
}

#[test]
fn drop_on_empty_canvas_spawns_connected_node() {
    let mut engine = engine();
    let a = place(&mut engine.scene, "cc_spawn_a", 0.0, 0.0);
    drag(&mut engine, (100.0, 50.0), (600.0, 400.0), Modifiers::NONE);

    assert_eq!(engine.scene.node_count(), 2);
    let (_, key, _) = engine.scene.connections().next().unwrap();
    assert_eq!(key.start, a);
    assert_eq!(key.start_anchor, Anchor::Right);
    assert_eq!(key.end_anchor, Anchor::Left);
    assert_eq!(engine.scene.get(key.end).unwrap().position, Point::new(600.0, 400.0));

    // Node and link come back out with one undo.
    engine.undo();
    assert_eq!(engine.scene.node_count(), 1);
    assert_eq!(engine.scene.connection_count(), 0);
}

// ─── Cut ────────────────────────────────────────────────────────────────

#[test]
fn cut_line_across_connection_deletes_it() {
    let mut engine = engine();
    connected_pair(&mut engine, "cc_cut_hit");
    cut(&mut engine, (150.0, -50.0), (150.0, 150.0));
    assert_eq!(engine.scene.connection_count(), 0);
    assert_eq!(engine.scene.node_count(), 2);
}

#[test]
fn cut_line_away_from_connection_keeps_it() {
    let mut engine = engine();
    connected_pair(&mut engine, "cc_cut_miss");
    cut(&mut engine, (150.0, 500.0), (150.0, 600.0));
    assert_eq!(engine.scene.connection_count(), 1);
}

#[test]
fn cut_is_one_undo_step() {
    let mut engine = engine();
    let a = place(&mut engine.scene, "cc_multi_a", 0.0, 0.0);
    let b = place(&mut engine.scene, "cc_multi_b", 300.0, 0.0);
    let c = place(&mut engine.scene, "cc_multi_c", 300.0, 200.0);
    engine
        .scene
        .connect(ConnectionKey::new(a, Anchor::Right, b, Anchor::Left), None)
        .unwrap();
    engine
        .scene
        .connect(ConnectionKey::new(a, Anchor::Right, c, Anchor::Left), None)
        .unwrap();
    engine.frame(0.0);

    cut(&mut engine, (200.0, -100.0), (200.0, 400.0));
    assert_eq!(engine.scene.connection_count(), 0);
    assert_eq!(engine.undo(), Some("Cut connections".to_string()));
    assert_eq!(engine.scene.connection_count(), 2);
}

#[test]
fn removal_line_tracks_pointer_until_alt_released() {
    let mut engine = engine();
    engine.handle_event(&InputEvent::key_down("Alt", Modifiers::ALT), 0.0);
    engine.handle_event(&InputEvent::pointer_down(10.0, 10.0, Modifiers::ALT), 0.0);
    engine.handle_event(&InputEvent::pointer_move(40.0, 50.0, Modifiers::ALT), 0.0);
    let line = engine.removal_line().unwrap();
    assert_eq!((line.p0, line.p1), (Point::new(10.0, 10.0), Point::new(40.0, 50.0)));

    engine.handle_event(&InputEvent::key_up("Alt", Modifiers::NONE), 0.0);
    assert!(engine.removal_line().is_none());
    assert!(!engine.cut.is_armed());
}
