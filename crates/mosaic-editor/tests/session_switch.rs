//! Integration tests: project switching (mosaic-editor).
//!
//! Each project keeps its own entities and view transform across switches,
//! and a rebuild never reaches history or the auto-save notification.

use kurbo::{Point, Size, Vec2};
use mosaic_core::{Anchor, ConnectionKey, NodeKind, Project, ViewTransform, from_json, to_json};
use mosaic_editor::{EditorConfig, ProjectSession, SessionError};
use pretty_assertions::assert_eq;

fn session() -> ProjectSession {
    let _ = env_logger::builder().is_test(true).try_init();
    ProjectSession::new(EditorConfig::default(), Size::new(1000.0, 800.0))
}

#[test]
fn switching_keeps_entities_and_view_apart() {
    let mut s = session();
    s.new_project("Alpha");
    let a1 = s.engine.scene.create_node(NodeKind::Text, Point::new(0.0, 0.0));
    let a2 = s.engine.scene.create_node(NodeKind::Checklist, Point::new(500.0, 0.0));
    s.engine
        .scene
        .connect(ConnectionKey::new(a1, Anchor::Right, a2, Anchor::Left), None)
        .unwrap();
    s.engine.viewport.set_transform(ViewTransform::new(Point::new(-120.0, 40.0), 1.5));

    s.new_project("Beta");
    assert_eq!(s.engine.scene.node_count(), 1, "only the welcome node");
    assert_eq!(s.engine.scene.connection_count(), 0);
    s.engine.viewport.pan(Vec2::new(10.0, 10.0));
    let beta_view = s.engine.viewport.transform();

    s.switch_to(0).unwrap();
    // Alpha had three nodes: welcome plus the two added.
    assert_eq!(s.engine.scene.node_count(), 3);
    assert_eq!(s.engine.scene.connection_count(), 1);
    assert_eq!(
        s.engine.viewport.transform(),
        ViewTransform::new(Point::new(-120.0, 40.0), 1.5)
    );
    assert!(s.engine.scene.contains(a1));

    s.switch_to(1).unwrap();
    assert_eq!(s.engine.viewport.transform(), beta_view);
    assert!(!s.engine.scene.contains(a1));
}

#[test]
fn rebuild_is_silent() {
    let mut s = session();
    s.new_project("Alpha");
    s.engine.double_click(Point::new(900.0, 700.0));
    assert!(s.engine.take_changed());
    assert!(s.engine.history.can_undo());

    s.new_project("Beta");
    s.switch_to(0).unwrap();
    assert!(!s.engine.is_restoring());
    assert!(!s.engine.take_changed());
    assert!(!s.engine.history.can_undo(), "history is cleared by a switch");
}

#[test]
fn opened_record_restores_its_view() {
    let mut record = Project::new("Loaded");
    record.view = ViewTransform::new(Point::new(33.0, 44.0), 0.5);
    let json = to_json(&record).unwrap();

    let mut s = session();
    s.new_project("Scratch");
    let index = s.open_project(from_json(&json).unwrap());
    assert_eq!(index, 1);
    assert_eq!(s.active().unwrap().name, "Loaded");
    assert_eq!(s.engine.viewport.transform(), record.view);
}

#[test]
fn capture_reflects_live_scene() {
    let mut s = session();
    assert_eq!(s.capture_active().unwrap_err(), SessionError::NoActiveProject);
    s.new_project("Alpha");
    s.engine.scene.create_node(NodeKind::Timer, Point::new(10.0, 10.0));
    let record = s.capture_active().unwrap();
    assert_eq!(record.nodes.len(), 2);
    assert_eq!(record.nodes[1].kind, NodeKind::Timer);
}

#[test]
fn switching_to_the_active_project_keeps_live_edits() {
    let mut s = session();
    s.new_project("Alpha");
    let added = s.engine.scene.create_node(NodeKind::Text, Point::new(400.0, 0.0));
    s.engine.double_click(Point::new(100.0, 100.0));
    assert!(s.engine.history.can_undo());

    s.switch_to(0).unwrap();
    assert_eq!(s.engine.scene.node_count(), 3);
    assert!(s.engine.scene.contains(added));
    assert!(s.engine.history.can_undo(), "no rebuild, no history reset");
    assert_eq!(s.switch_to(3).unwrap_err(), SessionError::NoSuchProject(3));
}
