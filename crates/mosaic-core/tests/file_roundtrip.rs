//! Integration tests: scene → project record → file → project record → scene.
//!
//! Verifies that saving and reopening a canvas keeps every entity, every
//! relationship, node content byte for byte, and the view transform.

use kurbo::{Point, Rect, Size};
use mosaic_core::model::*;
use mosaic_core::{NodeId, Project, ViewTransform, from_json, to_json};
use pretty_assertions::assert_eq;

// ─── Helpers ─────────────────────────────────────────────────────────────

fn sample_scene() -> (SceneGraph, [NodeId; 3]) {
    let mut scene = SceneGraph::new();
    let a = scene.create_node(NodeKind::Text, Point::new(0.0, 0.0));
    let b = scene.create_node(NodeKind::Checklist, Point::new(400.0, 50.0));
    let c = scene.create_node(NodeKind::Timer, Point::new(-250.0, 300.0));

    scene
        .set_content(a, "<b>Plan</b> &amp; <img src=\"data:image/png;base64,AAAA\">".into())
        .unwrap();
    scene
        .set_content(b, r#"{"items":[{"text":"draft","checked":true}]}"#.into())
        .unwrap();
    scene.set_content(c, "2026-12-31T23:59".into()).unwrap();
    scene.set_strip_color(b, "#ffd6a5").unwrap();
    scene.set_visibility(c, VisibilityMode::ContentOnly).unwrap();
    scene.set_node_size(a, Size::new(220.0, 120.0)).unwrap();

    scene
        .connect(ConnectionKey::new(a, Anchor::Right, b, Anchor::Left), None)
        .unwrap();
    scene
        .connect(ConnectionKey::new(c, Anchor::Right, a, Anchor::Left), Some("#333".into()))
        .unwrap();
    scene
        .create_group(&[a, b], Some("Launch".into()), Some("#74b9ff".into()))
        .unwrap();

    (scene, [a, b, c])
}

fn reopen(scene: &SceneGraph, view: ViewTransform) -> (Project, SceneGraph) {
    let mut project = Project::new("Round trip");
    project.capture_from(scene, view);
    let text = to_json(&project).expect("serialize");
    let loaded = from_json(&text).expect("parse");
    let rebuilt = loaded.build_scene();
    (loaded, rebuilt)
}

// ─── Round trip ──────────────────────────────────────────────────────────

#[test]
fn round_trip_preserves_entities() {
    let (scene, [a, b, c]) = sample_scene();
    let (_, rebuilt) = reopen(&scene, ViewTransform::default());

    assert_eq!(rebuilt.node_ids(), vec![a, b, c]);
    for id in [a, b, c] {
        let before = scene.get(id).unwrap();
        let after = rebuilt.get(id).unwrap();
        assert_eq!(after.kind, before.kind, "kind changed for {id}");
        assert_eq!(after.position, before.position, "position changed for {id}");
        assert_eq!(after.content, before.content, "content changed for {id}");
        assert_eq!(after.strip_color, before.strip_color);
        assert_eq!(after.visibility, before.visibility);
        assert_eq!(after.size, before.size);
    }
    assert_eq!(rebuilt.get(a).unwrap().media.len(), 1);
}

#[test]
fn round_trip_preserves_topology() {
    let (scene, _) = sample_scene();
    let (_, rebuilt) = reopen(&scene, ViewTransform::default());

    let mut before: Vec<String> = scene.connections().map(|(_, k, _)| k.to_string()).collect();
    let mut after: Vec<String> = rebuilt.connections().map(|(_, k, _)| k.to_string()).collect();
    before.sort();
    after.sort();
    assert_eq!(after, before);

    let colors: Vec<Option<String>> = rebuilt.connections().map(|(_, _, c)| c.color.clone()).collect();
    assert!(colors.contains(&Some("#333".to_string())));

    assert_eq!(rebuilt.groups.len(), 1);
    let group = &rebuilt.groups[0];
    assert_eq!(group.name, "Launch");
    assert_eq!(group.color, "#74b9ff");
    assert_eq!(group.members.as_slice(), scene.groups[0].members.as_slice());
    assert_eq!(group.bounds, scene.groups[0].bounds);
    // a: (0,0) 220×120, b: (400,50) 300×200
    assert_eq!(group.bounds, Rect::new(0.0, 0.0, 700.0, 250.0));
}

#[test]
fn round_trip_preserves_view_and_metadata() {
    let (scene, _) = sample_scene();
    let view = ViewTransform::new(Point::new(-120.5, 64.0), 0.75);
    let mut project = Project::new("Meta");
    project.capture_from(&scene, view);
    project.remote_id = Some("remote-42".into());
    project.last_modified = Some(1_790_000_000_000);

    let loaded = from_json(&to_json(&project).unwrap()).unwrap();
    assert_eq!(loaded.id, project.id);
    assert_eq!(loaded.name, "Meta");
    assert_eq!(loaded.view, view);
    assert_eq!(loaded.remote_id.as_deref(), Some("remote-42"));
    assert_eq!(loaded.last_modified, Some(1_790_000_000_000));
    assert_eq!(loaded, project);
}

#[test]
fn dangling_connection_in_file_is_dropped() {
    let text = r##"{
        "name": "dangling",
        "nodes": [{"id": "rt_dangling_a", "position": {"x": 0, "y": 0}, "content": "a"}],
        "connections": [{"startNode": "rt_dangling_a", "endNode": "rt_dangling_missing", "startPin": "right", "endPin": "left"}],
        "groups": [{"id": "rt_dangling_g", "name": "g", "color": "#000", "nodeIds": ["rt_dangling_missing"]}]
    }"##;
    let project = from_json(text).unwrap();
    let scene = project.build_scene();
    assert_eq!(scene.node_count(), 1);
    assert_eq!(scene.connection_count(), 0);
    assert!(scene.groups.is_empty());
}
