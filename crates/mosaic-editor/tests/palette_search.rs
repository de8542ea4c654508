//! Integration tests: command palette search and navigation (mosaic-editor).

use kurbo::{Point, Size};
use mosaic_core::{NodeKind, SceneGraph};
use mosaic_editor::palette::{PaletteCategory, PaletteTarget};
use mosaic_editor::{CanvasEngine, CommandPalette, EditorConfig, PaletteCommand};
use pretty_assertions::assert_eq;

fn text_node(scene: &mut SceneGraph, text: &str, x: f64) -> mosaic_core::NodeId {
    let id = scene.create_node(NodeKind::Text, Point::new(x, 0.0));
    scene.set_content(id, format!("<p>{text}</p>")).unwrap();
    id
}

#[test]
fn results_are_ordered_by_category() {
    let mut scene = SceneGraph::new();
    let a = text_node(&mut scene, "Check the timeline", 0.0);
    let b = text_node(&mut scene, "Buy milk", 400.0);
    scene.create_group(&[a, b], Some("Timetable".into()), None).unwrap();

    let mut palette = CommandPalette::new();
    palette.open(&scene);
    palette.set_query("TIME", &scene);
    let got: Vec<_> = palette
        .items()
        .iter()
        .map(|i| (i.category, i.target))
        .collect();
    assert_eq!(
        got,
        vec![
            (PaletteCategory::Create, PaletteTarget::Create(NodeKind::Timer)),
            (PaletteCategory::Node, PaletteTarget::Node(a)),
            (PaletteCategory::Group, PaletteTarget::Group(scene.groups[0].id)),
        ]
    );
    assert_eq!(palette.items()[1].label, "Check the timeline...");
    assert_eq!(palette.items()[2].detail, "2 nodes");
}

#[test]
fn node_jump_navigates_all_matches() {
    let mut scene = SceneGraph::new();
    let first = text_node(&mut scene, "alpha plan", 0.0);
    let _other = text_node(&mut scene, "beta", 400.0);
    let second = text_node(&mut scene, "Plan B", 800.0);

    let mut palette = CommandPalette::new();
    palette.open(&scene);
    palette.set_query("plan", &scene);
    // Skip the create results; none of the kinds match "plan".
    assert_eq!(palette.items().len(), 2);
    palette.move_selection(1);

    let command = palette.confirm(&scene).unwrap();
    assert!(!palette.is_open());
    assert_eq!(
        command,
        PaletteCommand::FocusNode {
            id: second,
            highlight: Some(0..4)
        }
    );

    let nav = palette.navigator_mut().unwrap();
    assert_eq!(nav.position(), (2, 2));
    assert_eq!(
        nav.next(&scene),
        Some(PaletteCommand::FocusNode {
            id: first,
            highlight: Some(6..10)
        })
    );
    assert_eq!(nav.position(), (1, 2));
    assert_eq!(nav.prev(&scene).unwrap(), command);
}

#[test]
fn single_match_has_no_navigator() {
    let mut scene = SceneGraph::new();
    text_node(&mut scene, "only one", 0.0);
    let mut palette = CommandPalette::new();
    palette.open(&scene);
    palette.set_query("only", &scene);
    palette.confirm(&scene).unwrap();
    assert!(palette.navigator().is_none());
}

#[test]
fn create_places_node_at_view_center_and_selects_it() {
    let mut engine = CanvasEngine::new(EditorConfig::default(), Size::new(1000.0, 800.0));
    let mut palette = CommandPalette::new();
    palette.toggle(&engine.scene);
    assert!(palette.is_open());
    palette.move_selection(1);
    let command = palette.confirm(&engine.scene).unwrap();
    assert_eq!(command, PaletteCommand::Create(NodeKind::Checklist));

    let id = engine.execute_palette(&command, 0.0).unwrap();
    assert_eq!(engine.selection(), &[id]);
    assert_eq!(engine.scene.get(id).unwrap().position, Point::new(500.0, 400.0));
    assert!(engine.viewport.is_animating());

    // Pan-to lands the node's center on the screen center.
    engine.frame(1000.0);
    let center = engine.scene.node_rect(id).unwrap().center();
    assert_eq!(engine.viewport.logical_to_screen(center), Point::new(500.0, 400.0));
}

#[test]
fn group_jump_puts_label_near_top_left() {
    let mut engine = CanvasEngine::new(EditorConfig::default(), Size::new(1000.0, 800.0));
    let a = text_node(&mut engine.scene, "a", 1000.0);
    let b = text_node(&mut engine.scene, "b", 1400.0);
    let gid = engine.scene.create_group(&[a, b], Some("Roadmap".into()), None).unwrap();

    engine.execute_palette(&PaletteCommand::FocusGroup(gid), 0.0);
    engine.frame(1000.0);
    let label = Point::new(1020.0, 20.0);
    assert_eq!(engine.viewport.logical_to_screen(label), Point::new(40.0, 40.0));
}

#[test]
fn untouched_nodes_do_not_match_their_placeholder() {
    let mut scene = SceneGraph::new();
    scene.create_node(NodeKind::Text, Point::ZERO);
    scene.create_node(NodeKind::Text, Point::new(400.0, 0.0));
    let edited = text_node(&mut scene, "edit the plan", 800.0);

    let mut palette = CommandPalette::new();
    palette.open(&scene);
    palette.set_query("edit", &scene);
    let targets: Vec<_> = palette.items().iter().map(|i| i.target).collect();
    assert_eq!(targets, vec![PaletteTarget::Node(edited)]);
}
