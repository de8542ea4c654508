//! SVG writer for export snapshots.
//!
//! Everything is drawn in logical coordinates; the root `viewBox` is the
//! snapshot bounds, so the file is independent of the current zoom.

use mosaic_core::NodeKind;
use mosaic_view::export::{ExportConnection, ExportGroup, ExportNode, ExportSnapshot};
use std::fmt::Write;

/// Height of the colored strip along the top of a node.
const STRIP_HEIGHT: f64 = 6.0;
const CORNER_RADIUS: f64 = 8.0;
const FONT_SIZE: f64 = 14.0;
const LINE_HEIGHT: f64 = 20.0;
const TEXT_INSET: f64 = 16.0;

/// Export colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvgTheme {
    pub bg: &'static str,
    pub card: &'static str,
    pub card_border: &'static str,
    pub text: &'static str,
    pub connection: &'static str,
}

impl SvgTheme {
    pub fn light() -> Self {
        Self {
            bg: "#F5F5F7",
            card: "#FFFFFF",
            card_border: "#D2D2D7",
            text: "#1D1D1F",
            connection: "#86868B",
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: "#1C1C1E",
            card: "#2C2C2E",
            card_border: "#3A3A3C",
            text: "#F5F5F7",
            connection: "#98989D",
        }
    }
}

/// Escape text for use in element content or attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_svg(snapshot: &ExportSnapshot, theme: &SvgTheme) -> String {
    let b = snapshot.bounds;
    let (width, height) = (b.width(), b.height());
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"{} {} {width} {height}\">",
        b.x0, b.y0
    );
    svg.push_str("<style>\n");
    svg.push_str("  text { font-family: Inter, system-ui, sans-serif; }\n");
    svg.push_str("</style>\n");
    let _ = writeln!(
        svg,
        "<rect x=\"{}\" y=\"{}\" width=\"{width}\" height=\"{height}\" fill=\"{}\" />",
        b.x0, b.y0, theme.bg
    );

    // Groups under connections under nodes.
    for group in &snapshot.groups {
        render_group(&mut svg, group, theme);
    }
    for conn in &snapshot.connections {
        render_connection(&mut svg, conn, theme);
    }
    for node in &snapshot.nodes {
        render_node(&mut svg, node, theme);
    }

    svg.push_str("</svg>");
    svg
}

fn render_group(out: &mut String, group: &ExportGroup, theme: &SvgTheme) {
    let r = group.bounds;
    let _ = writeln!(
        out,
        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{CORNER_RADIUS}\" fill=\"{}\" fill-opacity=\"0.12\" stroke=\"{}\" stroke-dasharray=\"6 4\" />",
        r.x0,
        r.y0,
        r.width(),
        r.height(),
        escape(&group.color),
        escape(&group.color)
    );
    let _ = writeln!(
        out,
        "  <text x=\"{}\" y=\"{}\" font-size=\"{FONT_SIZE}\" font-weight=\"600\" fill=\"{}\">{}</text>",
        r.x0 + TEXT_INSET,
        r.y0 + TEXT_INSET + FONT_SIZE * 0.5,
        theme.text,
        escape(&group.name)
    );
}

fn render_connection(out: &mut String, conn: &ExportConnection, theme: &SvgTheme) {
    let stroke = conn.color.as_deref().map(escape).unwrap_or_else(|| theme.connection.to_string());
    let _ = writeln!(
        out,
        "  <path d=\"{}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"2\" />",
        conn.path
    );
}

fn render_node(out: &mut String, node: &ExportNode, theme: &SvgTheme) {
    let r = node.rect;
    if !node.content_only {
        let _ = writeln!(
            out,
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{CORNER_RADIUS}\" fill=\"{}\" stroke=\"{}\" />",
            r.x0,
            r.y0,
            r.width(),
            r.height(),
            theme.card,
            theme.card_border
        );
        let _ = writeln!(
            out,
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{STRIP_HEIGHT}\" fill=\"{}\" />",
            r.x0,
            r.y0,
            r.width(),
            escape(&node.strip_color)
        );
    }

    let text = match node.kind {
        NodeKind::Timer if node.text.is_empty() => "00:00",
        _ => node.text.as_str(),
    };
    let max_lines = ((r.height() - TEXT_INSET * 2.0) / LINE_HEIGHT).floor().max(1.0) as usize;
    let mut y = r.y0 + TEXT_INSET + FONT_SIZE;
    for line in text.lines().filter(|l| !l.trim().is_empty()).take(max_lines) {
        let _ = writeln!(
            out,
            "  <text x=\"{}\" y=\"{y}\" font-size=\"{FONT_SIZE}\" fill=\"{}\">{}</text>",
            r.x0 + TEXT_INSET,
            theme.text,
            escape(line.trim())
        );
        y += LINE_HEIGHT;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Point, Size};
    use mosaic_core::{Anchor, ConnectionKey, SceneGraph};
    use mosaic_view::RouteCache;
    use pretty_assertions::assert_eq;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn renders_nodes_connections_and_groups() {
        let mut scene = SceneGraph::new();
        let a = scene.create_node(NodeKind::Text, Point::ZERO);
        let b = scene.create_node(NodeKind::Text, Point::new(400.0, 0.0));
        scene.set_node_size(a, Size::new(100.0, 100.0)).unwrap();
        scene.set_node_size(b, Size::new(100.0, 100.0)).unwrap();
        scene.set_content(a, "<p>Fish &amp; chips</p>".into()).unwrap();
        scene
            .connect(ConnectionKey::new(a, Anchor::Right, b, Anchor::Left), None)
            .unwrap();
        scene.create_group(&[a, b], Some("Lunch <plan>".into()), None).unwrap();

        let snapshot = ExportSnapshot::capture(&scene, &RouteCache::new(), false);
        let svg = render_svg(&snapshot, &SvgTheme::light());

        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("<path d=\"M 100,50 C 250,50 250,50 400,50\""));
        assert!(svg.contains("Lunch &lt;plan&gt;"));
        assert_eq!(svg.matches("stroke-dasharray").count(), 1);
        // Two cards, two strips, one group, one background.
        assert_eq!(svg.matches("<rect").count(), 6);
    }

    #[test]
    fn content_only_nodes_skip_the_frame() {
        let mut scene = SceneGraph::new();
        let a = scene.create_node(NodeKind::Text, Point::ZERO);
        scene
            .set_visibility(a, mosaic_core::VisibilityMode::ContentOnly)
            .unwrap();
        let snapshot = ExportSnapshot::capture(&scene, &RouteCache::new(), false);
        let svg = render_svg(&snapshot, &SvgTheme::dark());
        // Background only.
        assert_eq!(svg.matches("<rect").count(), 1);
        assert!(svg.contains("#1C1C1E"));
    }
}
