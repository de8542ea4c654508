//! Command palette: create nodes and jump to nodes or groups by text.
//!
//! Results are rebuilt on every query change, in three categories: creatable
//! kinds, nodes whose plain text contains the query, and groups whose name
//! does. Matching is case-insensitive. Confirming a node result also starts a
//! [`MatchNavigator`] over every matching node so the host can step through
//! them after the palette closes.

use mosaic_core::{GroupId, NodeId, NodeKind, SceneGraph};
use std::ops::Range;

/// Characters of node text shown in a result label.
const SNIPPET_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PaletteCategory {
    Create,
    Node,
    Group,
}

impl PaletteCategory {
    pub fn label(self) -> &'static str {
        match self {
            PaletteCategory::Create => "Create New",
            PaletteCategory::Node => "Go to Node",
            PaletteCategory::Group => "Go to Group",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteTarget {
    Create(NodeKind),
    Node(NodeId),
    Group(GroupId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaletteItem {
    pub category: PaletteCategory,
    pub label: String,
    pub detail: String,
    pub target: PaletteTarget,
}

/// What the engine should do once a result is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub enum PaletteCommand {
    Create(NodeKind),
    /// Select and center a node; `highlight` is the byte range of the match
    /// in its plain text.
    FocusNode {
        id: NodeId,
        highlight: Option<Range<usize>>,
    },
    FocusGroup(GroupId),
}

/// Byte range of the first case-insensitive occurrence of `needle` in `hay`.
pub fn find_case_insensitive(hay: &str, needle: &str) -> Option<Range<usize>> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return None;
    }
    for (start, _) in hay.char_indices() {
        let mut folded: Vec<char> = Vec::with_capacity(needle.len());
        for (off, ch) in hay[start..].char_indices() {
            folded.extend(ch.to_lowercase());
            if folded.len() >= needle.len() {
                if folded == needle {
                    return Some(start..start + off + ch.len_utf8());
                }
                break;
            }
            if !needle.starts_with(&folded) {
                break;
            }
        }
    }
    None
}

fn snippet(text: &str) -> String {
    let mut out: String = text.chars().take(SNIPPET_CHARS).collect();
    out.push_str("...");
    out
}

// ─── Match navigator ─────────────────────────────────────────────────────

/// Steps through every node that matched a search, wrapping at both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchNavigator {
    query: String,
    matches: Vec<NodeId>,
    current: usize,
}

impl MatchNavigator {
    /// Navigator over `scene`'s nodes matching `query`, positioned on `at`.
    pub fn new(scene: &SceneGraph, query: &str, at: NodeId) -> Self {
        let matches: Vec<NodeId> = scene
            .nodes()
            .filter(|n| find_case_insensitive(&n.plain_text(), query).is_some())
            .map(|n| n.id)
            .collect();
        let current = matches.iter().position(|id| *id == at).unwrap_or(0);
        Self {
            query: query.to_string(),
            matches,
            current,
        }
    }

    /// Only worth showing when there is somewhere else to go.
    pub fn is_visible(&self) -> bool {
        self.matches.len() > 1
    }

    /// 1-based index and total, for an "i / n" counter.
    pub fn position(&self) -> (usize, usize) {
        (self.current + 1, self.matches.len())
    }

    pub fn current(&self, scene: &SceneGraph) -> Option<PaletteCommand> {
        let id = *self.matches.get(self.current)?;
        let highlight = scene
            .get(id)
            .and_then(|n| find_case_insensitive(&n.plain_text(), &self.query));
        Some(PaletteCommand::FocusNode { id, highlight })
    }

    pub fn next(&mut self, scene: &SceneGraph) -> Option<PaletteCommand> {
        if self.matches.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.matches.len();
        self.current(scene)
    }

    pub fn prev(&mut self, scene: &SceneGraph) -> Option<PaletteCommand> {
        if self.matches.is_empty() {
            return None;
        }
        self.current = (self.current + self.matches.len() - 1) % self.matches.len();
        self.current(scene)
    }
}

// ─── Palette ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct CommandPalette {
    open: bool,
    query: String,
    items: Vec<PaletteItem>,
    selected: usize,
    navigator: Option<MatchNavigator>,
}

impl CommandPalette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn items(&self) -> &[PaletteItem] {
        &self.items
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn toggle(&mut self, scene: &SceneGraph) {
        if self.open {
            self.close();
        } else {
            self.open(scene);
        }
    }

    /// Open with an empty query.
    pub fn open(&mut self, scene: &SceneGraph) {
        self.open = true;
        self.set_query("", scene);
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Rebuild results for a new query. The selection returns to the top.
    pub fn set_query(&mut self, query: &str, scene: &SceneGraph) {
        self.query = query.to_string();
        self.selected = 0;
        let q = query.trim();
        let mut items = Vec::new();

        for kind in NodeKind::ALL {
            if q.is_empty() || find_case_insensitive(kind.label(), q).is_some() {
                items.push(PaletteItem {
                    category: PaletteCategory::Create,
                    label: kind.label().to_string(),
                    detail: format!("New {} node", kind.label().to_lowercase()),
                    target: PaletteTarget::Create(kind),
                });
            }
        }

        if !q.is_empty() {
            for node in scene.nodes() {
                let text = node.plain_text();
                if find_case_insensitive(&text, q).is_some() {
                    items.push(PaletteItem {
                        category: PaletteCategory::Node,
                        label: snippet(&text),
                        detail: "Jump to this node".to_string(),
                        target: PaletteTarget::Node(node.id),
                    });
                }
            }
            for group in &scene.groups {
                if find_case_insensitive(&group.name, q).is_some() {
                    items.push(PaletteItem {
                        category: PaletteCategory::Group,
                        label: group.name.clone(),
                        detail: format!("{} nodes", group.members.len()),
                        target: PaletteTarget::Group(group.id),
                    });
                }
            }
        }

        log::trace!("palette: {} result(s) for {q:?}", items.len());
        self.items = items;
    }

    /// Move the highlighted result by `delta`, wrapping around.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.items.len() as isize;
        if len == 0 {
            return;
        }
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }

    /// Commit the highlighted result and close.
    pub fn confirm(&mut self, scene: &SceneGraph) -> Option<PaletteCommand> {
        let item = self.items.get(self.selected)?.clone();
        self.close();
        let command = match item.target {
            PaletteTarget::Create(kind) => PaletteCommand::Create(kind),
            PaletteTarget::Node(id) => {
                let q = self.query.trim();
                let nav = MatchNavigator::new(scene, q, id);
                let command = nav.current(scene);
                self.navigator = Some(nav);
                command?
            }
            PaletteTarget::Group(id) => PaletteCommand::FocusGroup(id),
        };
        log::debug!("palette: confirmed {command:?}");
        Some(command)
    }

    /// The match navigator from the last node jump, if it should be shown.
    pub fn navigator(&self) -> Option<&MatchNavigator> {
        self.navigator.as_ref().filter(|n| n.is_visible())
    }

    pub fn navigator_mut(&mut self) -> Option<&mut MatchNavigator> {
        self.navigator.as_mut().filter(|n| n.is_visible())
    }

    /// Forget the navigator, e.g. after a click elsewhere on the canvas.
    pub fn clear_navigator(&mut self) {
        self.navigator = None;
    }
}
