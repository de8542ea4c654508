//! Node content per kind: defaults, checklist JSON, plain-text extraction,
//! and embedded-media discovery.
//!
//! Content is stored exactly as the host hands it over (rich text markup for
//! text nodes, JSON for checklists, an ISO date-time for timers) so it
//! round-trips byte for byte. Everything here derives views of it.

use crate::model::NodeKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Placeholder shown in a freshly created text node.
pub const TEXT_PLACEHOLDER: &str = "Double click to edit...";

/// Placeholder text of an empty checklist item.
pub const CHECKLIST_PLACEHOLDER: &str = "New Task";

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']*)["']"#).expect("static regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static regex"));

static BLOCK_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</?(div|p|li|h[1-6])\b[^>]*>").expect("static regex")
});

/// One entry of a checklist node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ChecklistDoc {
    #[serde(default)]
    items: Vec<ChecklistItem>,
}

/// Default content for a newly created node of `kind`.
pub fn default_content(kind: NodeKind) -> String {
    match kind {
        NodeKind::Text => TEXT_PLACEHOLDER.to_string(),
        NodeKind::Checklist => encode_checklist(&[ChecklistItem {
            text: CHECKLIST_PLACEHOLDER.to_string(),
            checked: false,
        }]),
        NodeKind::Timer => String::new(),
    }
}

/// Parse checklist content.
///
/// Valid JSON yields its items (placeholder items dropped). Anything else that
/// is not the placeholder becomes a single unchecked item.
pub fn parse_checklist(content: &str) -> Vec<ChecklistItem> {
    if content.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<ChecklistDoc>(content) {
        Ok(doc) => doc
            .items
            .into_iter()
            .filter(|item| item.text != CHECKLIST_PLACEHOLDER)
            .collect(),
        Err(_) if content != CHECKLIST_PLACEHOLDER => vec![ChecklistItem {
            text: content.to_string(),
            checked: false,
        }],
        Err(_) => Vec::new(),
    }
}

/// Encode checklist items in the stored `{"items":[...]}` form.
pub fn encode_checklist(items: &[ChecklistItem]) -> String {
    #[derive(Serialize)]
    struct Doc<'a> {
        items: &'a [ChecklistItem],
    }
    serde_json::to_string(&Doc { items }).unwrap_or_else(|_| r#"{"items":[]}"#.to_string())
}

/// The text a user sees in a node, used by search and export. Placeholders
/// and unusable timer targets read as empty.
pub fn plain_text(kind: NodeKind, content: &str) -> String {
    match kind {
        NodeKind::Text => {
            let text = strip_markup(content);
            if text == TEXT_PLACEHOLDER { String::new() } else { text }
        }
        NodeKind::Checklist => parse_checklist(content)
            .into_iter()
            .map(|item| item.text)
            .collect::<Vec<_>>()
            .join("\n"),
        NodeKind::Timer if is_timer_target(content) => content.trim().to_string(),
        NodeKind::Timer => String::new(),
    }
}

/// Strip tags and decode the handful of entities contenteditable produces.
pub fn strip_markup(markup: &str) -> String {
    let with_breaks = BLOCK_BREAK.replace_all(markup, "\n");
    let text = TAG.replace_all(&with_breaks, "");
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every `<img src>` reference in the content, in document order.
pub fn image_sources(content: &str) -> Vec<String> {
    IMG_SRC
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|src| !src.is_empty())
        .collect()
}

/// Whether timer content holds a usable `YYYY-MM-DDTHH:MM[:SS]` target.
pub fn is_timer_target(content: &str) -> bool {
    let s = content.trim();
    let Some((date, time)) = s.split_once('T') else {
        return false;
    };
    let date_ok = {
        let parts: Vec<&str> = date.split('-').collect();
        parts.len() == 3
            && parts[0].len() == 4
            && parts[1].len() == 2
            && parts[2].len() == 2
            && parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit()))
    };
    let time_ok = {
        let parts: Vec<&str> = time.split(':').collect();
        (2..=3).contains(&parts.len())
            && parts[0].len() == 2
            && parts[1].len() == 2
            && parts[..2].iter().all(|p| p.bytes().all(|b| b.is_ascii_digit()))
    };
    date_ok && time_ok
}
