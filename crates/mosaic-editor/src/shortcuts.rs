//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s.
//! The shortcut map lives in Rust so it's shared across WASM and native.
//!
//! The host only forwards keys that are not aimed at an editable node, so
//! Backspace inside a text card never reaches this map.

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Overlay ──
    TogglePalette,
    /// Escape: close the palette, cancel a gesture, clear the selection.
    Dismiss,
    MoveUp,
    MoveDown,
    Confirm,

    // ── Edit ──
    Undo,
    Redo,
    Delete,
    GroupSelection,
    Save,

    // ── View ──
    ResetView,

    // ── Gestures ──
    /// Alt pressed: the next drag draws a cut line.
    ArmCut,
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        // ── Modifier combos first (most specific) ──
        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "s" | "S" => Some(ShortcutAction::Save),
                "g" | "G" => Some(ShortcutAction::GroupSelection),
                "0" => Some(ShortcutAction::ResetView),
                _ => None,
            };
        }

        if shift && !alt {
            return match key {
                "a" | "A" => Some(ShortcutAction::TogglePalette),
                _ => None,
            };
        }

        // ── Single keys ──
        match key {
            "Alt" => Some(ShortcutAction::ArmCut),
            "Escape" => Some(ShortcutAction::Dismiss),
            "ArrowUp" => Some(ShortcutAction::MoveUp),
            "ArrowDown" => Some(ShortcutAction::MoveDown),
            "Enter" => Some(ShortcutAction::Confirm),
            "Delete" | "Backspace" if !alt => Some(ShortcutAction::Delete),
            _ => None,
        }
    }
}
