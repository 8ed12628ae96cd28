use crate::{Action, Tool};

/// Keys with a bound shortcut, decoupled from any windowing crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutKey {
    Char(char),
    Delete,
}

/// Map a key press to an action. `ctrl` is the platform command modifier.
pub fn shortcut_action(key: ShortcutKey, ctrl: bool) -> Action {
    match (key, ctrl) {
        (ShortcutKey::Char(c), false) => match c.to_ascii_lowercase() {
            'p' => Action::SelectTool(Tool::Pencil),
            'e' => Action::SelectTool(Tool::Eraser),
            _ => Action::Noop,
        },
        (ShortcutKey::Char(c), true) => match c.to_ascii_lowercase() {
            'z' => Action::Undo,
            'y' => Action::Redo,
            _ => Action::Noop,
        },
        (ShortcutKey::Delete, _) => Action::ClearCanvas,
    }
}
