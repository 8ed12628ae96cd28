//! Paint authoring: applies stroke, tool and history actions to the canvas.
//!
//! # Invariants
//! - Every canvas edit made through the editor is reversible.
//! - One stroke (press to release) or one clear is one undo step.
//! - Edits that change no pixels leave no history entry.

mod editor;
mod history;

pub use editor::{BrushSettings, EditError, PaintEditor};
pub use history::{CanvasPatch, PaintHistory};
