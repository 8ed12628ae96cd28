//! Gesture input: raw pointer, touch, wheel and key events mapped to actions.
//!
//! # Invariants
//! - The paint editor, camera and scene consume actions, never raw events.
//! - The controller never raycasts; hit tests go through [`SurfacePicker`].

mod gesture;
mod keys;

pub use gesture::{GestureController, GestureSettings, PIXELS_PER_LINE, SurfacePicker, WheelDelta};
pub use keys::{ShortcutKey, shortcut_action};

use garment_common::Rgba;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Active paint tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pencil,
    Eraser,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::Pencil, Tool::Eraser];

    pub fn id(self) -> &'static str {
        match self {
            Tool::Pencil => "pencil",
            Tool::Eraser => "eraser",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tool::Pencil => "Pencil",
            Tool::Eraser => "Eraser",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown tool: {0}")]
pub struct UnknownTool(pub String);

impl FromStr for Tool {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pencil" => Ok(Tool::Pencil),
            "eraser" => Ok(Tool::Eraser),
            other => Err(UnknownTool(other.to_string())),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A high-level action produced by gestures, shortcuts or the UI panel.
///
/// Stroke positions are paint-canvas texels, already mapped from UV space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Move the camera along its view axis. Positive moves away.
    Zoom(f32),
    /// Turn the garment about its vertical axis, in radians.
    RotateModel(f32),
    BeginStroke(Vec2),
    ContinueStroke(Vec2),
    EndStroke,
    SelectTool(Tool),
    SetColor(Rgba),
    ClearCanvas,
    Undo,
    Redo,
    /// Input that is recognized but bound to nothing.
    Noop,
}

impl Action {
    /// Whether the action edits the paint canvas or its history.
    pub fn is_paint(&self) -> bool {
        matches!(
            self,
            Action::BeginStroke(_)
                | Action::ContinueStroke(_)
                | Action::EndStroke
                | Action::ClearCanvas
                | Action::Undo
                | Action::Redo
        )
    }
}
