use crate::history::{CanvasPatch, PaintHistory};
use garment_canvas::{CanvasError, PaintCanvas};
use garment_common::Rgba;
use garment_input::{Action, Tool};
use glam::Vec2;

/// Errors from edit operations.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// Brush geometry in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushSettings {
    pub line_width: f32,
    pub eraser_radius: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            line_width: 2.0,
            eraser_radius: 10.0,
        }
    }
}

/// Applies paint actions to a [`PaintCanvas`] and records them for undo.
///
/// A stroke snapshots the canvas when it begins and is diffed into a single
/// [`CanvasPatch`] when it ends.
#[derive(Debug)]
pub struct PaintEditor {
    tool: Tool,
    color: Rgba,
    brush: BrushSettings,
    history: PaintHistory,
    /// Full canvas pixels captured at stroke begin.
    stroke_start: Option<Vec<u8>>,
}

impl PaintEditor {
    pub fn new(brush: BrushSettings, color: Rgba, history_depth: usize) -> Self {
        Self {
            tool: Tool::default(),
            color,
            brush,
            history: PaintHistory::new(history_depth),
            stroke_start: None,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn brush(&self) -> BrushSettings {
        self.brush
    }

    pub fn history(&self) -> &PaintHistory {
        &self.history
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke_start.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Forget all history, e.g. after the canvas was replaced wholesale.
    pub fn reset_history(&mut self) {
        self.stroke_start = None;
        self.history.clear();
    }

    /// Apply one action. Returns true if the editor handled it; camera and
    /// model actions are left to the caller.
    pub fn apply(&mut self, action: Action, canvas: &mut PaintCanvas) -> Result<bool, EditError> {
        match action {
            Action::BeginStroke(p) => self.begin_stroke(p, canvas)?,
            Action::ContinueStroke(p) => self.continue_stroke(p, canvas),
            Action::EndStroke => self.end_stroke(canvas)?,
            Action::SelectTool(tool) => {
                tracing::debug!("tool: {tool}");
                self.tool = tool;
            }
            Action::SetColor(color) => {
                self.color = color;
                canvas.set_stroke_color(color);
            }
            Action::ClearCanvas => self.clear(canvas)?,
            Action::Undo => {
                self.end_stroke(canvas)?;
                if !self.history.undo(canvas)? {
                    tracing::debug!("nothing to undo");
                }
            }
            Action::Redo => {
                self.end_stroke(canvas)?;
                if !self.history.redo(canvas)? {
                    tracing::debug!("nothing to redo");
                }
            }
            Action::Zoom(_) | Action::RotateModel(_) | Action::Noop => return Ok(false),
        }
        Ok(true)
    }

    fn begin_stroke(&mut self, p: Vec2, canvas: &mut PaintCanvas) -> Result<(), EditError> {
        // A stroke that never saw its release is committed first.
        self.end_stroke(canvas)?;
        self.stroke_start = Some(canvas.pixels().to_vec());
        canvas.set_stroke_color(self.color);
        canvas.set_line_width(self.brush.line_width);
        canvas.begin_path();
        canvas.move_to(p);
        Ok(())
    }

    fn continue_stroke(&mut self, p: Vec2, canvas: &mut PaintCanvas) {
        if self.stroke_start.is_none() {
            tracing::debug!("stroke sample without an open stroke ignored");
            return;
        }
        match self.tool {
            Tool::Pencil => {
                canvas.line_to(p);
                canvas.stroke();
            }
            Tool::Eraser => {
                canvas.begin_path();
                canvas.erase_circle(p, self.brush.eraser_radius);
            }
        }
    }

    fn end_stroke(&mut self, canvas: &mut PaintCanvas) -> Result<(), EditError> {
        let Some(before) = self.stroke_start.take() else {
            return Ok(());
        };
        self.commit(&before, canvas)
    }

    fn clear(&mut self, canvas: &mut PaintCanvas) -> Result<(), EditError> {
        self.end_stroke(canvas)?;
        let before = canvas.pixels().to_vec();
        canvas.clear();
        self.commit(&before, canvas)
    }

    fn commit(&mut self, before: &[u8], canvas: &PaintCanvas) -> Result<(), EditError> {
        match CanvasPatch::diff(before, canvas) {
            Ok(Some(patch)) => {
                tracing::debug!("edit recorded: {:?}", patch.rect);
                self.history.push(patch);
                Ok(())
            }
            Ok(None) => Ok(()),
            // The canvas was replaced mid-stroke; the snapshot no longer applies.
            Err(CanvasError::SizeMismatch { .. }) => {
                tracing::warn!("canvas size changed during an edit, history entry dropped");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for PaintEditor {
    fn default() -> Self {
        Self::new(BrushSettings::default(), Rgba::WHITE, 64)
    }
}
