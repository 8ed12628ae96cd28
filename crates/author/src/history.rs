use garment_canvas::{CanvasError, PaintCanvas, PixelRect};
use std::collections::VecDeque;

/// Pixels of one rectangle before and after an edit.
///
/// Applying the patch forward writes `after`; its inverse writes `before`.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasPatch {
    pub rect: PixelRect,
    pub before: Vec<u8>,
    pub after: Vec<u8>,
}

impl CanvasPatch {
    /// Diff two full-canvas buffers. `None` when nothing changed.
    pub fn diff(before: &[u8], after: &PaintCanvas) -> Result<Option<Self>, CanvasError> {
        let (width, height) = after.size();
        let Some(rect) = PaintCanvas::changed_bounds(before, after.pixels(), width, height)? else {
            return Ok(None);
        };
        Ok(Some(Self {
            rect,
            before: crop(before, width, rect),
            after: after.read_region(rect)?,
        }))
    }

    pub fn inverse(&self) -> Self {
        Self {
            rect: self.rect,
            before: self.after.clone(),
            after: self.before.clone(),
        }
    }

    pub fn apply(&self, canvas: &mut PaintCanvas) -> Result<(), CanvasError> {
        canvas.write_region(self.rect, &self.after)
    }

    /// Bytes held by the patch.
    pub fn weight(&self) -> usize {
        self.before.len() + self.after.len()
    }
}

fn crop(pixels: &[u8], width: u32, rect: PixelRect) -> Vec<u8> {
    let row_bytes = rect.width as usize * 4;
    let mut out = Vec::with_capacity(row_bytes * rect.height as usize);
    for y in rect.y..rect.bottom() {
        let start = (y as usize * width as usize + rect.x as usize) * 4;
        out.extend_from_slice(&pixels[start..start + row_bytes]);
    }
    out
}

/// Bounded undo/redo stacks of canvas patches.
#[derive(Debug)]
pub struct PaintHistory {
    undo_stack: VecDeque<CanvasPatch>,
    redo_stack: Vec<CanvasPatch>,
    depth: usize,
}

impl PaintHistory {
    /// History keeping at most `depth` undo steps (at least one).
    pub fn new(depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            depth: depth.max(1),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Record an edit that was already applied. Clears the redo stack.
    pub fn push(&mut self, patch: CanvasPatch) {
        self.redo_stack.clear();
        self.undo_stack.push_back(patch);
        while self.undo_stack.len() > self.depth {
            self.undo_stack.pop_front();
        }
    }

    /// Undo the last edit. Returns true if an edit was undone.
    pub fn undo(&mut self, canvas: &mut PaintCanvas) -> Result<bool, CanvasError> {
        let Some(patch) = self.undo_stack.pop_back() else {
            return Ok(false);
        };
        if let Err(e) = patch.inverse().apply(canvas) {
            self.undo_stack.push_back(patch);
            return Err(e);
        }
        self.redo_stack.push(patch);
        Ok(true)
    }

    /// Redo the last undone edit. Returns true if an edit was redone.
    pub fn redo(&mut self, canvas: &mut PaintCanvas) -> Result<bool, CanvasError> {
        let Some(patch) = self.redo_stack.pop() else {
            return Ok(false);
        };
        if let Err(e) = patch.apply(canvas) {
            self.redo_stack.push(patch);
            return Err(e);
        }
        self.undo_stack.push_back(patch);
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Total bytes held by both stacks.
    pub fn weight(&self) -> usize {
        self.undo_stack.iter().chain(&self.redo_stack).map(CanvasPatch::weight).sum()
    }
}

impl Default for PaintHistory {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garment_common::Rgba;

    fn red_square(canvas: &mut PaintCanvas, x: f32) -> CanvasPatch {
        let before = canvas.pixels().to_vec();
        canvas.fill_rect(x, 1.0, 2.0, 2.0, Rgba::rgb(255, 0, 0));
        CanvasPatch::diff(&before, canvas).unwrap().unwrap()
    }

    #[test]
    fn diff_covers_changed_pixels_only() {
        let mut canvas = PaintCanvas::new(8, 8).unwrap();
        let patch = red_square(&mut canvas, 3.0);
        assert_eq!(patch.rect, PixelRect::new(3, 1, 2, 2));
        assert!(patch.before.iter().all(|&b| b == 0));
        assert_eq!(&patch.after[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn no_change_no_patch() {
        let canvas = PaintCanvas::new(4, 4).unwrap();
        let before = canvas.pixels().to_vec();
        assert!(CanvasPatch::diff(&before, &canvas).unwrap().is_none());
    }

    #[test]
    fn undo_redo_restores_pixels() {
        let mut canvas = PaintCanvas::new(8, 8).unwrap();
        let mut history = PaintHistory::new(8);
        let patch = red_square(&mut canvas, 0.0);
        history.push(patch);
        let painted = canvas.pixels().to_vec();

        assert!(history.undo(&mut canvas).unwrap());
        assert!(canvas.is_blank());
        assert!(history.can_redo());

        assert!(history.redo(&mut canvas).unwrap());
        assert_eq!(canvas.pixels(), &painted[..]);
        assert!(!history.redo(&mut canvas).unwrap());
    }

    #[test]
    fn depth_drops_oldest() {
        let mut canvas = PaintCanvas::new(16, 4).unwrap();
        let mut history = PaintHistory::new(2);
        for i in 0..3 {
            let patch = red_square(&mut canvas, i as f32 * 4.0);
            history.push(patch);
        }
        assert_eq!(history.undo_count(), 2);
        history.undo(&mut canvas).unwrap();
        history.undo(&mut canvas).unwrap();
        assert!(!history.undo(&mut canvas).unwrap());
        // The first square could not be undone.
        assert_eq!(canvas.pixel(0, 1), Rgba::rgb(255, 0, 0));
        assert_eq!(canvas.pixel(4, 1), Rgba::TRANSPARENT);
    }

    #[test]
    fn push_clears_redo() {
        let mut canvas = PaintCanvas::new(8, 8).unwrap();
        let mut history = PaintHistory::default();
        let patch = red_square(&mut canvas, 0.0);
        history.push(patch);
        history.undo(&mut canvas).unwrap();
        assert_eq!(history.redo_count(), 1);
        let patch = red_square(&mut canvas, 4.0);
        history.push(patch);
        assert!(!history.can_redo());
        assert!(history.weight() > 0);
    }

    #[test]
    fn failed_undo_keeps_entry() {
        let mut canvas = PaintCanvas::new(8, 8).unwrap();
        let mut history = PaintHistory::default();
        let patch = red_square(&mut canvas, 4.0);
        history.push(patch);
        let mut smaller = PaintCanvas::new(4, 4).unwrap();
        assert!(history.undo(&mut smaller).is_err());
        assert_eq!(history.undo_count(), 1);
    }
}
