use garment_canvas::{CanvasError, PaintCanvas};
use garment_common::Rgba;
use garment_input::Tool;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Bumped whenever [`Session`] changes shape.
pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// Viewer state saved next to the canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub tool: Tool,
    pub color: Rgba,
    /// Camera z position.
    pub camera_distance: f32,
    pub model_yaw: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            tool: Tool::Pencil,
            color: Rgba::WHITE,
            camera_distance: 15.0,
            model_yaw: 0.0,
        }
    }
}

/// A painting session: canvas pixels plus view state.
///
/// The pixel hash is computed at capture time, enabling corruption detection
/// independent of the store manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub pixels: Vec<u8>,
    pub view: ViewState,
    /// Model the painting was made on, if known.
    pub model_source: Option<String>,
    /// SHA-256 of `pixels`, hex encoded.
    pub pixel_hash: String,
}

impl Session {
    pub fn capture(canvas: &PaintCanvas, view: ViewState, model_source: Option<String>) -> Self {
        let pixels = canvas.pixels().to_vec();
        let pixel_hash = pixel_hash(&pixels);
        Self {
            canvas_width: canvas.width(),
            canvas_height: canvas.height(),
            pixels,
            view,
            model_source,
            pixel_hash,
        }
    }

    pub fn compute_pixel_hash(&self) -> String {
        pixel_hash(&self.pixels)
    }

    /// Recompute the pixel hash and compare.
    pub fn verify(&self) -> bool {
        self.compute_pixel_hash() == self.pixel_hash
    }

    /// Rebuild the canvas. Drawing state comes from `view`.
    pub fn restore_canvas(&self) -> Result<PaintCanvas, CanvasError> {
        let mut canvas = PaintCanvas::from_pixels(self.canvas_width, self.canvas_height, self.pixels.clone())?;
        canvas.set_stroke_color(self.view.color);
        Ok(canvas)
    }
}

fn pixel_hash(pixels: &[u8]) -> String {
    format!("{:x}", Sha256::digest(pixels))
}
