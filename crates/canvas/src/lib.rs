//! Paint surface: a CPU-side RGBA raster with a small 2D-context style API.
//!
//! The renderer never reads pixels directly from here while drawing; it
//! uploads the dirty region reported by [`PaintCanvas::take_dirty`] before
//! each frame.
//!
//! # Invariants
//! - Pixel buffer length is always `width * height * 4`.
//! - Every mutation is reflected in the dirty region and the revision counter.
//! - Pixel `(x, y)` has its center at `(x + 0.5, y + 0.5)`; a shape covers a
//!   pixel when it contains that center.

mod canvas;
mod raster;
mod rect;
mod tiles;

pub use canvas::{CanvasError, PaintCanvas};
pub use rect::PixelRect;
pub use tiles::{TILE_LINE_WIDTH, TILE_SIZE, TILE_SPACING, tile_texture};

/// Default paint texture edge length.
pub const PAINT_CANVAS_SIZE: u32 = 1024;
