use crate::canvas::{CanvasError, PaintCanvas};
use garment_common::Rgba;
use glam::Vec2;

pub const TILE_SIZE: u32 = 512;
pub const TILE_SPACING: u32 = 64;
pub const TILE_LINE_WIDTH: f32 = 2.0;

/// Draw the background grid: white lines every `spacing` pixels on black,
/// from 0 through `size` inclusive in both directions.
pub fn tile_texture(size: u32, spacing: u32, line_width: f32) -> Result<PaintCanvas, CanvasError> {
    let mut canvas = PaintCanvas::new(size, size)?;
    let extent = size as f32;
    canvas.fill_rect(0.0, 0.0, extent, extent, Rgba::BLACK);
    canvas.set_stroke_color(Rgba::WHITE);
    canvas.set_line_width(line_width);

    let step = spacing.max(1) as usize;
    for i in (0..=size).step_by(step) {
        let offset = i as f32;
        canvas.stroke_line(Vec2::new(offset, 0.0), Vec2::new(offset, extent));
        canvas.stroke_line(Vec2::new(0.0, offset), Vec2::new(extent, offset));
    }
    canvas.begin_path();
    tracing::debug!(size, spacing, "generated tile texture");
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_layout() {
        let tex = tile_texture(TILE_SIZE, TILE_SPACING, TILE_LINE_WIDTH).unwrap();
        assert_eq!(tex.size(), (512, 512));

        // Lines straddle each multiple of 64.
        assert_eq!(tex.pixel(0, 200), Rgba::WHITE);
        assert_eq!(tex.pixel(63, 200), Rgba::WHITE);
        assert_eq!(tex.pixel(64, 200), Rgba::WHITE);
        assert_eq!(tex.pixel(511, 200), Rgba::WHITE);
        assert_eq!(tex.pixel(200, 128), Rgba::WHITE);

        // Cell interiors stay black and opaque.
        assert_eq!(tex.pixel(32, 32), Rgba::BLACK);
        assert_eq!(tex.pixel(62, 200), Rgba::BLACK);
        assert_eq!(tex.pixel(65, 100), Rgba::BLACK);
    }

    #[test]
    fn grid_is_fully_opaque() {
        let tex = tile_texture(64, 16, 2.0).unwrap();
        assert!(tex.pixels().chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn zero_spacing_does_not_loop_forever() {
        let tex = tile_texture(8, 0, 1.0).unwrap();
        assert_eq!(tex.size(), (8, 8));
    }
}
