use crate::raster::{blend_over, pixel_center, segment_distance_sq};
use crate::rect::PixelRect;
use garment_common::Rgba;
use glam::Vec2;

/// Errors from canvas region and image operations.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error("pixel data has {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("region {0:?} lies outside the canvas")]
    OutOfBounds(PixelRect),
    #[error("canvas dimensions must be non-zero, got {width}x{height}")]
    ZeroSized { width: u32, height: u32 },
}

/// A straight segment of the current path.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    from: Vec2,
    to: Vec2,
}

/// RGBA8 raster with path stroking, circle fills and dirty tracking.
#[derive(Debug, Clone)]
pub struct PaintCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    stroke_color: Rgba,
    fill_color: Rgba,
    line_width: f32,
    segments: Vec<Segment>,
    /// Segments before this index have already been rasterized.
    stroked: usize,
    current: Option<Vec2>,
    dirty: Option<PixelRect>,
    revision: u64,
}

impl PaintCanvas {
    /// A fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        if width == 0 || height == 0 {
            return Err(CanvasError::ZeroSized { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
            stroke_color: Rgba::WHITE,
            fill_color: Rgba::WHITE,
            line_width: 2.0,
            segments: Vec::new(),
            stroked: 0,
            current: None,
            dirty: None,
            revision: 0,
        })
    }

    /// Build a canvas around existing RGBA8 pixel data.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CanvasError> {
        let mut canvas = Self::new(width, height)?;
        canvas.set_pixels(pixels)?;
        Ok(canvas)
    }

    pub fn from_image(image: image::RgbaImage) -> Result<Self, CanvasError> {
        let (width, height) = image.dimensions();
        Self::from_pixels(width, height, image.into_raw())
    }

    pub fn to_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.width, self.height, |x, y| {
            image::Rgba(self.pixel(x, y).0)
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let i = self.offset(x, y);
        Rgba([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Monotonic counter bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True when every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Return and reset the region changed since the previous call.
    pub fn take_dirty(&mut self) -> Option<PixelRect> {
        self.dirty.take()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    /// Mark the whole canvas dirty, e.g. after the GPU texture was recreated.
    pub fn mark_all_dirty(&mut self) {
        self.touch(PixelRect::full(self.width, self.height));
    }

    // -- drawing state --

    pub fn stroke_color(&self) -> Rgba {
        self.stroke_color
    }

    pub fn set_stroke_color(&mut self, color: Rgba) {
        self.stroke_color = color;
    }

    pub fn fill_color(&self) -> Rgba {
        self.fill_color
    }

    pub fn set_fill_color(&mut self, color: Rgba) {
        self.fill_color = color;
    }

    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    /// Non-positive and non-finite widths are ignored.
    pub fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.line_width = width;
        }
    }

    // -- path API --

    /// Discard the current path.
    pub fn begin_path(&mut self) {
        self.segments.clear();
        self.stroked = 0;
        self.current = None;
    }

    pub fn move_to(&mut self, p: Vec2) {
        self.current = Some(p);
    }

    /// Add a segment from the current point. Without a current point this
    /// only sets one.
    pub fn line_to(&mut self, p: Vec2) {
        if let Some(from) = self.current {
            self.segments.push(Segment { from, to: p });
        }
        self.current = Some(p);
    }

    /// Rasterize path segments added since the last stroke with the current
    /// stroke color and line width.
    pub fn stroke(&mut self) {
        let radius = self.line_width * 0.5;
        let color = self.stroke_color;
        let pending: Vec<Segment> = self.segments[self.stroked..].to_vec();
        self.stroked = self.segments.len();
        for seg in pending {
            // Zero-length segments are not stroked.
            if seg.from == seg.to {
                continue;
            }
            self.stroke_segment(seg.from, seg.to, radius, color);
        }
    }

    /// Convenience for a single straight line on its own path.
    pub fn stroke_line(&mut self, from: Vec2, to: Vec2) {
        self.begin_path();
        self.move_to(from);
        self.line_to(to);
        self.stroke();
    }

    // -- fills --

    /// Fill the pixels whose centers lie in the rectangle.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        let Some(rect) = PixelRect::covering(x, y, x + w, y + h, self.width, self.height) else {
            return;
        };
        for py in rect.y..rect.bottom() {
            for px in rect.x..rect.right() {
                let i = self.offset(px, py);
                blend_over(&mut self.pixels[i..i + 4], color);
            }
        }
        self.touch(rect);
    }

    /// Fill a disc with the current fill color.
    pub fn fill_circle(&mut self, center: Vec2, radius: f32) {
        let color = self.fill_color;
        self.for_each_in_circle(center, radius, |px| blend_over(px, color));
    }

    /// Destination-out a disc: covered pixels become fully transparent.
    pub fn erase_circle(&mut self, center: Vec2, radius: f32) {
        self.for_each_in_circle(center, radius, |px| px.copy_from_slice(&[0, 0, 0, 0]));
    }

    /// Make every pixel transparent.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
        self.touch(PixelRect::full(self.width, self.height));
    }

    pub fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let Some(rect) = PixelRect::covering(x, y, x + w, y + h, self.width, self.height) else {
            return;
        };
        for py in rect.y..rect.bottom() {
            let start = self.offset(rect.x, py);
            let end = start + rect.width as usize * 4;
            self.pixels[start..end].fill(0);
        }
        self.touch(rect);
    }

    // -- raw access --

    /// Replace all pixel data.
    pub fn set_pixels(&mut self, pixels: Vec<u8>) -> Result<(), CanvasError> {
        let expected = self.pixels.len();
        if pixels.len() != expected {
            return Err(CanvasError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        self.pixels = pixels;
        self.touch(PixelRect::full(self.width, self.height));
        Ok(())
    }

    /// Copy a region out as tightly packed RGBA8 rows.
    pub fn read_region(&self, rect: PixelRect) -> Result<Vec<u8>, CanvasError> {
        if !rect.fits_within(self.width, self.height) {
            return Err(CanvasError::OutOfBounds(rect));
        }
        let row_bytes = rect.width as usize * 4;
        let mut out = Vec::with_capacity(row_bytes * rect.height as usize);
        for y in rect.y..rect.bottom() {
            let start = self.offset(rect.x, y);
            out.extend_from_slice(&self.pixels[start..start + row_bytes]);
        }
        Ok(out)
    }

    /// Overwrite a region with tightly packed RGBA8 rows.
    pub fn write_region(&mut self, rect: PixelRect, data: &[u8]) -> Result<(), CanvasError> {
        if !rect.fits_within(self.width, self.height) {
            return Err(CanvasError::OutOfBounds(rect));
        }
        let row_bytes = rect.width as usize * 4;
        let expected = row_bytes * rect.height as usize;
        if data.len() != expected {
            return Err(CanvasError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        for (row, y) in (rect.y..rect.bottom()).enumerate() {
            let start = self.offset(rect.x, y);
            self.pixels[start..start + row_bytes]
                .copy_from_slice(&data[row * row_bytes..(row + 1) * row_bytes]);
        }
        self.touch(rect);
        Ok(())
    }

    /// Bounding rect of the pixels that differ between two buffers of a
    /// `width` x `height` canvas. `None` when they are identical.
    pub fn changed_bounds(
        before: &[u8],
        after: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Option<PixelRect>, CanvasError> {
        let expected = width as usize * height as usize * 4;
        for len in [before.len(), after.len()] {
            if len != expected {
                return Err(CanvasError::SizeMismatch {
                    expected,
                    actual: len,
                });
            }
        }
        let row_bytes = width as usize * 4;
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..height {
            let start = y as usize * row_bytes;
            let a = &before[start..start + row_bytes];
            let b = &after[start..start + row_bytes];
            if a == b {
                continue;
            }
            let first = a
                .chunks_exact(4)
                .zip(b.chunks_exact(4))
                .position(|(p, q)| p != q)
                .unwrap_or(0) as u32;
            let last = a
                .chunks_exact(4)
                .zip(b.chunks_exact(4))
                .rposition(|(p, q)| p != q)
                .unwrap_or(0) as u32;
            bounds = Some(match bounds {
                None => (first, y, last, y),
                Some((x0, y0, x1, _)) => (x0.min(first), y0, x1.max(last), y),
            });
        }
        Ok(bounds.map(|(x0, y0, x1, y1)| PixelRect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1)))
    }

    fn stroke_segment(&mut self, from: Vec2, to: Vec2, radius: f32, color: Rgba) {
        let min = from.min(to) - Vec2::splat(radius);
        let max = from.max(to) + Vec2::splat(radius);
        let Some(rect) = PixelRect::covering(min.x, min.y, max.x, max.y, self.width, self.height)
        else {
            return;
        };
        let r_sq = radius * radius;
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                if segment_distance_sq(pixel_center(x, y), from, to) <= r_sq {
                    let i = self.offset(x, y);
                    blend_over(&mut self.pixels[i..i + 4], color);
                }
            }
        }
        self.touch(rect);
    }

    fn for_each_in_circle(&mut self, center: Vec2, radius: f32, mut op: impl FnMut(&mut [u8])) {
        if !(radius > 0.0) {
            return;
        }
        let Some(rect) = PixelRect::covering(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
            self.width,
            self.height,
        ) else {
            return;
        };
        let r_sq = radius * radius;
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                if pixel_center(x, y).distance_squared(center) <= r_sq {
                    let i = self.offset(x, y);
                    op(&mut self.pixels[i..i + 4]);
                }
            }
        }
        self.touch(rect);
    }

    fn touch(&mut self, rect: PixelRect) {
        self.dirty = Some(match self.dirty {
            Some(d) => d.union(&rect),
            None => rect,
        });
        self.revision += 1;
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}
