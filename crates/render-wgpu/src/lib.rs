//! wgpu render backend for the paint viewer.
//!
//! Renders the tiled background box and the garment textured with the paint
//! canvas. The camera sits on the +Z axis and only moves along it.
//!
//! # Invariants
//! - Renderer never mutates scene or canvas pixels.
//! - Only the dirty canvas region is uploaded each frame.
//! - Paint texture texel `(x, y)` is canvas pixel `(x, y)`; the garment samples
//!   it at `(u, 1 - v)`.

mod camera;
mod gpu;
mod mesh;
mod shaders;

pub use camera::ZoomCamera;
pub use gpu::{RenderError, WgpuRenderer};
