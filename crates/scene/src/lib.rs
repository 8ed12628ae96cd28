//! Scene state: the garment model, the background box and the lights.
//!
//! # Invariants
//! - The scene owns no GPU resources; the renderer reads it every frame.
//! - Only the garment can be painted. The background box is never picked.
//! - The garment turns about +Y through its own center.

mod picking;
mod scene;

pub use picking::{SurfaceHit, intersect_triangle, uv_to_texel};
pub use scene::{Lighting, Scene, SceneModel, Skybox};
