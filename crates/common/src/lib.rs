//! Shared types for the garment painter.
//!
//! Everything here is plain data: no GPU handles, no window state. Crates
//! further up the stack (scene, input, renderer) agree on these types.

pub mod color;
pub mod config;
pub mod geometry;
pub mod types;

pub use color::Rgba;
pub use config::{ConfigError, ViewerConfig};
pub use geometry::{Aabb, Ray};
pub use types::Transform;
