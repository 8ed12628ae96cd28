//! Asset pipeline: fetch a garment model, import it from glTF, normalize it,
//! and hand it to the frame loop from a background thread.
//!
//! Remote models are cached on disk under the SHA-256 of their URL, so a
//! second launch does not touch the network.
//!
//! # Invariants
//! - A [`ModelAsset`] always has at least one mesh with at least one triangle.
//! - Node transforms are baked into vertex data; the renderer only applies the
//!   scene-level model transform.

mod fetch;
mod import;
mod loader;
mod model;

#[cfg(test)]
pub(crate) mod test_support;

pub use fetch::{AssetSource, ModelCache, fetch_url};
pub use import::{import_bytes, import_cached, import_path, load_model};
pub use loader::{AssetLoader, LoadOptions, LoadStatus};
pub use model::{MeshData, ModelAsset, ModelSummary, TARGET_MODEL_SIZE};

/// Errors from fetching, importing and normalizing models.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("download of {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("model contains no triangle meshes")]
    NoMeshes,
    #[error("model has zero size and cannot be normalized")]
    Degenerate,
    #[error("asset loader thread exited without a result")]
    LoaderDisconnected,
}
