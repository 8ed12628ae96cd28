use crate::AssetError;
use garment_common::Aabb;
use glam::{Vec2, Vec3};
use std::fmt;

/// Edge length of the normalized model's largest dimension.
pub const TARGET_MODEL_SIZE: f32 = 10.0;

/// One triangle-list mesh with node transforms already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// First texture coordinate set. `None` means the mesh cannot be painted.
    pub uvs: Option<Vec<Vec2>>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_paintable(&self) -> bool {
        self.uvs.is_some()
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// Vertex positions of triangle `i`.
    pub fn triangle(&self, i: usize) -> Option<[Vec3; 3]> {
        let idx = self.triangle_indices(i)?;
        Some(idx.map(|k| self.positions[k]))
    }

    /// Texture coordinates of triangle `i`, if the mesh has them for all three corners.
    pub fn triangle_uvs(&self, i: usize) -> Option<[Vec2; 3]> {
        let [a, b, c] = self.triangle_indices(i)?;
        let uvs = self.uvs.as_ref()?;
        Some([*uvs.get(a)?, *uvs.get(b)?, *uvs.get(c)?])
    }

    pub fn triangle_indices(&self, i: usize) -> Option<[usize; 3]> {
        let tri = self.indices.get(i * 3..i * 3 + 3)?;
        let idx = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if idx.iter().any(|&k| k >= self.positions.len()) {
            return None;
        }
        Some(idx)
    }

    /// Area-weighted smooth normals. Vertices not used by any triangle get +Z.
    pub fn compute_normals(&mut self) {
        let mut acc = vec![Vec3::ZERO; self.positions.len()];
        for i in 0..self.triangle_count() {
            let Some([a, b, c]) = self.triangle_indices(i) else {
                continue;
            };
            let (pa, pb, pc) = (self.positions[a], self.positions[b], self.positions[c]);
            let face = (pb - pa).cross(pc - pa);
            acc[a] += face;
            acc[b] += face;
            acc[c] += face;
        }
        self.normals = acc
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Z))
            .collect();
    }

    /// Drop triangles referencing missing vertices.
    pub(crate) fn retain_valid_triangles(&mut self) {
        let n = self.positions.len() as u32;
        let mut kept = Vec::with_capacity(self.indices.len());
        for tri in self.indices.chunks_exact(3) {
            if tri.iter().all(|&i| i < n) {
                kept.extend_from_slice(tri);
            }
        }
        self.indices = kept;
    }
}

/// An imported, paint-ready garment model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAsset {
    pub name: String,
    pub meshes: Vec<MeshData>,
    bounds: Aabb,
}

impl ModelAsset {
    /// Wrap meshes, discarding empty ones.
    pub fn new(name: impl Into<String>, meshes: Vec<MeshData>) -> Result<Self, AssetError> {
        let meshes: Vec<MeshData> = meshes
            .into_iter()
            .filter(|m| m.triangle_count() > 0)
            .map(|mut m| {
                if m.uvs.as_ref().is_some_and(|uv| uv.len() != m.positions.len()) {
                    tracing::warn!("ignoring mismatched texture coordinates on {}", m.name);
                    m.uvs = None;
                }
                m
            })
            .collect();
        if meshes.is_empty() {
            return Err(AssetError::NoMeshes);
        }
        let bounds = meshes
            .iter()
            .fold(Aabb::empty(), |acc, m| acc.union(&m.bounds()));
        Ok(Self {
            name: name.into(),
            meshes,
            bounds,
        })
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn is_paintable(&self) -> bool {
        self.meshes.iter().any(MeshData::is_paintable)
    }

    /// Scale uniformly so the largest dimension equals `target_size` and move
    /// the bounding-box center to the origin. Returns the scale factor.
    pub fn normalize(&mut self, target_size: f32) -> Result<f32, AssetError> {
        let max_dim = self.bounds.max_dimension();
        if !(max_dim > 0.0) || !max_dim.is_finite() {
            return Err(AssetError::Degenerate);
        }
        let scale = target_size / max_dim;
        let center = self.bounds.center();
        for mesh in &mut self.meshes {
            for p in &mut mesh.positions {
                *p = (*p - center) * scale;
            }
        }
        self.bounds = Aabb::new(
            (self.bounds.min - center) * scale,
            (self.bounds.max - center) * scale,
        );
        tracing::debug!(scale, ?center, "normalized model {}", self.name);
        Ok(scale)
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            name: self.name.clone(),
            mesh_count: self.meshes.len(),
            paintable_meshes: self.meshes.iter().filter(|m| m.is_paintable()).count(),
            vertex_count: self.meshes.iter().map(MeshData::vertex_count).sum(),
            triangle_count: self.meshes.iter().map(MeshData::triangle_count).sum(),
            bounds: self.bounds,
        }
    }
}

/// Counts and extents of a model, for logs and the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub name: String,
    pub mesh_count: usize,
    pub paintable_meshes: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub bounds: Aabb,
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.bounds.size();
        write!(
            f,
            "Model '{}': meshes={} (paintable={}) vertices={} triangles={} size=({:.2}, {:.2}, {:.2})",
            self.name,
            self.mesh_count,
            self.paintable_meshes,
            self.vertex_count,
            self.triangle_count,
            s.x,
            s.y,
            s.z
        )
    }
}
