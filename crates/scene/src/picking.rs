use garment_assets::ModelAsset;
use garment_common::Ray;
use glam::{Mat4, Vec2, Vec3};

/// Nearest surface point under a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Ray parameter of the hit, in units of the world-space ray direction.
    pub distance: f32,
    pub point: Vec3,
    pub mesh: usize,
    pub triangle: usize,
    /// Interpolated texture coordinate; `None` when the triangle has no UVs.
    pub uv: Option<Vec2>,
}

/// Moller-Trumbore ray-triangle intersection.
///
/// Returns `(t, u, v)` where `u` and `v` are the barycentric weights of the
/// second and third vertices. Triangles wound clockwise as seen from the ray
/// origin are rejected when `cull_back_faces` is set.
pub fn intersect_triangle(ray: &Ray, tri: [Vec3; 3], cull_back_faces: bool) -> Option<(f32, f32, f32)> {
    const EPSILON: f32 = 1e-7;

    let edge1 = tri[1] - tri[0];
    let edge2 = tri[2] - tri[0];
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    if cull_back_faces {
        if a < EPSILON {
            return None;
        }
    } else if a.abs() < EPSILON {
        return None; // Ray parallel to triangle
    }

    let f = 1.0 / a;
    let s = ray.origin - tri[0];
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t > EPSILON { Some((t, u, v)) } else { None }
}

/// Map a texture coordinate to paint-canvas pixels. The canvas is stored top
/// row first, so `v = 1` is the top edge.
pub fn uv_to_texel(uv: Vec2, width: u32, height: u32) -> Vec2 {
    Vec2::new(uv.x * width as f32, (1.0 - uv.y) * height as f32)
}

/// Nearest front-facing hit on any mesh of `model` placed with `transform`.
pub(crate) fn pick_model(model: &ModelAsset, transform: Mat4, ray: &Ray) -> Option<SurfaceHit> {
    let local = ray.transformed(&transform.inverse());
    local.hit_aabb(&model.bounds())?;

    let mut best: Option<SurfaceHit> = None;
    for (mesh_index, mesh) in model.meshes.iter().enumerate() {
        if local.hit_aabb(&mesh.bounds()).is_none() {
            continue;
        }
        for tri_index in 0..mesh.triangle_count() {
            let Some(idx) = mesh.triangle_indices(tri_index) else {
                continue;
            };
            let tri = idx.map(|k| mesh.positions[k]);
            let Some((t, u, v)) = intersect_triangle(&local, tri, true) else {
                continue;
            };
            if best.is_some_and(|b| b.distance <= t) {
                continue;
            }
            let uv = mesh
                .triangle_uvs(tri_index)
                .map(|uvs| uvs[0] * (1.0 - u - v) + uvs[1] * u + uvs[2] * v);
            best = Some(SurfaceHit {
                distance: t,
                point: ray.at(t),
                mesh: mesh_index,
                triangle: tri_index,
                uv,
            });
        }
    }
    best
}
