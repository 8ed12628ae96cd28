use bytemuck::{Pod, Zeroable};
use garment_assets::MeshData;
use glam::{Vec2, Vec3};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Box of the given full extents centered at the origin, wound
/// counter-clockwise as seen from outside. Every face maps the whole texture.
pub(crate) fn box_mesh(size: Vec3) -> (Vec<Vertex>, Vec<u16>) {
    let h = size * 0.5;
    // (normal, right, up) per face, as seen from outside.
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, right, up) in faces {
        let base = vertices.len() as u16;
        for (sx, sy) in corners {
            let p = (normal + right * sx + up * sy) * h;
            vertices.push(Vertex {
                position: p.to_array(),
                normal: normal.to_array(),
                // Texture rows run top to bottom.
                uv: [(sx + 1.0) * 0.5, (1.0 - sy) * 0.5],
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    (vertices, indices)
}

/// Interleave a mesh's attributes. Meshes without UVs sample texel (0, 0).
pub(crate) fn mesh_vertices(mesh: &MeshData) -> Vec<Vertex> {
    (0..mesh.positions.len())
        .map(|i| Vertex {
            position: mesh.positions[i].to_array(),
            normal: mesh.normals.get(i).copied().unwrap_or(Vec3::Y).to_array(),
            uv: mesh
                .uvs
                .as_ref()
                .and_then(|uvs| uvs.get(i).copied())
                .unwrap_or(Vec2::new(0.0, 1.0))
                .to_array(),
        })
        .collect()
}
