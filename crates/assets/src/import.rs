use crate::fetch::{AssetSource, ModelCache};
use crate::model::{MeshData, ModelAsset};
use crate::AssetError;
use glam::{Mat3, Mat4, Vec2, Vec3};
use std::path::Path;

/// Fetch (or read), import and normalize a model in one call. This is what
/// the background loader runs.
pub fn load_model(
    source: &AssetSource,
    cache: Option<&ModelCache>,
    target_size: f32,
) -> Result<ModelAsset, AssetError> {
    let mut model = match (source, cache) {
        (AssetSource::Url(url), Some(cache)) => import_cached(cache, url, &source.display_name())?,
        (AssetSource::Url(url), None) => {
            import_bytes(&crate::fetch::fetch_url(url)?, &source.display_name())?
        }
        (AssetSource::Path(path), _) => import_path(path)?,
    };
    let scale = model.normalize(target_size)?;
    tracing::info!("loaded {} (scale {scale:.4})", model.summary());
    Ok(model)
}

/// Import a cached model. An entry that no longer imports is evicted and
/// downloaded again, once; a fresh download that fails to import is evicted
/// too so the next launch starts clean.
pub fn import_cached(cache: &ModelCache, url: &str, name: &str) -> Result<ModelAsset, AssetError> {
    if let Some(bytes) = cache.get(url) {
        match import_bytes(&bytes, name) {
            Ok(model) => {
                tracing::info!("cache hit for {url}");
                return Ok(model);
            }
            Err(e) => {
                tracing::warn!("cached copy of {url} is unreadable ({e}), downloading again");
                cache.evict(url)?;
            }
        }
    }
    let bytes = cache.fetch(url)?;
    import_bytes(&bytes, name).inspect_err(|_| {
        if let Err(e) = cache.evict(url) {
            tracing::warn!("failed to evict {url} from the cache: {e}");
        }
    })
}

/// Import a GLB or self-contained glTF held in memory.
pub fn import_bytes(bytes: &[u8], name: &str) -> Result<ModelAsset, AssetError> {
    let (doc, buffers, _images) = gltf::import_slice(bytes)?;
    collect_model(&doc, &buffers, name)
}

/// Import from disk; external buffers are resolved relative to the file.
pub fn import_path(path: impl AsRef<Path>) -> Result<ModelAsset, AssetError> {
    let path = path.as_ref();
    let (doc, buffers, _images) = gltf::import(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".into());
    collect_model(&doc, &buffers, &name)
}

fn collect_model(
    doc: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    name: &str,
) -> Result<ModelAsset, AssetError> {
    let mut meshes = Vec::new();
    let scenes: Vec<gltf::Scene> = match doc.default_scene() {
        Some(scene) => vec![scene],
        None => doc.scenes().collect(),
    };
    for scene in scenes {
        for node in scene.nodes() {
            visit_node(&node, Mat4::IDENTITY, buffers, &mut meshes);
        }
    }
    tracing::debug!(meshes = meshes.len(), "collected glTF primitives for {name}");
    ModelAsset::new(name, meshes)
}

fn visit_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshData>,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh.name().unwrap_or("mesh").to_string();
        for (i, prim) in mesh.primitives().enumerate() {
            if prim.mode() != gltf::mesh::Mode::Triangles {
                tracing::warn!("skipping non-triangle primitive {i} of {mesh_name}");
                continue;
            }
            if let Some(data) = read_primitive(&prim, buffers, world, format!("{mesh_name}_{i}")) {
                out.push(data);
            }
        }
    }

    for child in node.children() {
        visit_node(&child, world, buffers, out);
    }
}

fn read_primitive(
    prim: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    world: Mat4,
    name: String,
) -> Option<MeshData> {
    let reader = prim.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

    let positions: Vec<Vec3> = reader
        .read_positions()?
        .map(|p| world.transform_point3(Vec3::from(p)))
        .collect();

    let mut indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    indices.truncate(indices.len() - indices.len() % 3);

    // Mirroring transforms flip the winding.
    if world.determinant() < 0.0 {
        for tri in indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }

    let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
    let normals: Option<Vec<Vec3>> = reader.read_normals().map(|ns| {
        ns.map(|n| (normal_matrix * Vec3::from(n)).try_normalize().unwrap_or(Vec3::Z))
            .collect()
    });

    let uvs: Option<Vec<Vec2>> = reader
        .read_tex_coords(0)
        .map(|tc| tc.into_f32().map(Vec2::from).collect());

    let mut mesh = MeshData {
        name,
        positions,
        normals: Vec::new(),
        uvs: uvs.filter(|uv: &Vec<Vec2>| !uv.is_empty()),
        indices,
    };
    if mesh.uvs.as_ref().is_some_and(|uv| uv.len() != mesh.positions.len()) {
        tracing::warn!("ignoring mismatched TEXCOORD_0 on {}", mesh.name);
        mesh.uvs = None;
    }
    mesh.retain_valid_triangles();
    match normals {
        Some(ns) if ns.len() == mesh.positions.len() => mesh.normals = ns,
        _ => mesh.compute_normals(),
    }
    Some(mesh)
}
