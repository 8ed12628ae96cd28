use crate::picking::{SurfaceHit, pick_model};
use garment_assets::ModelAsset;
use garment_common::{Aabb, Ray, Transform};
use glam::{Mat4, Vec2, Vec3};

/// Background box seen from the inside, textured with the tile grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Skybox {
    /// Full extents along X, Y and Z.
    pub size: Vec3,
}

impl Default for Skybox {
    fn default() -> Self {
        Self {
            size: Vec3::new(20.0, 10.0, 20.0),
        }
    }
}

impl Skybox {
    pub fn bounds(&self) -> Aabb {
        Aabb::new(-self.size * 0.5, self.size * 0.5)
    }
}

/// One ambient light plus one directional light aimed at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    pub directional_color: Vec3,
    pub directional_intensity: f32,
    pub directional_position: Vec3,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::ONE,
            ambient_intensity: 0.6,
            directional_color: Vec3::ONE,
            directional_intensity: 1.0,
            directional_position: Vec3::new(10.0, 10.0, 10.0),
        }
    }
}

impl Lighting {
    /// Unit vector from a lit surface toward the directional light.
    pub fn light_direction(&self) -> Vec3 {
        self.directional_position.try_normalize().unwrap_or(Vec3::Y)
    }
}

/// The garment together with its turntable angle.
#[derive(Debug, Clone)]
pub struct SceneModel {
    pub asset: ModelAsset,
    pub yaw: f32,
}

impl SceneModel {
    pub fn transform(&self) -> Transform {
        Transform::from_yaw(self.yaw)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    model: Option<SceneModel>,
    /// Yaw to apply when a model arrives (e.g. restored from a session).
    initial_yaw: f32,
    pub skybox: Skybox,
    pub lighting: Lighting,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> Option<&SceneModel> {
        self.model.as_ref()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Install a freshly loaded model, replacing any previous one.
    pub fn set_model(&mut self, asset: ModelAsset) {
        tracing::info!("scene model set: {}", asset.summary());
        self.model = Some(SceneModel {
            asset,
            yaw: self.initial_yaw,
        });
    }

    pub fn model_yaw(&self) -> f32 {
        self.model.as_ref().map_or(self.initial_yaw, |m| m.yaw)
    }

    /// Set the yaw now, or for the next model if none is loaded yet.
    pub fn set_model_yaw(&mut self, yaw: f32) {
        self.initial_yaw = yaw;
        if let Some(model) = &mut self.model {
            model.yaw = yaw;
        }
    }

    /// Turn the garment about +Y. No-op until a model is loaded.
    pub fn rotate_model(&mut self, delta: f32) {
        if let Some(model) = &mut self.model {
            model.yaw += delta;
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.model
            .as_ref()
            .map_or(Mat4::IDENTITY, |m| m.transform().matrix())
    }

    /// Nearest garment surface under the ray.
    pub fn pick(&self, ray: &Ray) -> Option<SurfaceHit> {
        let model = self.model.as_ref()?;
        pick_model(&model.asset, model.transform().matrix(), ray)
    }

    /// Texture coordinate under the ray, if the nearest garment surface there
    /// has one.
    pub fn pick_uv(&self, ray: &Ray) -> Option<Vec2> {
        self.pick(ray)?.uv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garment_assets::MeshData;

    /// 2x2 quad facing +Z at z = 0 with UV (0,0) at the top-left corner.
    fn quad_model() -> ModelAsset {
        ModelAsset::new(
            "quad",
            vec![MeshData {
                name: "front".into(),
                positions: vec![
                    Vec3::new(-1.0, -1.0, 0.0),
                    Vec3::new(1.0, -1.0, 0.0),
                    Vec3::new(1.0, 1.0, 0.0),
                    Vec3::new(-1.0, 1.0, 0.0),
                ],
                normals: vec![Vec3::Z; 4],
                uvs: Some(vec![
                    Vec2::new(0.0, 1.0),
                    Vec2::new(1.0, 1.0),
                    Vec2::new(1.0, 0.0),
                    Vec2::new(0.0, 0.0),
                ]),
                indices: vec![0, 1, 2, 0, 2, 3],
            }],
        )
        .unwrap()
    }

    fn ray_at(x: f32, y: f32) -> Ray {
        Ray::new(Vec3::new(x, y, 15.0), Vec3::NEG_Z)
    }

    #[test]
    fn defaults_match_viewer_layout() {
        let scene = Scene::new();
        assert_eq!(scene.skybox.bounds().size(), Vec3::new(20.0, 10.0, 20.0));
        assert_eq!(scene.lighting.ambient_intensity, 0.6);
        assert!((scene.lighting.light_direction().length() - 1.0).abs() < 1e-6);
        assert!(!scene.has_model());
    }

    #[test]
    fn pick_without_model_is_none() {
        let scene = Scene::new();
        assert!(scene.pick_uv(&ray_at(0.0, 0.0)).is_none());
    }

    #[test]
    fn pick_interpolates_uv() {
        let mut scene = Scene::new();
        scene.set_model(quad_model());

        let uv = scene.pick_uv(&ray_at(0.0, 0.0)).unwrap();
        assert!((uv - Vec2::new(0.5, 0.5)).length() < 1e-5);

        let uv = scene.pick_uv(&ray_at(0.5, 0.5)).unwrap();
        assert!((uv - Vec2::new(0.75, 0.25)).length() < 1e-5);

        let hit = scene.pick(&ray_at(0.0, 0.0)).unwrap();
        assert!((hit.distance - 15.0).abs() < 1e-4);
        assert!(hit.point.z.abs() < 1e-4);
    }

    #[test]
    fn background_is_not_paintable() {
        let mut scene = Scene::new();
        scene.set_model(quad_model());
        assert!(scene.pick_uv(&ray_at(5.0, 0.0)).is_none());
    }

    #[test]
    fn rotated_model_shows_back_face() {
        let mut scene = Scene::new();
        scene.set_model(quad_model());
        scene.rotate_model(std::f32::consts::PI);
        // Front face now points away from the camera and is culled.
        assert!(scene.pick_uv(&ray_at(0.0, 0.0)).is_none());
    }

    #[test]
    fn quarter_turn_moves_hit_point() {
        let mut scene = Scene::new();
        scene.set_model(quad_model());
        scene.rotate_model(0.3);
        let hit = scene.pick(&ray_at(0.0, 0.0)).unwrap();
        // Pivot is the model center, so the center stays under the camera.
        assert!(hit.point.truncate().length() < 1e-4);
        assert!((scene.model_yaw() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn yawed_model_maps_hit_to_rotated_texel() {
        let mut scene = Scene::new();
        scene.set_model(quad_model());
        let ray = ray_at(0.5, 0.5);

        let texel = crate::uv_to_texel(scene.pick_uv(&ray).unwrap(), 1024, 1024);
        assert!((texel - Vec2::new(768.0, 768.0)).length() < 0.05);

        // An eighth turn foreshortens the quad; the same screen point now lies
        // further along its local x axis (0.5 / cos 45 deg).
        scene.set_model_yaw(std::f32::consts::FRAC_PI_4);
        let uv = scene.pick_uv(&ray).unwrap();
        let expected_u = (0.5 / std::f32::consts::FRAC_1_SQRT_2 + 1.0) * 0.5;
        assert!((uv - Vec2::new(expected_u, 0.25)).length() < 1e-4);
        let texel = crate::uv_to_texel(uv, 1024, 1024);
        assert!((texel.x - expected_u * 1024.0).abs() < 0.05);
        assert!((texel.y - 768.0).abs() < 0.05);
        assert!(texel.x > 870.0);
    }

    #[test]
    fn nearest_mesh_wins_and_occludes_without_uv() {
        let mut blocker = quad_model().meshes.remove(0);
        blocker.name = "blocker".into();
        for p in &mut blocker.positions {
            p.z = 1.0;
        }
        blocker.uvs = None;
        let model = ModelAsset::new("stack", vec![quad_model().meshes.remove(0), blocker]).unwrap();

        let mut scene = Scene::new();
        scene.set_model(model);
        let hit = scene.pick(&ray_at(0.0, 0.0)).unwrap();
        assert_eq!(hit.mesh, 1);
        assert!(scene.pick_uv(&ray_at(0.0, 0.0)).is_none());
    }

    #[test]
    fn restored_yaw_applies_to_next_model() {
        let mut scene = Scene::new();
        scene.set_model_yaw(1.25);
        scene.rotate_model(5.0);
        assert_eq!(scene.model_yaw(), 1.25);
        scene.set_model(quad_model());
        assert_eq!(scene.model().unwrap().yaw, 1.25);
    }
}
