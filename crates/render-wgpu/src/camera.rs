use garment_common::Ray;
use glam::{Mat4, Vec2, Vec3, Vec4};

/// Perspective camera that looks down -Z and zooms by sliding along Z.
/// Camera motion is view state only; it never touches the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomCamera {
    pub position: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for ZoomCamera {
    fn default() -> Self {
        let start = 15.0;
        Self {
            position: Vec3::new(0.0, 2.0, start),
            fov: 75.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            min_distance: start * 0.08,
            max_distance: start,
        }
    }
}

impl ZoomCamera {
    /// Camera z position, the value zoom changes.
    pub fn distance(&self) -> f32 {
        self.position.z
    }

    pub fn set_distance(&mut self, z: f32) {
        self.position.z = z.clamp(self.min_distance, self.max_distance);
    }

    /// Move along Z by `delta`, clamped to the zoom range. Positive moves away.
    pub fn zoom(&mut self, delta: f32) {
        self.set_distance(self.position.z + delta);
    }

    /// Update the aspect ratio after a resize. Zero-sized viewports are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, Vec3::NEG_Z, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space ray through a window pixel. `viewport` is the window size
    /// in the same units as `pos`.
    pub fn screen_ray(&self, pos: Vec2, viewport: Vec2) -> Ray {
        let ndc = Vec2::new(
            2.0 * pos.x / viewport.x.max(1.0) - 1.0,
            1.0 - 2.0 * pos.y / viewport.y.max(1.0),
        );
        let inv = self.view_projection().inverse();
        let unproject = |z: f32| {
            let p = inv * Vec4::new(ndc.x, ndc.y, z, 1.0);
            p.truncate() / p.w
        };
        // wgpu clip space depth runs 0 (near) to 1 (far).
        let near = unproject(0.0);
        let far = unproject(1.0);
        Ray::new(self.position, (far - near).normalize_or(Vec3::NEG_Z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera() {
        let cam = ZoomCamera::default();
        assert_eq!(cam.position, Vec3::new(0.0, 2.0, 15.0));
        assert!((cam.min_distance - 1.2).abs() < 1e-6);
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn zoom_clamps_to_range() {
        let mut cam = ZoomCamera::default();
        cam.zoom(5.0);
        assert_eq!(cam.distance(), 15.0);
        cam.zoom(-4.0);
        assert!((cam.distance() - 11.0).abs() < 1e-6);
        cam.zoom(-100.0);
        assert!((cam.distance() - 1.2).abs() < 1e-6);
        assert_eq!(cam.position.y, 2.0);
    }

    #[test]
    fn center_ray_looks_down_negative_z() {
        let cam = ZoomCamera::default();
        let ray = cam.screen_ray(Vec2::new(640.0, 360.0), Vec2::new(1280.0, 720.0));
        assert_eq!(ray.origin, cam.position);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn top_edge_ray_matches_half_fov() {
        let mut cam = ZoomCamera::default();
        cam.set_viewport(800, 800);
        let ray = cam.screen_ray(Vec2::new(400.0, 0.0), Vec2::new(800.0, 800.0));
        let angle = ray.direction.y.atan2(-ray.direction.z);
        assert!((angle - cam.fov * 0.5).abs() < 1e-3);
        // Left edge with aspect 1 has the same spread horizontally.
        let ray = cam.screen_ray(Vec2::new(0.0, 400.0), Vec2::new(800.0, 800.0));
        assert!(ray.direction.x < 0.0);
        assert!((ray.direction.x.atan2(-ray.direction.z) + cam.fov * 0.5).abs() < 1e-3);
    }

    #[test]
    fn viewport_sets_aspect() {
        let mut cam = ZoomCamera::default();
        cam.set_viewport(1000, 500);
        assert_eq!(cam.aspect, 2.0);
        cam.set_viewport(0, 500);
        assert_eq!(cam.aspect, 2.0);
    }
}
