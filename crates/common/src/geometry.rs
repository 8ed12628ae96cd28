use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box. An empty box has `min > max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.extend(p);
        }
        aabb
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn extend(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    /// Bounds of the eight transformed corners.
    pub fn transform(&self, m: &Mat4) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        let (a, b) = (self.min, self.max);
        Aabb::from_points([
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
        .map(|p| m.transform_point3(p)))
    }
}

/// Half-line used for picking. `direction` is not required to be normalized;
/// hit distances are measured in units of `direction`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray in the space described by `m` (e.g. world to model).
    pub fn transformed(&self, m: &Mat4) -> Ray {
        Ray {
            origin: m.transform_point3(self.origin),
            direction: m.transform_vector3(self.direction),
        }
    }

    // Slab-method ray-AABB intersection, returns the entry distance (or the
    // exit distance when the origin is inside the box).
    pub fn hit_aabb(&self, aabb: &Aabb) -> Option<f32> {
        if aabb.is_empty() {
            return None;
        }
        let inv = Vec3::new(
            if self.direction.x != 0.0 { 1.0 / self.direction.x } else { f32::INFINITY },
            if self.direction.y != 0.0 { 1.0 / self.direction.y } else { f32::INFINITY },
            if self.direction.z != 0.0 { 1.0 / self.direction.z } else { f32::INFINITY },
        );

        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;
        for axis in 0..3 {
            let o = self.origin[axis];
            let (lo, hi) = (aabb.min[axis], aabb.max[axis]);
            if inv[axis].is_infinite() {
                // Parallel to this slab: must start inside it.
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let mut t0 = (lo - o) * inv[axis];
            let mut t1 = (hi - o) * inv[axis];
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            tmin = tmin.max(t0);
            tmax = tmax.min(t1);
            if tmin > tmax {
                return None;
            }
        }

        if tmax < 0.0 {
            return None;
        }
        Some(if tmin >= 0.0 { tmin } else { tmax })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_has_zero_size() {
        let b = Aabb::empty();
        assert!(b.is_empty());
        assert_eq!(b.size(), Vec3::ZERO);
        assert_eq!(b.center(), Vec3::ZERO);
    }

    #[test]
    fn box_size_and_center() {
        let b = Aabb::from_points([Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, 4.0, 4.0)]);
        assert_eq!(b.size(), Vec3::new(4.0, 4.0, 2.0));
        assert_eq!(b.center(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(b.max_dimension(), 4.0);
    }

    #[test]
    fn union_and_transform() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(2.0), Vec3::splat(3.0));
        let u = a.union(&b);
        assert_eq!(u.min, Vec3::ZERO);
        assert_eq!(u.max, Vec3::splat(3.0));

        let moved = a.transform(&Mat4::from_translation(Vec3::X));
        assert_eq!(moved.min, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(moved.max, Vec3::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn ray_hits_box_in_front() {
        let b = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert_eq!(ray.hit_aabb(&b), Some(4.0));
        assert_eq!(ray.at(4.0), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn ray_from_inside_reports_exit() {
        let b = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray.hit_aabb(&b), Some(1.0));
    }

    #[test]
    fn ray_misses_box_behind_or_beside() {
        let b = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert!(Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z).hit_aabb(&b).is_none());
        assert!(Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z).hit_aabb(&b).is_none());
    }

    #[test]
    fn transformed_ray_moves_origin_not_direction_translation() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let r = ray.transformed(&Mat4::from_translation(Vec3::X));
        assert_eq!(r.origin, Vec3::X);
        assert_eq!(r.direction, Vec3::Z);
    }
}
