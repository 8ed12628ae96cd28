use garment_common::Rgba;
use glam::Vec2;

/// Squared distance from `p` to the segment `a`-`b`.
pub(crate) fn segment_distance_sq(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance_squared(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance_squared(a + ab * t)
}

/// Center of pixel `(x, y)`.
pub(crate) fn pixel_center(x: u32, y: u32) -> Vec2 {
    Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
}

/// Source-over compositing with straight alpha.
pub(crate) fn blend_over(dst: &mut [u8], src: Rgba) {
    let sa = src.a() as u32;
    if sa == 255 {
        dst.copy_from_slice(&src.0);
        return;
    }
    if sa == 0 {
        return;
    }
    let da = dst[3] as u32;
    // Alpha in 0..=255*255 fixed point.
    let out_a = sa * 255 + da * (255 - sa);
    if out_a == 0 {
        dst.copy_from_slice(&[0, 0, 0, 0]);
        return;
    }
    for i in 0..3 {
        let s = src.0[i] as u32 * sa * 255;
        let d = dst[i] as u32 * da * (255 - sa);
        dst[i] = ((s + d + out_a / 2) / out_a) as u8;
    }
    dst[3] = ((out_a + 127) / 255) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_segment_interior_and_ends() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(segment_distance_sq(Vec2::new(5.0, 2.0), a, b), 4.0);
        assert_eq!(segment_distance_sq(Vec2::new(-3.0, 0.0), a, b), 9.0);
        assert_eq!(segment_distance_sq(Vec2::new(13.0, 4.0), a, b), 25.0);
    }

    #[test]
    fn degenerate_segment_is_a_point() {
        let a = Vec2::new(1.0, 1.0);
        assert_eq!(segment_distance_sq(Vec2::new(4.0, 5.0), a, a), 25.0);
    }

    #[test]
    fn opaque_source_replaces() {
        let mut px = [10, 20, 30, 40];
        blend_over(&mut px, Rgba::rgb(200, 100, 0));
        assert_eq!(px, [200, 100, 0, 255]);
    }

    #[test]
    fn half_alpha_over_opaque_black() {
        let mut px = [0, 0, 0, 255];
        blend_over(&mut px, Rgba([255, 255, 255, 128]));
        assert_eq!(px[3], 255);
        assert!((127..=129).contains(&px[0]));
    }

    #[test]
    fn translucent_over_transparent_keeps_color() {
        let mut px = [0, 0, 0, 0];
        blend_over(&mut px, Rgba([255, 0, 0, 100]));
        assert_eq!(px, [255, 0, 0, 100]);
    }
}
