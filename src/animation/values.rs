use glam::{Quat, Vec3};

/// Values that can be linearly blended between two keyframes.
pub trait Interpolatable: Copy + Sized {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self;
}

impl Interpolatable for f32 {
    #[inline]
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start + (end - start) * t
    }
}

impl<const D: usize> Interpolatable for [f32; D] {
    #[inline]
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        let mut out = [0.0; D];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = f32::interpolate_linear(&start[i], &end[i], t);
        }
        out
    }
}

/// Linear blend of two `[x, y, z, w]` quaternion keys along the shorter arc.
///
/// `q` and `-q` encode the same rotation. `end` is negated when the keys lie
/// in opposite hemispheres, so the blend never passes through zero. The
/// result is not normalized.
#[must_use]
pub fn interpolate_rotation_key(start: &[f32; 4], end: &[f32; 4], t: f32) -> [f32; 4] {
    let dot: f32 = start.iter().zip(end).map(|(a, b)| a * b).sum();
    let end = if dot < 0.0 { end.map(|c| -c) } else { *end };
    <[f32; 4]>::interpolate_linear(start, &end, t)
}

/// Decodes a stored 3-component key into a vector.
#[inline]
#[must_use]
pub fn vec3_from_key(value: [f32; 3]) -> Vec3 {
    Vec3::from_array(value)
}

/// Decodes a stored `[x, y, z, w]` key into a quaternion (not normalized).
#[inline]
#[must_use]
pub fn quat_from_key(value: [f32; 4]) -> Quat {
    Quat::from_array(value)
}
