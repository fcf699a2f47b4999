//! Small 2D helpers on top of [`glam::Vec2`].
//!
//! Dot products, lengths, normalization, perpendiculars (`Vec2::perp`) and
//! unit vectors from angles (`Vec2::from_angle`) come straight from glam;
//! only the operations it lacks live here.

use glam::Vec2;

/// Mirror `v` against a surface normal: `v - 2 * (v . n) * n`.
///
/// The result is independent of the normal's sign, so either surface side
/// produces the same mirror direction.
pub fn reflect(v: Vec2, n: Vec2) -> Vec2 {
    v - 2.0 * v.dot(n) * n
}

/// Rotate `v` by `radians`.
///
/// Map space is y-down, so positive angles turn from +x toward +y.
pub fn rotate(v: Vec2, radians: f32) -> Vec2 {
    Vec2::from_angle(radians).rotate(v)
}
