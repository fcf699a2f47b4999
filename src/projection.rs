//! First-person stripe projection.
//!
//! Each intersection becomes one vertical stripe on a square RGBA frame:
//! its column follows the ray's angular offset across the field of view, its
//! height falls off with projected distance, and its opacity fades with
//! distance toward the far plane. Stripes composite source-over onto a
//! transparent frame so the accumulation and output stages can layer it over
//! any backdrop.

use crate::color::{self, Rgb};
use crate::config::TraceConfig;
use crate::tracer::Intersection;

/// Distance from the camera pinhole to the screen plane, in pixels.
pub fn focal_length(resolution: f32, fov_radians: f32) -> f32 {
    (resolution / 2.0) / (fov_radians / 2.0).tan()
}

/// Half-height of a wall stripe at `distance`.
pub fn stripe_height(focal: f32, distance: f32) -> f32 {
    12.0 * focal / distance
}

/// Render intersections into an RGBA frame of `resolution` x `resolution`.
///
/// Columns that never hit a wall stay fully transparent.
pub fn draw(intersections: &[Intersection], config: &TraceConfig) -> Vec<u8> {
    let resolution = config.screen.resolution as usize;
    let res = config.screen.resolution as f32;
    let fov = config.fov_radians();
    let focal = focal_length(res, fov);
    let mut frame = vec![0u8; 4 * resolution * resolution];

    for hit in intersections {
        if !(hit.distance > 0.0) {
            continue;
        }
        let x = (res / 2.0 + res * (hit.angle / fov)).round();
        if x < 0.0 || x >= res {
            continue;
        }
        let x = x as usize;

        let height = stripe_height(focal, hit.distance);
        let color = color::gamma_correct(hit.color, config.camera.gamma);
        let alpha = ((config.camera.far / hit.distance / 10.0).clamp(0.0, 1.0) * 255.0) as u8;

        let top = (res / 2.0 - height).floor().max(0.0) as usize;
        let bottom = (res / 2.0 + height).ceil().min(res) as usize;
        for y in top..bottom {
            let offset = 4 * (x + y * resolution);
            composite(&mut frame[offset..offset + 4], color, alpha);
        }
    }
    frame
}

/// Source-over blend of one straight-alpha pixel.
fn composite(dst: &mut [u8], src: Rgb, alpha: u8) {
    let src_a = alpha as f32 / 255.0;
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }
    for channel in 0..3 {
        let s = src[channel] as f32;
        let d = dst[channel] as f32;
        dst[channel] = ((s * src_a + d * dst_a * (1.0 - src_a)) / out_a).round() as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}
