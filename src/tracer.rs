//! Fan orchestration and shading.
//!
//! One [`RayTracer::trace`] call covers a full frame: a fan of rays across
//! the field of view, each followed through its bounce chain, producing one
//! [`Intersection`] per screen column that hit a wall. Sampling is
//! rectilinear, not a naive angular sweep: columns map to the screen plane
//! through `atan(offset / focal_length)`, and reported distances are
//! multiplied by `cos(relative_angle)` so flat walls project flat.

use glam::Vec2;
use rayon::prelude::*;

use crate::color::{self, Rgb};
use crate::config::{ConfigError, TraceConfig};
use crate::grid::OccupancyGrid;
use crate::random::Sampler;
use crate::ray::Ray;

/// Camera position (continuous map units) and view angle in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Position in map space.
    pub position: Vec2,
    /// View direction, radians from +x toward +y.
    pub angle: f32,
}

/// One screen column's result, ready for projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    /// Angle off the view axis, radians.
    pub angle: f32,
    /// Hit distance corrected by `cos(angle)` for the flat projection plane.
    pub distance: f32,
    /// Shaded wall color.
    pub color: Rgb,
}

/// Per-bounce record collected by [`RayTracer::trace_debug`].
#[derive(Debug, Clone)]
pub struct DebugRay {
    /// Segment start position.
    pub origin: Vec2,
    /// Segment direction.
    pub direction: Vec2,
    /// Final color reported for this segment.
    pub color: Rgb,
    /// Segment hit distance.
    pub distance: f32,
    /// Path length from the camera through this segment's hit.
    pub total_distance: f32,
    /// Bounce depth, 0 for primary casts.
    pub level: u32,
}

struct Shaded {
    distance: f32,
    color: Rgb,
}

/// Casts the per-frame ray fan into an occupancy grid.
pub struct RayTracer<'a> {
    grid: OccupancyGrid<'a>,
    config: &'a TraceConfig,
}

impl<'a> RayTracer<'a> {
    /// Build a tracer for one frame's grid and configuration snapshot.
    ///
    /// Fails fast on a malformed configuration; silently producing garbage
    /// pixels is worse than stopping.
    pub fn new(grid: OccupancyGrid<'a>, config: &'a TraceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { grid, config })
    }

    /// Trace the whole fan for one camera pose.
    ///
    /// Columns run in parallel and each draws from its own random stream
    /// forked off `sampler`, so the output is identical to a sequential pass
    /// regardless of thread scheduling. Columns that hit nothing contribute
    /// no intersection.
    pub fn trace(&self, pose: &CameraPose, sampler: &Sampler) -> Vec<Intersection> {
        let half = (self.config.ray_casting.trace_steps / 2) as i64;
        (0..2 * half + 1)
            .into_par_iter()
            .filter_map(|index| {
                let mut column_sampler = sampler.fork(index as u64);
                self.trace_column(pose, index - half, &mut column_sampler, None)
            })
            .collect()
    }

    /// Sequential trace that also records every bounce for visualization.
    pub fn trace_debug(
        &self,
        pose: &CameraPose,
        sampler: &Sampler,
    ) -> (Vec<Intersection>, Vec<DebugRay>) {
        let half = (self.config.ray_casting.trace_steps / 2) as i64;
        let mut intersections = Vec::new();
        let mut rays = Vec::new();
        for index in 0..2 * half + 1 {
            let mut column_sampler = sampler.fork(index as u64);
            if let Some(intersection) =
                self.trace_column(pose, index - half, &mut column_sampler, Some(&mut rays))
            {
                intersections.push(intersection);
            }
        }
        (intersections, rays)
    }

    fn trace_column(
        &self,
        pose: &CameraPose,
        column: i64,
        sampler: &mut Sampler,
        mut debug: Option<&mut Vec<DebugRay>>,
    ) -> Option<Intersection> {
        let config = self.config;
        let resolution = config.screen.resolution as f32;
        let focal = (resolution / 2.0) / (config.fov_radians() / 2.0).tan();
        let column_width = resolution / config.ray_casting.trace_steps as f32;

        let jitter = if config.effective_accumulate() {
            sampler.uniform() * config.ray_casting.emission_randomness
        } else {
            0.0
        };
        let offset = (column as f32 + jitter) * column_width;
        let angle = pose.angle + (offset / focal).atan();

        let ray = Ray::new(pose.position, Vec2::from_angle(angle), config);
        let shaded = self.trace_ray(ray, sampler, debug.as_deref_mut())?;

        let relative = angle - pose.angle;
        Some(Intersection {
            angle: relative,
            distance: relative.cos() * shaded.distance,
            color: shaded.color,
        })
    }

    /// Follow one segment and, recursively, its reflected children.
    fn trace_ray(
        &self,
        ray: Ray,
        sampler: &mut Sampler,
        mut debug: Option<&mut Vec<DebugRay>>,
    ) -> Option<Shaded> {
        let hit = ray.trace(&self.grid)?;
        let shininess = self.config.reflection.shininess;

        let mut color = shade(hit.color, ray.direction, hit.normal, shininess);

        if ray.can_bounce() {
            let mut reflected: Option<Rgb> = None;
            for _ in 0..self.config.reflection.sub_rays {
                let child = ray.spawn(&hit, ray.spread() * sampler.centered());
                if let Some(sample) = self.trace_ray(child, sampler, debug.as_deref_mut()) {
                    // Later samples fold in at half weight, in spawn order.
                    reflected = Some(match reflected {
                        None => sample.color,
                        Some(acc) => color::mix_linear(acc, sample.color, 0.5),
                    });
                }
            }
            if let Some(mixed) = reflected {
                let weight = reflection_weight(ray.mirror(&hit), hit.normal, shininess);
                color = color::mix_add(color, mixed, weight);
            }
        }
        let color = color::scale(color, ray.energy);

        if let Some(rays) = debug {
            rays.push(DebugRay {
                origin: ray.origin,
                direction: ray.direction,
                color,
                distance: hit.distance,
                total_distance: ray.total_distance + hit.distance,
                level: ray.level,
            });
        }

        Some(Shaded {
            distance: hit.distance,
            color,
        })
    }
}

/// Local wall color: a diffuse cosine against the (opposing) normal plus a
/// power-lobe specular term against the wall tangent. The tangent lobe is not
/// a physical BRDF; it is kept as-is for the characteristic glint it gives
/// axis-aligned walls.
fn shade(base: Rgb, direction: Vec2, normal: Vec2, shininess: f32) -> Rgb {
    let diffuse = (-direction).dot(normal).max(0.0);
    let specular = direction.dot(normal.perp()).max(0.0).powf(shininess);
    color::scale(base, diffuse + specular)
}

/// Weight for folding reflected light into the local color: the mirror
/// direction's alignment with the wall tangent, raised to the shininess
/// power.
fn reflection_weight(mirror: Vec2, normal: Vec2, shininess: f32) -> f32 {
    mirror.dot(normal.perp()).abs().powf(shininess)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MapBuffer;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_1_SQRT_2;

    /// 10x10 map, empty inside, one-cell solid border.
    fn bordered_map(color: Rgb) -> MapBuffer {
        let mut map = MapBuffer::new(10);
        map.fill_rect(0, 0, 10, 1, color);
        map.fill_rect(0, 9, 10, 1, color);
        map.fill_rect(0, 0, 1, 10, color);
        map.fill_rect(9, 0, 1, 10, color);
        map
    }

    #[test]
    fn bordered_scenario_projects_flat_walls_flat() {
        let map = bordered_map([200, 200, 200]);
        let mut config = TraceConfig::default();
        config.camera.fov = 90.0;
        config.ray_casting.trace_steps = 4;
        config.reflection.count = 0;

        let tracer = RayTracer::new(map.grid(), &config).unwrap();
        let pose = CameraPose {
            position: Vec2::new(5.0, 5.0),
            angle: 0.0,
        };
        let intersections = tracer.trace(&pose, &Sampler::from_seed(0));

        assert_eq!(intersections.len(), 5);

        let expected_angles = [
            -(1.0f32).atan(),
            -(0.5f32).atan(),
            0.0,
            (0.5f32).atan(),
            (1.0f32).atan(),
        ];
        for (hit, expected) in intersections.iter().zip(expected_angles) {
            assert_abs_diff_eq!(hit.angle, expected, epsilon = 1e-5);
            // The camera sits 4 units from every wall; the cosine correction
            // flattens each column's radial distance back to 4.
            assert_abs_diff_eq!(hit.distance, 4.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn center_ray_color_is_pure_diffuse() {
        let map = bordered_map([200, 150, 100]);
        let mut config = TraceConfig::default();
        config.camera.fov = 90.0;
        config.ray_casting.trace_steps = 4;
        config.reflection.count = 0;

        let tracer = RayTracer::new(map.grid(), &config).unwrap();
        let pose = CameraPose {
            position: Vec2::new(5.0, 5.0),
            angle: 0.0,
        };
        let intersections = tracer.trace(&pose, &Sampler::from_seed(0));

        // Head-on: diffuse is exactly 1, the tangent specular term is 0.
        assert_eq!(intersections[2].color, [200, 150, 100]);
    }

    #[test]
    fn shade_head_on_keeps_base_color() {
        let color = shade([100, 200, 250], Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0), 4.0);
        assert_eq!(color, [100, 200, 250]);
    }

    #[test]
    fn shade_at_grazing_angle_adds_tangent_lobe() {
        // 45 degrees onto an x wall: diffuse = cos(45), specular = cos(45)^4.
        let direction = Vec2::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2);
        let color = shade([200, 100, 40], direction, Vec2::new(-1.0, 0.0), 4.0);
        assert_eq!(color, [191, 95, 38]);
    }

    #[test]
    fn shade_never_negative() {
        // Tangent term points away: only diffuse remains.
        let direction = Vec2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2);
        let color = shade([100, 100, 100], direction, Vec2::new(-1.0, 0.0), 1.0);
        assert_eq!(color, [70, 70, 70]);
    }

    #[test]
    fn reflection_weight_uses_shininess_lobe() {
        let normal = Vec2::new(-1.0, 0.0);
        let mirror = Vec2::new(0.6, 0.8);
        assert_abs_diff_eq!(reflection_weight(mirror, normal, 1.0), 0.8, epsilon = 1e-6);
        assert_abs_diff_eq!(reflection_weight(mirror, normal, 2.0), 0.64, epsilon = 1e-5);
        // Sign of the tangent alignment does not matter.
        assert_abs_diff_eq!(
            reflection_weight(Vec2::new(0.6, -0.8), normal, 2.0),
            0.64,
            epsilon = 1e-5
        );
    }

    #[test]
    fn one_bounce_folds_reflected_wall_in() {
        // Primary: 45 degrees down-right into a gray floor at row 6; mirror
        // bounces up-right into a blue wall at column 10.
        let mut map = MapBuffer::new(12);
        map.fill_rect(0, 6, 12, 1, [100, 100, 100]);
        map.fill_rect(10, 0, 1, 6, [0, 0, 100]);

        let mut config = TraceConfig::default();
        config.reflection.count = 1;
        config.reflection.sub_rays = 1;
        config.reflection.spread = 0.0;
        config.reflection.shininess = 1.0;
        config.reflection.energy_loss = 0.5;

        let tracer = RayTracer::new(map.grid(), &config).unwrap();
        let direction = Vec2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2);
        let ray = Ray::new(Vec2::new(1.5, 1.5), direction, &config);
        let mut sampler = Sampler::from_seed(0);
        let shaded = tracer.trace_ray(ray, &mut sampler, None).unwrap();

        // Primary hit: distance 4.5 * sqrt(2), local gray * (cos45 + cos45).
        assert_abs_diff_eq!(shaded.distance, 4.5 * std::f32::consts::SQRT_2, epsilon = 1e-4);
        // Child sees the blue wall at 45 degrees too, halved by energy loss,
        // then folded in at the tangent-alignment weight cos(45).
        assert_eq!(shaded.color, [141, 141, 190]);
    }

    #[test]
    fn head_on_mirror_reflection_contributes_nothing() {
        // Mirror direction parallel to the normal has zero tangent alignment.
        let mut map = MapBuffer::new(10);
        map.fill_rect(9, 0, 1, 10, [255, 255, 255]);
        map.fill_rect(0, 0, 1, 10, [255, 255, 255]);

        let mut config = TraceConfig::default();
        config.reflection.count = 2;
        config.reflection.sub_rays = 1;
        config.reflection.spread = 0.0;

        let tracer = RayTracer::new(map.grid(), &config).unwrap();
        let ray = Ray::new(Vec2::new(5.5, 5.5), Vec2::new(1.0, 0.0), &config);
        let mut sampler = Sampler::from_seed(0);
        let shaded = tracer.trace_ray(ray, &mut sampler, None).unwrap();

        assert_eq!(shaded.color, [255, 255, 255]);
    }

    #[test]
    fn stochastic_trace_is_deterministic_under_a_seed() {
        let map = bordered_map([180, 180, 180]);
        let mut config = TraceConfig::default();
        config.camera.fov = 70.0;
        config.ray_casting.trace_steps = 32;
        config.ray_casting.accumulate_light = true;
        config.ray_casting.emission_randomness = 1.0;
        config.reflection.count = 2;
        config.reflection.sub_rays = 2;
        config.reflection.spread = 10.0;

        let tracer = RayTracer::new(map.grid(), &config).unwrap();
        let pose = CameraPose {
            position: Vec2::new(4.5, 5.5),
            angle: 0.7,
        };

        let first = tracer.trace(&pose, &Sampler::from_seed(99));
        let second = tracer.trace(&pose, &Sampler::from_seed(99));
        assert_eq!(first, second);

        let different = tracer.trace(&pose, &Sampler::from_seed(100));
        assert_ne!(first, different);
    }

    #[test]
    fn debug_trace_matches_parallel_trace() {
        let map = bordered_map([90, 120, 150]);
        let mut config = TraceConfig::default();
        config.camera.fov = 70.0;
        config.ray_casting.trace_steps = 16;
        config.reflection.count = 1;
        config.reflection.sub_rays = 2;
        config.reflection.spread = 5.0;

        let tracer = RayTracer::new(map.grid(), &config).unwrap();
        let pose = CameraPose {
            position: Vec2::new(5.0, 5.0),
            angle: 1.2,
        };
        let sampler = Sampler::from_seed(5);

        let parallel = tracer.trace(&pose, &sampler);
        let (sequential, rays) = tracer.trace_debug(&pose, &sampler);
        assert_eq!(parallel, sequential);
        assert!(!rays.is_empty());
        // Every column produced at least its primary record.
        assert!(rays.iter().any(|r| r.level > 0));
        assert!(rays.iter().all(|r| r.total_distance >= r.distance));
    }

    #[test]
    fn rejects_invalid_config() {
        let map = MapBuffer::new(4);
        let mut config = TraceConfig::default();
        config.ray_casting.trace_steps = 0;
        assert!(RayTracer::new(map.grid(), &config).is_err());
    }
}
