//! Light-path segments through the occupancy grid.
//!
//! A [`Ray`] is one straight segment of a light path. A primary segment
//! starts at the camera with full energy and the configured distance budget;
//! every reflective hit spawns child segments via [`Ray::spawn`] with decayed
//! energy, one fewer emission left, and whatever budget remains. Segments are
//! plain values: tracing never mutates one, so sibling sub-rays cannot leak
//! state into each other.

use glam::{IVec2, Vec2};

use crate::color::Rgb;
use crate::config::TraceConfig;
use crate::grid::OccupancyGrid;
use crate::vector;

/// First solid cell found along a segment.
#[derive(Debug, Clone)]
pub struct Hit {
    /// Euclidean distance from the segment origin to the entered cell face.
    pub distance: f32,
    /// Axis-aligned unit normal opposing the incoming direction;
    /// `direction.dot(normal) <= 0` always holds.
    pub normal: Vec2,
    /// Grid coordinates of the solid cell.
    pub cell: IVec2,
    /// The cell's RGB sample from the map.
    pub color: Rgb,
}

/// One segment of a light path.
#[derive(Debug, Clone)]
pub struct Ray {
    /// Continuous start position, map units.
    pub origin: Vec2,
    /// Unit direction of travel.
    pub direction: Vec2,
    /// Remaining light-carrying capacity, 1.0 at the camera, non-increasing
    /// down the chain.
    pub energy: f32,
    /// Path length accumulated by ancestor segments.
    pub total_distance: f32,
    /// Distance budget left for this segment and everything it spawns; the
    /// chain's total path length is capped, not reset per bounce.
    pub budget: f32,
    /// Bounce depth: 0 for the primary cast.
    pub level: u32,
    emissions_left: u32,
    spread: f32,
    energy_loss: f32,
}

impl Ray {
    /// Primary segment for one screen column.
    pub fn new(origin: Vec2, direction: Vec2, config: &TraceConfig) -> Self {
        Self {
            origin,
            direction,
            energy: 1.0,
            total_distance: 0.0,
            budget: config.ray_casting.trace_distance,
            level: 0,
            emissions_left: config.reflection.count + 1,
            spread: config.spread_radians(),
            energy_loss: config.reflection.energy_loss,
        }
    }

    /// Whether a hit on this segment may still spawn reflected children.
    pub fn can_bounce(&self) -> bool {
        self.emissions_left > 1
    }

    /// Spread half-range for jittering child directions, radians.
    pub fn spread(&self) -> f32 {
        self.spread
    }

    /// Mirror reflection of this segment's direction at `hit`.
    pub fn mirror(&self, hit: &Hit) -> Vec2 {
        vector::reflect(self.direction, hit.normal)
    }

    /// Step through the grid until the first solid cell, the map edge, or the
    /// distance budget runs out, whichever comes first.
    ///
    /// Amanatides-Woo traversal: `t_max` holds the distance at which the ray
    /// next crosses a grid line on each axis, and the smaller axis advances.
    /// An axis with zero direction never advances (its crossing distance is
    /// infinite), so axis-aligned rays cannot divide by zero. Exact ties
    /// advance x first. The starting cell itself is never tested; a ray born
    /// inside a wall does not self-intersect.
    pub fn trace(&self, grid: &OccupancyGrid<'_>) -> Option<Hit> {
        let dir = self.direction;
        let mut cell = IVec2::new(self.origin.x.floor() as i32, self.origin.y.floor() as i32);
        let sign = IVec2::new(
            if dir.x > 0.0 { 1 } else if dir.x < 0.0 { -1 } else { 0 },
            if dir.y > 0.0 { 1 } else if dir.y < 0.0 { -1 } else { 0 },
        );
        let t_delta = Vec2::new(
            if dir.x != 0.0 { (1.0 / dir.x).abs() } else { f32::INFINITY },
            if dir.y != 0.0 { (1.0 / dir.y).abs() } else { f32::INFINITY },
        );
        let mut t_max = Vec2::new(
            match sign.x {
                1 => (cell.x as f32 + 1.0 - self.origin.x) * t_delta.x,
                -1 => (self.origin.x - cell.x as f32) * t_delta.x,
                _ => f32::INFINITY,
            },
            match sign.y {
                1 => (cell.y as f32 + 1.0 - self.origin.y) * t_delta.y,
                -1 => (self.origin.y - cell.y as f32) * t_delta.y,
                _ => f32::INFINITY,
            },
        );

        loop {
            let step_x = t_max.x <= t_max.y;
            let distance = if step_x {
                cell.x += sign.x;
                let d = t_max.x;
                t_max.x += t_delta.x;
                d
            } else {
                cell.y += sign.y;
                let d = t_max.y;
                t_max.y += t_delta.y;
                d
            };

            // The negated comparison also stops NaN from a degenerate
            // direction cycling forever.
            if !(distance < self.budget) {
                return None;
            }
            if !grid.contains(cell.x, cell.y) {
                return None;
            }
            if !grid.is_solid(cell.x, cell.y) {
                continue;
            }

            let normal = if step_x {
                Vec2::new(if dir.x > 0.0 { -1.0 } else { 1.0 }, 0.0)
            } else {
                Vec2::new(0.0, if dir.y > 0.0 { -1.0 } else { 1.0 })
            };
            return Some(Hit {
                distance,
                normal,
                cell,
                color: grid.rgb(cell.x, cell.y),
            });
        }
    }

    /// Child segment for the next bounce.
    ///
    /// Starts at the hit cell's empty neighbor (one cell along the normal, so
    /// the wall is not immediately re-hit), pointing along the mirror
    /// direction rotated by `jitter` radians. Energy decays by the configured
    /// loss and the distance budget shrinks by the distance already spent.
    pub fn spawn(&self, hit: &Hit, jitter: f32) -> Ray {
        Ray {
            origin: hit.cell.as_vec2() + hit.normal,
            direction: vector::rotate(self.mirror(hit), jitter),
            energy: self.energy * (1.0 - self.energy_loss),
            total_distance: self.total_distance + hit.distance,
            budget: self.budget - hit.distance,
            level: self.level + 1,
            emissions_left: self.emissions_left - 1,
            spread: self.spread,
            energy_loss: self.energy_loss,
        }
    }
}
