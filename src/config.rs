//! Trace configuration.
//!
//! A [`TraceConfig`] is an immutable per-frame snapshot, grouped the way the
//! settings surface exposes them: camera, ray casting, reflection and screen.
//! Snapshots deserialize from TOML with per-field defaults, and are validated
//! up front; a malformed value (zero steps, NaN angle) is a precondition
//! violation, not something to limp past while producing garbage pixels.

use serde::Deserialize;
use thiserror::Error;

/// Camera optics and display response.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Field of view in degrees.
    pub fov: f32,
    /// Far plane used for distance-based stripe fade, map units.
    pub far: f32,
    /// Display gamma applied by the projector.
    pub gamma: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 70.0,
            far: 10000.0,
            gamma: 2.0,
        }
    }
}

/// Fan sampling and traversal limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RayCastingSettings {
    /// Number of fan steps; the fan emits `2 * (trace_steps / 2) + 1` columns.
    pub trace_steps: u32,
    /// Maximum path length across a ray's whole bounce chain, map units.
    pub trace_distance: f32,
    /// Average stochastic frames instead of drawing each one directly.
    pub accumulate_light: bool,
    /// Column jitter amplitude (fractions of a column width) when
    /// accumulating; trades frame stability for convergence.
    pub emission_randomness: f32,
    /// Collect per-bounce trace records. Forces accumulation off.
    pub debug: bool,
}

impl Default for RayCastingSettings {
    fn default() -> Self {
        Self {
            trace_steps: 1000,
            trace_distance: 10000.0,
            accumulate_light: false,
            emission_randomness: 1.0,
            debug: false,
        }
    }
}

/// Reflection model parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReflectionSettings {
    /// Maximum reflections for one ray beam.
    pub count: u32,
    /// Secondary rays spawned per reflective hit.
    pub sub_rays: u32,
    /// Reflection beam spread in degrees.
    pub spread: f32,
    /// Exponent of the specular lobe; higher is glossier.
    pub shininess: f32,
    /// Fraction of energy lost per bounce, 0-1.
    pub energy_loss: f32,
}

impl Default for ReflectionSettings {
    fn default() -> Self {
        Self {
            count: 1,
            sub_rays: 1,
            spread: 2.0,
            shininess: 4.0,
            energy_loss: 0.1,
        }
    }
}

/// Output surface geometry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScreenSettings {
    /// Projection resolution in pixels (square).
    pub resolution: u32,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self { resolution: 800 }
    }
}

/// Immutable per-frame configuration snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Camera optics and display response.
    pub camera: CameraSettings,
    /// Fan sampling and traversal limits.
    pub ray_casting: RayCastingSettings,
    /// Reflection model parameters.
    pub reflection: ReflectionSettings,
    /// Output surface geometry.
    pub screen: ScreenSettings,
}

/// Rejected configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field value violates its precondition.
    #[error("invalid `{field}`: {reason}")]
    Invalid {
        /// Offending field path.
        field: &'static str,
        /// What the field must satisfy.
        reason: &'static str,
    },
    /// The TOML text did not parse.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

fn require(ok: bool, field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason })
    }
}

impl TraceConfig {
    /// Parse and validate a TOML snapshot.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: TraceConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every precondition the tracer relies on.
    ///
    /// NaN fails every comparison below, so non-finite values are rejected
    /// along with out-of-range ones.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(
            self.camera.fov > 0.0 && self.camera.fov < 180.0,
            "camera.fov",
            "must be within (0, 180) degrees",
        )?;
        require(self.camera.far > 0.0 && self.camera.far.is_finite(), "camera.far", "must be positive and finite")?;
        require(self.camera.gamma > 0.0 && self.camera.gamma.is_finite(), "camera.gamma", "must be positive and finite")?;
        require(self.ray_casting.trace_steps >= 1, "ray_casting.trace_steps", "must be at least 1")?;
        require(
            self.ray_casting.trace_distance > 0.0 && self.ray_casting.trace_distance.is_finite(),
            "ray_casting.trace_distance",
            "must be positive and finite",
        )?;
        require(
            self.ray_casting.emission_randomness >= 0.0 && self.ray_casting.emission_randomness.is_finite(),
            "ray_casting.emission_randomness",
            "must be non-negative and finite",
        )?;
        require(
            self.reflection.spread >= 0.0 && self.reflection.spread.is_finite(),
            "reflection.spread",
            "must be non-negative and finite",
        )?;
        require(
            self.reflection.shininess > 0.0 && self.reflection.shininess.is_finite(),
            "reflection.shininess",
            "must be positive and finite",
        )?;
        require(
            self.reflection.energy_loss >= 0.0 && self.reflection.energy_loss <= 1.0,
            "reflection.energy_loss",
            "must be within [0, 1]",
        )?;
        require(self.screen.resolution >= 1, "screen.resolution", "must be at least 1")?;
        Ok(())
    }

    /// Field of view in radians.
    pub fn fov_radians(&self) -> f32 {
        self.camera.fov.to_radians()
    }

    /// Reflection spread in radians.
    pub fn spread_radians(&self) -> f32 {
        self.reflection.spread.to_radians()
    }

    /// Whether frames actually accumulate: debug tracing disables it, since a
    /// debug overlay of a half-converged average is unreadable.
    pub fn effective_accumulate(&self) -> bool {
        self.ray_casting.accumulate_light && !self.ray_casting.debug
    }
}
