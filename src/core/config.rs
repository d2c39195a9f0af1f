//! Renderer configuration
//!
//! Both configs deserialize from camelCase JSON with every field optional.
//! `validate()` turns the loose form into checked parameters; scenes only
//! ever see the checked form.

use serde::{Deserialize, Serialize};

use super::color::Rgba;
use super::error::ConfigError;
use crate::theme;

/// Above this many particles `LinkStrategy::Auto` switches to the grid
pub const GRID_THRESHOLD: usize = 256;

/// How proximity lines are searched for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkStrategy {
    #[default]
    Auto,
    AllPairs,
    Grid,
}

impl LinkStrategy {
    /// Resolve `Auto` for a given pool size
    pub fn resolve(self, particle_count: usize) -> LinkStrategy {
        match self {
            LinkStrategy::Auto if particle_count > GRID_THRESHOLD => LinkStrategy::Grid,
            LinkStrategy::Auto => LinkStrategy::AllPairs,
            other => other,
        }
    }
}

/// Particle field (hero starfield) configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldConfig {
    pub particle_count: usize,
    pub depth_range: f64,
    pub max_connection_distance: f64,
    /// CSS hex colors
    pub palette: Vec<String>,
    pub speed_scale: f64,
    /// Added to the drift clock every frame
    pub time_step: f64,
    pub link_strategy: LinkStrategy,
    /// Fixed seed for reproducible placement; entropy when absent
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            particle_count: 80,
            depth_range: 1000.0,
            max_connection_distance: 120.0,
            palette: theme::FIELD_PALETTE.iter().map(|s| s.to_string()).collect(),
            speed_scale: 1.0,
            time_step: 0.01,
            link_strategy: LinkStrategy::Auto,
            seed: None,
        }
    }
}

/// Checked field parameters
#[derive(Clone, Debug, PartialEq)]
pub struct FieldParams {
    pub particle_count: usize,
    pub depth_range: f64,
    pub max_connection_distance: f64,
    pub palette: Vec<Rgba>,
    pub speed_scale: f64,
    pub time_step: f64,
    pub link_strategy: LinkStrategy,
    pub seed: Option<u64>,
}

impl FieldConfig {
    pub fn validate(&self) -> Result<FieldParams, ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::NoParticles);
        }
        if !(self.depth_range.is_finite() && self.depth_range > 0.0) {
            return Err(ConfigError::DepthRange(self.depth_range));
        }
        if !(self.max_connection_distance.is_finite() && self.max_connection_distance >= 0.0) {
            return Err(ConfigError::ConnectionDistance(self.max_connection_distance));
        }
        if !(self.speed_scale.is_finite() && self.speed_scale > 0.0) {
            return Err(ConfigError::SpeedScale(self.speed_scale));
        }
        if !self.time_step.is_finite() {
            return Err(ConfigError::TimeStep(self.time_step));
        }
        if self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        let palette = self
            .palette
            .iter()
            .map(|hex| hex.parse::<Rgba>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FieldParams {
            particle_count: self.particle_count,
            depth_range: self.depth_range,
            max_connection_distance: self.max_connection_distance,
            palette,
            speed_scale: self.speed_scale,
            time_step: self.time_step,
            link_strategy: self.link_strategy.resolve(self.particle_count),
            seed: self.seed,
        })
    }
}

/// Projects-section wave scene configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaveConfig {
    pub particle_count: usize,
    /// Box the cloud is scattered in, centered on the origin
    pub spread: [f32; 3],
    /// Point size range before perspective
    pub point_size: [f32; 2],
    pub hue: [f32; 2],
    pub lightness: [f32; 2],
    pub saturation: f32,
    pub plane_size: f32,
    pub plane_segments: usize,
    pub amplitude: f32,
    /// Cloud yaw per frame
    pub spin: f32,
    /// Plane roll per frame
    pub plane_spin: f32,
    pub pointer_sensitivity: f32,
    pub pixel_ratio: f32,
    pub time_step: f32,
    pub seed: Option<u64>,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            particle_count: 2500,
            spread: [3000.0, 2000.0, 2000.0],
            point_size: [1.0, 5.0],
            hue: [0.6, 0.7],
            lightness: [0.3, 0.7],
            saturation: 0.8,
            plane_size: 2000.0,
            plane_segments: 48,
            amplitude: 20.0,
            spin: 0.0008,
            plane_spin: 0.0005,
            pointer_sensitivity: 0.00003,
            pixel_ratio: 1.0,
            time_step: 0.01,
            seed: None,
        }
    }
}

impl WaveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::NoParticles);
        }
        if self.plane_segments == 0 {
            return Err(invalid("planeSegments", "must be greater than zero"));
        }
        if !(self.plane_size.is_finite() && self.plane_size > 0.0) {
            return Err(invalid("planeSize", "must be a positive finite number"));
        }
        if self.spread.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(invalid("spread", "extents must be non-negative and finite"));
        }
        check_range("pointSize", self.point_size)?;
        check_range("hue", self.hue)?;
        check_range("lightness", self.lightness)?;
        if self.point_size[0] <= 0.0 {
            return Err(invalid("pointSize", "sizes must be positive"));
        }
        let finite = [
            self.saturation,
            self.amplitude,
            self.spin,
            self.plane_spin,
            self.pointer_sensitivity,
            self.pixel_ratio,
            self.time_step,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(invalid("wave", "all numeric settings must be finite"));
        }
        Ok(())
    }

    /// Device pixel ratio as the scene uses it
    pub fn clamped_pixel_ratio(&self) -> f32 {
        self.pixel_ratio.clamp(1.0, 2.0)
    }
}

fn check_range(field: &'static str, [lo, hi]: [f32; 2]) -> Result<(), ConfigError> {
    if lo.is_finite() && hi.is_finite() && lo <= hi {
        Ok(())
    } else {
        Err(invalid(field, &format!("expected [min, max], got [{}, {}]", lo, hi)))
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let params = FieldConfig::default().validate().unwrap();
        assert_eq!(params.particle_count, 80);
        assert_eq!(params.depth_range, 1000.0);
        assert_eq!(params.max_connection_distance, 120.0);
        assert_eq!(params.palette.len(), 4);
        assert_eq!(params.link_strategy, LinkStrategy::AllPairs);

        WaveConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_field_config() {
        let zero = FieldConfig {
            particle_count: 0,
            ..Default::default()
        };
        assert_eq!(zero.validate(), Err(ConfigError::NoParticles));

        let depth = FieldConfig {
            depth_range: 0.0,
            ..Default::default()
        };
        assert_eq!(depth.validate(), Err(ConfigError::DepthRange(0.0)));

        let empty = FieldConfig {
            palette: vec![],
            ..Default::default()
        };
        assert_eq!(empty.validate(), Err(ConfigError::EmptyPalette));

        let bad_color = FieldConfig {
            palette: vec!["blue".into()],
            ..Default::default()
        };
        assert!(matches!(bad_color.validate(), Err(ConfigError::PaletteColor(_))));

        let speed = FieldConfig {
            speed_scale: -1.0,
            ..Default::default()
        };
        assert_eq!(speed.validate(), Err(ConfigError::SpeedScale(-1.0)));

        let links = FieldConfig {
            max_connection_distance: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(links.validate(), Err(ConfigError::ConnectionDistance(_))));
    }

    #[test]
    fn test_zero_connection_distance_is_allowed() {
        let cfg = FieldConfig {
            max_connection_distance: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_json_camel_case() {
        let cfg: FieldConfig = serde_json::from_str(
            r##"{"particleCount": 12, "maxConnectionDistance": 50, "palette": ["#ffffff"], "linkStrategy": "grid", "seed": 7}"##,
        )
        .unwrap();
        assert_eq!(cfg.particle_count, 12);
        assert_eq!(cfg.max_connection_distance, 50.0);
        assert_eq!(cfg.depth_range, 1000.0);
        assert_eq!(cfg.link_strategy, LinkStrategy::Grid);
        assert_eq!(cfg.seed, Some(7));

        let wave: WaveConfig = serde_json::from_str(r#"{"planeSegments": 8}"#).unwrap();
        assert_eq!(wave.plane_segments, 8);
        assert_eq!(wave.particle_count, 2500);
    }

    #[test]
    fn test_auto_link_strategy() {
        assert_eq!(LinkStrategy::Auto.resolve(80), LinkStrategy::AllPairs);
        assert_eq!(LinkStrategy::Auto.resolve(GRID_THRESHOLD + 1), LinkStrategy::Grid);
        assert_eq!(LinkStrategy::AllPairs.resolve(10_000), LinkStrategy::AllPairs);
    }

    #[test]
    fn test_rejects_bad_wave_config() {
        let segments = WaveConfig {
            plane_segments: 0,
            ..Default::default()
        };
        assert!(matches!(
            segments.validate(),
            Err(ConfigError::Invalid { field: "planeSegments", .. })
        ));

        let hue = WaveConfig {
            hue: [0.7, 0.6],
            ..Default::default()
        };
        assert!(hue.validate().is_err());
    }
}
