//! Platform-agnostic core - simulation state shared by the browser, viewer and CLI

pub mod color;
pub mod config;
pub mod error;
pub mod field;
pub mod links;
pub mod particle;
pub mod wave;

pub use color::Rgba;
pub use config::{FieldConfig, FieldParams, LinkStrategy, WaveConfig};
pub use error::{ConfigError, StartError, SurfaceError};
pub use field::ParticleField;
pub use links::Link;
pub use particle::Particle;
pub use wave::WaveField;

/// Logical surface size in CSS pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both extents positive and finite
    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}
