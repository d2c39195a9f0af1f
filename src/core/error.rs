//! Error types for renderer configuration and drawing surfaces.

use thiserror::Error;

use super::color::ParseColorError;

/// Configuration rejected before any frame is scheduled
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("particle count must be greater than zero")]
    NoParticles,

    #[error("depth range must be a positive finite number, got {0}")]
    DepthRange(f64),

    #[error("max connection distance must be a non-negative finite number, got {0}")]
    ConnectionDistance(f64),

    #[error("speed scale must be a positive finite number, got {0}")]
    SpeedScale(f64),

    #[error("time step must be a finite number, got {0}")]
    TimeStep(f64),

    #[error("palette must contain at least one color")]
    EmptyPalette,

    #[error("invalid palette color: {0}")]
    PaletteColor(#[from] ParseColorError),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors surfaced synchronously by `start()`
#[derive(Debug, Error, PartialEq)]
pub enum StartError {
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),

    /// The surface had no usable size, so particles cannot be placed
    #[error("surface has no drawable area")]
    EmptySurface,
}

/// Per-frame drawing failures. Never propagated out of a frame.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("drawing surface unavailable")]
    Unavailable,

    #[error("drawing backend error: {0}")]
    Backend(String),
}
