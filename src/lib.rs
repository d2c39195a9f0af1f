//! depthfield - animated particle backdrops
//!
//! Two scenes share one frame loop:
//! - a drifting particle field with depth-faded glows and proximity links
//! - a point cloud floating over an undulating wave plane
//!
//! The simulation in `core` is platform-free. Scenes draw through the
//! `Surface` trait and are scheduled by a `FrameHost`: the browser canvas
//! and `requestAnimationFrame` under `--features wasm`, or the CPU raster
//! and recording surfaces driven by hand from the CLI, the native viewer
//! and tests.

pub mod core;
pub mod host;
pub mod renderer;
pub mod surface;
pub mod theme;
pub mod time;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub mod web;

#[cfg(all(not(target_arch = "wasm32"), feature = "viewer"))]
pub mod viewer;

pub use crate::core::{ConfigError, FieldConfig, Size, StartError, SurfaceError, WaveConfig};
pub use host::{FrameHost, ManualHost};
pub use renderer::{start, start_wave, AnyRenderer, RendererHandle, Scene, SceneConfig, Starfield, WaveScene};
pub use surface::{RasterSurface, RecordingSurface, Surface};
