//! Drawing surfaces
//!
//! Scenes draw through the `Surface` trait only. Every call can fail; the
//! renderer treats a failure as "skip the rest of this frame".

mod raster;
mod recording;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod canvas;

pub use raster::RasterSurface;
pub use recording::{DrawCommand, RecordingSurface};

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub use canvas::CanvasSurface;

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::{Rgba, Size, SurfaceError};

/// Two-stop radial gradient filling the whole surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialGradient {
    pub center: [f64; 2],
    pub radius: f64,
    pub inner: Rgba,
    pub outer: Rgba,
}

/// A filled disc of `radius` whose color fades from `color` at the center
/// to transparent at `falloff`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glow {
    pub center: [f64; 2],
    pub radius: f64,
    pub falloff: f64,
    pub color: Rgba,
}

impl Glow {
    /// Alpha multiplier at distance `d` from the center
    #[inline]
    pub fn fade_at(&self, d: f64) -> f64 {
        if d > self.radius || self.falloff <= 0.0 {
            0.0
        } else {
            (1.0 - d / self.falloff).max(0.0)
        }
    }
}

pub trait Surface {
    /// Current logical size, `None` while the surface cannot be drawn to
    fn size(&self) -> Option<Size>;

    /// Rescale the backing buffer to a new logical size
    fn resize(&mut self, size: Size) -> Result<(), SurfaceError>;

    /// Reset every pixel to transparent
    fn clear(&mut self) -> Result<(), SurfaceError>;

    /// Blend a flat color over the whole surface
    fn fill(&mut self, color: Rgba) -> Result<(), SurfaceError>;

    fn fill_radial(&mut self, gradient: &RadialGradient) -> Result<(), SurfaceError>;

    fn glow(&mut self, glow: &Glow) -> Result<(), SurfaceError>;

    fn line(&mut self, from: [f64; 2], to: [f64; 2], width: f64, color: Rgba)
        -> Result<(), SurfaceError>;
}

impl<S: Surface + ?Sized> Surface for Box<S> {
    fn size(&self) -> Option<Size> {
        (**self).size()
    }

    fn resize(&mut self, size: Size) -> Result<(), SurfaceError> {
        (**self).resize(size)
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        (**self).clear()
    }

    fn fill(&mut self, color: Rgba) -> Result<(), SurfaceError> {
        (**self).fill(color)
    }

    fn fill_radial(&mut self, gradient: &RadialGradient) -> Result<(), SurfaceError> {
        (**self).fill_radial(gradient)
    }

    fn glow(&mut self, glow: &Glow) -> Result<(), SurfaceError> {
        (**self).glow(glow)
    }

    fn line(&mut self, from: [f64; 2], to: [f64; 2], width: f64, color: Rgba) -> Result<(), SurfaceError> {
        (**self).line(from, to, width, color)
    }
}

/// Shared surface, for callers that read pixels back while a renderer owns it
impl<S: Surface + ?Sized> Surface for Rc<RefCell<S>> {
    fn size(&self) -> Option<Size> {
        self.borrow().size()
    }

    fn resize(&mut self, size: Size) -> Result<(), SurfaceError> {
        self.borrow_mut().resize(size)
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.borrow_mut().clear()
    }

    fn fill(&mut self, color: Rgba) -> Result<(), SurfaceError> {
        self.borrow_mut().fill(color)
    }

    fn fill_radial(&mut self, gradient: &RadialGradient) -> Result<(), SurfaceError> {
        self.borrow_mut().fill_radial(gradient)
    }

    fn glow(&mut self, glow: &Glow) -> Result<(), SurfaceError> {
        self.borrow_mut().glow(glow)
    }

    fn line(&mut self, from: [f64; 2], to: [f64; 2], width: f64, color: Rgba) -> Result<(), SurfaceError> {
        self.borrow_mut().line(from, to, width, color)
    }
}
