//! A single starfield particle and its random initialization

use rand::Rng;

use super::Size;

/// One simulated point. Everything but position and depth is fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    /// Distance from the viewer in [0, depth_range], 0 = nearest
    pub depth: f64,
    pub radius: f64,
    pub vx: f64,
    pub vy: f64,
    pub vdepth: f64,
    /// Base opacity in [0.2, 1.0]
    pub opacity: f64,
    /// Index into the palette
    pub color: usize,
}

impl Particle {
    pub const RADIUS: (f64, f64) = (1.0, 4.0);
    pub const PLANAR_SPEED: f64 = 0.4;
    pub const DEPTH_SPEED: (f64, f64) = (0.5, 2.5);
    pub const OPACITY: (f64, f64) = (0.2, 1.0);

    /// Fresh particle placed uniformly within `bounds` and `[0, depth_range]`
    pub fn spawn<R: Rng + ?Sized>(
        rng: &mut R,
        bounds: Size,
        depth_range: f64,
        palette_len: usize,
    ) -> Self {
        let (x, y) = random_point(rng, bounds);
        Self {
            x,
            y,
            depth: rng.gen_range(0.0..=depth_range),
            radius: rng.gen_range(Self::RADIUS.0..=Self::RADIUS.1),
            vx: rng.gen_range(-Self::PLANAR_SPEED..=Self::PLANAR_SPEED),
            vy: rng.gen_range(-Self::PLANAR_SPEED..=Self::PLANAR_SPEED),
            vdepth: rng.gen_range(Self::DEPTH_SPEED.0..=Self::DEPTH_SPEED.1),
            opacity: rng.gen_range(Self::OPACITY.0..=Self::OPACITY.1),
            color: rng.gen_range(0..palette_len.max(1)),
        }
    }

    /// Depth scale: 1 at the viewer, 0 at the far plane
    #[inline]
    pub fn scale(&self, depth_range: f64) -> f64 {
        ((depth_range - self.depth) / depth_range).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn effective_radius(&self, depth_range: f64) -> f64 {
        self.radius * self.scale(depth_range)
    }

    #[inline]
    pub fn effective_alpha(&self, depth_range: f64) -> f64 {
        self.opacity * self.scale(depth_range)
    }
}

/// Uniform point in `[0, w) x [0, h)`
pub fn random_point<R: Rng + ?Sized>(rng: &mut R, bounds: Size) -> (f64, f64) {
    (
        rng.gen_range(0.0..bounds.width),
        rng.gen_range(0.0..bounds.height),
    )
}
