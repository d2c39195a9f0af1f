//! CPU RGBA surface for headless rendering and snapshots
//!
//! One logical pixel per buffer pixel, straight alpha, source-over blending.

use super::{Glow, RadialGradient, Surface};
use crate::core::{Rgba, Size, SurfaceError};

#[derive(Clone, Debug)]
pub struct RasterSurface {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl RasterSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
        }
    }

    /// Raw RGBA bytes, row-major
    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// RGBA bytes with every pixel flattened over an opaque `background`
    pub fn composited_over(&self, background: Rgba) -> Vec<u8> {
        let bg = background.with_alpha(1.0);
        let mut out = Vec::with_capacity(self.pixels.len());
        for px in self.pixels.chunks_exact(4) {
            let a = px[3] as f32 / 255.0;
            let src = Rgba::from_rgb8(px[0], px[1], px[2]);
            out.extend_from_slice(&bg.lerp(src, a).to_rgba8());
        }
        out
    }

    fn blend(&mut self, x: usize, y: usize, src: Rgba) {
        let sa = src.a.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let i = (y * self.width + x) * 4;
        let dst = &mut self.pixels[i..i + 4];
        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        let mix = |s: f32, d: u8| {
            let d = d as f32 / 255.0;
            let c = (s * sa + d * da * (1.0 - sa)) / out_a;
            (c.clamp(0.0, 1.0) * 255.0).round() as u8
        };
        dst[0] = mix(src.r, dst[0]);
        dst[1] = mix(src.g, dst[1]);
        dst[2] = mix(src.b, dst[2]);
        dst[3] = (out_a * 255.0).round() as u8;
    }

    /// Pixel index range covering `[lo, hi]` in one axis, clipped to `extent`
    fn span(lo: f64, hi: f64, extent: usize) -> std::ops::Range<usize> {
        let start = lo.floor().max(0.0) as usize;
        let end = (hi.ceil().max(0.0) as usize).min(extent);
        start.min(end)..end
    }
}

/// Distance from `p` to the segment `a`-`b`
fn segment_distance(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let (abx, aby) = (b[0] - a[0], b[1] - a[1]);
    let (apx, apy) = (p[0] - a[0], p[1] - a[1]);
    let len2 = abx * abx + aby * aby;
    let t = if len2 > 0.0 {
        ((apx * abx + apy * aby) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (dx, dy) = (apx - abx * t, apy - aby * t);
    (dx * dx + dy * dy).sqrt()
}

impl Surface for RasterSurface {
    fn size(&self) -> Option<Size> {
        let size = Size::new(self.width as f64, self.height as f64);
        size.is_drawable().then_some(size)
    }

    fn resize(&mut self, size: Size) -> Result<(), SurfaceError> {
        if !size.is_drawable() {
            return Err(SurfaceError::Backend(format!("cannot resize to {:?}", size)));
        }
        self.width = size.width.round() as usize;
        self.height = size.height.round() as usize;
        self.pixels = vec![0; self.width * self.height * 4];
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.pixels.fill(0);
        Ok(())
    }

    fn fill(&mut self, color: Rgba) -> Result<(), SurfaceError> {
        for y in 0..self.height {
            for x in 0..self.width {
                self.blend(x, y, color);
            }
        }
        Ok(())
    }

    fn fill_radial(&mut self, gradient: &RadialGradient) -> Result<(), SurfaceError> {
        let [cx, cy] = gradient.center;
        let radius = gradient.radius.max(f64::EPSILON);
        for y in 0..self.height {
            for x in 0..self.width {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                let t = ((dx * dx + dy * dy).sqrt() / radius) as f32;
                self.blend(x, y, gradient.inner.lerp(gradient.outer, t));
            }
        }
        Ok(())
    }

    fn glow(&mut self, glow: &Glow) -> Result<(), SurfaceError> {
        let [cx, cy] = glow.center;
        let r = glow.radius;
        if r <= 0.0 {
            return Ok(());
        }
        for y in Self::span(cy - r, cy + r, self.height) {
            for x in Self::span(cx - r, cx + r, self.width) {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                let fade = glow.fade_at((dx * dx + dy * dy).sqrt());
                if fade > 0.0 {
                    self.blend(x, y, glow.color.with_alpha(glow.color.a * fade as f32));
                }
            }
        }
        Ok(())
    }

    fn line(&mut self, from: [f64; 2], to: [f64; 2], width: f64, color: Rgba) -> Result<(), SurfaceError> {
        let reach = width * 0.5 + 1.0;
        let xs = Self::span(from[0].min(to[0]) - reach, from[0].max(to[0]) + reach, self.width);
        let ys = Self::span(from[1].min(to[1]) - reach, from[1].max(to[1]) + reach, self.height);
        for y in ys {
            for x in xs.clone() {
                let d = segment_distance([x as f64 + 0.5, y as f64 + 0.5], from, to);
                let coverage = (width * 0.5 + 0.5 - d).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, color.with_alpha(color.a * coverage as f32));
                }
            }
        }
        Ok(())
    }
}
