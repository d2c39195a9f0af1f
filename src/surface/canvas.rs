//! `<canvas>` 2D context surface (WASM only)

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::{Glow, RadialGradient, Surface};
use crate::core::{Rgba, Size, SurfaceError};

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

fn backend(e: JsValue) -> SurfaceError {
    SurfaceError::Backend(format!("{:?}", e))
}

impl CanvasSurface {
    /// Wrap a canvas, acquiring its 2D context
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn device_pixel_ratio() -> f64 {
        web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(1.0)
    }

    /// Layout size of the element in CSS pixels
    pub fn css_size(&self) -> Size {
        Size::new(self.canvas.offset_width() as f64, self.canvas.offset_height() as f64)
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Option<Size> {
        // Detached or display:none canvases report zero
        if !self.canvas.is_connected() {
            return None;
        }
        Some(self.css_size()).filter(Size::is_drawable)
    }

    fn resize(&mut self, size: Size) -> Result<(), SurfaceError> {
        let ratio = Self::device_pixel_ratio();
        self.canvas.set_width((size.width * ratio).round() as u32);
        self.canvas.set_height((size.height * ratio).round() as u32);
        // Resizing resets the context state, so the scale is set absolutely
        self.ctx
            .set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0)
            .map_err(backend)
    }

    fn clear(&mut self) -> Result<(), SurfaceError> {
        let size = self.size().ok_or(SurfaceError::Unavailable)?;
        self.ctx.clear_rect(0.0, 0.0, size.width, size.height);
        Ok(())
    }

    fn fill(&mut self, color: Rgba) -> Result<(), SurfaceError> {
        let size = self.size().ok_or(SurfaceError::Unavailable)?;
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(0.0, 0.0, size.width, size.height);
        Ok(())
    }

    fn fill_radial(&mut self, gradient: &RadialGradient) -> Result<(), SurfaceError> {
        let size = self.size().ok_or(SurfaceError::Unavailable)?;
        let [cx, cy] = gradient.center;
        let fill = self
            .ctx
            .create_radial_gradient(cx, cy, 0.0, cx, cy, gradient.radius)
            .map_err(backend)?;
        fill.add_color_stop(0.0, &gradient.inner.to_css()).map_err(backend)?;
        fill.add_color_stop(1.0, &gradient.outer.to_css()).map_err(backend)?;
        self.ctx.set_fill_style_canvas_gradient(&fill);
        self.ctx.fill_rect(0.0, 0.0, size.width, size.height);
        Ok(())
    }

    fn glow(&mut self, glow: &Glow) -> Result<(), SurfaceError> {
        if glow.radius <= 0.0 {
            return Ok(());
        }
        let [x, y] = glow.center;
        let fill = self
            .ctx
            .create_radial_gradient(x, y, 0.0, x, y, glow.falloff.max(glow.radius))
            .map_err(backend)?;
        fill.add_color_stop(0.0, &glow.color.to_css()).map_err(backend)?;
        fill.add_color_stop(1.0, &glow.color.with_alpha(0.0).to_css())
            .map_err(backend)?;

        self.ctx.begin_path();
        self.ctx.arc(x, y, glow.radius, 0.0, TAU).map_err(backend)?;
        self.ctx.set_fill_style_canvas_gradient(&fill);
        self.ctx.fill();
        Ok(())
    }

    fn line(&mut self, from: [f64; 2], to: [f64; 2], width: f64, color: Rgba) -> Result<(), SurfaceError> {
        self.ctx.begin_path();
        self.ctx.move_to(from[0], from[1]);
        self.ctx.line_to(to[0], to[1]);
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width);
        self.ctx.stroke();
        Ok(())
    }
}
