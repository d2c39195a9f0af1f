//! Point cloud over an undulating plane

use super::Scene;
use crate::core::{Size, SurfaceError, WaveConfig, WaveField};
use crate::surface::{Glow, Surface};
use crate::theme::colors;

const PLANE_LINE_WIDTH: f64 = 1.0;

pub struct WaveScene {
    field: WaveField,
}

impl WaveScene {
    /// `config` must have passed `validate()`
    pub fn new(config: WaveConfig, bounds: Size) -> Self {
        Self {
            field: WaveField::new(config, bounds),
        }
    }

    pub fn field(&self) -> &WaveField {
        &self.field
    }

    /// Pointer position in surface pixels; tilts the cloud toward it
    pub fn set_pointer(&mut self, x: f64, y: f64) {
        self.field.set_pointer(x, y);
    }
}

impl Scene for WaveScene {
    fn advance(&mut self) {
        self.field.advance();
    }

    fn draw(&self, surface: &mut dyn Surface, _size: Size) -> Result<(), SurfaceError> {
        surface.clear()?;
        surface.fill(colors::WAVE_CLEAR)?;

        for (from, to, color) in self.field.plane_grid().segments() {
            surface.line(from, to, PLANE_LINE_WIDTH, color)?;
        }

        for p in self.field.project_cloud() {
            surface.glow(&Glow {
                center: [p.x, p.y],
                radius: p.radius,
                falloff: p.radius,
                color: p.color,
            })?;
        }
        Ok(())
    }

    fn resize(&mut self, size: Size) {
        self.field.resize(size);
    }
}
