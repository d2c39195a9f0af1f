//! Drifting particle field with proximity links

use super::Scene;
use crate::core::{ParticleField, FieldParams, Size, SurfaceError};
use crate::surface::{Glow, RadialGradient, Surface};
use crate::theme::colors;

/// Glow falloff as a multiple of the particle radius
const GLOW_REACH: f64 = 3.0;

pub struct Starfield {
    field: ParticleField,
}

impl Starfield {
    pub fn new(params: FieldParams, bounds: Size) -> Self {
        Self {
            field: ParticleField::new(params, bounds),
        }
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut ParticleField {
        &mut self.field
    }
}

impl Scene for Starfield {
    fn advance(&mut self) {
        self.field.advance();
    }

    fn draw(&self, surface: &mut dyn Surface, size: Size) -> Result<(), SurfaceError> {
        surface.clear()?;

        let (cx, cy) = size.center();
        surface.fill_radial(&RadialGradient {
            center: [cx, cy],
            radius: size.width.max(size.height) / 2.0,
            inner: colors::BACKDROP_INNER,
            outer: colors::BACKDROP_OUTER,
        })?;

        let params = self.field.params();
        let range = params.depth_range;
        for p in self.field.particles() {
            let radius = p.effective_radius(range);
            if radius <= 0.0 {
                continue;
            }
            let base = params.palette[p.color];
            surface.glow(&Glow {
                center: [p.x, p.y],
                radius,
                falloff: radius * GLOW_REACH,
                color: base.with_alpha(base.a * p.effective_alpha(range) as f32),
            })?;
        }

        let particles = self.field.particles();
        for link in self.field.links() {
            let (a, b) = (&particles[link.a], &particles[link.b]);
            surface.line(
                [a.x, a.y],
                [b.x, b.y],
                colors::LINK_WIDTH,
                colors::LINK.with_alpha(link.alpha as f32),
            )?;
        }
        Ok(())
    }

    fn resize(&mut self, size: Size) {
        self.field.resize(size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FieldConfig;
    use crate::surface::{DrawCommand, RecordingSurface};

    fn starfield(config: FieldConfig) -> Starfield {
        Starfield::new(config.validate().unwrap(), Size::new(400.0, 300.0))
    }

    #[test]
    fn test_draw_order() {
        let scene = starfield(FieldConfig {
            particle_count: 40,
            seed: Some(7),
            ..Default::default()
        });
        let mut surface = RecordingSurface::new(Size::new(400.0, 300.0));
        scene.draw(&mut surface, Size::new(400.0, 300.0)).unwrap();

        let commands = surface.commands();
        assert_eq!(commands[0], DrawCommand::Clear);
        match &commands[1] {
            DrawCommand::Radial(g) => {
                assert_eq!(g.center, [200.0, 150.0]);
                assert_eq!(g.radius, 200.0);
            }
            other => panic!("expected backdrop, got {:?}", other),
        }
        // Every glow precedes every line
        let first_line = commands.iter().position(|c| matches!(c, DrawCommand::Line { .. }));
        let last_glow = commands.iter().rposition(|c| matches!(c, DrawCommand::Glow(_)));
        if let (Some(line), Some(glow)) = (first_line, last_glow) {
            assert!(glow < line);
        }
    }

    #[test]
    fn test_glow_follows_depth() {
        let mut scene = starfield(FieldConfig {
            particle_count: 2,
            max_connection_distance: 0.0,
            palette: vec!["#ff0000".into()],
            seed: Some(3),
            ..Default::default()
        });
        {
            let ps = scene.field_mut().particles_mut();
            ps[0].x = 100.0;
            ps[0].y = 100.0;
            ps[0].depth = 0.0;
            ps[0].radius = 2.0;
            ps[0].opacity = 1.0;
            // At the far plane it vanishes
            ps[1].depth = 1000.0;
        }
        let mut surface = RecordingSurface::new(Size::new(400.0, 300.0));
        scene.draw(&mut surface, Size::new(400.0, 300.0)).unwrap();

        let glows: Vec<Glow> = surface
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                DrawCommand::Glow(g) => Some(g),
                _ => None,
            })
            .collect();
        assert_eq!(glows.len(), 1);
        assert_eq!(glows[0].center, [100.0, 100.0]);
        assert_eq!(glows[0].radius, 2.0);
        assert_eq!(glows[0].falloff, 6.0);
        assert_eq!(glows[0].color.r, 1.0);
        assert_eq!(glows[0].color.a, 1.0);
    }

    #[test]
    fn test_glow_falloff_scales_with_depth() {
        let mut scene = starfield(FieldConfig {
            particle_count: 1,
            palette: vec!["#1e40af".into()],
            seed: Some(5),
            ..Default::default()
        });
        {
            let p = &mut scene.field_mut().particles_mut()[0];
            p.x = 50.0;
            p.y = 50.0;
            p.depth = 500.0;
            p.radius = 2.0;
            p.opacity = 0.8;
        }
        let mut surface = RecordingSurface::new(Size::new(400.0, 300.0));
        scene.draw(&mut surface, Size::new(400.0, 300.0)).unwrap();

        let glow = surface
            .commands()
            .into_iter()
            .find_map(|c| match c {
                DrawCommand::Glow(g) => Some(g),
                _ => None,
            })
            .unwrap();
        assert_eq!(glow.radius, 1.0);
        assert_eq!(glow.falloff, 3.0);
        assert!((glow.color.a - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_draw_fails_fast() {
        let scene = starfield(FieldConfig {
            particle_count: 5,
            seed: Some(1),
            ..Default::default()
        });
        let mut surface = RecordingSurface::new(Size::new(400.0, 300.0));
        surface.set_available(None);
        assert_eq!(
            scene.draw(&mut surface, Size::new(400.0, 300.0)),
            Err(SurfaceError::Unavailable)
        );
    }
}
