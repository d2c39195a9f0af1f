//! Native preview window
//!
//! The renderer draws into a `RecordingSurface`; every egui frame drives one
//! renderer frame through a `ManualHost` and replays the recorded commands
//! onto the panel painter.

use eframe::egui;
use tracing::{info, warn};

use crate::core::{Rgba, Size};
use crate::host::ManualHost;
use crate::renderer::{AnyRenderer, SceneConfig};
use crate::surface::{DrawCommand, Glow, RadialGradient, RecordingSurface};
use crate::theme::colors;
use crate::time::FpsCounter;

/// Rim vertices of gradient discs
const FAN_SEGMENTS: usize = 24;

pub fn color32(c: Rgba) -> egui::Color32 {
    let [r, g, b, a] = c.to_rgba8();
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}

/// Append a disc to `mesh`, `inner` at the center fading to `outer` at `radius`
fn radial_fan(mesh: &mut egui::Mesh, center: egui::Pos2, radius: f32, inner: Rgba, outer: Rgba) {
    let base = mesh.vertices.len() as u32;
    mesh.colored_vertex(center, color32(inner));
    for i in 0..FAN_SEGMENTS {
        let angle = i as f32 / FAN_SEGMENTS as f32 * std::f32::consts::TAU;
        let rim = center + egui::vec2(angle.cos(), angle.sin()) * radius;
        mesh.colored_vertex(rim, color32(outer));
    }
    for i in 0..FAN_SEGMENTS as u32 {
        let next = (i + 1) % FAN_SEGMENTS as u32;
        mesh.add_triangle(base, base + 1 + i, base + 1 + next);
    }
}

/// Paint recorded commands into `rect`, surface origin at `rect.min`
pub fn replay(painter: &egui::Painter, rect: egui::Rect, commands: &[DrawCommand]) {
    let at = |[x, y]: [f64; 2]| rect.min + egui::vec2(x as f32, y as f32);
    let mut mesh = egui::Mesh::default();
    let flush = |mesh: &mut egui::Mesh| {
        if !mesh.is_empty() {
            painter.add(egui::Shape::mesh(std::mem::take(mesh)));
        }
    };

    for command in commands {
        match command {
            // The panel fill is the backdrop
            DrawCommand::Clear => {}
            DrawCommand::Fill(color) => {
                flush(&mut mesh);
                painter.rect_filled(rect, 0.0, color32(*color));
            }
            DrawCommand::Radial(RadialGradient {
                center,
                radius,
                inner,
                outer,
            }) => {
                flush(&mut mesh);
                painter.rect_filled(rect, 0.0, color32(*outer));
                radial_fan(&mut mesh, at(*center), *radius as f32, *inner, *outer);
            }
            DrawCommand::Glow(glow) => {
                let Glow { center, radius, .. } = *glow;
                let rim = glow.color.with_alpha(glow.color.a * glow.fade_at(radius) as f32);
                radial_fan(&mut mesh, at(center), radius as f32, glow.color, rim);
            }
            DrawCommand::Line {
                from,
                to,
                width,
                color,
            } => {
                flush(&mut mesh);
                painter.line_segment([at(*from), at(*to)], egui::Stroke::new(*width as f32, color32(*color)));
            }
        }
    }
    flush(&mut mesh);
}

pub struct ViewerApp {
    config: SceneConfig,
    host: ManualHost,
    surface: Option<RecordingSurface>,
    renderer: Option<AnyRenderer>,
    size: Option<Size>,
    error: Option<String>,
    fps_counter: FpsCounter,
}

impl ViewerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: SceneConfig) -> Self {
        Self {
            config,
            host: ManualHost::new(),
            surface: None,
            renderer: None,
            size: None,
            error: None,
            fps_counter: FpsCounter::new(),
        }
    }

    /// Start on the first frame with a usable panel, resize afterwards
    fn sync_size(&mut self, size: Size) {
        if !size.is_drawable() || self.error.is_some() || self.size == Some(size) {
            return;
        }
        self.size = Some(size);
        if self.renderer.is_some() {
            self.host.resize(size);
            return;
        }

        let surface = RecordingSurface::new(size);
        match AnyRenderer::start(surface.clone(), &self.config, self.host.clone()) {
            Ok(renderer) => {
                info!(scene = self.config.name(), width = size.width, height = size.height, "Viewer started");
                self.surface = Some(surface);
                self.renderer = Some(renderer);
            }
            Err(e) => {
                warn!(error = %e, "Failed to start renderer");
                self.error = Some(e.to_string());
            }
        }
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        self.fps_counter.tick();

        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(format!("{:.0} fps", self.fps_counter.fps()))
                    .color(color32(colors::TEXT_SECONDARY))
                    .monospace()
                    .size(11.0),
            );
            ui.label(egui::RichText::new("/").color(color32(colors::TEXT_MUTED)).size(11.0));
            ui.label(
                egui::RichText::new(self.config.name())
                    .color(color32(colors::TEXT_MUTED))
                    .monospace()
                    .size(11.0),
            );

            if let Some(renderer) = &self.renderer {
                ui.label(egui::RichText::new("/").color(color32(colors::TEXT_MUTED)).size(11.0));
                ui.label(
                    egui::RichText::new(renderer.summary())
                        .color(color32(colors::TEXT_MUTED))
                        .monospace()
                        .size(11.0),
                );
                if renderer.skipped_frames() > 0 {
                    ui.label(egui::RichText::new("/").color(color32(colors::TEXT_MUTED)).size(11.0));
                    ui.label(
                        egui::RichText::new(format!("{} skipped", renderer.skipped_frames()))
                            .color(color32(colors::TEXT_MUTED))
                            .monospace()
                            .size(11.0),
                    );
                }
            }

            if let Some(error) = &self.error {
                ui.colored_label(color32(colors::TEXT_ERROR), egui::RichText::new(error).size(11.0));
            }
        });
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Continuous animation
        ctx.request_repaint();

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(color32(colors::PAGE_BG)))
            .show(ctx, |ui| {
                self.render_header(ui);
                ui.add_space(4.0);

                let available = ui.available_size();
                let (response, painter) = ui.allocate_painter(available, egui::Sense::hover());
                let rect = response.rect;
                self.sync_size(Size::new(rect.width() as f64, rect.height() as f64));

                if let (Some(renderer), Some(pos)) = (&self.renderer, response.hover_pos()) {
                    let local = pos - rect.min;
                    renderer.set_pointer(local.x as f64, local.y as f64);
                }

                self.host.run_frame();

                if let Some(surface) = &self.surface {
                    surface.with_commands(|commands| replay(&painter, rect, commands));
                }
            });
    }
}
