//! Point cloud over an undulating plane, seen through a perspective camera
//!
//! Positions stay in world units; `project_cloud()` and `plane_grid()` map
//! them to surface pixels for the current bounds. Nothing here draws.

use glam::{Mat4, Vec3, Vec4};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::color::Rgba;
use super::config::WaveConfig;
use super::Size;
use crate::theme::colors;

const FOV_Y_DEGREES: f32 = 75.0;
const NEAR: f32 = 1.0;
const FAR: f32 = 3000.0;
const CAMERA_Z: f32 = 1000.0;
const PLANE_Y: f32 = -200.0;
/// Screen-space attenuation numerator for point sizes
const POINT_SCALE: f32 = 300.0;

/// Cloud point in world space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudPoint {
    pub position: Vec3,
    pub size: f32,
    pub color: Rgba,
}

/// Cloud point mapped to the surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub depth: f32,
    pub color: Rgba,
}

/// Wave plane vertices, row-major, `(segments + 1)²` of them
#[derive(Clone, Debug)]
pub struct PlaneGrid {
    pub columns: usize,
    /// `None` where the vertex falls outside the clip volume
    pub vertices: Vec<Option<[f64; 2]>>,
    pub colors: Vec<Rgba>,
}

impl PlaneGrid {
    /// Grid segments along rows and columns whose endpoints are both visible
    pub fn segments(&self) -> impl Iterator<Item = ([f64; 2], [f64; 2], Rgba)> + '_ {
        let cols = self.columns;
        let rows = self.vertices.len() / cols;
        (0..rows).flat_map(move |r| {
            (0..cols).flat_map(move |c| {
                let i = r * cols + c;
                let right = (c + 1 < cols).then_some(i + 1);
                let down = (r + 1 < rows).then_some(i + cols);
                [right, down].into_iter().flatten().filter_map(move |j| {
                    match (self.vertices[i], self.vertices[j]) {
                        (Some(a), Some(b)) => Some((a, b, self.colors[i])),
                        _ => None,
                    }
                })
            })
        })
    }
}

pub struct WaveField {
    config: WaveConfig,
    points: Vec<CloudPoint>,
    bounds: Size,
    time: f32,
    /// Cloud pitch and yaw
    rotation: (f32, f32),
    plane_roll: f32,
    /// Pointer offset from the surface center
    pointer: (f32, f32),
}

impl WaveField {
    /// Scatter the cloud. `config` must have passed `validate()`.
    pub fn new(config: WaveConfig, bounds: Size) -> Self {
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let [sx, sy, sz] = config.spread;
        let points = (0..config.particle_count)
            .map(|_| {
                let position = Vec3::new(
                    (rng.gen::<f32>() - 0.5) * sx,
                    (rng.gen::<f32>() - 0.5) * sy,
                    (rng.gen::<f32>() - 0.5) * sz,
                );
                let hue = sample(&mut rng, config.hue);
                let lightness = sample(&mut rng, config.lightness);
                CloudPoint {
                    position,
                    size: sample(&mut rng, config.point_size),
                    color: Rgba::from_hsl(hue, config.saturation, lightness),
                }
            })
            .collect();

        debug!(count = config.particle_count, "Wave cloud populated");

        Self {
            config,
            points,
            bounds,
            time: 0.0,
            rotation: (0.0, 0.0),
            plane_roll: 0.0,
            pointer: (0.0, 0.0),
        }
    }

    pub fn advance(&mut self) {
        let c = &self.config;
        self.time += c.time_step;
        self.rotation.0 += self.pointer.1 * c.pointer_sensitivity;
        self.rotation.1 += self.pointer.0 * c.pointer_sensitivity + c.spin;
        self.plane_roll += c.plane_spin;
    }

    pub fn resize(&mut self, bounds: Size) {
        if bounds.is_drawable() {
            self.bounds = bounds;
        }
    }

    /// Pointer position in surface pixels
    pub fn set_pointer(&mut self, x: f64, y: f64) {
        let (cx, cy) = self.bounds.center();
        self.pointer = ((x - cx) as f32, (y - cy) as f32);
    }

    fn projection(&self) -> Mat4 {
        let aspect = (self.bounds.width / self.bounds.height) as f32;
        Mat4::perspective_rh_gl(FOV_Y_DEGREES.to_radians(), aspect, NEAR, FAR)
    }

    fn view(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -CAMERA_Z))
    }

    /// Clip-space position to surface pixels, `None` outside the frustum
    fn to_screen(&self, clip: Vec4) -> Option<[f64; 2]> {
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !(-1.0..=1.0).contains(&ndc.z) || ndc.x.abs() > 1.1 || ndc.y.abs() > 1.1 {
            return None;
        }
        Some([
            ((ndc.x as f64) + 1.0) * 0.5 * self.bounds.width,
            (1.0 - ndc.y as f64) * 0.5 * self.bounds.height,
        ])
    }

    /// Displaced, rotated and projected cloud points, far to near
    pub fn project_cloud(&self) -> Vec<ProjectedPoint> {
        let t = self.time;
        let model = Mat4::from_rotation_x(self.rotation.0) * Mat4::from_rotation_y(self.rotation.1);
        let model_view = self.view() * model;
        let projection = self.projection();
        let pixel_ratio = self.config.clamped_pixel_ratio();

        let mut projected: Vec<ProjectedPoint> = self
            .points
            .iter()
            .filter_map(|p| {
                let base = p.position;
                let displaced = Vec3::new(
                    base.x + (t * 0.3 + base.y * 0.01).cos() * 5.0,
                    base.y + (t * 0.5 + base.x * 0.01).sin() * 10.0,
                    base.z,
                );
                let eye = model_view * displaced.extend(1.0);
                let depth = -eye.z;
                if depth <= NEAR {
                    return None;
                }
                let [x, y] = self.to_screen(projection * eye)?;
                let diameter = p.size * pixel_ratio * (POINT_SCALE / depth);
                Some(ProjectedPoint {
                    x,
                    y,
                    radius: (diameter * 0.5) as f64,
                    depth,
                    color: p.color,
                })
            })
            .collect();

        projected.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        projected
    }

    /// Elevation of the plane at local coordinates
    pub fn elevation(&self, x: f32, y: f32) -> f32 {
        let t = self.time;
        (x * 0.01 + t * 0.5).sin() * (y * 0.01 + t * 0.3).sin() * self.config.amplitude
    }

    /// Projected wave plane vertices with their elevation colors
    pub fn plane_grid(&self) -> PlaneGrid {
        let segments = self.config.plane_segments;
        let columns = segments + 1;
        let half = self.config.plane_size * 0.5;
        let step = self.config.plane_size / segments as f32;
        let amplitude = self.config.amplitude;

        let model = Mat4::from_translation(Vec3::new(0.0, PLANE_Y, 0.0))
            * Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2)
            * Mat4::from_rotation_z(self.plane_roll);
        let mvp = self.projection() * self.view() * model;

        let mut vertices = Vec::with_capacity(columns * columns);
        let mut vertex_colors = Vec::with_capacity(columns * columns);
        for row in 0..columns {
            let y = half - row as f32 * step;
            for col in 0..columns {
                let x = -half + col as f32 * step;
                let e = self.elevation(x, y);
                vertices.push(self.to_screen(mvp * Vec4::new(x, y, e, 1.0)));

                let mix = if amplitude > 0.0 {
                    (e + amplitude) / (2.0 * amplitude)
                } else {
                    0.5
                };
                vertex_colors.push(
                    colors::WAVE_LOW
                        .lerp(colors::WAVE_HIGH, mix)
                        .with_alpha(colors::WAVE_ALPHA),
                );
            }
        }

        PlaneGrid {
            columns,
            vertices,
            colors: vertex_colors,
        }
    }

    pub fn points(&self) -> &[CloudPoint] {
        &self.points
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn rotation(&self) -> (f32, f32) {
        self.rotation
    }

    pub fn plane_roll(&self) -> f32 {
        self.plane_roll
    }
}

fn sample<R: Rng>(rng: &mut R, [lo, hi]: [f32; 2]) -> f32 {
    lo + rng.gen::<f32>() * (hi - lo)
}
