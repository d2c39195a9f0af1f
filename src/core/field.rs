//! Particle pool and its per-frame motion
//!
//! The pool is filled once and never grows or shrinks. Each `advance()`
//! drifts every particle, recycles the ones that passed the far plane and
//! wraps positions back into the current bounds.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use super::config::FieldParams;
use super::links::{find_links, Link};
use super::particle::{random_point, Particle};
use super::Size;

pub struct ParticleField {
    particles: Vec<Particle>,
    params: FieldParams,
    bounds: Size,
    /// Drift clock, advanced by `time_step` per frame
    time: f64,
    rng: SmallRng,
}

impl ParticleField {
    /// Populate the pool. `bounds` must be drawable.
    pub fn new(params: FieldParams, bounds: Size) -> Self {
        let mut rng = match params.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let particles = (0..params.particle_count)
            .map(|_| Particle::spawn(&mut rng, bounds, params.depth_range, params.palette.len()))
            .collect();

        debug!(
            count = params.particle_count,
            width = bounds.width,
            height = bounds.height,
            "Particle field populated"
        );

        Self {
            particles,
            params,
            bounds,
            time: 0.0,
            rng,
        }
    }

    /// Move every particle one frame forward
    pub fn advance(&mut self) {
        self.time += self.params.time_step;

        let speed = self.params.speed_scale;
        let depth_range = self.params.depth_range;
        let Size { width, height } = self.bounds;
        let mut recycled = 0usize;

        for (index, p) in self.particles.iter_mut().enumerate() {
            let phase = self.time + index as f64;
            p.x += (p.vx + phase.sin() * 0.5) * speed;
            p.y += (p.vy + phase.cos() * 0.5) * speed;
            p.depth += p.vdepth * speed;

            if p.depth > depth_range {
                p.depth = 0.0;
                (p.x, p.y) = random_point(&mut self.rng, self.bounds);
                recycled += 1;
            }

            p.x = wrap_axis(p.x, width);
            p.y = wrap_axis(p.y, height);
        }

        trace!(time = self.time, recycled, "Field advanced");
    }

    /// Adopt new bounds. Particles keep their state; anything now outside is
    /// folded back in by the next `advance()`.
    pub fn resize(&mut self, bounds: Size) {
        if !bounds.is_drawable() {
            debug!(?bounds, "Ignoring resize to empty bounds");
            return;
        }
        debug!(
            from_width = self.bounds.width,
            from_height = self.bounds.height,
            to_width = bounds.width,
            to_height = bounds.height,
            "Field resized"
        );
        self.bounds = bounds;
    }

    /// Proximity lines for the current positions
    pub fn links(&self) -> Vec<Link> {
        find_links(
            &self.particles,
            self.params.depth_range,
            self.params.max_connection_distance,
            self.params.link_strategy,
        )
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Direct pool access for hosts that want to seed specific states
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}

/// Fold `v` into `[0, extent)`, entering from the opposite edge
#[inline]
pub fn wrap_axis(v: f64, extent: f64) -> f64 {
    if (0.0..extent).contains(&v) {
        return v;
    }
    let wrapped = v.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs
    if wrapped >= extent || !wrapped.is_finite() {
        0.0
    } else {
        wrapped
    }
}
