//! Platform-agnostic time utilities
//!
//! Elapsed seconds since start, plus a rolling frame-rate counter.

use std::collections::VecDeque;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub fn now_seconds() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now() / 1000.0)
        .unwrap_or(0.0)
}

#[cfg(all(target_arch = "wasm32", not(feature = "wasm")))]
pub fn now_seconds() -> f64 {
    0.0
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_seconds() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64()
}

/// Frames per second over the last `WINDOW` ticks
pub struct FpsCounter {
    ticks: VecDeque<f64>,
}

impl FpsCounter {
    const WINDOW: usize = 60;

    pub fn new() -> Self {
        Self {
            ticks: VecDeque::with_capacity(Self::WINDOW + 1),
        }
    }

    pub fn tick(&mut self) {
        self.tick_at(now_seconds());
    }

    /// Record a frame at `now` seconds
    pub fn tick_at(&mut self, now: f64) {
        self.ticks.push_back(now);
        if self.ticks.len() > Self::WINDOW {
            self.ticks.pop_front();
        }
    }

    pub fn fps(&self) -> f64 {
        let (Some(first), Some(last)) = (self.ticks.front(), self.ticks.back()) else {
            return 0.0;
        };
        let elapsed = last - first;
        if self.ticks.len() < 2 || elapsed <= 0.0 {
            return 0.0;
        }
        (self.ticks.len() as f64 - 1.0) / elapsed
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}
