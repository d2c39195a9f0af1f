//! Proximity lines between nearby particles
//!
//! Distance is 3D with the depth axis weighted down (`dz² * 0.1`) so
//! particles that merely share a depth do not dominate the network.
//! The all-pairs search is O(n²); the grid search buckets particles into
//! cells of `max_distance` and only compares 3x3 neighborhoods. Planar
//! distance never exceeds the weighted one, so no link is missed.

use std::collections::HashMap;

use super::config::LinkStrategy;
use super::particle::Particle;

/// Depth contribution to link distance
pub const DEPTH_WEIGHT: f64 = 0.1;
/// Alpha of a zero-length link between two particles at the viewer
pub const LINK_ALPHA: f64 = 0.3;
/// Largest cell index the grid search uses; beyond it the pool is searched
/// pair by pair
const MAX_CELL: f64 = (1u64 << 52) as f64;

/// A line to draw between particles `a < b`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    pub distance: f64,
    pub alpha: f64,
}

/// Weighted distance between two particles
#[inline]
pub fn link_distance(p: &Particle, q: &Particle) -> f64 {
    let dx = p.x - q.x;
    let dy = p.y - q.y;
    let dz = p.depth - q.depth;
    (dx * dx + dy * dy + dz * dz * DEPTH_WEIGHT).sqrt()
}

/// Line alpha for a pair, `None` when they are too far apart
#[inline]
pub fn link_alpha(p: &Particle, q: &Particle, depth_range: f64, max_distance: f64) -> Option<(f64, f64)> {
    let distance = link_distance(p, q);
    if distance < max_distance {
        // Scale product first so (p, q) and (q, p) round identically
        let depth_fade = p.scale(depth_range) * q.scale(depth_range);
        let alpha = (1.0 - distance / max_distance) * LINK_ALPHA * depth_fade;
        Some((distance, alpha))
    } else {
        None
    }
}

/// All links for a pool, ordered by `(a, b)`
pub fn find_links(
    particles: &[Particle],
    depth_range: f64,
    max_distance: f64,
    strategy: LinkStrategy,
) -> Vec<Link> {
    if max_distance <= 0.0 || particles.len() < 2 {
        return Vec::new();
    }
    match strategy.resolve(particles.len()) {
        LinkStrategy::Grid if grid_fits(particles, max_distance) => {
            grid_links(particles, depth_range, max_distance)
        }
        _ => all_pairs_links(particles, depth_range, max_distance),
    }
}

/// Every cell index, neighbors included, is representable
fn grid_fits(particles: &[Particle], max_distance: f64) -> bool {
    particles.iter().all(|p| {
        (p.x / max_distance).abs() < MAX_CELL && (p.y / max_distance).abs() < MAX_CELL
    })
}

fn all_pairs_links(particles: &[Particle], depth_range: f64, max_distance: f64) -> Vec<Link> {
    let mut links = Vec::new();
    for (a, p) in particles.iter().enumerate() {
        for (b, q) in particles.iter().enumerate().skip(a + 1) {
            if let Some((distance, alpha)) = link_alpha(p, q, depth_range, max_distance) {
                links.push(Link { a, b, distance, alpha });
            }
        }
    }
    links
}

fn grid_links(particles: &[Particle], depth_range: f64, max_distance: f64) -> Vec<Link> {
    let cell_of = |p: &Particle| {
        (
            (p.x / max_distance).floor() as i64,
            (p.y / max_distance).floor() as i64,
        )
    };

    let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, p) in particles.iter().enumerate() {
        cells.entry(cell_of(p)).or_default().push(i);
    }

    let mut links = Vec::new();
    for (a, p) in particles.iter().enumerate() {
        let (cx, cy) = cell_of(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &b in bucket.iter().filter(|&&b| b > a) {
                    if let Some((distance, alpha)) =
                        link_alpha(p, &particles[b], depth_range, max_distance)
                    {
                        links.push(Link { a, b, distance, alpha });
                    }
                }
            }
        }
    }
    links.sort_by(|l, r| (l.a, l.b).cmp(&(r.a, r.b)));
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Size;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn at(x: f64, y: f64, depth: f64) -> Particle {
        Particle {
            x,
            y,
            depth,
            radius: 2.0,
            vx: 0.0,
            vy: 0.0,
            vdepth: 1.0,
            opacity: 1.0,
            color: 0,
        }
    }

    fn pool(n: usize, seed: u64) -> Vec<Particle> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..n)
            .map(|_| Particle::spawn(&mut rng, Size::new(1200.0, 900.0), 1000.0, 4))
            .collect()
    }

    #[test]
    fn test_distance_weights_depth() {
        let p = at(0.0, 0.0, 0.0);
        let q = at(3.0, 4.0, 0.0);
        assert_eq!(link_distance(&p, &q), 5.0);

        let deep = at(0.0, 0.0, 100.0);
        assert!((link_distance(&p, &deep) - 1000.0f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_alpha_formula() {
        let p = at(0.0, 0.0, 0.0);
        let q = at(60.0, 0.0, 100.0);
        let (distance, alpha) = link_alpha(&p, &q, 1000.0, 120.0).unwrap();
        assert!((distance - 4600.0f64.sqrt()).abs() < 1e-9);
        let expected = (1.0 - distance / 120.0) * 0.3 * 0.9;
        assert!((alpha - expected).abs() < 1e-12);

        assert!(link_alpha(&p, &at(200.0, 0.0, 0.0), 1000.0, 120.0).is_none());
        // Exactly at the threshold is not a link
        assert!(link_alpha(&p, &at(120.0, 0.0, 0.0), 1000.0, 120.0).is_none());
    }

    #[test]
    fn test_symmetry() {
        let particles = pool(80, 13);
        for p in &particles {
            for q in &particles {
                assert_eq!(link_distance(p, q), link_distance(q, p));
                assert_eq!(
                    link_alpha(p, q, 1000.0, 120.0),
                    link_alpha(q, p, 1000.0, 120.0)
                );
            }
        }
    }

    #[test]
    fn test_unordered_pairs_only() {
        let particles = vec![at(0.0, 0.0, 0.0), at(10.0, 0.0, 0.0), at(20.0, 0.0, 0.0)];
        let links = find_links(&particles, 1000.0, 120.0, LinkStrategy::AllPairs);
        let pairs: Vec<_> = links.iter().map(|l| (l.a, l.b)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_grid_matches_all_pairs() {
        for seed in 0..5 {
            let particles = pool(600, seed);
            let brute = find_links(&particles, 1000.0, 120.0, LinkStrategy::AllPairs);
            let grid = find_links(&particles, 1000.0, 120.0, LinkStrategy::Grid);
            assert!(!brute.is_empty());
            assert_eq!(brute, grid);
        }
    }

    #[test]
    fn test_grid_with_tiny_distance() {
        let particles = vec![at(400.0, 300.0, 0.0), at(400.0, 300.0, 0.0), at(10.0, 10.0, 0.0)];
        let grid = find_links(&particles, 1000.0, 1e-17, LinkStrategy::Grid);
        let pairs: Vec<_> = grid.iter().map(|l| (l.a, l.b)).collect();
        assert_eq!(pairs, vec![(0, 1)]);
        assert_eq!(grid, find_links(&particles, 1000.0, 1e-17, LinkStrategy::AllPairs));
    }

    #[test]
    fn test_zero_distance_draws_nothing() {
        let particles = vec![at(0.0, 0.0, 0.0), at(0.0, 0.0, 0.0)];
        assert!(find_links(&particles, 1000.0, 0.0, LinkStrategy::AllPairs).is_empty());
        assert!(find_links(&particles, 1000.0, 0.0, LinkStrategy::Grid).is_empty());
    }
}
