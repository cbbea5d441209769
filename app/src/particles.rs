use eframe::egui::{Pos2, Vec2};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::time::Duration;
use tracing::warn;

/// Catch-up ticks allowed per frame after a stall (e.g. a minimized window).
const MAX_TICKS_PER_FRAME: u32 = 10;

/// A falling dot in the background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Top-left corner of the dot.
    pub pos: Pos2,
    pub size: f32,
    /// Pixels moved down per tick.
    pub speed: f32,
}

/// The full set of background particles.
///
/// The set is created once the viewport is known and never shrinks or
/// grows afterwards; particles leaving the bottom are moved back above the top.
pub struct ParticleField {
    particles: Vec<Particle>,
    count: usize,
    viewport: Vec2,
    rng: Xoshiro256PlusPlus,
}

impl ParticleField {
    pub fn new(count: usize, seed: u64) -> Self {
        Self {
            particles: Vec::with_capacity(count),
            count,
            viewport: Vec2::ZERO,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// A field seeded from the thread-local generator.
    pub fn from_entropy(count: usize) -> Self {
        Self::new(count, rand::random())
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Tracks the window size. The first call spawns the particles.
    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
        if self.particles.is_empty() {
            for _ in 0..self.count {
                let particle = self.spawn();
                self.particles.push(particle);
            }
        }
    }

    /// A particle placed near the left or right edge at a random height.
    fn spawn(&mut self) -> Particle {
        let Vec2 {
            x: width,
            y: height,
        } = self.viewport;
        let x = if self.rng.random_bool(0.5) {
            self.rng.random_range(-100.0..=150.0)
        } else {
            self.rng.random_range(width - 150.0..=width + 100.0)
        };
        let y = self.rng.random_range(-50.0..=height + 50.0);
        Particle {
            pos: Pos2::new(x, y),
            size: self.rng.random_range(2..=6) as f32,
            speed: self.rng.random_range(0.8..2.5),
        }
    }

    /// Advances every particle by one step.
    pub fn tick(&mut self) {
        let height = self.viewport.y;
        for i in 0..self.particles.len() {
            let mut particle = self.particles[i];
            particle.pos.y += particle.speed;

            if !(particle.pos.x.is_finite() && particle.pos.y.is_finite()) {
                warn!(index = i, pos = ?particle.pos, "particle has invalid coordinates, respawning");
                particle = self.spawn();
            } else if particle.pos.y > height {
                particle.pos.y = self.rng.random_range(-100..=-50) as f32;
            }

            self.particles[i] = particle;
        }
    }
}

/// Converts frame timestamps into a whole number of fixed-interval ticks.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: f64,
    last: Option<f64>,
    pending: f64,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.as_secs_f64(),
            last: None,
            pending: 0.0,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval)
    }

    /// Number of ticks due at time `now` (seconds). The first call only
    /// records the time.
    pub fn advance(&mut self, now: f64) -> u32 {
        let Some(last) = self.last.replace(now) else {
            return 0;
        };
        self.pending += (now - last).max(0.0);

        let due = (self.pending / self.interval).floor();
        if due >= f64::from(MAX_TICKS_PER_FRAME) {
            self.pending = 0.0;
            return MAX_TICKS_PER_FRAME;
        }
        self.pending -= due * self.interval;
        due as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn field(count: usize) -> ParticleField {
        let mut field = ParticleField::new(count, 7);
        field.set_viewport(Vec2::new(1920.0, 1080.0));
        field
    }

    #[test]
    fn test_spawn_distribution() {
        let field = field(500);
        assert_eq!(field.particles().len(), 500);
        for p in field.particles() {
            let left = (-100.0..=150.0).contains(&p.pos.x);
            let right = (1770.0..=2020.0).contains(&p.pos.x);
            assert!(left || right, "x = {}", p.pos.x);
            assert!((-50.0..=1130.0).contains(&p.pos.y));
            assert!((2.0..=6.0).contains(&p.size) && p.size.fract() == 0.0);
            assert!((0.8..2.5).contains(&p.speed));
        }
    }

    #[test]
    fn test_count_is_fixed() {
        let mut field = field(120);
        field.set_viewport(Vec2::new(800.0, 600.0));
        for _ in 0..1000 {
            field.tick();
        }
        assert_eq!(field.particles().len(), 120);
        assert_eq!(field.viewport(), Vec2::new(800.0, 600.0));
    }

    #[test]
    fn test_ticks_move_particles_by_speed() {
        let mut field = field(120);
        // Park every particle at the top so none can wrap within the run.
        for p in &mut field.particles {
            p.pos.y = -50.0;
        }
        let before = field.particles().to_vec();
        let n = 100;
        for _ in 0..n {
            field.tick();
        }
        for (a, b) in before.iter().zip(field.particles()) {
            assert_abs_diff_eq!(b.pos.y, a.pos.y + n as f32 * a.speed, epsilon = 1e-2);
            assert_eq!(b.pos.x, a.pos.x);
            assert_eq!(b.size, a.size);
        }
    }

    #[test]
    fn test_particles_wrap_above_viewport() {
        let mut field = field(50);
        for p in &mut field.particles {
            p.pos.y = 1080.0;
        }
        let before = field.particles().to_vec();
        field.tick();
        for (a, b) in before.iter().zip(field.particles()) {
            assert!((-100.0..=-50.0).contains(&b.pos.y), "y = {}", b.pos.y);
            assert_eq!(b.pos.x, a.pos.x);
            assert_eq!(b.size, a.size);
            assert_eq!(b.speed, a.speed);
        }
    }

    #[test]
    fn test_invalid_particle_is_respawned() {
        let mut field = field(3);
        field.particles[1].pos.y = f32::NAN;
        field.tick();
        assert!(field.particles().iter().all(|p| p.pos.y.is_finite()));
        assert_eq!(field.particles().len(), 3);
    }

    #[test]
    fn test_no_particles_before_viewport() {
        let field = ParticleField::new(10, 1);
        assert!(field.particles().is_empty());
    }

    #[test]
    fn test_ticker_counts_whole_intervals() {
        let mut ticker = Ticker::new(Duration::from_millis(30));
        assert_eq!(ticker.advance(1.0), 0);
        assert_eq!(ticker.advance(1.031), 1);
        assert_eq!(ticker.advance(1.05), 0);
        // Leftover time carries over: 0.001 + 0.019 + 0.050 = 0.070
        assert_eq!(ticker.advance(1.1), 2);
    }

    #[test]
    fn test_ticker_caps_catch_up() {
        let mut ticker = Ticker::new(Duration::from_millis(30));
        ticker.advance(0.0);
        assert_eq!(ticker.advance(60.0), MAX_TICKS_PER_FRAME);
        assert_eq!(ticker.advance(60.0), 0);
    }
}
