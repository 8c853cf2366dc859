use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Rotated on every plain and browser fetch.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_3_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.3 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36 Edg/121.0.0.0",
];

/// Inclusive `[min, max]` window a randomized delay is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelayWindow {
    pub min: Duration,
    pub max: Duration,
}

impl DelayWindow {
    pub const ZERO: DelayWindow = DelayWindow { min: Duration::ZERO, max: Duration::ZERO };

    pub fn from_millis(min: u64, max: u64) -> Self {
        Self { min: Duration::from_millis(min), max: Duration::from_millis(max.max(min)) }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        if hi <= lo { return self.min; }
        Duration::from_millis(rng.gen_range(lo..=hi))
    }
}

/// Seeded when `seed` is set so runs (and tests) are reproducible.
pub fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

pub fn random_user_agent<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    USER_AGENTS.choose(rng).copied().unwrap_or(USER_AGENTS[0])
}

pub async fn jittered_sleep<R: Rng + ?Sized>(window: &DelayWindow, rng: &mut R) -> Duration {
    let d = window.sample(rng);
    if !d.is_zero() { tokio::time::sleep(d).await; }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_stay_inside_window() {
        let window = DelayWindow::from_millis(3_000, 8_000);
        let mut rng = rng_for(Some(7));
        for _ in 0..200 {
            let d = window.sample(&mut rng);
            assert!(d >= window.min && d <= window.max, "{d:?}");
        }
    }

    #[test]
    fn degenerate_window_returns_min() {
        let mut rng = rng_for(Some(1));
        assert_eq!(DelayWindow::ZERO.sample(&mut rng), Duration::ZERO);
        // max below min is clamped up to min
        let w = DelayWindow::from_millis(500, 100);
        assert_eq!(w.sample(&mut rng), Duration::from_millis(500));
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let w = DelayWindow::from_millis(0, 10_000);
        let a: Vec<_> = { let mut r = rng_for(Some(42)); (0..5).map(|_| w.sample(&mut r)).collect() };
        let b: Vec<_> = { let mut r = rng_for(Some(42)); (0..5).map(|_| w.sample(&mut r)).collect() };
        assert_eq!(a, b);
    }

    #[test]
    fn user_agent_comes_from_pool() {
        let mut rng = rng_for(Some(3));
        let ua = random_user_agent(&mut rng);
        assert!(USER_AGENTS.contains(&ua));
    }
}
