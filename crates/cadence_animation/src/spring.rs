//! Spring physics easing
//!
//! A damped harmonic oscillator sampled as an easing curve. The settle
//! duration of a spring (how long until it visibly rests) is computed once per
//! parameter set and memoized for the life of the thread.

use rustc_hash::FxHashMap;
use std::cell::RefCell;

/// Sampling step, in seconds, used when searching for the settle point
const SETTLE_FRAME: f64 = 1.0 / 6.0;

/// Consecutive at-rest samples required before a spring counts as settled
const SETTLE_SAMPLES: u32 = 16;

thread_local! {
    static SETTLE_DURATIONS: RefCell<FxHashMap<String, f64>> = RefCell::new(FxHashMap::default());
}

/// Spring parameters, each clamped to `[0.1, 100]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConfig {
    pub mass: f64,
    pub stiffness: f64,
    pub damping: f64,
    pub velocity: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::new(1.0, 100.0, 10.0, 0.0)
    }
}

impl SpringConfig {
    pub fn new(mass: f64, stiffness: f64, damping: f64, velocity: f64) -> Self {
        Self {
            mass: mass.clamp(0.1, 100.0),
            stiffness: stiffness.clamp(0.1, 100.0),
            damping: damping.clamp(0.1, 100.0),
            velocity: velocity.clamp(0.1, 100.0),
        }
    }

    /// Build from positional parameters `(mass, stiffness, damping, velocity)`
    pub fn from_params(params: &[f64]) -> Self {
        let defaults = [1.0, 100.0, 10.0, 0.0];
        let get = |i: usize| params.get(i).copied().unwrap_or(defaults[i]);
        Self::new(get(0), get(1), get(2), get(3))
    }

    /// Eased progress at `t`. With a duration (ms), `t` is normalized progress
    /// through that duration; without one, `t` is elapsed seconds.
    pub fn solve(&self, t: f64, duration: Option<f64>) -> f64 {
        if t == 0.0 || t == 1.0 {
            return t;
        }
        let w0 = (self.stiffness / self.mass).sqrt();
        let zeta = self.damping / (2.0 * (self.stiffness * self.mass).sqrt());
        let wd = if zeta < 1.0 {
            w0 * (1.0 - zeta * zeta).sqrt()
        } else {
            0.0
        };
        let b = if zeta < 1.0 {
            (zeta * w0 - self.velocity) / wd
        } else {
            -self.velocity + w0
        };

        let p = match duration {
            Some(d) if d > 0.0 => d * t / 1000.0,
            _ => t,
        };
        let displacement = if zeta < 1.0 {
            (-p * zeta * w0).exp() * ((wd * p).cos() + b * (wd * p).sin())
        } else {
            (1.0 + b * p) * (-p * w0).exp()
        };
        1.0 - displacement
    }

    /// Time in milliseconds until the spring comes to rest
    pub fn settle_duration(&self) -> f64 {
        let mut elapsed = 0.0;
        let mut rest = 0;
        loop {
            elapsed += SETTLE_FRAME;
            if self.solve(elapsed, None) == 1.0 {
                rest += 1;
                if rest >= SETTLE_SAMPLES {
                    break;
                }
            } else {
                rest = 0;
            }
        }
        elapsed * SETTLE_FRAME * 1000.0
    }
}

/// Settle duration for a `spring(...)` easing expression, memoized by the
/// expression text.
pub fn settle_duration(expr: &str, config: &SpringConfig) -> f64 {
    let key = expr.trim().to_string();
    if let Some(duration) = SETTLE_DURATIONS.with(|cache| cache.borrow().get(&key).copied()) {
        return duration;
    }
    let duration = config.settle_duration();
    tracing::trace!(expr = %key, duration, "computed spring settle duration");
    SETTLE_DURATIONS.with(|cache| cache.borrow_mut().insert(key, duration));
    duration
}

/// Number of memoized settle durations on this thread
pub fn cached_settle_durations() -> usize {
    SETTLE_DURATIONS.with(|cache| cache.borrow().len())
}
