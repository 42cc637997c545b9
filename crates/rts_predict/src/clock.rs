//! Frame-time scaling and the simulation clock.

use crate::config::SimConfig;

/// Ratio of the elapsed frame time to the nominal frame time, clamped to
/// `[0, max_dt_scale]`.
///
/// Negative or non-finite elapsed time counts as no time at all.
#[must_use]
pub fn dt_scale(elapsed_ms: f32, config: &SimConfig) -> f32 {
    if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
        return 0.0;
    }
    (elapsed_ms / config.nominal_frame_ms).min(config.max_dt_scale)
}

/// Simulation time, advanced only by clamped frame time.
///
/// Every timer in the core (harvest progress, detour expiry, optimistic
/// hiding) reads this clock, so a stalled frame can never expire more than
/// `max_dt_scale` frames worth of timers at once.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimClock {
    now_ms: f64,
}

impl SimClock {
    /// Clock at time zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { now_ms: 0.0 }
    }

    /// Current simulation time in milliseconds.
    #[must_use]
    pub const fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Advance by one frame and return its `dt_scale`.
    pub fn advance(&mut self, elapsed_ms: f32, config: &SimConfig) -> f32 {
        let scale = dt_scale(elapsed_ms, config);
        self.now_ms += f64::from(config.scaled_ms(scale));
        scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dt_scale_nominal_frame() {
        let config = SimConfig::default();
        assert!((dt_scale(config.nominal_frame_ms, &config) - 1.0).abs() < 1e-6);
        assert!((dt_scale(config.nominal_frame_ms * 2.0, &config) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_dt_scale_clamps_stalls() {
        let config = SimConfig::default();
        assert_eq!(dt_scale(5_000.0, &config), 3.0);
    }

    #[test]
    fn test_dt_scale_rejects_garbage() {
        let config = SimConfig::default();
        assert_eq!(dt_scale(f32::NAN, &config), 0.0);
        assert_eq!(dt_scale(-16.0, &config), 0.0);
        assert_eq!(dt_scale(f32::INFINITY, &config), 0.0);
    }

    #[test]
    fn test_clock_advances_by_clamped_time() {
        let config = SimConfig::default();
        let mut clock = SimClock::new();
        let scale = clock.advance(10_000.0, &config);
        assert_eq!(scale, 3.0);
        assert!((clock.now_ms() - f64::from(config.nominal_frame_ms * 3.0)).abs() < 1e-3);
    }
}
