//! Mapping between wall-clock instants and virtual time.

use cranesim_core::SimTime;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::debug;

/// Maps wall-clock instants onto virtual time.
///
/// `virtual = (wall - origin) * scale`. The origin is recorded once, on the
/// first call that needs it, so startup work done before the run begins is
/// not charged against the first scheduled delay.
#[derive(Debug)]
pub struct WallClock {
    scale: f64,
    origin: OnceLock<Instant>,
}

impl WallClock {
    /// Create a clock running `scale` virtual seconds per wall second.
    ///
    /// Scales that are not finite and positive are replaced by 1.0.
    pub fn new(scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            debug!(scale, "Invalid time scale, running in real time");
            1.0
        };
        Self {
            scale,
            origin: OnceLock::new(),
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Record now as virtual time zero. Later calls keep the first origin.
    pub fn record_start_time(&self) -> Instant {
        *self.origin.get_or_init(|| {
            let origin = Instant::now();
            debug!(scale = self.scale, "Wall clock origin recorded");
            origin
        })
    }

    /// The recorded origin, if any.
    pub fn origin(&self) -> Option<Instant> {
        self.origin.get().copied()
    }

    /// Virtual time at `wall`. Instants before the origin map to zero.
    pub fn to_virtual(&self, wall: Instant) -> SimTime {
        let elapsed = wall.saturating_duration_since(self.record_start_time());
        // f64 -> u64 casts saturate
        SimTime::from_nanos((elapsed.as_nanos() as f64 * self.scale) as u64)
    }

    /// Wall-clock instant at which `time` is reached.
    ///
    /// `None` if the instant is not representable, which callers treat as
    /// "never".
    pub fn to_wall(&self, time: SimTime) -> Option<Instant> {
        let nanos = (time.as_nanos() as f64 / self.scale).ceil();
        let offset = Duration::try_from_secs_f64(nanos / 1e9).ok()?;
        self.record_start_time().checked_add(offset)
    }

    /// Current virtual time.
    pub fn now(&self) -> SimTime {
        self.to_virtual(Instant::now())
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_mapping() {
        let clock = WallClock::new(2.0);
        let origin = clock.record_start_time();

        let wall = origin + Duration::from_millis(500);
        assert_eq!(clock.to_virtual(wall), SimTime::from_nanos(1_000_000_000));
        assert_eq!(clock.to_wall(SimTime::from_nanos(1_000_000_000)), Some(wall));
    }

    #[test]
    fn test_before_origin_is_zero() {
        let clock = WallClock::new(1.0);
        let before = Instant::now();
        std::thread::sleep(Duration::from_millis(2));
        clock.record_start_time();
        assert_eq!(clock.to_virtual(before), SimTime::ZERO);
    }

    #[test]
    fn test_origin_is_recorded_once() {
        let clock = WallClock::default();
        assert_eq!(clock.origin(), None);
        let first = clock.record_start_time();
        std::thread::sleep(Duration::from_millis(1));
        assert_eq!(clock.record_start_time(), first);
        assert_eq!(clock.origin(), Some(first));
    }

    #[test]
    fn test_invalid_scales_fall_back_to_real_time() {
        for scale in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            assert_eq!(WallClock::new(scale).scale(), 1.0);
        }
    }

    #[test]
    fn test_real_time_is_monotonic_and_tracks_wall_clock() {
        let clock = WallClock::new(1.0);
        let origin = clock.record_start_time();

        let mut previous = SimTime::ZERO;
        for _ in 0..1_000 {
            let now = clock.to_virtual(Instant::now());
            assert!(now >= previous);
            previous = now;
        }

        let before = clock.now();
        std::thread::sleep(Duration::from_millis(20));
        let elapsed = clock.now().saturating_since(before);
        assert!(elapsed >= Duration::from_millis(20), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(200), "elapsed {elapsed:?}");
        assert!(clock.to_virtual(Instant::now()).as_duration() <= origin.elapsed());
    }

    #[test]
    fn test_unreachable_time_has_no_instant() {
        let clock = WallClock::new(1e-9);
        assert_eq!(clock.to_wall(SimTime::MAX), None);
    }

    #[test]
    fn test_round_trip_reaches_target() {
        let clock = WallClock::new(3.0);
        let target = SimTime::from_nanos(1_234_567_891);
        let wall = clock.to_wall(target).unwrap();
        assert!(clock.to_virtual(wall) >= SimTime::from_nanos(target.as_nanos() - 1));
    }
}
