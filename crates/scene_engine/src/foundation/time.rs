//! Time management utilities

use std::time::Instant;

/// Frame clock that feeds the per-frame update step
///
/// Reports seconds since the clock was created together with the delta since
/// the previous tick. Tests drive it with [`FrameClock::tick_at`] to get
/// deterministic values.
pub struct FrameClock {
    origin: Instant,
    last_time: Option<f64>,
    delta_time: f32,
    frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a new clock starting at zero
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_time: None,
            delta_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance the clock using the wall clock
    ///
    /// Returns `(now, delta)` in seconds.
    pub fn tick(&mut self) -> (f64, f32) {
        let now = self.origin.elapsed().as_secs_f64();
        self.tick_at(now)
    }

    /// Advance the clock to an explicit time in seconds
    ///
    /// The first tick reports a zero delta. Time going backwards also yields
    /// a zero delta rather than a negative one.
    pub fn tick_at(&mut self, now: f64) -> (f64, f32) {
        self.delta_time = match self.last_time {
            Some(last) if now > last => (now - last) as f32,
            _ => 0.0,
        };
        self.last_time = Some(now);
        self.frame_count += 1;
        (now, self.delta_time)
    }

    /// Get the time since the last tick in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the time of the last tick in seconds
    pub fn current_time(&self) -> f64 {
        self.last_time.unwrap_or(0.0)
    }

    /// Get the number of ticks so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_has_zero_delta() {
        let mut clock = FrameClock::new();
        let (now, dt) = clock.tick_at(2.5);
        assert_eq!(now, 2.5);
        assert_eq!(dt, 0.0);
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn test_delta_tracks_previous_tick() {
        let mut clock = FrameClock::new();
        clock.tick_at(1.0);
        let (_, dt) = clock.tick_at(1.25);
        assert_eq!(dt, 0.25);

        let (_, dt) = clock.tick_at(0.5);
        assert_eq!(dt, 0.0);
        assert_eq!(clock.current_time(), 0.5);
    }
}
