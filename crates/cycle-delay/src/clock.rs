use std::time::{Duration, Instant};

use crate::{DelayCycles, NOMINAL_CLOCK_HZ};

/// Host delay that spins on the monotonic clock.
///
/// The requested cycles are converted into wall time using the nominal clock
/// frequency of the emulated core.
#[derive(Clone, Copy, Debug)]
pub struct ClockDelay {
    clock_hz: u32,
}

impl ClockDelay {
    pub const fn new(clock_hz: u32) -> Self {
        assert!(clock_hz > 0, "clock frequency must be positive");
        Self { clock_hz }
    }

    /// Returns the wall time of the given amount of cycles, rounded up.
    pub fn duration(&self, cycles: u32) -> Duration {
        let nanos = (u64::from(cycles) * 1_000_000_000).div_ceil(u64::from(self.clock_hz));
        Duration::from_nanos(nanos)
    }
}

impl Default for ClockDelay {
    fn default() -> Self {
        Self::new(NOMINAL_CLOCK_HZ)
    }
}

impl DelayCycles for ClockDelay {
    fn delay_cycles(&mut self, cycles: u32) {
        let start = Instant::now();
        let duration = self.duration(cycles);
        while start.elapsed() < duration {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        let delay = ClockDelay::new(3_000_000);

        assert_eq!(delay.duration(0), Duration::ZERO);
        assert_eq!(delay.duration(3), Duration::from_micros(1));
        assert_eq!(delay.duration(3_000_000), Duration::from_secs(1));
        // Never shorter than requested.
        assert_eq!(delay.duration(1), Duration::from_nanos(334));
        assert!(
            ClockDelay::new(1).duration(u32::MAX) > Duration::from_secs(u64::from(u32::MAX) - 1)
        );
    }
}
