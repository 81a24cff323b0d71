use core::{hint, ptr};

use crate::{Calibration, DelayCycles};

/// Portable delay loop for cores without a measured instruction sequence.
///
/// The iteration cost is not known, so the loop assumes the cheapest possible
/// one. It never returns before the requested amount of cycles, but on real
/// cores the delay is usually several times longer.
#[derive(Clone, Copy, Debug)]
pub struct SpinDelay {
    calibration: Calibration,
}

impl SpinDelay {
    pub const fn new() -> Self {
        Self::with_calibration(Calibration::CONSERVATIVE)
    }

    /// Creates a delay with the empirically measured iteration cost.
    pub const fn with_calibration(calibration: Calibration) -> Self {
        Self { calibration }
    }
}

impl Default for SpinDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayCycles for SpinDelay {
    #[inline(always)]
    fn delay_cycles(&mut self, cycles: u32) {
        let mut remaining = self.calibration.iterations(cycles);
        let counter = ptr::addr_of_mut!(remaining);
        // Every iteration loads and stores the counter, the loop can not be
        // folded away.
        unsafe {
            while ptr::read_volatile(counter) != 0 {
                ptr::write_volatile(counter, ptr::read_volatile(counter) - 1);
                hint::spin_loop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spin_delay_terminates() {
        let mut delay = SpinDelay::new();
        delay.delay_cycles(0);
        delay.delay_cycles(1);
        delay.delay_cycles(100_000);

        let mut delay = SpinDelay::with_calibration(Calibration::new(u32::MAX));
        delay.delay_cycles(u32::MAX - 1);
    }
}
