use core::arch::asm;

use crate::{Calibration, DelayCycles};

/// Delay loop built from the `subs`/`bne` instruction pair.
#[derive(Clone, Copy, Debug)]
pub struct PipelineDelay {
    calibration: Calibration,
}

impl PipelineDelay {
    pub const fn new() -> Self {
        Self::with_calibration(Calibration::ARM_THREE_STAGE)
    }

    /// Creates a delay for a core with a different pipeline.
    pub const fn with_calibration(calibration: Calibration) -> Self {
        Self { calibration }
    }
}

impl Default for PipelineDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayCycles for PipelineDelay {
    #[inline(always)]
    fn delay_cycles(&mut self, cycles: u32) {
        let iterations = self.calibration.iterations(cycles);
        // `subs` would wrap around zero.
        if iterations == 0 {
            return;
        }

        unsafe {
            asm!(
                "1:",
                "subs {}, #1",
                "bne 1b",
                inout(reg) iterations => _,
                options(nomem, nostack),
            );
        }
    }
}
