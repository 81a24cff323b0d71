//! Calibrated busy-wait delays.
//!
//! A delay spins the core in a counting loop, the number of iterations is the
//! requested amount of cycles divided by the cost of a single iteration on the
//! particular core. That cost is a [`Calibration`] constant, it depends on the
//! pipeline and has to be measured for every core family.
//!
//! The [`Delay`] implementation is chosen at compile time:
//!
//! - bare-metal Arm uses the `subs`/`bne` loop ([`PipelineDelay`]);
//! - hosted targets spin on the system clock ([`ClockDelay`]);
//! - other bare-metal targets need the `portable-delay` feature, which selects
//!   the conservative spin loop ([`SpinDelay`]). It never returns early but may
//!   wait several times longer than requested.
//!
//! Any other bare-metal target fails to compile rather than silently not
//! waiting.
//!
//! Delays block the caller entirely, calling them from an interrupt handler
//! stalls the whole system for their duration.

#![cfg_attr(target_os = "none", no_std)]

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub use arm::PipelineDelay;
#[cfg(not(target_os = "none"))]
pub use clock::ClockDelay;
pub use hal::CycleDelayUs;
pub use spin::SpinDelay;

#[cfg(all(target_arch = "arm", target_os = "none"))]
mod arm;
#[cfg(not(target_os = "none"))]
mod clock;
mod hal;
mod spin;

#[cfg(all(
    target_os = "none",
    not(target_arch = "arm"),
    not(feature = "portable-delay")
))]
compile_error!(
    "there is no calibrated delay loop for this target, \
     enable the `portable-delay` feature to use the conservative spin loop"
);

/// Nominal core clock frequency, the MSP432 starts from the 3 MHz DCO.
pub const NOMINAL_CLOCK_HZ: u32 = 3_000_000;

/// Blocking delay measured in core clock cycles.
pub trait DelayCycles {
    /// Blocks for approximately the given amount of clock cycles.
    fn delay_cycles(&mut self, cycles: u32);
}

impl<T: DelayCycles + ?Sized> DelayCycles for &mut T {
    fn delay_cycles(&mut self, cycles: u32) {
        T::delay_cycles(self, cycles)
    }
}

/// Cost of a single iteration of the delay loop.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Calibration {
    cycles_per_iteration: u32,
}

impl Calibration {
    /// `subs` takes a single cycle and a taken `bne` refills the three-stage
    /// pipeline of the Cortex-M3/M4 cores.
    pub const ARM_THREE_STAGE: Self = Self::new(3);
    /// Any loop iteration takes at least one cycle, so this one never makes
    /// the delay shorter than requested.
    pub const CONSERVATIVE: Self = Self::new(1);

    pub const fn new(cycles_per_iteration: u32) -> Self {
        assert!(cycles_per_iteration > 0, "loop iteration can not be free");
        Self {
            cycles_per_iteration,
        }
    }

    pub const fn cycles_per_iteration(self) -> u32 {
        self.cycles_per_iteration
    }

    /// Returns the amount of loop iterations for the given amount of cycles.
    pub const fn iterations(self, cycles: u32) -> u32 {
        cycles / self.cycles_per_iteration
    }
}

/// Delay implementation for the current target.
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub type Delay = PipelineDelay;
/// Delay implementation for the current target.
#[cfg(not(target_os = "none"))]
pub type Delay = ClockDelay;
/// Delay implementation for the current target.
#[cfg(all(
    target_os = "none",
    not(target_arch = "arm"),
    feature = "portable-delay"
))]
pub type Delay = SpinDelay;

/// Blocks for approximately the given amount of clock cycles.
#[inline(always)]
pub fn delay(cycles: u32) {
    Delay::default().delay_cycles(cycles);
}
