use embedded_hal::blocking::delay::{DelayMs, DelayUs};

use crate::DelayCycles;

/// Adapts a cycle delay to the `embedded-hal` delay traits.
#[derive(Clone, Copy, Debug)]
pub struct CycleDelayUs<D> {
    inner: D,
    clock_hz: u32,
}

impl<D: DelayCycles> CycleDelayUs<D> {
    pub fn new(inner: D, clock_hz: u32) -> Self {
        Self { inner, clock_hz }
    }

    pub fn into_inner(self) -> D {
        self.inner
    }

    fn delay_scaled(&mut self, amount: u32, per_second: u64) {
        let mut remaining = (u64::from(amount) * u64::from(self.clock_hz)).div_ceil(per_second);
        while remaining > 0 {
            let chunk = remaining.min(u64::from(u32::MAX)) as u32;
            self.inner.delay_cycles(chunk);
            remaining -= u64::from(chunk);
        }
    }
}

macro_rules! impl_delay {
    ($($ty:ty),+) => {
        $(
            impl<D: DelayCycles> DelayUs<$ty> for CycleDelayUs<D> {
                fn delay_us(&mut self, us: $ty) {
                    self.delay_scaled(u32::from(us), 1_000_000);
                }
            }

            impl<D: DelayCycles> DelayMs<$ty> for CycleDelayUs<D> {
                fn delay_ms(&mut self, ms: $ty) {
                    self.delay_scaled(u32::from(ms), 1_000);
                }
            }
        )+
    };
}

impl_delay!(u8, u16, u32);
