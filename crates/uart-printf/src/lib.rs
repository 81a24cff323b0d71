//! `printf` like output over a serial port without `std` and dynamic memory.
//!
//! The crate provides the integer to string conversion ([`numfmt`]), a
//! minimal format string interpreter on top of an `embedded-hal` serial
//! transmitter ([`Printer`]) and its inert counterpart ([`NullSink`]).
//!
//! ```ignore
//! uart_printf::init(tx)?;
//! uart_printf::uprintfln!("adc: %u mV, status 0x%x", millivolts, status);
//! // Goes nowhere unless the `dprint` feature is enabled.
//! uart_printf::dprintfln!("raw sample %d", raw);
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub use args::Arg;
pub use config::{DEFAULT_BAUD_RATE, NEWLINE};
pub use errors::{Error, Result};
pub use numfmt::{convert, convertl, Base, NumBuf};
pub use printer::{DebugPrinter, NullSink, Print, Printer};
pub use stdout::{
    dprint, dummy_print, flush, init, is_initialized, print, release, write_byte, write_bytes,
};

pub mod args;
pub mod config;
pub mod errors;
pub mod numfmt;
pub mod printer;
mod stdout;
