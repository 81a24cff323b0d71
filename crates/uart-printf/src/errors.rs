use displaydoc::Display;

/// A specialized result type for the serial printer.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur when printing to the serial port.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Debug)]
pub enum Error {
    /// Unable to write bytes to the serial port.
    Write,
    /// Radix {0} is out of the supported range 2..=36.
    InvalidBase(u32),
    /// The serial output has already been initialized.
    AlreadyInitialized,
}

impl Error {
    /// Creates a new write error, the underlying hardware error is dropped.
    pub fn write<E>(_: E) -> Self {
        Self::Write
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
