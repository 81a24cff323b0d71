use core::{
    cell::RefCell,
    sync::atomic::{AtomicBool, Ordering},
};

use critical_section::Mutex;
use embedded_hal::serial::Write;

use crate::{args::Arg, printer::print_to, Error, Result};

/// Object safe view of the serial transmitter with the hardware error erased.
trait SerialWrite: Send {
    fn write_word(&mut self, word: u8) -> nb::Result<(), Error>;

    fn flush_words(&mut self) -> nb::Result<(), Error>;
}

impl<W> SerialWrite for W
where
    W: Write<u8> + Send,
{
    fn write_word(&mut self, word: u8) -> nb::Result<(), Error> {
        self.write(word).map_err(|err| err.map(Error::write))
    }

    fn flush_words(&mut self) -> nb::Result<(), Error> {
        self.flush().map_err(|err| err.map(Error::write))
    }
}

struct SerialWrapper<'a>(&'a mut (dyn SerialWrite + 'static));

impl Write<u8> for SerialWrapper<'_> {
    type Error = Error;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.0.write_word(word)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        self.0.flush_words()
    }
}

static STDOUT: Mutex<RefCell<Option<&'static mut dyn SerialWrite>>> =
    Mutex::new(RefCell::new(None));
static INITIALIZED: AtomicBool = AtomicBool::new(false);

fn with_writer<F>(f: F) -> Result<()>
where
    F: FnOnce(&mut SerialWrapper) -> Result<()>,
{
    critical_section::with(|cs| {
        let mut inner = STDOUT.borrow_ref_mut(cs);
        if let Some(writer) = inner.as_mut() {
            f(&mut SerialWrapper(&mut **writer))
        } else {
            Ok(())
        }
    })
}

/// Registers the serial transmitter as the global output.
///
/// This function may only be called once until the transmitter is released.
pub fn init<W>(tx: &'static mut W) -> Result<()>
where
    W: Write<u8> + Send + 'static,
{
    critical_section::with(|cs| {
        let mut inner = STDOUT.borrow_ref_mut(cs);
        if inner.is_some() {
            return Err(Error::AlreadyInitialized);
        }

        inner.replace(tx);
        INITIALIZED.store(true, Ordering::Release);
        Ok(())
    })?;

    log::debug!("Serial output initialized");
    Ok(())
}

/// Unregisters the global transmitter, returns `false` if there was none.
pub fn release() -> bool {
    let released = critical_section::with(|cs| {
        INITIALIZED.store(false, Ordering::Release);
        STDOUT.borrow_ref_mut(cs).take().is_some()
    });

    if released {
        log::debug!("Serial output released");
    }
    released
}

/// Returns `true` once the serial output has been set up.
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Writes a single byte to the configured serial port.
pub fn write_byte(byte: u8) -> Result<()> {
    with_writer(|writer| nb::block!(writer.write(byte)))
}

/// Writes a buffer to the configured serial port.
pub fn write_bytes(bytes: &[u8]) -> Result<()> {
    with_writer(|writer| {
        for byte in bytes {
            nb::block!(writer.write(*byte))?;
        }
        Ok(())
    })
}

pub fn flush() -> Result<()> {
    with_writer(|writer| nb::block!(writer.flush()))
}

/// Prints a formatted string to the configured serial port.
///
/// The output is silently dropped if the serial port has not been initialized.
pub fn print(format: &str, args: &[Arg<'_>]) {
    with_writer(|writer| print_to(writer, format, args)).ok();
}

/// Accepts the same input as [`print`] and discards it.
#[inline(always)]
pub fn dummy_print(_format: &str, _args: &[Arg<'_>]) {}

/// Debug output, enabled by the `dprint` feature.
#[cfg(feature = "dprint")]
pub use self::print as dprint;
/// Debug output, enabled by the `dprint` feature.
#[cfg(not(feature = "dprint"))]
pub use self::dummy_print as dprint;

/// Macro for printing to the configured serial port, without a newline.
#[macro_export]
macro_rules! uprintf {
    ($fmt:expr) => {{
        $crate::print($fmt, &[]);
    }};
    ($fmt:expr, $($arg:expr),+ $(,)?) => {{
        $crate::print($fmt, &[$($crate::Arg::from($arg)),+]);
    }};
}

/// Macro for printing to the configured serial port, with a newline.
#[macro_export]
macro_rules! uprintfln {
    () => {{
        $crate::print($crate::NEWLINE, &[]);
    }};
    ($fmt:literal) => {{
        $crate::print(concat!($fmt, "\r\n"), &[]);
    }};
    ($fmt:literal, $($arg:expr),+ $(,)?) => {{
        $crate::print(concat!($fmt, "\r\n"), &[$($crate::Arg::from($arg)),+]);
    }};
}

/// Macro for printing debug messages, without a newline.
///
/// This method prints only if the `dprint` feature enabled, otherwise it
/// expands to nothing and the arguments are not evaluated.
#[cfg(feature = "dprint")]
#[macro_export]
macro_rules! dprintf {
    ($fmt:expr) => {{
        $crate::dprint($fmt, &[]);
    }};
    ($fmt:expr, $($arg:expr),+ $(,)?) => {{
        $crate::dprint($fmt, &[$($crate::Arg::from($arg)),+]);
    }};
}
#[cfg(not(feature = "dprint"))]
#[macro_export]
macro_rules! dprintf {
    ($fmt:expr) => {{}};
    ($fmt:expr, $($arg:expr),+ $(,)?) => {{}};
}

/// Macro for printing debug messages, with a newline.
///
/// This method prints only if the `dprint` feature enabled.
#[cfg(feature = "dprint")]
#[macro_export]
macro_rules! dprintfln {
    () => {{
        $crate::dprint($crate::NEWLINE, &[]);
    }};
    ($fmt:literal) => {{
        $crate::dprint(concat!($fmt, "\r\n"), &[]);
    }};
    ($fmt:literal, $($arg:expr),+ $(,)?) => {{
        $crate::dprint(concat!($fmt, "\r\n"), &[$($crate::Arg::from($arg)),+]);
    }};
}
#[cfg(not(feature = "dprint"))]
#[macro_export]
macro_rules! dprintfln {
    () => {{}};
    ($fmt:literal) => {{}};
    ($fmt:literal, $($arg:expr),+ $(,)?) => {{}};
}
