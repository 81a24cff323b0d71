//! Minimal `printf` interpreter writing one byte at a time.
//!
//! Supported directives are `%%`, `%c`, `%s`, `%d`, `%i`, `%u` and `%x`, the
//! integer ones take an optional `l` modifier selecting the 64-bit width.
//!
//! Directives the printer cannot honor are written out literally:
//!
//! - an unknown conversion (`%q`) keeps the argument for the next directive;
//! - a directive without a remaining argument is written as is;
//! - an argument of the wrong type is consumed, so the following directives
//!   stay aligned with their arguments.

use embedded_hal::serial::Write;

use crate::{
    args::Arg,
    numfmt::{Base, NumBuf},
    Error, Result,
};

/// Formatted output with the `printf` like interface.
pub trait Print {
    /// Prints the format string, substituting the directives with the given arguments.
    fn print(&mut self, format: &str, args: &[Arg<'_>]) -> Result<()>;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Conversion {
    Percent,
    Signed,
    Unsigned,
    Hex,
    Char,
    Str,
}

impl Conversion {
    fn parse(byte: u8) -> Option<Self> {
        let conversion = match byte {
            b'%' => Self::Percent,
            b'd' | b'i' => Self::Signed,
            b'u' => Self::Unsigned,
            b'x' => Self::Hex,
            b'c' => Self::Char,
            b's' => Self::Str,
            _ => return None,
        };
        Some(conversion)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Directive {
    conversion: Option<Conversion>,
    wide: bool,
    /// Length of the directive text in the format string.
    len: usize,
}

impl Directive {
    /// Parses the directive at the beginning of `text`, which starts with `%`.
    fn parse(text: &[u8]) -> Self {
        let wide = text.get(1) == Some(&b'l');
        let prefix = 1 + usize::from(wide);

        match text.get(prefix).copied().and_then(Conversion::parse) {
            // `%l%` is not a literal percent sign.
            Some(Conversion::Percent) if wide => Self {
                conversion: None,
                wide,
                len: prefix,
            },
            Some(conversion) => Self {
                conversion: Some(conversion),
                wide,
                len: prefix + 1,
            },
            None => Self {
                conversion: None,
                wide,
                len: prefix,
            },
        }
    }
}

fn write_all<W>(tx: &mut W, bytes: &[u8]) -> Result<()>
where
    W: Write<u8> + ?Sized,
{
    for byte in bytes {
        nb::block!(tx.write(*byte)).map_err(Error::write)?;
    }
    Ok(())
}

/// Prints the format string into the given serial writer.
pub(crate) fn print_to<W>(tx: &mut W, format: &str, args: &[Arg<'_>]) -> Result<()>
where
    W: Write<u8> + ?Sized,
{
    let format = format.as_bytes();
    let mut args = args.iter();
    let mut buf = NumBuf::new();

    let mut pos = 0;
    while pos < format.len() {
        let Some(offset) = format[pos..].iter().position(|b| *b == b'%') else {
            return write_all(tx, &format[pos..]);
        };
        write_all(tx, &format[pos..pos + offset])?;
        pos += offset;

        let directive = Directive::parse(&format[pos..]);
        let text = &format[pos..pos + directive.len];
        pos += directive.len;

        let conversion = match directive.conversion {
            Some(Conversion::Percent) => {
                write_all(tx, b"%")?;
                continue;
            }
            Some(conversion) => conversion,
            None => {
                write_all(tx, text)?;
                continue;
            }
        };

        let Some(arg) = args.next() else {
            write_all(tx, text)?;
            continue;
        };

        let wide = directive.wide;
        match (conversion, arg) {
            (Conversion::Signed, arg) => match arg.int(wide) {
                Some(int) => {
                    let digits = buf.convert_signed(int.signed(wide), Base::DECIMAL);
                    write_all(tx, digits.as_bytes())?
                }
                None => write_all(tx, text)?,
            },
            (Conversion::Unsigned, arg) => match arg.int(wide) {
                Some(int) => {
                    let digits = buf.convertl(int.unsigned(wide), Base::DECIMAL);
                    write_all(tx, digits.as_bytes())?
                }
                None => write_all(tx, text)?,
            },
            (Conversion::Hex, arg) => match arg.int(wide) {
                Some(int) => {
                    let digits = buf.convertl(int.unsigned(wide), Base::HEX);
                    write_all(tx, digits.as_bytes())?
                }
                None => write_all(tx, text)?,
            },
            // A single byte on the wire, wider characters do not fit.
            (Conversion::Char, Arg::Char(c)) if !wide && c.is_ascii() => {
                write_all(tx, &[*c as u8])?
            }
            (Conversion::Char, Arg::I32(value)) if !wide => write_all(tx, &[*value as u8])?,
            (Conversion::Char, Arg::U32(value)) if !wide => write_all(tx, &[*value as u8])?,
            (Conversion::Str, arg) if !wide => match arg.str_bytes() {
                Some(bytes) => write_all(tx, bytes)?,
                None => write_all(tx, text)?,
            },
            _ => write_all(tx, text)?,
        }
    }

    Ok(())
}

/// Formatted writer on top of the serial port transmitter.
#[derive(Debug)]
pub struct Printer<W> {
    tx: W,
}

impl<W: Write<u8>> Printer<W> {
    pub fn new(tx: W) -> Self {
        Self { tx }
    }

    /// Writes a single byte, blocking until the transmitter accepts it.
    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        nb::block!(self.tx.write(byte)).map_err(Error::write)
    }

    /// Writes the whole buffer.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        write_all(&mut self.tx, bytes)
    }

    pub fn flush(&mut self) -> Result<()> {
        nb::block!(self.tx.flush()).map_err(Error::write)
    }

    pub fn print(&mut self, format: &str, args: &[Arg<'_>]) -> Result<()> {
        print_to(&mut self.tx, format, args)
    }

    pub fn into_inner(self) -> W {
        self.tx
    }
}

impl<W: Write<u8>> Print for Printer<W> {
    fn print(&mut self, format: &str, args: &[Arg<'_>]) -> Result<()> {
        Printer::print(self, format, args)
    }
}

/// Inert counterpart of the [`Printer`], it never touches the transmitter.
#[derive(Debug)]
pub struct NullSink<W> {
    tx: W,
}

impl<W> NullSink<W> {
    pub fn new(tx: W) -> Self {
        Self { tx }
    }

    #[inline(always)]
    pub fn print(&mut self, _format: &str, _args: &[Arg<'_>]) -> Result<()> {
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.tx
    }
}

impl<W> Print for NullSink<W> {
    #[inline(always)]
    fn print(&mut self, format: &str, args: &[Arg<'_>]) -> Result<()> {
        NullSink::print(self, format, args)
    }
}

/// Printer used for debug output, selected by the `dprint` feature.
#[cfg(feature = "dprint")]
pub type DebugPrinter<W> = Printer<W>;
/// Printer used for debug output, selected by the `dprint` feature.
#[cfg(not(feature = "dprint"))]
pub type DebugPrinter<W> = NullSink<W>;

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use super::*;

    /// Transmitter that records every written byte.
    #[derive(Default, Debug)]
    struct RecordingTx {
        bytes: Vec<u8>,
        writes: usize,
        flushes: usize,
    }

    impl Write<u8> for RecordingTx {
        type Error = Infallible;

        fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
            self.writes += 1;
            self.bytes.push(word);
            Ok(())
        }

        fn flush(&mut self) -> nb::Result<(), Self::Error> {
            self.flushes += 1;
            Ok(())
        }
    }

    /// Transmitter that is busy every other call.
    #[derive(Default)]
    struct SlowTx {
        bytes: Vec<u8>,
        busy: bool,
    }

    impl Write<u8> for SlowTx {
        type Error = Infallible;

        fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
            self.busy = !self.busy;
            if self.busy {
                return Err(nb::Error::WouldBlock);
            }
            self.bytes.push(word);
            Ok(())
        }

        fn flush(&mut self) -> nb::Result<(), Self::Error> {
            Ok(())
        }
    }

    struct BrokenTx;

    impl Write<u8> for BrokenTx {
        type Error = ();

        fn write(&mut self, _word: u8) -> nb::Result<(), Self::Error> {
            Err(nb::Error::Other(()))
        }

        fn flush(&mut self) -> nb::Result<(), Self::Error> {
            Err(nb::Error::Other(()))
        }
    }

    fn printed(format: &str, args: &[Arg<'_>]) -> String {
        let mut printer = Printer::new(RecordingTx::default());
        printer.print(format, args).unwrap();
        String::from_utf8(printer.into_inner().bytes).unwrap()
    }

    #[test]
    fn test_percent() {
        let mut printer = Printer::new(RecordingTx::default());
        printer.print("%%", &[]).unwrap();

        let tx = printer.into_inner();
        assert_eq!(tx.bytes, b"%");
        assert_eq!(tx.writes, 1);
    }

    #[test]
    fn test_unsigned_and_hex() {
        assert_eq!(printed("%u,%x", &[10.into(), 255.into()]), "10,ff");
    }

    #[test]
    fn test_literal_text() {
        assert_eq!(printed("", &[]), "");
        assert_eq!(printed("hello\r\n", &[]), "hello\r\n");
        assert_eq!(printed("100%% sure", &[]), "100% sure");
    }

    #[test]
    fn test_signed() {
        assert_eq!(printed("%d %i", &[(-42).into(), 42.into()]), "-42 42");
        assert_eq!(printed("%d", &[i32::MIN.into()]), "-2147483648");
        assert_eq!(printed("%ld", &[i64::MIN.into()]), "-9223372036854775808");
        assert_eq!(printed("%ld", &[(-5_i32).into()]), "-5");
    }

    #[test]
    fn test_signedness_is_reinterpreted() {
        assert_eq!(printed("%u", &[(-1).into()]), "4294967295");
        assert_eq!(printed("%x", &[(-1).into()]), "ffffffff");
        assert_eq!(printed("%lx", &[(-1).into()]), "ffffffffffffffff");
        assert_eq!(printed("%d", &[u32::MAX.into()]), "-1");
    }

    #[test]
    fn test_long_modifier() {
        assert_eq!(printed("%lu", &[u64::MAX.into()]), "18446744073709551615");
        assert_eq!(printed("%lx", &[0xdead_beef_u64.into()]), "deadbeef");
        assert_eq!(printed("%lu", &[7_u32.into()]), "7");
    }

    #[test]
    fn test_char_and_str() {
        assert_eq!(printed("[%c]", &['a'.into()]), "[a]");
        assert_eq!(printed("[%c]", &[0x41.into()]), "[A]");
        assert_eq!(printed("<%s>", &["uart".into()]), "<uart>");
        assert_eq!(printed("<%s>", &[b"nul\0tail".into()]), "<nul>");
        assert_eq!(printed("<%s>", &["".into()]), "<>");
    }

    #[test]
    fn test_mixed() {
        assert_eq!(
            printed(
                "%s: %d/%u (0x%x) %c%%",
                &["temp".into(), (-3).into(), 7_u8.into(), 48879.into(), '!'.into()]
            ),
            "temp: -3/7 (0xbeef) !%"
        );
    }

    #[test]
    fn test_unknown_conversion_is_literal() {
        assert_eq!(printed("%q %d", &[5.into()]), "%q 5");
        assert_eq!(printed("%lq", &[]), "%lq");
        assert_eq!(printed("%f", &[1.into()]), "%f");
        assert_eq!(printed("%l%d", &[3.into()]), "%l3");
    }

    #[test]
    fn test_trailing_percent_is_literal() {
        assert_eq!(printed("50%", &[]), "50%");
        assert_eq!(printed("50%l", &[]), "50%l");
    }

    #[test]
    fn test_missing_argument_is_literal() {
        assert_eq!(printed("%d,%s", &[1.into()]), "1,%s");
        assert_eq!(printed("%c", &[]), "%c");
    }

    #[test]
    fn test_type_mismatch_consumes_argument() {
        assert_eq!(printed("%s %d", &[5.into(), 6.into()]), "%s 6");
        assert_eq!(printed("%d %s", &["x".into(), "y".into()]), "%d y");
        assert_eq!(printed("%u", &[u64::MAX.into()]), "%u");
        assert_eq!(printed("%lc %ls", &['a'.into(), "b".into()]), "%lc %ls");
    }

    #[test]
    fn test_char_is_a_single_byte() {
        let mut printer = Printer::new(RecordingTx::default());
        printer.print("%c", &['\u{7f}'.into()]).unwrap();
        assert_eq!(printer.into_inner().bytes, [0x7f]);

        // Non-ASCII characters are a mismatch and still take their argument.
        assert_eq!(printed("[%c]", &['\u{20ac}'.into()]), "[%c]");
        assert_eq!(printed("%c%c", &['é'.into(), 'k'.into()]), "%ck");
    }

    #[test]
    fn test_surplus_arguments_are_ignored() {
        assert_eq!(printed("%d", &[1.into(), 2.into()]), "1");
    }

    #[test]
    fn test_would_block_is_retried() {
        let mut printer = Printer::new(SlowTx::default());
        printer.print("%s=%x", &["id".into(), 26.into()]).unwrap();

        assert_eq!(printer.into_inner().bytes, b"id=1a");
    }

    #[test]
    fn test_write_error() {
        let mut printer = Printer::new(BrokenTx);

        assert_eq!(printer.print("x", &[]), Err(Error::Write));
        assert_eq!(printer.write_byte(b'x'), Err(Error::Write));
        assert_eq!(printer.flush(), Err(Error::Write));
        // Nothing to write.
        assert_eq!(printer.print("", &[]), Ok(()));
    }

    #[test]
    fn test_write_bytes_and_flush() {
        let mut printer = Printer::new(RecordingTx::default());
        printer.write_bytes(b"raw\0bytes").unwrap();
        printer.flush().unwrap();

        let tx = printer.into_inner();
        assert_eq!(tx.bytes, b"raw\0bytes");
        assert_eq!(tx.flushes, 1);
    }

    #[test]
    fn test_null_sink_never_writes() {
        let mut sink = NullSink::new(RecordingTx::default());
        for format in ["", "%%", "text", "%d %s %c %lx %q %"] {
            sink.print(format, &[1.into(), "s".into(), 'c'.into()]).unwrap();
        }

        let tx = sink.into_inner();
        assert!(tx.bytes.is_empty());
        assert_eq!(tx.writes, 0);
        assert_eq!(tx.flushes, 0);
    }

    #[test]
    fn test_print_trait_objects() {
        fn print_dyn(printer: &mut dyn Print) -> Result<()> {
            printer.print("%u", &[1.into()])
        }

        let mut printer = Printer::new(RecordingTx::default());
        let mut sink = NullSink::new(RecordingTx::default());
        print_dyn(&mut printer).unwrap();
        print_dyn(&mut sink).unwrap();

        assert_eq!(printer.into_inner().bytes, b"1");
        assert!(sink.into_inner().bytes.is_empty());
    }

    #[test]
    fn test_directive_parse() {
        assert_eq!(
            Directive::parse(b"%ld"),
            Directive {
                conversion: Some(Conversion::Signed),
                wide: true,
                len: 3
            }
        );
        assert_eq!(
            Directive::parse(b"%"),
            Directive {
                conversion: None,
                wide: false,
                len: 1
            }
        );
        assert_eq!(
            Directive::parse(b"%l%"),
            Directive {
                conversion: None,
                wide: true,
                len: 2
            }
        );
    }
}
