//! Integer to string conversion without dynamic memory.
//!
//! Digits are accumulated from the end of a caller-owned [`NumBuf`] backward,
//! the returned string borrows the buffer, so it has to be consumed before
//! the buffer can be reused for the next conversion.

use crate::{Error, Result};

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Radix of a string representation, always within `2..=36`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Base(u8);

impl Base {
    pub const MIN: u32 = 2;
    pub const MAX: u32 = 36;

    pub const BINARY: Self = Self(2);
    pub const OCTAL: Self = Self(8);
    pub const DECIMAL: Self = Self(10);
    pub const HEX: Self = Self(16);

    /// Creates a base from the given radix.
    ///
    /// Radixes outside of `2..=36` are clamped to decimal.
    pub fn new(radix: u32) -> Self {
        Self::try_new(radix).unwrap_or_else(|err| {
            log::warn!("{}, falling back to decimal", err);
            Self::DECIMAL
        })
    }

    /// Creates a base from the given radix, rejecting radixes outside of `2..=36`.
    pub const fn try_new(radix: u32) -> Result<Self> {
        if radix >= Self::MIN && radix <= Self::MAX {
            Ok(Self(radix as u8))
        } else {
            Err(Error::InvalidBase(radix))
        }
    }

    pub const fn radix(self) -> u32 {
        self.0 as u32
    }
}

impl Default for Base {
    fn default() -> Self {
        Self::DECIMAL
    }
}

impl From<u32> for Base {
    fn from(radix: u32) -> Self {
        Self::new(radix)
    }
}

/// Fixed size scratch buffer for a single number conversion.
#[derive(Clone, Debug)]
pub struct NumBuf {
    bytes: [u8; Self::CAPACITY],
    start: usize,
}

// The widest supported integer in the smallest base, a sign and a terminator.
const _: () = assert!(NumBuf::CAPACITY >= u64::BITS as usize / Base::MIN.ilog2() as usize + 2);

impl NumBuf {
    pub const CAPACITY: usize = u64::BITS as usize + 2;

    const NUL: usize = Self::CAPACITY - 1;

    pub const fn new() -> Self {
        Self {
            bytes: [0; Self::CAPACITY],
            start: Self::NUL,
        }
    }

    /// Converts a 32-bit value.
    pub fn convert(&mut self, value: u32, base: Base) -> &str {
        self.convertl(u64::from(value), base)
    }

    /// Converts a 64-bit value.
    pub fn convertl(&mut self, value: u64, base: Base) -> &str {
        self.fill(value, base, false);
        self.as_str()
    }

    /// Converts a signed value, negative values get a leading `-`.
    pub fn convert_signed(&mut self, value: i64, base: Base) -> &str {
        self.fill(value.unsigned_abs(), base, value < 0);
        self.as_str()
    }

    /// Returns the digits of the last conversion.
    pub fn as_str(&self) -> &str {
        // The buffer only ever holds ASCII digits and the sign.
        core::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[self.start..Self::NUL]
    }

    /// Returns the digits of the last conversion followed by a NUL terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes[self.start..]
    }

    fn fill(&mut self, mut value: u64, base: Base, negative: bool) {
        let radix = u64::from(base.radix());

        let mut pos = Self::NUL;
        self.bytes[pos] = 0;
        loop {
            pos -= 1;
            self.bytes[pos] = DIGITS[(value % radix) as usize];
            value /= radix;
            if value == 0 {
                break;
            }
        }

        if negative {
            pos -= 1;
            self.bytes[pos] = b'-';
        }
        self.start = pos;
    }
}

impl Default for NumBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a 32-bit value into its string representation in the given radix.
///
/// Radixes outside of `2..=36` are clamped to decimal.
pub fn convert(value: u32, radix: u32, buf: &mut NumBuf) -> &str {
    buf.convert(value, Base::new(radix))
}

/// Converts a 64-bit value into its string representation in the given radix.
///
/// Radixes outside of `2..=36` are clamped to decimal.
pub fn convertl(value: u64, radix: u32, buf: &mut NumBuf) -> &str {
    buf.convertl(value, Base::new(radix))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASES: [u32; 5] = [2, 8, 10, 16, 36];

    // Deterministic sweep over the whole u32 range.
    fn sample_values() -> impl Iterator<Item = u32> {
        let mut state = 0x2545_f491_u32;
        let random = core::iter::from_fn(move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            Some(state)
        });

        [0, 1, 2, 9, 10, 15, 16, 35, 36, 255, 256, u32::MAX - 1, u32::MAX]
            .into_iter()
            .chain(random.take(2_000))
    }

    #[test]
    fn test_convert_parses_back() {
        let mut buf = NumBuf::new();
        for base in BASES {
            for value in sample_values() {
                let text = convert(value, base, &mut buf);
                assert_eq!(u32::from_str_radix(text, base).unwrap(), value, "{text}");
            }
        }
    }

    #[test]
    fn test_convert_zero() {
        let mut buf = NumBuf::new();
        for radix in Base::MIN..=Base::MAX {
            assert_eq!(convert(0, radix, &mut buf), "0");
            assert_eq!(convertl(0, radix, &mut buf), "0");
        }
    }

    #[test]
    fn test_convert_known_values() {
        let mut buf = NumBuf::new();

        assert_eq!(convert(255, 16, &mut buf), "ff");
        assert_eq!(convert(10, 2, &mut buf), "1010");
        assert_eq!(convert(35, 36, &mut buf), "z");
        assert_eq!(convert(u32::MAX, 10, &mut buf), "4294967295");
        assert_eq!(convertl(u64::MAX, 16, &mut buf), "ffffffffffffffff");
    }

    #[test]
    fn test_convertl_widest_value_fits() {
        let mut buf = NumBuf::new();

        let text = convertl(u64::MAX, 2, &mut buf);
        assert_eq!(text.len(), 64);
        assert!(text.bytes().all(|b| b == b'1'));

        let text = buf.convert_signed(i64::MIN, Base::BINARY);
        assert_eq!(text.len(), 65);
        assert!(text.starts_with("-1"));
    }

    #[test]
    fn test_convert_signed() {
        let mut buf = NumBuf::new();

        assert_eq!(buf.convert_signed(-42, Base::DECIMAL), "-42");
        assert_eq!(buf.convert_signed(42, Base::DECIMAL), "42");
        assert_eq!(buf.convert_signed(0, Base::DECIMAL), "0");
        assert_eq!(
            buf.convert_signed(i64::MIN, Base::DECIMAL),
            "-9223372036854775808"
        );
        assert_eq!(buf.convert_signed(-255, Base::HEX), "-ff");
    }

    #[test]
    fn test_nul_terminator() {
        let mut buf = NumBuf::new();
        buf.convert(1234, Base::DECIMAL);

        assert_eq!(buf.as_bytes_with_nul(), b"1234\0");
        assert_eq!(buf.as_bytes(), b"1234");
    }

    #[test]
    fn test_out_of_range_base_is_clamped() {
        let mut buf = NumBuf::new();

        assert_eq!(convert(255, 0, &mut buf), "255");
        assert_eq!(convert(255, 1, &mut buf), "255");
        assert_eq!(convert(255, 37, &mut buf), "255");
        assert_eq!(convertl(u64::MAX, 1000, &mut buf), "18446744073709551615");
    }

    #[test]
    fn test_base_try_new() {
        assert_eq!(Base::try_new(16), Ok(Base::HEX));
        assert_eq!(Base::try_new(1), Err(Error::InvalidBase(1)));
        assert_eq!(Base::try_new(37), Err(Error::InvalidBase(37)));
        assert_eq!(Base::from(2), Base::BINARY);
        assert_eq!(Base::default().radix(), 10);
    }
}
