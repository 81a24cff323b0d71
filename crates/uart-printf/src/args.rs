use core::ffi::CStr;

/// A type-tagged argument of the format string.
///
/// Arguments are usually created by the [`uprintf!`](crate::uprintf) family
/// of macros via the `From` conversions.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Arg<'a> {
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    Char(char),
    /// String bytes, terminated either by a NUL byte or by the end of the slice.
    Str(&'a [u8]),
}

/// An integer argument widened to 64 bits.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Int {
    Signed(i64),
    Unsigned(u64),
}

impl Int {
    /// Reinterprets the value as signed in the given width.
    pub(crate) fn signed(self, wide: bool) -> i64 {
        match self {
            Int::Signed(value) => value,
            Int::Unsigned(value) if wide => value as i64,
            Int::Unsigned(value) => i64::from(value as u32 as i32),
        }
    }

    /// Reinterprets the value as unsigned in the given width.
    pub(crate) fn unsigned(self, wide: bool) -> u64 {
        match self {
            Int::Unsigned(value) => value,
            Int::Signed(value) if wide => value as u64,
            Int::Signed(value) => u64::from(value as i32 as u32),
        }
    }
}

impl<'a> Arg<'a> {
    /// Returns an integer argument if it fits into the requested width.
    ///
    /// 32-bit arguments are widened when the 64-bit width is requested,
    /// 64-bit arguments are never truncated.
    pub(crate) fn int(&self, wide: bool) -> Option<Int> {
        match (*self, wide) {
            (Arg::I32(value), _) => Some(Int::Signed(value.into())),
            (Arg::U32(value), _) => Some(Int::Unsigned(value.into())),
            (Arg::I64(value), true) => Some(Int::Signed(value)),
            (Arg::U64(value), true) => Some(Int::Unsigned(value)),
            _ => None,
        }
    }

    /// Returns the string bytes up to the NUL terminator.
    pub(crate) fn str_bytes(&self) -> Option<&'a [u8]> {
        match *self {
            Arg::Str(bytes) => {
                let len = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
                Some(&bytes[..len])
            }
            _ => None,
        }
    }
}

macro_rules! impl_from_int {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Arg<'_> {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )+
    };
}

impl_from_int!(I32: i8, i16, i32);
impl_from_int!(I64: i64);
impl_from_int!(U32: u8, u16, u32);
impl_from_int!(U64: u64);

#[cfg(target_pointer_width = "64")]
impl From<isize> for Arg<'_> {
    fn from(value: isize) -> Self {
        Self::I64(value as i64)
    }
}

#[cfg(target_pointer_width = "64")]
impl From<usize> for Arg<'_> {
    fn from(value: usize) -> Self {
        Self::U64(value as u64)
    }
}

#[cfg(not(target_pointer_width = "64"))]
impl From<isize> for Arg<'_> {
    fn from(value: isize) -> Self {
        Self::I32(value as i32)
    }
}

#[cfg(not(target_pointer_width = "64"))]
impl From<usize> for Arg<'_> {
    fn from(value: usize) -> Self {
        Self::U32(value as u32)
    }
}

impl From<char> for Arg<'_> {
    fn from(value: char) -> Self {
        Self::Char(value)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(value.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::Str(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Arg<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Self::Str(value.as_slice())
    }
}

impl<'a> From<&'a CStr> for Arg<'a> {
    fn from(value: &'a CStr) -> Self {
        Self::Str(value.to_bytes())
    }
}
