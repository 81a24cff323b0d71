/// Baud rate the firmware configures the UART with, unless told otherwise.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Line terminator appended by the `*ln` macros.
pub const NEWLINE: &str = "\r\n";
