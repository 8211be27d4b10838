use std::fmt;

use crate::hex::{hex16, hex32, hex8};
use crate::pin::{Connection, Level};

/// Width of the status line every result is rendered onto.
pub const DISPLAY_WIDTH: usize = 16;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Broad failure classes, used by callers that only need to branch on the
/// kind (e.g. the soak loop or the interrupt absence checks).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ErrorKind {
    NamedPinMismatch,
    Timeout,
    NotImplemented,
    Unexpected,
    Custom,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Error {
    /// A single pin was sampled at the wrong level.
    PinMismatch {
        connection: Connection,
        expected: Level,
        received: Level,
    },
    /// A bus was sampled with the wrong value. `connection` is the first
    /// line of the bus and `bits` its width.
    BusMismatch {
        connection: Connection,
        expected: u16,
        received: u16,
        bits: u8,
    },
    RomCrcMismatch {
        location: String,
        expected: u32,
        received: u32,
    },
    Custom(String),
    Timeout,
    NotImplemented,
    Unexpected,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::PinMismatch { .. } | Error::BusMismatch { .. } => ErrorKind::NamedPinMismatch,
            Error::RomCrcMismatch { .. } | Error::Custom(_) => ErrorKind::Custom,
            Error::Timeout => ErrorKind::Timeout,
            Error::NotImplemented => ErrorKind::NotImplemented,
            Error::Unexpected => ErrorKind::Unexpected,
        }
    }

    /// The status line for this error, clipped to the display width.
    pub fn description(&self) -> String {
        clip(self.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PinMismatch {
                connection,
                received,
                ..
            } => {
                let level = if received.is_high() { " Hi " } else { " Lo " };
                write!(f, "E:{}{}{}", connection.name, connection.pin, level)
            }
            Error::BusMismatch {
                connection,
                expected,
                received,
                bits,
            } => {
                if *bits > 8 {
                    write!(f, "E:{}{}", connection.name, hex16(u32::from(*received)))
                } else {
                    write!(f, "E:{}{}{}", connection.name, hex8(*expected), hex8(*received))
                }
            }
            Error::RomCrcMismatch {
                location, received, ..
            } => write!(f, "E:{}{}", location, hex32(*received)),
            Error::Custom(message) => f.write_str(message),
            Error::Timeout => f.write_str("E:Timeout"),
            Error::NotImplemented => f.write_str("E:Not Impl."),
            Error::Unexpected => f.write_str("E:Unexpected"),
        }
    }
}

impl std::error::Error for Error {}

/// Successful outcome of a tester operation.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub enum Status {
    #[default]
    Ok,
    /// A success carrying its own text, e.g. read back data or a table entry
    /// summary.
    Message(String),
}

impl Status {
    pub fn message(text: impl Into<String>) -> Status {
        Status::Message(text.into())
    }

    pub fn description(&self) -> String {
        clip(self.to_string())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => f.write_str("OK!"),
            Status::Message(text) => f.write_str(text),
        }
    }
}

fn clip(mut text: String) -> String {
    if let Some((index, _)) = text.char_indices().nth(DISPLAY_WIDTH) {
        text.truncate(index);
    }
    text
}

/// `E:<label> <exp> <rec>` when an 8-bit value differs.
pub fn check_u8(label: &str, received: u16, expected: u16) -> Result<()> {
    if received == expected {
        return Ok(());
    }
    Err(Error::Custom(format!(
        "E:{}{}{}",
        label,
        hex8(expected),
        hex8(received)
    )))
}

/// `E:<location> <addr> <exp> <rec>` when a value read at an address
/// differs from the one expected.
pub fn check_value(location: &str, address: u32, received: u16, expected: u16) -> Result<()> {
    if received == expected {
        return Ok(());
    }
    Err(Error::Custom(format!(
        "E:{}{}{}{}",
        location,
        hex16(address),
        hex8(expected),
        hex8(received)
    )))
}

/// 16-bit variant of [`check_value`]. The address does not fit on the line
/// so only the two values are shown.
pub fn check_value16(location: &str, received: u16, expected: u16) -> Result<()> {
    if received == expected {
        return Ok(());
    }
    Err(Error::Custom(format!(
        "E:{}{}{}",
        location,
        hex16(u32::from(expected)),
        hex16(u32::from(received))
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_mismatch_names_pin_and_received_level() {
        let err = Error::PinMismatch {
            connection: Connection::new(24, "_WAIT"),
            expected: Level::High,
            received: Level::Low,
        };
        assert_eq!(err.to_string(), "E:_WAIT24 Lo ");
        assert_eq!(err.kind(), ErrorKind::NamedPinMismatch);
    }

    #[test]
    fn bus_mismatch_formats_by_width() {
        let narrow = Error::BusMismatch {
            connection: Connection::new(14, "D0"),
            expected: 0xFF,
            received: 0xF7,
            bits: 8,
        };
        assert_eq!(narrow.to_string(), "E:D0 FF F7");

        let wide = Error::BusMismatch {
            connection: Connection::new(30, "A0"),
            expected: 0xFFFF,
            received: 0xFBFF,
            bits: 16,
        };
        assert_eq!(wide.to_string(), "E:A0 FBFF");
    }

    #[test]
    fn crc_mismatch_shows_received_and_keeps_expected() {
        let err = Error::RomCrcMismatch {
            location: " 2C".to_string(),
            expected: 0xB89207A1,
            received: 0x12345678,
        };
        assert_eq!(err.description(), "E: 2C 12345678");
        assert_eq!(err.kind(), ErrorKind::Custom);
    }

    #[test]
    fn description_is_clipped_to_display() {
        let err = Error::Custom("E:0123456789ABCDEFGHIJ".to_string());
        assert_eq!(err.description().len(), DISPLAY_WIDTH);
        assert_eq!(Status::Ok.description(), "OK!");
    }

    #[test]
    fn value_checks_render_fields() {
        assert!(check_u8("PAx", 0x10, 0x10).is_ok());
        assert_eq!(
            check_u8("PAx", 0x00, 0x10).unwrap_err().to_string(),
            "E:PAx 10 00"
        );
        assert_eq!(
            check_value(" 1K", 0x4012, 0x05, 0x0F).unwrap_err().to_string(),
            "E: 1K 4012 0F 05"
        );
        assert_eq!(
            check_value16("Prg", 0x1234, 0xABCD).unwrap_err().to_string(),
            "E:Prg ABCD 1234"
        );
    }
}
