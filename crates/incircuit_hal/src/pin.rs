use incircuit_common::{Connection, Error, Level, PinMode, Result};

use crate::{Board, PinMap};

/// A connection resolved once to its host GPIO.
///
/// Holds no state of its own; every access goes straight to the board.
#[derive(Copy, Clone, Debug)]
pub struct Pin {
    connection: Connection,
    gpio: u8,
}

impl Pin {
    pub fn new(map: PinMap, connection: Connection) -> Self {
        Self {
            connection,
            gpio: map.gpio(connection.pin),
        }
    }

    #[inline]
    pub fn connection(&self) -> Connection {
        self.connection
    }

    #[inline]
    pub fn gpio(&self) -> u8 {
        self.gpio
    }

    #[inline]
    pub fn set_mode<B: Board + ?Sized>(&self, board: &mut B, mode: PinMode) {
        board.pin_mode(self.gpio, mode);
    }

    #[inline]
    pub fn write<B: Board + ?Sized>(&self, board: &mut B, level: Level) {
        board.digital_write(self.gpio, level);
    }

    #[inline]
    pub fn write_high<B: Board + ?Sized>(&self, board: &mut B) {
        board.digital_write(self.gpio, Level::High);
    }

    #[inline]
    pub fn write_low<B: Board + ?Sized>(&self, board: &mut B) {
        board.digital_write(self.gpio, Level::Low);
    }

    #[inline]
    pub fn read<B: Board + ?Sized>(&self, board: &mut B) -> Level {
        board.digital_read(self.gpio)
    }

    /// Sample the pin and fail with a named pin mismatch if it is not at
    /// `expected`.
    pub fn check<B: Board + ?Sized>(&self, board: &mut B, expected: Level) -> Result<()> {
        let received = self.read(board);
        expect_level(self.connection, received, expected)
    }
}

/// Compare an already sampled level, e.g. the last value seen by a polling
/// loop.
pub fn expect_level(connection: Connection, received: Level, expected: Level) -> Result<()> {
    if received == expected {
        Ok(())
    } else {
        Err(Error::PinMismatch {
            connection,
            expected,
            received,
        })
    }
}
