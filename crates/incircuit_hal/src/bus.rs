use incircuit_common::{Connection, Error, Level, PinMode, Result};

use crate::{Board, Pin, PinMap};

/// An ordered group of pins read and written as one value.
///
/// Bit `i` of the value is connection `i` of the slice the bus was built
/// from. Families list their lines in datasheet bit order, which is often not
/// ascending header order, so the slice is authoritative.
#[derive(Clone, Debug)]
pub struct Bus {
    pins: Vec<Pin>,
    mode: Option<PinMode>,
}

impl Bus {
    pub fn new(map: PinMap, connections: &[Connection]) -> Self {
        debug_assert!(connections.len() <= 16);
        Self {
            pins: connections.iter().map(|c| Pin::new(map, *c)).collect(),
            mode: None,
        }
    }

    pub fn width(&self) -> usize {
        self.pins.len()
    }

    /// Mask covering every line of the bus.
    pub fn mask(&self) -> u16 {
        if self.pins.len() >= 16 {
            0xFFFF
        } else {
            (1u16 << self.pins.len()) - 1
        }
    }

    pub fn first(&self) -> Connection {
        self.pins
            .first()
            .map(Pin::connection)
            .unwrap_or(Connection::new(0, "-"))
    }

    /// Switch the direction of every line. Skipped when the bus is already in
    /// `mode` so back to back cycles do not glitch the lines.
    pub fn set_mode<B: Board + ?Sized>(&mut self, board: &mut B, mode: PinMode) {
        if self.mode == Some(mode) {
            return;
        }
        for pin in &self.pins {
            pin.set_mode(board, mode);
        }
        self.mode = Some(mode);
    }

    pub fn mode(&self) -> Option<PinMode> {
        self.mode
    }

    pub fn write<B: Board + ?Sized>(&self, board: &mut B, value: u16) {
        for (bit, pin) in self.pins.iter().enumerate() {
            pin.write(board, Level::from_bool(value & (1 << bit) != 0));
        }
    }

    pub fn read<B: Board + ?Sized>(&self, board: &mut B) -> u16 {
        self.pins
            .iter()
            .enumerate()
            .fold(0, |value, (bit, pin)| {
                if pin.read(board).is_high() {
                    value | (1 << bit)
                } else {
                    value
                }
            })
    }

    /// Sample the bus and immediately drive `strobe` to `level`.
    ///
    /// Closes a read cycle: the data must be captured before the strobe edge
    /// releases the target's drivers.
    pub fn read_then_write<B: Board + ?Sized>(
        &self,
        board: &mut B,
        strobe: &Pin,
        level: Level,
    ) -> u16 {
        let value = self.read(board);
        strobe.write(board, level);
        value
    }

    pub fn check<B: Board + ?Sized>(&self, board: &mut B, expected: u16) -> Result<()> {
        let received = self.read(board);
        if received == expected {
            return Ok(());
        }
        Err(Error::BusMismatch {
            connection: self.first(),
            expected,
            received,
            bits: self.pins.len() as u8,
        })
    }
}
