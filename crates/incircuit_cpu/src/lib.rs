pub mod ay38910;
pub mod i8080;
pub mod i8085;
pub mod m6502;
pub mod m6802;
pub mod m6809e;
pub mod pia6821;
pub mod sim;
pub mod z80;

use bitflags::bitflags;
use incircuit_common::{Connection, Error, Level, PinMode, Result};
use incircuit_hal::pin::expect_level;
use incircuit_hal::{Board, Pin, PinMap};

pub use ay38910::{Ay38910, AyPorts, Channel};
pub use i8080::I8080Cpu;
pub use i8085::I8085Cpu;
pub use m6502::M6502Cpu;
pub use m6802::M6802Cpu;
pub use m6809e::{M6809EClockMasterCpu, M6809EPinout, PINOUT_6809E, PINOUT_KONAMI1};
pub use pia6821::Pia6821Proxy;
pub use z80::Z80Cpu;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Interrupt {
    Nmi,
    Irq,
}

bitflags! {
    /// Qualifier bits carried above the 16-bit address in a bus request.
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    pub struct AddressSpace: u32 {
        /// IO space rather than memory space.
        const IO = 0x01_0000;
        /// Wait for the board's access window (HBLANK or READY) before
        /// completing the cycle.
        const SYNC = 0x10_0000;
    }
}

impl AddressSpace {
    #[inline]
    pub fn of(address: u32) -> AddressSpace {
        AddressSpace::from_bits_truncate(address)
    }
}

/// Bus side of a removed processor.
///
/// An implementation owns the pins of one CPU family and performs exactly one
/// target visible bus transaction per `memory_read`/`memory_write`. It keeps
/// no state between calls beyond pin directions and idle levels.
pub trait Cpu {
    /// Put every control line in the safe state for a CPU-less socket.
    fn idle(&mut self) -> Result<()>;

    /// Check power, float and clock pins. On failure the pins are left in
    /// the failing state for diagnosis; on success they are back at idle.
    fn check(&mut self) -> Result<()>;

    fn data_bus_width(&self, _address: u32) -> u8 {
        1
    }

    fn data_access_width(&self, _address: u32) -> u8 {
        1
    }

    fn memory_read(&mut self, address: u32) -> Result<u16>;
    fn memory_write(&mut self, address: u32, data: u16) -> Result<()>;

    /// Poll the line for `interrupt` until it reaches the requested sense.
    /// The line is sampled at least once even with a zero timeout.
    fn wait_for_interrupt(&mut self, interrupt: Interrupt, active: bool, timeout_ms: u32)
        -> Result<()>;

    fn acknowledge_interrupt(&mut self) -> Result<u16>;

    /// Host delay on the tester's own clock.
    fn delay_ms(&mut self, ms: u32);
}

impl<C: Cpu + ?Sized> Cpu for &mut C {
    fn idle(&mut self) -> Result<()> {
        (**self).idle()
    }

    fn check(&mut self) -> Result<()> {
        (**self).check()
    }

    fn data_bus_width(&self, address: u32) -> u8 {
        (**self).data_bus_width(address)
    }

    fn data_access_width(&self, address: u32) -> u8 {
        (**self).data_access_width(address)
    }

    fn memory_read(&mut self, address: u32) -> Result<u16> {
        (**self).memory_read(address)
    }

    fn memory_write(&mut self, address: u32, data: u16) -> Result<()> {
        (**self).memory_write(address, data)
    }

    fn wait_for_interrupt(
        &mut self,
        interrupt: Interrupt,
        active: bool,
        timeout_ms: u32,
    ) -> Result<()> {
        (**self).wait_for_interrupt(interrupt, active, timeout_ms)
    }

    fn acknowledge_interrupt(&mut self) -> Result<u16> {
        (**self).acknowledge_interrupt()
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

impl<C: Cpu + ?Sized> Cpu for Box<C> {
    fn idle(&mut self) -> Result<()> {
        (**self).idle()
    }

    fn check(&mut self) -> Result<()> {
        (**self).check()
    }

    fn data_bus_width(&self, address: u32) -> u8 {
        (**self).data_bus_width(address)
    }

    fn data_access_width(&self, address: u32) -> u8 {
        (**self).data_access_width(address)
    }

    fn memory_read(&mut self, address: u32) -> Result<u16> {
        (**self).memory_read(address)
    }

    fn memory_write(&mut self, address: u32, data: u16) -> Result<()> {
        (**self).memory_write(address, data)
    }

    fn wait_for_interrupt(
        &mut self,
        interrupt: Interrupt,
        active: bool,
        timeout_ms: u32,
    ) -> Result<()> {
        (**self).wait_for_interrupt(interrupt, active, timeout_ms)
    }

    fn acknowledge_interrupt(&mut self) -> Result<u16> {
        (**self).acknowledge_interrupt()
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

/// Millisecond timeout poll shared by the drivers whose interrupt inputs are
/// plain pins. Samples at least once. Elapsed time is taken modulo 2^32 so
/// the poll survives the millisecond counter wrapping.
pub(crate) fn poll_level<B: Board + ?Sized>(
    board: &mut B,
    pin: &Pin,
    sense: Level,
    timeout_ms: u32,
) -> Result<()> {
    let start = board.millis();
    loop {
        if pin.read(board) == sense {
            return Ok(());
        }
        if board.millis().wrapping_sub(start) >= timeout_ms {
            return Err(Error::Timeout);
        }
    }
}

/// Bounded spin for a handshake line. Fails with a pin mismatch once
/// `polls` samples have passed without seeing `level`.
pub(crate) fn await_level<B: Board + ?Sized>(
    board: &mut B,
    pin: &Pin,
    level: Level,
    polls: u32,
) -> Result<()> {
    for _ in 0..polls {
        if pin.read(board) == level {
            return Ok(());
        }
    }
    expect_level(pin.connection(), !level, level)
}

/// Input with the given mode. Signals not fitted on a pinout are skipped.
pub(crate) fn float<B: Board + ?Sized>(board: &mut B, connection: Connection, mode: PinMode) {
    if connection.is_fitted() {
        Pin::new(PinMap::DIL40, connection).set_mode(board, mode);
    }
}

/// Output held at `level`. The latch is set before the direction so the
/// line never glitches to the other level.
pub(crate) fn hold<B: Board + ?Sized>(board: &mut B, connection: Connection, level: Level) {
    if connection.is_fitted() {
        let pin = Pin::new(PinMap::DIL40, connection);
        pin.write(board, level);
        pin.set_mode(board, PinMode::Output);
    }
}

pub(crate) fn expect<B: Board + ?Sized>(
    board: &mut B,
    connection: Connection,
    level: Level,
) -> Result<()> {
    if !connection.is_fitted() {
        return Ok(());
    }
    Pin::new(PinMap::DIL40, connection).check(board, level)
}

/// Sample a free running clock and fail unless both levels were seen.
pub(crate) fn expect_toggling<B: Board + ?Sized>(
    board: &mut B,
    pin: &Pin,
    samples: u32,
) -> Result<()> {
    let (mut high, mut low) = (0u32, 0u32);
    for _ in 0..samples {
        if pin.read(board).is_high() {
            high += 1;
        } else {
            low += 1;
        }
    }
    if low == 0 {
        return expect_level(pin.connection(), Level::High, Level::Low);
    }
    if high == 0 {
        return expect_level(pin.connection(), Level::Low, Level::High);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use incircuit_hal::sim::{SimBoard, SimConfig};

    use super::*;

    const NMI: Connection = Connection::new(17, "_NMI");

    fn pulled_up(start_us: u64) -> (SimBoard, Pin) {
        let mut board = SimBoard::new(SimConfig::builder().start_us(start_us).build());
        let pin = Pin::new(PinMap::DIL40, NMI);
        pin.set_mode(&mut board, PinMode::InputPullup);
        (board, pin)
    }

    #[test]
    fn poll_runs_for_the_whole_timeout() {
        let (mut board, pin) = pulled_up(0);
        assert_eq!(poll_level(&mut board, &pin, Level::Low, 5), Err(Error::Timeout));
        assert!(board.now_us() >= 5_000);
        assert_eq!(poll_level(&mut board, &pin, Level::High, 0), Ok(()));
    }

    #[test]
    fn poll_times_out_across_the_millisecond_wrap() {
        // Three milliseconds before the counter wraps to zero.
        let start_us = (u64::from(u32::MAX) - 2) * 1000;
        let (mut board, pin) = pulled_up(start_us);
        assert_eq!(poll_level(&mut board, &pin, Level::Low, 5), Err(Error::Timeout));
        let elapsed = board.now_us() - start_us;
        assert!((5_000..6_000).contains(&elapsed), "{}", elapsed);
    }
}
