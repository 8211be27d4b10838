//! Motorola 6802 bus master for sound boards.
//!
//! The tester drives E directly. Power and VMA are re-checked before every
//! cycle since a test clip slipping off the part is the common failure on these
//! boards.

use incircuit_common::{Connection, Level, PinMode, Result};
use incircuit_hal::{Board, Bus, Pin, PinMap};

use crate::{expect, float, hold, poll_level, Cpu, Interrupt};

pub(crate) const GND1: Connection = Connection::new(1, "GND1");
pub(crate) const HALT: Connection = Connection::new(2, "_HALT");
pub(crate) const MR: Connection = Connection::new(3, "MR");
pub(crate) const IRQ: Connection = Connection::new(4, "_IRQ");
pub(crate) const VMA: Connection = Connection::new(5, "VMA");
pub(crate) const NMI: Connection = Connection::new(6, "_NMI");
pub(crate) const BA: Connection = Connection::new(7, "BA");
pub(crate) const VCC1: Connection = Connection::new(8, "Vcc1");
pub(crate) const GND2: Connection = Connection::new(21, "GND2");
pub(crate) const R_W: Connection = Connection::new(34, "R/W");
pub(crate) const VCC2: Connection = Connection::new(35, "Vcc2");
pub(crate) const RE: Connection = Connection::new(36, "RE");
pub(crate) const E: Connection = Connection::new(37, "E");
pub(crate) const XTAL: Connection = Connection::new(38, "XTAL");
pub(crate) const EXTAL: Connection = Connection::new(39, "EXTAL");
pub(crate) const RESET: Connection = Connection::new(40, "_RESET");

pub(crate) const ADDRESS: [Connection; 16] = [
    Connection::new(9, "A0"),
    Connection::new(10, "A1"),
    Connection::new(11, "A2"),
    Connection::new(12, "A3"),
    Connection::new(13, "A4"),
    Connection::new(14, "A5"),
    Connection::new(15, "A6"),
    Connection::new(16, "A7"),
    Connection::new(17, "A8"),
    Connection::new(18, "A9"),
    Connection::new(19, "A10"),
    Connection::new(20, "A11"),
    Connection::new(22, "A12"),
    Connection::new(23, "A13"),
    Connection::new(24, "A14"),
    Connection::new(25, "A15"),
];

pub(crate) const DATA: [Connection; 8] = [
    Connection::new(33, "D0"),
    Connection::new(32, "D1"),
    Connection::new(31, "D2"),
    Connection::new(30, "D3"),
    Connection::new(29, "D4"),
    Connection::new(28, "D5"),
    Connection::new(27, "D6"),
    Connection::new(26, "D7"),
];

/// Register writes that put the on-board 6821 at 0x400 into its running
/// state: port A all outputs driven low with CA2 low, port B all inputs with
/// the CB1 rising edge interrupt enabled.
pub const PIA_INIT: [(u32, u16); 7] = [
    (0x0401, 0x00),
    (0x0400, 0xFF),
    (0x0401, 0x34),
    (0x0400, 0x00),
    (0x0403, 0x00),
    (0x0402, 0x00),
    (0x0403, 0x37),
];

pub struct M6802Cpu<B> {
    board: B,
    bus_a: Bus,
    bus_d: Bus,
    e: Pin,
    r_w: Pin,
}

impl<B: Board> M6802Cpu<B> {
    pub fn new(board: B) -> Self {
        Self {
            board,
            bus_a: Bus::new(PinMap::DIL40, &ADDRESS),
            bus_d: Bus::new(PinMap::DIL40, &DATA),
            e: Pin::new(PinMap::DIL40, E),
            r_w: Pin::new(PinMap::DIL40, R_W),
        }
    }

    fn check_power(&mut self) -> Result<()> {
        let board = &mut self.board;
        expect(board, GND1, Level::Low)?;
        expect(board, GND2, Level::Low)?;
        expect(board, VCC1, Level::High)?;
        expect(board, VCC2, Level::High)?;
        expect(board, VMA, Level::High)
    }

    fn begin(&mut self, address: u32, read: bool) -> Result<()> {
        self.check_power()?;
        self.bus_a.set_mode(&mut self.board, PinMode::Output);
        self.bus_a.write(&mut self.board, address as u16);
        self.r_w.write(&mut self.board, Level::from_bool(read));
        self.r_w.check(&mut self.board, Level::from_bool(read))
    }
}

impl<B: Board> Cpu for M6802Cpu<B> {
    fn idle(&mut self) -> Result<()> {
        let board = &mut self.board;
        // RAM enable and the crystal are left to the board.
        for unused in [RE, XTAL, EXTAL] {
            float(board, unused, PinMode::Input);
        }
        hold(board, BA, Level::Low);
        float(board, GND1, PinMode::InputPullup);
        float(board, GND2, PinMode::InputPullup);
        for input in [VCC1, VCC2, RESET, HALT, MR, NMI, IRQ] {
            float(board, input, PinMode::Input);
        }
        hold(board, VMA, Level::High);

        self.bus_a.set_mode(board, PinMode::InputPullup);
        self.bus_d.set_mode(board, PinMode::InputPullup);

        hold(board, E, Level::Low);
        hold(board, R_W, Level::High);

        for (address, data) in PIA_INIT {
            if let Err(error) = self.memory_write(address, data) {
                log::warn!("6802: PIA set up write {:04X} failed: {}", address, error);
            }
        }
        self.bus_a.set_mode(&mut self.board, PinMode::InputPullup);
        Ok(())
    }

    /// The data bus is not checked: the sound boards leave D0 loaded.
    fn check(&mut self) -> Result<()> {
        self.check_power()?;
        let board = &mut self.board;
        expect(board, RESET, Level::High)?;
        expect(board, HALT, Level::High)?;
        expect(board, MR, Level::High)?;
        expect(board, NMI, Level::High)?;
        self.bus_a.check(board, 0xFFFF)?;
        expect(board, E, Level::Low)?;
        expect(board, R_W, Level::High)
    }

    fn memory_read(&mut self, address: u32) -> Result<u16> {
        log::trace!("6802: read {:04X}", address & 0xFFFF);
        self.begin(address, true)?;
        self.bus_d.set_mode(&mut self.board, PinMode::Input);

        self.board.no_interrupts();
        self.e.write_high(&mut self.board);
        let data = self
            .bus_d
            .read_then_write(&mut self.board, &self.e, Level::Low);
        self.board.interrupts();
        Ok(data)
    }

    fn memory_write(&mut self, address: u32, data: u16) -> Result<()> {
        log::trace!("6802: write {:04X} {:02X}", address & 0xFFFF, data);
        let result = self.begin(address, false);
        if result.is_ok() {
            self.board.no_interrupts();
            self.e.write_high(&mut self.board);
            self.bus_d.set_mode(&mut self.board, PinMode::Output);
            self.bus_d.write(&mut self.board, data & 0xFF);
            // Peripherals latch on the falling edge of E.
            self.e.write_low(&mut self.board);
            self.board.interrupts();
        }

        self.r_w.write_high(&mut self.board);
        self.bus_d.set_mode(&mut self.board, PinMode::Input);
        result
    }

    fn wait_for_interrupt(
        &mut self,
        interrupt: Interrupt,
        active: bool,
        timeout_ms: u32,
    ) -> Result<()> {
        let line = match interrupt {
            Interrupt::Nmi => NMI,
            Interrupt::Irq => IRQ,
        };
        poll_level(
            &mut self.board,
            &Pin::new(PinMap::DIL40, line),
            Level::from_bool(!active),
            timeout_ms,
        )
    }

    fn acknowledge_interrupt(&mut self) -> Result<u16> {
        Ok(0)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.board.delay_ms(ms);
    }
}
