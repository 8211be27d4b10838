//! MOS 6502 bus master.
//!
//! The tester generates both phase outputs itself: a cycle is CLK1o low with
//! CLK2o high, RDY sampled until the board lets it complete, then the phases
//! return to their idle levels.

use incircuit_common::{Connection, Error, Level, PinMode, Result};
use incircuit_hal::pin::expect_level;
use incircuit_hal::{Board, Bus, Pin, PinMap};

use crate::{expect, expect_toggling, float, hold, poll_level, Cpu, Interrupt};

pub(crate) const GND1: Connection = Connection::new(1, "GND1");
pub(crate) const RDY: Connection = Connection::new(2, "RDY");
pub(crate) const CLK1O: Connection = Connection::new(3, "CLK1o");
pub(crate) const IRQ: Connection = Connection::new(4, "_IRQ");
pub(crate) const NMI: Connection = Connection::new(6, "_NMI");
pub(crate) const SYNC: Connection = Connection::new(7, "SYNC");
pub(crate) const VCC: Connection = Connection::new(8, "Vcc");
pub(crate) const GND2: Connection = Connection::new(21, "GND2");
pub(crate) const R_W: Connection = Connection::new(34, "R_W");
pub(crate) const CLK0I: Connection = Connection::new(37, "CLK0i");
pub(crate) const SO: Connection = Connection::new(38, "SO");
pub(crate) const CLK2O: Connection = Connection::new(39, "CLK2o");
pub(crate) const RES: Connection = Connection::new(40, "RES");

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

const RDY_POLLS: u32 = 64;
const CLOCK_SAMPLES: u32 = 1000;

pub struct M6502Cpu<B> {
    board: B,
    bus_a: Bus,
    bus_d: Bus,
    clk1: Pin,
    clk2: Pin,
    rdy: Pin,
    r_w: Pin,
}

impl<B: Board> M6502Cpu<B> {
    pub fn new(board: B) -> Self {
        Self {
            board,
            bus_a: Bus::new(PinMap::DIL40, &ADDRESS),
            bus_d: Bus::new(PinMap::DIL40, &DATA),
            clk1: Pin::new(PinMap::DIL40, CLK1O),
            clk2: Pin::new(PinMap::DIL40, CLK2O),
            rdy: Pin::new(PinMap::DIL40, RDY),
            r_w: Pin::new(PinMap::DIL40, R_W),
        }
    }

    fn address(&mut self, address: u32) {
        self.bus_a.set_mode(&mut self.board, PinMode::Output);
        self.bus_a.write(&mut self.board, address as u16);
    }

    /// Run phase 2 until RDY is seen high. On a read the data bus is sampled
    /// back to back with the CLK2o falling edge. The phases are back at idle
    /// on return, whether or not RDY came.
    fn phase2(&mut self, read: bool) -> Result<u16> {
        self.clk1.write_low(&mut self.board);
        self.clk2.write_high(&mut self.board);

        let mut ready = Level::Low;
        let mut data = 0;
        for _ in 0..RDY_POLLS {
            ready = self.rdy.read(&mut self.board);
            if ready.is_high() {
                if read {
                    data = self
                        .bus_d
                        .read_then_write(&mut self.board, &self.clk2, Level::Low);
                } else {
                    self.clk2.write_low(&mut self.board);
                }
                self.clk1.write_high(&mut self.board);
                break;
            }
        }
        if ready.is_low() {
            self.clk2.write_low(&mut self.board);
            self.clk1.write_high(&mut self.board);
        }
        expect_level(RDY, ready, Level::High)?;
        Ok(data)
    }
}

impl<B: Board> Cpu for M6502Cpu<B> {
    fn idle(&mut self) -> Result<()> {
        let board = &mut self.board;
        float(board, GND1, PinMode::InputPullup);
        float(board, GND2, PinMode::InputPullup);
        for input in [IRQ, NMI, VCC, CLK0I, SO, RES] {
            float(board, input, PinMode::Input);
        }
        hold(board, SYNC, Level::High);
        hold(board, R_W, Level::High);

        self.bus_a.set_mode(board, PinMode::InputPullup);
        self.bus_d.set_mode(board, PinMode::InputPullup);

        hold(board, CLK1O, Level::High);
        hold(board, CLK2O, Level::High);
        self.rdy.set_mode(board, PinMode::Input);
        Ok(())
    }

    fn check(&mut self) -> Result<()> {
        let board = &mut self.board;
        expect(board, GND1, Level::Low)?;
        expect(board, GND2, Level::Low)?;
        expect(board, VCC, Level::High)?;
        expect(board, RES, Level::High)?;
        expect(board, RDY, Level::High)?;
        self.bus_a.check(board, 0xFFFF)?;
        self.bus_d.check(board, 0xFF)?;
        expect_toggling(board, &Pin::new(PinMap::DIL40, CLK0I), CLOCK_SAMPLES)
    }

    fn memory_read(&mut self, address: u32) -> Result<u16> {
        log::trace!("6502: read {:04X}", address & 0xFFFF);
        self.r_w.write_high(&mut self.board);
        self.address(address);
        self.bus_d.set_mode(&mut self.board, PinMode::Input);

        self.board.no_interrupts();
        let result = self.phase2(true);
        self.board.interrupts();
        result
    }

    fn memory_write(&mut self, address: u32, data: u16) -> Result<()> {
        log::trace!("6502: write {:04X} {:02X}", address & 0xFFFF, data);
        self.r_w.write_low(&mut self.board);
        self.address(address);
        self.bus_d.set_mode(&mut self.board, PinMode::Output);
        self.bus_d.write(&mut self.board, data & 0xFF);

        self.board.no_interrupts();
        let result = self.phase2(false);
        self.board.interrupts();

        self.r_w.write_high(&mut self.board);
        result.map(|_| ())
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
        Err(Error::NotImplemented)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.board.delay_ms(ms);
    }
}
