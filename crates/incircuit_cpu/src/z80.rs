//! Zilog Z80 bus master.

use incircuit_common::{Connection, Level, PinMode, Result};
use incircuit_hal::{Board, Bus, Pin, PinMap};

use crate::{
    await_level, expect, expect_toggling, float, hold, poll_level, AddressSpace, Cpu, Interrupt,
};

pub(crate) const CLK: Connection = Connection::new(6, "CLK");
pub(crate) const VCC: Connection = Connection::new(11, "Vcc");
pub(crate) const INT: Connection = Connection::new(16, "_INT");
pub(crate) const NMI: Connection = Connection::new(17, "_NMI");
pub(crate) const HALT: Connection = Connection::new(18, "_HALT");
pub(crate) const MREQ: Connection = Connection::new(19, "_MREQ");
pub(crate) const IORQ: Connection = Connection::new(20, "_IORQ");
pub(crate) const RD: Connection = Connection::new(21, "_RD");
pub(crate) const WR: Connection = Connection::new(22, "_WR");
pub(crate) const BUSACK: Connection = Connection::new(23, "_BUSACK");
pub(crate) const WAIT: Connection = Connection::new(24, "_WAIT");
pub(crate) const BUSREQ: Connection = Connection::new(25, "_BUSREQ");
pub(crate) const RESET: Connection = Connection::new(26, "_RESET");
pub(crate) const M1: Connection = Connection::new(27, "_M1");
pub(crate) const RFSH: Connection = Connection::new(28, "_RFSH");
pub(crate) const GND: Connection = Connection::new(29, "GND");

pub(crate) const ADDRESS: [Connection; 16] = [
    Connection::new(30, "A0"),
    Connection::new(31, "A1"),
    Connection::new(32, "A2"),
    Connection::new(33, "A3"),
    Connection::new(34, "A4"),
    Connection::new(35, "A5"),
    Connection::new(36, "A6"),
    Connection::new(37, "A7"),
    Connection::new(38, "A8"),
    Connection::new(39, "A9"),
    Connection::new(40, "A10"),
    Connection::new(1, "A11"),
    Connection::new(2, "A12"),
    Connection::new(3, "A13"),
    Connection::new(4, "A14"),
    Connection::new(5, "A15"),
];

pub(crate) const DATA: [Connection; 8] = [
    Connection::new(14, "D0"),
    Connection::new(15, "D1"),
    Connection::new(12, "D2"),
    Connection::new(8, "D3"),
    Connection::new(7, "D4"),
    Connection::new(9, "D5"),
    Connection::new(10, "D6"),
    Connection::new(13, "D7"),
];

/// Polls allowed for `_WAIT` to release on an ordinary cycle.
const WAIT_RELEASE_POLLS: u32 = 64;
/// Polls allowed for each edge of the blanking window on a SYNC cycle.
const SYNC_WINDOW_POLLS: u32 = 4096;
/// CLK and `_WAIT` samples taken by the check.
const CLOCK_SAMPLES: u32 = 1000;

pub struct Z80Cpu<B> {
    board: B,
    bus_a: Bus,
    bus_d: Bus,
    rd: Pin,
    wr: Pin,
    wait: Pin,
    iorq: Pin,
    mreq: Pin,
    vram: Option<u16>,
}

impl<B: Board> Z80Cpu<B> {
    pub fn new(board: B) -> Self {
        Self {
            board,
            bus_a: Bus::new(PinMap::DIL40, &ADDRESS),
            bus_d: Bus::new(PinMap::DIL40, &DATA),
            rd: Pin::new(PinMap::DIL40, RD),
            wr: Pin::new(PinMap::DIL40, WR),
            wait: Pin::new(PinMap::DIL40, WAIT),
            iorq: Pin::new(PinMap::DIL40, IORQ),
            mreq: Pin::new(PinMap::DIL40, MREQ),
            vram: None,
        }
    }

    /// Have the check confirm that `address` is held off by `_WAIT` for part
    /// of every line. Qualifier bits above 16 are ignored.
    pub fn with_vram(mut self, address: u32) -> Self {
        self.vram = Some(address as u16);
        self
    }

    fn select(&mut self, space: AddressSpace) {
        if space.contains(AddressSpace::IO) {
            self.mreq.write_high(&mut self.board);
            self.iorq.write_low(&mut self.board);
        } else {
            self.iorq.write_high(&mut self.board);
            self.mreq.write_low(&mut self.board);
        }
    }

    fn deselect(&mut self) {
        self.rd.write_high(&mut self.board);
        self.wr.write_high(&mut self.board);
        self.mreq.write_high(&mut self.board);
        self.iorq.write_high(&mut self.board);
    }

    /// Video RAM on some boards only answers during horizontal blanking.
    /// Such accesses see `_WAIT` asserted for the active line and released
    /// at the start of the blank.
    fn sync_window(&mut self, space: AddressSpace) -> Result<()> {
        if space.contains(AddressSpace::SYNC) {
            await_level(&mut self.board, &self.wait, Level::Low, SYNC_WINDOW_POLLS)?;
            await_level(&mut self.board, &self.wait, Level::High, SYNC_WINDOW_POLLS)?;
        }
        Ok(())
    }

    fn read_strobe(&mut self, space: AddressSpace) -> Result<u16> {
        self.rd.write_low(&mut self.board);
        self.sync_window(space)?;
        for _ in 0..WAIT_RELEASE_POLLS {
            if self.wait.read(&mut self.board).is_high() {
                break;
            }
        }
        let data = self
            .bus_d
            .read_then_write(&mut self.board, &self.rd, Level::High);
        self.wait.check(&mut self.board, Level::High)?;
        Ok(data)
    }

    /// A memory request to VRAM should see `_WAIT` follow the video timing.
    /// A line stuck at either level would hang every SYNC cycle.
    fn vram_wait(&mut self, address: u16) -> Result<()> {
        self.bus_a.set_mode(&mut self.board, PinMode::Output);
        self.bus_a.write(&mut self.board, address);
        self.mreq.write_low(&mut self.board);
        let result = expect_toggling(&mut self.board, &self.wait, CLOCK_SAMPLES);
        self.mreq.write_high(&mut self.board);
        result
    }

    fn write_strobe(&mut self, space: AddressSpace) -> Result<()> {
        self.wr.write_low(&mut self.board);
        self.sync_window(space)?;
        for _ in 0..WAIT_RELEASE_POLLS {
            if self.wait.read(&mut self.board).is_high() {
                break;
            }
        }
        self.wr.write_high(&mut self.board);
        self.wait.check(&mut self.board, Level::High)
    }
}

impl<B: Board> Cpu for Z80Cpu<B> {
    fn idle(&mut self) -> Result<()> {
        let board = &mut self.board;
        for input in [VCC, INT, NMI, WAIT, BUSREQ, RESET, CLK] {
            float(board, input, PinMode::Input);
        }
        for output in [HALT, BUSACK, M1, RFSH] {
            hold(board, output, Level::High);
        }
        float(board, GND, PinMode::InputPullup);

        self.bus_a.set_mode(board, PinMode::InputPullup);
        self.bus_d.set_mode(board, PinMode::InputPullup);

        for strobe in [RD, WR, IORQ, MREQ] {
            hold(board, strobe, Level::High);
        }
        Ok(())
    }

    fn check(&mut self) -> Result<()> {
        let board = &mut self.board;
        expect(board, GND, Level::Low)?;
        expect(board, VCC, Level::High)?;
        expect(board, RESET, Level::High)?;
        expect(board, WAIT, Level::High)?;
        expect(board, BUSREQ, Level::High)?;
        self.bus_a.check(board, 0xFFFF)?;
        self.bus_d.check(board, 0xFF)?;
        expect_toggling(board, &Pin::new(PinMap::DIL40, CLK), CLOCK_SAMPLES)?;
        if let Some(address) = self.vram {
            self.vram_wait(address)?;
        }
        self.idle()
    }

    fn memory_read(&mut self, address: u32) -> Result<u16> {
        let space = AddressSpace::of(address);
        log::trace!("z80: read {:06X}", address);

        self.bus_a.set_mode(&mut self.board, PinMode::Output);
        self.bus_a.write(&mut self.board, address as u16);
        self.bus_d.set_mode(&mut self.board, PinMode::Input);
        self.select(space);

        self.board.no_interrupts();
        let result = self.read_strobe(space);
        self.board.interrupts();

        self.deselect();
        result
    }

    fn memory_write(&mut self, address: u32, data: u16) -> Result<()> {
        let space = AddressSpace::of(address);
        log::trace!("z80: write {:06X} {:02X}", address, data);

        self.bus_a.set_mode(&mut self.board, PinMode::Output);
        self.bus_a.write(&mut self.board, address as u16);
        self.bus_d.set_mode(&mut self.board, PinMode::Output);
        self.bus_d.write(&mut self.board, data & 0xFF);
        self.select(space);

        self.board.no_interrupts();
        let result = self.write_strobe(space);
        self.board.interrupts();

        self.deselect();
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
            Interrupt::Irq => INT,
        };
        // Both lines are active low.
        let sense = Level::from_bool(!active);
        poll_level(
            &mut self.board,
            &Pin::new(PinMap::DIL40, line),
            sense,
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
