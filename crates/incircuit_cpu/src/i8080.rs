//! Intel 8080 bus master.
//!
//! The 8080 announces every machine cycle with a status byte on the data bus
//! latched by a SYNC pulse (normally into an 8228/8238). The tester produces
//! that status byte itself, then runs the DBIN or `_WR` strobe.

use bitflags::bitflags;
use incircuit_common::{Connection, Error, Level, PinMode, Result};
use incircuit_hal::{Board, Bus, Pin, PinMap};

use crate::{expect, float, hold, poll_level, AddressSpace, Cpu, Interrupt};

pub(crate) const GND: Connection = Connection::new(2, "GND");
/// -5V, never driven.
pub(crate) const VBB: Connection = Connection::new(11, "Vbb");
pub(crate) const RESET: Connection = Connection::new(12, "RESET");
pub(crate) const HOLD: Connection = Connection::new(13, "HOLD");
pub(crate) const INT: Connection = Connection::new(14, "INT");
/// +12V clock, never driven.
pub(crate) const CLK2: Connection = Connection::new(15, "CLK2");
pub(crate) const INTE: Connection = Connection::new(16, "INTE");
pub(crate) const DBIN: Connection = Connection::new(17, "DBIN");
pub(crate) const WR: Connection = Connection::new(18, "_WR");
pub(crate) const SYNC: Connection = Connection::new(19, "SYNC");
pub(crate) const VCC: Connection = Connection::new(20, "Vcc");
pub(crate) const HLDA: Connection = Connection::new(21, "HLDA");
/// +12V clock, never driven.
pub(crate) const CLK1: Connection = Connection::new(22, "CLK1");
pub(crate) const READY: Connection = Connection::new(23, "READY");
pub(crate) const WAIT: Connection = Connection::new(24, "WAIT");
/// +12V, never driven.
pub(crate) const VDD: Connection = Connection::new(28, "Vdd");

pub(crate) const ADDRESS: [Connection; 16] = [
    Connection::new(25, "A0"),
    Connection::new(26, "A1"),
    Connection::new(27, "A2"),
    Connection::new(29, "A3"),
    Connection::new(30, "A4"),
    Connection::new(31, "A5"),
    Connection::new(32, "A6"),
    Connection::new(33, "A7"),
    Connection::new(34, "A8"),
    Connection::new(35, "A9"),
    Connection::new(1, "A10"),
    Connection::new(40, "A11"),
    Connection::new(37, "A12"),
    Connection::new(38, "A13"),
    Connection::new(39, "A14"),
    Connection::new(36, "A15"),
];

pub(crate) const DATA: [Connection; 8] = [
    Connection::new(10, "D0"),
    Connection::new(9, "D1"),
    Connection::new(8, "D2"),
    Connection::new(7, "D3"),
    Connection::new(3, "D4"),
    Connection::new(4, "D5"),
    Connection::new(5, "D6"),
    Connection::new(6, "D7"),
];

bitflags! {
    /// Processor status byte placed on D0..D7 during SYNC.
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    pub struct StatusWord: u8 {
        const INTA = 0x01;
        const RD = 0x02;
        const STACK = 0x04;
        const HLT = 0x08;
        const OUTP = 0x10;
        const M1 = 0x20;
        const INP = 0x40;
        const MEMRD = 0x80;
    }
}

impl StatusWord {
    pub fn for_cycle(io: bool, read: bool) -> StatusWord {
        match (io, read) {
            (true, true) => StatusWord::RD | StatusWord::INP,
            (false, true) => StatusWord::RD | StatusWord::MEMRD,
            (true, false) => StatusWord::OUTP,
            (false, false) => StatusWord::empty(),
        }
    }
}

/// IO ports are 8 bits wide; the 8080 repeats the port number on A8..A15
/// and some boards decode from the upper copy.
pub fn mirror_port(address: u32) -> u16 {
    let port = (address & 0xFF) as u16;
    (port << 8) | port
}

pub struct I8080Cpu<B> {
    board: B,
    bus_a: Bus,
    bus_d: Bus,
    dbin: Pin,
    sync: Pin,
    ready: Pin,
    wr: Pin,
}

impl<B: Board> I8080Cpu<B> {
    pub fn new(board: B) -> Self {
        Self {
            board,
            bus_a: Bus::new(PinMap::DIL40, &ADDRESS),
            bus_d: Bus::new(PinMap::DIL40, &DATA),
            dbin: Pin::new(PinMap::DIL40, DBIN),
            sync: Pin::new(PinMap::DIL40, SYNC),
            ready: Pin::new(PinMap::DIL40, READY),
            wr: Pin::new(PinMap::DIL40, WR),
        }
    }

    fn cycle(&mut self, address: u32, data: u16, read: bool) -> Result<u16> {
        let space = AddressSpace::of(address);
        let io = space.contains(AddressSpace::IO);
        let bus_address = if io {
            mirror_port(address)
        } else {
            address as u16
        };
        let status = StatusWord::for_cycle(io, read);

        self.bus_a.set_mode(&mut self.board, PinMode::Output);
        self.bus_a.write(&mut self.board, bus_address);
        self.bus_d.set_mode(&mut self.board, PinMode::Output);
        self.bus_d.write(&mut self.board, u16::from(status.bits()));

        self.board.no_interrupts();
        let result = if space.contains(AddressSpace::SYNC) {
            // READY-gated cycles need the board's phase 2 clock, which the
            // tester cannot see on this socket.
            Err(Error::NotImplemented)
        } else {
            Ok(self.strobe(data, read))
        };
        self.board.interrupts();
        result
    }

    fn strobe(&mut self, data: u16, read: bool) -> u16 {
        self.sync.write_high(&mut self.board);
        self.sync.write_low(&mut self.board);

        if read {
            self.bus_d.set_mode(&mut self.board, PinMode::Input);
            self.dbin.write_high(&mut self.board);
            self.bus_d
                .read_then_write(&mut self.board, &self.dbin, Level::Low)
        } else {
            self.bus_d.write(&mut self.board, data & 0xFF);
            self.wr.write_low(&mut self.board);
            self.wr.write_high(&mut self.board);
            0
        }
    }
}

impl<B: Board> Cpu for I8080Cpu<B> {
    fn idle(&mut self) -> Result<()> {
        let board = &mut self.board;
        for unpowered in [CLK1, CLK2, VDD, VBB] {
            float(board, unpowered, PinMode::InputPullup);
        }
        // Bus sharing and wait states are not supported, interrupts are
        // always enabled.
        hold(board, HLDA, Level::Low);
        hold(board, WAIT, Level::Low);
        hold(board, INTE, Level::High);

        for input in [HOLD, RESET, INT, VCC] {
            float(board, input, PinMode::Input);
        }
        float(board, GND, PinMode::InputPullup);

        hold(board, DBIN, Level::Low);
        hold(board, SYNC, Level::Low);
        hold(board, WR, Level::High);
        self.ready.set_mode(board, PinMode::Input);

        self.bus_a.set_mode(board, PinMode::InputPullup);
        self.bus_d.set_mode(board, PinMode::InputPullup);
        Ok(())
    }

    /// The clocks are not TTL levels, so they are only checked to be
    /// unconnected.
    fn check(&mut self) -> Result<()> {
        let board = &mut self.board;
        expect(board, GND, Level::Low)?;
        expect(board, VCC, Level::High)?;
        for unpowered in [CLK1, CLK2, VDD, VBB] {
            expect(board, unpowered, Level::High)?;
        }
        expect(board, RESET, Level::Low)?;
        expect(board, HOLD, Level::Low)?;
        self.bus_a.check(board, 0xFFFF)?;
        self.bus_d.check(board, 0xFF)?;
        self.idle()
    }

    fn memory_read(&mut self, address: u32) -> Result<u16> {
        log::trace!("8080: read {:06X}", address);
        self.cycle(address, 0, true)
    }

    fn memory_write(&mut self, address: u32, data: u16) -> Result<()> {
        log::trace!("8080: write {:06X} {:02X}", address, data);
        self.cycle(address, data, false).map(|_| ())
    }

    /// INT is the only interrupt input and is active high.
    fn wait_for_interrupt(
        &mut self,
        _interrupt: Interrupt,
        active: bool,
        timeout_ms: u32,
    ) -> Result<()> {
        poll_level(
            &mut self.board,
            &Pin::new(PinMap::DIL40, INT),
            Level::from_bool(active),
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
