//! Intel 8085 bus master.
//!
//! The low address byte shares AD0..AD7 with the data and is latched by the
//! board on the falling edge of ALE. IO/M, S0 and S1 stay asserted for the
//! whole cycle.

use incircuit_common::{Connection, Level, PinMode, Result};
use incircuit_hal::pin::expect_level;
use incircuit_hal::{Board, Bus, Pin, PinMap};

use crate::{expect, expect_toggling, float, hold, poll_level, AddressSpace, Cpu, Interrupt};

pub(crate) const X1: Connection = Connection::new(1, "X1");
pub(crate) const X2: Connection = Connection::new(2, "X2");
pub(crate) const RESOUT: Connection = Connection::new(3, "RESOUT");
pub(crate) const SOD: Connection = Connection::new(4, "SOD");
pub(crate) const SID: Connection = Connection::new(5, "SID");
pub(crate) const TRAP: Connection = Connection::new(6, "TRAP");
pub(crate) const RST75: Connection = Connection::new(7, "RST75");
pub(crate) const RST65: Connection = Connection::new(8, "RST65");
pub(crate) const RST55: Connection = Connection::new(9, "RST55");
pub(crate) const INTR: Connection = Connection::new(10, "INTR");
pub(crate) const INTA: Connection = Connection::new(11, "_INTA");
pub(crate) const GND: Connection = Connection::new(20, "GND");
pub(crate) const S0: Connection = Connection::new(29, "S0");
pub(crate) const ALE: Connection = Connection::new(30, "ALE");
pub(crate) const WR: Connection = Connection::new(31, "_WR");
pub(crate) const RD: Connection = Connection::new(32, "_RD");
pub(crate) const S1: Connection = Connection::new(33, "S1");
pub(crate) const IO_M: Connection = Connection::new(34, "IO_M");
pub(crate) const READY: Connection = Connection::new(35, "READY");
pub(crate) const RESIN: Connection = Connection::new(36, "_RESIN");
pub(crate) const CLKOUT: Connection = Connection::new(37, "CLKOUT");
pub(crate) const HLDA: Connection = Connection::new(38, "HLDA");
pub(crate) const HOLD: Connection = Connection::new(39, "HOLD");
pub(crate) const VCC: Connection = Connection::new(40, "Vcc");

/// A8..A15.
pub(crate) const ADDRESS_HIGH: [Connection; 8] = [
    Connection::new(21, "A8"),
    Connection::new(22, "A9"),
    Connection::new(23, "A10"),
    Connection::new(24, "A11"),
    Connection::new(25, "A12"),
    Connection::new(26, "A13"),
    Connection::new(27, "A14"),
    Connection::new(28, "A15"),
];

pub(crate) const ADDRESS_DATA: [Connection; 8] = [
    Connection::new(12, "AD0"),
    Connection::new(13, "AD1"),
    Connection::new(14, "AD2"),
    Connection::new(15, "AD3"),
    Connection::new(16, "AD4"),
    Connection::new(17, "AD5"),
    Connection::new(18, "AD6"),
    Connection::new(19, "AD7"),
];

/// Polls allowed for each edge of READY on a synchronised cycle.
const READY_POLLS: u32 = 8192;
const CLOCK_SAMPLES: u32 = 1000;

pub struct I8085Cpu<B> {
    board: B,
    bus_a: Bus,
    bus_ad: Bus,
    io_m: Pin,
    s0: Pin,
    s1: Pin,
    ale: Pin,
    rd: Pin,
    wr: Pin,
    ready: Pin,
}

impl<B: Board> I8085Cpu<B> {
    pub fn new(board: B) -> Self {
        Self {
            board,
            bus_a: Bus::new(PinMap::DIL40, &ADDRESS_HIGH),
            bus_ad: Bus::new(PinMap::DIL40, &ADDRESS_DATA),
            io_m: Pin::new(PinMap::DIL40, IO_M),
            s0: Pin::new(PinMap::DIL40, S0),
            s1: Pin::new(PinMap::DIL40, S1),
            ale: Pin::new(PinMap::DIL40, ALE),
            rd: Pin::new(PinMap::DIL40, RD),
            wr: Pin::new(PinMap::DIL40, WR),
            ready: Pin::new(PinMap::DIL40, READY),
        }
    }

    fn await_ready(&mut self, level: Level) -> Result<()> {
        let mut value = !level;
        for _ in 0..READY_POLLS {
            value = self.ready.read(&mut self.board);
            if value == level {
                break;
            }
        }
        expect_level(READY, value, level)
    }

    fn access(&mut self, space: AddressSpace, data: u16, read: bool) -> Result<u16> {
        // The board's READY goes low then high once per access window.
        if space.contains(AddressSpace::SYNC) {
            self.await_ready(Level::Low)?;
            self.await_ready(Level::High)?;
        }

        if read {
            self.rd.write_low(&mut self.board);
            Ok(self
                .bus_ad
                .read_then_write(&mut self.board, &self.rd, Level::High))
        } else {
            self.wr.write_low(&mut self.board);
            self.wr.write_high(&mut self.board);
            Ok(data)
        }
    }

    fn cycle(&mut self, address: u32, data: u16, read: bool) -> Result<u16> {
        let space = AddressSpace::of(address);
        let io = space.contains(AddressSpace::IO);

        if io {
            self.io_m.write_high(&mut self.board);
        }
        let status = if read { self.s1 } else { self.s0 };
        status.write_high(&mut self.board);

        self.bus_a.set_mode(&mut self.board, PinMode::Output);
        self.bus_a.write(&mut self.board, ((address >> 8) & 0xFF) as u16);
        self.bus_ad.set_mode(&mut self.board, PinMode::Output);
        self.bus_ad.write(&mut self.board, (address & 0xFF) as u16);

        self.ale.write_high(&mut self.board);
        self.ale.write_low(&mut self.board);

        if read {
            self.bus_ad.set_mode(&mut self.board, PinMode::Input);
        } else {
            self.bus_ad.write(&mut self.board, data & 0xFF);
        }

        self.board.no_interrupts();
        let result = self.access(space, data, read);
        self.board.interrupts();

        if !read {
            self.bus_ad.set_mode(&mut self.board, PinMode::Input);
        }
        status.write_low(&mut self.board);
        if io {
            self.io_m.write_low(&mut self.board);
        }
        result
    }
}

impl<B: Board> Cpu for I8085Cpu<B> {
    fn idle(&mut self) -> Result<()> {
        let board = &mut self.board;
        for input in [X1, X2, SID, TRAP, RST75, RST65, RST55, INTR, GND, RESIN, HOLD, VCC] {
            float(board, input, PinMode::Input);
        }
        // Serial, reset out, clock out and bus sharing are not supported.
        for unused in [RESOUT, SOD, CLKOUT, HLDA] {
            hold(board, unused, Level::Low);
        }
        hold(board, INTA, Level::High);

        for low in [S0, ALE, S1, IO_M] {
            hold(board, low, Level::Low);
        }
        hold(board, WR, Level::High);
        hold(board, RD, Level::High);
        self.ready.set_mode(board, PinMode::Input);

        self.bus_a.set_mode(board, PinMode::InputPullup);
        self.bus_ad.set_mode(board, PinMode::InputPullup);
        Ok(())
    }

    fn check(&mut self) -> Result<()> {
        let board = &mut self.board;
        expect(board, GND, Level::Low)?;
        expect(board, VCC, Level::High)?;
        expect(board, RESIN, Level::High)?;
        expect(board, HOLD, Level::Low)?;
        self.bus_a.check(board, 0xFF)?;
        self.bus_ad.check(board, 0xFF)?;
        expect_toggling(board, &Pin::new(PinMap::DIL40, X1), CLOCK_SAMPLES)?;
        self.idle()
    }

    fn memory_read(&mut self, address: u32) -> Result<u16> {
        log::trace!("8085: read {:06X}", address);
        self.cycle(address, 0, true)
    }

    fn memory_write(&mut self, address: u32, data: u16) -> Result<()> {
        log::trace!("8085: write {:06X} {:02X}", address, data);
        self.cycle(address, data, false).map(|_| ())
    }

    /// TRAP serves as NMI and INTR as IRQ, both active high.
    fn wait_for_interrupt(
        &mut self,
        interrupt: Interrupt,
        active: bool,
        timeout_ms: u32,
    ) -> Result<()> {
        let line = match interrupt {
            Interrupt::Nmi => TRAP,
            Interrupt::Irq => INTR,
        };
        poll_level(
            &mut self.board,
            &Pin::new(PinMap::DIL40, line),
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

#[cfg(test)]
mod tests {
    use incircuit_common::Error;
    use incircuit_hal::sim::{SimBoard, SimConfig};

    use super::*;
    use crate::sim::{I8085Target, InterruptModel, SharedMemory, SimMemory, Space};

    fn rig(memory: SimMemory) -> (SimBoard, SharedMemory, I8085Cpu<SimBoard>) {
        let board = SimBoard::new(SimConfig::builder().build());
        let memory = memory.shared();
        board.attach(I8085Target::new(memory.clone()));
        let mut cpu = I8085Cpu::new(board.clone());
        cpu.idle().unwrap();
        (board, memory, cpu)
    }

    #[test]
    fn check_sees_crystal_toggling() {
        let (board, _memory, mut cpu) = rig(SimMemory::new());
        let modes = board.mode_changes();
        cpu.check().unwrap();
        assert!(board.mode_changes() > modes);
    }

    #[test]
    fn multiplexed_address_is_latched_by_ale() {
        let (board, memory, mut cpu) = rig(SimMemory::new().rom(0x1234, &[0x9C]));
        assert_eq!(cpu.memory_read(0x1234).unwrap(), 0x9C);

        cpu.memory_write(0x4321, 0x3E).unwrap();
        assert_eq!(memory.borrow().peek(Space::Memory, 0x4321), 0x3E);

        cpu.memory_write(0x10077, 0x11).unwrap();
        assert_eq!(memory.borrow().peek(Space::Io, 0x0077), 0x11);

        // Status lines released after the cycle.
        for line in [S0, S1, IO_M] {
            assert_eq!(board.level(PinMap::DIL40.gpio(line.pin)), Level::Low);
        }
    }

    #[test]
    fn ready_synchronised_access_waits_for_window() {
        let memory = SimMemory::new().hold_window(0x4000..=0x43FF, 200, 40);
        let (_board, memory, mut cpu) = rig(memory);
        cpu.memory_write(0x10_4010, 0x5A).unwrap();
        assert_eq!(cpu.memory_read(0x10_4010).unwrap(), 0x5A);
        assert_eq!(memory.borrow().peek(Space::Memory, 0x4010), 0x5A);
    }

    #[test]
    fn trap_and_intr_are_active_high() {
        let memory = SimMemory::new()
            .interrupt(Interrupt::Nmi, InterruptModel::Stuck(true))
            .interrupt(Interrupt::Irq, InterruptModel::Stuck(false));
        let (_board, _memory, mut cpu) = rig(memory);
        cpu.wait_for_interrupt(Interrupt::Nmi, true, 0).unwrap();
        assert_eq!(
            cpu.wait_for_interrupt(Interrupt::Irq, true, 3),
            Err(Error::Timeout)
        );
    }
}
