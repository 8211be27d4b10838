//! 6809E bus master where the tester is also the clock source.
//!
//! The socket's E and Q are derived from the clock the tester generates on
//! the auxiliary header, so every bus cycle is stepped one clock pulse at a
//! time through the four E/Q quadrature phases.

mod pinout;

use incircuit_common::{Connection, Error, Level, PinMode, Result};
use incircuit_hal::pin::expect_level;
use incircuit_hal::{Board, Bus, Pin, PinMap};

use crate::{expect, float, hold, Cpu, Interrupt};

pub use pinout::{M6809EPinout, PINOUT_6809E, PINOUT_KONAMI1};

/// Master clock output, auxiliary header pin 8.
pub(crate) const CLOCK: Connection = Connection::new(8, "Clock");

/// Clock pulses allowed for each E/Q phase change.
const PHASE_PULSES: u32 = 100;
/// Clock pulses allowed for the board to release `_RESET`. Some boards hold
/// reset for ~0x40000 clocks from power up.
const RESET_PULSES: u32 = 0x41000;
const CLOCK_SAMPLES: u32 = 1000;

pub struct M6809EClockMasterCpu<B> {
    board: B,
    pinout: &'static M6809EPinout,
    bus_a: Bus,
    bus_d: Bus,
    ba: Pin,
    rw: Pin,
    e: Pin,
    q: Pin,
    clock: Pin,
}

impl<B: Board> M6809EClockMasterCpu<B> {
    pub fn new(board: B, pinout: &'static M6809EPinout) -> Self {
        Self {
            board,
            pinout,
            bus_a: Bus::new(PinMap::DIL40, &pinout.address),
            bus_d: Bus::new(PinMap::DIL40, &pinout.data),
            ba: Pin::new(PinMap::DIL40, pinout.ba),
            rw: Pin::new(PinMap::DIL40, pinout.rw),
            e: Pin::new(PinMap::DIL40, pinout.e),
            q: Pin::new(PinMap::DIL40, pinout.q),
            clock: Pin::new(PinMap::AUX8, CLOCK),
        }
    }

    pub fn pinout(&self) -> &'static M6809EPinout {
        self.pinout
    }

    fn pulse(&mut self) {
        self.clock.write_high(&mut self.board);
        self.clock.write_low(&mut self.board);
    }

    /// Pulse the clock until `pin` reads `level`.
    fn advance_until(&mut self, pin: Pin, level: Level) -> Result<()> {
        let mut value = !level;
        for _ in 0..PHASE_PULSES {
            value = pin.read(&mut self.board);
            if value == level {
                break;
            }
            self.pulse();
        }
        expect_level(pin.connection(), value, level)
    }

    /// Final phase of a cycle. Data is latched by the target on the E falling
    /// edge, so on reads the bus is sampled before every pulse and the last
    /// sample taken while E was high is kept.
    fn close_cycle(&mut self, read: bool) -> Result<u16> {
        let mut data = 0;
        let mut value = Level::High;
        for _ in 0..PHASE_PULSES {
            value = self.e.read(&mut self.board);
            if value.is_low() {
                break;
            }
            if read {
                data = self.bus_d.read(&mut self.board);
            }
            self.pulse();
        }
        expect_level(self.pinout.e, value, Level::Low)?;
        self.q.check(&mut self.board, Level::Low)?;
        Ok(data)
    }

    fn cycle(&mut self, address: u32, data: u16, read: bool) -> Result<u16> {
        // E and Q both low: the start of a machine cycle.
        let (mut e, mut q) = (Level::High, Level::High);
        for _ in 0..PHASE_PULSES {
            e = self.e.read(&mut self.board);
            q = self.q.read(&mut self.board);
            if e.is_low() && q.is_low() {
                break;
            }
            self.pulse();
        }
        expect_level(self.pinout.e, e, Level::Low)?;
        expect_level(self.pinout.q, q, Level::Low)?;

        self.bus_a.set_mode(&mut self.board, PinMode::Output);
        self.bus_a.write(&mut self.board, address as u16);
        self.ba.write_low(&mut self.board);

        // Data goes out a phase early; many boards use the Q high time as
        // the access window.
        if !read {
            self.rw.write_low(&mut self.board);
            self.bus_d.set_mode(&mut self.board, PinMode::Output);
            self.bus_d.write(&mut self.board, data & 0xFF);
        }

        self.board.no_interrupts();
        let result = self.phases(read);
        self.board.interrupts();
        let data = result?;

        self.ba.write_high(&mut self.board);
        self.bus_a.write(&mut self.board, 0xFFFF);
        if !read {
            self.bus_d.set_mode(&mut self.board, PinMode::Input);
            self.rw.write_high(&mut self.board);
        }
        Ok(data)
    }

    fn phases(&mut self, read: bool) -> Result<u16> {
        let (e, q) = (self.e, self.q);

        self.advance_until(q, Level::High)?;
        e.check(&mut self.board, Level::Low)?;

        self.advance_until(e, Level::High)?;
        q.check(&mut self.board, Level::High)?;

        self.advance_until(q, Level::Low)?;
        e.check(&mut self.board, Level::High)?;

        self.close_cycle(read)
    }
}

impl<B: Board> Cpu for M6809EClockMasterCpu<B> {
    fn idle(&mut self) -> Result<()> {
        let p = self.pinout;
        let board = &mut self.board;

        float(board, p.gnd, PinMode::InputPullup);
        for input in [p.nmi, p.irq, p.firq, p.vcc, p.reset, p.halt] {
            float(board, input, PinMode::Input);
        }
        hold(board, p.bs, Level::Low);
        hold(board, p.avma, Level::High);
        hold(board, p.lic, Level::High);
        float(board, p.tsc, PinMode::InputPullup);

        self.bus_a.set_mode(board, PinMode::InputPullup);
        self.bus_d.set_mode(board, PinMode::InputPullup);

        self.ba.write_high(board);
        self.ba.set_mode(board, PinMode::Output);
        self.rw.write_high(board);
        self.rw.set_mode(board, PinMode::Output);

        self.e.set_mode(board, PinMode::Input);
        self.q.set_mode(board, PinMode::Input);

        self.clock.write_low(board);
        self.clock.set_mode(board, PinMode::Output);
        Ok(())
    }

    /// The data bus is not checked: some boards decode the idle 0xFFFF
    /// address and drive it.
    fn check(&mut self) -> Result<()> {
        let p = self.pinout;
        expect(&mut self.board, p.gnd, Level::Low)?;
        expect(&mut self.board, p.vcc, Level::High)?;
        expect(&mut self.board, p.halt, Level::High)?;
        expect(&mut self.board, p.tsc, Level::Low)?;
        self.bus_a.check(&mut self.board, 0xFFFF)?;

        let reset = Pin::new(PinMap::DIL40, p.reset);
        for _ in 0..RESET_PULSES {
            if reset.read(&mut self.board).is_high() {
                break;
            }
            self.pulse();
        }
        reset.check(&mut self.board, Level::High)?;

        let (mut e_high, mut e_low, mut q_high, mut q_low) = (0u32, 0u32, 0u32, 0u32);
        for _ in 0..CLOCK_SAMPLES {
            match self.e.read(&mut self.board) {
                Level::High => e_high += 1,
                Level::Low => e_low += 1,
            }
            match self.q.read(&mut self.board) {
                Level::High => q_high += 1,
                Level::Low => q_low += 1,
            }
            self.pulse();
        }
        if e_low == 0 {
            expect_level(p.e, Level::High, Level::Low)?;
        }
        if e_high == 0 {
            expect_level(p.e, Level::Low, Level::High)?;
        }
        if q_low == 0 {
            expect_level(p.q, Level::High, Level::Low)?;
        }
        if q_high == 0 {
            expect_level(p.q, Level::Low, Level::High)?;
        }
        self.idle()
    }

    fn memory_read(&mut self, address: u32) -> Result<u16> {
        log::trace!("6809e: read {:04X}", address & 0xFFFF);
        self.cycle(address, 0, true)
    }

    fn memory_write(&mut self, address: u32, data: u16) -> Result<()> {
        log::trace!("6809e: write {:04X} {:02X}", address & 0xFFFF, data);
        self.cycle(address, data, false).map(|_| ())
    }

    fn wait_for_interrupt(
        &mut self,
        _interrupt: Interrupt,
        _active: bool,
        _timeout_ms: u32,
    ) -> Result<()> {
        Err(Error::NotImplemented)
    }

    fn acknowledge_interrupt(&mut self) -> Result<u16> {
        Err(Error::NotImplemented)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.board.delay_ms(ms);
    }
}
