use incircuit_common::{Connection, Level};
use incircuit_hal::sim::{Device, PinBank};
use incircuit_hal::PinMap;

use super::{gpio, gpios, SharedMemory, Space};
use crate::m6809e::{M6809EPinout, CLOCK};
use crate::Interrupt;

/// E and Q for each quarter of a machine cycle, indexed by phase.
const QUADRATURE: [(Level, Level); 4] = [
    (Level::Low, Level::Low),
    (Level::Low, Level::High),
    (Level::High, Level::High),
    (Level::High, Level::Low),
];

/// Board side of a 6809E socket whose clock comes from the tester.
///
/// Each rising edge on the auxiliary clock advances E/Q one quarter cycle.
/// `_RESET` is held for the first few clocks as a power-on reset would.
pub struct M6809ETarget {
    memory: SharedMemory,
    pinout: &'static M6809EPinout,
    address: Vec<u8>,
    data: Vec<u8>,
    clock: u8,
    last_clock: Level,
    phase: usize,
    clocks: u32,
    reset_clocks: u32,
}

impl M6809ETarget {
    pub fn new(memory: SharedMemory, pinout: &'static M6809EPinout) -> Self {
        Self {
            memory,
            pinout,
            address: gpios(&pinout.address),
            data: gpios(&pinout.data),
            clock: PinMap::AUX8.gpio(CLOCK.pin),
            last_clock: Level::Low,
            phase: 0,
            clocks: 0,
            reset_clocks: 32,
        }
    }

    pub fn reset_clocks(mut self, clocks: u32) -> Self {
        self.reset_clocks = clocks;
        self
    }
}

fn drive(pins: &mut PinBank, connection: Connection, level: Level) {
    if connection.is_fitted() {
        pins.drive(gpio(connection), Some(level));
    }
}

impl Device for M6809ETarget {
    fn update(&mut self, now_us: u64, pins: &mut PinBank) {
        let p = self.pinout;
        drive(pins, p.gnd, Level::Low);
        drive(pins, p.vcc, Level::High);
        drive(pins, p.halt, Level::High);
        drive(pins, p.tsc, Level::Low);

        let mut memory = self.memory.borrow_mut();
        let nmi = memory.interrupt_active(Interrupt::Nmi, now_us);
        let irq = memory.interrupt_active(Interrupt::Irq, now_us);
        drive(pins, p.nmi, Level::from_bool(!nmi));
        drive(pins, p.irq, Level::from_bool(!irq));
        drive(pins, p.firq, Level::High);

        let clock = pins.level(self.clock);
        let rising = self.last_clock.is_low() && clock.is_high();
        self.last_clock = clock;

        let (e_before, _) = QUADRATURE[self.phase];
        if rising {
            self.clocks = self.clocks.saturating_add(1);
            self.phase = (self.phase + 1) % QUADRATURE.len();
        }
        let (e, q) = QUADRATURE[self.phase];
        drive(pins, p.e, e);
        drive(pins, p.q, q);
        drive(pins, p.reset, Level::from_bool(self.clocks >= self.reset_clocks));

        let address = pins.read_value(&self.address);
        let read = pins.level(gpio(p.rw)).is_high();
        let selected = pins.level(gpio(p.ba)).is_low();

        if selected && read && e.is_high() {
            let value = memory.read(Space::Memory, address);
            if e_before.is_low() {
                memory.record_read(Space::Memory, address, value.unwrap_or(0xFF));
            }
            pins.drive_value(&self.data, value.map(u16::from));
        } else {
            pins.drive_value(&self.data, None);
        }

        if selected && !read && e_before.is_high() && e.is_low() {
            let value = pins.read_value(&self.data) as u8;
            memory.write(Space::Memory, address, value);
        }
    }
}
