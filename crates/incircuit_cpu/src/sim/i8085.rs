use incircuit_common::Level;
use incircuit_hal::sim::{Device, PinBank};

use super::{gpio, gpios, SharedMemory, Space};
use crate::i8085::{
    ADDRESS_DATA, ADDRESS_HIGH, ALE, GND, HOLD, INTR, IO_M, RD, READY, RESIN, S0, S1, TRAP, VCC,
    WR, X1,
};
use crate::Interrupt;

/// Board side of an 8085 socket, with the usual 74LS373 holding the low
/// address byte from the falling edge of ALE.
pub struct I8085Target {
    memory: SharedMemory,
    address_high: Vec<u8>,
    address_data: Vec<u8>,
    latched_low: u8,
    last_ale: Level,
    last_rd: Level,
    last_wr: Level,
    cycles: u64,
}

impl I8085Target {
    pub fn new(memory: SharedMemory) -> Self {
        Self {
            memory,
            address_high: gpios(&ADDRESS_HIGH),
            address_data: gpios(&ADDRESS_DATA),
            latched_low: 0,
            last_ale: Level::Low,
            last_rd: Level::High,
            last_wr: Level::High,
            cycles: 0,
        }
    }
}

impl Device for I8085Target {
    fn update(&mut self, now_us: u64, pins: &mut PinBank) {
        self.cycles += 1;
        pins.drive(gpio(GND), Some(Level::Low));
        pins.drive(gpio(VCC), Some(Level::High));
        pins.drive(gpio(RESIN), Some(Level::High));
        pins.drive(gpio(HOLD), Some(Level::Low));
        pins.drive(gpio(X1), Some(Level::from_bool(self.cycles & 1 == 1)));

        let mut memory = self.memory.borrow_mut();
        let trap = memory.interrupt_active(Interrupt::Nmi, now_us);
        let intr = memory.interrupt_active(Interrupt::Irq, now_us);
        pins.drive(gpio(TRAP), Some(Level::from_bool(trap)));
        pins.drive(gpio(INTR), Some(Level::from_bool(intr)));

        let ale = pins.level(gpio(ALE));
        if self.last_ale.is_high() && ale.is_low() {
            self.latched_low = pins.read_value(&self.address_data) as u8;
        }
        self.last_ale = ale;

        let space = if pins.level(gpio(IO_M)).is_high() {
            Space::Io
        } else {
            Space::Memory
        };
        let address = match space {
            Space::Io => u16::from(self.latched_low),
            Space::Memory => (pins.read_value(&self.address_high) << 8) | u16::from(self.latched_low),
        };

        let in_cycle = pins.level(gpio(S0)).is_high() || pins.level(gpio(S1)).is_high();
        let held = in_cycle && memory.held(address, now_us);
        pins.drive(gpio(READY), Some(Level::from_bool(!held)));

        let rd = pins.level(gpio(RD));
        if rd.is_low() {
            let value = memory.read(space, address);
            if self.last_rd.is_high() {
                memory.record_read(space, address, value.unwrap_or(0xFF));
            }
            pins.drive_value(&self.address_data, value.map(u16::from));
        } else {
            pins.drive_value(&self.address_data, None);
        }

        let wr = pins.level(gpio(WR));
        if self.last_wr.is_low() && wr.is_high() {
            let value = pins.read_value(&self.address_data) as u8;
            memory.write(space, address, value);
        }

        self.last_rd = rd;
        self.last_wr = wr;
    }
}
