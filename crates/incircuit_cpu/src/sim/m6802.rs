use incircuit_common::Level;
use incircuit_hal::sim::{Device, PinBank};

use super::{gpio, gpios, SharedMemory, Space};
use crate::m6802::{ADDRESS, DATA, E, GND1, GND2, HALT, IRQ, MR, NMI, RESET, R_W, VCC1, VCC2};
use crate::Interrupt;

/// Board side of a 6802 socket: memory and peripherals answer while E is
/// high and take write data on its falling edge.
pub struct M6802Target {
    memory: SharedMemory,
    address: Vec<u8>,
    data: Vec<u8>,
    last_e: Level,
}

impl M6802Target {
    pub fn new(memory: SharedMemory) -> Self {
        Self {
            memory,
            address: gpios(&ADDRESS),
            data: gpios(&DATA),
            last_e: Level::Low,
        }
    }
}

impl Device for M6802Target {
    fn update(&mut self, now_us: u64, pins: &mut PinBank) {
        for ground in [GND1, GND2] {
            pins.drive(gpio(ground), Some(Level::Low));
        }
        for pulled_up in [VCC1, VCC2, RESET, HALT, MR] {
            pins.drive(gpio(pulled_up), Some(Level::High));
        }

        let mut memory = self.memory.borrow_mut();
        let nmi = memory.interrupt_active(Interrupt::Nmi, now_us);
        let irq = memory.interrupt_active(Interrupt::Irq, now_us);
        pins.drive(gpio(NMI), Some(Level::from_bool(!nmi)));
        pins.drive(gpio(IRQ), Some(Level::from_bool(!irq)));

        let address = pins.read_value(&self.address);
        let read = pins.level(gpio(R_W)).is_high();
        let e = pins.level(gpio(E));

        if e.is_high() && read {
            let value = memory.read(Space::Memory, address);
            if self.last_e.is_low() {
                memory.record_read(Space::Memory, address, value.unwrap_or(0xFF));
            }
            pins.drive_value(&self.data, value.map(u16::from));
        } else {
            pins.drive_value(&self.data, None);
        }

        if self.last_e.is_high() && e.is_low() && !read {
            let value = pins.read_value(&self.data) as u8;
            memory.write(Space::Memory, address, value);
        }
        self.last_e = e;
    }
}
