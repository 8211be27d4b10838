use incircuit_common::Level;
use incircuit_hal::sim::{Device, PinBank};

use super::{gpio, gpios, SharedMemory, Space};
use crate::m6502::{
    ADDRESS, CLK0I, CLK1O, CLK2O, DATA, GND1, GND2, IRQ, NMI, R_W, RDY, RES, VCC,
};
use crate::Interrupt;

/// Board side of a 6502 socket. A cycle is in progress while the tester has
/// CLK1o low and CLK2o high; reads are answered for the whole phase and
/// writes land when phase 2 ends.
pub struct M6502Target {
    memory: SharedMemory,
    address: Vec<u8>,
    data: Vec<u8>,
    in_cycle: bool,
    cycles: u64,
}

impl M6502Target {
    pub fn new(memory: SharedMemory) -> Self {
        Self {
            memory,
            address: gpios(&ADDRESS),
            data: gpios(&DATA),
            in_cycle: false,
            cycles: 0,
        }
    }
}

impl Device for M6502Target {
    fn update(&mut self, now_us: u64, pins: &mut PinBank) {
        self.cycles += 1;
        pins.drive(gpio(GND1), Some(Level::Low));
        pins.drive(gpio(GND2), Some(Level::Low));
        pins.drive(gpio(VCC), Some(Level::High));
        pins.drive(gpio(RES), Some(Level::High));
        pins.drive(gpio(CLK0I), Some(Level::from_bool(self.cycles & 1 == 1)));

        let mut memory = self.memory.borrow_mut();
        let nmi = memory.interrupt_active(Interrupt::Nmi, now_us);
        let irq = memory.interrupt_active(Interrupt::Irq, now_us);
        pins.drive(gpio(NMI), Some(Level::from_bool(!nmi)));
        pins.drive(gpio(IRQ), Some(Level::from_bool(!irq)));

        let in_cycle = pins.level(gpio(CLK1O)).is_low() && pins.level(gpio(CLK2O)).is_high();
        let address = pins.read_value(&self.address);
        let read = pins.level(gpio(R_W)).is_high();

        let held = in_cycle && memory.held(address, now_us);
        pins.drive(gpio(RDY), Some(Level::from_bool(!held)));

        if in_cycle && read {
            let value = memory.read(Space::Memory, address);
            if !self.in_cycle {
                memory.record_read(Space::Memory, address, value.unwrap_or(0xFF));
            }
            pins.drive_value(&self.data, value.map(u16::from));
        } else {
            pins.drive_value(&self.data, None);
        }

        if self.in_cycle && !in_cycle && !read {
            let value = pins.read_value(&self.data) as u8;
            memory.write(Space::Memory, address, value);
        }
        self.in_cycle = in_cycle;
    }
}
