use incircuit_common::Level;
use incircuit_hal::sim::{Device, PinBank};

use super::{gpio, gpios, SharedMemory, Space};
use crate::i8080::{
    StatusWord, ADDRESS, DATA, DBIN, GND, HOLD, INT, READY, RESET, SYNC, VCC, WR,
};
use crate::Interrupt;

/// Board side of an 8080 socket with a status latch: the byte on the data
/// bus while SYNC is high selects memory or IO for the strobes that follow.
pub struct I8080Target {
    memory: SharedMemory,
    address: Vec<u8>,
    data: Vec<u8>,
    status: StatusWord,
    last_dbin: Level,
    last_wr: Level,
}

impl I8080Target {
    pub fn new(memory: SharedMemory) -> Self {
        Self {
            memory,
            address: gpios(&ADDRESS),
            data: gpios(&DATA),
            status: StatusWord::empty(),
            last_dbin: Level::Low,
            last_wr: Level::High,
        }
    }

    fn space(&self) -> Space {
        if self.status.intersects(StatusWord::INP | StatusWord::OUTP) {
            Space::Io
        } else {
            Space::Memory
        }
    }
}

impl Device for I8080Target {
    fn update(&mut self, now_us: u64, pins: &mut PinBank) {
        pins.drive(gpio(GND), Some(Level::Low));
        pins.drive(gpio(VCC), Some(Level::High));
        pins.drive(gpio(RESET), Some(Level::Low));
        pins.drive(gpio(HOLD), Some(Level::Low));
        pins.drive(gpio(READY), Some(Level::High));

        let mut memory = self.memory.borrow_mut();
        let int = memory.interrupt_active(Interrupt::Irq, now_us);
        pins.drive(gpio(INT), Some(Level::from_bool(int)));

        if pins.level(gpio(SYNC)).is_high() {
            self.status = StatusWord::from_bits_truncate(pins.read_value(&self.data) as u8);
        }

        let space = self.space();
        let mut address = pins.read_value(&self.address);
        if space == Space::Io {
            address &= 0xFF;
        }

        let dbin = pins.level(gpio(DBIN));
        if dbin.is_high() && self.status.contains(StatusWord::RD) {
            let value = memory.read(space, address);
            if self.last_dbin.is_low() {
                memory.record_read(space, address, value.unwrap_or(0xFF));
            }
            pins.drive_value(&self.data, value.map(u16::from));
        } else {
            pins.drive_value(&self.data, None);
        }

        let wr = pins.level(gpio(WR));
        if self.last_wr.is_low() && wr.is_high() {
            let value = pins.read_value(&self.data) as u8;
            memory.write(space, address, value);
        }

        self.last_dbin = dbin;
        self.last_wr = wr;
    }
}
