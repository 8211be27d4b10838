use incircuit_common::{Connection, Level};
use incircuit_hal::sim::{Device, PinBank};

use super::{gpio, gpios, SharedMemory, Space};
use crate::z80::{
    ADDRESS, BUSREQ, CLK, DATA, GND, INT, IORQ, MREQ, NMI, RD, RESET, VCC, WAIT, WR,
};
use crate::Interrupt;

/// Board side of a Z80 socket: decodes `_MREQ`/`_IORQ` with `_RD`/`_WR`,
/// drives `_WAIT` from the memory's hold windows and runs a free CLK.
pub struct Z80Target {
    memory: SharedMemory,
    address: Vec<u8>,
    data: Vec<u8>,
    last_rd: Level,
    last_wr: Level,
    cycles: u64,
}

impl Z80Target {
    pub fn new(memory: SharedMemory) -> Self {
        Self {
            memory,
            address: gpios(&ADDRESS),
            data: gpios(&DATA),
            last_rd: Level::High,
            last_wr: Level::High,
            cycles: 0,
        }
    }
}

fn low(pins: &PinBank, connection: Connection) -> bool {
    pins.level(gpio(connection)).is_low()
}

impl Device for Z80Target {
    fn update(&mut self, now_us: u64, pins: &mut PinBank) {
        self.cycles += 1;
        pins.drive(gpio(GND), Some(Level::Low));
        pins.drive(gpio(VCC), Some(Level::High));
        pins.drive(gpio(RESET), Some(Level::High));
        pins.drive(gpio(BUSREQ), Some(Level::High));
        pins.drive(gpio(CLK), Some(Level::from_bool(self.cycles & 1 == 1)));

        let mut memory = self.memory.borrow_mut();
        let nmi = memory.interrupt_active(Interrupt::Nmi, now_us);
        let int = memory.interrupt_active(Interrupt::Irq, now_us);
        pins.drive(gpio(NMI), Some(Level::from_bool(!nmi)));
        pins.drive(gpio(INT), Some(Level::from_bool(!int)));

        let space = if low(pins, IORQ) {
            Some(Space::Io)
        } else if low(pins, MREQ) {
            Some(Space::Memory)
        } else {
            None
        };
        let address = pins.read_value(&self.address);
        let rd = pins.level(gpio(RD));
        let wr = pins.level(gpio(WR));

        let held = space == Some(Space::Memory) && memory.held(address, now_us);
        pins.drive(gpio(WAIT), Some(Level::from_bool(!held)));

        match space {
            Some(space) if rd.is_low() => {
                let value = memory.read(space, address);
                if self.last_rd.is_high() {
                    memory.record_read(space, address, value.unwrap_or(0xFF));
                }
                pins.drive_value(&self.data, value.map(u16::from));
            }
            _ => pins.drive_value(&self.data, None),
        }
        if let Some(space) = space {
            if self.last_wr.is_low() && wr.is_high() {
                let value = pins.read_value(&self.data) as u8;
                memory.write(space, address, value);
            }
        }

        self.last_rd = rd;
        self.last_wr = wr;
    }
}
