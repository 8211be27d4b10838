use std::cell::RefCell;
use std::ops::RangeInclusive;
use std::rc::Rc;

use crate::Interrupt;

pub type SharedMemory = Rc<RefCell<SimMemory>>;

const SPACE_SIZE: usize = 0x1_0000;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Space {
    Memory,
    Io,
}

/// One completed bus transaction as seen by the board.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Access {
    pub space: Space,
    pub address: u16,
    pub data: u8,
    pub write: bool,
}

#[derive(Copy, Clone, Debug)]
pub enum InterruptModel {
    /// Active for `width_us` at the start of every `period_us`.
    Pulsed { period_us: u64, width_us: u64 },
    /// A frame flip-flop: set at each `period_us` boundary while enabled by
    /// bit 0 of the byte written to `mask_address`, cleared when that bit is
    /// written as 0.
    Latched { mask_address: u16, period_us: u64 },
    /// Fixed level, for stuck-line scenarios.
    Stuck(bool),
}

struct InterruptLine {
    line: Interrupt,
    model: InterruptModel,
    enabled: bool,
    latched: bool,
    frame: u64,
}

impl InterruptLine {
    fn active(&mut self, now_us: u64) -> bool {
        match self.model {
            InterruptModel::Pulsed {
                period_us,
                width_us,
            } => now_us % period_us.max(1) < width_us,
            InterruptModel::Latched { period_us, .. } => {
                let frame = now_us / period_us.max(1);
                if frame != self.frame {
                    self.frame = frame;
                    if self.enabled {
                        self.latched = true;
                    }
                }
                self.latched
            }
            InterruptModel::Stuck(level) => level,
        }
    }

    fn on_write(&mut self, address: u16, data: u8) {
        if let InterruptModel::Latched { mask_address, .. } = self.model {
            if address == mask_address {
                self.enabled = data & 0x01 != 0;
                if !self.enabled {
                    self.latched = false;
                }
            }
        }
    }
}

/// A register-level peripheral decoded into part of a space.
pub trait Mapped {
    /// `None` leaves the data bus floating.
    fn read(&self, offset: u16) -> Option<u8>;
    fn write(&mut self, offset: u16, data: u8);
}

struct Mapping {
    space: Space,
    range: RangeInclusive<u16>,
    device: Box<dyn Mapped>,
}

/// Window during which accesses to `range` are held off: the board asserts
/// its wait/not-ready line except for the first `open_us` of every
/// `period_us` (the blanking interval).
struct HoldWindow {
    range: RangeInclusive<u16>,
    period_us: u64,
    open_us: u64,
}

/// Board-side memory and IO map behind a simulated CPU socket.
pub struct SimMemory {
    memory: Vec<u8>,
    io: Vec<u8>,
    read_only: Vec<RangeInclusive<u16>>,
    open_bus: Vec<RangeInclusive<u16>>,
    faults: Vec<(u16, u8)>,
    windows: Vec<HoldWindow>,
    interrupts: Vec<InterruptLine>,
    mapped: Vec<Mapping>,
    log: Option<Vec<Access>>,
}

impl Default for SimMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl SimMemory {
    pub fn new() -> Self {
        Self {
            memory: vec![0; SPACE_SIZE],
            io: vec![0; SPACE_SIZE],
            read_only: Vec::new(),
            open_bus: Vec::new(),
            faults: Vec::new(),
            windows: Vec::new(),
            interrupts: Vec::new(),
            mapped: Vec::new(),
            log: None,
        }
    }

    pub fn shared(self) -> SharedMemory {
        Rc::new(RefCell::new(self))
    }

    pub fn load(mut self, base: u16, bytes: &[u8]) -> Self {
        let start = usize::from(base);
        let end = (start + bytes.len()).min(SPACE_SIZE);
        self.memory[start..end].copy_from_slice(&bytes[..end - start]);
        self
    }

    /// Load a ROM image and make its range read only.
    pub fn rom(self, base: u16, bytes: &[u8]) -> Self {
        let last = base.saturating_add(bytes.len().saturating_sub(1) as u16);
        self.load(base, bytes).read_only(base..=last)
    }

    pub fn read_only(mut self, range: RangeInclusive<u16>) -> Self {
        self.read_only.push(range);
        self
    }

    /// Range that accepts writes but never drives the data bus (write-only
    /// latches, unpopulated sockets).
    pub fn open_bus(mut self, range: RangeInclusive<u16>) -> Self {
        self.open_bus.push(range);
        self
    }

    /// XOR `mask` into every read of `address`, as a stuck or flipped data bit.
    pub fn fault(mut self, address: u16, mask: u8) -> Self {
        self.faults.push((address, mask));
        self
    }

    pub fn hold_window(mut self, range: RangeInclusive<u16>, period_us: u64, open_us: u64) -> Self {
        self.windows.push(HoldWindow {
            range,
            period_us,
            open_us,
        });
        self
    }

    pub fn interrupt(mut self, line: Interrupt, model: InterruptModel) -> Self {
        self.interrupts.push(InterruptLine {
            line,
            model,
            enabled: false,
            latched: false,
            frame: 0,
        });
        self
    }

    pub fn map(
        mut self,
        space: Space,
        range: RangeInclusive<u16>,
        device: impl Mapped + 'static,
    ) -> Self {
        self.mapped.push(Mapping {
            space,
            range,
            device: Box::new(device),
        });
        self
    }

    pub fn recording(mut self) -> Self {
        self.log = Some(Vec::new());
        self
    }

    /// Data the board drives for a read, `None` when nothing responds.
    pub fn read(&self, space: Space, address: u16) -> Option<u8> {
        if let Some(mapping) = self
            .mapped
            .iter()
            .find(|m| m.space == space && m.range.contains(&address))
        {
            return mapping.device.read(address - mapping.range.start());
        }
        match space {
            Space::Io => Some(self.io[usize::from(address)]),
            Space::Memory => {
                if self.open_bus.iter().any(|r| r.contains(&address)) {
                    return None;
                }
                let fault = self
                    .faults
                    .iter()
                    .filter(|(a, _)| *a == address)
                    .fold(0, |acc, (_, mask)| acc ^ mask);
                Some(self.memory[usize::from(address)] ^ fault)
            }
        }
    }

    pub fn write(&mut self, space: Space, address: u16, data: u8) {
        if let Some(mapping) = self
            .mapped
            .iter_mut()
            .find(|m| m.space == space && m.range.contains(&address))
        {
            let offset = address - mapping.range.start();
            mapping.device.write(offset, data);
            self.record(Access {
                space,
                address,
                data,
                write: true,
            });
            return;
        }
        match space {
            Space::Io => self.io[usize::from(address)] = data,
            Space::Memory => {
                for line in &mut self.interrupts {
                    line.on_write(address, data);
                }
                if !self.read_only.iter().any(|r| r.contains(&address)) {
                    self.memory[usize::from(address)] = data;
                }
            }
        }
        self.record(Access {
            space,
            address,
            data,
            write: true,
        });
    }

    /// Note a read that the target completed.
    pub fn record_read(&mut self, space: Space, address: u16, data: u8) {
        self.record(Access {
            space,
            address,
            data,
            write: false,
        });
    }

    fn record(&mut self, access: Access) {
        if let Some(log) = self.log.as_mut() {
            log.push(access);
        }
    }

    /// Whether an access to `address` is being held off right now.
    pub fn held(&self, address: u16, now_us: u64) -> bool {
        self.windows
            .iter()
            .any(|w| w.range.contains(&address) && now_us % w.period_us.max(1) >= w.open_us)
    }

    pub fn interrupt_active(&mut self, line: Interrupt, now_us: u64) -> bool {
        self.interrupts
            .iter_mut()
            .filter(|l| l.line == line)
            .fold(false, |active, l| l.active(now_us) || active)
    }

    pub fn peek(&self, space: Space, address: u16) -> u8 {
        match space {
            Space::Memory => self.memory[usize::from(address)],
            Space::Io => self.io[usize::from(address)],
        }
    }

    pub fn poke(&mut self, space: Space, address: u16, data: u8) {
        match space {
            Space::Memory => self.memory[usize::from(address)] = data,
            Space::Io => self.io[usize::from(address)] = data,
        }
    }

    pub fn accesses(&self) -> &[Access] {
        self.log.as_deref().unwrap_or(&[])
    }

    pub fn clear_log(&mut self) {
        if let Some(log) = self.log.as_mut() {
            log.clear();
        }
    }
}
