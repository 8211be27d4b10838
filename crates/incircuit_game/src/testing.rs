//! Fakes shared by the engine tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use incircuit_common::{Error, Result};
use incircuit_cpu::{Cpu, Interrupt};

/// A `Cpu` over a flat map of addresses. Unwritten locations read `fill`.
pub struct MemoryCpu {
    pub memory: HashMap<u32, u16>,
    pub fill: u16,
    /// Address bits the board decodes; the rest alias.
    pub decode: u32,
    /// Data bits stuck low on read.
    pub stuck_low: u16,
    pub read_only: Vec<(u32, u32)>,
    pub log: Vec<(u32, u16, bool)>,
    pub logging: bool,
    pub delays: Vec<u32>,
    /// Results handed out by `wait_for_interrupt`, in order; `Timeout` once
    /// exhausted.
    pub interrupts: VecDeque<Result<()>>,
    pub waits: Vec<(Interrupt, bool, u32)>,
    pub vector: u16,
    pub idles: u32,
    /// Bytes per bus access: 1 for the 8-bit families, 2 for a 16-bit bus.
    pub width: u8,
}

impl MemoryCpu {
    pub fn new() -> Self {
        Self {
            memory: HashMap::new(),
            fill: 0x00,
            decode: 0xFF_FFFF,
            stuck_low: 0,
            read_only: Vec::new(),
            log: Vec::new(),
            logging: false,
            delays: Vec::new(),
            interrupts: VecDeque::new(),
            waits: Vec::new(),
            vector: 0,
            idles: 0,
            width: 1,
        }
    }

    pub fn wide(mut self) -> Self {
        self.width = 2;
        self
    }

    pub fn with_rom(mut self, start: u32, bytes: &[u8]) -> Self {
        for (offset, &byte) in bytes.iter().enumerate() {
            self.memory.insert(start + offset as u32, u16::from(byte));
        }
        self.read_only
            .push((start, start + bytes.len().saturating_sub(1) as u32));
        self
    }

    pub fn logging(mut self) -> Self {
        self.logging = true;
        self
    }

    pub fn peek(&self, address: u32) -> u16 {
        self.memory
            .get(&(address & self.decode))
            .copied()
            .unwrap_or(self.fill)
    }

    pub fn writes(&self) -> Vec<(u32, u16)> {
        self.log
            .iter()
            .filter(|(_, _, write)| *write)
            .map(|(address, data, _)| (*address, *data))
            .collect()
    }
}

impl Cpu for MemoryCpu {
    fn idle(&mut self) -> Result<()> {
        self.idles += 1;
        Ok(())
    }

    fn check(&mut self) -> Result<()> {
        Ok(())
    }

    fn data_bus_width(&self, _address: u32) -> u8 {
        self.width
    }

    fn data_access_width(&self, _address: u32) -> u8 {
        self.width
    }

    fn memory_read(&mut self, address: u32) -> Result<u16> {
        let data = self.peek(address) & !self.stuck_low;
        if self.logging {
            self.log.push((address, data, false));
        }
        Ok(data)
    }

    fn memory_write(&mut self, address: u32, data: u16) -> Result<()> {
        if self.logging {
            self.log.push((address, data, true));
        }
        let decoded = address & self.decode;
        if !self
            .read_only
            .iter()
            .any(|(start, end)| (*start..=*end).contains(&decoded))
        {
            let mask = if self.width > 1 { 0xFFFF } else { 0x00FF };
            self.memory.insert(decoded, data & mask);
        }
        Ok(())
    }

    fn wait_for_interrupt(&mut self, interrupt: Interrupt, active: bool, timeout_ms: u32) -> Result<()> {
        self.waits.push((interrupt, active, timeout_ms));
        self.interrupts.pop_front().unwrap_or(Err(Error::Timeout))
    }

    fn acknowledge_interrupt(&mut self) -> Result<u16> {
        Ok(self.vector)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }
}

/// The fixed 1K image the ROM tests checksum: a scrambled counter whose tail
/// is tuned to land on a known CRC.
pub fn rom_fixture() -> Vec<u8> {
    let mut bytes: Vec<u8> = (0..0x3FCu32)
        .map(|i| ((i * 7 + 3) ^ (i >> 3)) as u8)
        .collect();
    bytes.extend_from_slice(&[0xE7, 0x2B, 0xDC, 0xDD]);
    bytes
}

pub const FIXTURE_CRC: u32 = 0xB0EC_246C;
pub const FIXTURE_DATA2N: [u8; 10] = [0x0A, 0x11, 0x1F, 0x3A, 0x71, 0xE7, 0xCB, 0x93, 0x23, 0x43];

/// Handle to a [`MemoryCpu`] that can be boxed into an engine while the
/// test keeps looking at it.
#[derive(Clone)]
pub struct SharedCpu(pub Rc<RefCell<MemoryCpu>>);

impl SharedCpu {
    pub fn new(cpu: MemoryCpu) -> Self {
        Self(Rc::new(RefCell::new(cpu)))
    }
}

impl Cpu for SharedCpu {
    fn idle(&mut self) -> Result<()> {
        self.0.borrow_mut().idle()
    }

    fn check(&mut self) -> Result<()> {
        self.0.borrow_mut().check()
    }

    fn data_bus_width(&self, address: u32) -> u8 {
        self.0.borrow().data_bus_width(address)
    }

    fn data_access_width(&self, address: u32) -> u8 {
        self.0.borrow().data_access_width(address)
    }

    fn memory_read(&mut self, address: u32) -> Result<u16> {
        self.0.borrow_mut().memory_read(address)
    }

    fn memory_write(&mut self, address: u32, data: u16) -> Result<()> {
        self.0.borrow_mut().memory_write(address, data)
    }

    fn wait_for_interrupt(&mut self, interrupt: Interrupt, active: bool, timeout_ms: u32) -> Result<()> {
        self.0
            .borrow_mut()
            .wait_for_interrupt(interrupt, active, timeout_ms)
    }

    fn acknowledge_interrupt(&mut self) -> Result<u16> {
        self.0.borrow_mut().acknowledge_interrupt()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().delay_ms(ms)
    }
}
