//! Simulated test header.
//!
//! [`SimBoard`] stands in for the GPIO port: it keeps the tester's latch and
//! direction per GPIO, lets [`Device`] models drive the target side, and runs
//! a deterministic microsecond clock that advances on every pin operation.

use std::cell::RefCell;
use std::rc::Rc;

use incircuit_common::{Level, PinMode};
use typed_builder::TypedBuilder;

use crate::Board;

mod pins;

pub use pins::PinBank;

#[derive(TypedBuilder, Clone, Debug)]
pub struct SimConfig {
    /// Simulated time that passes on every pin access.
    #[builder(default = 1)]
    pub tick_us: u64,
    #[builder(default = 0)]
    pub start_us: u64,
}

/// Target side of the header: anything that reacts to the tester's pins.
///
/// Called after every tester write or direction change and before every
/// sample, so a model sees each edge the tester produces.
pub trait Device {
    fn update(&mut self, now_us: u64, pins: &mut PinBank);
}

struct SimState {
    pins: PinBank,
    devices: Vec<Box<dyn Device>>,
    now_us: u64,
    tick_us: u64,
    interrupts_enabled: bool,
    critical_sections: u32,
    mode_changes: u64,
}

impl SimState {
    fn settle(&mut self) {
        let SimState {
            pins,
            devices,
            now_us,
            ..
        } = self;
        for device in devices.iter_mut() {
            device.update(*now_us, pins);
        }
    }

    fn tick(&mut self) {
        self.now_us += self.tick_us;
        self.settle();
    }
}

/// Cloneable handle; clones share the same header state.
#[derive(Clone)]
pub struct SimBoard {
    state: Rc<RefCell<SimState>>,
}

impl SimBoard {
    pub fn new(config: SimConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState {
                pins: PinBank::new(),
                devices: Vec::new(),
                now_us: config.start_us,
                tick_us: config.tick_us,
                interrupts_enabled: true,
                critical_sections: 0,
                mode_changes: 0,
            })),
        }
    }

    pub fn attach(&self, device: impl Device + 'static) {
        let mut state = self.state.borrow_mut();
        state.devices.push(Box::new(device));
        log::debug!("sim: {} device(s) on the header", state.devices.len());
        state.settle();
    }

    /// Resolved level of a GPIO without advancing time.
    pub fn level(&self, gpio: u8) -> Level {
        let mut state = self.state.borrow_mut();
        state.settle();
        state.pins.level(gpio)
    }

    pub fn mode(&self, gpio: u8) -> PinMode {
        self.state.borrow().pins.mode(gpio)
    }

    pub fn now_us(&self) -> u64 {
        self.state.borrow().now_us
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.state.borrow().interrupts_enabled
    }

    /// Number of times a critical section was entered.
    pub fn critical_sections(&self) -> u32 {
        self.state.borrow().critical_sections
    }

    pub fn mode_changes(&self) -> u64 {
        self.state.borrow().mode_changes
    }
}

impl Board for SimBoard {
    fn pin_mode(&mut self, gpio: u8, mode: PinMode) {
        let mut state = self.state.borrow_mut();
        state.pins.set_mode(gpio, mode);
        state.mode_changes += 1;
        state.tick();
    }

    fn digital_write(&mut self, gpio: u8, level: Level) {
        let mut state = self.state.borrow_mut();
        state.pins.set_latch(gpio, level);
        state.tick();
    }

    fn digital_read(&mut self, gpio: u8) -> Level {
        let mut state = self.state.borrow_mut();
        state.tick();
        state.pins.level(gpio)
    }

    fn no_interrupts(&mut self) {
        let mut state = self.state.borrow_mut();
        state.interrupts_enabled = false;
        state.critical_sections += 1;
    }

    fn interrupts(&mut self) {
        self.state.borrow_mut().interrupts_enabled = true;
    }

    fn millis(&mut self) -> u32 {
        (self.state.borrow().now_us / 1000) as u32
    }

    fn delay_ms(&mut self, ms: u32) {
        let mut state = self.state.borrow_mut();
        state.now_us += u64::from(ms) * 1000;
        state.settle();
    }
}
