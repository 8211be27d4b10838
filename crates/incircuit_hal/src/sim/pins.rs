use incircuit_common::{Level, PinMode};

const GPIO_COUNT: usize = 256;

/// Electrical state of every GPIO on the simulated header.
///
/// A pin the tester drives as an output reads its latch. Otherwise it reads
/// whatever a device drives onto it, or floats: high with the pull-up
/// enabled, low without.
pub struct PinBank {
    latch: [Level; GPIO_COUNT],
    mode: [PinMode; GPIO_COUNT],
    drive: [Option<Level>; GPIO_COUNT],
}

impl PinBank {
    pub(super) fn new() -> Self {
        Self {
            latch: [Level::Low; GPIO_COUNT],
            mode: [PinMode::Input; GPIO_COUNT],
            drive: [None; GPIO_COUNT],
        }
    }

    pub(super) fn set_mode(&mut self, gpio: u8, mode: PinMode) {
        self.mode[usize::from(gpio)] = mode;
    }

    pub(super) fn set_latch(&mut self, gpio: u8, level: Level) {
        self.latch[usize::from(gpio)] = level;
    }

    pub fn mode(&self, gpio: u8) -> PinMode {
        self.mode[usize::from(gpio)]
    }

    pub fn tester_drives(&self, gpio: u8) -> bool {
        self.mode(gpio) == PinMode::Output
    }

    pub fn level(&self, gpio: u8) -> Level {
        let index = usize::from(gpio);
        match self.mode[index] {
            PinMode::Output => self.latch[index],
            PinMode::InputPullup => self.drive[index].unwrap_or(Level::High),
            PinMode::Input => self.drive[index].unwrap_or(Level::Low),
        }
    }

    /// Drive a pin from the target side, `None` releases it.
    pub fn drive(&mut self, gpio: u8, level: Option<Level>) {
        self.drive[usize::from(gpio)] = level;
    }

    /// Value seen on a group of pins, bit `i` from `gpios[i]`.
    pub fn read_value(&self, gpios: &[u8]) -> u16 {
        gpios.iter().enumerate().fold(0, |value, (bit, gpio)| {
            if self.level(*gpio).is_high() {
                value | (1 << bit)
            } else {
                value
            }
        })
    }

    pub fn drive_value(&mut self, gpios: &[u8], value: Option<u16>) {
        for (bit, gpio) in gpios.iter().enumerate() {
            let level = value.map(|v| Level::from_bool(v & (1 << bit) != 0));
            self.drive(*gpio, level);
        }
    }
}
