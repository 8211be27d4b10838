//! Register models of the peripheral chips the sound boards put between the
//! CPU socket and the sound generators.

use std::cell::RefCell;
use std::rc::Rc;

use super::Mapped;

pub type SharedAy = Rc<RefCell<Ay38910Chip>>;

/// Bits implemented by each AY-3-8910 register; the rest read back as 0.
const AY_REGISTER_MASKS: [u8; 16] = [
    0xFF, 0x0F, 0xFF, 0x0F, 0xFF, 0x0F, 0x1F, 0xFF, 0x1F, 0x1F, 0x1F, 0xFF, 0xFF, 0x0F, 0xFF,
    0xFF,
];

/// BC1/BDIR bus function of an AY-3-8910, as two bits with BC1 in bit 0.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
enum BusFunction {
    #[default]
    Inactive,
    Read,
    Write,
    Latch,
}

impl BusFunction {
    fn from_code(code: u8) -> Self {
        match code & 0x03 {
            0x01 => BusFunction::Read,
            0x02 => BusFunction::Write,
            0x03 => BusFunction::Latch,
            _ => BusFunction::Inactive,
        }
    }
}

#[derive(Debug, Default)]
pub struct Ay38910Chip {
    registers: [u8; 16],
    address: u8,
    function: BusFunction,
}

impl Ay38910Chip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedAy {
        Rc::new(RefCell::new(self))
    }

    pub fn register(&self, register: u8) -> u8 {
        self.registers[usize::from(register & 0x0F)]
    }

    /// Address latch. Register numbers above 15 deselect the chip.
    pub fn latch(&mut self, address: u8) {
        self.address = address;
    }

    pub fn write(&mut self, data: u8) {
        if let Some(index) = self.selected() {
            self.registers[index] = data & AY_REGISTER_MASKS[index];
        }
    }

    pub fn read(&self) -> Option<u8> {
        self.selected().map(|index| self.registers[index])
    }

    fn selected(&self) -> Option<usize> {
        (self.address < 16).then_some(usize::from(self.address))
    }

    /// Apply the BC1/BDIR lines with the data bus as the 6821 leaves it.
    fn strobe(&mut self, code: u8, data: u8) {
        self.function = BusFunction::from_code(code);
        match self.function {
            BusFunction::Latch => self.latch(data),
            BusFunction::Write => self.write(data),
            BusFunction::Read | BusFunction::Inactive => {}
        }
    }

    fn driving(&self) -> Option<u8> {
        match self.function {
            BusFunction::Read => self.read(),
            _ => None,
        }
    }
}

/// Direct IO address latch port.
pub struct AyLatchPort(SharedAy);

impl AyLatchPort {
    pub fn new(chip: SharedAy) -> Self {
        Self(chip)
    }
}

impl Mapped for AyLatchPort {
    fn read(&self, _offset: u16) -> Option<u8> {
        None
    }

    fn write(&mut self, _offset: u16, data: u8) {
        self.0.borrow_mut().latch(data);
    }
}

/// Direct IO data port, read and write.
pub struct AyDataPort(SharedAy);

impl AyDataPort {
    pub fn new(chip: SharedAy) -> Self {
        Self(chip)
    }
}

impl Mapped for AyDataPort {
    fn read(&self, _offset: u16) -> Option<u8> {
        self.0.borrow().read()
    }

    fn write(&mut self, _offset: u16, data: u8) {
        self.0.borrow_mut().write(data);
    }
}

const CR_SELECT_PR: u8 = 0x04;

/// 6821 PIA register file. Port A is the data bus of any attached AY chips
/// and port B carries their BC1/BDIR pairs.
#[derive(Default)]
pub struct Pia6821Chip {
    ora: u8,
    ddra: u8,
    cra: u8,
    orb: u8,
    ddrb: u8,
    crb: u8,
    ays: Vec<(u8, SharedAy)>,
}

impl Pia6821Chip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an AY whose BC1 is port B bit `shift` and BDIR bit `shift + 1`.
    pub fn with_ay(mut self, shift: u8, chip: SharedAy) -> Self {
        self.ays.push((shift, chip));
        self
    }

    /// Port A pins: outputs from ORA, inputs from whichever AY is driving,
    /// otherwise the pull-ups.
    fn port_a(&self) -> u8 {
        let driven = self
            .ays
            .iter()
            .find_map(|(_, chip)| chip.borrow().driving())
            .unwrap_or(0xFF);
        (self.ora & self.ddra) | (driven & !self.ddra)
    }

    /// Port B lines only reach the AYs when configured as outputs.
    fn update_port_b(&mut self) {
        let lines = self.orb & self.ddrb;
        let data = self.port_a();
        for (shift, chip) in &self.ays {
            chip.borrow_mut().strobe(lines >> shift, data);
        }
    }
}

impl Mapped for Pia6821Chip {
    fn read(&self, offset: u16) -> Option<u8> {
        let value = match offset & 0x03 {
            0 if self.cra & CR_SELECT_PR != 0 => self.port_a(),
            0 => self.ddra,
            1 => self.cra,
            2 if self.crb & CR_SELECT_PR != 0 => (self.orb & self.ddrb) | !self.ddrb,
            2 => self.ddrb,
            _ => self.crb,
        };
        Some(value)
    }

    fn write(&mut self, offset: u16, data: u8) {
        match offset & 0x03 {
            0 if self.cra & CR_SELECT_PR != 0 => self.ora = data,
            0 => self.ddra = data,
            1 => self.cra = data,
            2 => {
                if self.crb & CR_SELECT_PR != 0 {
                    self.orb = data;
                } else {
                    self.ddrb = data;
                }
                self.update_port_b();
            }
            _ => self.crb = data,
        }
    }
}
