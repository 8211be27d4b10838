//! AY-3-8910 programmable sound generator, driven through any [`Cpu`].
//!
//! The chip is reached through three bus addresses: one that latches the
//! register number, one that writes the latched register and one that reads
//! it back. On direct IO boards the last two are usually the same port; behind
//! a 6821 they are the BC1/BDIR codes placed on port B.

use incircuit_common::{check_value, Result};

use crate::Cpu;

pub const R0_CHA_FINE_TONE: u8 = 0x0;
pub const R1_CHA_COARSE_TONE: u8 = 0x1;
pub const R2_CHB_FINE_TONE: u8 = 0x2;
pub const R3_CHB_COARSE_TONE: u8 = 0x3;
pub const R4_CHC_FINE_TONE: u8 = 0x4;
pub const R5_CHC_COARSE_TONE: u8 = 0x5;
pub const R6_NOISE_PERIOD: u8 = 0x6;
pub const R7_ENABLE: u8 = 0x7;
pub const R10_CHA_AMPLITUDE: u8 = 0x8;
pub const R11_CHB_AMPLITUDE: u8 = 0x9;
pub const R12_CHC_AMPLITUDE: u8 = 0xA;
pub const R13_FINE_ENV_PERIOD: u8 = 0xB;
pub const R14_COARSE_ENV_PERIOD: u8 = 0xC;
pub const R15_ENV_SHAPE: u8 = 0xD;
pub const R16_PORT_A_DATA: u8 = 0xE;
pub const R17_PORT_B_DATA: u8 = 0xF;

const REGISTER_COUNT: u8 = 16;
const CHECK_PASSES: u16 = 250;

const NOISE_PERIOD: u16 = 0x08;
// Full scale (0x0F) is uncomfortably loud through the board amplifier.
const NOISE_AMPLITUDE: u16 = 0x09;
/// R7 with every tone and noise output disabled.
const ALL_DISABLED: u16 = 0x3F;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Channel {
    A,
    B,
    C,
}

impl Channel {
    fn noise_enable_bit(self) -> u16 {
        match self {
            Channel::A => 0x08,
            Channel::B => 0x10,
            Channel::C => 0x20,
        }
    }

    fn amplitude_register(self) -> u8 {
        match self {
            Channel::A => R10_CHA_AMPLITUDE,
            Channel::B => R11_CHB_AMPLITUDE,
            Channel::C => R12_CHC_AMPLITUDE,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct AyPorts {
    pub latch: u32,
    pub write: u32,
    pub read: u32,
}

impl AyPorts {
    /// Separate latch and data ports, data read back from the write port.
    pub const fn direct(latch: u32, data: u32) -> Self {
        Self {
            latch,
            write: data,
            read: data,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Ay38910 {
    ports: AyPorts,
}

impl Ay38910 {
    pub const fn new(ports: AyPorts) -> Self {
        Self { ports }
    }

    pub fn ports(&self) -> AyPorts {
        self.ports
    }

    /// Back to the post-reset state: every register cleared, so all outputs
    /// are enabled at zero amplitude.
    pub fn idle<C: Cpu + ?Sized>(&self, cpu: &mut C) -> Result<()> {
        for register in 0..REGISTER_COUNT {
            self.write(cpu, register, 0x00)?;
        }
        Ok(())
    }

    /// Write then read back the three fine tone registers with a moving
    /// pattern.
    pub fn check<C: Cpu + ?Sized>(&self, cpu: &mut C) -> Result<()> {
        let registers = [R0_CHA_FINE_TONE, R2_CHB_FINE_TONE, R4_CHC_FINE_TONE];
        for pass in 0..CHECK_PASSES {
            for (step, register) in (1u16..).zip(registers) {
                self.write(cpu, register, (pass + step) & 0xFF)?;
            }
            for (step, register) in (1u16..).zip(registers) {
                let received = self.read(cpu, register)?;
                check_value("AY3", u32::from(register), received, (pass + step) & 0xFF)?;
            }
        }
        Ok(())
    }

    /// Noise on one channel only. Noise exercises the board's output filter
    /// better than a pure tone.
    pub fn noise<C: Cpu + ?Sized>(&self, cpu: &mut C, channel: Channel) -> Result<()> {
        log::debug!("AY: noise on channel {:?}", channel);
        self.write(cpu, R6_NOISE_PERIOD, NOISE_PERIOD)?;
        self.write(cpu, R7_ENABLE, ALL_DISABLED ^ channel.noise_enable_bit())?;
        self.write(cpu, channel.amplitude_register(), NOISE_AMPLITUDE)
    }

    pub fn read<C: Cpu + ?Sized>(&self, cpu: &mut C, register: u8) -> Result<u16> {
        cpu.memory_write(self.ports.latch, u16::from(register))?;
        Ok(cpu.memory_read(self.ports.read)? & 0xFF)
    }

    pub fn write<C: Cpu + ?Sized>(&self, cpu: &mut C, register: u8, data: u16) -> Result<()> {
        cpu.memory_write(self.ports.latch, u16::from(register))?;
        cpu.memory_write(self.ports.write, data & 0xFF)
    }
}

#[cfg(test)]
mod tests {
    use incircuit_common::Error;
    use incircuit_hal::sim::{SimBoard, SimConfig};

    use super::*;
    use crate::sim::{
        AyDataPort, AyLatchPort, Ay38910Chip, M6802Target, Pia6821Chip, SimMemory, Space,
        Z80Target,
    };
    use crate::{M6802Cpu, Pia6821Proxy, Z80Cpu};

    const DIRECT: Ay38910 = Ay38910::new(AyPorts::direct(0x1_0040, 0x1_0080));

    fn direct_rig(chip: &crate::sim::SharedAy) -> Z80Cpu<SimBoard> {
        let board = SimBoard::new(SimConfig::builder().build());
        let memory = SimMemory::new()
            .map(Space::Io, 0x40..=0x40, AyLatchPort::new(chip.clone()))
            .map(Space::Io, 0x80..=0x80, AyDataPort::new(chip.clone()))
            .shared();
        board.attach(Z80Target::new(memory));
        let mut cpu = Z80Cpu::new(board);
        cpu.idle().unwrap();
        cpu
    }

    #[test]
    fn direct_io_registers_read_back() {
        let chip = Ay38910Chip::new().shared();
        let mut cpu = direct_rig(&chip);
        DIRECT.check(&mut cpu).unwrap();
        assert_eq!(chip.borrow().register(R4_CHC_FINE_TONE), 252);
    }

    #[test]
    fn idle_clears_and_noise_selects_one_channel() {
        let chip = Ay38910Chip::new().shared();
        let mut cpu = direct_rig(&chip);
        DIRECT.noise(&mut cpu, Channel::B).unwrap();
        assert_eq!(chip.borrow().register(R7_ENABLE), 0x2F);
        assert_eq!(chip.borrow().register(R11_CHB_AMPLITUDE), 0x09);
        assert_eq!(chip.borrow().register(R10_CHA_AMPLITUDE), 0x00);

        DIRECT.idle(&mut cpu).unwrap();
        assert!((0..16).all(|r| chip.borrow().register(r) == 0));
    }

    #[test]
    fn missing_chip_reports_register_and_values() {
        let board = SimBoard::new(SimConfig::builder().build());
        board.attach(Z80Target::new(SimMemory::new().shared()));
        let mut cpu = Z80Cpu::new(board);
        cpu.idle().unwrap();
        // Plain IO latches answer with the last byte written to the port.
        assert_eq!(
            DIRECT.check(&mut cpu),
            Err(Error::Custom("E:AY3 0000 01 03".to_string()))
        );
    }

    #[test]
    fn pia_proxied_chip_uses_port_b_codes() {
        let chip = Ay38910Chip::new().shared();
        let board = SimBoard::new(SimConfig::builder().build());
        let memory = SimMemory::new()
            .map(
                Space::Memory,
                0x400C..=0x400F,
                Pia6821Chip::new().with_ay(0, chip.clone()),
            )
            .shared();
        board.attach(M6802Target::new(memory));
        let mut cpu = M6802Cpu::new(board);
        cpu.idle().unwrap();

        let mut pia = Pia6821Proxy::new(&mut cpu, 0x400C, 0x00);
        pia.idle().unwrap();
        pia.check().unwrap();

        let ay = Ay38910::new(AyPorts {
            latch: 0x03,
            write: 0x02,
            read: 0x01,
        });
        ay.write(&mut pia, R13_FINE_ENV_PERIOD, 0xA5).unwrap();
        assert_eq!(ay.read(&mut pia, R13_FINE_ENV_PERIOD).unwrap(), 0xA5);
        assert_eq!(chip.borrow().register(R13_FINE_ENV_PERIOD), 0xA5);
    }
}
