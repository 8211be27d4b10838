use incircuit_common::hex::{hex16, hex8};
use incircuit_common::{check_value, check_value16, Error, Result, Status};
use incircuit_cpu::Cpu;

use crate::crc32::Crc32;
use crate::region::{select_bank, RomRegion};

/// Bytes shown by `read_data`.
const SHOWN_BYTES: u32 = 4;

/// ROM tests over one CPU, with the board hooks at hand for bank switches.
pub struct RomCheck<'a, H> {
    cpu: &'a mut dyn Cpu,
    hooks: &'a mut H,
}

impl<'a, H> RomCheck<'a, H> {
    pub fn new(cpu: &'a mut dyn Cpu, hooks: &'a mut H) -> Self {
        Self { cpu, hooks }
    }

    /// Every region in order, stopping at the first failure.
    pub fn check_all(&mut self, regions: &[RomRegion<H>]) -> Result<()> {
        for region in regions {
            self.check(region)?;
        }
        Ok(())
    }

    /// Address lines first, so an open line reports as such rather than as
    /// a bad checksum.
    pub fn check(&mut self, region: &RomRegion<H>) -> Result<()> {
        self.check_data2n(region)?;
        self.check_crc(region)
    }

    /// Read the byte at every power-of-two offset. A stuck or open address
    /// line lands on the wrong one.
    pub fn check_data2n(&mut self, region: &RomRegion<H>) -> Result<()> {
        if region.data2n.is_empty() {
            return Ok(());
        }
        select_bank(region.bank_switch, self.hooks, &mut *self.cpu)?;
        let bus_width = u32::from(self.cpu.data_bus_width(region.start));
        let wide = self.cpu.data_access_width(region.start) > 1;

        for (shift, &expected) in region.data2n.iter().enumerate() {
            let offset = 1u32 << shift;
            if offset >= region.length {
                break;
            }
            let address = region.start + offset * bus_width;
            let received = self.cpu.memory_read(address)?;
            if wide {
                check_value16(region.location, received, u16::from(expected))?;
            } else {
                check_value(region.location, address, received, u16::from(expected))?;
            }
        }
        Ok(())
    }

    pub fn calculate_crc(&mut self, region: &RomRegion<H>) -> Result<u32> {
        select_bank(region.bank_switch, self.hooks, &mut *self.cpu)?;
        let bus_width = u32::from(self.cpu.data_bus_width(region.start));
        let wide = self.cpu.data_access_width(region.start) > 1;

        let mut crc = Crc32::new();
        for offset in 0..region.length {
            let data = self.cpu.memory_read(region.start + offset * bus_width)?;
            crc.update(data as u8);
            if wide {
                crc.update((data >> 8) as u8);
            }
        }
        Ok(crc.finish())
    }

    pub fn check_crc(&mut self, region: &RomRegion<H>) -> Result<()> {
        let received = self.calculate_crc(region)?;
        if received != region.crc {
            return Err(Error::RomCrcMismatch {
                location: region.location.to_string(),
                expected: region.crc,
                received,
            });
        }
        Ok(())
    }

    /// The first few bytes, for comparing against a dump by eye.
    pub fn read_data(&mut self, region: &RomRegion<H>) -> Result<Status> {
        select_bank(region.bank_switch, self.hooks, &mut *self.cpu)?;
        let bus_width = u32::from(self.cpu.data_bus_width(region.start));
        let wide = self.cpu.data_access_width(region.start) > 1;

        let mut text = String::from("OK:");
        for offset in 0..SHOWN_BYTES.min(region.length) {
            let data = self.cpu.memory_read(region.start + offset * bus_width)?;
            if wide {
                text.push_str(&hex16(u32::from(data)));
            } else {
                text.push_str(&hex8(data));
            }
        }
        Ok(Status::Message(text))
    }

    /// Read the whole region, for scoping the select lines.
    pub fn read(&mut self, region: &RomRegion<H>) -> Result<()> {
        select_bank(region.bank_switch, self.hooks, &mut *self.cpu)?;
        let bus_width = u32::from(self.cpu.data_bus_width(region.start));
        for offset in 0..region.length {
            self.cpu.memory_read(region.start + offset * bus_width)?;
        }
        Ok(())
    }
}
