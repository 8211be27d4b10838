//! RAM tests. Every check writes a whole pass before reading any of it back,
//! so a decoder fault that aliases two locations shows up as bad data.

use std::iter::StepBy;
use std::ops::RangeInclusive;

use incircuit_common::hex::{hex16, hex8};
use incircuit_common::{check_value, check_value16, Error, Result, Status};
use incircuit_cpu::Cpu;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::region::{select_bank, RamRegion};

/// Seeds of the two random pattern runs in `check`.
const SEEDS: [u32; 2] = [7, 144];

const RANDOM_ACCESS_CYCLES: u32 = 8;
/// Pause scale inside a random access cycle; the refresh of a failing
/// dynamic RAM gives out under the longer pauses of the later cycles.
const RANDOM_ACCESS_PAUSE_MS: u32 = 200;
const RANDOM_ACCESS_HOLD_MS: u32 = 300;

/// Bytes shown by `write_read_data`.
const SHOWN_BYTES: usize = 4;
const WALKING_PATTERN: [u16; SHOWN_BYTES] = [0x11, 0x22, 0x44, 0x88];
const ALTERNATING_PATTERN: [u16; SHOWN_BYTES] = [0x55, 0xAA, 0x55, 0xAA];

pub struct RamCheck<'a, H> {
    cpu: &'a mut dyn Cpu,
    hooks: &'a mut H,
}

impl<'a, H> RamCheck<'a, H> {
    pub fn new(cpu: &'a mut dyn Cpu, hooks: &'a mut H) -> Self {
        Self { cpu, hooks }
    }

    /// Address increment between two entries of the region.
    fn stride(&self, region: &RamRegion<H>) -> u32 {
        u32::from(self.cpu.data_bus_width(region.start)) * region.step
    }

    fn wide(&self, region: &RamRegion<H>) -> bool {
        self.cpu.data_access_width(region.start) > 1
    }

    fn addresses(&self, region: &RamRegion<H>) -> StepBy<RangeInclusive<u32>> {
        (region.start..=region.end).step_by(self.stride(region) as usize)
    }

    fn verify(&self, region: &RamRegion<H>, address: u32, received: u16, expected: u16) -> Result<()> {
        let (received, expected) = (received & region.mask, expected & region.mask);
        if self.wide(region) {
            check_value16(region.location, received, expected)
        } else {
            check_value(region.location, address, received, expected)
        }
    }

    fn access_mask(&self, region: &RamRegion<H>) -> u16 {
        if self.wide(region) {
            0xFFFF
        } else {
            0x00FF
        }
    }

    fn write_random(&mut self, region: &RamRegion<H>, seed: u32, invert: bool) -> Result<()> {
        select_bank(region.bank_switch, self.hooks, &mut *self.cpu)?;
        let mut rng = StdRng::seed_from_u64(u64::from(seed));
        let access_mask = self.access_mask(region);
        for address in self.addresses(region) {
            let data: u16 = rng.gen();
            let data = if invert { !data } else { data };
            self.cpu.memory_write(address, data & access_mask)?;
        }
        Ok(())
    }

    fn read_verify_random(&mut self, region: &RamRegion<H>, seed: u32, invert: bool) -> Result<()> {
        select_bank(region.bank_switch, self.hooks, &mut *self.cpu)?;
        let mut rng = StdRng::seed_from_u64(u64::from(seed));
        for address in self.addresses(region) {
            let data: u16 = rng.gen();
            let expected = if invert { !data } else { data };
            let received = self.cpu.memory_read(address)?;
            self.verify(region, address, received, expected)?;
        }
        Ok(())
    }

    /// One seeded pattern written and verified, then its complement, so every
    /// cell is seen holding both levels.
    fn check_random(&mut self, region: &RamRegion<H>, seed: u32) -> Result<()> {
        for invert in [false, true] {
            self.write_random(region, region.start + seed, invert)?;
            self.read_verify_random(region, region.start + seed, invert)?;
        }
        Ok(())
    }

    pub fn check(&mut self, region: &RamRegion<H>) -> Result<()> {
        for seed in SEEDS {
            self.check_random(region, seed)?;
        }
        Ok(())
    }

    /// Every region written before any is read back. Chips whose selects
    /// overlap corrupt each other's pattern.
    pub fn check_chip_select(&mut self, regions: &[RamRegion<H>]) -> Result<()> {
        let seed = |region: &RamRegion<H>| (region.start & 0xFFFE) + 1;
        for region in regions {
            self.write_random(region, seed(region), true)?;
        }
        for region in regions {
            self.read_verify_random(region, seed(region), true)?;
        }
        Ok(())
    }

    pub fn check_all(&mut self, regions: &[RamRegion<H>]) -> Result<()> {
        for region in regions {
            self.check(region)?;
        }
        Ok(())
    }

    pub fn check_random_access_all(&mut self, regions: &[RamRegion<H>]) -> Result<()> {
        for region in regions {
            self.check_random_access(region)?;
        }
        Ok(())
    }

    /// Random addresses in random order, with reads, writes and clears
    /// interleaved and pauses growing cycle by cycle. Only whole bytes or
    /// words can be tested this way.
    pub fn check_random_access(&mut self, region: &RamRegion<H>) -> Result<()> {
        if !matches!(region.mask, 0x00FF | 0xFF00 | 0xFFFF) {
            return Err(Error::NotImplemented);
        }
        self.write(region, 0x00)?;

        let stride = self.stride(region);
        let entries = ((region.end - region.start) / region.step).max(1);
        let count_length = entries * 3 / stride;
        let report = (count_length / 4).max(1);

        for cycle in 0..RANDOM_ACCESS_CYCLES {
            log::debug!("{}: random access cycle {}", region.location, cycle);
            let seed = region.start + region.step + u32::from(region.mask) + cycle;

            let mut rng = StdRng::seed_from_u64(u64::from(seed));
            for count in 0..count_length {
                let address = rng.gen_range(0..entries) * stride + region.start;
                let expected = random_access_pattern(address, cycle) & region.mask;

                if count % report == 0 {
                    self.cpu.delay_ms(cycle * RANDOM_ACCESS_PAUSE_MS);
                }
                if count & 2 != 0 {
                    self.cpu.memory_write(address, expected)?;
                    continue;
                }

                let received = self.cpu.memory_read(address)? & region.mask;
                if received == 0 {
                    self.cpu.memory_write(address, expected)?;
                    continue;
                }
                self.verify(region, address, received, expected)?;
                if count & 4 != 0 {
                    self.cpu.memory_write(address, 0x00)?;
                }
            }

            self.cpu.delay_ms(cycle * RANDOM_ACCESS_HOLD_MS);

            // Replay the addresses: whatever is still set must hold its value.
            let mut rng = StdRng::seed_from_u64(u64::from(seed));
            for _ in 0..count_length {
                let address = rng.gen_range(0..entries) * stride + region.start;
                let expected = random_access_pattern(address, cycle) & region.mask;
                let received = self.cpu.memory_read(address)? & region.mask;
                if received == 0 {
                    continue;
                }
                self.verify(region, address, received, expected)?;
                self.cpu.memory_write(address, 0x00)?;
            }
        }
        Ok(())
    }

    /// Grow a power-of-two window from the start of the region. The first
    /// window that fails names the address line it has just added.
    pub fn check_address(&mut self, region: &RamRegion<H>) -> Result<()> {
        self.write(region, 0x00)?;

        let length = region.end - region.start + 1;
        let step_shift = if region.step >= 2 { 2 } else { 1 };
        let mut shift = 0u32;
        while (1u32 << (shift + step_shift)) <= length {
            let window = 1u32 << (shift + step_shift);
            let sub = RamRegion {
                end: region.start + window - 1,
                ..*region
            };
            if sub.end > region.end {
                return Err(Error::Unexpected);
            }
            if let Err(error) = self.check_random(&sub, 1) {
                if shift == 0 {
                    return Err(error);
                }
                return Err(Error::Custom(format!(
                    "E:{}{}{}",
                    region.location,
                    hex16(region.start),
                    hex16(1 << (shift - 1 + step_shift))
                )));
            }
            shift += 1;
        }
        Ok(())
    }

    /// Known values in the first four bytes, written then read back, for
    /// scoping. A wide bus covers them in two words.
    pub fn write_read_data(&mut self, region: &RamRegion<H>) -> Result<Status> {
        select_bank(region.bank_switch, self.hooks, &mut *self.cpu)?;
        let stride = self.stride(region);
        let wide = self.wide(region);
        let entries = SHOWN_BYTES / usize::from(self.cpu.data_access_width(region.start).max(1));
        let pattern = if region.mask < 0x04 || wide {
            ALTERNATING_PATTERN
        } else {
            WALKING_PATTERN
        };
        let pattern = pattern.map(|value| if wide { value | (value << 8) } else { value });

        for (index, value) in (0u32..).zip(pattern).take(entries) {
            self.cpu.memory_write(region.start + index * stride, value)?;
        }
        let mut text = String::from("OK:");
        for index in 0..entries as u32 {
            let received = self.cpu.memory_read(region.start + index * stride)? & region.mask;
            if wide {
                text.push_str(&hex16(u32::from(received)));
            } else {
                text.push_str(&hex8(received));
            }
        }
        Ok(Status::Message(text))
    }

    /// Fill with one value.
    pub fn write(&mut self, region: &RamRegion<H>, value: u16) -> Result<()> {
        select_bank(region.bank_switch, self.hooks, &mut *self.cpu)?;
        for address in self.addresses(region) {
            self.cpu.memory_write(address, value)?;
        }
        Ok(())
    }

    /// Each location gets the low byte of its own address.
    pub fn write_address(&mut self, region: &RamRegion<H>) -> Result<()> {
        select_bank(region.bank_switch, self.hooks, &mut *self.cpu)?;
        for address in self.addresses(region) {
            self.cpu.memory_write(address, (address & 0xFF) as u16)?;
        }
        Ok(())
    }

    pub fn read(&mut self, region: &RamRegion<H>) -> Result<()> {
        select_bank(region.bank_switch, self.hooks, &mut *self.cpu)?;
        for address in self.addresses(region) {
            self.cpu.memory_read(address)?;
        }
        Ok(())
    }
}

/// Address-derived value for the random access check: different for every
/// neighbouring address and every cycle, never repeating a simple stripe.
fn random_access_pattern(address: u32, cycle: u32) -> u16 {
    let seed = address + cycle;
    let byte = ((seed * 3) ^ (seed / 5)) as u8;
    u16::from_le_bytes([byte, byte])
}

#[cfg(test)]
mod tests;
