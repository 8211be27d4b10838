use std::collections::HashMap;

use incircuit_common::{Error, ErrorKind, Result, Status};
use incircuit_cpu::{Cpu, Interrupt};

use super::RamCheck;
use crate::region::RamRegion;
use crate::testing::MemoryCpu;

struct NoHooks;

fn prog_lo() -> RamRegion<NoHooks> {
    RamRegion::new(0x4000, 0x43FF, 0x0F, " 1K", "Prog. ")
}

#[test]
fn good_ram_passes_both_seeds() {
    let mut cpu = MemoryCpu::new().logging();
    RamCheck::new(&mut cpu, &mut NoHooks).check(&prog_lo()).unwrap();
    // Two seeds, each a pattern and its complement written then read.
    assert_eq!(cpu.log.len(), 0x400 * 2 * 2 * 2);
}

#[test]
fn stuck_bit_is_reported_at_its_address() {
    let mut cpu = MemoryCpu::new();
    cpu.stuck_low = 0x04;
    let error = RamCheck::new(&mut cpu, &mut NoHooks)
        .check(&prog_lo())
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Custom);
    assert!(error.to_string().starts_with("E: 1K 4"));
}

#[test]
fn mask_limits_what_is_compared() {
    // The other nibble's chip is dead; this one is fine.
    let mut cpu = MemoryCpu::new();
    cpu.stuck_low = 0xF0;
    RamCheck::new(&mut cpu, &mut NoHooks).check(&prog_lo()).unwrap();
}

#[test]
fn overlapping_selects_only_fail_the_chip_select_check() {
    let regions = [
        RamRegion::new(0x4000, 0x43FF, 0xFF, "1KG", "Prog. "),
        RamRegion::new(0x4400, 0x47FF, 0xFF, "1JH", "Prog. "),
    ];
    // A10 not decoded: both chips answer both ranges.
    let mut cpu = MemoryCpu::new();
    cpu.decode = 0xFF_FBFF;
    let mut hooks = NoHooks;
    let mut ram = RamCheck::new(&mut cpu, &mut hooks);
    ram.check_all(&regions).unwrap();
    let error = ram.check_chip_select(&regions).unwrap_err();
    assert!(error.to_string().starts_with("E:1KG 4"));
}

#[test]
fn random_access_passes_on_good_ram_with_growing_pauses() {
    let region = RamRegion::<NoHooks>::new(0x2000, 0x20FF, 0xFF, "VRM", "VRAM  ");
    let mut cpu = MemoryCpu::new();
    RamCheck::new(&mut cpu, &mut NoHooks)
        .check_random_access(&region)
        .unwrap();
    assert_eq!(cpu.delays.first(), Some(&0));
    assert_eq!(cpu.delays.last(), Some(&2100));
    assert!(cpu.delays.contains(&1400));
    // Everything is cleared behind the check.
    assert!((0x2000..=0x20FF).all(|a| cpu.peek(a) == 0));
}

#[test]
fn random_access_catches_aliased_addresses() {
    let region = RamRegion::<NoHooks>::new(0x2000, 0x20FF, 0xFF, "VRM", "VRAM  ");
    let mut cpu = MemoryCpu::new();
    cpu.decode = 0xFF_FF7F;
    let error = RamCheck::new(&mut cpu, &mut NoHooks)
        .check_random_access(&region)
        .unwrap_err();
    assert!(error.to_string().starts_with("E:VRM 20"));
}

#[test]
fn random_access_count_scales_with_the_bus_width() {
    let region = RamRegion::<NoHooks>::new(0x0000, 0x00FF, 0xFFFF, "7B ", "Work  ");
    let mut cpu = MemoryCpu::new().wide().logging();
    RamCheck::new(&mut cpu, &mut NoHooks)
        .check_random_access(&region)
        .unwrap();
    // 255 entries * 3 / 2 bytes = 382 accesses a cycle. Reads are the first
    // two of every four plus the whole replay.
    let reads = cpu.log.iter().filter(|(_, _, write)| !write).count();
    assert_eq!(reads, 8 * (192 + 382));
}

#[test]
fn random_access_needs_whole_bytes() {
    let mut cpu = MemoryCpu::new();
    assert_eq!(
        RamCheck::new(&mut cpu, &mut NoHooks).check_random_access(&prog_lo()),
        Err(Error::NotImplemented)
    );
}

#[test]
fn address_check_names_the_open_line() {
    let mut cpu = MemoryCpu::new();
    cpu.decode = 0xFF_FFDF;
    assert_eq!(
        RamCheck::new(&mut cpu, &mut NoHooks)
            .check_address(&prog_lo())
            .unwrap_err()
            .to_string(),
        "E: 1K 4000 0020"
    );

    let mut cpu = MemoryCpu::new();
    RamCheck::new(&mut cpu, &mut NoHooks)
        .check_address(&prog_lo())
        .unwrap();
}

#[test]
fn write_read_data_shows_the_masked_pattern() {
    let mut cpu = MemoryCpu::new();
    let mut hooks = NoHooks;
    let mut ram = RamCheck::new(&mut cpu, &mut hooks);
    assert_eq!(
        ram.write_read_data(&prog_lo()),
        Ok(Status::message("OK: 01 02 04 08"))
    );

    let plane = RamRegion::new(0x2000, 0x3FFF, 0x01, "c33", "VRAM1A").stepped(2);
    assert_eq!(
        ram.write_read_data(&plane),
        Ok(Status::message("OK: 01 00 01 00"))
    );
}

#[test]
fn write_read_data_covers_four_bytes_on_a_wide_bus() {
    let region = RamRegion::<NoHooks>::new(0x0000, 0x0FFF, 0xFFFF, "7B ", "Work  ");
    let mut cpu = MemoryCpu::new().wide().logging();
    assert_eq!(
        RamCheck::new(&mut cpu, &mut NoHooks).write_read_data(&region),
        Ok(Status::message("OK: 5555 AAAA"))
    );
    assert_eq!(cpu.writes(), vec![(0x0000, 0x5555), (0x0002, 0xAAAA)]);
    assert_eq!(cpu.log.len(), 4);
}

#[test]
fn address_as_data_follows_the_step() {
    let plane = RamRegion::<NoHooks>::new(0x2001, 0x2007, 0x01, "c32", "VRAM1B").stepped(2);
    let mut cpu = MemoryCpu::new().logging();
    let mut hooks = NoHooks;
    let mut ram = RamCheck::new(&mut cpu, &mut hooks);
    ram.write_address(&plane).unwrap();
    ram.write(&plane, 0xFF).unwrap();
    ram.read(&plane).unwrap();
    assert_eq!(
        cpu.writes(),
        vec![
            (0x2001, 0x01),
            (0x2003, 0x03),
            (0x2005, 0x05),
            (0x2007, 0x07),
            (0x2001, 0xFF),
            (0x2003, 0xFF),
            (0x2005, 0xFF),
            (0x2007, 0xFF),
        ]
    );
    assert_eq!(cpu.log.len(), 12);
}

/// Two RAM chips sharing 0x1800-0x1BFF, one nibble each, picked by a bank
/// latch at 0x3000.
struct BankedCpu {
    bank: usize,
    chips: [HashMap<u32, u16>; 2],
}

const BANK_LATCH: u32 = 0x3000;

impl Cpu for BankedCpu {
    fn idle(&mut self) -> Result<()> {
        Ok(())
    }

    fn check(&mut self) -> Result<()> {
        Ok(())
    }

    fn memory_read(&mut self, address: u32) -> Result<u16> {
        Ok(self.chips[self.bank].get(&address).copied().unwrap_or(0))
    }

    fn memory_write(&mut self, address: u32, data: u16) -> Result<()> {
        if address == BANK_LATCH {
            self.bank = usize::from(data & 0x01);
        } else {
            self.chips[self.bank].insert(address, data);
        }
        Ok(())
    }

    fn wait_for_interrupt(&mut self, _: Interrupt, _: bool, _: u32) -> Result<()> {
        Err(Error::NotImplemented)
    }

    fn acknowledge_interrupt(&mut self) -> Result<u16> {
        Ok(0)
    }

    fn delay_ms(&mut self, _ms: u32) {}
}

#[derive(Default)]
struct Banks {
    calls: Vec<&'static str>,
}

fn bank_hi(banks: &mut Banks, cpu: &mut dyn Cpu) -> Result<()> {
    banks.calls.push("Hi");
    cpu.memory_write(BANK_LATCH, 0x01)
}

fn bank_lo(banks: &mut Banks, cpu: &mut dyn Cpu) -> Result<()> {
    banks.calls.push("Lo");
    cpu.memory_write(BANK_LATCH, 0x00)
}

#[test]
fn bank_switch_runs_once_per_pass_and_views_stay_apart() {
    let hi = RamRegion::new(0x1800, 0x1BFF, 0xF0, "Hi ", "Bank 1").switched(bank_hi);
    let lo = RamRegion::new(0x1800, 0x1BFF, 0x0F, "Lo ", "Bank 0").switched(bank_lo);
    let mut cpu = BankedCpu {
        bank: 0,
        chips: [HashMap::new(), HashMap::new()],
    };
    let mut banks = Banks::default();

    RamCheck::new(&mut cpu, &mut banks).check(&hi).unwrap();
    assert_eq!(banks.calls, vec!["Hi"; 8]);
    assert!(cpu.chips[0].is_empty());

    banks.calls.clear();
    let mut ram = RamCheck::new(&mut cpu, &mut banks);
    ram.write(&hi, 0x5A).unwrap();
    ram.write(&lo, 0x00).unwrap();
    ram.read(&hi).unwrap();
    assert_eq!(banks.calls, vec!["Hi", "Lo", "Hi"]);
    assert_eq!(cpu.chips[1].get(&0x1800), Some(&0x5A));
    assert_eq!(cpu.chips[0].get(&0x1800), Some(&0x00));
}
