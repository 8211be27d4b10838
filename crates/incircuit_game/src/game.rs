//! The operations a board exposes to the menu, and the engine that runs them
//! off the board's tables.

use incircuit_common::hex::{hex16, hex24, hex32, hex8};
use incircuit_common::{check_value, Error, Key, Result, Status};
use incircuit_cpu::{Cpu, Interrupt};

use crate::io_check::IoCheck;
use crate::ram_check::RamCheck;
use crate::region::{RamRegion, RomRegion};
use crate::rom_check::RomCheck;
use crate::tables::{GameTables, TableError};

/// Rounds of the interrupt check.
const INTERRUPT_ROUNDS: u32 = 4;
/// Longest a board may take to raise its interrupt, about a dozen frames.
const INTERRUPT_TIMEOUT_MS: u32 = 3000;

/// Key-indexed test surface of one board.
///
/// Key-indexed operations run on the selected table entry for
/// [`Key::Select`]; `Up`/`Down` move the selection and any other key only
/// describes the current entry.
pub trait Game {
    fn bus_idle(&mut self) -> Result<Status>;
    fn bus_check(&mut self) -> Result<Status>;

    fn rom_check_all(&mut self) -> Result<Status>;
    fn ram_check_all(&mut self) -> Result<Status>;
    fn ram_check_all_chip_select(&mut self) -> Result<Status>;
    fn ram_check_all_random_access(&mut self) -> Result<Status>;
    fn interrupt_check(&mut self) -> Result<Status>;

    fn input_read(&mut self, key: Key) -> Result<Status>;
    fn output_write(&mut self, key: Key) -> Result<Status>;

    fn rom_check(&mut self, key: Key) -> Result<Status>;
    fn rom_crc(&mut self, key: Key) -> Result<Status>;
    fn rom_read(&mut self, key: Key) -> Result<Status>;

    fn ram_check(&mut self, key: Key) -> Result<Status>;
    fn ram_check_random_access(&mut self, key: Key) -> Result<Status>;
    fn ram_check_address(&mut self, key: Key) -> Result<Status>;
    fn ram_write_read(&mut self, key: Key) -> Result<Status>;

    fn rom_read_all(&mut self) -> Result<Status>;
    fn ram_write_all_address(&mut self) -> Result<Status>;
    fn ram_write_all_low(&mut self) -> Result<Status>;
    fn ram_write_all_high(&mut self) -> Result<Status>;
    fn ram_read_all(&mut self) -> Result<Status>;

    fn custom(&mut self, key: Key) -> Result<Status>;
}

/// Board specific behaviour the tables cannot express. Implemented by the
/// state a board hands its bank switches and custom functions.
pub trait BoardHooks {
    fn interrupt(&self) -> Interrupt {
        Interrupt::Nmi
    }

    /// Vector the board places on the bus when the interrupt is
    /// acknowledged. `None` for auto-vectored boards.
    fn interrupt_response(&self) -> Option<u16> {
        Some(0)
    }

    fn interrupt_check(&mut self, cpu: &mut dyn Cpu) -> Result<Status> {
        wait_then_absent(cpu, self.interrupt(), self.interrupt_response())
    }
}

/// Wait for the interrupt, acknowledge it, and check it does not stay
/// asserted once serviced.
pub fn wait_then_absent(cpu: &mut dyn Cpu, line: Interrupt, response: Option<u16>) -> Result<Status> {
    for round in 0..INTERRUPT_ROUNDS {
        cpu.wait_for_interrupt(line, true, INTERRUPT_TIMEOUT_MS)?;

        if let Some(expected) = response {
            let received = cpu.acknowledge_interrupt()?;
            check_value("Int", round, received & 0xFF, expected)?;
        }

        if cpu.wait_for_interrupt(line, true, 0).is_ok() {
            return Err(Error::Unexpected);
        }
    }
    Ok(Status::Ok)
}

/// Move a table selection for `key`, staying inside `len` entries.
fn step_selection(index: &mut usize, len: usize, key: Key) {
    match key {
        Key::Down if *index > 0 => *index -= 1,
        Key::Up if *index + 1 < len => *index += 1,
        _ => {}
    }
}

/// `<start> <mask> <location>`, the line shown while choosing a ROM or RAM.
fn region_summary(wide: bool, start: u32, mask: u16, location: &str) -> Status {
    let mask = if wide {
        hex16(u32::from(mask))
    } else {
        hex8(mask)
    };
    Status::Message(format!("{} {} {}", hex24(start), mask, location))
}

fn io_summary(wide: bool, location: &str, mask: u16, description: &str) -> Status {
    let mask = if wide {
        hex16(u32::from(mask))
    } else {
        hex8(mask)
    };
    Status::Message(format!(" {}{} {}", location, mask, description))
}

/// Table driven [`Game`] over one CPU.
pub struct GenericGame<H> {
    cpu: Box<dyn Cpu>,
    hooks: H,
    tables: GameTables<H>,
    rom_selection: usize,
    ram_selection: usize,
    ram_byte_selection: usize,
    input_selection: usize,
    output_selection: usize,
    output_on: bool,
    custom_selection: usize,
}

impl<H: BoardHooks> GenericGame<H> {
    /// Validate the tables and put the bus in its idle state.
    pub fn new(mut cpu: Box<dyn Cpu>, hooks: H, tables: GameTables<H>) -> Result<Self, TableError> {
        tables.validate()?;
        if let Err(error) = cpu.idle() {
            log::warn!("bus idle on construction failed: {}", error);
        }
        Ok(Self {
            cpu,
            hooks,
            tables,
            rom_selection: 0,
            ram_selection: 0,
            ram_byte_selection: 0,
            input_selection: 0,
            output_selection: 0,
            output_on: true,
            custom_selection: 0,
        })
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn tables(&self) -> &GameTables<H> {
        &self.tables
    }

    fn rom_checker(&mut self) -> RomCheck<'_, H> {
        RomCheck::new(self.cpu.as_mut(), &mut self.hooks)
    }

    fn ram_checker(&mut self) -> RamCheck<'_, H> {
        RamCheck::new(self.cpu.as_mut(), &mut self.hooks)
    }

    /// Shared key handling of the ROM operations.
    fn on_rom_key<F>(&mut self, key: Key, run: F) -> Result<Status>
    where
        F: FnOnce(&mut RomCheck<'_, H>, &RomRegion<H>) -> Result<Status>,
    {
        if self.tables.rom.is_empty() {
            return Err(Error::NotImplemented);
        }
        step_selection(&mut self.rom_selection, self.tables.rom.len(), key);
        let region = self.tables.rom[self.rom_selection];
        if key != Key::Select {
            let wide = self.cpu.data_access_width(region.start) > 1;
            let mask = if wide { 0xFFFF } else { 0xFF };
            return Ok(region_summary(wide, region.start, mask, region.location));
        }
        run(&mut self.rom_checker(), &region)
    }

    /// Shared key handling of the RAM operations, over the RAM table or the
    /// byte-only table.
    fn on_ram_key<F>(&mut self, key: Key, byte_only: bool, run: F) -> Result<Status>
    where
        F: FnOnce(&mut RamCheck<'_, H>, &RamRegion<H>) -> Result<Status>,
    {
        let (regions, selection) = if byte_only {
            (&self.tables.ram_byte_only, &mut self.ram_byte_selection)
        } else {
            (&self.tables.ram, &mut self.ram_selection)
        };
        if regions.is_empty() {
            return Err(Error::NotImplemented);
        }
        step_selection(selection, regions.len(), key);
        let region = regions[*selection];
        if key != Key::Select {
            let wide = self.cpu.data_access_width(region.start) > 1;
            return Ok(region_summary(wide, region.start, region.mask, region.location));
        }
        run(&mut self.ram_checker(), &region)
    }
}

impl<H: BoardHooks> Game for GenericGame<H> {
    fn bus_idle(&mut self) -> Result<Status> {
        self.cpu.idle()?;
        Ok(Status::Ok)
    }

    fn bus_check(&mut self) -> Result<Status> {
        self.cpu.idle()?;
        self.cpu.check()?;
        Ok(Status::Ok)
    }

    fn rom_check_all(&mut self) -> Result<Status> {
        let regions = self.tables.rom.clone();
        self.rom_checker().check_all(&regions)?;
        Ok(Status::Ok)
    }

    fn ram_check_all(&mut self) -> Result<Status> {
        if self.tables.ram.is_empty() {
            return Err(Error::NotImplemented);
        }
        let regions = self.tables.ram.clone();
        self.ram_checker().check_all(&regions)?;
        Ok(Status::Ok)
    }

    fn ram_check_all_chip_select(&mut self) -> Result<Status> {
        if self.tables.ram.is_empty() {
            return Err(Error::NotImplemented);
        }
        let regions = self.tables.ram.clone();
        self.ram_checker().check_chip_select(&regions)?;
        Ok(Status::Ok)
    }

    fn ram_check_all_random_access(&mut self) -> Result<Status> {
        if self.tables.ram_byte_only.is_empty() {
            return Err(Error::NotImplemented);
        }
        let regions = self.tables.ram_byte_only.clone();
        self.ram_checker().check_random_access_all(&regions)?;
        Ok(Status::Ok)
    }

    fn interrupt_check(&mut self) -> Result<Status> {
        self.hooks.interrupt_check(self.cpu.as_mut())
    }

    fn input_read(&mut self, key: Key) -> Result<Status> {
        if self.tables.input.is_empty() {
            return Err(Error::NotImplemented);
        }
        step_selection(&mut self.input_selection, self.tables.input.len(), key);
        let region = self.tables.input[self.input_selection];
        if key == Key::Select {
            return IoCheck::new(self.cpu.as_mut(), &mut self.hooks).input(&region);
        }
        let wide = self.cpu.data_access_width(region.address) > 1;
        Ok(io_summary(wide, region.location, region.mask, region.description))
    }

    /// Each Select toggles the entry between its active and idle levels,
    /// starting with active.
    fn output_write(&mut self, key: Key) -> Result<Status> {
        if self.tables.output.is_empty() {
            return Err(Error::NotImplemented);
        }
        step_selection(&mut self.output_selection, self.tables.output.len(), key);
        let region = self.tables.output[self.output_selection];
        if key == Key::Select {
            let on = self.output_on;
            self.output_on = !on;
            return IoCheck::new(self.cpu.as_mut(), &mut self.hooks).output(&region, on);
        }
        let wide = self.cpu.data_access_width(region.address) > 1;
        Ok(io_summary(wide, region.location, region.active, region.description))
    }

    fn rom_check(&mut self, key: Key) -> Result<Status> {
        self.on_rom_key(key, |rom, region| rom.check(region).map(|_| Status::Ok))
    }

    fn rom_crc(&mut self, key: Key) -> Result<Status> {
        self.on_rom_key(key, |rom, region| {
            let crc = rom.calculate_crc(region)?;
            Ok(Status::Message(format!(
                "OK:{}{}",
                region.location,
                hex32(crc)
            )))
        })
    }

    fn rom_read(&mut self, key: Key) -> Result<Status> {
        self.on_rom_key(key, |rom, region| rom.read_data(region))
    }

    fn ram_check(&mut self, key: Key) -> Result<Status> {
        self.on_ram_key(key, false, |ram, region| {
            ram.check(region).map(|_| Status::Ok)
        })
    }

    fn ram_check_random_access(&mut self, key: Key) -> Result<Status> {
        self.on_ram_key(key, true, |ram, region| {
            ram.check_random_access(region).map(|_| Status::Ok)
        })
    }

    fn ram_check_address(&mut self, key: Key) -> Result<Status> {
        self.on_ram_key(key, false, |ram, region| {
            ram.check_address(region).map(|_| Status::Ok)
        })
    }

    fn ram_write_read(&mut self, key: Key) -> Result<Status> {
        self.on_ram_key(key, false, |ram, region| ram.write_read_data(region))
    }

    fn rom_read_all(&mut self) -> Result<Status> {
        let regions = self.tables.rom.clone();
        let mut rom = self.rom_checker();
        for region in &regions {
            rom.read(region)?;
        }
        Ok(Status::Ok)
    }

    fn ram_write_all_address(&mut self) -> Result<Status> {
        let regions = self.writable_ram();
        let mut ram = self.ram_checker();
        for region in &regions {
            ram.write_address(region)?;
        }
        Ok(Status::Ok)
    }

    fn ram_write_all_low(&mut self) -> Result<Status> {
        self.fill_all(0x00)
    }

    fn ram_write_all_high(&mut self) -> Result<Status> {
        self.fill_all(0xFF)
    }

    fn ram_read_all(&mut self) -> Result<Status> {
        let regions = self.tables.ram.clone();
        let mut ram = self.ram_checker();
        for region in &regions {
            ram.read(region)?;
        }
        Ok(Status::Ok)
    }

    fn custom(&mut self, key: Key) -> Result<Status> {
        if self.tables.custom.is_empty() {
            return Err(Error::NotImplemented);
        }
        if key == Key::Select {
            let function = self.tables.custom[self.custom_selection];
            log::debug!("custom function '{}'", function.description.trim_end());
            return (function.function)(&mut self.hooks, self.cpu.as_mut());
        }
        step_selection(&mut self.custom_selection, self.tables.custom.len(), key);
        let function = self.tables.custom[self.custom_selection];
        Ok(Status::Message(format!(" {}", function.description)))
    }
}

impl<H: BoardHooks> GenericGame<H> {
    /// RAM then write-only RAM, the order the fill operations use.
    fn writable_ram(&self) -> Vec<RamRegion<H>> {
        self.tables
            .ram
            .iter()
            .chain(self.tables.ram_write_only.iter())
            .copied()
            .collect()
    }

    fn fill_all(&mut self, value: u16) -> Result<Status> {
        let regions = self.writable_ram();
        let mut ram = self.ram_checker();
        for region in &regions {
            ram.write(region, value)?;
        }
        Ok(Status::Ok)
    }
}

#[cfg(test)]
mod tests;
