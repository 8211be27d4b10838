use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use incircuit_common::{Key, Result, Status};
use incircuit_game::Game;

/// One entry of the game menu.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Operation {
    BusIdle,
    BusCheck,
    RomCheckAll,
    RamCheckAll,
    RamCheckAllRandomAccess,
    RamCheckAllChipSelect,
    InterruptCheck,
    InputRead,
    OutputWrite,
    RomCheck,
    RomCrc,
    RomRead,
    RamCheck,
    RamCheckRandomAccess,
    RamCheckAddress,
    RamWriteRead,
    RomReadAll,
    RamWriteAllAddress,
    RamWriteAllLow,
    RamWriteAllHigh,
    RamReadAll,
    Custom,
}

impl Operation {
    /// Menu order.
    pub const ALL: [Operation; 22] = [
        Operation::BusIdle,
        Operation::BusCheck,
        Operation::RomCheckAll,
        Operation::RamCheckAll,
        Operation::RamCheckAllRandomAccess,
        Operation::RamCheckAllChipSelect,
        Operation::InterruptCheck,
        Operation::InputRead,
        Operation::OutputWrite,
        Operation::RomCheck,
        Operation::RomCrc,
        Operation::RomRead,
        Operation::RamCheck,
        Operation::RamCheckRandomAccess,
        Operation::RamCheckAddress,
        Operation::RamWriteRead,
        Operation::RomReadAll,
        Operation::RamWriteAllAddress,
        Operation::RamWriteAllLow,
        Operation::RamWriteAllHigh,
        Operation::RamReadAll,
        Operation::Custom,
    ];

    /// Top line of the display while the operation is selected.
    pub fn label(self) -> &'static str {
        match self {
            Operation::BusIdle => "Bus Idle",
            Operation::BusCheck => "Bus Check",
            Operation::RomCheckAll => "ROM Check All",
            Operation::RamCheckAll => "RAM Check All",
            Operation::RamCheckAllRandomAccess => "RAM Check All RA",
            Operation::RamCheckAllChipSelect => "RAM Check All CS",
            // Spelling matches the label on existing units.
            Operation::InterruptCheck => "Interupt Check",
            Operation::InputRead => "Input Read",
            Operation::OutputWrite => "Output Write",
            Operation::RomCheck => "ROM Check",
            Operation::RomCrc => "ROM CRC",
            Operation::RomRead => "ROM Read",
            Operation::RamCheck => "RAM Check",
            Operation::RamCheckRandomAccess => "RAM Check RA",
            Operation::RamCheckAddress => "RAM Check Ad",
            Operation::RamWriteRead => "RAM Write-Read",
            Operation::RomReadAll => "ROM Read All",
            Operation::RamWriteAllAddress => "RAM Write All AD",
            Operation::RamWriteAllLow => "RAM Write All Lo",
            Operation::RamWriteAllHigh => "RAM Write All Hi",
            Operation::RamReadAll => "RAM Read All",
            Operation::Custom => "Custom",
        }
    }

    /// Command line name.
    pub fn name(self) -> &'static str {
        match self {
            Operation::BusIdle => "bus-idle",
            Operation::BusCheck => "bus-check",
            Operation::RomCheckAll => "rom-check-all",
            Operation::RamCheckAll => "ram-check-all",
            Operation::RamCheckAllRandomAccess => "ram-check-all-ra",
            Operation::RamCheckAllChipSelect => "ram-check-all-cs",
            Operation::InterruptCheck => "interrupt-check",
            Operation::InputRead => "input-read",
            Operation::OutputWrite => "output-write",
            Operation::RomCheck => "rom-check",
            Operation::RomCrc => "rom-crc",
            Operation::RomRead => "rom-read",
            Operation::RamCheck => "ram-check",
            Operation::RamCheckRandomAccess => "ram-check-ra",
            Operation::RamCheckAddress => "ram-check-ad",
            Operation::RamWriteRead => "ram-write-read",
            Operation::RomReadAll => "rom-read-all",
            Operation::RamWriteAllAddress => "ram-write-all-ad",
            Operation::RamWriteAllLow => "ram-write-all-lo",
            Operation::RamWriteAllHigh => "ram-write-all-hi",
            Operation::RamReadAll => "ram-read-all",
            Operation::Custom => "custom",
        }
    }

    /// Whether the keypad steps through a table for this operation.
    pub fn keyed(self) -> bool {
        matches!(
            self,
            Operation::InputRead
                | Operation::OutputWrite
                | Operation::RomCheck
                | Operation::RomCrc
                | Operation::RomRead
                | Operation::RamCheck
                | Operation::RamCheckRandomAccess
                | Operation::RamCheckAddress
                | Operation::RamWriteRead
                | Operation::Custom
        )
    }

    /// Run against `game`. Operations that are not keyed run on any key.
    pub fn run(self, game: &mut dyn Game, key: Key) -> Result<Status> {
        match self {
            Operation::BusIdle => game.bus_idle(),
            Operation::BusCheck => game.bus_check(),
            Operation::RomCheckAll => game.rom_check_all(),
            Operation::RamCheckAll => game.ram_check_all(),
            Operation::RamCheckAllRandomAccess => game.ram_check_all_random_access(),
            Operation::RamCheckAllChipSelect => game.ram_check_all_chip_select(),
            Operation::InterruptCheck => game.interrupt_check(),
            Operation::InputRead => game.input_read(key),
            Operation::OutputWrite => game.output_write(key),
            Operation::RomCheck => game.rom_check(key),
            Operation::RomCrc => game.rom_crc(key),
            Operation::RomRead => game.rom_read(key),
            Operation::RamCheck => game.ram_check(key),
            Operation::RamCheckRandomAccess => game.ram_check_random_access(key),
            Operation::RamCheckAddress => game.ram_check_address(key),
            Operation::RamWriteRead => game.ram_write_read(key),
            Operation::RomReadAll => game.rom_read_all(),
            Operation::RamWriteAllAddress => game.ram_write_all_address(),
            Operation::RamWriteAllLow => game.ram_write_all_low(),
            Operation::RamWriteAllHigh => game.ram_write_all_high(),
            Operation::RamReadAll => game.ram_read_all(),
            Operation::Custom => game.custom(key),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Operation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match Operation::ALL.iter().find(|op| op.name() == s) {
            Some(op) => Ok(*op),
            None => bail!("unknown operation '{}'", s),
        }
    }
}

pub fn parse_key(s: &str) -> anyhow::Result<Key> {
    let key = match s {
        "select" | "sel" | "s" => Key::Select,
        "up" | "u" => Key::Up,
        "down" | "d" => Key::Down,
        "left" | "l" => Key::Left,
        "right" | "r" => Key::Right,
        "none" | "n" => Key::None,
        other => bail!("unknown key '{}'", other),
    };
    Ok(key)
}

/// One command line step: `operation[:key]`, the key defaulting to select.
pub fn parse_step(s: &str) -> anyhow::Result<(Operation, Key)> {
    match s.split_once(':') {
        Some((op, key)) => Ok((op.parse()?, parse_key(key)?)),
        None => Ok((s.parse()?, Key::Select)),
    }
}

#[cfg(test)]
mod tests {
    use incircuit_common::DISPLAY_WIDTH;

    use super::*;

    #[test]
    fn labels_fit_the_display() {
        for op in Operation::ALL {
            assert!(op.label().len() <= DISPLAY_WIDTH, "{}", op.label());
        }
    }

    #[test]
    fn names_parse_back() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
        assert!("rom-check-everything".parse::<Operation>().is_err());
    }

    #[test]
    fn steps_default_to_select() {
        assert_eq!(parse_step("rom-read").unwrap(), (Operation::RomRead, Key::Select));
        assert_eq!(parse_step("ram-check:up").unwrap(), (Operation::RamCheck, Key::Up));
        assert!(parse_step("ram-check:sideways").is_err());
    }

    #[test]
    fn only_table_operations_are_keyed() {
        assert!(Operation::Custom.keyed());
        assert!(!Operation::RamCheckAll.keyed());
        assert_eq!(Operation::ALL.iter().filter(|op| op.keyed()).count(), 10);
    }
}
