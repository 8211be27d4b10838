pub mod crc32;
pub mod game;
pub mod games;
mod io_check;
mod ram_check;
pub mod region;
mod rom_check;
pub mod tables;

#[cfg(test)]
mod testing;

pub use crc32::crc32;
pub use game::{wait_then_absent, BoardHooks, Game, GenericGame};
pub use region::{BankSwitch, CustomFn, CustomFunction, InputRegion, OutputRegion, RamRegion, RomRegion};
pub use tables::{GameTables, TableError};
