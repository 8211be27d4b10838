use std::fmt;

use typed_builder::TypedBuilder;

use crate::region::{CustomFunction, InputRegion, OutputRegion, RamRegion, RomRegion};

/// Longest location label that still leaves room for the values on the
/// status line.
pub const LOCATION_WIDTH: usize = 3;
pub const DESCRIPTION_WIDTH: usize = 6;
/// Custom function names fill the menu line less the leading space.
pub const CUSTOM_WIDTH: usize = 15;

/// Working copy of a board's tables, owned by its engine.
///
/// Board modules keep their tables as `'static` slices; the builder copies
/// them in.
#[derive(TypedBuilder)]
pub struct GameTables<H> {
    #[builder(setter(transform = |regions: &[RomRegion<H>]| regions.to_vec()))]
    pub rom: Vec<RomRegion<H>>,
    #[builder(default, setter(transform = |regions: &[RamRegion<H>]| regions.to_vec()))]
    pub ram: Vec<RamRegion<H>>,
    /// RAM that can only be exercised a whole byte at a time.
    #[builder(default, setter(transform = |regions: &[RamRegion<H>]| regions.to_vec()))]
    pub ram_byte_only: Vec<RamRegion<H>>,
    #[builder(default, setter(transform = |regions: &[RamRegion<H>]| regions.to_vec()))]
    pub ram_write_only: Vec<RamRegion<H>>,
    #[builder(default, setter(transform = |regions: &[InputRegion<H>]| regions.to_vec()))]
    pub input: Vec<InputRegion<H>>,
    #[builder(default, setter(transform = |regions: &[OutputRegion<H>]| regions.to_vec()))]
    pub output: Vec<OutputRegion<H>>,
    #[builder(default, setter(transform = |functions: &[CustomFunction<H>]| functions.to_vec()))]
    pub custom: Vec<CustomFunction<H>>,
}

impl<H> GameTables<H> {
    /// Move every RAM and IO address by `offset`. ROM stays where it is, the
    /// variant boards relocate only the decoded hardware.
    pub fn with_offset(mut self, offset: u32) -> Self {
        log::debug!("tables offset by {:X}", offset);
        let ram = self
            .ram
            .iter_mut()
            .chain(self.ram_byte_only.iter_mut())
            .chain(self.ram_write_only.iter_mut());
        for region in ram {
            region.start += offset;
            region.end += offset;
        }
        for region in self.input.iter_mut() {
            region.address += offset;
        }
        for region in self.output.iter_mut() {
            region.address += offset;
        }
        self
    }

    /// No record may look like a table terminator, and every label has to
    /// fit its field.
    pub fn validate(&self) -> Result<(), TableError> {
        for rom in &self.rom {
            if rom.length == 0 {
                return Err(TableError::EmptyRom {
                    location: rom.location,
                });
            }
            check_label(rom.location, LOCATION_WIDTH)?;
            let address_lines = (0..32).take_while(|shift| (1u64 << shift) < u64::from(rom.length));
            let address_lines = address_lines.count();
            if !rom.data2n.is_empty() && rom.data2n.len() < address_lines {
                return Err(TableError::ShortData2n {
                    location: rom.location,
                    expected: address_lines,
                    found: rom.data2n.len(),
                });
            }
        }

        let ram = [
            ("ram", &self.ram),
            ("ram_byte_only", &self.ram_byte_only),
            ("ram_write_only", &self.ram_write_only),
        ];
        for (table, regions) in ram {
            for region in regions.iter() {
                if region.mask == 0 {
                    return Err(TableError::ZeroMask {
                        table,
                        location: region.location,
                    });
                }
                if region.start > region.end {
                    return Err(TableError::InvertedRange {
                        location: region.location,
                        start: region.start,
                        end: region.end,
                    });
                }
                if region.step == 0 {
                    return Err(TableError::ZeroStep {
                        location: region.location,
                    });
                }
                check_label(region.location, LOCATION_WIDTH)?;
                check_label(region.description, DESCRIPTION_WIDTH)?;
            }
        }

        for region in &self.input {
            if region.mask == 0 {
                return Err(TableError::ZeroMask {
                    table: "input",
                    location: region.location,
                });
            }
            check_label(region.location, LOCATION_WIDTH)?;
            check_label(region.description, DESCRIPTION_WIDTH)?;
        }

        for region in &self.output {
            if region.active == 0 {
                return Err(TableError::ZeroMask {
                    table: "output",
                    location: region.location,
                });
            }
            check_label(region.location, LOCATION_WIDTH)?;
            check_label(region.description, DESCRIPTION_WIDTH)?;
        }

        for function in &self.custom {
            if function.description.trim().is_empty() {
                return Err(TableError::UnnamedCustom);
            }
            check_label(function.description, CUSTOM_WIDTH)?;
        }
        Ok(())
    }
}

fn check_label(label: &'static str, max: usize) -> Result<(), TableError> {
    if label.chars().count() > max {
        return Err(TableError::LabelTooLong { label, max });
    }
    Ok(())
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum TableError {
    EmptyRom {
        location: &'static str,
    },
    ZeroMask {
        table: &'static str,
        location: &'static str,
    },
    InvertedRange {
        location: &'static str,
        start: u32,
        end: u32,
    },
    ZeroStep {
        location: &'static str,
    },
    UnnamedCustom,
    LabelTooLong {
        label: &'static str,
        max: usize,
    },
    ShortData2n {
        location: &'static str,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::EmptyRom { location } => {
                write!(f, "ROM '{}' has zero length", location)
            }
            TableError::ZeroMask { table, location } => {
                write!(f, "{} entry '{}' has an empty mask", table, location)
            }
            TableError::InvertedRange {
                location,
                start,
                end,
            } => write!(
                f,
                "RAM '{}' ends at {:06X} before its start {:06X}",
                location, end, start
            ),
            TableError::ZeroStep { location } => write!(f, "RAM '{}' has a zero step", location),
            TableError::UnnamedCustom => f.write_str("custom function without a description"),
            TableError::LabelTooLong { label, max } => {
                write!(f, "label '{}' is longer than {} characters", label, max)
            }
            TableError::ShortData2n {
                location,
                expected,
                found,
            } => write!(
                f,
                "ROM '{}' needs {} address line bytes, has {}",
                location, expected, found
            ),
        }
    }
}

impl std::error::Error for TableError {}
