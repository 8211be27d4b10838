//! Taito Space Invaders (8080). The video RAM is tested one bit plane at a
//! time, even and odd addresses apart, since each of the sixteen 4K x 1
//! chips holds one bit of one of them.

use incircuit_common::{Error, Result, Status};
use incircuit_cpu::{Cpu, I8080Cpu, Interrupt};
use incircuit_hal::Board;

use crate::game::{BoardHooks, Game, GenericGame};
use crate::region::{InputRegion, OutputRegion, RamRegion, RomRegion};
use crate::tables::{GameTables, TableError};

const VRAM_START: u32 = 0x2000;
const VRAM_END: u32 = 0x3FFF;

pub struct SpaceInvadersHooks;

impl BoardHooks for SpaceInvadersHooks {
    fn interrupt(&self) -> Interrupt {
        Interrupt::Irq
    }

    // The RST vector alternates between 0xCF and 0xD7 with the video line
    // that raised it.
    fn interrupt_check(&mut self, _cpu: &mut dyn Cpu) -> Result<Status> {
        Err(Error::NotImplemented)
    }
}

type Hooks = SpaceInvadersHooks;

const fn plane(odd: bool, mask: u16, location: &'static str, description: &'static str) -> RamRegion<Hooks> {
    let start = if odd { VRAM_START + 1 } else { VRAM_START };
    RamRegion::new(start, VRAM_END, mask, location, description).stepped(2)
}

const RAM: [RamRegion<Hooks>; 16] = [
    plane(false, 0x01, "c33", "VRAM1A"),
    plane(false, 0x02, "c31", "VRAM2A"),
    plane(false, 0x04, "c25", "VRAM3A"),
    plane(false, 0x08, "c23", "VRAM4A"),
    plane(false, 0x10, "c21", "VRAM5A"),
    plane(false, 0x20, "c17", "VRAM6A"),
    plane(false, 0x40, "c15", "VRAM7A"),
    plane(false, 0x80, "c10", "VRAM8A"),
    plane(true, 0x01, "c32", "VRAM1B"),
    plane(true, 0x02, "c30", "VRAM2B"),
    plane(true, 0x04, "c24", "VRAM3B"),
    plane(true, 0x08, "c22", "VRAM4B"),
    plane(true, 0x10, "c20", "VRAM5B"),
    plane(true, 0x20, "c16", "VRAM6B"),
    plane(true, 0x40, "c14", "VRAM7B"),
    plane(true, 0x80, "c9 ", "VRAM8B"),
];

const RAM_BYTE_ONLY: [RamRegion<Hooks>; 1] = [RamRegion::new(VRAM_START, VRAM_END, 0xFF, "VRM", "VRAM  ")];

const INPUT: [InputRegion<Hooks>; 4] = [
    InputRegion::new(0x1_0000, 0xFF, "   ", "IN0   "),
    InputRegion::new(0x1_0001, 0xFF, "   ", "IN1   "),
    InputRegion::new(0x1_0002, 0xFF, "   ", "IN2   "),
    InputRegion::new(0x1_0003, 0xFF, "   ", "ShiftR"),
];

// Sound On idles high in the trigger entries so a sound's decay stays
// audible after it is switched off.
const OUTPUT: [OutputRegion<Hooks>; 15] = [
    OutputRegion::new(0x1_0003, 0x01, 0x20, "S0 ", "Ufo   "),
    OutputRegion::new(0x1_0003, 0x02, 0x20, "S1 ", "Fire  "),
    OutputRegion::new(0x1_0003, 0x04, 0x20, "S2 ", "BseHit"),
    OutputRegion::new(0x1_0003, 0x08, 0x20, "S3 ", "InvHit"),
    OutputRegion::new(0x1_0003, 0x10, 0x20, "S4 ", "Bonus "),
    OutputRegion::new(0x1_0003, 0x20, 0x00, "S5 ", "Snd On"),
    OutputRegion::new(0x1_0005, 0x01, 0x20, "S6 ", "Step01"),
    OutputRegion::new(0x1_0005, 0x02, 0x20, "S7 ", "Step02"),
    OutputRegion::new(0x1_0005, 0x04, 0x20, "S8 ", "Step04"),
    OutputRegion::new(0x1_0005, 0x08, 0x20, "S9 ", "Step08"),
    OutputRegion::new(0x1_0005, 0x10, 0x20, "S10", "UfoHit"),
    OutputRegion::new(0x1_0005, 0x20, 0x00, "S11", "Flip  "),
    OutputRegion::new(0x1_0004, 0xFF, 0x00, "   ", "ShiftD"),
    OutputRegion::new(0x1_0002, 0x07, 0x20, "   ", "ShiftC"),
    OutputRegion::new(0x1_0006, 0x01, 0x00, "   ", "Wd Res"),
];

/// Midway/Taito rev 4 set.
pub const ROM: [RomRegion<Hooks>; 6] = [
    RomRegion::new(0x0000, 0x0400, &[0x00, 0x00, 0xd4, 0xf5, 0xf5, 0xdb, 0xea, 0x09, 0x21, 0xcd], 0x86bb8cb6, "r36"),
    RomRegion::new(0x0400, 0x0400, &[0x32, 0x2a, 0xcd, 0x00, 0xcd, 0x14, 0x25, 0x7d, 0xc2, 0x3a], 0xfebe6d1a, "r35"),
    RomRegion::new(0x0800, 0x0400, &[0x32, 0xc1, 0xcd, 0x67, 0x02, 0x18, 0x0a, 0xc3, 0x00, 0xf1], 0xa08e7202, "r34"),
    RomRegion::new(0x1400, 0x0400, &[0xcd, 0x74, 0x00, 0xd3, 0xaf, 0x14, 0x09, 0x13, 0xb8, 0x05], 0x1293b826, "r31"),
    RomRegion::new(0x1800, 0x0400, &[0xc3, 0xc9, 0x21, 0xa7, 0x06, 0x3e, 0x18, 0x20, 0x20, 0xfe], 0xa9011634, "r42"),
    RomRegion::new(0x1C00, 0x0400, &[0x00, 0x39, 0x7a, 0xfa, 0x00, 0x00, 0x00, 0x40, 0x01, 0x00], 0x58730370, "r41"),
];

pub fn create<B: Board + 'static>(board: B) -> Result<Box<dyn Game>, TableError> {
    let tables = GameTables::builder()
        .rom(&ROM)
        .ram(&RAM)
        .ram_byte_only(&RAM_BYTE_ONLY)
        .input(&INPUT)
        .output(&OUTPUT)
        .build();
    let game = GenericGame::new(Box::new(I8080Cpu::new(board)), SpaceInvadersHooks, tables)?;
    Ok(Box::new(game))
}
