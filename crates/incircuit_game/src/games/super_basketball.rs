//! Konami Super Basketball. The CPU is a 6809E, or on later sets Konami's
//! encrypted "Konami-1" part in the same socket with a different pinout.

use incircuit_common::{Error, Result, Status};
use incircuit_cpu::{Cpu, Interrupt, M6809EClockMasterCpu, M6809EPinout, PINOUT_6809E, PINOUT_KONAMI1};
use incircuit_hal::Board;

use crate::game::{BoardHooks, Game, GenericGame};
use crate::region::{InputRegion, OutputRegion, RamRegion, RomRegion};
use crate::tables::{GameTables, TableError};

pub struct SuperBasketballHooks;

impl BoardHooks for SuperBasketballHooks {
    fn interrupt(&self) -> Interrupt {
        Interrupt::Irq
    }

    fn interrupt_response(&self) -> Option<u16> {
        None
    }

    fn interrupt_check(&mut self, _cpu: &mut dyn Cpu) -> Result<Status> {
        Err(Error::NotImplemented)
    }
}

type Hooks = SuperBasketballHooks;

const RAM: [RamRegion<Hooks>; 5] = [
    RamRegion::new(0x2000, 0x2FFF, 0xFF, "   ", "Prog. "),
    RamRegion::new(0x3000, 0x33FF, 0xFF, "   ", "Colour"),
    RamRegion::new(0x3400, 0x37FF, 0xFF, "   ", "Video "),
    RamRegion::new(0x3800, 0x39FF, 0xFF, "   ", "Sprite"),
    RamRegion::new(0x3A00, 0x3BFF, 0xFF, "   ", "Unknow"),
];

const INPUT: [InputRegion<Hooks>; 5] = [
    InputRegion::new(0x3E00, 0xFF, "   ", "System"),
    InputRegion::new(0x3E01, 0xFF, "   ", "P1    "),
    InputRegion::new(0x3E02, 0xFF, "   ", "P2    "),
    InputRegion::new(0x3E80, 0xFF, "   ", "DSW2  "),
    InputRegion::new(0x3F00, 0xFF, "   ", "DSW1  "),
];

const OUTPUT: [OutputRegion<Hooks>; 9] = [
    OutputRegion::new(0x3C00, 0x01, 0x00, "   ", "W. Dog"),
    OutputRegion::new(0x3C20, 0xFF, 0x00, "   ", "ColSel"),
    OutputRegion::new(0x3C80, 0xFF, 0x00, "   ", "ScFlip"),
    OutputRegion::new(0x3C81, 0xFF, 0x00, "   ", "IntMsk"),
    OutputRegion::new(0x3C84, 0xFF, 0x00, "   ", "C.Cntr"),
    OutputRegion::new(0x3C85, 0xFF, 0x00, "   ", "SprSel"),
    OutputRegion::new(0x3D00, 0xFF, 0x00, "   ", "SndDat"),
    OutputRegion::new(0x3D80, 0xFF, 0x00, "   ", "SndInt"),
    OutputRegion::new(0x3F80, 0xFF, 0x00, "   ", "Scroll"),
];

/// Set G.
pub const ROM: [RomRegion<Hooks>; 5] = [
    RomRegion::new(0x6000, 0x2000, &[0x00, 0x00, 0x3c, 0x3c, 0x3d, 0xf6, 0xb5, 0x80, 0x03, 0xac, 0xb4, 0x2d, 0x3a], 0x336dc0ab, "14J"),
    RomRegion::new(0x8000, 0x2000, &[0xa1, 0x10, 0x07, 0x57, 0xa4, 0xd5, 0x32, 0x32, 0x08, 0x74, 0x32, 0x20, 0x6d], 0xf064a9bc, "13J"),
    RomRegion::new(0xA000, 0x2000, &[0xa8, 0x36, 0xae, 0x0f, 0xd4, 0x01, 0x40, 0xec, 0xa3, 0x94, 0x22, 0x06, 0x9f], 0xb9de7d53, "11J"),
    RomRegion::new(0xC000, 0x2000, &[0x5c, 0xc2, 0x58, 0x0e, 0x02, 0xe3, 0x94, 0x21, 0x80, 0x25, 0xc8, 0xc9, 0x05], 0xe98470a0, "10J"),
    RomRegion::new(0xE000, 0x2000, &[0xc7, 0xd7, 0x37, 0x37, 0x38, 0xee, 0x1e, 0x0f, 0x1f, 0xff, 0x37, 0x01, 0x99], 0x1bd0cd2e, "09J"),
];

fn build<B: Board + 'static>(board: B, pinout: &'static M6809EPinout) -> Result<Box<dyn Game>, TableError> {
    // All the RAM is byte wide, so both tables are the same.
    let tables = GameTables::builder()
        .rom(&ROM)
        .ram(&RAM)
        .ram_byte_only(&RAM)
        .input(&INPUT)
        .output(&OUTPUT)
        .build();
    let cpu = Box::new(M6809EClockMasterCpu::new(board, pinout));
    Ok(Box::new(GenericGame::new(cpu, SuperBasketballHooks, tables)?))
}

pub fn create<B: Board + 'static>(board: B) -> Result<Box<dyn Game>, TableError> {
    build(board, &PINOUT_6809E)
}

pub fn create_konami1<B: Board + 'static>(board: B) -> Result<Box<dyn Game>, TableError> {
    build(board, &PINOUT_KONAMI1)
}
