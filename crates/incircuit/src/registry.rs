//! The supported games, each wired to a simulated board that stands in for
//! the header on hosts without GPIO. The simulated boards carry blank ROM
//! sockets, so ROM checks report the CRC of an empty board.

use incircuit_cpu::sim::{
    Ay38910Chip, AyDataPort, AyLatchPort, I8080Target, InterruptModel, M6802Target, M6809ETarget,
    Pia6821Chip, SimMemory, Space, Z80Target,
};
use incircuit_cpu::{Interrupt, PINOUT_6809E, PINOUT_KONAMI1};
use incircuit_game::games::{
    catnmouse_sound, scramble, scramble_sound, space_invaders, super_basketball,
};
use incircuit_game::{Game, TableError};
use incircuit_hal::sim::{SimBoard, SimConfig};
use lazy_static::lazy_static;

pub type CreateFn = fn() -> Result<Box<dyn Game>, TableError>;

pub struct GameEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub create: CreateFn,
}

lazy_static! {
    pub static ref GAMES: Vec<GameEntry> = vec![
        GameEntry {
            name: "scramble",
            description: "Scramble (Z80)",
            create: create_scramble,
        },
        GameEntry {
            name: "hustler",
            description: "Video Hustler (Z80)",
            create: create_hustler,
        },
        GameEntry {
            name: "scramble_sound",
            description: "Scramble sound (Z80)",
            create: create_scramble_sound,
        },
        GameEntry {
            name: "space_invaders",
            description: "Space Invaders (8080)",
            create: create_space_invaders,
        },
        GameEntry {
            name: "super_basketball",
            description: "Super Basketball (6809E)",
            create: create_super_basketball,
        },
        GameEntry {
            name: "super_basketball_k1",
            description: "Super Basketball (Konami-1)",
            create: create_super_basketball_konami1,
        },
        GameEntry {
            name: "catnmouse_sound",
            description: "Cat'n Mouse sound (6802)",
            create: create_catnmouse_sound,
        },
    ];
}

pub fn find(name: &str) -> Option<&'static GameEntry> {
    GAMES.iter().find(|entry| entry.name == name)
}

pub fn names() -> Vec<&'static str> {
    GAMES.iter().map(|entry| entry.name).collect()
}

/// Slow frames keep the interrupt check quick on the simulated clock.
const FRAME_US: u64 = 250_000;

fn board() -> SimBoard {
    SimBoard::new(SimConfig::builder().build())
}

/// Galaxian style video board: the background VRAM is held off outside
/// HBLANK and the VBLANK NMI is latched behind a mask register.
fn galaxian_memory(offset: u16) -> SimMemory {
    let vram = 0x4800 + offset;
    SimMemory::new()
        .hold_window(vram..=vram + 0x03FF, 64, 16)
        .interrupt(
            Interrupt::Nmi,
            InterruptModel::Latched {
                mask_address: 0x6801 + offset,
                period_us: FRAME_US,
            },
        )
}

fn create_scramble() -> Result<Box<dyn Game>, TableError> {
    let board = board();
    board.attach(Z80Target::new(galaxian_memory(0).shared()));
    scramble::create(board)
}

fn create_hustler() -> Result<Box<dyn Game>, TableError> {
    let board = board();
    // The offset is well inside 16 bits.
    let offset = scramble::HUSTLER_OFFSET as u16;
    board.attach(Z80Target::new(galaxian_memory(offset).shared()));
    scramble::create_hustler(board)
}

fn create_scramble_sound() -> Result<Box<dyn Game>, TableError> {
    let chip_3d = Ay38910Chip::new().shared();
    let chip_3c = Ay38910Chip::new().shared();
    let memory = SimMemory::new()
        .map(Space::Io, 0x40..=0x40, AyLatchPort::new(chip_3d.clone()))
        .map(Space::Io, 0x80..=0x80, AyDataPort::new(chip_3d))
        .map(Space::Io, 0x10..=0x10, AyLatchPort::new(chip_3c.clone()))
        .map(Space::Io, 0x20..=0x20, AyDataPort::new(chip_3c))
        .interrupt(
            Interrupt::Irq,
            InterruptModel::Pulsed {
                period_us: FRAME_US,
                width_us: 100,
            },
        );
    let board = board();
    board.attach(Z80Target::new(memory.shared()));
    scramble_sound::create(board)
}

fn create_space_invaders() -> Result<Box<dyn Game>, TableError> {
    let board = board();
    board.attach(I8080Target::new(SimMemory::new().shared()));
    space_invaders::create(board)
}

fn create_super_basketball() -> Result<Box<dyn Game>, TableError> {
    let board = board();
    board.attach(M6809ETarget::new(SimMemory::new().shared(), &PINOUT_6809E));
    super_basketball::create(board)
}

fn create_super_basketball_konami1() -> Result<Box<dyn Game>, TableError> {
    let board = board();
    board.attach(M6809ETarget::new(SimMemory::new().shared(), &PINOUT_KONAMI1));
    super_basketball::create_konami1(board)
}

fn create_catnmouse_sound() -> Result<Box<dyn Game>, TableError> {
    let chip_1h = Ay38910Chip::new().shared();
    let chip_1i = Ay38910Chip::new().shared();
    let pia = Pia6821Chip::new().with_ay(0, chip_1h).with_ay(2, chip_1i);
    let memory = SimMemory::new().map(Space::Memory, 0x400C..=0x400F, pia);
    let board = board();
    board.attach(M6802Target::new(memory.shared()));
    catnmouse_sound::create(board)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use incircuit_common::Status;

    use super::*;

    #[test]
    fn names_are_unique() {
        let names = names();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert!(find("scramble").is_some());
        assert!(find("galaga").is_none());
    }

    #[test]
    fn every_game_builds_and_idles() {
        for entry in GAMES.iter() {
            let mut game = (entry.create)().unwrap();
            assert_eq!(game.bus_idle(), Ok(Status::Ok), "{}", entry.name);
        }
    }

    #[test]
    fn blank_sockets_fail_the_rom_check() {
        for entry in GAMES.iter() {
            let mut game = (entry.create)().unwrap();
            assert!(game.rom_check_all().is_err(), "{}", entry.name);
        }
    }

    #[test]
    fn simulated_galaxian_boards_pass_bus_ram_and_interrupts() {
        for name in ["scramble", "hustler"] {
            let mut game = (find(name).unwrap().create)().unwrap();
            assert_eq!(game.bus_check(), Ok(Status::Ok), "{}", name);
            assert_eq!(game.ram_check_all(), Ok(Status::Ok), "{}", name);
            assert_eq!(game.interrupt_check(), Ok(Status::Ok), "{}", name);
        }
    }
}
