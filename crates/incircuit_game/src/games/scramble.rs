//! Scramble main board (Z80), and the Hustler conversion of it.
//!
//! The VBLANK interrupt reaches NMI through a latch that is reset by masking
//! it at 0x6801. Background VRAM only answers in HBLANK, so its regions carry
//! the SYNC qualifier and the driver lines the access up with `_WAIT`.

use incircuit_common::{Error, Result, Status};
use incircuit_cpu::{Cpu, Interrupt, Z80Cpu};
use incircuit_hal::Board;

use crate::game::{BoardHooks, Game, GenericGame};
use crate::region::{CustomFunction, InputRegion, OutputRegion, RamRegion, RomRegion};
use crate::tables::{GameTables, TableError};

const PROG_RAM: u32 = 0x00_4000;
const BK_VRAM: u32 = 0x10_4800;
const OBJ_RAM: u32 = 0x00_5000;
const WD_RES: u32 = 0x00_7000;
const CONTROL: u32 = 0x00_6800;
const PPI_0: u32 = 0x00_8100;
const PPI_1: u32 = 0x00_8200;

const INT_MASK: u32 = CONTROL + 0x001;

/// Hustler moves every decoded device up to make room for more ROM.
pub const HUSTLER_OFFSET: u32 = 0x4000;

/// Control words written before each access to a PPI port.
const PPI_0_MODE: u16 = 0x9B;
const PPI_1_MODE: u16 = 0x88;

const INTERRUPT_ROUNDS: u32 = 4;
const FRAME_TIMEOUT_MS: u32 = 1000;

/// Tile code of a blank character in the background graphics ROMs.
const BLANK_TILE: u16 = 0x080 >> 3;
const BK_VRAM_LEN: u32 = 0x400;
const HIDDEN_OBJECT: u16 = 0x04;
const OBJ_RAM_LEN: u32 = 0x100;

/// State the Scramble tables reach through their callbacks.
pub struct ScrambleHooks {
    offset: u32,
}

impl ScrambleHooks {
    /// Fail with `Unexpected` if the interrupt shows up within `timeout_ms`.
    fn expect_absent(cpu: &mut dyn Cpu, timeout_ms: u32) -> Result<()> {
        match cpu.wait_for_interrupt(Interrupt::Nmi, true, timeout_ms) {
            Ok(()) => Err(Error::Unexpected),
            Err(_) => Ok(()),
        }
    }
}

impl BoardHooks for ScrambleHooks {
    fn interrupt(&self) -> Interrupt {
        Interrupt::Nmi
    }

    fn interrupt_response(&self) -> Option<u16> {
        None
    }

    /// Each round: the unmasked latch must fire within a frame, masking must
    /// clear it, unmasking again must not bring it straight back, and while
    /// masked no frame may set it.
    fn interrupt_check(&mut self, cpu: &mut dyn Cpu) -> Result<Status> {
        let mask = INT_MASK + self.offset;
        for round in 0..INTERRUPT_ROUNDS {
            log::debug!("scramble interrupt round {}", round);
            cpu.memory_write(mask, 0x01)?;
            cpu.wait_for_interrupt(Interrupt::Nmi, true, FRAME_TIMEOUT_MS)?;

            cpu.memory_write(mask, 0x00)?;
            Self::expect_absent(cpu, 0)?;

            cpu.memory_write(mask, 0x01)?;
            Self::expect_absent(cpu, 0)?;

            cpu.memory_write(mask, 0x00)?;
            Self::expect_absent(cpu, FRAME_TIMEOUT_MS)?;
        }
        Ok(Status::Ok)
    }
}

/// PPI 0: ports A, B and C all mode 0 inputs.
fn setup_ppi_0(hooks: &mut ScrambleHooks, cpu: &mut dyn Cpu) -> Result<()> {
    cpu.memory_write(PPI_0 + hooks.offset + 0x003, PPI_0_MODE)
}

/// PPI 1: A, B and the low half of C are outputs, the high half of C is the
/// protection read back.
fn setup_ppi_1(hooks: &mut ScrambleHooks, cpu: &mut dyn Cpu) -> Result<()> {
    cpu.memory_write(PPI_1 + hooks.offset + 0x003, PPI_1_MODE)
}

fn clear_bk(hooks: &mut ScrambleHooks, cpu: &mut dyn Cpu) -> Result<Status> {
    let base = BK_VRAM + hooks.offset;
    for address in base..base + BK_VRAM_LEN {
        cpu.memory_write(address, BLANK_TILE)?;
    }
    Ok(Status::Ok)
}

fn clear_obj(hooks: &mut ScrambleHooks, cpu: &mut dyn Cpu) -> Result<Status> {
    let base = OBJ_RAM + hooks.offset;
    for address in base..base + OBJ_RAM_LEN {
        cpu.memory_write(address, HIDDEN_OBJECT)?;
    }
    Ok(Status::Ok)
}

type Hooks = ScrambleHooks;

const RAM: [RamRegion<Hooks>; 6] = [
    RamRegion::new(PROG_RAM, PROG_RAM + 0x3FF, 0x0F, " 1K", "Prog. "),
    RamRegion::new(PROG_RAM, PROG_RAM + 0x3FF, 0xF0, " 1G", "Prog. "),
    RamRegion::new(PROG_RAM + 0x400, PROG_RAM + 0x7FF, 0x0F, " 1J", "Prog. "),
    RamRegion::new(PROG_RAM + 0x400, PROG_RAM + 0x7FF, 0xF0, " 1H", "Prog. "),
    RamRegion::new(BK_VRAM, BK_VRAM + 0x3FF, 0x0F, " 3K", "BkVRam"),
    RamRegion::new(BK_VRAM, BK_VRAM + 0x3FF, 0xF0, " 3J", "BkVRam"),
];

const RAM_BYTE_ONLY: [RamRegion<Hooks>; 3] = [
    RamRegion::new(PROG_RAM, PROG_RAM + 0x3FF, 0xFF, "1KG", "Prog. "),
    RamRegion::new(PROG_RAM + 0x400, PROG_RAM + 0x7FF, 0xFF, "1JH", "Prog. "),
    RamRegion::new(BK_VRAM, BK_VRAM + 0x3FF, 0xFF, "3KJ", "BkVRam"),
];

// Object RAM cannot be read back on this board.
const RAM_WRITE_ONLY: [RamRegion<Hooks>; 2] = [
    RamRegion::new(OBJ_RAM, OBJ_RAM + 0x0FF, 0x0F, " 3L", "ObjRam"),
    RamRegion::new(OBJ_RAM, OBJ_RAM + 0x0FF, 0xF0, " 3M", "ObjRam"),
];

const INPUT: [InputRegion<Hooks>; 5] = [
    InputRegion::new(WD_RES, 0xFF, " 5C", "WD Res"),
    InputRegion::new(PPI_0, 0xFF, "s1E", "Port A").switched(setup_ppi_0),
    InputRegion::new(PPI_0 + 0x001, 0xFF, "s1E", "Port B").switched(setup_ppi_0),
    InputRegion::new(PPI_0 + 0x002, 0xFF, "s1E", "Port C").switched(setup_ppi_0),
    InputRegion::new(PPI_1 + 0x002, 0xF0, "s1E", "Prot R").switched(setup_ppi_1),
];

const OUTPUT: [OutputRegion<Hooks>; 11] = [
    OutputRegion::new(CONTROL + 0x001, 0x01, 0x00, " 5B", "NMI En"),
    OutputRegion::new(CONTROL + 0x002, 0x01, 0x00, " 5B", "Cntr  "),
    OutputRegion::new(CONTROL + 0x003, 0x01, 0x00, " 5B", "POUT1 "),
    OutputRegion::new(CONTROL + 0x004, 0x01, 0x00, " 5B", "Stars "),
    OutputRegion::new(CONTROL + 0x005, 0x01, 0x00, " 5B", "POUT2 "),
    OutputRegion::new(CONTROL + 0x006, 0x01, 0x00, " 5B", "Flip X"),
    OutputRegion::new(CONTROL + 0x007, 0x01, 0x00, " 5B", "Flip Y"),
    OutputRegion::new(PPI_1, 0xFF, 0x00, "s1D", "Snd Cm").switched(setup_ppi_1),
    OutputRegion::new(PPI_1 + 0x001, 0x04, 0x00, "s1D", "Snd In").switched(setup_ppi_1),
    OutputRegion::new(PPI_1 + 0x001, 0x10, 0x00, "s1D", "Amp Mt").switched(setup_ppi_1),
    OutputRegion::new(PPI_1 + 0x002, 0x0F, 0x00, "s1D", "Prot W").switched(setup_ppi_1),
];

const CUSTOM: [CustomFunction<Hooks>; 2] = [
    CustomFunction::new(clear_bk, "Clear Bk  "),
    CustomFunction::new(clear_obj, "Clear Obj "),
];

pub const SCRAMBLE_ROM: [RomRegion<Hooks>; 8] = [
    RomRegion::new(0x0000, 0x0800, &[0x32, 0x01, 0xc3, 0x77, 0x77, 0x85, 0x7e, 0x4e, 0x82, 0x70, 0x2b], 0xb89207a1, " 2C"),
    RomRegion::new(0x0800, 0x0800, &[0x78, 0xd1, 0xd1, 0xd1, 0xd1, 0xd1, 0xd1, 0xd1, 0xd1, 0xd1, 0x1f], 0xe9b4b9eb, " 2E"),
    RomRegion::new(0x1000, 0x0800, &[0x06, 0xff, 0x0c, 0x40, 0x0f, 0x11, 0x40, 0xc9, 0x14, 0x1d, 0x39], 0xa1f14f4c, " 2F"),
    RomRegion::new(0x1800, 0x0800, &[0x40, 0x35, 0x36, 0x3e, 0x22, 0x07, 0x23, 0x19, 0x06, 0x05, 0x40], 0x591bc0d9, " 2H"),
    RomRegion::new(0x2000, 0x0800, &[0x2d, 0x05, 0xf7, 0x10, 0x3d, 0x10, 0xcd, 0x07, 0x05, 0xdd, 0x0f], 0x22f11b6b, " 2J"),
    RomRegion::new(0x2800, 0x0800, &[0x03, 0xc6, 0xfe, 0x7e, 0x09, 0x00, 0x3e, 0x03, 0xdd, 0xfd, 0x00], 0x705ffe49, " 2L"),
    RomRegion::new(0x3000, 0x0800, &[0xc9, 0x3a, 0x42, 0x1b, 0x41, 0x11, 0x01, 0x5e, 0xc3, 0x30, 0x00], 0xea26c35c, " 2M"),
    RomRegion::new(0x3800, 0x0800, &[0xd8, 0xd1, 0xd1, 0xd1, 0xc7, 0xc7, 0xd8, 0xd1, 0xd1, 0xd1, 0xff], 0x94d8f5e3, " 2P"),
];

/// Hustler fits twelve 1K parts in the same space.
pub const HUSTLER_ROM: [RomRegion<Hooks>; 12] = [
    RomRegion::new(0x0000, 0x0400, &[0x32, 0x01, 0xc3, 0x77, 0x77, 0x85, 0x7e, 0x32, 0xcd, 0x42], 0x9443ff23, "2XC"),
    RomRegion::new(0x0400, 0x0400, &[0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0xc3, 0xc9, 0x07, 0x40], 0xe1e8be0c, " 2P"),
    RomRegion::new(0x0800, 0x0400, &[0x08, 0xe6, 0xee, 0x26, 0x81, 0xfe, 0xc6, 0x19, 0xe0, 0x35], 0x5d69c0ba, "2XE"),
    RomRegion::new(0x0C00, 0x0400, &[0x35, 0xc0, 0x1e, 0x16, 0x2d, 0xff, 0x35, 0x26, 0x20, 0x0f], 0xaf3cd4ec, " 2M"),
    RomRegion::new(0x1000, 0x0400, &[0x32, 0x93, 0x21, 0xc9, 0x21, 0x33, 0x3a, 0x10, 0x21, 0x72], 0xa1c12ee8, "2XF"),
    RomRegion::new(0x1400, 0x0400, &[0x12, 0xc9, 0x01, 0x83, 0xa0, 0x7e, 0x81, 0x3e, 0xca, 0x3a], 0x64426a6f, " 2L"),
    RomRegion::new(0x1800, 0x0400, &[0x03, 0x32, 0x81, 0x32, 0xd0, 0x18, 0x95, 0x81, 0xcd, 0xe6], 0x0885bb42, "2XH"),
    RomRegion::new(0x1C00, 0x0400, &[0x1c, 0x3e, 0xc3, 0x20, 0x28, 0x21, 0x24, 0xe8, 0x06, 0x11], 0x00e00a12, " 2J"),
    RomRegion::new(0x2000, 0x0400, &[0x80, 0x80, 0x80, 0x20, 0x12, 0x00, 0x12, 0xc6, 0x81, 0x7a], 0xf66af3ab, "2XJ"),
    RomRegion::new(0x2400, 0x0400, &[0x6f, 0xed, 0xe6, 0x22, 0xef, 0x02, 0x42, 0x24, 0x85, 0x16], 0x732b1e3e, " 2H"),
    RomRegion::new(0x2800, 0x0400, &[0x0f, 0x0f, 0x0f, 0x0f, 0xf0, 0xff, 0xf0, 0xf0, 0xff, 0xf0], 0xfb881a59, "2XL"),
    RomRegion::new(0x2C00, 0x0400, &[0x77, 0x55, 0x33, 0xff, 0x33, 0xcc, 0xee, 0x00, 0x00, 0xcc], 0x12c04c70, " 2F"),
];

fn tables(rom: &[RomRegion<Hooks>], offset: u32) -> GameTables<Hooks> {
    GameTables::builder()
        .rom(rom)
        .ram(&RAM)
        .ram_byte_only(&RAM_BYTE_ONLY)
        .ram_write_only(&RAM_WRITE_ONLY)
        .input(&INPUT)
        .output(&OUTPUT)
        .custom(&CUSTOM)
        .build()
        .with_offset(offset)
}

fn build<B: Board + 'static>(
    board: B,
    rom: &[RomRegion<Hooks>],
    offset: u32,
) -> Result<GenericGame<Hooks>, TableError> {
    let cpu = Box::new(Z80Cpu::new(board).with_vram(BK_VRAM + offset));
    GenericGame::new(cpu, ScrambleHooks { offset }, tables(rom, offset))
}

pub fn create<B: Board + 'static>(board: B) -> Result<Box<dyn Game>, TableError> {
    Ok(Box::new(build(board, &SCRAMBLE_ROM, 0)?))
}

pub fn create_hustler<B: Board + 'static>(board: B) -> Result<Box<dyn Game>, TableError> {
    Ok(Box::new(build(board, &HUSTLER_ROM, HUSTLER_OFFSET)?))
}

#[cfg(test)]
mod tests {
    use incircuit_common::{Error, Key};
    use incircuit_cpu::sim::{InterruptModel, SharedMemory, SimMemory, Space, Z80Target};
    use incircuit_hal::sim::{SimBoard, SimConfig};

    use super::*;

    fn rig(memory: SimMemory, tick_us: u64) -> (SharedMemory, SimBoard) {
        let board = SimBoard::new(SimConfig::builder().tick_us(tick_us).build());
        let memory = memory.shared();
        board.attach(Z80Target::new(memory.clone()));
        (memory, board)
    }

    /// A VBLANK latch on slow frames, 4 a second.
    fn frame_latch(mask_address: u16) -> SimMemory {
        SimMemory::new().interrupt(
            Interrupt::Nmi,
            InterruptModel::Latched {
                mask_address,
                period_us: 250_000,
            },
        )
    }

    #[test]
    fn blank_board_fails_on_the_first_address_line() {
        let (_memory, board) = rig(SimMemory::new(), 1);
        let mut game = create(board).unwrap();
        assert_eq!(
            game.rom_check_all().unwrap_err().to_string(),
            "E: 2C 0001 32 00"
        );
    }

    #[test]
    fn vblank_latch_passes_the_interrupt_check() {
        let (memory, board) = rig(frame_latch(0x6801).recording(), 10);
        let mut game = create(board).unwrap();
        assert_eq!(game.interrupt_check(), Ok(Status::Ok));
        let memory = memory.borrow();
        let masks: Vec<u8> = memory
            .accesses()
            .iter()
            .filter(|a| a.write && a.address == 0x6801)
            .map(|a| a.data)
            .collect();
        assert_eq!(masks, [0x01, 0x00, 0x01, 0x00].repeat(4));
    }

    #[test]
    fn latch_that_ignores_the_mask_is_unexpected() {
        let memory = SimMemory::new().interrupt(Interrupt::Nmi, InterruptModel::Stuck(true));
        let (_memory, board) = rig(memory, 10);
        let mut game = create(board).unwrap();
        assert_eq!(game.interrupt_check(), Err(Error::Unexpected));
    }

    #[test]
    fn missing_vblank_times_out() {
        let (_memory, board) = rig(SimMemory::new(), 10);
        let mut game = create(board).unwrap();
        assert_eq!(game.interrupt_check(), Err(Error::Timeout));
    }

    #[test]
    fn hustler_moves_the_latch_and_ppis() {
        let (memory, board) = rig(frame_latch(0xA801).recording(), 10);
        let mut game = create_hustler(board).unwrap();
        assert_eq!(game.interrupt_check(), Ok(Status::Ok));

        memory.borrow_mut().clear_log();
        memory.borrow_mut().poke(Space::Memory, 0xC202, 0x5A);
        assert_eq!(
            game.input_read(Key::Up),
            Ok(Status::message(" s1E FF Port A"))
        );
        for _ in 0..3 {
            game.input_read(Key::Up).unwrap();
        }
        assert_eq!(game.input_read(Key::Select), Ok(Status::message("OK: 50")));

        let memory = memory.borrow();
        let accesses = memory.accesses();
        assert_eq!((accesses[0].address, accesses[0].data), (0xC203, 0x88));
        assert!(accesses[0].write);
        assert_eq!(accesses[1].address, 0xC202);
    }

    #[test]
    fn ppi_outputs_set_the_mode_first() {
        let (memory, board) = rig(SimMemory::new().recording(), 1);
        let mut game = create(board).unwrap();
        for _ in 0..7 {
            game.output_write(Key::Up).unwrap();
        }
        assert_eq!(
            game.output_write(Key::Select),
            Ok(Status::message("OK:On  FF"))
        );
        let memory = memory.borrow();
        let writes: Vec<(u16, u8)> = memory
            .accesses()
            .iter()
            .filter(|a| a.write)
            .map(|a| (a.address, a.data))
            .collect();
        assert_eq!(writes, vec![(0x8203, 0x88), (0x8200, 0xFF)]);
    }

    #[test]
    fn ram_passes_including_the_hblank_gated_vram() {
        let memory = SimMemory::new().hold_window(0x4800..=0x4BFF, 64, 16);
        let (_memory, board) = rig(memory, 1);
        let mut game = create(board).unwrap();
        assert_eq!(game.ram_check_all(), Ok(Status::Ok));
    }

    #[test]
    fn bus_check_needs_the_vram_wait_to_follow_hblank() {
        let memory = SimMemory::new().hold_window(0x4800..=0x4BFF, 64, 16);
        let (_memory, board) = rig(memory, 1);
        assert_eq!(create(board).unwrap().bus_check(), Ok(Status::Ok));

        let (_memory, board) = rig(SimMemory::new(), 1);
        assert_eq!(
            create(board).unwrap().bus_check().unwrap_err().to_string(),
            "E:_WAIT24 Hi "
        );
    }

    #[test]
    fn hustler_checks_its_moved_vram() {
        let memory = SimMemory::new().hold_window(0x8800..=0x8BFF, 64, 16);
        let (_memory, board) = rig(memory, 1);
        assert_eq!(create_hustler(board).unwrap().bus_check(), Ok(Status::Ok));
    }

    #[test]
    fn clear_functions_fill_their_ram() {
        let memory = SimMemory::new().hold_window(0x4800..=0x4BFF, 64, 16);
        let (memory, board) = rig(memory, 1);
        let mut game = create(board).unwrap();
        assert_eq!(game.custom(Key::None), Ok(Status::message(" Clear Bk  ")));
        game.custom(Key::Select).unwrap();
        game.custom(Key::Up).unwrap();
        game.custom(Key::Select).unwrap();

        let memory = memory.borrow();
        assert!((0x4800..=0x4BFF).all(|a| memory.peek(Space::Memory, a) == 0x10));
        assert!((0x5000..=0x50FF).all(|a| memory.peek(Space::Memory, a) == 0x04));
    }
}
