//! Scramble sound board: a Z80 with two AY-3-8910s on IO ports and a bank
//! of RC filter selects written through memory.

use incircuit_common::{Error, Result, Status};
use incircuit_cpu::{Ay38910, AyPorts, Channel, Cpu, Interrupt, Z80Cpu};
use incircuit_hal::Board;

use crate::game::{BoardHooks, Game, GenericGame};
use crate::region::{CustomFunction, InputRegion, OutputRegion, RamRegion, RomRegion};
use crate::tables::{GameTables, TableError};

const AY_3D: Ay38910 = Ay38910::new(AyPorts::direct(0x1_0040, 0x1_0080));
const AY_3C: Ay38910 = Ay38910::new(AyPorts::direct(0x1_0010, 0x1_0020));

const FILTER_OFF: u32 = 0x9000;
/// Filter select pairs per chip and channel: 3C drives AV0-AV5, 3D AV6-AV11.
const FILTER_3C: [(u32, u32); 3] = [(0x9001, 0x9002), (0x9004, 0x9008), (0x9010, 0x9020)];
const FILTER_3D: [(u32, u32); 3] = [(0x9040, 0x9080), (0x9100, 0x9200), (0x9400, 0x9800)];

const HOLD_MS: u32 = 2000;

pub struct ScrambleSoundHooks;

impl BoardHooks for ScrambleSoundHooks {
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

fn ay_idle(_: &mut ScrambleSoundHooks, cpu: &mut dyn Cpu) -> Result<Status> {
    AY_3D.idle(cpu)?;
    AY_3C.idle(cpu)?;
    Ok(Status::Ok)
}

fn ay_check(_: &mut ScrambleSoundHooks, cpu: &mut dyn Cpu) -> Result<Status> {
    AY_3D.check(cpu)?;
    AY_3C.check(cpu)?;
    Ok(Status::Ok)
}

/// Play noise on one channel, stepping it through its two filters and then
/// none, holding each long enough to hear.
fn noise_through_filters(
    cpu: &mut dyn Cpu,
    ay: &Ay38910,
    channel: Channel,
    filters: (u32, u32),
) -> Result<Status> {
    ay.noise(cpu, channel)?;
    cpu.delay_ms(HOLD_MS);
    cpu.memory_write(filters.0, 0)?;
    cpu.delay_ms(HOLD_MS);
    cpu.memory_write(filters.1, 0)?;
    cpu.delay_ms(HOLD_MS);
    cpu.memory_write(FILTER_OFF, 0)?;
    ay.idle(cpu)?;
    Ok(Status::Ok)
}

macro_rules! noise_fn {
    ($name:ident, $ay:expr, $channel:expr, $filters:expr) => {
        fn $name(_: &mut ScrambleSoundHooks, cpu: &mut dyn Cpu) -> Result<Status> {
            noise_through_filters(cpu, &$ay, $channel, $filters)
        }
    };
}

noise_fn!(ay_3d_a, AY_3D, Channel::A, FILTER_3D[0]);
noise_fn!(ay_3d_b, AY_3D, Channel::B, FILTER_3D[1]);
noise_fn!(ay_3d_c, AY_3D, Channel::C, FILTER_3D[2]);
noise_fn!(ay_3c_a, AY_3C, Channel::A, FILTER_3C[0]);
noise_fn!(ay_3c_b, AY_3C, Channel::B, FILTER_3C[1]);
noise_fn!(ay_3c_c, AY_3C, Channel::C, FILTER_3C[2]);

type Hooks = ScrambleSoundHooks;

const RAM: [RamRegion<Hooks>; 2] = [
    RamRegion::new(0x8000, 0x83FF, 0x0F, " 6C", "Prog. "),
    RamRegion::new(0x8000, 0x83FF, 0xF0, " 6D", "Prog. "),
];

const RAM_BYTE_ONLY: [RamRegion<Hooks>; 1] = [RamRegion::new(0x8000, 0x83FF, 0xFF, "6CD", "Prog. ")];

const INPUT: [InputRegion<Hooks>; 2] = [
    InputRegion::new(0x1_0020, 0xFF, " 3C", "AY1 Rd"),
    InputRegion::new(0x1_0080, 0xFF, " 3D", "AY0 Rd"),
];

const OUTPUT: [OutputRegion<Hooks>; 17] = [
    OutputRegion::new(0x1_0010, 0x0F, 0x00, " 3C", "AY1 Ad"),
    OutputRegion::new(0x1_0020, 0xFF, 0x00, " 3C", "AY1 Wr"),
    OutputRegion::new(0x1_0040, 0x0F, 0x00, " 3D", "AY0 Ad"),
    OutputRegion::new(0x1_0080, 0xFF, 0x00, " 3D", "AY0 Wr"),
    OutputRegion::new(FILTER_OFF, 0xFF, 0x00, " 6E", "F Clr "),
    OutputRegion::new(0x9001, 0xFF, 0x00, " 6E", "F AV0 "),
    OutputRegion::new(0x9002, 0xFF, 0x00, " 6E", "F AV1 "),
    OutputRegion::new(0x9004, 0xFF, 0x00, " 7E", "F AV2 "),
    OutputRegion::new(0x9008, 0xFF, 0x00, " 7E", "F AV3 "),
    OutputRegion::new(0x9010, 0xFF, 0x00, " 6F", "F AV4 "),
    OutputRegion::new(0x9020, 0xFF, 0x00, " 6F", "F AV5 "),
    OutputRegion::new(0x9040, 0xFF, 0x00, " 7F", "F AV6 "),
    OutputRegion::new(0x9080, 0xFF, 0x00, " 7F", "F AV7 "),
    OutputRegion::new(0x9100, 0xFF, 0x00, " 6G", "F AV8 "),
    OutputRegion::new(0x9200, 0xFF, 0x00, " 6G", "F AV9 "),
    OutputRegion::new(0x9400, 0xFF, 0x00, " 6H", "F AV10"),
    OutputRegion::new(0x9800, 0xFF, 0x00, " 6H", "F AV11"),
];

const CUSTOM: [CustomFunction<Hooks>; 8] = [
    CustomFunction::new(ay_idle, "AY Idle   "),
    CustomFunction::new(ay_check, "AY Check  "),
    CustomFunction::new(ay_3d_a, "AY 3D CHA "),
    CustomFunction::new(ay_3d_b, "AY 3D CHB "),
    CustomFunction::new(ay_3d_c, "AY 3D CHC "),
    CustomFunction::new(ay_3c_a, "AY 3C CHA "),
    CustomFunction::new(ay_3c_b, "AY 3C CHB "),
    CustomFunction::new(ay_3c_c, "AY 3C CHC "),
];

pub const ROM: [RomRegion<Hooks>; 3] = [
    RomRegion::new(0x0000, 0x0800, &[0x72, 0x02, 0xff, 0xff, 0xff, 0xff, 0xb7, 0xfe, 0x02, 0xbe, 0x00], 0xbcd297f0, " 5C"),
    RomRegion::new(0x0800, 0x0800, &[0x80, 0x77, 0xb7, 0x08, 0x08, 0xfe, 0xaf, 0x00, 0x21, 0x80, 0x0d], 0xde7912da, " 5D"),
    RomRegion::new(0x1000, 0x0800, &[0x8c, 0x8f, 0x88, 0x8f, 0x09, 0x83, 0x0d, 0x85, 0xcd, 0x04, 0x1c], 0xba2fa933, " 5E"),
];

pub fn create<B: Board + 'static>(board: B) -> Result<Box<dyn Game>, TableError> {
    let tables = GameTables::builder()
        .rom(&ROM)
        .ram(&RAM)
        .ram_byte_only(&RAM_BYTE_ONLY)
        .input(&INPUT)
        .output(&OUTPUT)
        .custom(&CUSTOM)
        .build();
    let game = GenericGame::new(Box::new(Z80Cpu::new(board)), ScrambleSoundHooks, tables)?;
    Ok(Box::new(game))
}

#[cfg(test)]
mod tests {
    use incircuit_common::Key;
    use incircuit_cpu::sim::{Ay38910Chip, AyDataPort, AyLatchPort, SharedAy, SharedMemory, SimMemory, Space, Z80Target};
    use incircuit_hal::sim::{SimBoard, SimConfig};

    use super::*;

    fn rig() -> (SimBoard, SharedMemory, SharedAy, SharedAy) {
        let chip_3d = Ay38910Chip::new().shared();
        let chip_3c = Ay38910Chip::new().shared();
        let memory = SimMemory::new()
            .map(Space::Io, 0x40..=0x40, AyLatchPort::new(chip_3d.clone()))
            .map(Space::Io, 0x80..=0x80, AyDataPort::new(chip_3d.clone()))
            .map(Space::Io, 0x10..=0x10, AyLatchPort::new(chip_3c.clone()))
            .map(Space::Io, 0x20..=0x20, AyDataPort::new(chip_3c.clone()))
            .recording()
            .shared();
        let board = SimBoard::new(SimConfig::builder().build());
        board.attach(Z80Target::new(memory.clone()));
        (board, memory, chip_3d, chip_3c)
    }

    #[test]
    fn both_chips_pass_the_ay_check() {
        let (board, _memory, _, _) = rig();
        let mut game = create(board).unwrap();
        game.custom(Key::Up).unwrap();
        assert_eq!(game.custom(Key::Select), Ok(Status::Ok));
    }

    #[test]
    fn noise_steps_through_the_filters_then_silences() {
        let (board, memory, chip_3d, _) = rig();
        let mut game = create(board.clone()).unwrap();
        for _ in 0..3 {
            game.custom(Key::Up).unwrap();
        }
        let before = board.now_us();
        assert_eq!(game.custom(Key::Select), Ok(Status::Ok));
        assert!(board.now_us() - before >= 6_000_000);

        let memory = memory.borrow();
        let filters: Vec<u16> = memory
            .accesses()
            .iter()
            .filter(|a| a.write && a.space == Space::Memory)
            .map(|a| a.address)
            .collect();
        assert_eq!(filters, vec![0x9100, 0x9200, 0x9000]);
        assert!((0..16).all(|r| chip_3d.borrow().register(r) == 0));
    }

    #[test]
    fn missing_chip_fails_the_ay_check() {
        let board = SimBoard::new(SimConfig::builder().build());
        board.attach(Z80Target::new(SimMemory::new().shared()));
        let mut game = create(board).unwrap();
        game.custom(Key::Up).unwrap();
        assert!(game.custom(Key::Select).is_err());
    }

    #[test]
    fn interrupt_check_is_not_implemented() {
        let (board, _memory, _, _) = rig();
        let mut game = create(board).unwrap();
        assert_eq!(game.interrupt_check(), Err(Error::NotImplemented));
    }
}
