use incircuit_common::{Error, Key, Result, Status};
use incircuit_cpu::{Cpu, Interrupt};

use super::{wait_then_absent, BoardHooks, Game, GenericGame};
use crate::region::{CustomFunction, InputRegion, OutputRegion, RamRegion, RomRegion};
use crate::tables::{GameTables, TableError};
use crate::testing::{rom_fixture, MemoryCpu, SharedCpu, FIXTURE_CRC, FIXTURE_DATA2N};

#[derive(Default)]
struct Board {
    custom_runs: u32,
}

impl BoardHooks for Board {}

fn pulse(board: &mut Board, cpu: &mut dyn Cpu) -> Result<Status> {
    board.custom_runs += 1;
    cpu.memory_write(0x9000, 0x01)?;
    Ok(Status::message("OK:Pulsed"))
}

fn silence(_board: &mut Board, cpu: &mut dyn Cpu) -> Result<Status> {
    cpu.memory_write(0x9000, 0x00)?;
    Ok(Status::Ok)
}

const ROM: [RomRegion<Board>; 2] = [
    RomRegion::new(0x0000, 0x0400, &FIXTURE_DATA2N, FIXTURE_CRC, " 2C"),
    RomRegion::new(0x0400, 0x0400, &[], 0xDEAD_BEEF, " 2E"),
];

const RAM: [RamRegion<Board>; 2] = [
    RamRegion::new(0x4000, 0x43FF, 0x0F, " 1K", "Prog. "),
    RamRegion::new(0x4000, 0x43FF, 0xF0, " 1G", ""),
];

const INPUT: [InputRegion<Board>; 2] = [
    InputRegion::new(0x7000, 0xFF, " 5C", "WD Res"),
    InputRegion::new(0x8202, 0xF0, "s1E", "Prot R"),
];

const OUTPUT: [OutputRegion<Board>; 1] = [OutputRegion::new(0x6804, 0x01, 0x00, " 5B", "Stars ")];

const CUSTOM: [CustomFunction<Board>; 2] = [
    CustomFunction::new(pulse, "Pulse     "),
    CustomFunction::new(silence, "Silence   "),
];

fn rig() -> (SharedCpu, GenericGame<Board>) {
    let cpu = SharedCpu::new(MemoryCpu::new().with_rom(0x0000, &rom_fixture()).logging());
    let tables = GameTables::builder()
        .rom(&ROM)
        .ram(&RAM)
        .ram_byte_only(&[RamRegion::new(0x4000, 0x40FF, 0xFF, "1KG", "")])
        .input(&INPUT)
        .output(&OUTPUT)
        .custom(&CUSTOM)
        .build();
    let game = GenericGame::new(Box::new(cpu.clone()), Board::default(), tables).unwrap();
    (cpu, game)
}

#[test]
fn construction_idles_the_bus_once() {
    let (cpu, mut game) = rig();
    assert_eq!(cpu.0.borrow().idles, 1);
    assert_eq!(game.bus_check(), Ok(Status::Ok));
    assert_eq!(cpu.0.borrow().idles, 2);
}

#[test]
fn construction_rejects_bad_tables() {
    let tables = GameTables::builder()
        .rom(&ROM)
        .custom(&[CustomFunction::new(pulse, "  ")])
        .build();
    let result = GenericGame::new(Box::new(MemoryCpu::new()), Board::default(), tables);
    assert_eq!(result.err(), Some(TableError::UnnamedCustom));
}

#[test]
fn rom_keys_move_and_describe() {
    let (_cpu, mut game) = rig();
    assert_eq!(
        game.rom_check(Key::None),
        Ok(Status::message(" 000000  FF  2C"))
    );
    assert_eq!(
        game.rom_crc(Key::Up),
        Ok(Status::message(" 000400  FF  2E"))
    );
    // Already on the last entry.
    game.rom_read(Key::Up).unwrap();
    assert_eq!(
        game.rom_crc(Key::Down),
        Ok(Status::message(" 000000  FF  2C"))
    );
    assert_eq!(game.rom_check(Key::Select), Ok(Status::Ok));
    assert_eq!(
        game.rom_crc(Key::Select),
        Ok(Status::message("OK: 2C B0EC246C"))
    );
    assert_eq!(
        game.rom_read(Key::Select),
        Ok(Status::message("OK: 03 0A 11 18"))
    );
}

#[test]
fn rom_check_all_reports_the_bad_rom() {
    let (_cpu, mut game) = rig();
    let error = game.rom_check_all().unwrap_err();
    assert!(matches!(
        error,
        Error::RomCrcMismatch {
            expected: 0xDEAD_BEEF,
            ..
        }
    ));
    assert_eq!(game.rom_read_all(), Ok(Status::Ok));
}

#[test]
fn ram_keys_share_one_selection() {
    let (_cpu, mut game) = rig();
    assert_eq!(
        game.ram_check(Key::Up),
        Ok(Status::message(" 004000  F0  1G"))
    );
    assert_eq!(
        game.ram_write_read(Key::None),
        Ok(Status::message(" 004000  F0  1G"))
    );
    assert_eq!(
        game.ram_write_read(Key::Select),
        Ok(Status::message("OK: 10 20 40 80"))
    );
    // The byte-only table keeps its own.
    assert_eq!(
        game.ram_check_random_access(Key::None),
        Ok(Status::message(" 004000  FF 1KG"))
    );
}

#[test]
fn ram_checks_run_against_good_ram() {
    let (_cpu, mut game) = rig();
    assert_eq!(game.ram_check_all(), Ok(Status::Ok));
    assert_eq!(game.ram_check_all_chip_select(), Ok(Status::Ok));
    assert_eq!(game.ram_check_all_random_access(), Ok(Status::Ok));
    assert_eq!(game.ram_check_address(Key::Select), Ok(Status::Ok));
}

#[test]
fn fills_cover_ram_and_reads_skip_write_only() {
    let cpu = SharedCpu::new(MemoryCpu::new().logging());
    let tables = GameTables::builder()
        .rom(&ROM)
        .ram(&[RamRegion::new(0x4000, 0x4001, 0xFF, " 1K", "")])
        .ram_write_only(&[RamRegion::new(0x5000, 0x5001, 0xFF, " 3L", "ObjRam")])
        .build();
    let mut game = GenericGame::new(Box::new(cpu.clone()), Board::default(), tables).unwrap();

    game.ram_write_all_address().unwrap();
    game.ram_write_all_high().unwrap();
    game.ram_read_all().unwrap();
    let memory = cpu.0.borrow();
    assert_eq!(
        memory.writes(),
        vec![
            (0x4000, 0x00),
            (0x4001, 0x01),
            (0x5000, 0x00),
            (0x5001, 0x01),
            (0x4000, 0xFF),
            (0x4001, 0xFF),
            (0x5000, 0xFF),
            (0x5001, 0xFF),
        ]
    );
    let reads: Vec<u32> = memory
        .log
        .iter()
        .filter(|(_, _, write)| !write)
        .map(|(address, _, _)| *address)
        .collect();
    assert_eq!(reads, vec![0x4000, 0x4001]);
}

#[test]
fn empty_tables_are_not_implemented() {
    let tables = GameTables::builder().rom(&ROM).build();
    let mut game = GenericGame::new(Box::new(MemoryCpu::new()), Board::default(), tables).unwrap();
    assert_eq!(game.ram_check_all(), Err(Error::NotImplemented));
    assert_eq!(game.ram_check_all_random_access(), Err(Error::NotImplemented));
    assert_eq!(game.ram_check(Key::Select), Err(Error::NotImplemented));
    assert_eq!(game.input_read(Key::Select), Err(Error::NotImplemented));
    assert_eq!(game.output_write(Key::Select), Err(Error::NotImplemented));
    assert_eq!(game.custom(Key::Select), Err(Error::NotImplemented));
}

#[test]
fn inputs_and_outputs() {
    let (cpu, mut game) = rig();
    cpu.0.borrow_mut().memory.insert(0x8202, 0x5A);

    assert_eq!(
        game.input_read(Key::None),
        Ok(Status::message("  5C FF WD Res"))
    );
    assert_eq!(
        game.input_read(Key::Up),
        Ok(Status::message(" s1E F0 Prot R"))
    );
    assert_eq!(game.input_read(Key::Select), Ok(Status::message("OK: 50")));

    assert_eq!(
        game.output_write(Key::Down),
        Ok(Status::message("  5B 01 Stars "))
    );
    assert_eq!(
        game.output_write(Key::Select),
        Ok(Status::message("OK:On  01"))
    );
    assert_eq!(
        game.output_write(Key::Select),
        Ok(Status::message("OK:Off 00"))
    );
    assert_eq!(
        game.output_write(Key::Select),
        Ok(Status::message("OK:On  01"))
    );
}

#[test]
fn custom_functions_run_with_board_state() {
    let (cpu, mut game) = rig();
    assert_eq!(game.custom(Key::None), Ok(Status::message(" Pulse     ")));
    assert_eq!(game.custom(Key::Select), Ok(Status::message("OK:Pulsed")));
    assert_eq!(game.custom(Key::Up), Ok(Status::message(" Silence   ")));
    assert_eq!(game.custom(Key::Select), Ok(Status::Ok));
    assert_eq!(game.hooks().custom_runs, 1);
    assert_eq!(cpu.0.borrow().peek(0x9000), 0x00);
}

#[test]
fn default_interrupt_check_waits_then_sees_it_clear() {
    let (cpu, mut game) = rig();
    {
        let mut memory = cpu.0.borrow_mut();
        for _ in 0..4 {
            memory.interrupts.push_back(Ok(()));
            memory.interrupts.push_back(Err(Error::Timeout));
        }
    }
    assert_eq!(game.interrupt_check(), Ok(Status::Ok));
    let waits = cpu.0.borrow().waits.clone();
    assert_eq!(waits.len(), 8);
    assert_eq!(waits[0], (Interrupt::Nmi, true, 3000));
    assert_eq!(waits[1], (Interrupt::Nmi, true, 0));
}

#[test]
fn interrupt_that_never_clears_is_unexpected() {
    let mut cpu = MemoryCpu::new();
    cpu.interrupts.extend([Ok(()), Ok(())]);
    assert_eq!(
        wait_then_absent(&mut cpu, Interrupt::Irq, None),
        Err(Error::Unexpected)
    );

    let mut cpu = MemoryCpu::new();
    assert_eq!(
        wait_then_absent(&mut cpu, Interrupt::Irq, None),
        Err(Error::Timeout)
    );
}

#[test]
fn wrong_vector_is_reported_with_the_round() {
    let mut cpu = MemoryCpu::new();
    cpu.vector = 0xCF;
    cpu.interrupts.push_back(Ok(()));
    assert_eq!(
        wait_then_absent(&mut cpu, Interrupt::Irq, Some(0xD7))
            .unwrap_err()
            .to_string(),
        "E:Int 0000 D7 CF"
    );
}
