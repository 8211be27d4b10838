//! Zaccaria Cat'n Mouse sound board (6802). There is no external RAM; the
//! two AY-3-8910s at 1H and 1I hang off the 6821 at 1G, port A as their data
//! bus and port B as their BC1/BDIR pairs.

use incircuit_common::{Error, Result, Status};
use incircuit_cpu::{Ay38910, AyPorts, Channel, Cpu, Interrupt, M6802Cpu, Pia6821Proxy};
use incircuit_hal::Board;

use crate::game::{BoardHooks, Game, GenericGame};
use crate::region::{CustomFunction, InputRegion, OutputRegion, RomRegion};
use crate::tables::{GameTables, TableError};

const PIA_1G: u32 = 0x400C;
/// Port B with both AYs inactive.
const PORT_B_IDLE: u8 = 0x00;

/// Port B codes: PB0/PB1 drive 1H, PB2/PB3 drive 1I.
const AY_1H: Ay38910 = Ay38910::new(AyPorts {
    latch: 0x03,
    write: 0x02,
    read: 0x01,
});
const AY_1I: Ay38910 = Ay38910::new(AyPorts {
    latch: 0x0C,
    write: 0x08,
    read: 0x04,
});

const HOLD_MS: u32 = 2000;

pub struct CatnMouseSoundHooks;

impl BoardHooks for CatnMouseSoundHooks {
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

/// The PIA at 1G, put back in its idle configuration.
fn pia(cpu: &mut dyn Cpu) -> Result<Pia6821Proxy<&mut dyn Cpu>> {
    let mut pia = Pia6821Proxy::new(cpu, PIA_1G, PORT_B_IDLE);
    pia.idle()?;
    Ok(pia)
}

fn pia_check(_: &mut CatnMouseSoundHooks, cpu: &mut dyn Cpu) -> Result<Status> {
    let mut pia = pia(cpu)?;
    pia.check()?;
    pia.idle()?;
    Ok(Status::Ok)
}

fn ay_idle(_: &mut CatnMouseSoundHooks, cpu: &mut dyn Cpu) -> Result<Status> {
    let mut pia = pia(cpu)?;
    AY_1H.idle(&mut pia)?;
    AY_1I.idle(&mut pia)?;
    Ok(Status::Ok)
}

fn ay_check(_: &mut CatnMouseSoundHooks, cpu: &mut dyn Cpu) -> Result<Status> {
    let mut pia = pia(cpu)?;
    AY_1H.check(&mut pia)?;
    AY_1I.check(&mut pia)?;
    Ok(Status::Ok)
}

fn noise(cpu: &mut dyn Cpu, ay: &Ay38910, channel: Channel) -> Result<Status> {
    let mut pia = pia(cpu)?;
    ay.noise(&mut pia, channel)?;
    pia.delay_ms(HOLD_MS);
    ay.idle(&mut pia)?;
    Ok(Status::Ok)
}

macro_rules! noise_fn {
    ($name:ident, $ay:expr, $channel:expr) => {
        fn $name(_: &mut CatnMouseSoundHooks, cpu: &mut dyn Cpu) -> Result<Status> {
            noise(cpu, &$ay, $channel)
        }
    };
}

noise_fn!(ay_1h_a, AY_1H, Channel::A);
noise_fn!(ay_1h_b, AY_1H, Channel::B);
noise_fn!(ay_1h_c, AY_1H, Channel::C);
noise_fn!(ay_1i_a, AY_1I, Channel::A);
noise_fn!(ay_1i_b, AY_1I, Channel::B);
noise_fn!(ay_1i_c, AY_1I, Channel::C);

type Hooks = CatnMouseSoundHooks;

const INPUT: [InputRegion<Hooks>; 1] = [InputRegion::new(PIA_1G, 0xFF, " 1G", "6821 0")];

const OUTPUT: [OutputRegion<Hooks>; 1] = [OutputRegion::new(PIA_1G, 0xFF, 0x00, " 1G", "6821 0")];

const CUSTOM: [CustomFunction<Hooks>; 9] = [
    CustomFunction::new(pia_check, "PIA Check "),
    CustomFunction::new(ay_idle, "AY Idle   "),
    CustomFunction::new(ay_check, "AY Check  "),
    CustomFunction::new(ay_1h_a, "AY 1H CHA "),
    CustomFunction::new(ay_1h_b, "AY 1H CHB "),
    CustomFunction::new(ay_1h_c, "AY 1H CHC "),
    CustomFunction::new(ay_1i_a, "AY 1I CHA "),
    CustomFunction::new(ay_1i_b, "AY 1I CHB "),
    CustomFunction::new(ay_1i_c, "AY 1I CHC "),
];

pub const ROM: [RomRegion<Hooks>; 3] = [
    RomRegion::new(0xC000, 0x1000, &[0x00, 0x00, 0x00, 0x8c, 0x00, 0x81, 0x00, 0x82, 0x81, 0x00, 0x81, 0x10], 0x473c44de, "1F "),
    RomRegion::new(0xE000, 0x1000, &[0x00, 0x00, 0x03, 0x5a, 0x00, 0x63, 0x00, 0x5b, 0x5b, 0x00, 0x46, 0x10], 0xf65cb9d0, "1D "),
    RomRegion::new(0xF000, 0x1000, &[0x8e, 0x00, 0xbd, 0x55, 0x07, 0xbd, 0xc6, 0x5a, 0x00, 0x02, 0x20, 0x05], 0x1bd90c93, "1E "),
];

pub fn create<B: Board + 'static>(board: B) -> Result<Box<dyn Game>, TableError> {
    let tables = GameTables::builder()
        .rom(&ROM)
        .input(&INPUT)
        .output(&OUTPUT)
        .custom(&CUSTOM)
        .build();
    let game = GenericGame::new(Box::new(M6802Cpu::new(board)), CatnMouseSoundHooks, tables)?;
    Ok(Box::new(game))
}
