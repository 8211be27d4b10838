//! Board-side models of each CPU socket, for running the drivers against
//! [`incircuit_hal::sim::SimBoard`].
//!
//! A target decodes the strobes a driver produces and answers from a shared
//! [`SimMemory`], the way the real board's decoders, RAM and latches would.

mod i8080;
mod i8085;
mod m6502;
mod m6802;
mod m6809e;
mod memory;
mod peripherals;
mod z80;

use incircuit_common::Connection;
use incircuit_hal::PinMap;

pub use i8080::I8080Target;
pub use i8085::I8085Target;
pub use m6502::M6502Target;
pub use m6802::M6802Target;
pub use m6809e::M6809ETarget;
pub use memory::{Access, InterruptModel, Mapped, SharedMemory, SimMemory, Space};
pub use peripherals::{Ay38910Chip, AyDataPort, AyLatchPort, Pia6821Chip, SharedAy};
pub use z80::Z80Target;

pub(crate) fn gpio(connection: Connection) -> u8 {
    PinMap::DIL40.gpio(connection.pin)
}

pub(crate) fn gpios(connections: &[Connection]) -> Vec<u8> {
    connections.iter().map(|c| gpio(*c)).collect()
}
