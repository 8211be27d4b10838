pub mod bus;
pub mod pin;
pub mod pin_map;
pub mod sim;

pub use bus::Bus;
pub use incircuit_common::{Connection, Level, PinMode};
pub use pin::Pin;
pub use pin_map::PinMap;

/// Host side of the test header.
///
/// Drivers only ever touch the target through this trait, so the same bus
/// protocol code runs against real GPIO or against [`sim::SimBoard`].
pub trait Board {
    fn pin_mode(&mut self, gpio: u8, mode: PinMode);
    fn digital_write(&mut self, gpio: u8, level: Level);
    fn digital_read(&mut self, gpio: u8) -> Level;

    /// Enter a timing critical section. Host timer interrupts stay masked
    /// until [`Board::interrupts`] is called.
    fn no_interrupts(&mut self);
    fn interrupts(&mut self);

    /// Milliseconds since start-up, used for timeout deadlines.
    fn millis(&mut self) -> u32;
    fn delay_ms(&mut self, ms: u32);
}

impl<B: Board + ?Sized> Board for &mut B {
    fn pin_mode(&mut self, gpio: u8, mode: PinMode) {
        (**self).pin_mode(gpio, mode)
    }

    fn digital_write(&mut self, gpio: u8, level: Level) {
        (**self).digital_write(gpio, level)
    }

    fn digital_read(&mut self, gpio: u8) -> Level {
        (**self).digital_read(gpio)
    }

    fn no_interrupts(&mut self) {
        (**self).no_interrupts()
    }

    fn interrupts(&mut self) {
        (**self).interrupts()
    }

    fn millis(&mut self) -> u32 {
        (**self).millis()
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

impl<B: Board + ?Sized> Board for Box<B> {
    fn pin_mode(&mut self, gpio: u8, mode: PinMode) {
        (**self).pin_mode(gpio, mode)
    }

    fn digital_write(&mut self, gpio: u8, level: Level) {
        (**self).digital_write(gpio, level)
    }

    fn digital_read(&mut self, gpio: u8) -> Level {
        (**self).digital_read(gpio)
    }

    fn no_interrupts(&mut self) {
        (**self).no_interrupts()
    }

    fn interrupts(&mut self) {
        (**self).interrupts()
    }

    fn millis(&mut self) -> u32 {
        (**self).millis()
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}
