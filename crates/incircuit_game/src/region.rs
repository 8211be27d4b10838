//! Region records: the static description of what a board has where.
//!
//! Every record is generic over `H`, the per-board hook state handed to bank
//! switches and custom functions alongside the CPU.

use incircuit_common::{Result, Status};
use incircuit_cpu::Cpu;

/// Selects the logical view a record belongs to before it is accessed.
pub type BankSwitch<H> = fn(&mut H, &mut dyn Cpu) -> Result<()>;

/// A board specific procedure run from the custom menu.
pub type CustomFn<H> = fn(&mut H, &mut dyn Cpu) -> Result<Status>;

pub struct RomRegion<H> {
    pub start: u32,
    pub length: u32,
    /// Expected bytes at `start + 2^n` for every `2^n < length`. Empty skips
    /// the address line check.
    pub data2n: &'static [u8],
    pub crc: u32,
    pub location: &'static str,
    pub bank_switch: Option<BankSwitch<H>>,
}

impl<H> RomRegion<H> {
    pub const fn new(
        start: u32,
        length: u32,
        data2n: &'static [u8],
        crc: u32,
        location: &'static str,
    ) -> Self {
        Self {
            start,
            length,
            data2n,
            crc,
            location,
            bank_switch: None,
        }
    }

    pub const fn switched(mut self, bank_switch: BankSwitch<H>) -> Self {
        self.bank_switch = Some(bank_switch);
        self
    }
}

/// RAM (or write-only latch RAM) over `start..=end` in steps of `step`,
/// compared through `mask`.
pub struct RamRegion<H> {
    pub start: u32,
    pub end: u32,
    pub step: u32,
    pub mask: u16,
    pub location: &'static str,
    pub description: &'static str,
    pub bank_switch: Option<BankSwitch<H>>,
}

impl<H> RamRegion<H> {
    pub const fn new(
        start: u32,
        end: u32,
        mask: u16,
        location: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            start,
            end,
            step: 1,
            mask,
            location,
            description,
            bank_switch: None,
        }
    }

    pub const fn stepped(mut self, step: u32) -> Self {
        self.step = step;
        self
    }

    pub const fn switched(mut self, bank_switch: BankSwitch<H>) -> Self {
        self.bank_switch = Some(bank_switch);
        self
    }
}

pub struct InputRegion<H> {
    pub address: u32,
    pub mask: u16,
    pub location: &'static str,
    pub description: &'static str,
    pub bank_switch: Option<BankSwitch<H>>,
}

impl<H> InputRegion<H> {
    pub const fn new(
        address: u32,
        mask: u16,
        location: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            address,
            mask,
            location,
            description,
            bank_switch: None,
        }
    }

    pub const fn switched(mut self, bank_switch: BankSwitch<H>) -> Self {
        self.bank_switch = Some(bank_switch);
        self
    }
}

/// An output latch. `active` holds the bits this entry toggles, `invert`
/// the bits whose idle level is high.
pub struct OutputRegion<H> {
    pub address: u32,
    pub active: u16,
    pub invert: u16,
    pub location: &'static str,
    pub description: &'static str,
    pub bank_switch: Option<BankSwitch<H>>,
}

impl<H> OutputRegion<H> {
    pub const fn new(
        address: u32,
        active: u16,
        invert: u16,
        location: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            address,
            active,
            invert,
            location,
            description,
            bank_switch: None,
        }
    }

    pub const fn switched(mut self, bank_switch: BankSwitch<H>) -> Self {
        self.bank_switch = Some(bank_switch);
        self
    }
}

pub struct CustomFunction<H> {
    pub function: CustomFn<H>,
    pub description: &'static str,
}

impl<H> CustomFunction<H> {
    pub const fn new(function: CustomFn<H>, description: &'static str) -> Self {
        Self {
            function,
            description,
        }
    }
}

// Records only hold `fn` pointers over `H`, so `H` itself need not be Clone.
macro_rules! impl_copy {
    ($($record:ident),*) => {
        $(
            impl<H> Clone for $record<H> {
                fn clone(&self) -> Self {
                    *self
                }
            }

            impl<H> Copy for $record<H> {}
        )*
    };
}

impl_copy!(RomRegion, RamRegion, InputRegion, OutputRegion, CustomFunction);

/// Run the record's bank switch, if it has one.
pub(crate) fn select_bank<H>(
    bank_switch: Option<BankSwitch<H>>,
    hooks: &mut H,
    cpu: &mut dyn Cpu,
) -> Result<()> {
    match bank_switch {
        Some(switch) => {
            log::debug!("bank switch before access");
            switch(hooks, cpu)
        }
        None => Ok(()),
    }
}
