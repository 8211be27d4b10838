use incircuit_common::hex::hex8;
use incircuit_common::{Result, Status};
use incircuit_cpu::Cpu;

use crate::region::{select_bank, InputRegion, OutputRegion};

pub struct IoCheck<'a, H> {
    cpu: &'a mut dyn Cpu,
    hooks: &'a mut H,
}

impl<'a, H> IoCheck<'a, H> {
    pub fn new(cpu: &'a mut dyn Cpu, hooks: &'a mut H) -> Self {
        Self { cpu, hooks }
    }

    pub fn input(&mut self, region: &InputRegion<H>) -> Result<Status> {
        select_bank(region.bank_switch, self.hooks, &mut *self.cpu)?;
        let received = self.cpu.memory_read(region.address)?;
        Ok(Status::Message(format!("OK:{}", hex8(received & region.mask))))
    }

    /// Drive the entry's bits to their active level, or back to idle.
    pub fn output(&mut self, region: &OutputRegion<H>, on: bool) -> Result<Status> {
        select_bank(region.bank_switch, self.hooks, &mut *self.cpu)?;
        let (data, text) = if on {
            (region.invert ^ region.active, "OK:On ")
        } else {
            (region.invert, "OK:Off")
        };
        self.cpu.memory_write(region.address, data)?;
        Ok(Status::Message(format!("{}{}", text, hex8(data))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCpu;

    struct NoHooks;

    #[test]
    fn input_shows_masked_value() {
        let mut cpu = MemoryCpu::new();
        cpu.memory.insert(0x8202, 0xA5);
        let prot = InputRegion::new(0x8202, 0xF0, "s1E", "Prot R");
        assert_eq!(
            IoCheck::new(&mut cpu, &mut NoHooks).input(&prot),
            Ok(Status::message("OK: A0"))
        );
    }

    #[test]
    fn output_applies_invert() {
        let mut cpu = MemoryCpu::new().logging();
        let fire = OutputRegion::new(0x1_0003, 0x02, 0x20, "S1 ", "Fire  ");
        let mut hooks = NoHooks;
        let mut io = IoCheck::new(&mut cpu, &mut hooks);
        assert_eq!(io.output(&fire, true), Ok(Status::message("OK:On  22")));
        assert_eq!(io.output(&fire, false), Ok(Status::message("OK:Off 20")));
        assert_eq!(cpu.writes(), vec![(0x1_0003, 0x22), (0x1_0003, 0x20)]);
    }
}
