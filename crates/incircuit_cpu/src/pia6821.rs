//! A 6821 PIA used as the bus master for the chips hanging off its ports.
//!
//! Some sound boards pin-drive their AY-3-8910s from a 6821: port A is the
//! bidirectional data bus and port B carries the chip select and direction
//! lines. The proxy does not interpret port B; the "address" of each access
//! is the port B pattern that selects the wanted operation, and `port_idle`
//! is the pattern that deselects everything.

use incircuit_common::{check_u8, Result};

use crate::{Cpu, Interrupt};

/// Register offsets from the PIA base.
const PR_DDR_A: u32 = 0x0;
const CR_A: u32 = 0x1;
const PR_DDR_B: u32 = 0x2;
const CR_B: u32 = 0x3;

/// Control register bit 2 selects the peripheral register over the DDR.
const CR_DDR: u16 = 0x00;
const CR_PR: u16 = 0x04;

pub struct Pia6821Proxy<C> {
    cpu: C,
    base: u32,
    port_idle: u8,
}

impl<C: Cpu> Pia6821Proxy<C> {
    pub fn new(cpu: C, base: u32, port_idle: u8) -> Self {
        Self {
            cpu,
            base,
            port_idle,
        }
    }

    fn write_register(&mut self, offset: u32, data: u16) -> Result<()> {
        self.cpu.memory_write(self.base + offset, data)
    }

    fn read_register(&mut self, offset: u32) -> Result<u16> {
        self.cpu.memory_read(self.base + offset)
    }

    /// Switch port A direction, leaving the control register pointing at the
    /// peripheral register.
    fn port_a_direction(&mut self, ddr: u16) -> Result<()> {
        self.write_register(CR_A, CR_DDR)?;
        self.write_register(PR_DDR_A, ddr)?;
        self.write_register(CR_A, CR_PR)
    }
}

impl<C: Cpu> Cpu for Pia6821Proxy<C> {
    fn idle(&mut self) -> Result<()> {
        self.port_a_direction(0x00)?;

        // Idle pattern is latched before port B becomes an output.
        let idle = u16::from(self.port_idle);
        self.write_register(CR_B, CR_PR)?;
        self.write_register(PR_DDR_B, idle)?;
        self.write_register(CR_B, CR_DDR)?;
        self.write_register(PR_DDR_B, 0xFF)?;
        self.write_register(CR_B, CR_PR)
    }

    /// Port A floats high as an input, and as an output reads back each
    /// walking bit.
    fn check(&mut self) -> Result<()> {
        let floating = self.read_register(PR_DDR_A)?;
        check_u8("PAf", floating, 0xFF)?;

        self.write_register(PR_DDR_A, 0xFF)?;
        self.port_a_direction(0xFF)?;

        for bit in 0..8 {
            let pattern = 1u16 << bit;
            self.write_register(PR_DDR_A, pattern)?;
            let received = self.read_register(PR_DDR_A)?;
            check_u8("PAx", received, pattern)?;
        }

        self.write_register(PR_DDR_A, 0xFF)?;
        self.port_a_direction(0x00)
    }

    fn memory_read(&mut self, address: u32) -> Result<u16> {
        self.write_register(PR_DDR_B, (address & 0xFF) as u16)?;
        let data = self.read_register(PR_DDR_A)?;
        self.write_register(PR_DDR_B, u16::from(self.port_idle))?;
        Ok(data)
    }

    fn memory_write(&mut self, address: u32, data: u16) -> Result<()> {
        self.write_register(PR_DDR_A, data & 0xFF)?;
        self.port_a_direction(0xFF)?;

        self.write_register(PR_DDR_B, (address & 0xFF) as u16)?;
        self.write_register(PR_DDR_B, u16::from(self.port_idle))?;

        self.port_a_direction(0x00)?;
        self.write_register(PR_DDR_A, 0x00)
    }

    fn wait_for_interrupt(
        &mut self,
        _interrupt: Interrupt,
        _active: bool,
        _timeout_ms: u32,
    ) -> Result<()> {
        Err(incircuit_common::Error::NotImplemented)
    }

    fn acknowledge_interrupt(&mut self) -> Result<u16> {
        Ok(0)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.cpu.delay_ms(ms);
    }
}

#[cfg(test)]
mod tests {
    use incircuit_common::Error;

    use super::*;

    /// Records register traffic and answers port A from a fixed value.
    struct Recorder {
        log: Vec<(u32, u16, bool)>,
        port_a: u16,
    }

    impl Cpu for Recorder {
        fn idle(&mut self) -> Result<()> {
            Ok(())
        }

        fn check(&mut self) -> Result<()> {
            Ok(())
        }

        fn memory_read(&mut self, address: u32) -> Result<u16> {
            self.log.push((address, self.port_a, false));
            Ok(self.port_a)
        }

        fn memory_write(&mut self, address: u32, data: u16) -> Result<()> {
            self.log.push((address, data, true));
            Ok(())
        }

        fn wait_for_interrupt(&mut self, _: Interrupt, _: bool, _: u32) -> Result<()> {
            Ok(())
        }

        fn acknowledge_interrupt(&mut self) -> Result<u16> {
            Ok(0)
        }

        fn delay_ms(&mut self, _ms: u32) {}
    }

    fn recorder(port_a: u16) -> Recorder {
        Recorder {
            log: Vec::new(),
            port_a,
        }
    }

    #[test]
    fn write_drives_port_a_around_the_strobe() {
        let mut inner = recorder(0);
        let mut pia = Pia6821Proxy::new(&mut inner, 0x400C, 0x00);
        pia.memory_write(0x02, 0x5A).unwrap();
        let writes: Vec<(u32, u16)> = inner.log.iter().map(|(a, d, _)| (*a, *d)).collect();
        assert_eq!(
            writes,
            vec![
                (0x400C, 0x5A),
                (0x400D, 0x00),
                (0x400C, 0xFF),
                (0x400D, 0x04),
                (0x400E, 0x02),
                (0x400E, 0x00),
                (0x400D, 0x00),
                (0x400C, 0x00),
                (0x400D, 0x04),
                (0x400C, 0x00),
            ]
        );
    }

    #[test]
    fn read_selects_then_deselects() {
        let mut inner = recorder(0x3C);
        let mut pia = Pia6821Proxy::new(&mut inner, 0x400C, 0x00);
        assert_eq!(pia.memory_read(0x01).unwrap(), 0x3C);
        assert_eq!(
            inner.log,
            vec![(0x400E, 0x01, true), (0x400C, 0x3C, false), (0x400E, 0x00, true)]
        );
    }

    #[test]
    fn check_flags_port_a_not_floating() {
        let mut inner = recorder(0x7F);
        let mut pia = Pia6821Proxy::new(&mut inner, 0x400C, 0x00);
        assert_eq!(
            pia.check(),
            Err(Error::Custom("E:PAf FF 7F".to_string()))
        );
    }
}
