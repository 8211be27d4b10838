use incircuit_common::Connection;

/// Socket wiring of a 6809E-bus part. A connection with pin 0 is not
/// brought out on that package and is skipped by the driver.
#[derive(Copy, Clone, Debug)]
pub struct M6809EPinout {
    pub gnd: Connection,
    pub nmi: Connection,
    pub irq: Connection,
    pub firq: Connection,
    pub bs: Connection,
    pub ba: Connection,
    pub vcc: Connection,
    pub rw: Connection,
    pub busy: Connection,
    pub e: Connection,
    pub q: Connection,
    pub avma: Connection,
    pub reset: Connection,
    pub lic: Connection,
    pub tsc: Connection,
    pub halt: Connection,
    pub address: [Connection; 16],
    pub data: [Connection; 8],
}

pub const PINOUT_6809E: M6809EPinout = M6809EPinout {
    gnd: Connection::new(1, "GND"),
    nmi: Connection::new(2, "_NMI"),
    irq: Connection::new(3, "_IRQ"),
    firq: Connection::new(4, "_FIRQ"),
    bs: Connection::new(5, "BS"),
    ba: Connection::new(6, "BA"),
    vcc: Connection::new(7, "Vcc"),
    rw: Connection::new(32, "RW"),
    busy: Connection::new(33, "BUSY"),
    e: Connection::new(34, "E"),
    q: Connection::new(35, "Q"),
    avma: Connection::new(36, "AVMA"),
    reset: Connection::new(37, "_RESET"),
    lic: Connection::new(38, "LIC"),
    tsc: Connection::new(39, "TSC"),
    halt: Connection::new(40, "_HALT"),
    address: [
        Connection::new(8, "A0"),
        Connection::new(9, "A1"),
        Connection::new(10, "A2"),
        Connection::new(11, "A3"),
        Connection::new(12, "A4"),
        Connection::new(13, "A5"),
        Connection::new(14, "A6"),
        Connection::new(15, "A7"),
        Connection::new(16, "A8"),
        Connection::new(17, "A9"),
        Connection::new(18, "A10"),
        Connection::new(19, "A11"),
        Connection::new(20, "A12"),
        Connection::new(21, "A13"),
        Connection::new(22, "A14"),
        Connection::new(23, "A15"),
    ],
    data: [
        Connection::new(31, "D0"),
        Connection::new(30, "D1"),
        Connection::new(29, "D2"),
        Connection::new(28, "D3"),
        Connection::new(27, "D4"),
        Connection::new(26, "D5"),
        Connection::new(25, "D6"),
        Connection::new(24, "D7"),
    ],
};

/// Konami-1 custom 6809. The package has 42 pins, so the two bottom pins
/// (_HALT and GND) do not reach the 40 pin clip and every pin above 20 is
/// numbered two lower than on the part.
pub const PINOUT_KONAMI1: M6809EPinout = M6809EPinout {
    gnd: Connection::new(0, "GND"),
    nmi: Connection::new(21, "_NMI"),
    irq: Connection::new(22, "_IRQ"),
    firq: Connection::new(23, "_FIRQ"),
    bs: Connection::new(0, "BS"),
    ba: Connection::new(26, "BA"),
    vcc: Connection::new(27, "Vcc"),
    rw: Connection::new(13, "RW"),
    busy: Connection::new(0, "BUSY"),
    e: Connection::new(15, "E"),
    q: Connection::new(17, "Q"),
    avma: Connection::new(0, "AVMA"),
    reset: Connection::new(19, "_RESET"),
    lic: Connection::new(0, "LIC"),
    tsc: Connection::new(20, "TSC"),
    halt: Connection::new(0, "_HALT"),
    address: [
        Connection::new(28, "A0"),
        Connection::new(29, "A1"),
        Connection::new(30, "A2"),
        Connection::new(31, "A3"),
        Connection::new(32, "A4"),
        Connection::new(33, "A5"),
        Connection::new(34, "A6"),
        Connection::new(35, "A7"),
        Connection::new(36, "A8"),
        Connection::new(37, "A9"),
        Connection::new(38, "A10"),
        Connection::new(39, "A11"),
        Connection::new(40, "A12"),
        Connection::new(1, "A13"),
        Connection::new(2, "A14"),
        Connection::new(3, "A15"),
    ],
    data: [
        Connection::new(12, "D0"),
        Connection::new(10, "D1"),
        Connection::new(9, "D2"),
        Connection::new(8, "D3"),
        Connection::new(7, "D4"),
        Connection::new(6, "D5"),
        Connection::new(5, "D6"),
        Connection::new(4, "D7"),
    ],
};
