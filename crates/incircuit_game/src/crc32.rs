//! CRC-32/IEEE, the fingerprint ROM tables are recorded with.

const POLYNOMIAL: u32 = 0xEDB8_8320;

const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 {
                POLYNOMIAL ^ (c >> 1)
            } else {
                c >> 1
            };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// Running CRC fed one byte per bus read.
#[derive(Copy, Clone, Debug)]
pub struct Crc32 {
    state: u32,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc32 {
    pub fn new() -> Self {
        Self { state: 0xFFFF_FFFF }
    }

    #[inline]
    pub fn update(&mut self, byte: u8) {
        let index = ((self.state ^ u32::from(byte)) & 0xFF) as usize;
        self.state = TABLE[index] ^ (self.state >> 8);
    }

    pub fn finish(&self) -> u32 {
        !self.state
    }
}

pub fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    for &byte in bytes {
        crc.update(byte);
    }
    crc.finish()
}
