//! Fixed-width hex fields for the 16 character status line. Every field
//! carries its own leading space so fields can be appended back to back.

pub fn hex8(value: u16) -> String {
    format!(" {:02X}", value & 0xFF)
}

pub fn hex16(value: u32) -> String {
    format!(" {:04X}", value & 0xFFFF)
}

pub fn hex24(value: u32) -> String {
    format!(" {:06X}", value & 0xFF_FFFF)
}

pub fn hex32(value: u32) -> String {
    format!(" {:08X}", value)
}
