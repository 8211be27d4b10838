/// GPIO number used for header positions that are not wired.
pub const NOT_WIRED: u8 = 0xFF;

/// Translates header pin numbers (1-based, as printed on the datasheet) to
/// host GPIO numbers.
#[derive(Copy, Clone, Debug)]
pub struct PinMap(&'static [u8]);

/// 40 pin DIL socket. Pins 1..=20 run down one side of the shield and
/// 21..=40 back up the other, so neighbouring pins alternate between the
/// even and odd GPIO rows.
static DIL40: [u8; 41] = [
    NOT_WIRED, //
    14, 16, 18, 20, 22, 24, 26, 28, 30, 32, // 1..=10
    34, 36, 38, 40, 42, 44, 46, 48, 50, 52, // 11..=20
    53, 51, 49, 47, 45, 43, 41, 39, 37, 35, // 21..=30
    33, 31, 29, 27, 25, 23, 21, 19, 17, 15, // 31..=40
];

/// Auxiliary 8 pin header on the analog port (GPIO 54 + 8..=15).
static AUX8: [u8; 9] = [
    NOT_WIRED,
    54 + 8,
    54 + 9,
    54 + 10,
    54 + 11,
    54 + 12,
    54 + 13,
    54 + 14,
    54 + 15,
];

impl PinMap {
    pub const DIL40: PinMap = PinMap(&DIL40);
    pub const AUX8: PinMap = PinMap(&AUX8);

    /// GPIO for a header pin, or [`NOT_WIRED`] when the pin is outside the map.
    #[inline]
    pub fn gpio(&self, pin: u8) -> u8 {
        self.0.get(usize::from(pin)).copied().unwrap_or(NOT_WIRED)
    }

    pub fn len(&self) -> usize {
        self.0.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
