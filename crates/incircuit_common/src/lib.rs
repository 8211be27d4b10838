pub mod error;
pub mod hex;
pub mod key;
pub mod pin;

pub use error::{
    check_u8, check_value, check_value16, Error, ErrorKind, Result, Status, DISPLAY_WIDTH,
};
pub use key::Key;
pub use pin::{Connection, Level, PinMode};
