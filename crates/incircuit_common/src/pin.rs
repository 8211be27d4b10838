/// Logic level seen on, or driven onto, a single pin.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Level {
    Low,
    High,
}

impl Level {
    #[inline]
    pub const fn from_bool(high: bool) -> Level {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }

    #[inline]
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    #[inline]
    pub const fn is_low(self) -> bool {
        matches!(self, Level::Low)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        Level::from_bool(high)
    }
}

impl std::ops::Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PinMode {
    Input,
    /// Input with the weak pull-up enabled. Used as the "float" level so a
    /// pin shorted to ground shows up as a low.
    InputPullup,
    Output,
}

/// A logical pin on the target socket: its header pin number and the name
/// printed on the datasheet (e.g. `_WAIT`).
///
/// A pin number of 0 marks a signal that is not fitted on a given pinout.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Connection {
    pub pin: u8,
    pub name: &'static str,
}

impl Connection {
    pub const fn new(pin: u8, name: &'static str) -> Self {
        Self { pin, name }
    }

    #[inline]
    pub const fn is_fitted(&self) -> bool {
        self.pin != 0
    }
}
