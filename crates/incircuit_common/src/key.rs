/// Keypad key passed to the key-indexed tester operations.
///
/// `Select` runs the operation on the current entry, `Up`/`Down` step the
/// selection and anything else just shows the current entry.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Key {
    Select,
    Left,
    Right,
    Up,
    Down,
    #[default]
    None,
}
