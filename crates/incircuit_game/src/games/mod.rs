//! Supported boards.
//!
//! Each module holds one board's tables as `'static` data, its hook state
//! and a `create` that puts the right CPU driver on the header and wraps
//! everything in a [`GenericGame`](crate::GenericGame).

pub mod catnmouse_sound;
pub mod scramble;
pub mod scramble_sound;
pub mod space_invaders;
pub mod super_basketball;
