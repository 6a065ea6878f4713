//! LED control: colors, intensity math, light sequences and patterns.

mod color;
mod level;
pub mod pattern;
mod sequence;

pub use color::Color;
pub use level::{MAX_INTENSITY, clamp_count, clamp_level, scaled};
pub use sequence::{Pacer, Sequence, Step, ThreadPacer, mock, play};
