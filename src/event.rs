//! Raw samples and input references.
//!
//! Backends report input as small, device-agnostic samples ([`RawSample`]).
//! The dispatcher resolves each sample against the device model by `code`.
//!
//! ## Value conventions
//! - **Axes:** raw logical value inside the axis' `[minimum, maximum]` range.
//!   Sub-axes of a composed hat arrive as ordinary axis samples.
//! - **Buttons:** `0` released, `1` pressed. Backends fold auto-repeat into `1`.
//! - **Hat switches:** a [`HatDirection`](crate::device::HatDirection) bitmask.

use crate::calibration::Direction;
use crate::device::HatDirection;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One raw input sample delivered by a backend poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawSample {
    Axis { code: u16, value: i32 },
    Button { code: u16, value: i32 },
    Hat { code: u16, value: i32 },
}

/// Category of an input on a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Axis,
    Button,
    Hat,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Axis => "axis",
            InputKind::Button => "button",
            InputKind::Hat => "hat",
        }
    }
}

/// One of the four hat directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinal {
    Up,
    Down,
    Left,
    Right,
}

impl Cardinal {
    pub const ALL: [Cardinal; 4] = [Cardinal::Up, Cardinal::Down, Cardinal::Left, Cardinal::Right];

    pub fn bit(self) -> HatDirection {
        match self {
            Cardinal::Up => HatDirection::UP,
            Cardinal::Down => HatDirection::DOWN,
            Cardinal::Left => HatDirection::LEFT,
            Cardinal::Right => HatDirection::RIGHT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cardinal::Up => "up",
            Cardinal::Down => "down",
            Cardinal::Left => "left",
            Cardinal::Right => "right",
        }
    }

    pub fn from_word(word: &str) -> Option<Self> {
        Cardinal::ALL.into_iter().find(|c| c.as_str() == word)
    }
}

/// Addresses a single mapping slot on a device.
///
/// Axes and buttons are keyed by their platform code. Hats are keyed by their
/// position in the device's hat list, since composed hats have no code of their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputRef {
    Axis { code: u16, direction: Direction },
    Button { code: u16 },
    Hat { index: u16, direction: Cardinal },
}

impl fmt::Display for InputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputRef::Axis { code, direction } => {
                write!(f, "axis {} {}", code, direction.as_str())
            }
            InputRef::Button { code } => write!(f, "button {}", code),
            InputRef::Hat { index, direction } => {
                write!(f, "hat {} {}", index, direction.as_str())
            }
        }
    }
}
