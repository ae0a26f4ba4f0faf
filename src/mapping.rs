//! Mapping table entries and action routing.
//!
//! A [`Mapping`] says what one input slot produces on the emulated side. Performing
//! a mapping routes the press (`1`) or release (`0`) to an [`ActionSink`], which is
//! the emulator-facing consumer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Joystick-port pin bits used by default mappings.
pub mod pins {
    pub const UP: u16 = 0x01;
    pub const DOWN: u16 = 0x02;
    pub const LEFT: u16 = 0x04;
    pub const RIGHT: u16 = 0x08;
    pub const FIRE: u16 = 0x10;
    pub const FIRE2: u16 = 0x20;
    pub const FIRE3: u16 = 0x40;
}

/// Potentiometer register selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PotAxis {
    X,
    Y,
}

impl PotAxis {
    pub fn as_str(self) -> &'static str {
        match self {
            PotAxis::X => "x",
            PotAxis::Y => "y",
        }
    }
}

/// Keyboard matrix cell plus modifier flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyPosition {
    pub row: i32,
    pub column: i32,
    pub flags: u32,
}

/// What an input produces.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mapping {
    #[default]
    None,
    /// Emulated joystick pin (bit value).
    Pin(u16),
    /// Keyboard matrix cell.
    Key(KeyPosition),
    /// Potentiometer register.
    Pot(PotAxis),
    /// Named UI action, triggered on press only.
    UiAction(String),
    /// Activate the UI (menu); fires on every invocation.
    UiActivate,
}

impl Mapping {
    pub fn is_none(&self) -> bool {
        matches!(self, Mapping::None)
    }

    /// Route `value` to the sink according to the mapping's kind.
    ///
    /// `port` is the emulated port of the owning device.
    pub fn perform(&self, port: Option<u8>, value: i32, sink: &mut dyn ActionSink) {
        match self {
            Mapping::None => {}
            Mapping::Pin(pin) => sink.pin(port, *pin, value),
            Mapping::Key(key) => sink.key(*key, value),
            Mapping::Pot(axis) => sink.pot(port, *axis, value),
            Mapping::UiAction(name) => {
                if value != 0 {
                    sink.ui_action(name);
                }
            }
            Mapping::UiActivate => sink.ui_activate(),
        }
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mapping::None => f.write_str("none"),
            Mapping::Pin(pin) => write!(f, "pin 0x{:02x}", pin),
            Mapping::Key(k) => write!(f, "key {},{} flags {}", k.row, k.column, k.flags),
            Mapping::Pot(axis) => write!(f, "pot {}", axis.as_str()),
            Mapping::UiAction(name) => write!(f, "action {:?}", name),
            Mapping::UiActivate => f.write_str("activate"),
        }
    }
}

/// Consumer of performed mappings.
///
/// Pins, keys and pots see both edges so the consumer can hold state.
pub trait ActionSink {
    fn pin(&mut self, port: Option<u8>, pin: u16, value: i32);
    fn key(&mut self, key: KeyPosition, value: i32);
    fn pot(&mut self, port: Option<u8>, axis: PotAxis, value: i32);
    fn ui_action(&mut self, name: &str);
    fn ui_activate(&mut self);
}

/// A single performed mapping, as recorded by `Vec<PerformedAction>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PerformedAction {
    Pin {
        port: Option<u8>,
        pin: u16,
        value: i32,
    },
    Key {
        key: KeyPosition,
        value: i32,
    },
    Pot {
        port: Option<u8>,
        axis: PotAxis,
        value: i32,
    },
    UiAction(String),
    UiActivate,
}

impl ActionSink for Vec<PerformedAction> {
    fn pin(&mut self, port: Option<u8>, pin: u16, value: i32) {
        self.push(PerformedAction::Pin { port, pin, value });
    }

    fn key(&mut self, key: KeyPosition, value: i32) {
        self.push(PerformedAction::Key { key, value });
    }

    fn pot(&mut self, port: Option<u8>, axis: PotAxis, value: i32) {
        self.push(PerformedAction::Pot { port, axis, value });
    }

    fn ui_action(&mut self, name: &str) {
        self.push(PerformedAction::UiAction(name.to_string()));
    }

    fn ui_activate(&mut self) {
        self.push(PerformedAction::UiActivate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pins_fire_on_both_edges() {
        let mut log = Vec::new();
        Mapping::Pin(pins::FIRE).perform(Some(1), 1, &mut log);
        Mapping::Pin(pins::FIRE).perform(Some(1), 0, &mut log);
        assert_eq!(
            log,
            vec![
                PerformedAction::Pin {
                    port: Some(1),
                    pin: pins::FIRE,
                    value: 1
                },
                PerformedAction::Pin {
                    port: Some(1),
                    pin: pins::FIRE,
                    value: 0
                },
            ]
        );
    }

    #[test]
    fn ui_action_ignores_release() {
        let mut log = Vec::new();
        let m = Mapping::UiAction("toggle-warp".into());
        m.perform(None, 0, &mut log);
        assert!(log.is_empty());
        m.perform(None, 1, &mut log);
        assert_eq!(log, vec![PerformedAction::UiAction("toggle-warp".into())]);
    }

    #[test]
    fn ui_activate_ignores_value() {
        let mut log = Vec::new();
        Mapping::UiActivate.perform(None, 0, &mut log);
        Mapping::UiActivate.perform(None, 1, &mut log);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn none_does_nothing() {
        let mut log = Vec::new();
        Mapping::None.perform(Some(0), 1, &mut log);
        assert!(log.is_empty());
    }
}
