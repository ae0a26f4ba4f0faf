//! Baseline mapping for devices without a joymap.
//!
//! Picks one directional source (hat, D-pad button cluster, or the first two
//! axes) for up/down/left/right and the lowest-coded remaining button for fire.
//! When a device has both a hat and a complete D-pad cluster the winner is
//! [`DirectionalPreference`]. Devices that cannot provide a direction and a
//! fire button are left untouched.

use crate::device::Device;
use crate::mapping::{pins, Mapping};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Button codes the platform uses for a D-pad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DpadCodes {
    pub up: u16,
    pub down: u16,
    pub left: u16,
    pub right: u16,
}

/// Which directional source wins when a device has several.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionalPreference {
    /// hat, then D-pad cluster, then axes
    #[default]
    Hat,
    /// D-pad cluster, then hat, then axes
    Dpad,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefaultMapError {
    #[error("device \"{0}\" has no hat, D-pad or axis pair to map directions to")]
    NoDirectionalInput(String),
    #[error("device \"{0}\" has no button left to map fire to")]
    NoFireButton(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Source {
    Hat(usize),
    /// button indices: up, down, left, right
    Dpad([usize; 4]),
    Axes(usize, usize),
}

fn find_dpad(device: &Device, codes: DpadCodes) -> Option<[usize; 4]> {
    let index = |code: u16| device.buttons.iter().position(|b| b.code == code);
    Some([
        index(codes.up)?,
        index(codes.down)?,
        index(codes.left)?,
        index(codes.right)?,
    ])
}

/// Replace the device's mappings with a default table.
pub fn apply_default_mapping(
    device: &mut Device,
    dpad_codes: Option<DpadCodes>,
    prefer: DirectionalPreference,
) -> Result<(), DefaultMapError> {
    let hat = (!device.hats.is_empty()).then_some(Source::Hat(0));
    let dpad = dpad_codes
        .and_then(|codes| find_dpad(device, codes))
        .map(Source::Dpad);
    let axes = (device.axes.len() >= 2).then_some(Source::Axes(0, 1));

    let source = match prefer {
        DirectionalPreference::Hat => hat.or(dpad).or(axes),
        DirectionalPreference::Dpad => dpad.or(hat).or(axes),
    }
    .ok_or_else(|| DefaultMapError::NoDirectionalInput(device.name.clone()))?;

    let reserved: &[usize] = match &source {
        Source::Dpad(indices) => &indices[..],
        _ => &[],
    };
    let fire = device
        .buttons
        .iter()
        .enumerate()
        .filter(|(i, _)| !reserved.contains(i))
        .min_by_key(|(_, b)| b.code)
        .map(|(i, _)| i)
        .ok_or_else(|| DefaultMapError::NoFireButton(device.name.clone()))?;

    device.clear_mappings();
    match source {
        Source::Hat(i) => {
            let hat = &mut device.hats[i];
            hat.mapping.up = Mapping::Pin(pins::UP);
            hat.mapping.down = Mapping::Pin(pins::DOWN);
            hat.mapping.left = Mapping::Pin(pins::LEFT);
            hat.mapping.right = Mapping::Pin(pins::RIGHT);
        }
        Source::Dpad([up, down, left, right]) => {
            device.buttons[up].mapping = Mapping::Pin(pins::UP);
            device.buttons[down].mapping = Mapping::Pin(pins::DOWN);
            device.buttons[left].mapping = Mapping::Pin(pins::LEFT);
            device.buttons[right].mapping = Mapping::Pin(pins::RIGHT);
        }
        Source::Axes(x, y) => {
            device.axes[x].mapping.negative = Mapping::Pin(pins::LEFT);
            device.axes[x].mapping.positive = Mapping::Pin(pins::RIGHT);
            device.axes[y].mapping.negative = Mapping::Pin(pins::UP);
            device.axes[y].mapping.positive = Mapping::Pin(pins::DOWN);
        }
    }
    device.buttons[fire].mapping = Mapping::Pin(pins::FIRE);

    debug!(
        device = %device.name,
        source = ?source,
        fire = device.buttons[fire].code,
        "applied default mapping"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Axis, Button, Hat};
    use crate::event::{Cardinal, InputRef};

    const DPAD: DpadCodes = DpadCodes {
        up: 0x220,
        down: 0x221,
        left: 0x222,
        right: 0x223,
    };

    fn gamepad(with_hat: bool, with_dpad: bool) -> Device {
        let mut dev = Device::new("pad", "virtual:0");
        dev.axes.push(Axis::new(0, "ABS_X", -32768, 32767));
        dev.axes.push(Axis::new(1, "ABS_Y", -32768, 32767));
        dev.buttons.push(Button::new(0x131, "BTN_EAST"));
        dev.buttons.push(Button::new(0x130, "BTN_SOUTH"));
        if with_dpad {
            dev.buttons.push(Button::new(0x220, "BTN_DPAD_UP"));
            dev.buttons.push(Button::new(0x221, "BTN_DPAD_DOWN"));
            dev.buttons.push(Button::new(0x222, "BTN_DPAD_LEFT"));
            dev.buttons.push(Button::new(0x223, "BTN_DPAD_RIGHT"));
        }
        if with_hat {
            dev.hats.push(Hat::from_axes(
                "hat0",
                Axis::new(0x10, "ABS_HAT0X", -1, 1),
                Axis::new(0x11, "ABS_HAT0Y", -1, 1),
            ));
        }
        dev
    }

    #[test]
    fn hat_wins_by_default() {
        let mut dev = gamepad(true, true);
        apply_default_mapping(&mut dev, Some(DPAD), DirectionalPreference::Hat).unwrap();
        let up = InputRef::Hat {
            index: 0,
            direction: Cardinal::Up,
        };
        assert_eq!(dev.mapping(&up), Some(&Mapping::Pin(pins::UP)));
        assert_eq!(dev.button(0x220).unwrap().mapping, Mapping::None);
        assert_eq!(dev.button(0x130).unwrap().mapping, Mapping::Pin(pins::FIRE));
    }

    #[test]
    fn dpad_preference_uses_cluster() {
        let mut dev = gamepad(true, true);
        apply_default_mapping(&mut dev, Some(DPAD), DirectionalPreference::Dpad).unwrap();
        assert_eq!(dev.button(0x222).unwrap().mapping, Mapping::Pin(pins::LEFT));
        assert_eq!(dev.hats[0].mapping.up, Mapping::None);
        assert_eq!(dev.button(0x130).unwrap().mapping, Mapping::Pin(pins::FIRE));
    }

    #[test]
    fn dpad_beats_axes() {
        let mut dev = gamepad(false, true);
        apply_default_mapping(&mut dev, Some(DPAD), DirectionalPreference::Hat).unwrap();
        assert_eq!(dev.button(0x220).unwrap().mapping, Mapping::Pin(pins::UP));
        assert_eq!(dev.axes[0].mapping.negative, Mapping::None);
    }

    #[test]
    fn incomplete_cluster_falls_back_to_axes() {
        let mut dev = gamepad(false, true);
        dev.buttons.retain(|b| b.code != 0x223);
        apply_default_mapping(&mut dev, Some(DPAD), DirectionalPreference::Dpad).unwrap();
        assert_eq!(dev.axes[0].mapping.negative, Mapping::Pin(pins::LEFT));
        assert_eq!(dev.axes[1].mapping.positive, Mapping::Pin(pins::DOWN));
        assert_eq!(dev.button(0x130).unwrap().mapping, Mapping::Pin(pins::FIRE));
    }

    #[test]
    fn fire_skips_dpad_buttons() {
        let mut dev = Device::new("dpad only", "virtual:1");
        for (code, name) in [
            (0x220, "BTN_DPAD_UP"),
            (0x221, "BTN_DPAD_DOWN"),
            (0x222, "BTN_DPAD_LEFT"),
            (0x223, "BTN_DPAD_RIGHT"),
            (0x2c0, "BTN_TRIGGER_HAPPY1"),
        ] {
            dev.buttons.push(Button::new(code, name));
        }
        apply_default_mapping(&mut dev, Some(DPAD), DirectionalPreference::Hat).unwrap();
        assert_eq!(dev.button(0x2c0).unwrap().mapping, Mapping::Pin(pins::FIRE));
    }

    #[test]
    fn fails_without_touching_device() {
        let mut dev = gamepad(true, false);
        dev.buttons.clear();
        dev.axes[0].mapping.negative = Mapping::Pin(pins::FIRE2);
        let before = dev.clone();
        assert_eq!(
            apply_default_mapping(&mut dev, None, DirectionalPreference::Hat),
            Err(DefaultMapError::NoFireButton("pad".into()))
        );
        assert_eq!(dev, before);

        let mut bare = Device::new("bare", "virtual:2");
        bare.buttons.push(Button::new(0x130, "BTN_SOUTH"));
        assert!(matches!(
            apply_default_mapping(&mut bare, None, DirectionalPreference::Hat),
            Err(DefaultMapError::NoDirectionalInput(_))
        ));
    }
}
