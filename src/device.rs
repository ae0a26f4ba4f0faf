//! Device model.
//!
//! A [`Device`] owns its axes, buttons and hats; indices into those vectors are
//! stable for the device's lifetime. Every input carries its own mapping and
//! calibration plus the `previous` state the dispatcher diffs against.
//!
//! Hats come in two shapes:
//! - a single enumerated switch that reports a [`HatDirection`] bitmask directly;
//! - two independent sub-axes ([`HatAxes`]) whose samples arrive separately and are
//!   recombined through a two-slot state machine.
//!
//! The platform handle is not stored here. It belongs to the backend that
//! discovered the device, keyed by [`Device::node`].

use crate::calibration::{
    self, AxisPair, Calibration, CalibrationError, DigitalPolicy, Direction,
};
use crate::capability::{self, Capabilities};
use crate::event::{Cardinal, InputRef};
use crate::mapping::Mapping;
use bitflags::bitflags;

bitflags! {
    /// Directional bitmask of a hat.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct HatDirection: u8 {
        const UP = 0x01;
        const DOWN = 0x02;
        const LEFT = 0x04;
        const RIGHT = 0x08;
    }
}

/// One value per hat direction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Directions<T> {
    pub up: T,
    pub down: T,
    pub left: T,
    pub right: T,
}

impl<T> Directions<T> {
    pub fn get(&self, dir: Cardinal) -> &T {
        match dir {
            Cardinal::Up => &self.up,
            Cardinal::Down => &self.down,
            Cardinal::Left => &self.left,
            Cardinal::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, dir: Cardinal) -> &mut T {
        match dir {
            Cardinal::Up => &mut self.up,
            Cardinal::Down => &mut self.down,
            Cardinal::Left => &mut self.left,
            Cardinal::Right => &mut self.right,
        }
    }
}

/// An absolute input with a logical range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Axis {
    pub code: u16,
    pub name: String,
    pub minimum: i32,
    pub maximum: i32,
    pub fuzz: i32,
    pub flat: i32,
    pub resolution: i32,
    pub digital: bool,
    pub previous: Direction,
    pub calibration: AxisPair<Calibration>,
    pub mapping: AxisPair<Mapping>,
}

impl Axis {
    /// New axis with default thresholds; `{-1, 0, 1}` ranges are digital.
    pub fn new(code: u16, name: impl Into<String>, minimum: i32, maximum: i32) -> Self {
        Self {
            code,
            name: name.into(),
            minimum,
            maximum,
            fuzz: 0,
            flat: 0,
            resolution: 0,
            digital: calibration::is_digital_range(minimum, maximum),
            previous: Direction::Centered,
            calibration: calibration::auto_calibrate(minimum, maximum),
            mapping: AxisPair::default(),
        }
    }

    pub fn with_metadata(mut self, fuzz: i32, flat: i32, resolution: i32) -> Self {
        self.fuzz = fuzz;
        self.flat = flat;
        self.resolution = resolution;
        self
    }

    /// Re-evaluate `digital` under `policy`.
    pub fn apply_digital_policy(&mut self, policy: DigitalPolicy) {
        self.digital = policy.is_digital(
            self.minimum,
            self.maximum,
            self.fuzz,
            self.flat,
            self.resolution,
        );
    }

    #[inline]
    pub fn classify(&self, raw: i32) -> Direction {
        calibration::classify(self.digital, &self.calibration, raw)
    }

    /// Reset thresholds to the 25/50/25 default.
    pub fn auto_calibrate(&mut self) {
        self.calibration = calibration::auto_calibrate(self.minimum, self.maximum);
    }

    /// Set explicit thresholds. Other calibration fields are kept.
    pub fn set_thresholds(&mut self, negative: i32, positive: i32) -> Result<(), CalibrationError> {
        calibration::validate_thresholds(self.minimum, self.maximum, negative, positive)?;
        self.calibration.negative.threshold = negative;
        self.calibration.positive.threshold = positive;
        Ok(())
    }
}

/// A two-state input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub code: u16,
    pub name: String,
    pub previous: i32,
    pub mapping: Mapping,
    pub calibration: Calibration,
}

impl Button {
    pub fn new(code: u16, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            previous: 0,
            mapping: Mapping::None,
            calibration: Calibration::default(),
        }
    }
}

/// Which sub-axis of a composed hat a sample belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HatAxisSlot {
    X,
    Y,
}

/// Two independently reported sub-axes forming one hat.
///
/// Each slot keeps the last directional contribution of its axis, so a sample on
/// one axis never disturbs the other axis' state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HatAxes {
    pub x: Axis,
    pub y: Axis,
    x_contribution: HatDirection,
    y_contribution: HatDirection,
}

impl HatAxes {
    pub fn new(x: Axis, y: Axis) -> Self {
        Self {
            x,
            y,
            x_contribution: HatDirection::empty(),
            y_contribution: HatDirection::empty(),
        }
    }

    pub fn slot_for(&self, code: u16) -> Option<HatAxisSlot> {
        if self.x.code == code {
            Some(HatAxisSlot::X)
        } else if self.y.code == code {
            Some(HatAxisSlot::Y)
        } else {
            None
        }
    }

    /// Feed one sub-axis sample and return the recombined bitmask.
    pub fn update(&mut self, slot: HatAxisSlot, raw: i32) -> HatDirection {
        match slot {
            HatAxisSlot::X => {
                let dir = self.x.classify(raw);
                self.x.previous = dir;
                self.x_contribution = match dir {
                    Direction::Negative => HatDirection::LEFT,
                    Direction::Positive => HatDirection::RIGHT,
                    Direction::Centered => HatDirection::empty(),
                };
            }
            HatAxisSlot::Y => {
                let dir = self.y.classify(raw);
                self.y.previous = dir;
                self.y_contribution = match dir {
                    Direction::Negative => HatDirection::UP,
                    Direction::Positive => HatDirection::DOWN,
                    Direction::Centered => HatDirection::empty(),
                };
            }
        }
        self.recombine()
    }

    #[inline]
    pub fn recombine(&self) -> HatDirection {
        self.x_contribution | self.y_contribution
    }

    pub fn contributions(&self) -> (HatDirection, HatDirection) {
        (self.x_contribution, self.y_contribution)
    }
}

/// How the hardware reports a hat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HatSource {
    Switch { code: u16 },
    Axes(HatAxes),
}

/// A 4/8-way directional input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hat {
    pub name: String,
    pub source: HatSource,
    pub previous: HatDirection,
    pub mapping: Directions<Mapping>,
    pub calibration: Directions<Calibration>,
}

impl Hat {
    pub fn switch(code: u16, name: impl Into<String>) -> Self {
        Self::with_source(name.into(), HatSource::Switch { code })
    }

    pub fn from_axes(name: impl Into<String>, x: Axis, y: Axis) -> Self {
        Self::with_source(name.into(), HatSource::Axes(HatAxes::new(x, y)))
    }

    fn with_source(name: String, source: HatSource) -> Self {
        Self {
            name,
            source,
            previous: HatDirection::empty(),
            mapping: Directions::default(),
            calibration: Directions::default(),
        }
    }

    /// Switch code; `None` for composed hats.
    pub fn code(&self) -> Option<u16> {
        match &self.source {
            HatSource::Switch { code } => Some(*code),
            HatSource::Axes(_) => None,
        }
    }
}

/// A physical input device as seen by the core.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    /// Platform node (e.g. `/dev/input/event7`); also the backend's handle key.
    pub node: String,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
    pub axes: Vec<Axis>,
    pub buttons: Vec<Button>,
    pub hats: Vec<Hat>,
    /// Assigned emulated port, `None` when unassigned.
    pub port: Option<u8>,
    pub capabilities: Capabilities,
}

impl Device {
    pub fn new(name: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node: node.into(),
            ..Default::default()
        }
    }

    pub fn with_ids(mut self, vendor: u16, product: u16, version: u16) -> Self {
        self.vendor = vendor;
        self.product = product;
        self.version = version;
        self
    }

    /// `vvvv:pppp` identifier.
    pub fn id(&self) -> String {
        format!("{:04x}:{:04x}", self.vendor, self.product)
    }

    /// Recompute and store capabilities from the current input counts.
    pub fn classify_capabilities(&mut self) -> Capabilities {
        self.capabilities =
            capability::classify(self.axes.len(), self.buttons.len(), self.hats.len());
        self.capabilities
    }

    pub fn axis(&self, code: u16) -> Option<&Axis> {
        self.axes.iter().find(|a| a.code == code)
    }

    pub fn axis_mut(&mut self, code: u16) -> Option<&mut Axis> {
        self.axes.iter_mut().find(|a| a.code == code)
    }

    pub fn axis_by_name(&self, name: &str) -> Option<&Axis> {
        self.axes.iter().find(|a| a.name == name)
    }

    pub fn button(&self, code: u16) -> Option<&Button> {
        self.buttons.iter().find(|b| b.code == code)
    }

    pub fn button_mut(&mut self, code: u16) -> Option<&mut Button> {
        self.buttons.iter_mut().find(|b| b.code == code)
    }

    pub fn button_by_name(&self, name: &str) -> Option<&Button> {
        self.buttons.iter().find(|b| b.name == name)
    }

    pub fn hat_by_code(&self, code: u16) -> Option<&Hat> {
        self.hats.iter().find(|h| h.code() == Some(code))
    }

    pub fn hat_by_code_mut(&mut self, code: u16) -> Option<&mut Hat> {
        self.hats.iter_mut().find(|h| h.code() == Some(code))
    }

    pub fn hat_by_name(&self, name: &str) -> Option<&Hat> {
        self.hats.iter().find(|h| h.name == name)
    }

    /// Composed hat owning the sub-axis `code`, with the matching slot.
    pub fn hat_axis_mut(&mut self, code: u16) -> Option<(&mut Hat, HatAxisSlot)> {
        self.hats.iter_mut().find_map(|hat| {
            let slot = match &hat.source {
                HatSource::Axes(axes) => axes.slot_for(code)?,
                HatSource::Switch { .. } => return None,
            };
            Some((hat, slot))
        })
    }

    pub fn mapping(&self, input: &InputRef) -> Option<&Mapping> {
        match *input {
            InputRef::Axis { code, direction } => self.axis(code)?.mapping.get(direction),
            InputRef::Button { code } => self.button(code).map(|b| &b.mapping),
            InputRef::Hat { index, direction } => self
                .hats
                .get(index as usize)
                .map(|h| h.mapping.get(direction)),
        }
    }

    pub fn mapping_mut(&mut self, input: &InputRef) -> Option<&mut Mapping> {
        match *input {
            InputRef::Axis { code, direction } => self.axis_mut(code)?.mapping.get_mut(direction),
            InputRef::Button { code } => self.button_mut(code).map(|b| &mut b.mapping),
            InputRef::Hat { index, direction } => self
                .hats
                .get_mut(index as usize)
                .map(|h| h.mapping.get_mut(direction)),
        }
    }

    /// Every slot with a mapping other than `None`, in device order.
    pub fn mapped_inputs(&self) -> Vec<(InputRef, &Mapping)> {
        let mut out = Vec::new();
        for axis in &self.axes {
            for direction in [Direction::Negative, Direction::Positive] {
                if let Some(m) = axis.mapping.get(direction).filter(|m| !m.is_none()) {
                    out.push((
                        InputRef::Axis {
                            code: axis.code,
                            direction,
                        },
                        m,
                    ));
                }
            }
        }
        for button in self.buttons.iter().filter(|b| !b.mapping.is_none()) {
            out.push((InputRef::Button { code: button.code }, &button.mapping));
        }
        for (index, hat) in self.hats.iter().enumerate() {
            for direction in Cardinal::ALL {
                let m = hat.mapping.get(direction);
                if !m.is_none() {
                    out.push((
                        InputRef::Hat {
                            index: index as u16,
                            direction,
                        },
                        m,
                    ));
                }
            }
        }
        out
    }

    /// Reset every mapping slot to `None`.
    pub fn clear_mappings(&mut self) {
        for axis in &mut self.axes {
            axis.mapping = AxisPair::default();
        }
        for button in &mut self.buttons {
            button.mapping = Mapping::None;
        }
        for hat in &mut self.hats {
            hat.mapping = Directions::default();
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] ({})", self.name, self.id(), self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::pins;

    fn pad() -> Device {
        let mut dev = Device::new("Test Pad", "/dev/input/event3").with_ids(0x045e, 0x028e, 0x0110);
        dev.axes.push(Axis::new(0, "ABS_X", -32768, 32767));
        dev.axes.push(Axis::new(1, "ABS_Y", -32768, 32767));
        dev.buttons.push(Button::new(0x130, "BTN_SOUTH"));
        dev.hats.push(Hat::from_axes(
            "hat0",
            Axis::new(0x10, "ABS_HAT0X", -1, 1),
            Axis::new(0x11, "ABS_HAT0Y", -1, 1),
        ));
        dev
    }

    #[test]
    fn lookups_by_code_and_name() {
        let dev = pad();
        assert_eq!(dev.axis(1).map(|a| a.name.as_str()), Some("ABS_Y"));
        assert!(dev.axis(7).is_none());
        assert_eq!(dev.axis_by_name("ABS_X").map(|a| a.code), Some(0));
        assert_eq!(dev.button_by_name("BTN_SOUTH").map(|b| b.code), Some(0x130));
        assert!(dev.button(0x131).is_none());
        assert!(dev.hat_by_name("hat0").is_some());
        assert!(dev.hat_by_code(0x10).is_none());
        assert_eq!(dev.id(), "045e:028e");
    }

    #[test]
    fn digital_detection_by_range() {
        let dev = pad();
        assert!(!dev.axes[0].digital);
        match &dev.hats[0].source {
            HatSource::Axes(axes) => {
                assert!(axes.x.digital);
                assert!(axes.y.digital);
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn hat_sub_axes_resolve_to_slots() {
        let mut dev = pad();
        assert!(matches!(dev.hat_axis_mut(0x10), Some((_, HatAxisSlot::X))));
        assert!(matches!(dev.hat_axis_mut(0x11), Some((_, HatAxisSlot::Y))));
        assert!(dev.hat_axis_mut(0).is_none());
    }

    #[test]
    fn composition_is_order_independent() {
        let x = Axis::new(0x10, "x", -1, 1);
        let y = Axis::new(0x11, "y", -1, 1);
        let mut a = HatAxes::new(x.clone(), y.clone());
        let mut b = HatAxes::new(x, y);

        a.update(HatAxisSlot::X, 1);
        let from_a = a.update(HatAxisSlot::Y, -1);
        b.update(HatAxisSlot::Y, -1);
        let from_b = b.update(HatAxisSlot::X, 1);

        assert_eq!(from_a, from_b);
        assert_eq!(from_a, HatDirection::UP | HatDirection::RIGHT);
    }

    #[test]
    fn one_slot_does_not_clobber_the_other() {
        let mut hat = HatAxes::new(Axis::new(0x10, "x", -1, 1), Axis::new(0x11, "y", -1, 1));
        hat.update(HatAxisSlot::Y, 1);
        assert_eq!(hat.update(HatAxisSlot::X, -1), HatDirection::DOWN | HatDirection::LEFT);
        assert_eq!(hat.update(HatAxisSlot::X, 0), HatDirection::DOWN);
        assert_eq!(hat.contributions(), (HatDirection::empty(), HatDirection::DOWN));
    }

    #[test]
    fn mapping_slots_by_input_ref() {
        let mut dev = pad();
        let up = InputRef::Hat {
            index: 0,
            direction: Cardinal::Up,
        };
        *dev.mapping_mut(&up).unwrap() = Mapping::Pin(pins::UP);
        let neg = InputRef::Axis {
            code: 0,
            direction: Direction::Negative,
        };
        *dev.mapping_mut(&neg).unwrap() = Mapping::Pin(pins::LEFT);

        assert_eq!(dev.mapping(&up), Some(&Mapping::Pin(pins::UP)));
        assert!(dev
            .mapping(&InputRef::Axis {
                code: 0,
                direction: Direction::Centered
            })
            .is_none());
        assert!(dev.mapping(&InputRef::Button { code: 1 }).is_none());

        let mapped = dev.mapped_inputs();
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped[0].0, neg);
        assert_eq!(mapped[1].0, up);

        dev.clear_mappings();
        assert!(dev.mapped_inputs().is_empty());
    }

    #[test]
    fn explicit_thresholds_are_validated() {
        let mut axis = Axis::new(0, "ABS_Z", 0, 255);
        assert!(axis.set_thresholds(20, 230).is_ok());
        assert_eq!(axis.classify(25), Direction::Centered);
        assert_eq!(axis.classify(20), Direction::Negative);
        assert!(axis.set_thresholds(200, 230).is_err());
        assert_eq!(axis.calibration.negative.threshold, 20);
        axis.auto_calibrate();
        assert_eq!(axis.calibration.negative.threshold, 63);
    }

    #[test]
    fn capabilities_follow_counts() {
        let mut dev = pad();
        let caps = dev.classify_capabilities();
        assert!(caps.contains(Capabilities::PADDLE | Capabilities::JOYSTICK));
        assert!(!caps.contains(Capabilities::MOUSE));
        assert_eq!(dev.capabilities, caps);
    }
}
