//! Serializable device description.
//!
//! [`DeviceSummary`] is a cloneable snapshot of a [`Device`] suitable for
//! listing, logging and `--json` output. It carries identity, port and
//! capabilities plus one [`InputSummary`] per axis, button and hat.
//!
//! ## Persistence notes
//! - `vendor`/`product` are stable and are what a joymap matches on.
//! - `node` is platform-specific and may change across reconnects; treat it as
//!   diagnostic first, identity second.

use crate::device::{Device, HatSource};
use crate::event::InputKind;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSummary {
    pub kind: InputKind,
    /// Platform code; `None` for composed hats.
    pub code: Option<u16>,
    pub name: String,
    /// Logical range for axes (and composed hat x axis).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<(i32, i32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digital: Option<bool>,
    /// Sub-axis codes of a composed hat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_axes: Option<(u16, u16)>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub name: String,
    pub node: String,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
    pub port: Option<u8>,
    pub capabilities: Vec<String>,
    pub inputs: Vec<InputSummary>,
}

impl DeviceSummary {
    pub fn count(&self, kind: InputKind) -> usize {
        self.inputs.iter().filter(|i| i.kind == kind).count()
    }
}

impl From<&Device> for DeviceSummary {
    fn from(device: &Device) -> Self {
        let axes = device.axes.iter().map(|a| InputSummary {
            kind: InputKind::Axis,
            code: Some(a.code),
            name: a.name.clone(),
            range: Some((a.minimum, a.maximum)),
            digital: Some(a.digital),
            sub_axes: None,
        });
        let buttons = device.buttons.iter().map(|b| InputSummary {
            kind: InputKind::Button,
            code: Some(b.code),
            name: b.name.clone(),
            range: None,
            digital: None,
            sub_axes: None,
        });
        let hats = device.hats.iter().map(|h| match &h.source {
            HatSource::Switch { code } => InputSummary {
                kind: InputKind::Hat,
                code: Some(*code),
                name: h.name.clone(),
                range: None,
                digital: None,
                sub_axes: None,
            },
            HatSource::Axes(axes) => InputSummary {
                kind: InputKind::Hat,
                code: None,
                name: h.name.clone(),
                range: Some((axes.x.minimum, axes.x.maximum)),
                digital: Some(axes.x.digital && axes.y.digital),
                sub_axes: Some((axes.x.code, axes.y.code)),
            },
        });

        DeviceSummary {
            name: device.name.clone(),
            node: device.node.clone(),
            vendor: device.vendor,
            product: device.product,
            version: device.version,
            port: device.port,
            capabilities: device
                .capabilities
                .names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            inputs: axes.chain(buttons).chain(hats).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Axis, Button, Hat};

    #[test]
    fn summary_lists_every_input() {
        let mut dev =
            Device::new("Arcade Stick", "/dev/input/event9").with_ids(0x0079, 0x0006, 0x0107);
        dev.axes.push(Axis::new(0, "ABS_X", 0, 255));
        dev.buttons.push(Button::new(0x120, "BTN_TRIGGER"));
        dev.hats.push(Hat::from_axes(
            "hat0",
            Axis::new(0x10, "ABS_HAT0X", -1, 1),
            Axis::new(0x11, "ABS_HAT0Y", -1, 1),
        ));
        dev.classify_capabilities();

        let summary = DeviceSummary::from(&dev);
        assert_eq!(summary.count(InputKind::Axis), 1);
        assert_eq!(summary.count(InputKind::Button), 1);
        assert_eq!(summary.count(InputKind::Hat), 1);
        assert_eq!(summary.capabilities, vec!["paddle", "joystick"]);
        assert_eq!(summary.inputs[2].sub_axes, Some((0x10, 0x11)));

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"kind\":\"hat\""));
        assert!(json.contains("\"vendor\":121"));
    }
}
