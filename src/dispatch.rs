//! Edge-triggered event dispatch.
//!
//! Each raw sample is compared against the `previous` state of the input it
//! addresses; only transitions perform mappings. Steady-state input therefore
//! never re-fires.
//!
//! Ordering rules:
//! - **Axes:** the old direction is released before the new one is pressed. A
//!   jump from positive to negative in one sample yields `positive → 0` and then
//!   `negative → 1`.
//! - **Hats:** the four direction bits are independent; each changed bit fires
//!   with its new state, in up/down/left/right order.
//!   A switch value outside `0..=0x0f` (e.g. `-1`) reads as centered.

use crate::device::{Axis, Device, Hat, HatDirection, HatSource};
use crate::event::{Cardinal, RawSample};
use crate::mapping::ActionSink;
use tracing::trace;

/// Dispatch one sample against `device`.
///
/// Returns `false` when no input on the device matches the sample's code.
pub fn dispatch(device: &mut Device, sample: RawSample, sink: &mut dyn ActionSink) -> bool {
    let port = device.port;
    match sample {
        RawSample::Button { code, value } => match device.button_mut(code) {
            Some(button) => {
                let value = (value != 0) as i32;
                if button.previous != value {
                    button.mapping.perform(port, value, sink);
                }
                button.previous = value;
                true
            }
            None => unmatched(device, sample),
        },
        RawSample::Axis { code, value } => {
            if let Some(axis) = device.axis_mut(code) {
                dispatch_axis(axis, port, value, sink);
                return true;
            }
            match device.hat_axis_mut(code) {
                Some((hat, slot)) => {
                    let combined = match &mut hat.source {
                        HatSource::Axes(axes) => axes.update(slot, value),
                        HatSource::Switch { .. } => return false,
                    };
                    dispatch_hat(hat, port, combined, sink);
                    true
                }
                None => unmatched(device, sample),
            }
        }
        RawSample::Hat { code, value } => match device.hat_by_code_mut(code) {
            Some(hat) => {
                let bits = match u8::try_from(value).ok().and_then(HatDirection::from_bits) {
                    Some(bits) => bits,
                    None => {
                        trace!(hat = %hat.name, value, "hat value out of range, centered");
                        HatDirection::empty()
                    }
                };
                dispatch_hat(hat, port, bits, sink);
                true
            }
            None => unmatched(device, sample),
        },
    }
}

fn unmatched(device: &Device, sample: RawSample) -> bool {
    trace!(device = %device.node, ?sample, "sample for unknown input ignored");
    false
}

/// Classify `raw` and fire release-then-press on a direction change.
pub fn dispatch_axis(axis: &mut Axis, port: Option<u8>, raw: i32, sink: &mut dyn ActionSink) {
    let new = axis.classify(raw);
    let old = axis.previous;
    if new == old {
        return;
    }
    axis.previous = new;
    trace!(axis = %axis.name, raw, from = old.as_str(), to = new.as_str(), "axis transition");

    if let Some(mapping) = axis.mapping.get(old) {
        mapping.perform(port, 0, sink);
    }
    if let Some(mapping) = axis.mapping.get(new) {
        mapping.perform(port, 1, sink);
    }
}

/// Diff `bits` against the hat's previous bitmask and fire each changed direction.
pub fn dispatch_hat(
    hat: &mut Hat,
    port: Option<u8>,
    bits: HatDirection,
    sink: &mut dyn ActionSink,
) {
    let changed = hat.previous ^ bits;
    if changed.is_empty() {
        return;
    }
    trace!(hat = %hat.name, from = hat.previous.bits(), to = bits.bits(), "hat transition");
    hat.previous = bits;

    for dir in Cardinal::ALL {
        if changed.contains(dir.bit()) {
            let value = bits.contains(dir.bit()) as i32;
            hat.mapping.get(dir).perform(port, value, sink);
        }
    }
}
