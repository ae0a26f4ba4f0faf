#![cfg(target_os = "linux")]

//! Linux evdev backend.
//!
//! Discovery walks `/dev/input/event*` through `evdev::enumerate` and keeps the
//! nodes that look like game controllers (any key in the joystick or gamepad
//! button blocks). For each one it builds:
//! - an [`Axis`] per absolute axis, using the kernel's `input_absinfo`;
//! - a composed [`Hat`] per complete `ABS_HATnX`/`ABS_HATnY` pair;
//! - a [`Button`] per key at or above `BTN_MISC`.
//!
//! The opened `evdev::Device` stays in this backend, keyed by node, until
//! [`Backend::release`]. Reads are non-blocking so a poll never stalls the loop.

use super::{Backend, ProbeError};
use crate::calibration::DigitalPolicy;
use crate::default_map::DpadCodes;
use crate::device::{Axis, Button, Device, Hat};
use crate::event::RawSample;
use evdev::{AbsoluteAxisType, EventType, Key};
use std::collections::HashMap;
use std::io;
use std::os::unix::io::AsRawFd;
use tracing::{debug, trace, warn};

const BTN_MISC: u16 = 0x100;
const BTN_JOYSTICK: u16 = 0x120;
const BTN_GAMEPAD_LAST: u16 = 0x13f;
const ABS_HAT0X: u16 = 0x10;
const ABS_HAT3Y: u16 = 0x17;

struct Handle {
    device: evdev::Device,
    open: bool,
}

pub struct EvdevBackend {
    policy: DigitalPolicy,
    handles: HashMap<String, Handle>,
}

impl EvdevBackend {
    pub fn new(policy: DigitalPolicy) -> Self {
        Self {
            policy,
            handles: HashMap::new(),
        }
    }

    fn describe(&self, node: &str, raw: &evdev::Device) -> io::Result<Option<Device>> {
        let keys: Vec<u16> = raw
            .supported_keys()
            .map(|set| set.iter().map(|k| k.code()).collect())
            .unwrap_or_default();
        if !keys
            .iter()
            .any(|&k| (BTN_JOYSTICK..=BTN_GAMEPAD_LAST).contains(&k))
        {
            return Ok(None);
        }

        let id = raw.input_id();
        let mut device = Device::new(raw.name().unwrap_or("Unknown"), node).with_ids(
            id.vendor(),
            id.product(),
            id.version(),
        );

        let abs_codes: Vec<u16> = raw
            .supported_absolute_axes()
            .map(|set| set.iter().map(|a| a.0).collect())
            .unwrap_or_default();
        if !abs_codes.is_empty() {
            let state = raw.get_abs_state()?;
            let mut hat_halves: HashMap<u16, Axis> = HashMap::new();
            for code in abs_codes {
                let Some(info) = state.get(code as usize) else {
                    continue;
                };
                let mut axis = Axis::new(
                    code,
                    format!("{:?}", AbsoluteAxisType(code)),
                    info.minimum,
                    info.maximum,
                )
                .with_metadata(info.fuzz, info.flat, info.resolution);
                if axis.minimum >= axis.maximum {
                    warn!(node, code, "skipping axis with empty range");
                    continue;
                }
                axis.apply_digital_policy(self.policy);
                if (ABS_HAT0X..=ABS_HAT3Y).contains(&code) {
                    hat_halves.insert(code, axis);
                } else {
                    device.axes.push(axis);
                }
            }

            for x_code in (ABS_HAT0X..=ABS_HAT3Y).step_by(2) {
                let pair = (hat_halves.remove(&x_code), hat_halves.remove(&(x_code + 1)));
                match pair {
                    (Some(x), Some(y)) => {
                        let index = (x_code - ABS_HAT0X) / 2;
                        device.hats.push(Hat::from_axes(format!("hat{index}"), x, y));
                    }
                    (Some(lone), None) | (None, Some(lone)) => device.axes.push(lone),
                    (None, None) => {}
                }
            }
        }

        for code in keys.into_iter().filter(|&k| k >= BTN_MISC) {
            device
                .buttons
                .push(Button::new(code, format!("{:?}", Key::new(code))));
        }

        Ok(Some(device))
    }
}

fn set_nonblocking(device: &evdev::Device) -> io::Result<()> {
    let fd = device.as_raw_fd();
    // SAFETY: fd is owned by `device` and stays valid for the duration of both calls.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

impl Backend for EvdevBackend {
    fn discover(&mut self) -> Result<Vec<Device>, ProbeError> {
        let mut found = Vec::new();
        for (path, raw) in evdev::enumerate() {
            let node = path.to_string_lossy().into_owned();
            match self.describe(&node, &raw) {
                Ok(Some(device)) => {
                    debug!(
                        node = %node,
                        name = %device.name,
                        axes = device.axes.len(),
                        buttons = device.buttons.len(),
                        hats = device.hats.len(),
                        "found controller"
                    );
                    self.handles.insert(
                        node,
                        Handle {
                            device: raw,
                            open: false,
                        },
                    );
                    found.push(device);
                }
                Ok(None) => trace!(node = %node, "not a controller"),
                Err(e) => warn!(node = %node, error = %e, "skipping unreadable device"),
            }
        }
        Ok(found)
    }

    fn open(&mut self, device: &Device) -> Result<(), ProbeError> {
        let handle = self
            .handles
            .get_mut(&device.node)
            .ok_or_else(|| ProbeError::UnknownDevice(device.node.clone()))?;
        set_nonblocking(&handle.device).map_err(|source| ProbeError::Io {
            node: device.node.clone(),
            source,
        })?;
        handle.open = true;
        Ok(())
    }

    fn poll(&mut self, device: &Device) -> Result<Vec<RawSample>, ProbeError> {
        let handle = match self.handles.get_mut(&device.node) {
            Some(h) if h.open => h,
            _ => return Err(ProbeError::NotOpen(device.node.clone())),
        };

        let mut samples = Vec::new();
        match handle.device.fetch_events() {
            Ok(events) => {
                for ev in events {
                    let code = ev.code();
                    match ev.event_type() {
                        EventType::ABSOLUTE => samples.push(RawSample::Axis {
                            code,
                            value: ev.value(),
                        }),
                        EventType::KEY if code >= BTN_MISC => samples.push(RawSample::Button {
                            code,
                            value: (ev.value() != 0) as i32,
                        }),
                        _ => {}
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(source) => {
                return Err(ProbeError::Io {
                    node: device.node.clone(),
                    source,
                })
            }
        }
        Ok(samples)
    }

    fn close(&mut self, device: &Device) {
        if let Some(handle) = self.handles.get_mut(&device.node) {
            handle.open = false;
        }
    }

    fn release(&mut self, device: &Device) {
        self.handles.remove(&device.node);
    }

    fn dpad_codes(&self) -> Option<DpadCodes> {
        Some(DpadCodes {
            up: Key::BTN_DPAD_UP.code(),
            down: Key::BTN_DPAD_DOWN.code(),
            left: Key::BTN_DPAD_LEFT.code(),
            right: Key::BTN_DPAD_RIGHT.code(),
        })
    }
}
