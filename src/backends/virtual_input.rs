//! In-memory backend.
//!
//! [`VirtualBackend`] serves devices built in code and replays samples fed to
//! it. It also counts open/close/release calls so handle lifetimes can be
//! checked without hardware.

use super::{Backend, ProbeError};
use crate::default_map::DpadCodes;
use crate::device::Device;
use crate::event::RawSample;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Default)]
pub struct VirtualBackend {
    devices: Vec<Device>,
    /// Per node, one entry per poll.
    pending: HashMap<String, VecDeque<Vec<RawSample>>>,
    open: HashSet<String>,
    failing: HashSet<String>,
    refusing: HashSet<String>,
    dpad: Option<DpadCodes>,
    pub opened: usize,
    pub closed: usize,
    pub released: usize,
}

impl VirtualBackend {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices,
            ..Default::default()
        }
    }

    pub fn with_dpad_codes(mut self, codes: DpadCodes) -> Self {
        self.dpad = Some(codes);
        self
    }

    /// Queue the samples returned by one future poll of `node`.
    pub fn feed(&mut self, node: &str, samples: Vec<RawSample>) {
        self.pending
            .entry(node.to_string())
            .or_default()
            .push_back(samples);
    }

    /// Convenience method to queue a single axis sample.
    pub fn set_axis(&mut self, node: &str, code: u16, value: i32) {
        self.feed(node, vec![RawSample::Axis { code, value }]);
    }

    pub fn press_button(&mut self, node: &str, code: u16) {
        self.feed(node, vec![RawSample::Button { code, value: 1 }]);
    }

    pub fn release_button(&mut self, node: &str, code: u16) {
        self.feed(node, vec![RawSample::Button { code, value: 0 }]);
    }

    /// Make every later poll of `node` fail with an I/O error.
    pub fn fail_polls(&mut self, node: &str) {
        self.failing.insert(node.to_string());
    }

    /// Make every later open of `node` fail with a permission error.
    pub fn fail_opens(&mut self, node: &str) {
        self.refusing.insert(node.to_string());
    }

    pub fn is_open(&self, node: &str) -> bool {
        self.open.contains(node)
    }

    pub fn pending_polls(&self, node: &str) -> usize {
        self.pending.get(node).map_or(0, VecDeque::len)
    }
}

impl Backend for VirtualBackend {
    fn discover(&mut self) -> Result<Vec<Device>, ProbeError> {
        Ok(self.devices.clone())
    }

    fn open(&mut self, device: &Device) -> Result<(), ProbeError> {
        if !self.devices.iter().any(|d| d.node == device.node) {
            return Err(ProbeError::UnknownDevice(device.node.clone()));
        }
        if self.refusing.contains(&device.node) {
            return Err(ProbeError::Io {
                node: device.node.clone(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
            });
        }
        self.open.insert(device.node.clone());
        self.opened += 1;
        Ok(())
    }

    fn poll(&mut self, device: &Device) -> Result<Vec<RawSample>, ProbeError> {
        if !self.open.contains(&device.node) {
            return Err(ProbeError::NotOpen(device.node.clone()));
        }
        if self.failing.contains(&device.node) {
            return Err(ProbeError::Io {
                node: device.node.clone(),
                source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "device unplugged"),
            });
        }
        Ok(self
            .pending
            .get_mut(&device.node)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default())
    }

    fn close(&mut self, device: &Device) {
        if self.open.remove(&device.node) {
            self.closed += 1;
        }
    }

    fn release(&mut self, _device: &Device) {
        self.released += 1;
    }

    fn dpad_codes(&self) -> Option<DpadCodes> {
        self.dpad
    }
}
