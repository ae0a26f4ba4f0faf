//! Device registry and poll loop.
//!
//! [`DeviceRegistry`] owns one backend instance and the devices it discovered.
//! Dropping the registry releases every device's platform handle.
//!
//! Devices are polled through an [`OpenDevice`] guard: [`DeviceRegistry::open`]
//! opens the device and the guard closes it on drop, however the loop ends.

use crate::backends::{Backend, ProbeError};
use crate::default_map::{self, DefaultMapError, DirectionalPreference};
use crate::device::Device;
use crate::dispatch;
use crate::mapping::ActionSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Port assignment refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssignError {
    #[error("no device at index {0}")]
    UnknownDevice(usize),
    #[error("device \"{0}\" cannot emulate any port device")]
    NoCapabilities(String),
}

pub struct DeviceRegistry<B: Backend> {
    backend: B,
    devices: Vec<Device>,
}

impl<B: Backend> DeviceRegistry<B> {
    /// Registry with no devices yet.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            devices: Vec::new(),
        }
    }

    /// Run discovery and classify every device found.
    pub fn discover(backend: B) -> Result<Self, ProbeError> {
        let mut registry = Self::new(backend);
        registry.rescan()?;
        Ok(registry)
    }

    /// Release the current devices and discover again.
    pub fn rescan(&mut self) -> Result<usize, ProbeError> {
        self.release_all();
        let mut devices = self.backend.discover()?;
        for device in &mut devices {
            let caps = device.classify_capabilities();
            if caps.is_empty() {
                debug!(device = %device, "device has no capabilities");
            }
        }
        info!("Discovered {} device(s)", devices.len());
        self.devices = devices;
        Ok(self.devices.len())
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device(&self, index: usize) -> Option<&Device> {
        self.devices.get(index)
    }

    pub fn device_mut(&mut self, index: usize) -> Option<&mut Device> {
        self.devices.get_mut(index)
    }

    /// Resolve a selector: a list index, or a node path.
    pub fn find(&self, selector: &str) -> Option<usize> {
        if let Ok(index) = selector.parse::<usize>() {
            return (index < self.devices.len()).then_some(index);
        }
        self.devices.iter().position(|d| d.node == selector)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Assign an emulated port, refusing devices without capabilities.
    pub fn assign_port(&mut self, index: usize, port: u8) -> Result<(), AssignError> {
        let device = self
            .devices
            .get_mut(index)
            .ok_or(AssignError::UnknownDevice(index))?;
        if device.capabilities.is_empty() {
            return Err(AssignError::NoCapabilities(device.name.clone()));
        }
        device.port = Some(port);
        Ok(())
    }

    /// Apply the default mapping to a device, using this backend's D-pad codes.
    pub fn apply_default_mapping(
        &mut self,
        index: usize,
        prefer: DirectionalPreference,
    ) -> Option<Result<(), DefaultMapError>> {
        let codes = self.backend.dpad_codes();
        let device = self.devices.get_mut(index)?;
        Some(default_map::apply_default_mapping(device, codes, prefer))
    }

    /// Open a device; the returned guard closes it when dropped.
    pub fn open(&mut self, index: usize) -> Result<OpenDevice<'_, B>, ProbeError> {
        let device = self
            .devices
            .get(index)
            .ok_or_else(|| ProbeError::UnknownDevice(index.to_string()))?;
        if let Err(e) = self.backend.open(device) {
            self.backend.close(device);
            return Err(e);
        }
        debug!(device = %device, "opened");
        Ok(OpenDevice {
            registry: self,
            index,
        })
    }

    fn release_all(&mut self) {
        for device in self.devices.drain(..) {
            self.backend.release(&device);
        }
    }
}

impl<B: Backend> Drop for DeviceRegistry<B> {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// An opened device. Closing happens on drop.
pub struct OpenDevice<'a, B: Backend> {
    registry: &'a mut DeviceRegistry<B>,
    index: usize,
}

impl<B: Backend> OpenDevice<'_, B> {
    pub fn device(&self) -> &Device {
        &self.registry.devices[self.index]
    }

    pub fn device_mut(&mut self) -> &mut Device {
        &mut self.registry.devices[self.index]
    }

    /// Poll once and dispatch every sample. Returns the number of samples read.
    pub fn poll(&mut self, sink: &mut dyn ActionSink) -> Result<usize, ProbeError> {
        let registry = &mut *self.registry;
        let device = &mut registry.devices[self.index];
        let samples = registry.backend.poll(device)?;
        for sample in &samples {
            dispatch::dispatch(device, *sample, sink);
        }
        Ok(samples.len())
    }
}

impl<B: Backend> Drop for OpenDevice<'_, B> {
    fn drop(&mut self) {
        let registry = &mut *self.registry;
        let device = &registry.devices[self.index];
        registry.backend.close(device);
        debug!(device = %device, "closed");
    }
}

/// Poll until `stop` is set or a poll fails.
///
/// `stop` is checked once per iteration, before each poll; a poll in progress
/// always completes. Returns the number of completed polls.
pub fn run_poll_loop<B: Backend>(
    open: &mut OpenDevice<'_, B>,
    sink: &mut dyn ActionSink,
    interval: Duration,
    stop: &AtomicBool,
) -> Result<u64, ProbeError> {
    let mut polls = 0u64;
    while !stop.load(Ordering::SeqCst) {
        if let Err(e) = open.poll(sink) {
            warn!(device = %open.device(), error = %e, "poll failed");
            return Err(e);
        }
        polls += 1;
        if !interval.is_zero() {
            std::thread::sleep(interval);
        }
    }
    debug!(polls, "poll loop stopped");
    Ok(polls)
}
