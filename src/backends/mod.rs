//! Device-probe backends.
//!
//! A [`Backend`] discovers devices, owns their platform handles, and turns raw
//! platform input into [`RawSample`]s. The core never sees a handle: backends
//! key them by [`Device::node`] and free them in [`Backend::release`].
//!
//! # Feature flags
//! - **`evdev`**: Linux evdev backend (default, Linux only).
//!
//! The [`virtual_input`] backend is always built; it serves tests and demos.

use crate::calibration::DigitalPolicy;
use crate::default_map::DpadCodes;
use crate::device::Device;
use crate::event::RawSample;
use thiserror::Error;

#[cfg(all(feature = "evdev", target_os = "linux"))]
#[cfg_attr(docsrs, doc(cfg(all(feature = "evdev", target_os = "linux"))))]
pub mod linux;
pub mod virtual_input;

/// Failure reported by a backend.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("I/O error on {node}: {source}")]
    Io {
        node: String,
        #[source]
        source: std::io::Error,
    },

    #[error("device {0} is not open")]
    NotOpen(String),

    #[error("unknown device {0}")]
    UnknownDevice(String),

    #[error("no device backend available on this platform")]
    Unsupported,
}

/// Platform device probe.
///
/// Calls for one device are never interleaved with calls for the same device
/// from elsewhere; the registry drives everything from one thread.
pub trait Backend {
    /// Enumerate devices. No hardware is `Ok(vec![])`; a node that cannot be
    /// read is skipped.
    fn discover(&mut self) -> Result<Vec<Device>, ProbeError>;

    fn open(&mut self, device: &Device) -> Result<(), ProbeError>;

    /// Read pending input. "Nothing available" is an empty vector, never an error.
    fn poll(&mut self, device: &Device) -> Result<Vec<RawSample>, ProbeError>;

    /// Safe to call on a device that was never (successfully) opened.
    fn close(&mut self, device: &Device);

    /// Free the platform handle of `device`.
    fn release(&mut self, device: &Device);

    /// Button codes of this platform's D-pad, if it has a convention for them.
    fn dpad_codes(&self) -> Option<DpadCodes> {
        None
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn discover(&mut self) -> Result<Vec<Device>, ProbeError> {
        (**self).discover()
    }

    fn open(&mut self, device: &Device) -> Result<(), ProbeError> {
        (**self).open(device)
    }

    fn poll(&mut self, device: &Device) -> Result<Vec<RawSample>, ProbeError> {
        (**self).poll(device)
    }

    fn close(&mut self, device: &Device) {
        (**self).close(device)
    }

    fn release(&mut self, device: &Device) {
        (**self).release(device)
    }

    fn dpad_codes(&self) -> Option<DpadCodes> {
        (**self).dpad_codes()
    }
}

/// The hardware backend for the current platform.
pub fn platform_backend(policy: DigitalPolicy) -> Result<Box<dyn Backend>, ProbeError> {
    #[cfg(all(feature = "evdev", target_os = "linux"))]
    {
        Ok(Box::new(linux::EvdevBackend::new(policy)))
    }

    #[cfg(not(all(feature = "evdev", target_os = "linux")))]
    {
        let _ = policy;
        Err(ProbeError::Unsupported)
    }
}
