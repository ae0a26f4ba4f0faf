//! Joymap files (`.vjm`): per-device mapping overrides.
//!
//! A joymap is a line-oriented text file naming the device it was written for
//! and one mapping per line:
//!
//! ```text
//! # Competition Pro, hat on the d-pad, fire on both triggers
//! vjm-version 2.0
//! device-name "Competition Pro"
//! device-vendor 0x0079
//! device-product 0x0006
//! pin hat 0 up 0x01
//! pin button 288 0x10
//! key button 289 7 4
//! action button 297 "toggle-warp"
//! ```
//!
//! # Conventions
//! - Loading is all-or-nothing: the first malformed line aborts with
//!   [`JoymapError::Parse`], carrying `file:line:column`.
//! - Unknown keywords are warned about and skipped so newer files still load.
//! - [`Joymap::apply`] only touches the slots the file names; everything else
//!   keeps its current (usually default) mapping.

mod parser;

use crate::device::Device;
use crate::event::InputRef;
use crate::mapping::Mapping;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Major version this crate reads and writes.
pub const SUPPORTED_MAJOR: u32 = 2;

#[derive(Debug, Error)]
pub enum JoymapError {
    #[error("{file}:{line}:{column}: {message}")]
    Parse {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("cannot access joymap {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("joymap is for {field} 0x{expected:04x}, device has 0x{actual:04x}")]
    DeviceMismatch {
        field: &'static str,
        expected: u16,
        actual: u16,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JoymapVersion {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for JoymapVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// One override line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoymapEntry {
    pub input: InputRef,
    pub mapping: Mapping,
    /// Source line, 0 when built in memory.
    pub line: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Joymap {
    pub version: Option<JoymapVersion>,
    pub device_name: Option<String>,
    pub device_vendor: Option<u16>,
    pub device_product: Option<u16>,
    pub device_version: Option<u16>,
    pub entries: Vec<JoymapEntry>,
}

impl Joymap {
    /// Parse `text`; `file_name` only labels errors.
    pub fn parse(file_name: &str, text: &str) -> Result<Self, JoymapError> {
        parser::Parser::new(file_name).parse(text)
    }

    /// Read and parse a file. Errors name the file by its base name.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, JoymapError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| JoymapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let joymap = Self::parse(&file_name, &text)?;
        debug!(
            file = %file_name,
            entries = joymap.entries.len(),
            "joymap loaded"
        );
        Ok(joymap)
    }

    /// Capture a device's identity and all of its non-`None` mappings.
    pub fn from_device(device: &Device) -> Self {
        let entries = device
            .mapped_inputs()
            .into_iter()
            .map(|(input, mapping)| JoymapEntry {
                input,
                mapping: mapping.clone(),
                line: 0,
            })
            .collect();
        Joymap {
            version: Some(JoymapVersion {
                major: SUPPORTED_MAJOR,
                minor: 0,
            }),
            device_name: Some(device.name.clone()),
            device_vendor: Some(device.vendor),
            device_product: Some(device.product),
            device_version: Some(device.version),
            entries,
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), JoymapError> {
        let path = path.as_ref();
        fs::write(path, self.to_string()).map_err(|source| JoymapError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Install the overrides on `device`. Returns how many were applied.
    ///
    /// Vendor and product, when the file names them, must match the device.
    /// Overrides for inputs the device lacks are skipped with a warning.
    pub fn apply(self, device: &mut Device) -> Result<usize, JoymapError> {
        let checks = [
            ("vendor", self.device_vendor, device.vendor),
            ("product", self.device_product, device.product),
        ];
        for (field, expected, actual) in checks {
            if let Some(expected) = expected {
                if expected != actual {
                    return Err(JoymapError::DeviceMismatch {
                        field,
                        expected,
                        actual,
                    });
                }
            }
        }

        let mut applied = 0;
        for entry in self.entries {
            match device.mapping_mut(&entry.input) {
                Some(slot) => {
                    *slot = entry.mapping;
                    applied += 1;
                }
                None => warn!(
                    device = %device,
                    line = entry.line,
                    "no {} on this device, skipping",
                    entry.input
                ),
            }
        }
        Ok(applied)
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in text.chars() {
        if c == '"' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("\"")
}

impl fmt::Display for Joymap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(version) = self.version {
            writeln!(f, "vjm-version {version}")?;
        }
        if let Some(name) = &self.device_name {
            f.write_str("device-name ")?;
            write_quoted(f, name)?;
            writeln!(f)?;
        }
        if let Some(vendor) = self.device_vendor {
            writeln!(f, "device-vendor 0x{vendor:04x}")?;
        }
        if let Some(product) = self.device_product {
            writeln!(f, "device-product 0x{product:04x}")?;
        }
        if let Some(version) = self.device_version {
            writeln!(f, "device-version 0x{version:04x}")?;
        }

        for JoymapEntry { input, mapping, .. } in &self.entries {
            match mapping {
                Mapping::None => continue,
                Mapping::Pin(pin) => write!(f, "pin {input} 0x{pin:02x}")?,
                Mapping::Pot(axis) => write!(f, "pot {input} {}", axis.as_str())?,
                Mapping::Key(key) => {
                    write!(f, "key {input} {} {}", key.row, key.column)?;
                    if key.flags != 0 {
                        write!(f, " 0x{:x}", key.flags)?;
                    }
                }
                Mapping::UiAction(name) => {
                    write!(f, "action {input} ")?;
                    write_quoted(f, name)?;
                }
                Mapping::UiActivate => write!(f, "activate {input}")?,
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
