//! Game-controller normalization for emulator input ports.
//!
//! Backends discover controllers and produce [`RawSample`]s; the dispatcher
//! turns them into edges on axes, buttons and hats and performs the mapping
//! bound to each edge. Mappings come from a built-in default table and can be
//! overridden per device by a `.vjm` [`Joymap`].

pub mod backends;
pub mod calibration;
pub mod capability;
pub mod config;
pub mod default_map;
pub mod device;
pub mod dispatch;
pub mod event;
pub mod joymap;
pub mod logger;
pub mod manager;
pub mod mapping;
pub mod metadata;
pub mod snapshot;

pub use capability::Capabilities;
pub use config::Config;
pub use device::*;
pub use event::*;
pub use joymap::{Joymap, JoymapError};
pub use manager::*;
pub use mapping::{ActionSink, Mapping};
