//! Action sink wrapper that logs every performed mapping.
use crate::mapping::{ActionSink, KeyPosition, PotAxis};
use tracing::info;

/// Logs each action at `info` level and forwards it to the wrapped sink.
pub struct Logger<S> {
    inner: S,
}

impl<S: ActionSink> Logger<S> {
    pub fn new(inner: S) -> Self {
        Logger { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ActionSink> ActionSink for Logger<S> {
    fn pin(&mut self, port: Option<u8>, pin: u16, value: i32) {
        info!(?port, pin = format_args!("0x{:02x}", pin), value, "pin");
        self.inner.pin(port, pin, value);
    }

    fn key(&mut self, key: KeyPosition, value: i32) {
        info!(row = key.row, column = key.column, flags = key.flags, value, "key");
        self.inner.key(key, value);
    }

    fn pot(&mut self, port: Option<u8>, axis: PotAxis, value: i32) {
        info!(?port, axis = axis.as_str(), value, "pot");
        self.inner.pot(port, axis, value);
    }

    fn ui_action(&mut self, name: &str) {
        info!(action = name, "ui action");
        self.inner.ui_action(name);
    }

    fn ui_activate(&mut self) {
        info!("ui activate");
        self.inner.ui_activate();
    }
}
