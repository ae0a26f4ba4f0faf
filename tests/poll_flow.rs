use joymap::backends::virtual_input::VirtualBackend;
use joymap::backends::{Backend, ProbeError};
use joymap::default_map::{DirectionalPreference, DpadCodes};
use joymap::mapping::{pins, ActionSink, KeyPosition, PotAxis};
use joymap::snapshot::EmulatedState;
use joymap::{run_poll_loop, Axis, Button, Device, DeviceRegistry, Hat, Joymap, RawSample};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const NODE: &str = "virtual:0";
const TRIGGER: u16 = 0x120;
const THUMB: u16 = 0x121;
const HAT_X: u16 = 0x10;
const HAT_Y: u16 = 0x11;

fn competition_pro() -> Device {
    let mut dev = Device::new("Competition Pro", NODE).with_ids(0x0079, 0x0006, 0x0107);
    dev.axes.push(Axis::new(0, "ABS_X", 0, 255));
    dev.axes.push(Axis::new(1, "ABS_Y", 0, 255));
    dev.buttons.push(Button::new(TRIGGER, "BTN_TRIGGER"));
    dev.buttons.push(Button::new(THUMB, "BTN_THUMB"));
    dev.hats.push(Hat::from_axes(
        "hat0",
        Axis::new(HAT_X, "ABS_HAT0X", -1, 1),
        Axis::new(HAT_Y, "ABS_HAT0Y", -1, 1),
    ));
    dev
}

fn registry() -> DeviceRegistry<VirtualBackend> {
    DeviceRegistry::discover(VirtualBackend::new(vec![competition_pro()])).unwrap()
}

/// Sets `stop` once fire is pressed.
struct StopOnFire<'a> {
    state: EmulatedState,
    stop: &'a AtomicBool,
}

impl ActionSink for StopOnFire<'_> {
    fn pin(&mut self, port: Option<u8>, pin: u16, value: i32) {
        if pin == pins::FIRE && value != 0 {
            self.stop.store(true, Ordering::SeqCst);
        }
        self.state.pin(port, pin, value);
    }

    fn key(&mut self, key: KeyPosition, value: i32) {
        self.state.key(key, value);
    }

    fn pot(&mut self, port: Option<u8>, axis: PotAxis, value: i32) {
        ActionSink::pot(&mut self.state, port, axis, value);
    }

    fn ui_action(&mut self, name: &str) {
        self.state.ui_action(name);
    }

    fn ui_activate(&mut self) {
        self.state.ui_activate();
    }
}

#[test]
fn default_mapping_reaches_the_port() {
    let mut reg = registry();
    reg.apply_default_mapping(0, DirectionalPreference::Hat)
        .unwrap()
        .unwrap();
    reg.assign_port(0, 2).unwrap();

    let backend = reg.backend_mut();
    backend.feed(
        NODE,
        vec![
            RawSample::Axis { code: HAT_X, value: -1 },
            RawSample::Axis { code: HAT_Y, value: -1 },
        ],
    );
    backend.press_button(NODE, TRIGGER);
    backend.set_axis(NODE, HAT_X, 0);

    let mut state = EmulatedState::default();
    let mut open = reg.open(0).unwrap();

    assert_eq!(open.poll(&mut state).unwrap(), 2);
    assert_eq!(state.pins(Some(2)), pins::UP | pins::LEFT);

    open.poll(&mut state).unwrap();
    assert_eq!(state.pins(Some(2)), pins::UP | pins::LEFT | pins::FIRE);

    open.poll(&mut state).unwrap();
    assert_eq!(state.pins(Some(2)), pins::UP | pins::FIRE);

    // nothing queued: an empty poll changes nothing
    assert_eq!(open.poll(&mut state).unwrap(), 0);
    assert_eq!(state.pins(Some(2)), pins::UP | pins::FIRE);
    assert_eq!(state.pins(None), 0);
}

#[test]
fn loop_stops_after_the_poll_that_set_the_flag() {
    let mut reg = registry();
    reg.apply_default_mapping(0, DirectionalPreference::Hat)
        .unwrap()
        .unwrap();
    reg.assign_port(0, 1).unwrap();

    let backend = reg.backend_mut();
    backend.feed(NODE, vec![]);
    backend.press_button(NODE, TRIGGER);
    backend.release_button(NODE, TRIGGER);

    let stop = AtomicBool::new(false);
    let mut sink = StopOnFire {
        state: EmulatedState::default(),
        stop: &stop,
    };
    let mut open = reg.open(0).unwrap();
    let polls = run_poll_loop(&mut open, &mut sink, Duration::from_millis(1), &stop).unwrap();
    drop(open);

    assert_eq!(polls, 2);
    assert_eq!(sink.state.pins(Some(1)), pins::FIRE);
    assert_eq!(reg.backend().pending_polls(NODE), 1);
    assert_eq!(reg.backend().closed, 1);
}

#[test]
fn failed_poll_still_closes_the_device() {
    let mut reg = registry();
    reg.backend_mut().fail_polls(NODE);

    let stop = AtomicBool::new(false);
    let mut state = EmulatedState::default();
    let result = {
        let mut open = reg.open(0).unwrap();
        run_poll_loop(&mut open, &mut state, Duration::ZERO, &stop)
    };

    assert!(matches!(result, Err(ProbeError::Io { .. })));
    assert_eq!(reg.backend().opened, 1);
    assert_eq!(reg.backend().closed, 1);
    assert!(!reg.backend().is_open(NODE));
}

#[test]
fn refused_open_closes_nothing() {
    let mut reg = registry();
    reg.backend_mut().fail_opens(NODE);

    assert!(matches!(reg.open(0), Err(ProbeError::Io { .. })));
    assert_eq!(reg.backend().opened, 0);
    assert_eq!(reg.backend().closed, 0);
    assert!(!reg.backend().is_open(NODE));

    // a refused device is still released with the registry
    assert_eq!(reg.rescan().unwrap(), 1);
    assert_eq!(reg.backend().released, 1);
}

#[test]
fn joymap_overrides_default_mapping() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("competition-pro.vjm");
    std::fs::write(
        &path,
        concat!(
            "# swap fire onto the thumb button, trigger types space\n",
            "vjm-version 2.0\n",
            "device-name \"Competition Pro\"\n",
            "device-vendor 0x0079\n",
            "device-product 0x0006\n",
            "pin button 289 0x10\n",
            "key button 288 7 4\n",
            "pot axis 0 positive x\n",
        ),
    )
    .unwrap();

    let mut reg = registry();
    reg.apply_default_mapping(0, DirectionalPreference::Hat)
        .unwrap()
        .unwrap();
    let joymap = Joymap::load(&path).unwrap();
    assert_eq!(joymap.apply(reg.device_mut(0).unwrap()).unwrap(), 3);
    reg.assign_port(0, 1).unwrap();

    let backend = reg.backend_mut();
    backend.press_button(NODE, TRIGGER);
    backend.press_button(NODE, THUMB);
    backend.set_axis(NODE, 0, 250);

    let space = KeyPosition {
        row: 7,
        column: 4,
        flags: 0,
    };
    let mut state = EmulatedState::default();
    let mut open = reg.open(0).unwrap();
    open.poll(&mut state).unwrap();
    assert!(state.is_key_held(&space));
    assert_eq!(state.pins(Some(1)), 0);

    open.poll(&mut state).unwrap();
    assert_eq!(state.pins(Some(1)), pins::FIRE);

    open.poll(&mut state).unwrap();
    assert_eq!(state.pot(Some(1), PotAxis::X), 1);
}

#[test]
fn dpad_preference_comes_from_the_backend() {
    let codes = DpadCodes {
        up: 0x220,
        down: 0x221,
        left: 0x222,
        right: 0x223,
    };
    let mut pad = competition_pro();
    for (code, name) in [
        (codes.up, "BTN_DPAD_UP"),
        (codes.down, "BTN_DPAD_DOWN"),
        (codes.left, "BTN_DPAD_LEFT"),
        (codes.right, "BTN_DPAD_RIGHT"),
    ] {
        pad.buttons.push(Button::new(code, name));
    }
    let backend = VirtualBackend::new(vec![pad]).with_dpad_codes(codes);
    let mut reg = DeviceRegistry::discover(backend).unwrap();
    reg.apply_default_mapping(0, DirectionalPreference::Dpad)
        .unwrap()
        .unwrap();
    reg.assign_port(0, 1).unwrap();

    reg.backend_mut().press_button(NODE, codes.right);
    reg.backend_mut().set_axis(NODE, HAT_X, -1);

    let mut state = EmulatedState::default();
    let mut open = reg.open(0).unwrap();
    open.poll(&mut state).unwrap();
    assert_eq!(state.pins(Some(1)), pins::RIGHT);
    // the hat is unmapped under this preference
    open.poll(&mut state).unwrap();
    assert_eq!(state.pins(Some(1)), pins::RIGHT);
}

/// Counts releases outside the registry, which owns the backend.
struct Tracked {
    inner: VirtualBackend,
    released: Rc<Cell<usize>>,
}

impl Backend for Tracked {
    fn discover(&mut self) -> Result<Vec<Device>, ProbeError> {
        self.inner.discover()
    }

    fn open(&mut self, device: &Device) -> Result<(), ProbeError> {
        self.inner.open(device)
    }

    fn poll(&mut self, device: &Device) -> Result<Vec<RawSample>, ProbeError> {
        self.inner.poll(device)
    }

    fn close(&mut self, device: &Device) {
        self.inner.close(device)
    }

    fn release(&mut self, device: &Device) {
        self.released.set(self.released.get() + 1);
        self.inner.release(device)
    }
}

#[test]
fn registry_releases_devices() {
    let released = Rc::new(Cell::new(0));
    let mut second = competition_pro();
    second.node = "virtual:1".into();
    let backend = Tracked {
        inner: VirtualBackend::new(vec![competition_pro(), second]),
        released: Rc::clone(&released),
    };

    let mut reg = DeviceRegistry::discover(backend).unwrap();
    assert_eq!(reg.rescan().unwrap(), 2);
    assert_eq!(released.get(), 2);

    drop(reg);
    assert_eq!(released.get(), 4);
}

#[test]
fn unknown_device_cannot_be_opened() {
    let mut reg = registry();
    assert!(matches!(reg.open(3), Err(ProbeError::UnknownDevice(_))));
    assert_eq!(reg.backend().opened, 0);
}
