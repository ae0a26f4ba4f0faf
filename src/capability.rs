//! Emulated device classes a physical device can stand in for.
//!
//! The classification is a pure function of the input counts and is evaluated once,
//! right after discovery. An empty set means the device cannot drive any emulated
//! port; rejecting such devices is up to whoever assigns ports.

use bitflags::bitflags;

bitflags! {
    /// Emulatable device classes.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        const PADDLE = 0x01;
        const MOUSE = 0x02;
        const KOALAPAD = 0x04;
        const JOYSTICK = 0x08;
    }
}

impl Capabilities {
    /// Lowercase class names, in bit order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.contains(Capabilities::PADDLE) {
            out.push("paddle");
        }
        if self.contains(Capabilities::MOUSE) {
            out.push("mouse");
        }
        if self.contains(Capabilities::KOALAPAD) {
            out.push("koalapad");
        }
        if self.contains(Capabilities::JOYSTICK) {
            out.push("joystick");
        }
        out
    }
}

/// Derive capabilities from input counts.
pub fn classify(axes: usize, buttons: usize, hats: usize) -> Capabilities {
    let mut caps = Capabilities::empty();

    if axes >= 1 && buttons >= 1 {
        caps |= Capabilities::PADDLE;
    }
    if axes >= 2 && buttons >= 2 {
        caps |= Capabilities::MOUSE | Capabilities::KOALAPAD;
    }
    if (axes >= 2 && buttons >= 1) || (hats >= 1 && buttons >= 1) || buttons >= 5 {
        caps |= Capabilities::JOYSTICK;
    }

    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_axes_one_button_is_paddle_and_joystick() {
        let caps = classify(2, 1, 0);
        assert!(caps.contains(Capabilities::PADDLE));
        assert!(caps.contains(Capabilities::JOYSTICK));
        assert!(!caps.contains(Capabilities::MOUSE));
        assert!(!caps.contains(Capabilities::KOALAPAD));
    }

    #[test]
    fn mouse_and_koala_come_together() {
        let caps = classify(2, 2, 0);
        assert!(caps.contains(Capabilities::MOUSE | Capabilities::KOALAPAD));
    }

    #[test]
    fn hat_with_button_is_joystick_only() {
        assert_eq!(classify(0, 1, 1), Capabilities::JOYSTICK);
    }

    #[test]
    fn five_buttons_alone_make_a_joystick() {
        assert_eq!(classify(0, 4, 0), Capabilities::empty());
        assert_eq!(classify(0, 5, 0), Capabilities::JOYSTICK);
    }

    #[test]
    fn nothing_without_buttons() {
        assert!(classify(6, 0, 2).is_empty());
    }

    #[test]
    fn adding_inputs_never_removes_a_class() {
        for axes in 0..4 {
            for buttons in 0..7 {
                for hats in 0..3 {
                    let base = classify(axes, buttons, hats);
                    for grown in [
                        classify(axes + 1, buttons, hats),
                        classify(axes, buttons + 1, hats),
                        classify(axes, buttons, hats + 1),
                    ] {
                        assert!(
                            grown.contains(base),
                            "{axes}/{buttons}/{hats}: {base:?} not in {grown:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn names_follow_bit_order() {
        let caps = Capabilities::JOYSTICK | Capabilities::PADDLE;
        assert_eq!(caps.names(), vec!["paddle", "joystick"]);
    }
}
