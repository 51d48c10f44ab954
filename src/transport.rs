//! The four device channels bundled for the lifetime of the program.

use crate::usb::{CdcSerial, EndpointIo, Joystick, Keyboard, Mouse, UsbLink};

/// Every channel of the composite device over one endpoint engine.
///
/// Built once at startup and kept for the whole program; each channel
/// owns its own persistent state (peek byte, key slots, button mask).
pub struct Transport<'a, E> {
    pub serial: CdcSerial<'a, E>,
    pub keyboard: Keyboard<'a, E>,
    pub mouse: Mouse<'a, E>,
    pub joystick: Joystick<'a, E>,
    link: &'a UsbLink,
}

impl<'a, E: EndpointIo> Transport<'a, E> {
    pub fn new(io: &'a E, link: &'a UsbLink) -> Self {
        Self {
            serial: CdcSerial::new(io, link),
            keyboard: Keyboard::new(io, link),
            mouse: Mouse::new(io, link),
            joystick: Joystick::new(io, link),
            link,
        }
    }

    pub fn link(&self) -> &'a UsbLink {
        self.link
    }
}
