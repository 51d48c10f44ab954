//! Mouse interface. The button mask persists between reports; motion is
//! relative and sent once.
//!
//! Calls that send several reports return the [`Delivery`] of the last one.

use crate::config::MOUSE_ENDPOINT;
use crate::hid::mouse::button;
use crate::hid::MouseReport;

use super::endpoint::EndpointIo;
use super::link::UsbLink;
use super::report::{Delivery, ReportChannel};

pub use crate::hid::mouse::button::{BACK, FORWARD, LEFT, MIDDLE, RIGHT};

pub struct Mouse<'a, E> {
    channel: ReportChannel<'a, E>,
    buttons: u8,
}

impl<'a, E: EndpointIo> Mouse<'a, E> {
    pub fn new(io: &'a E, link: &'a UsbLink) -> Self {
        Self {
            channel: ReportChannel::new(io, link, MOUSE_ENDPOINT),
            buttons: 0,
        }
    }

    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    /// Send one report with the current buttons and this motion.
    /// -128 on any axis is sent as -127.
    pub fn move_by(&mut self, x: i8, y: i8, wheel: i8, horizontal: i8) -> Delivery {
        self.channel
            .send(&MouseReport::new(self.buttons, x, y, wheel, horizontal))
    }

    pub fn scroll(&mut self, wheel: i8, horizontal: i8) -> Delivery {
        self.move_by(0, 0, wheel, horizontal)
    }

    /// Press `buttons`, report, then release everything and report again.
    pub fn click(&mut self, buttons: u8) -> Delivery {
        self.buttons = buttons & button::ALL;
        self.move_by(0, 0, 0, 0);
        self.buttons = 0;
        self.move_by(0, 0, 0, 0)
    }

    /// Replace the whole mask and report it.
    pub fn set_buttons(
        &mut self,
        left: bool,
        middle: bool,
        right: bool,
        back: bool,
        forward: bool,
    ) -> Delivery {
        let mut mask = 0;
        if left {
            mask |= LEFT;
        }
        if middle {
            mask |= MIDDLE;
        }
        if right {
            mask |= RIGHT;
        }
        if back {
            mask |= BACK;
        }
        if forward {
            mask |= FORWARD;
        }
        self.buttons = mask;
        self.move_by(0, 0, 0, 0)
    }

    /// Add `buttons` to the mask; reports only if that changed it.
    pub fn press(&mut self, buttons: u8) -> Option<Delivery> {
        let prev = self.buttons;
        self.buttons |= buttons & button::ALL;
        (self.buttons != prev).then(|| self.move_by(0, 0, 0, 0))
    }

    /// Remove `buttons` from the mask; reports only if that changed it.
    pub fn release(&mut self, buttons: u8) -> Option<Delivery> {
        let prev = self.buttons;
        self.buttons &= !(buttons & button::ALL);
        (self.buttons != prev).then(|| self.move_by(0, 0, 0, 0))
    }

    pub fn is_pressed(&self, buttons: u8) -> bool {
        self.buttons & buttons & button::ALL != 0
    }
}
