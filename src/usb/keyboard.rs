//! Keyboard interface: a persistent report plus the calls that change and
//! send it.
//!
//! Calls that send several reports return the [`Delivery`] of the last one.

use crate::config::KEYBOARD_ENDPOINT;
use crate::error::Error;
use crate::hid::KeyboardReport;

use super::endpoint::EndpointIo;
use super::link::UsbLink;
use super::report::{Delivery, ReportChannel};

pub struct Keyboard<'a, E> {
    channel: ReportChannel<'a, E>,
    report: KeyboardReport,
}

impl<'a, E: EndpointIo> Keyboard<'a, E> {
    pub fn new(io: &'a E, link: &'a UsbLink) -> Self {
        Self {
            channel: ReportChannel::new(io, link, KEYBOARD_ENDPOINT),
            report: KeyboardReport::empty(),
        }
    }

    /// The report as it would be sent now.
    pub fn report(&self) -> &KeyboardReport {
        &self.report
    }

    // Raw slot access. Nothing is sent until `send_now`.

    pub fn set_modifier(&mut self, modifier: u8) {
        self.report.modifier = modifier;
    }

    pub fn set_key1(&mut self, key: u8) {
        self.report.keycodes[0] = key;
    }

    pub fn set_key2(&mut self, key: u8) {
        self.report.keycodes[1] = key;
    }

    pub fn set_key3(&mut self, key: u8) {
        self.report.keycodes[2] = key;
    }

    pub fn set_key4(&mut self, key: u8) {
        self.report.keycodes[3] = key;
    }

    pub fn set_key5(&mut self, key: u8) {
        self.report.keycodes[4] = key;
    }

    pub fn set_key6(&mut self, key: u8) {
        self.report.keycodes[5] = key;
    }

    pub fn send_now(&mut self) -> Delivery {
        self.channel.send(&self.report)
    }

    /// Release every key and modifier. Sends nothing, and returns `None`,
    /// if nothing was down.
    pub fn release_all(&mut self) -> Option<Delivery> {
        if self.report.is_empty() {
            return None;
        }
        self.report.clear();
        Some(self.send_now())
    }

    /// Press `key` (a usage code, modifiers included) and send the report.
    pub fn press(&mut self, key: u8) -> Result<Delivery, Error> {
        self.report.press(key)?;
        Ok(self.send_now())
    }

    /// Release `key` and send the report.
    pub fn release(&mut self, key: u8) -> Result<Delivery, Error> {
        self.report.release(key)?;
        Ok(self.send_now())
    }

    /// Press and release `key`.
    pub fn tap(&mut self, key: u8) -> Result<Delivery, Error> {
        self.press(key)?;
        self.release(key)
    }

    /// Type `key` with `modifier` held: modifier down, key down, key up,
    /// modifier up, one report each.
    pub fn send_key_with_modifier(&mut self, key: u8, modifier: u8) -> Delivery {
        self.set_modifier(modifier);
        self.send_now();
        self.set_key1(key);
        self.send_now();
        self.set_key1(0);
        self.send_now();
        self.set_modifier(0);
        self.send_now()
    }
}
