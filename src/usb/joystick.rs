//! Joystick interface: the application edits the raw report, `send_now`
//! ships it.

use crate::config::JOYSTICK_ENDPOINT;
use crate::hid::joystick::JOYSTICK_REPORT_SIZE;
use crate::hid::JoystickReport;

use super::endpoint::EndpointIo;
use super::link::UsbLink;
use super::report::{Delivery, ReportChannel};

pub struct Joystick<'a, E> {
    channel: ReportChannel<'a, E>,
    report: JoystickReport,
}

impl<'a, E: EndpointIo> Joystick<'a, E> {
    pub fn new(io: &'a E, link: &'a UsbLink) -> Self {
        Self {
            channel: ReportChannel::new(io, link, JOYSTICK_ENDPOINT),
            report: JoystickReport::default(),
        }
    }

    pub fn report(&self) -> &JoystickReport {
        &self.report
    }

    pub fn report_mut(&mut self) -> &mut [u8; JOYSTICK_REPORT_SIZE] {
        self.report.as_bytes_mut()
    }

    pub fn set_report(&mut self, report: JoystickReport) {
        self.report = report;
    }

    pub fn send_now(&mut self) -> Delivery {
        self.channel.send(&self.report)
    }
}
