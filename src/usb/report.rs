//! Send-with-timeout for HID interrupt endpoints.
//!
//! Reports are state snapshots: a report that cannot be delivered within
//! `REPORT_TIMEOUT` frames is dropped, and the next one supersedes it.

use crate::config::REPORT_TIMEOUT;
use crate::hid::Report;
use crate::interrupts::hold_interrupts;

use super::endpoint::{wait_writable, EndpointIo, Readiness};
use super::link::UsbLink;

/// Largest report any channel sends.
const MAX_REPORT: usize = 16;

/// What happened to a report handed to [`ReportChannel::send`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Delivery {
    /// Released to the endpoint for the host's next poll.
    Queued,
    /// Device not configured; nothing was attempted.
    Offline,
    /// Dropped after waiting out the frame budget or losing the link.
    Dropped,
}

/// One HID IN endpoint.
pub struct ReportChannel<'a, E> {
    io: &'a E,
    link: &'a UsbLink,
    endpoint: u8,
}

impl<'a, E: EndpointIo> ReportChannel<'a, E> {
    pub fn new(io: &'a E, link: &'a UsbLink, endpoint: u8) -> Self {
        Self { io, link, endpoint }
    }

    /// Write `report` as one packet and release it.
    ///
    /// A report that does not serialize to exactly [`Report::SIZE`] bytes
    /// (e.g. one larger than any endpoint here) is dropped untouched.
    pub fn send<R: Report>(&self, report: &R) -> Delivery {
        if !self.link.is_configured() {
            return Delivery::Offline;
        }
        let mut buf = [0u8; MAX_REPORT];
        let n = report.serialize(&mut buf);
        if n == 0 || n != R::SIZE {
            warn!("hid: {}-byte report does not fit EP{}", R::SIZE, self.endpoint);
            return Delivery::Dropped;
        }

        let held = hold_interrupts();
        self.io.select(self.endpoint);
        match wait_writable(self.io, self.link, self.endpoint, REPORT_TIMEOUT, held) {
            Readiness::Ready(held) => {
                self.io.write_packet(&buf[..n]);
                self.io.release_in();
                drop(held);
                Delivery::Queued
            }
            Readiness::TimedOut => {
                debug!("hid: report on EP{} dropped, host not polling", self.endpoint);
                Delivery::Dropped
            }
            Readiness::LinkLost => {
                debug!("hid: report on EP{} dropped, link lost", self.endpoint);
                Delivery::Dropped
            }
        }
    }
}
