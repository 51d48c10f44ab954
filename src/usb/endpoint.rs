//! Endpoint engine capability and the shared transmit wait loop.
//!
//! [`EndpointIo`] is the register-level surface of the USB endpoint engine:
//! one global endpoint selection, a FIFO per endpoint, and control bits to
//! hand packets between CPU and controller. Every method operates on the
//! endpoint chosen by the last [`EndpointIo::select`], so callers must hold
//! interrupts from `select` to their last FIFO access.

use crate::interrupts::{hold_interrupts, HeldInterrupts};

use super::link::UsbLink;

/// CPU side of the endpoint engine.
pub trait EndpointIo {
    /// Route subsequent FIFO/control accesses to `endpoint`.
    fn select(&self, endpoint: u8);

    /// IN: the FIFO can take another byte. OUT: the FIFO holds unread bytes.
    fn is_rw_allowed(&self) -> bool;

    /// OUT: a packet was received and has not been released yet.
    fn has_received(&self) -> bool;

    /// Bytes currently in the selected FIFO.
    fn byte_count(&self) -> u8;

    /// Take one byte from the selected OUT FIFO.
    fn read_byte(&self) -> u8;

    /// Append one byte to the selected IN FIFO.
    fn write_byte(&self, byte: u8);

    /// Retire the current OUT packet so the host may send the next one.
    fn release_out(&self);

    /// Hand the current IN packet to the controller for the host's next poll.
    fn release_in(&self);

    /// Low byte of the current USB frame number.
    fn frame_number(&self) -> u8;

    /// Append `bytes` to the selected IN FIFO.
    fn write_packet(&self, bytes: &[u8]) {
        for &b in bytes {
            self.write_byte(b);
        }
    }
}

impl<E: EndpointIo + ?Sized> EndpointIo for &E {
    fn select(&self, endpoint: u8) {
        (**self).select(endpoint)
    }
    fn is_rw_allowed(&self) -> bool {
        (**self).is_rw_allowed()
    }
    fn has_received(&self) -> bool {
        (**self).has_received()
    }
    fn byte_count(&self) -> u8 {
        (**self).byte_count()
    }
    fn read_byte(&self) -> u8 {
        (**self).read_byte()
    }
    fn write_byte(&self, byte: u8) {
        (**self).write_byte(byte)
    }
    fn release_out(&self) {
        (**self).release_out()
    }
    fn release_in(&self) {
        (**self).release_in()
    }
    fn frame_number(&self) -> u8 {
        (**self).frame_number()
    }
    fn write_packet(&self, bytes: &[u8]) {
        (**self).write_packet(bytes)
    }
}

/// Outcome of waiting for an IN FIFO.
#[must_use]
pub enum Readiness {
    /// Writable. The endpoint is selected and interrupts are still held
    /// by the carried guard, so the packet can be copied without a gap.
    Ready(HeldInterrupts),
    /// The frame budget ran out; the host is not reading.
    TimedOut,
    /// The device left the configured state while waiting.
    LinkLost,
}

/// Wait until `endpoint` can accept data.
///
/// `held` must already cover a `select(endpoint)`. Between polls the hold is
/// dropped so the SOF and tick interrupts can run, then re-taken and the
/// endpoint re-selected. The deadline is `budget` frames after entry and is
/// matched exactly, like the 8-bit frame counter it is read from.
pub fn wait_writable<E: EndpointIo + ?Sized>(
    io: &E,
    link: &UsbLink,
    endpoint: u8,
    budget: u8,
    held: HeldInterrupts,
) -> Readiness {
    let deadline = io.frame_number().wrapping_add(budget);
    let mut held = held;
    loop {
        if io.is_rw_allowed() {
            return Readiness::Ready(held);
        }
        drop(held);

        if io.frame_number() == deadline {
            return Readiness::TimedOut;
        }
        if !link.is_configured() {
            return Readiness::LinkLost;
        }

        held = hold_interrupts();
        io.select(endpoint);
    }
}
