//! Device link state shared with the USB core.
//!
//! The enumeration state machine and control-request handling live in a
//! lower-level USB core (outside this crate). That core reports what it
//! learns through the setters here, from its own interrupt context. The
//! transport only ever reads, apart from the CDC flush timer, which it
//! shares with the start-of-frame interrupt.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use critical_section::{CriticalSection, Mutex};

/// DTR bit of the CDC SET_CONTROL_LINE_STATE value.
pub const CONTROL_LINE_DTR: u8 = 0x01;
/// RTS bit of the CDC SET_CONTROL_LINE_STATE value.
pub const CONTROL_LINE_RTS: u8 = 0x02;

/// CDC line coding as last set by the host (SET_LINE_CODING).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineCoding {
    pub baud: u32,
    /// 0 = 1 stop bit, 1 = 1.5, 2 = 2.
    pub stop_bits: u8,
    /// 0 = none, 1 = odd, 2 = even, 3 = mark, 4 = space.
    pub parity_type: u8,
    /// 5, 6, 7, 8 or 16.
    pub data_bits: u8,
}

impl LineCoding {
    pub const DEFAULT: Self = Self {
        baud: 0,
        stop_bits: 0,
        parity_type: 0,
        data_bits: 8,
    };

    /// Parse the 7-byte SET_LINE_CODING payload.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 7 {
            return None;
        }
        Some(Self {
            baud: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
            stop_bits: data[4],
            parity_type: data[5],
            data_bits: data[6],
        })
    }
}

impl Default for LineCoding {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Link flags and CDC control state.
///
/// Meant to live in a `static`; every field is interrupt-safe.
pub struct UsbLink {
    configured: AtomicBool,
    suspended: AtomicBool,
    line_coding: Mutex<Cell<LineCoding>>,
    control_lines: AtomicU8,
    /// Frames left before a partial CDC packet is released; 0 = disarmed.
    flush_timer: Mutex<Cell<u8>>,
}

impl UsbLink {
    pub const fn new() -> Self {
        Self {
            configured: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
            line_coding: Mutex::new(Cell::new(LineCoding::DEFAULT)),
            control_lines: AtomicU8::new(0),
            flush_timer: Mutex::new(Cell::new(0)),
        }
    }

    // Read side (transport)

    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::Acquire)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    pub fn line_coding(&self) -> LineCoding {
        critical_section::with(|cs| self.line_coding.borrow(cs).get())
    }

    pub fn control_lines(&self) -> u8 {
        self.control_lines.load(Ordering::Acquire)
    }

    // Write side (USB core)

    pub fn set_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::Release);
    }

    pub fn set_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::Release);
    }

    pub fn set_line_coding(&self, coding: LineCoding) {
        critical_section::with(|cs| self.line_coding.borrow(cs).set(coding));
    }

    pub fn set_control_lines(&self, lines: u8) {
        self.control_lines.store(lines, Ordering::Release);
    }

    // CDC flush timer, shared between main line and the SOF interrupt

    pub(crate) fn flush_timer(&self, cs: CriticalSection<'_>) -> u8 {
        self.flush_timer.borrow(cs).get()
    }

    pub(crate) fn set_flush_timer(&self, cs: CriticalSection<'_>, frames: u8) {
        self.flush_timer.borrow(cs).set(frames);
    }
}

impl Default for UsbLink {
    fn default() -> Self {
        Self::new()
    }
}
