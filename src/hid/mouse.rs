//! USB HID mouse report.
//!
//! Layout (5 bytes):
//! ```text
//! Byte 0: Button bitfield
//!         Bit 0 = Left, Bit 1 = Right, Bit 2 = Middle,
//!         Bit 3 = Back, Bit 4 = Forward
//! Byte 1: X displacement (signed, -127..127)
//! Byte 2: Y displacement (signed, -127..127)
//! Byte 3: Scroll wheel   (signed, -127..127)
//! Byte 4: Horizontal wheel (signed, -127..127)
//! ```

use super::Report;

/// Mouse report size in bytes.
pub const MOUSE_REPORT_SIZE: usize = 5;

/// Button bits.
pub mod button {
    pub const LEFT: u8 = 0x01;
    pub const RIGHT: u8 = 0x02;
    pub const MIDDLE: u8 = 0x04;
    pub const BACK: u8 = 0x08;
    pub const FORWARD: u8 = 0x10;
    /// Every button the report can carry.
    pub const ALL: u8 = 0x1F;
}

/// Map -128 to -127: the descriptor's logical range is symmetric.
pub const fn clamp_axis(v: i8) -> i8 {
    if v == i8::MIN {
        -127
    } else {
        v
    }
}

/// Mouse report with five buttons, two axes and two wheels.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    /// Button bitfield, see [`button`].
    pub buttons: u8,
    /// Relative X movement (signed).
    pub x: i8,
    /// Relative Y movement (signed).
    pub y: i8,
    /// Scroll wheel delta (signed).
    pub wheel: i8,
    /// Horizontal wheel delta (signed).
    pub horizontal: i8,
}

impl MouseReport {
    /// A report carrying `buttons` and the given motion, every axis clamped.
    pub const fn new(buttons: u8, x: i8, y: i8, wheel: i8, horizontal: i8) -> Self {
        Self {
            buttons,
            x: clamp_axis(x),
            y: clamp_axis(y),
            wheel: clamp_axis(wheel),
            horizontal: clamp_axis(horizontal),
        }
    }
}

impl Report for MouseReport {
    const SIZE: usize = MOUSE_REPORT_SIZE;

    fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < MOUSE_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.buttons;
        buf[1] = self.x as u8;
        buf[2] = self.y as u8;
        buf[3] = self.wheel as u8;
        buf[4] = self.horizontal as u8;
        MOUSE_REPORT_SIZE
    }
}
