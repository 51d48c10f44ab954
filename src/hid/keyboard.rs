//! USB HID keyboard report (boot protocol compatible).
//!
//! Layout (8 bytes):
//! ```text
//! Byte 0: Modifier keys (bitfield)
//!         Bit 0 = Left Ctrl,  Bit 1 = Left Shift,
//!         Bit 2 = Left Alt,   Bit 3 = Left GUI,
//!         Bit 4 = Right Ctrl, Bit 5 = Right Shift,
//!         Bit 6 = Right Alt,  Bit 7 = Right GUI
//! Byte 1: Reserved (0x00)
//! Byte 2-7: Up to 6 simultaneous key codes (USB HID usage codes)
//! ```
//!
//! Modifier keys also have usage codes of their own (0xE0..=0xE7, same
//! order as the bits). [`KeyboardReport::press`] and
//! [`KeyboardReport::release`] accept either kind and route modifier usages
//! to the bitfield.

use crate::error::Error;

use super::Report;

/// Keyboard report size in bytes.
pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Number of simultaneous non-modifier keys.
pub const KEY_SLOTS: usize = 6;

/// Modifier bitfield values.
pub mod modifier {
    pub const LEFT_CTRL: u8 = 0x01;
    pub const LEFT_SHIFT: u8 = 0x02;
    pub const LEFT_ALT: u8 = 0x04;
    pub const LEFT_GUI: u8 = 0x08;
    pub const RIGHT_CTRL: u8 = 0x10;
    pub const RIGHT_SHIFT: u8 = 0x20;
    pub const RIGHT_ALT: u8 = 0x40;
    pub const RIGHT_GUI: u8 = 0x80;
}

/// First and last modifier usage codes (Left Ctrl .. Right GUI).
const MODIFIER_USAGES: core::ops::RangeInclusive<u8> = 0xE0..=0xE7;

/// Bit in the modifier byte for a modifier usage code.
pub fn modifier_mask(key: u8) -> Option<u8> {
    if MODIFIER_USAGES.contains(&key) {
        Some(1 << (key - MODIFIER_USAGES.start()))
    } else {
        None
    }
}

/// Standard USB HID boot-protocol keyboard report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    /// Modifier key bitfield.
    pub modifier: u8,
    /// Reserved byte (always 0x00 per HID spec).
    pub reserved: u8,
    /// Up to 6 simultaneously pressed key codes; 0 = empty slot.
    pub keycodes: [u8; KEY_SLOTS],
}

impl KeyboardReport {
    /// Create an empty (all-keys-released) report.
    pub const fn empty() -> Self {
        Self {
            modifier: 0,
            reserved: 0,
            keycodes: [0; KEY_SLOTS],
        }
    }

    /// Returns `true` if no keys are pressed (release event).
    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|&k| k == 0)
    }

    /// Release everything.
    pub fn clear(&mut self) {
        *self = Self::empty();
    }

    /// Mark `key` as pressed.
    pub fn press(&mut self, key: u8) -> Result<(), Error> {
        if let Some(mask) = modifier_mask(key) {
            if self.modifier & mask != 0 {
                return Err(Error::AlreadyPressed);
            }
            self.modifier |= mask;
            return Ok(());
        }
        if self.keycodes.contains(&key) {
            return Err(Error::AlreadyPressed);
        }
        // duplicates must be rejected before a free slot is taken, or
        // release() would only clear one of them
        let slot = self
            .keycodes
            .iter_mut()
            .find(|k| **k == 0)
            .ok_or(Error::TooManyKeysPressed)?;
        *slot = key;
        Ok(())
    }

    /// Mark `key` as released.
    pub fn release(&mut self, key: u8) -> Result<(), Error> {
        if let Some(mask) = modifier_mask(key) {
            if self.modifier & mask == 0 {
                return Err(Error::AlreadyReleased);
            }
            self.modifier &= !mask;
            return Ok(());
        }
        let slot = self
            .keycodes
            .iter_mut()
            .find(|k| **k == key)
            .ok_or(Error::AlreadyReleased)?;
        *slot = 0;
        Ok(())
    }
}

impl Report for KeyboardReport {
    const SIZE: usize = KEYBOARD_REPORT_SIZE;

    fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < KEYBOARD_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.modifier;
        buf[1] = self.reserved;
        buf[2..8].copy_from_slice(&self.keycodes);
        KEYBOARD_REPORT_SIZE
    }
}
