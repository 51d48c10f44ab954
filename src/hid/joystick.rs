//! Joystick report: 12 bytes whose layout is owned by the application and
//! the descriptor the USB core presents. The transport sends them verbatim.

use super::Report;

pub const JOYSTICK_REPORT_SIZE: usize = 12;

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JoystickReport(pub [u8; JOYSTICK_REPORT_SIZE]);

impl JoystickReport {
    pub const fn new(data: [u8; JOYSTICK_REPORT_SIZE]) -> Self {
        Self(data)
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8; JOYSTICK_REPORT_SIZE] {
        &mut self.0
    }
}

impl Report for JoystickReport {
    const SIZE: usize = JOYSTICK_REPORT_SIZE;

    fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < JOYSTICK_REPORT_SIZE {
            return 0;
        }
        buf[..JOYSTICK_REPORT_SIZE].copy_from_slice(&self.0);
        JOYSTICK_REPORT_SIZE
    }
}
