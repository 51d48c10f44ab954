//! HID report types for the keyboard, mouse and joystick interfaces.
//!
//! These are plain values with a fixed wire layout. Sending them is the job
//! of [`crate::usb::report::ReportChannel`].

pub mod joystick;
pub mod keyboard;
pub mod mouse;


pub use joystick::JoystickReport;
pub use keyboard::KeyboardReport;
pub use mouse::MouseReport;

/// A fixed-size input report.
pub trait Report {
    /// Bytes written by [`Report::serialize`].
    const SIZE: usize;

    /// Serialise into `buf`. Returns the number of bytes written, or 0 if
    /// `buf` is shorter than [`Report::SIZE`].
    fn serialize(&self, buf: &mut [u8]) -> usize;
}
