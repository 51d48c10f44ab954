//! USB device transport: CDC serial plus keyboard, mouse and joystick HID
//! channels multiplexed over one endpoint engine.
//!
//! Endpoint layout (see [`crate::config`]):
//!
//! - EP1 IN  keyboard reports
//! - EP2 IN  CDC ACM notifications (owned by the USB core)
//! - EP3 OUT CDC data from the host
//! - EP4 IN  CDC data to the host
//! - EP5 IN  mouse reports
//! - EP6 IN  joystick reports
//!
//! Descriptors, enumeration and control requests belong to the USB core,
//! which reports link state through [`link::UsbLink`].

pub mod bank;
pub mod endpoint;
pub mod joystick;
pub mod keyboard;
pub mod link;
pub mod mouse;
pub mod report;
pub mod serial;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::{
    CDC_ACM_SIZE, CDC_RX_SIZE, CDC_TX_SIZE, ENDPOINT_COUNT, JOYSTICK_SIZE, KEYBOARD_SIZE,
    MOUSE_SIZE,
};

use bank::EndpointConfig;

/// Endpoint configuration indexed by endpoint number.
pub const ENDPOINT_LAYOUT: [EndpointConfig; ENDPOINT_COUNT] = [
    EndpointConfig::UNUSED, // EP0 control, handled by the USB core
    EndpointConfig::input(KEYBOARD_SIZE, 2),
    EndpointConfig::input(CDC_ACM_SIZE, 1),
    EndpointConfig::out(CDC_RX_SIZE),
    EndpointConfig::input(CDC_TX_SIZE, 2),
    EndpointConfig::input(MOUSE_SIZE, 2),
    EndpointConfig::input(JOYSTICK_SIZE, 1),
];

pub use bank::EndpointBank;
pub use endpoint::EndpointIo;
pub use joystick::Joystick;
pub use keyboard::Keyboard;
pub use link::{LineCoding, UsbLink};
pub use mouse::Mouse;
pub use report::{Delivery, ReportChannel};
pub use serial::{on_start_of_frame, CdcSerial, LinkStatus};
