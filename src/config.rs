//! Application-wide constants and compile-time configuration.
//!
//! Endpoint layout, frame budgets and timing parameters live here so they
//! can be tuned in one place. The endpoint numbers and sizes must match the
//! descriptor tables of the USB core that enumerates the device.

use crate::clock::CpuFrequency;

// Clock

/// CPU clock the tick rates and busy-loop calibration are derived from.
pub const CPU_FREQUENCY: CpuFrequency = CpuFrequency::Mhz16;

// Endpoints
//
//   EP1  IN   keyboard      (interrupt,  8 bytes, double banked)
//   EP2  IN   CDC ACM notify (handled by the USB core)
//   EP3  OUT  CDC data RX   (bulk, 64 bytes)
//   EP4  IN   CDC data TX   (bulk, 64 bytes, double banked)
//   EP5  IN   mouse         (interrupt,  8 bytes, double banked)
//   EP6  IN   joystick      (interrupt, 16 bytes)

pub const KEYBOARD_ENDPOINT: u8 = 1;
pub const CDC_RX_ENDPOINT: u8 = 3;
pub const CDC_TX_ENDPOINT: u8 = 4;
pub const MOUSE_ENDPOINT: u8 = 5;
pub const JOYSTICK_ENDPOINT: u8 = 6;

/// Number of endpoint slots (EP0 included).
pub const ENDPOINT_COUNT: usize = 7;

pub const CDC_ACM_SIZE: u8 = 16;
pub const CDC_RX_SIZE: u8 = 64;
pub const CDC_TX_SIZE: u8 = 64;
pub const KEYBOARD_SIZE: u8 = 8;
pub const MOUSE_SIZE: u8 = 8;
pub const JOYSTICK_SIZE: u8 = 16;

// Transmit budgets (in USB frames, 1 frame = 1 ms)

/// How long a CDC write waits for a free transmit FIFO before giving up.
pub const TRANSMIT_TIMEOUT: u8 = 25;

/// How long a partially filled CDC packet may sit before the SOF
/// interrupt releases it to the host.
pub const TRANSMIT_FLUSH_TIMEOUT: u8 = 5;

/// How long an HID report waits for its endpoint before being dropped.
pub const REPORT_TIMEOUT: u8 = 50;

// Serial `begin()` timings (ms)

/// Give up waiting for enumeration after this long.
pub const BEGIN_ENUMERATION_TIMEOUT_MS: u16 = 2500;

/// Suspend must persist this long before we conclude there is no host.
/// Normal enumeration produces short suspend states, usually under 100 ms.
pub const BEGIN_SUSPEND_TIMEOUT_MS: u16 = 250;

/// Time for the host to load a driver after configuration.
pub const BEGIN_SETTLE_MS: u32 = 200;

// Reboot / restart

/// Entry point of the resident bootloader.
pub const BOOTLOADER_ADDRESS: u32 = 0x1FFF_0000;

/// Settle time after stopping the watchdog, before detaching USB (µs).
pub const REBOOT_WATCHDOG_SETTLE_US: u16 = 5_000;

/// Time the USB lines stay detached so the host notices the disconnect (µs).
pub const REBOOT_DETACH_SETTLE_US: u16 = 15_000;
