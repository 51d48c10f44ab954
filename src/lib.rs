//! Device-side USB transport for a composite keyboard / mouse / joystick /
//! CDC serial device, plus the interrupt-fed monotonic clock that bounds
//! every wait in it.
//!
//! The library is `no_std` and host-testable: `cargo test --lib` runs the
//! transport against the RAM [`usb::EndpointBank`] with the `std`
//! critical-section implementation. The firmware in `main.rs` needs the
//! `embedded` feature and a Cortex-M target.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod board;
pub mod clock;
pub mod config;
pub mod error;
pub mod hid;
pub mod interrupts;
pub mod transport;
pub mod usb;

pub use error::Error;
pub use transport::Transport;
