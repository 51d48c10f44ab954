//! Unified error type for hidserial.
//!
//! We avoid `alloc` - all error variants are fieldless.
//! Link loss, transmit timeouts and partial writes are *not* errors here:
//! they surface as `None`, short byte counts or dropped HID reports.

/// Top-level error type used across the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Keyboard state
    /// The key (or modifier) is already held in the report.
    #[error("key is already marked as pressed")]
    AlreadyPressed,

    /// The key (or modifier) is not held in the report.
    #[error("key is already marked as released")]
    AlreadyReleased,

    /// All six key slots are occupied.
    #[error("too many keys are already marked as pressed")]
    TooManyKeysPressed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn messages_name_the_key_state() {
        assert_eq!(Error::AlreadyPressed.to_string(), "key is already marked as pressed");
        assert_eq!(Error::AlreadyReleased.to_string(), "key is already marked as released");
        assert_eq!(
            Error::TooManyKeysPressed.to_string(),
            "too many keys are already marked as pressed"
        );
    }

    #[test]
    fn is_a_core_error() {
        fn takes(_: &dyn core::error::Error) {}
        takes(&Error::AlreadyPressed);
    }
}
