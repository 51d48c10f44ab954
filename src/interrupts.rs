//! Interrupt hold guard for endpoint access.
//!
//! Every touch of the endpoint engine (selection register, FIFO, control
//! bits) happens while a [`HeldInterrupts`] is alive. The guard records
//! whether interrupts were enabled when it was created and puts that state
//! back when dropped, so nested holds never re-enable interrupts under an
//! outer caller and early returns cannot leak a disabled state.
//!
//! Built on `critical-section`: on the firmware this is the single-core
//! Cortex-M implementation (`cpsid`/`cpsie` with restore), on the host the
//! `std` implementation.

use core::marker::PhantomData;

use critical_section::{CriticalSection, RestoreState};

/// Interrupts stay disabled for as long as this value lives.
///
/// Holds must be released in reverse order of acquisition, which scoping
/// and `drop` give for free. The guard is neither `Send` nor `Sync`.
#[must_use = "interrupts are re-enabled as soon as the guard is dropped"]
pub struct HeldInterrupts {
    restore: RestoreState,
    _not_send: PhantomData<*mut ()>,
}

/// Disable interrupts, remembering the previous state.
pub fn hold_interrupts() -> HeldInterrupts {
    // SAFETY: paired with exactly one `release` in `Drop`.
    let restore = unsafe { critical_section::acquire() };
    HeldInterrupts {
        restore,
        _not_send: PhantomData,
    }
}

impl HeldInterrupts {
    /// Token for `critical_section::Mutex` access while the hold is active.
    pub fn token(&self) -> CriticalSection<'_> {
        // SAFETY: interrupts are held for the lifetime of `self`.
        unsafe { CriticalSection::new() }
    }
}

impl Drop for HeldInterrupts {
    fn drop(&mut self) {
        // SAFETY: `restore` came from the matching `acquire`.
        unsafe { critical_section::release(self.restore) }
    }
}
