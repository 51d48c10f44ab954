//! Cycle-calibrated busy loops.
//!
//! These never touch the tick counters and work with interrupts disabled,
//! which is what the reboot path and other critical code need. One loop
//! iteration is [`CYCLES_PER_ITERATION`] CPU cycles.

use super::CpuFrequency;

/// CPU cycles consumed by one iteration of the spin loop.
pub const CYCLES_PER_ITERATION: u32 = 4;

/// Exact iteration count for a delay of `us` microseconds.
///
/// Usable in `const` context, so a literal delay costs no arithmetic at run
/// time:
///
/// ```
/// use hidserial::clock::{spin, CpuFrequency};
/// const TEN_US: u32 = spin::iterations(CpuFrequency::Mhz16, 10);
/// assert_eq!(TEN_US, 40);
/// ```
pub const fn iterations(freq: CpuFrequency, us: u16) -> u32 {
    (us as u32 * freq.mhz()) / CYCLES_PER_ITERATION
}

/// Fixed cost of the runtime entry (argument scaling, compare, call) in µs.
pub const fn runtime_overhead_us(freq: CpuFrequency) -> u16 {
    match freq {
        CpuFrequency::Mhz16 => 2,
        CpuFrequency::Mhz8 => 3,
        CpuFrequency::Mhz4 => 4,
        CpuFrequency::Mhz2 => 12,
        CpuFrequency::Mhz1 => 32,
    }
}

/// Iterations actually spun by [`delay_microseconds`], after the fixed
/// overhead is subtracted. Zero means the call returns immediately.
pub const fn runtime_iterations(freq: CpuFrequency, us: u16) -> u32 {
    let overhead = runtime_overhead_us(freq);
    if us <= overhead {
        0
    } else {
        iterations(freq, us - overhead)
    }
}

/// Busy-wait `us` microseconds for a value only known at run time.
#[inline]
pub fn delay_microseconds(freq: CpuFrequency, us: u16) {
    delay_iterations(runtime_iterations(freq, us));
}

/// Spin for a precomputed iteration count (see [`iterations`]).
#[inline(always)]
pub fn delay_iterations(n: u32) {
    if n == 0 {
        return;
    }
    #[cfg(all(feature = "embedded", target_arch = "arm"))]
    cortex_m::asm::delay(n * CYCLES_PER_ITERATION);

    #[cfg(not(all(feature = "embedded", target_arch = "arm")))]
    for _ in 0..n {
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_delay_is_exact() {
        assert_eq!(iterations(CpuFrequency::Mhz16, 1), 4);
        assert_eq!(iterations(CpuFrequency::Mhz16, 1000), 4000);
        assert_eq!(iterations(CpuFrequency::Mhz4, 1000), 1000);
        assert_eq!(iterations(CpuFrequency::Mhz1, 1000), 250);
    }

    #[test]
    fn runtime_delay_subtracts_overhead() {
        assert_eq!(runtime_iterations(CpuFrequency::Mhz16, 10), iterations(CpuFrequency::Mhz16, 8));
        assert_eq!(runtime_iterations(CpuFrequency::Mhz2, 100), iterations(CpuFrequency::Mhz2, 88));
    }

    #[test]
    fn runtime_delay_below_overhead_returns_immediately() {
        for f in CpuFrequency::ALL {
            let overhead = runtime_overhead_us(f);
            assert_eq!(runtime_iterations(f, 0), 0);
            assert_eq!(runtime_iterations(f, overhead), 0);
            assert!(runtime_iterations(f, overhead + 4) > 0);
        }
        assert_eq!(runtime_iterations(CpuFrequency::Mhz1, 32), 0);
    }

    #[test]
    fn large_delays_do_not_overflow() {
        assert_eq!(iterations(CpuFrequency::Mhz16, u16::MAX), 65_535 * 4);
        delay_microseconds(CpuFrequency::Mhz16, 50);
    }
}
