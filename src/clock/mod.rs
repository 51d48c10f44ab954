//! Interrupt-fed monotonic clock.
//!
//! [`TickCounters`] is the state shared with the timer interrupt: the
//! interrupt handler calls [`TickCounters::on_timer_tick`] once per counter
//! overflow and nothing else ever writes the counters. [`Clock`] pairs the
//! counters with the free-running tick counter register for sub-tick
//! resolution and provides the `millis`/`micros`/`delay` API used for every
//! timeout in the crate.
//!
//! The counters are wider than an atomic word on small cores, so both the
//! update and every read happen inside a critical section.

mod rates;
pub mod spin;

pub use rates::{CpuFrequency, TickRates, COUNTER_TOP, FRACT_MAX};

use core::cell::Cell;
use critical_section::Mutex;

/// Hardware tick counter that feeds the clock.
pub trait TickCounter {
    /// Current value of the free-running counter register.
    fn count(&self) -> u8;

    /// `true` when the counter overflowed but the tick interrupt has not
    /// run yet.
    fn overflow_pending(&self) -> bool;
}

impl<T: TickCounter + ?Sized> TickCounter for &T {
    fn count(&self) -> u8 {
        (**self).count()
    }

    fn overflow_pending(&self) -> bool {
        (**self).overflow_pending()
    }
}

#[derive(Clone, Copy, Default)]
struct Counters {
    micros: u32,
    millis: u32,
    fract: u8,
}

impl Counters {
    fn advance(self, r: &TickRates) -> Self {
        let mut fract = self.fract + r.fract_inc;
        let mut millis = self.millis.wrapping_add(r.millis_inc);
        if fract >= FRACT_MAX {
            fract -= FRACT_MAX;
            millis = millis.wrapping_add(1);
        }
        Self {
            micros: self.micros.wrapping_add(r.micros_inc),
            millis,
            fract,
        }
    }
}

/// Counters advanced by the timer interrupt.
///
/// Meant to live in a `static` for the whole program.
pub struct TickCounters {
    state: Mutex<Cell<Counters>>,
    freq: CpuFrequency,
    rates: TickRates,
}

impl TickCounters {
    pub const fn new(freq: CpuFrequency) -> Self {
        Self {
            state: Mutex::new(Cell::new(Counters {
                micros: 0,
                millis: 0,
                fract: 0,
            })),
            freq,
            rates: freq.rates(),
        }
    }

    pub fn frequency(&self) -> CpuFrequency {
        self.freq
    }

    pub fn rates(&self) -> &TickRates {
        &self.rates
    }

    /// Timer overflow handler body.
    pub fn on_timer_tick(&self) {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            cell.set(cell.get().advance(&self.rates));
        });
    }

    /// Milliseconds since power-on, wrapping at `u32::MAX`.
    pub fn millis(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow(cs).get().millis)
    }

    /// Microseconds accumulated by processed ticks only (no sub-tick part).
    pub fn tick_micros(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow(cs).get().micros)
    }
}

/// Reader half of the clock.
pub struct Clock<'a, T> {
    counters: &'a TickCounters,
    timer: T,
}

impl<'a, T: TickCounter> Clock<'a, T> {
    pub fn new(counters: &'a TickCounters, timer: T) -> Self {
        Self { counters, timer }
    }

    pub fn millis(&self) -> u32 {
        self.counters.millis()
    }

    /// Microseconds since power-on, wrapping at `u32::MAX`.
    ///
    /// The register, the overflow flag and the tick-accumulated value are
    /// sampled together; an overflow that has fired but not been serviced
    /// yet adds one tick. A register reading of exactly [`COUNTER_TOP`] means
    /// the flag may belong to an overflow that happened after the register
    /// was sampled, so the correction is skipped there.
    pub fn micros(&self) -> u32 {
        let (count, pending, base) = critical_section::with(|cs| {
            let count = self.timer.count();
            let pending = self.timer.overflow_pending();
            (count, pending, self.counters.state.borrow(cs).get().micros)
        });

        let rates = self.counters.rates();
        let mut base = base;
        if pending && count != COUNTER_TOP {
            base = base.wrapping_add(rates.micros_inc);
        }
        base.wrapping_add(u32::from(count) * rates.micros_per_count)
    }

    /// Busy-wait `ms` milliseconds.
    pub fn delay(&self, mut ms: u32) {
        let mut start = self.micros();
        while ms > 0 {
            if self.micros().wrapping_sub(start) >= 1000 {
                ms -= 1;
                start = start.wrapping_add(1000);
            }
        }
    }

    /// Busy-wait `us` microseconds without relying on interrupts.
    pub fn delay_microseconds(&self, us: u16) {
        spin::delay_microseconds(self.counters.frequency(), us);
    }
}

impl<T: TickCounter> embedded_hal::delay::DelayNs for Clock<'_, T> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_us(ns.div_ceil(1000));
    }

    fn delay_us(&mut self, mut us: u32) {
        while us > 0 {
            let chunk = us.min(u32::from(u16::MAX));
            self.delay_microseconds(chunk as u16);
            us -= chunk;
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay(ms);
    }
}
