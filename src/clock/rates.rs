//! Per-frequency tick constants.
//!
//! The tick source is an 8-bit counter clocked at CPU/64, so it overflows
//! every 256 counts. At 16 MHz that is 1024 µs = 1 ms + 3/125 ms per tick;
//! slower clocks scale every increment by the same factor.

/// Fractional-millisecond denominator: `fract` rolls over at this value.
pub const FRACT_MAX: u8 = 125;

/// Highest value the tick counter register reads before overflowing.
pub const COUNTER_TOP: u8 = u8::MAX;

/// Supported CPU clock frequencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CpuFrequency {
    Mhz16,
    Mhz8,
    Mhz4,
    Mhz2,
    Mhz1,
}

impl CpuFrequency {
    pub const ALL: [CpuFrequency; 5] = [
        CpuFrequency::Mhz16,
        CpuFrequency::Mhz8,
        CpuFrequency::Mhz4,
        CpuFrequency::Mhz2,
        CpuFrequency::Mhz1,
    ];

    pub const fn mhz(self) -> u32 {
        match self {
            CpuFrequency::Mhz16 => 16,
            CpuFrequency::Mhz8 => 8,
            CpuFrequency::Mhz4 => 4,
            CpuFrequency::Mhz2 => 2,
            CpuFrequency::Mhz1 => 1,
        }
    }

    /// Slowdown relative to 16 MHz.
    const fn scale(self) -> u32 {
        16 / self.mhz()
    }

    pub const fn rates(self) -> TickRates {
        let k = self.scale();
        TickRates {
            millis_inc: k,
            fract_inc: (3 * k) as u8,
            micros_inc: 1024 * k,
            micros_per_count: 4 * k,
        }
    }
}

/// Counter increments applied on every timer tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickRates {
    /// Whole milliseconds per tick.
    pub millis_inc: u32,
    /// Fractional milliseconds per tick, in 1/`FRACT_MAX` ms.
    pub fract_inc: u8,
    /// Microseconds per tick.
    pub micros_inc: u32,
    /// Microseconds per tick-counter count.
    pub micros_per_count: u32,
}

impl TickRates {
    /// Length of one tick in microseconds.
    pub const fn tick_us(&self) -> u32 {
        self.micros_inc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_mhz_matches_1024us_tick() {
        let r = CpuFrequency::Mhz16.rates();
        assert_eq!(r.millis_inc, 1);
        assert_eq!(r.fract_inc, 3);
        assert_eq!(r.micros_inc, 1024);
        assert_eq!(r.micros_per_count, 4);
    }

    #[test]
    fn one_mhz_rates() {
        let r = CpuFrequency::Mhz1.rates();
        assert_eq!(r.millis_inc, 16);
        assert_eq!(r.fract_inc, 48);
        assert_eq!(r.micros_inc, 16384);
        assert_eq!(r.micros_per_count, 64);
    }

    #[test]
    fn tick_is_256_counts_for_every_frequency() {
        for f in CpuFrequency::ALL {
            let r = f.rates();
            assert_eq!(r.micros_per_count * 256, r.micros_inc, "{:?}", f);
            // millis_inc + fract_inc / 125 ms == micros_inc µs
            let tick_us_from_millis = r.millis_inc * 1000 + u32::from(r.fract_inc) * 8;
            assert_eq!(tick_us_from_millis, r.micros_inc, "{:?}", f);
        }
    }
}
