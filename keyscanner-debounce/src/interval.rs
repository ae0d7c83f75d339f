//! Scan interval: the timer compare value that paces the scan loop.
//!
//! The scanner timer runs from an 8 MHz clock through a /256 prescaler, so
//! one timer count is 32 µs. Measured on hardware: an interval of 7 scans
//! every ~0.25 ms, 50 every ~1.6 ms.

/// Timer input clock after the prescaler, in Hz.
pub const TIMER_CLOCK_HZ: u32 = 8_000_000 / 256;

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScanIntervalError {
    #[error("scan interval must be at least 1")]
    Zero,
}

/// Timer compare value between two scans.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanInterval(u8);

impl ScanInterval {
    /// About 0.45 ms between scans, two scans per millisecond.
    pub const DEFAULT: ScanInterval = ScanInterval(14);

    pub const fn new(raw: u8) -> Result<Self, ScanIntervalError> {
        if raw == 0 {
            Err(ScanIntervalError::Zero)
        } else {
            Ok(ScanInterval(raw))
        }
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Length of one tick in microseconds.
    pub const fn tick_micros(self) -> u32 {
        self.0 as u32 * 1_000_000 / TIMER_CLOCK_HZ
    }

    /// Scans per second.
    pub const fn sampling_rate_hz(self) -> u32 {
        TIMER_CLOCK_HZ / self.0 as u32
    }

    /// Ticks needed to cover at least `millis` milliseconds, saturating at
    /// `u32::MAX`.
    pub const fn ticks_for_millis(self, millis: u32) -> u32 {
        let micros = millis as u64 * 1000;
        let ticks = micros.div_ceil(self.tick_micros() as u64);
        if ticks > u32::MAX as u64 {
            u32::MAX
        } else {
            ticks as u32
        }
    }
}

impl Default for ScanInterval {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for ScanInterval {
    type Error = ScanIntervalError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}
