//! Master clock configuration.

use crate::Ticks;

/// The CPU clock driving the chipset.
///
/// The colour clock (bus slot rate) is half of it on every machine the
/// chipset shipped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterClock {
    /// CPU clock frequency in Hz (e.g., `7_093_790` for PAL).
    pub frequency_hz: u64,
}

impl MasterClock {
    /// Nominal PAL CPU clock.
    pub const PAL: Self = Self::new(7_093_790);
    /// Nominal NTSC CPU clock.
    pub const NTSC: Self = Self::new(7_159_090);

    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// Bus slots per second.
    #[must_use]
    pub const fn slot_rate_hz(&self) -> u64 {
        self.frequency_hz / Ticks::PER_SLOT
    }

    /// True if this clock is within `permille` thousandths of `nominal`.
    #[must_use]
    pub const fn is_near(&self, nominal: Self, permille: u64) -> bool {
        let diff = self.frequency_hz.abs_diff(nominal.frequency_hz);
        diff * 1000 <= nominal.frequency_hz * permille
    }
}
