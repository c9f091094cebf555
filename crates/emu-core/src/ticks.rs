//! The fundamental unit of time in the emulator.

/// A count of CPU clock ticks.
///
/// The chipset advances in bus slots of [`Ticks::PER_SLOT`] ticks each; any
/// duration handed to it is expressed in these units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(pub u64);

impl Ticks {
    pub const ZERO: Self = Self(0);

    /// CPU ticks in one bus slot.
    pub const PER_SLOT: u64 = 2;

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    /// Duration of `slots` whole bus slots.
    #[must_use]
    pub const fn from_slots(slots: u64) -> Self {
        Self(slots * Self::PER_SLOT)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::ops::Add for Ticks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl core::ops::AddAssign for Ticks {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl core::ops::Sub for Ticks {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}
