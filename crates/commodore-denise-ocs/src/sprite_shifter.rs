//! Shift register for a sprite pair.
//!
//! One nibble per lowres pixel: `(even sprite code << 2) | odd sprite code`.
//! The first pixel sits in the top nibble.

/// Which half of the pair a load targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSide {
    Even,
    Odd,
}

impl PairSide {
    fn nibble_mask(self) -> u8 {
        match self {
            Self::Even => 0xC,
            Self::Odd => 0x3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TwoSpriteShifter {
    data: u64,
    /// Pixels pushed past the end of `data` by a delayed load.
    overflow: u8,
}

impl TwoSpriteShifter {
    /// Load one sprite's DATA (`lsb`) and DATB (`msb`) words, optionally one
    /// pixel late.
    pub fn load(&mut self, side: PairSide, lsb: u16, msb: u16, delay: u8) {
        let shift = if side == PairSide::Even { 2 } else { 0 };
        let mut spread = 0u64;
        for pixel in 0..16 {
            let bit = 15 - pixel;
            let code = ((lsb >> bit) & 1) | (((msb >> bit) & 1) << 1);
            spread |= u64::from(code << shift) << (bit * 4);
        }

        let nibble = u64::from(side.nibble_mask());
        let mask = (0..16).fold(0u64, |mask, pixel| mask | (nibble << (pixel * 4)));
        let mask8 = (side.nibble_mask() << 4) | side.nibble_mask();

        let (data, overflow) = if delay == 0 {
            (spread, 0u8)
        } else {
            (spread >> 4, ((spread & 0xF) << 4) as u8)
        };
        self.data = (self.data & !mask) | (data & mask);
        self.overflow = (self.overflow & !mask8) | (overflow & mask8);
    }

    /// The next two lowres pixels as nibbles.
    #[must_use]
    pub fn get(&self) -> u8 {
        (self.data >> 56) as u8
    }

    /// Advance by two lowres pixels.
    pub fn shift(&mut self) {
        self.data = (self.data << 8) | u64::from(self.overflow);
        self.overflow = 0;
    }

    pub fn clear(&mut self) {
        self.data = 0;
        self.overflow = 0;
    }
}
