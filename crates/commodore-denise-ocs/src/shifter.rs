//! Bitplane shifter.
//!
//! Holds 16 pixels already combined across planes, one byte per pixel, with
//! the first pixel in the most significant byte. Each output step reads four
//! hires pixels and then moves on by one colour clock's worth of pixels.

/// Pixels that reach the output from the previous word when a new set is
/// loaded: one colour clock's worth.
const LOWRES_LEAD: u32 = 2;
const HIRES_LEAD: u32 = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct BitplaneShifter {
    data: u128,
    hires: bool,
    loaded: bool,
}

impl BitplaneShifter {
    /// Load from the previous and next word of each plane.
    ///
    /// `odd_delay` applies to planes 0, 2 and 4 and `even_delay` to planes
    /// 1, 3 and 5, both in lowres pixels as written to BPLCON1.
    pub fn set(
        &mut self,
        previous: &[u16; 6],
        next: &[u16; 6],
        odd_delay: u8,
        even_delay: u8,
        hires: bool,
    ) {
        let mut windows = [0u16; 6];
        for (plane, window) in windows.iter_mut().enumerate() {
            let delay = if plane % 2 == 0 { odd_delay } else { even_delay };
            let (lead, delay) = if hires {
                (HIRES_LEAD, u32::from(delay & 7) * 2)
            } else {
                (LOWRES_LEAD, u32::from(delay & 15))
            };
            let word = (u32::from(previous[plane]) << 16) | u32::from(next[plane]);
            *window = (word >> (lead + delay)) as u16;
        }

        let mut data = 0u128;
        for pixel in 0..16 {
            let bit = 15 - pixel;
            let mut index = 0u8;
            for (plane, window) in windows.iter().enumerate() {
                index |= (((window >> bit) & 1) as u8) << plane;
            }
            data |= u128::from(index) << (bit * 8);
        }
        self.data = data;
        self.hires = hires;
        self.loaded = true;
    }

    /// Four hires pixels, first in the top byte. Lowres pixels are doubled.
    #[must_use]
    pub fn get(&self) -> u32 {
        debug_assert!(self.loaded, "bitplane shifter read before it was set");
        if self.hires {
            (self.data >> 96) as u32
        } else {
            let first = ((self.data >> 120) & 0xFF) as u32;
            let second = ((self.data >> 112) & 0xFF) as u32;
            (first << 24) | (first << 16) | (second << 8) | second
        }
    }

    /// Advance by one colour clock: 2 lowres or 4 hires pixels.
    pub fn shift(&mut self) {
        self.data <<= if self.hires { 32 } else { 16 };
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Empty the shifter at the start of a line.
    pub fn clear(&mut self) {
        self.data = 0;
        self.loaded = false;
    }
}
