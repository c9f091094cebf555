//! INTENA/INTREQ and the six-level priority encoder.

/// One interrupt source, as its INTENA/INTREQ bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum InterruptFlag {
    SerialTransmit = 1 << 0,
    DiskBlock = 1 << 1,
    Software = 1 << 2,
    /// CIA A (keyboard, timers).
    Ports = 1 << 3,
    Copper = 1 << 4,
    VerticalBlank = 1 << 5,
    Blitter = 1 << 6,
    Audio0 = 1 << 7,
    Audio1 = 1 << 8,
    Audio2 = 1 << 9,
    Audio3 = 1 << 10,
    SerialReceive = 1 << 11,
    DiskSync = 1 << 12,
    /// CIA B (disk index, timers).
    External = 1 << 13,
}

impl InterruptFlag {
    #[must_use]
    pub const fn mask(self) -> u16 {
        self as u16
    }

    /// The block-done interrupt of audio channel `channel & 3`.
    #[must_use]
    pub const fn audio(channel: usize) -> Self {
        match channel & 3 {
            0 => Self::Audio0,
            1 => Self::Audio1,
            2 => Self::Audio2,
            _ => Self::Audio3,
        }
    }
}

/// INTENA bit 14: nothing reaches the CPU while clear.
pub const MASTER_ENABLE: u16 = 0x4000;

/// Bits 0-13 that can carry a request.
pub const SOURCE_MASK: u16 = 0x3FFF;

/// CPU level for each INTREQ bit, lowest bit first.
pub const LEVEL_OF_BIT: [u8; 14] = [1, 1, 1, 2, 3, 3, 3, 4, 4, 4, 4, 5, 5, 6];

/// The interrupt controller.
///
/// Every mutation recomputes the level before returning, so `level()` is
/// always current.
#[derive(Debug, Clone, Default)]
pub struct InterruptController {
    enable: u16,
    request: u16,
    level: u8,
}

impl InterruptController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// INTENAR.
    #[must_use]
    pub fn enable(&self) -> u16 {
        self.enable
    }

    /// INTREQR.
    #[must_use]
    pub fn request(&self) -> u16 {
        self.request
    }

    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[must_use]
    pub fn is_requested(&self, flag: InterruptFlag) -> bool {
        self.request & flag.mask() != 0
    }

    pub fn set_request(&mut self, flag: InterruptFlag) {
        self.request |= flag.mask();
        self.recompute();
    }

    pub fn clear_request(&mut self, flag: InterruptFlag) {
        self.request &= !flag.mask();
        self.recompute();
    }

    /// Replace the enable mask outright (bits 0-14).
    pub fn set_enable(&mut self, mask: u16) {
        self.enable = mask & 0x7FFF;
        self.recompute();
    }

    /// INTENA write: bit 15 selects set or clear of the other bits.
    pub fn write_intena(&mut self, value: u16) {
        self.enable = set_clr(self.enable, value);
        self.recompute();
    }

    /// INTREQ write, same protocol as INTENA.
    pub fn write_intreq(&mut self, value: u16) {
        self.request = set_clr(self.request, value);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.level = priority_level(self.enable, self.request);
    }
}

/// CPU level for a given enable/request pair.
#[must_use]
pub fn priority_level(enable: u16, request: u16) -> u8 {
    if enable & MASTER_ENABLE == 0 {
        return 0;
    }
    let active = enable & request & SOURCE_MASK;
    if active == 0 {
        return 0;
    }
    let highest = 15 - active.leading_zeros() as usize;
    LEVEL_OF_BIT[highest]
}

pub(crate) fn set_clr(current: u16, value: u16) -> u16 {
    if value & 0x8000 != 0 {
        current | (value & 0x7FFF)
    } else {
        current & !(value & 0x7FFF)
    }
}
