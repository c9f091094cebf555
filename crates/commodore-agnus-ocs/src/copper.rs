//! Copper - coprocessor for raster-synchronised register writes.

use crate::beam::RasterPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Fetch1, // Fetch first word
    Fetch2, // Fetch second word, then execute
    Wait,   // Waiting for beam position (and possibly the blitter)
}

/// COPCON bit 1: allow writes to 0x040-0x07E (the blitter registers).
pub const COPCON_CDANG: u16 = 0x0002;

pub struct Copper {
    pub state: State,
    pub cop1lc: u32,
    pub cop2lc: u32,
    pub pc: u32,
    pub ir1: u16,
    pub ir2: u16,
    pub danger: bool,
    pending_restart: Option<u32>,
    /// First word of the instruction after a WAIT, fetched while waiting.
    prefetch: Option<u16>,
}

impl Copper {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            cop1lc: 0,
            cop2lc: 0,
            pc: 0,
            ir1: 0,
            ir2: 0,
            danger: false,
            pending_restart: None,
            prefetch: None,
        }
    }

    pub fn write_copcon(&mut self, value: u16) {
        self.danger = value & COPCON_CDANG != 0;
    }

    /// COPJMP1 strobe. Takes effect at the start of the next slot.
    pub fn strobe_cop1(&mut self) {
        self.pending_restart = Some(self.cop1lc);
    }

    /// COPJMP2 strobe.
    pub fn strobe_cop2(&mut self) {
        self.pending_restart = Some(self.cop2lc);
    }

    /// Vertical blank reload from COP1LC; immediate.
    pub fn restart_cop1(&mut self) {
        self.pending_restart = None;
        self.jump(self.cop1lc);
    }

    fn jump(&mut self, location: u32) {
        self.pc = location & 0x001F_FFFE;
        self.state = State::Fetch1;
        self.prefetch = None;
    }

    /// Apply a strobe written during the previous slot.
    pub fn begin_slot(&mut self) {
        if let Some(location) = self.pending_restart.take() {
            self.jump(location);
        }
    }

    #[must_use]
    pub fn restart_pending(&self) -> bool {
        self.pending_restart.is_some()
    }

    /// True if the Copper would use a slot at `position`. A satisfied wait
    /// claims the slot in which it resolves.
    #[must_use]
    pub fn wants_slot(&self, position: RasterPosition, blitter_idle: bool) -> bool {
        match self.state {
            State::Idle => false,
            State::Fetch1 | State::Fetch2 => true,
            State::Wait => {
                self.prefetch.is_none() || self.check_wait(position, blitter_idle)
            }
        }
    }

    /// Perform one Copper slot.
    ///
    /// Returns `Some((register, value))` when a MOVE executes. Moves to
    /// protected registers are dropped here.
    pub fn tick(
        &mut self,
        position: RasterPosition,
        blitter_idle: bool,
        read_mem: impl Fn(u32) -> u16,
    ) -> Option<(u16, u16)> {
        match self.state {
            State::Idle => None,
            State::Fetch1 => {
                self.ir1 = read_mem(self.pc);
                self.pc = self.pc.wrapping_add(2);
                self.state = State::Fetch2;
                None
            }
            State::Fetch2 => {
                self.ir2 = read_mem(self.pc);
                self.pc = self.pc.wrapping_add(2);
                self.execute(position, blitter_idle)
            }
            State::Wait => {
                let Some(next) = self.prefetch else {
                    self.prefetch = Some(read_mem(self.pc));
                    self.pc = self.pc.wrapping_add(2);
                    return None;
                };
                if !self.check_wait(position, blitter_idle) {
                    return None;
                }
                self.prefetch = None;
                self.ir1 = next;
                self.ir2 = read_mem(self.pc);
                self.pc = self.pc.wrapping_add(2);
                self.execute(position, blitter_idle)
            }
        }
    }

    fn execute(&mut self, position: RasterPosition, blitter_idle: bool) -> Option<(u16, u16)> {
        self.state = State::Fetch1;
        if self.ir1 & 1 == 0 {
            let reg = self.ir1 & 0x01FE;
            if !self.may_write(reg) {
                log::debug!("copper move to protected register {reg:#05X} dropped");
                return None;
            }
            return Some((reg, self.ir2));
        }

        let satisfied = self.check_wait(position, blitter_idle);
        if self.ir2 & 1 != 0 {
            // SKIP
            if satisfied {
                self.pc = self.pc.wrapping_add(4);
            }
        } else if !satisfied {
            self.state = State::Wait;
        }
        None
    }

    /// Registers below 0x040 are never Copper-writable; 0x040-0x07E need
    /// COPCON CDANG.
    #[must_use]
    pub fn may_write(&self, reg: u16) -> bool {
        match reg {
            0x000..=0x03E => false,
            0x040..=0x07E => self.danger,
            _ => true,
        }
    }

    fn check_wait(&self, position: RasterPosition, blitter_idle: bool) -> bool {
        // BFD clear: also wait for the blitter to finish.
        if self.ir2 & 0x8000 == 0 && !blitter_idle {
            return false;
        }

        // V7 has no mask bit and is always compared.
        let mask_v = ((self.ir2 >> 8) & 0x7F) | 0x80;
        let mask_h = self.ir2 & 0x00FE;

        let wait_v = (self.ir1 >> 8) & mask_v;
        let wait_h = self.ir1 & mask_h;
        let cur_v = position.line & 0xFF & mask_v;
        let cur_h = position.cycle & 0xFE & mask_h;

        ((cur_v << 8) | cur_h) >= ((wait_v << 8) | wait_h)
    }
}

impl Default for Copper {
    fn default() -> Self {
        Self::new()
    }
}
