//! Blitter - block copy, logic combine, area fill and line draw.
//!
//! The blitter advances one bus access per granted slot. In area mode each
//! output word costs one slot per enabled channel (A, B, C reads then the D
//! write), or a single slot when no channel is enabled. Line mode costs a C
//! read and a D write per pixel.

use emu_core::ChipBus;

const BLTCON0_USE_A: u16 = 0x0800;
const BLTCON0_USE_B: u16 = 0x0400;
const BLTCON0_USE_C: u16 = 0x0200;
const BLTCON0_USE_D: u16 = 0x0100;

const BLTCON1_LINE: u16 = 0x0001;
const BLTCON1_DESC: u16 = 0x0002;
const BLTCON1_SING: u16 = 0x0002;
const BLTCON1_FCI: u16 = 0x0004;
const BLTCON1_AUL: u16 = 0x0004;
const BLTCON1_IFE: u16 = 0x0008;
const BLTCON1_SUL: u16 = 0x0008;
const BLTCON1_EFE: u16 = 0x0010;
const BLTCON1_SUD: u16 = 0x0010;

/// Pointer registers hold chip addresses up to 2MB.
const POINTER_MASK: u32 = 0x001F_FFFE;

/// One of the four DMA channels, as indices into the pointer and modulo
/// arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Read(Channel),
    Write,
    Idle,
}

pub struct Blitter {
    pub bltcon0: u16,
    pub bltcon1: u16,
    pub first_word_mask: u16,
    pub last_word_mask: u16,
    /// BLTxPT for A, B, C, D.
    pub pointers: [u32; 4],
    /// BLTxMOD for A, B, C, D.
    pub modulos: [i16; 4],
    /// BLTADAT, BLTBDAT, BLTCDAT.
    pub data: [u16; 3],
    busy: bool,
    zero: bool,
    width: u16,
    height: u16,
    row: u16,
    column: u16,
    sequence: [Step; 4],
    steps: usize,
    step: usize,
    a_previous: u16,
    b_previous: u16,
    fill_carry: bool,
    /// Line mode: a pixel has been plotted since the last Y step.
    row_plotted: bool,
}

impl Blitter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bltcon0: 0,
            bltcon1: 0,
            first_word_mask: 0xFFFF,
            last_word_mask: 0xFFFF,
            pointers: [0; 4],
            modulos: [0; 4],
            data: [0; 3],
            busy: false,
            zero: true,
            width: 0,
            height: 0,
            row: 0,
            column: 0,
            sequence: [Step::Idle; 4],
            steps: 1,
            step: 0,
            a_previous: 0,
            b_previous: 0,
            fill_carry: false,
            row_plotted: false,
        }
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// The capability the Copper's blitter-finished wait consults.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.busy
    }

    /// BZERO: no set bit has been produced since the last start.
    #[must_use]
    pub fn zero(&self) -> bool {
        self.zero
    }

    fn line_mode(&self) -> bool {
        self.bltcon1 & BLTCON1_LINE != 0
    }

    pub fn write_pointer_high(&mut self, channel: Channel, value: u16) {
        let ptr = &mut self.pointers[channel as usize];
        *ptr = ((*ptr & 0x0000_FFFF) | (u32::from(value) << 16)) & POINTER_MASK;
    }

    pub fn write_pointer_low(&mut self, channel: Channel, value: u16) {
        let ptr = &mut self.pointers[channel as usize];
        *ptr = ((*ptr & 0xFFFF_0000) | u32::from(value)) & POINTER_MASK;
    }

    pub fn write_modulo(&mut self, channel: Channel, value: u16) {
        self.modulos[channel as usize] = (value & 0xFFFE) as i16;
    }

    /// BLTSIZE write: latch the dimensions and start.
    pub fn write_size(&mut self, value: u16) {
        let height = (value >> 6) & 0x03FF;
        let width = value & 0x003F;
        self.height = if height == 0 { 1024 } else { height };
        self.width = if width == 0 { 64 } else { width };
        self.row = 0;
        self.column = 0;
        self.step = 0;
        self.a_previous = 0;
        self.b_previous = 0;
        self.fill_carry = self.bltcon1 & BLTCON1_FCI != 0;
        self.row_plotted = false;
        self.zero = true;
        self.busy = true;
        self.build_sequence();
        log::trace!(
            "blit start: {}x{} con0={:#06X} con1={:#06X}",
            self.width,
            self.height,
            self.bltcon0,
            self.bltcon1
        );
    }

    fn build_sequence(&mut self) {
        let mut sequence = [Step::Idle; 4];
        let mut steps = 0;
        if self.line_mode() {
            sequence[0] = Step::Read(Channel::C);
            sequence[1] = Step::Write;
            steps = 2;
        } else {
            for (bit, step) in [
                (BLTCON0_USE_A, Step::Read(Channel::A)),
                (BLTCON0_USE_B, Step::Read(Channel::B)),
                (BLTCON0_USE_C, Step::Read(Channel::C)),
                (BLTCON0_USE_D, Step::Write),
            ] {
                if self.bltcon0 & bit != 0 {
                    sequence[steps] = step;
                    steps += 1;
                }
            }
            if steps == 0 {
                steps = 1;
            }
        }
        self.sequence = sequence;
        self.steps = steps;
    }

    /// Use one granted bus slot. Returns true when this slot finished the
    /// blit, at which point BLIT should be requested.
    pub fn step(&mut self, bus: &mut impl ChipBus) -> bool {
        if !self.busy {
            return false;
        }
        debug_assert!(self.step < self.steps);

        let action = self.sequence[self.step];
        self.step += 1;
        let word_done = self.step == self.steps;

        match action {
            Step::Read(channel) => {
                let word = bus.read_chip_word(self.pointers[channel as usize]);
                self.data[channel as usize] = word;
                if !self.line_mode() {
                    self.advance_pointer(channel);
                }
                if word_done {
                    self.compute_word();
                }
            }
            Step::Write => {
                if self.line_mode() {
                    self.draw_line_pixel(bus);
                } else {
                    let result = self.compute_word();
                    bus.write_chip_word(self.pointers[Channel::D as usize], result);
                    self.advance_pointer(Channel::D);
                }
            }
            Step::Idle => {
                self.compute_word();
            }
        }

        if !word_done {
            return false;
        }
        self.step = 0;
        self.finish_word()
    }

    fn advance_pointer(&mut self, channel: Channel) {
        let delta: i32 = if self.bltcon1 & BLTCON1_DESC != 0 { -2 } else { 2 };
        let ptr = &mut self.pointers[channel as usize];
        *ptr = (ptr.wrapping_add_signed(delta)) & POINTER_MASK;
    }

    fn finish_word(&mut self) -> bool {
        if self.line_mode() {
            self.row += 1;
        } else {
            self.column += 1;
            if self.column < self.width {
                return false;
            }
            self.column = 0;
            self.row += 1;
            self.fill_carry = self.bltcon1 & BLTCON1_FCI != 0;
            self.apply_modulos();
        }

        if self.row < self.height {
            return false;
        }
        self.busy = false;
        log::trace!("blit done, zero={}", self.zero);
        true
    }

    fn apply_modulos(&mut self) {
        let desc = self.bltcon1 & BLTCON1_DESC != 0;
        for (channel, bit) in [
            (Channel::A, BLTCON0_USE_A),
            (Channel::B, BLTCON0_USE_B),
            (Channel::C, BLTCON0_USE_C),
            (Channel::D, BLTCON0_USE_D),
        ] {
            if self.bltcon0 & bit == 0 {
                continue;
            }
            let modulo = i32::from(self.modulos[channel as usize]);
            let delta = if desc { -modulo } else { modulo };
            let ptr = &mut self.pointers[channel as usize];
            *ptr = ptr.wrapping_add_signed(delta) & POINTER_MASK;
        }
    }

    /// Shift, combine and fill the current word; tracks BZERO.
    fn compute_word(&mut self) -> u16 {
        let desc = self.bltcon1 & BLTCON1_DESC != 0;
        let a_shift = u32::from(self.bltcon0 >> 12);
        let b_shift = u32::from(self.bltcon1 >> 12);

        let mut a = self.data[Channel::A as usize];
        if self.column == 0 {
            a &= self.first_word_mask;
        }
        if self.column == self.width - 1 {
            a &= self.last_word_mask;
        }
        let b = self.data[Channel::B as usize];
        let c = self.data[Channel::C as usize];

        let a_shifted = barrel_shift(self.a_previous, a, a_shift, desc);
        let b_shifted = barrel_shift(self.b_previous, b, b_shift, desc);
        self.a_previous = a;
        self.b_previous = b;

        let mut result = minterm(self.bltcon0 as u8, a_shifted, b_shifted, c);

        let inclusive = self.bltcon1 & BLTCON1_IFE != 0;
        let exclusive = self.bltcon1 & BLTCON1_EFE != 0;
        if inclusive || exclusive {
            let mut filled = 0u16;
            for bit in 0..16 {
                let d = (result >> bit) & 1 != 0;
                self.fill_carry ^= d;
                let out = if exclusive { self.fill_carry } else { self.fill_carry || d };
                filled |= u16::from(out) << bit;
            }
            result = filled;
        }

        if result != 0 {
            self.zero = false;
        }
        result
    }

    /// One Bresenham step: plot through the minterm at D, then move.
    ///
    /// The error term lives in BLTAPT (low word); BLTAMOD is added when it
    /// is non-negative and BLTBMOD otherwise. The octant comes from SUD
    /// (major axis is X when set), AUL (major step is up/left) and SUL
    /// (minor step is up/left).
    ///
    /// The texture bit is BLTBDAT rotated left by BSH, and BLTBDAT rotates
    /// one place per pixel. With SING only the first pixel after each Y
    /// step reaches D; the rest write C back unchanged.
    fn draw_line_pixel(&mut self, bus: &mut impl ChipBus) {
        let pixel_bit = self.bltcon0 >> 12;
        let pixel_mask = 0x8000u16 >> pixel_bit;

        let texture = self.data[Channel::B as usize];
        let bsh = u32::from(self.bltcon1 >> 12);
        let b = if self.bltcon0 & BLTCON0_USE_B == 0 || texture.rotate_left(bsh) & 0x8000 != 0 {
            0xFFFF
        } else {
            0x0000
        };
        let c = self.data[Channel::C as usize];
        let single = self.bltcon1 & BLTCON1_SING != 0;
        let result = if single && self.row_plotted {
            c
        } else {
            let plotted = minterm(self.bltcon0 as u8, pixel_mask, b, c);
            (plotted & pixel_mask) | (c & !pixel_mask)
        };
        self.row_plotted = true;
        if result != 0 {
            self.zero = false;
        }
        bus.write_chip_word(self.pointers[Channel::D as usize], result);
        self.data[Channel::B as usize] = texture.rotate_left(1);

        let x_major = self.bltcon1 & BLTCON1_SUD != 0;
        let major_back = self.bltcon1 & BLTCON1_AUL != 0;
        let minor_back = self.bltcon1 & BLTCON1_SUL != 0;
        let error = self.pointers[Channel::A as usize] as u16 as i16;

        let (x_back, y_back) = if x_major {
            (major_back, minor_back)
        } else {
            (minor_back, major_back)
        };
        let diagonal = error >= 0;
        if x_major || diagonal {
            self.step_x(x_back);
        }
        if !x_major || diagonal {
            self.step_y(y_back);
        }

        let increment = if diagonal {
            self.modulos[Channel::A as usize]
        } else {
            self.modulos[Channel::B as usize]
        };
        let error = error.wrapping_add(increment);
        let a_ptr = &mut self.pointers[Channel::A as usize];
        *a_ptr = (*a_ptr & 0xFFFF_0000) | u32::from(error as u16);
    }

    fn step_x(&mut self, left: bool) {
        let pixel_bit = self.bltcon0 >> 12;
        let (next, carry) = if left {
            ((pixel_bit + 15) & 0xF, pixel_bit == 0)
        } else {
            ((pixel_bit + 1) & 0xF, pixel_bit == 15)
        };
        self.bltcon0 = (self.bltcon0 & 0x0FFF) | (next << 12);
        if carry {
            let delta = if left { -2 } else { 2 };
            for channel in [Channel::C, Channel::D] {
                let ptr = &mut self.pointers[channel as usize];
                *ptr = ptr.wrapping_add_signed(delta) & POINTER_MASK;
            }
        }
    }

    fn step_y(&mut self, up: bool) {
        self.row_plotted = false;
        let modulo = i32::from(self.modulos[Channel::C as usize]);
        let delta = if up { -modulo } else { modulo };
        for channel in [Channel::C, Channel::D] {
            let ptr = &mut self.pointers[channel as usize];
            *ptr = ptr.wrapping_add_signed(delta) & POINTER_MASK;
        }
    }
}

impl Default for Blitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Ascending blits shift right, pulling bits in from the previous word;
/// descending blits shift left.
fn barrel_shift(previous: u16, current: u16, shift: u32, descending: bool) -> u16 {
    if descending {
        let combined = (u32::from(current) << 16) | u32::from(previous);
        (combined >> (16 - shift)) as u16
    } else {
        let combined = (u32::from(previous) << 16) | u32::from(current);
        (combined >> shift) as u16
    }
}

/// Apply the 8-entry logic table bitwise: bit `(a<<2)|(b<<1)|c` of `lf`.
#[must_use]
pub fn minterm(lf: u8, a: u16, b: u16, c: u16) -> u16 {
    let mut result = 0u16;
    for index in 0..8u8 {
        if lf & (1 << index) == 0 {
            continue;
        }
        let a_term = if index & 4 != 0 { a } else { !a };
        let b_term = if index & 2 != 0 { b } else { !b };
        let c_term = if index & 1 != 0 { c } else { !c };
        result |= a_term & b_term & c_term;
    }
    result
}
