//! Bitplane DMA: fetch window decode, plane pointers and modulos.

/// Maps position (0-7) within an 8-CCK lowres group to bitplane index.
/// From Minimig: plane = {~ddfseq[0], ~ddfseq[1], ~ddfseq[2]}.
/// None = free slot (available for copper/CPU).
pub const LOWRES_DDF_TO_PLANE: [Option<u8>; 8] = [
    None,    // 0: free
    Some(3), // 1: BPL4
    Some(5), // 2: BPL6
    Some(1), // 3: BPL2
    None,    // 4: free
    Some(2), // 5: BPL3
    Some(4), // 6: BPL5
    Some(0), // 7: BPL1 (completes the group)
];

/// Hires groups are 4 CCKs and carry at most four planes.
pub const HIRES_DDF_TO_PLANE: [Option<u8>; 4] = [Some(3), Some(1), Some(2), Some(0)];

/// Earliest and latest group starts the hardware allows.
pub const DDF_MIN: u16 = 0x18;
pub const DDF_MAX: u16 = 0xD8;

/// A bitplane slot: which plane, and whether this group ends the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitplaneFetch {
    pub plane: u8,
    pub last_group: bool,
    /// Planes enabled when the slot was decoded.
    pub planes: u8,
}

#[derive(Debug, Clone, Default)]
pub struct BitplaneDma {
    pub pointers: [u32; 6],
    /// BPL1MOD, added to planes 1, 3 and 5.
    pub bpl1mod: i16,
    /// BPL2MOD, added to planes 2, 4 and 6.
    pub bpl2mod: i16,
    pub ddfstrt: u16,
    pub ddfstop: u16,
}

impl BitplaneDma {
    pub fn write_pointer_high(&mut self, plane: usize, value: u16) {
        let ptr = &mut self.pointers[plane];
        *ptr = ((*ptr & 0x0000_FFFF) | (u32::from(value) << 16)) & 0x001F_FFFE;
    }

    pub fn write_pointer_low(&mut self, plane: usize, value: u16) {
        let ptr = &mut self.pointers[plane];
        *ptr = ((*ptr & 0xFFFF_0000) | u32::from(value)) & 0x001F_FFFE;
    }

    /// The plane fetched at `cycle`, if any, for `planes` enabled planes.
    #[must_use]
    pub fn fetch_at(&self, cycle: u16, planes: u8, hires: bool) -> Option<BitplaneFetch> {
        if planes == 0 {
            return None;
        }
        let start = (self.ddfstrt & 0xFC).max(DDF_MIN);
        let stop = (self.ddfstop & 0xFC).min(DDF_MAX);
        if cycle < start || start > stop {
            return None;
        }
        // The sequencer runs in 8-CCK blocks; a hires block holds two groups.
        let offset = cycle - start;
        let block_start = start + offset / 8 * 8;
        if block_start > stop {
            return None;
        }
        let position = usize::from(offset % 8);
        let (plane, final_group) = if hires {
            (HIRES_DDF_TO_PLANE[position % 4]?, position >= 4)
        } else {
            (LOWRES_DDF_TO_PLANE[position]?, true)
        };
        (plane < planes).then_some(BitplaneFetch {
            plane,
            last_group: final_group && block_start + 8 > stop,
            planes,
        })
    }

    /// Fetch one word for `fetch.plane` and advance its pointer. When plane 0
    /// of the last group is read, every enabled plane gets its modulo.
    pub fn fetch(&mut self, fetch: BitplaneFetch, read_word: impl FnOnce(u32) -> u16) -> u16 {
        let plane = usize::from(fetch.plane);
        let word = read_word(self.pointers[plane]);
        self.pointers[plane] = self.pointers[plane].wrapping_add(2) & 0x001F_FFFE;
        if fetch.plane == 0 && fetch.last_group {
            let enabled = usize::from(fetch.planes.min(6));
            for (index, ptr) in self.pointers[..enabled].iter_mut().enumerate() {
                let modulo = if index % 2 == 0 { self.bpl1mod } else { self.bpl2mod };
                *ptr = ptr.wrapping_add_signed(i32::from(modulo)) & 0x001F_FFFE;
            }
        }
        word
    }
}
