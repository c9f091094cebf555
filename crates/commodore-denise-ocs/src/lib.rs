//! Commodore Denise OCS: bitplane shifter, sprite engine and colour output.
//!
//! Denise receives bitplane and sprite words from Agnus DMA (or the CPU and
//! Copper writing the same registers), shifts them out, resolves playfield
//! and sprite priority, and looks the result up in the palette.

mod shifter;
mod sprite_shifter;

pub use shifter::BitplaneShifter;
pub use sprite_shifter::{PairSide, TwoSpriteShifter};

const BPLCON0_HIRES: u16 = 0x8000;
const BPLCON0_HOMOD: u16 = 0x0800;
const BPLCON0_DBLPF: u16 = 0x0400;
const BPLCON2_PF2PRI: u16 = 0x0040;
const SPRCTL_ATTACH: u16 = 0x0080;

pub struct DeniseOcs {
    pub palette: [u16; 32],
    pub bplcon0: u16,
    pub bplcon1: u16,
    pub bplcon2: u16,
    pub clxcon: u16,
    pub clxdat: u16,
    pub diwstrt: u16,
    pub diwstop: u16,
    pub spr_pos: [u16; 8],
    pub spr_ctl: [u16; 8],
    pub spr_data: [u16; 8],
    pub spr_datb: [u16; 8],
    spr_armed: [bool; 8],
    /// BPLxDAT holding latches.
    bpl_data: [u16; 6],
    next_bitplanes: [u16; 6],
    previous_bitplanes: [u16; 6],
    has_next_bitplanes: bool,
    shifter: BitplaneShifter,
    sprite_shifters: [TwoSpriteShifter; 4],
    /// Last HAM colour.
    ham_hold: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SpritePixel {
    palette_idx: usize,
    sprite_group: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PlayfieldId {
    Pf1,
    Pf2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PlayfieldPixel {
    visible_color_idx: usize,
    front_playfield: Option<PlayfieldId>,
}

impl DeniseOcs {
    #[must_use]
    pub fn new() -> Self {
        Self {
            palette: [0; 32],
            bplcon0: 0,
            bplcon1: 0,
            bplcon2: 0,
            clxcon: 0,
            clxdat: 0,
            diwstrt: 0,
            diwstop: 0,
            spr_pos: [0; 8],
            spr_ctl: [0; 8],
            spr_data: [0; 8],
            spr_datb: [0; 8],
            spr_armed: [false; 8],
            bpl_data: [0; 6],
            next_bitplanes: [0; 6],
            previous_bitplanes: [0; 6],
            has_next_bitplanes: false,
            shifter: BitplaneShifter::default(),
            sprite_shifters: [TwoSpriteShifter::default(); 4],
            ham_hold: 0,
        }
    }

    pub fn set_palette(&mut self, idx: usize, val: u16) {
        if idx < 32 {
            self.palette[idx] = val & 0x0FFF;
        }
    }

    #[must_use]
    pub fn num_bitplanes(&self) -> u8 {
        (((self.bplcon0 >> 12) & 0x07) as u8).min(6)
    }

    #[must_use]
    pub fn hires(&self) -> bool {
        self.bplcon0 & BPLCON0_HIRES != 0
    }

    fn ham(&self) -> bool {
        self.bplcon0 & BPLCON0_HOMOD != 0 && self.num_bitplanes() == 6
    }

    fn dual_playfield(&self) -> bool {
        self.bplcon0 & BPLCON0_DBLPF != 0
    }

    fn extra_half_brite(&self) -> bool {
        self.num_bitplanes() == 6 && !self.ham() && !self.dual_playfield()
    }

    /// BPLxDAT. Writing BPL1DAT posts the whole set for the next output step.
    pub fn write_bitplane_data(&mut self, plane: usize, val: u16) {
        if plane >= 6 {
            return;
        }
        self.bpl_data[plane] = val;
        if plane == 0 {
            self.previous_bitplanes = self.next_bitplanes;
            self.next_bitplanes = self.bpl_data;
            self.has_next_bitplanes = true;
        }
    }

    pub fn read_clxdat(&mut self) -> u16 {
        let value = self.clxdat;
        self.clxdat = 0;
        value
    }

    pub fn write_sprite_pos(&mut self, sprite: usize, val: u16) {
        if sprite < 8 {
            self.spr_pos[sprite] = val;
        }
    }

    pub fn write_sprite_ctl(&mut self, sprite: usize, val: u16) {
        if sprite < 8 {
            self.spr_ctl[sprite] = val;
            // Writing SPRxCTL disables the horizontal comparator.
            self.spr_armed[sprite] = false;
        }
    }

    pub fn write_sprite_data(&mut self, sprite: usize, val: u16) {
        if sprite < 8 {
            self.spr_data[sprite] = val;
            self.spr_armed[sprite] = true;
        }
    }

    pub fn write_sprite_datb(&mut self, sprite: usize, val: u16) {
        if sprite < 8 {
            self.spr_datb[sprite] = val;
        }
    }

    #[must_use]
    pub fn sprite_armed(&self, sprite: usize) -> bool {
        self.spr_armed.get(sprite).copied().unwrap_or(false)
    }

    fn sprite_hstart(&self, sprite: usize) -> u16 {
        ((self.spr_pos[sprite] & 0x00FF) << 1) | (self.spr_ctl[sprite] & 0x0001)
    }

    /// Horizontal display window in lowres pixels, stop exclusive.
    #[must_use]
    pub fn horizontal_window(&self) -> (u16, u16) {
        (self.diwstrt & 0x00FF, (self.diwstop & 0x00FF) | 0x0100)
    }

    /// Line start: posted bitplane data and all shifters are emptied.
    pub fn begin_line(&mut self) {
        self.has_next_bitplanes = false;
        self.next_bitplanes = [0; 6];
        self.previous_bitplanes = [0; 6];
        self.shifter.clear();
        for shifter in &mut self.sprite_shifters {
            shifter.clear();
        }
        self.ham_hold = self.palette[0];
    }

    /// One colour clock of output: four hires pixels as 12-bit RGB.
    ///
    /// Returns `None` when no pixel of this clock lies inside the display
    /// window, in which case the caller shows the border. Shifters advance
    /// either way.
    pub fn output(&mut self, cycle: u16, vertical_window: bool) -> Option<[u16; 4]> {
        self.load_sprites(cycle);
        if self.has_next_bitplanes {
            let odd_delay = (self.bplcon1 & 0x000F) as u8;
            let even_delay = ((self.bplcon1 >> 4) & 0x000F) as u8;
            self.shifter.set(
                &self.previous_bitplanes,
                &self.next_bitplanes,
                odd_delay,
                even_delay,
                self.hires(),
            );
            self.has_next_bitplanes = false;
        }

        let planes = if self.shifter.is_loaded() { self.shifter.get() } else { 0 };
        let sprites = self.sprite_shifters.map(|s| s.get());

        let (hstart, hstop) = self.horizontal_window();
        let x = cycle * 2;
        let visible = |j: u16| vertical_window && (hstart..hstop).contains(&(x + j / 2));

        let pixels = if (0..4).any(visible) {
            let mut colours = [self.palette[0]; 4];
            for (j, colour) in (0u16..).zip(colours.iter_mut()) {
                if !visible(j) {
                    continue;
                }
                let raw = (planes >> (24 - 8 * j)) as u8;
                let nibbles = sprites.map(|b| if j < 2 { b >> 4 } else { b & 0x0F });
                *colour = self.compose(raw, nibbles);
            }
            Some(colours)
        } else {
            None
        };

        if self.shifter.is_loaded() {
            self.shifter.shift();
        }
        for shifter in &mut self.sprite_shifters {
            shifter.shift();
        }
        pixels
    }

    fn load_sprites(&mut self, cycle: u16) {
        for sprite in 0..8 {
            if !self.spr_armed[sprite] {
                continue;
            }
            let hstart = self.sprite_hstart(sprite);
            if hstart >> 1 != cycle {
                continue;
            }
            let side = if sprite % 2 == 0 { PairSide::Even } else { PairSide::Odd };
            self.sprite_shifters[sprite / 2].load(
                side,
                self.spr_data[sprite],
                self.spr_datb[sprite],
                (hstart & 1) as u8,
            );
        }
    }

    /// Resolve one pixel from its raw plane bits and the four pair nibbles.
    fn compose(&mut self, raw: u8, nibbles: [u8; 4]) -> u16 {
        let raw = raw & ((1u16 << self.num_bitplanes()) - 1) as u8;
        let mut pf1_code = 0u8;
        let mut pf2_code = 0u8;
        for plane in 0..6 {
            if raw & (1 << plane) != 0 {
                if plane % 2 == 0 {
                    pf1_code |= 1 << (plane / 2);
                } else {
                    pf2_code |= 1 << (plane / 2);
                }
            }
        }

        let sprite_groups = self.collision_group_mask(nibbles);
        self.latch_collisions(raw, sprite_groups);

        let playfield = self.compose_playfield_pixel(usize::from(raw), pf1_code, pf2_code);
        let mut colour = self.playfield_colour(raw, playfield.visible_color_idx);
        if let Some(sprite) = self.sprite_pixel(nibbles) {
            let in_front = match playfield.front_playfield {
                Some(front) => self.sprite_has_priority_over_playfield(sprite.sprite_group, front),
                None => true,
            };
            if in_front {
                colour = self.palette[sprite.palette_idx];
            }
        }
        colour
    }

    fn playfield_colour(&mut self, raw: u8, color_idx: usize) -> u16 {
        if self.ham() {
            let data = u16::from(raw & 0x0F);
            let colour = match raw >> 4 {
                0 => self.palette[usize::from(data)],
                1 => (self.ham_hold & 0x0FF0) | data,
                2 => (self.ham_hold & 0x00FF) | (data << 8),
                _ => (self.ham_hold & 0x0F0F) | (data << 4),
            };
            self.ham_hold = colour;
            return colour;
        }
        if self.extra_half_brite() {
            let base = self.palette[usize::from(raw & 0x1F)];
            return if raw & 0x20 != 0 { (base >> 1) & 0x0777 } else { base };
        }
        self.palette[color_idx & 0x1F]
    }

    fn sprite_pixel(&self, nibbles: [u8; 4]) -> Option<SpritePixel> {
        // Lower pairs win, and within a pair the even sprite wins.
        for (pair, &nibble) in nibbles.iter().enumerate() {
            let even_code = usize::from(nibble >> 2);
            let odd_code = usize::from(nibble & 0x03);
            let attached = self.spr_ctl[pair * 2 + 1] & SPRCTL_ATTACH != 0;
            if attached {
                let code = (odd_code << 2) | even_code;
                if code != 0 {
                    return Some(SpritePixel {
                        palette_idx: 16 + code,
                        sprite_group: pair,
                    });
                }
                continue;
            }
            let code = if even_code != 0 { even_code } else { odd_code };
            if code != 0 {
                return Some(SpritePixel {
                    palette_idx: 16 + pair * 4 + code,
                    sprite_group: pair,
                });
            }
        }
        None
    }

    fn collision_group_mask(&self, nibbles: [u8; 4]) -> u8 {
        let mut mask = 0u8;
        for (group, &nibble) in nibbles.iter().enumerate() {
            let even = nibble >> 2 != 0;
            let odd = nibble & 0x03 != 0 && self.clxcon_odd_sprite_enabled(group * 2 + 1);
            if even || odd {
                mask |= 1 << group;
            }
        }
        mask
    }

    fn clxcon_odd_sprite_enabled(&self, sprite: usize) -> bool {
        match sprite {
            1 => (self.clxcon & 0x1000) != 0, // ENSP1
            3 => (self.clxcon & 0x2000) != 0, // ENSP3
            5 => (self.clxcon & 0x4000) != 0, // ENSP5
            7 => (self.clxcon & 0x8000) != 0, // ENSP7
            _ => true,
        }
    }

    fn clxcon_bitplane_match(&self, plane_bits_mask: u8, even_planes: bool) -> bool {
        // ENBP1..ENBP6 are bits 6..11 and MVBP1..MVBP6 bits 0..5; plane 1 is
        // bit 0 of `plane_bits_mask`.
        let plane_indices: [u8; 3] = if even_planes { [1, 3, 5] } else { [0, 2, 4] };
        plane_indices.iter().all(|&plane| {
            let enabled = (self.clxcon & (1u16 << (6 + plane))) != 0;
            let expected = (self.clxcon & (1u16 << plane)) != 0;
            let actual = (plane_bits_mask & (1u8 << plane)) != 0;
            !enabled || actual == expected
        })
    }

    fn latch_collisions(&mut self, plane_bits_mask: u8, sprite_groups: u8) {
        let odd_bitplanes_match = self.clxcon_bitplane_match(plane_bits_mask, false);
        let even_bitplanes_match = self.clxcon_bitplane_match(plane_bits_mask, true);
        let mut bits = 0u16;
        if odd_bitplanes_match && even_bitplanes_match {
            bits |= 1 << 0;
        }

        for group in 0..4u8 {
            if (sprite_groups & (1u8 << group)) == 0 {
                continue;
            }
            if odd_bitplanes_match {
                bits |= 1u16 << (1 + group);
            }
            if even_bitplanes_match {
                bits |= 1u16 << (5 + group);
            }
        }

        // SP01/SP23, SP01/SP45, SP01/SP67, SP23/SP45, SP23/SP67, SP45/SP67.
        for (bit, pair) in [0b0011u8, 0b0101, 0b1001, 0b0110, 0b1010, 0b1100]
            .into_iter()
            .enumerate()
        {
            if sprite_groups & pair == pair {
                bits |= 1 << (9 + bit);
            }
        }

        self.clxdat |= bits;
    }

    fn sprite_has_priority_over_playfield(&self, sprite_group: usize, playfield: PlayfieldId) -> bool {
        // PFxP values above 4 are invalid; clamp.
        let pf_pos = match playfield {
            PlayfieldId::Pf1 => usize::from(self.bplcon2 & 0x0007),
            PlayfieldId::Pf2 => usize::from((self.bplcon2 >> 3) & 0x0007),
        }
        .min(4);
        sprite_group < pf_pos
    }

    fn compose_playfield_pixel(&self, raw_color_idx: usize, pf1_code: u8, pf2_code: u8) -> PlayfieldPixel {
        if !self.dual_playfield() || self.ham() {
            return PlayfieldPixel {
                visible_color_idx: raw_color_idx,
                front_playfield: (raw_color_idx != 0).then_some(PlayfieldId::Pf1),
            };
        }

        let pf1 = PlayfieldPixel {
            visible_color_idx: usize::from(pf1_code),
            front_playfield: Some(PlayfieldId::Pf1),
        };
        let pf2 = PlayfieldPixel {
            visible_color_idx: 8 + usize::from(pf2_code),
            front_playfield: Some(PlayfieldId::Pf2),
        };
        match (pf1_code != 0, pf2_code != 0) {
            (false, false) => PlayfieldPixel {
                visible_color_idx: 0,
                front_playfield: None,
            },
            (true, false) => pf1,
            (false, true) => pf2,
            (true, true) => {
                if self.bplcon2 & BPLCON2_PF2PRI != 0 {
                    pf2
                } else {
                    pf1
                }
            }
        }
    }
}

impl Default for DeniseOcs {
    fn default() -> Self {
        Self::new()
    }
}
