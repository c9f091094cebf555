//! Agnus - beam counter and DMA slot allocation.

use crate::beam::{Beam, BeamEvent, RasterPosition, VideoTiming};
use crate::bitplanes::{BitplaneDma, BitplaneFetch};
use crate::blitter::Blitter;
use crate::copper::Copper;
use crate::sprites::SpriteDma;

pub const DMACON_AUD0EN: u16 = 0x0001;
pub const DMACON_DSKEN: u16 = 0x0010;
pub const DMACON_SPREN: u16 = 0x0020;
pub const DMACON_BLTEN: u16 = 0x0040;
pub const DMACON_COPEN: u16 = 0x0080;
pub const DMACON_BPLEN: u16 = 0x0100;
pub const DMACON_DMAEN: u16 = 0x0200;
pub const DMACON_BLTPRI: u16 = 0x0400;
/// DMACONR status bits.
pub const DMACON_BZERO: u16 = 0x2000;
pub const DMACON_BBUSY: u16 = 0x4000;

/// Bits DMACON writes can change.
const DMACON_WRITABLE: u16 = 0x07FF;

/// Slots a waiting CPU may lose in a row before a polite blitter yields.
const CPU_STARVATION_LIMIT: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOwner {
    Cpu,
    Refresh,
    Disk,
    Audio(u8),
    Sprite(u8),
    Bitplane(u8),
    Copper,
    Blitter,
}

/// Per-slot demand from outside Agnus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotRequests {
    /// The disk FIFO has room for a word (or one to write).
    pub disk: bool,
    /// Audio channels whose buffers need a word.
    pub audio: [bool; 4],
    /// The CPU has a chip bus access outstanding.
    pub cpu_waiting: bool,
}

pub struct Agnus {
    pub beam: Beam,
    pub dmacon: u16,
    pub bplcon0: u16,
    pub diwstrt: u16,
    pub diwstop: u16,
    pub bitplanes: BitplaneDma,
    pub sprites: [SpriteDma; 8],
    pub disk_pointer: u32,
    pub copper: Copper,
    pub blitter: Blitter,
    /// The current line lies within DIWSTRT/DIWSTOP.
    vertical_window: bool,
    /// Consecutive slots a waiting CPU has been refused.
    cpu_starved: u8,
}

impl Agnus {
    #[must_use]
    pub fn new(timing: VideoTiming) -> Self {
        Self {
            beam: Beam::new(timing),
            dmacon: 0,
            bplcon0: 0,
            diwstrt: 0,
            diwstop: 0,
            bitplanes: BitplaneDma::default(),
            sprites: Default::default(),
            disk_pointer: 0,
            copper: Copper::new(),
            blitter: Blitter::new(),
            vertical_window: false,
            cpu_starved: 0,
        }
    }

    #[must_use]
    pub fn position(&self) -> RasterPosition {
        self.beam.position()
    }

    #[must_use]
    pub fn num_bitplanes(&self) -> u8 {
        let bpl_bits = ((self.bplcon0 >> 12) & 0x07) as u8;
        bpl_bits.min(6)
    }

    #[must_use]
    pub fn hires(&self) -> bool {
        self.bplcon0 & 0x8000 != 0
    }

    #[must_use]
    pub fn dma_enabled(&self, bit: u16) -> bool {
        (self.dmacon & DMACON_DMAEN) != 0 && (self.dmacon & bit) != 0
    }

    /// DMACON: bit 15 selects set or clear for the other bits.
    pub fn write_dmacon(&mut self, value: u16) {
        let bits = value & DMACON_WRITABLE;
        if value & 0x8000 != 0 {
            self.dmacon |= bits;
        } else {
            self.dmacon &= !bits;
        }
    }

    #[must_use]
    pub fn read_dmaconr(&self) -> u16 {
        let mut value = self.dmacon & DMACON_WRITABLE;
        if self.blitter.is_busy() {
            value |= DMACON_BBUSY;
        }
        if self.blitter.zero() {
            value |= DMACON_BZERO;
        }
        value
    }

    /// BPLCON0 as Agnus sees it: plane count, resolution and LACE.
    pub fn write_bplcon0(&mut self, value: u16) {
        self.bplcon0 = value;
        self.beam.interlace = value & 0x0004 != 0;
    }

    pub fn write_disk_pointer_high(&mut self, value: u16) {
        self.disk_pointer =
            ((self.disk_pointer & 0x0000_FFFF) | (u32::from(value) << 16)) & 0x001F_FFFE;
    }

    pub fn write_disk_pointer_low(&mut self, value: u16) {
        self.disk_pointer = ((self.disk_pointer & 0xFFFF_0000) | u32::from(value)) & 0x001F_FFFE;
    }

    /// First displayed line.
    #[must_use]
    pub fn window_vstart(&self) -> u16 {
        self.diwstrt >> 8
    }

    /// Line after the last displayed one. V8 is the complement of V7.
    #[must_use]
    pub fn window_vstop(&self) -> u16 {
        let v = self.diwstop >> 8;
        if v & 0x80 == 0 { v | 0x100 } else { v }
    }

    /// True while the beam is inside the vertical display window.
    #[must_use]
    pub fn in_vertical_window(&self) -> bool {
        self.vertical_window
    }

    /// The bitplane fetch scheduled for `cycle` on this line, if any.
    #[must_use]
    pub fn bitplane_slot(&self, cycle: u16) -> Option<BitplaneFetch> {
        if !self.vertical_window || !self.dma_enabled(DMACON_BPLEN) {
            return None;
        }
        self.bitplanes
            .fetch_at(cycle, self.num_bitplanes(), self.hires())
    }

    /// Decide who owns the bus at the current beam position.
    ///
    /// Fixed slots go to refresh, disk, audio and sprites; bitplanes take
    /// their window and beat any sprite slot they overlap. Everything left
    /// is offered to the Copper (even cycles), then the blitter, then the
    /// CPU.
    #[must_use]
    pub fn arbitrate(&self, requests: &SlotRequests) -> SlotOwner {
        let position = self.position();
        let cycle = position.cycle;

        match cycle {
            0x01..=0x03 | 0x1B => return SlotOwner::Refresh,
            0x04..=0x06 => {
                if requests.disk && self.dma_enabled(DMACON_DSKEN) {
                    return SlotOwner::Disk;
                }
            }
            0x07..=0x0A => {
                let channel = (cycle - 0x07) as u8;
                if requests.audio[usize::from(channel)]
                    && self.dma_enabled(DMACON_AUD0EN << channel)
                {
                    return SlotOwner::Audio(channel);
                }
            }
            _ => {}
        }

        if let Some(fetch) = self.bitplane_slot(cycle) {
            return SlotOwner::Bitplane(fetch.plane);
        }

        if (0x0B..=0x1A).contains(&cycle) {
            let sprite = (cycle - 0x0B) / 2;
            let second = (cycle - 0x0B) % 2 == 1;
            if self.dma_enabled(DMACON_SPREN) && self.sprites[usize::from(sprite)].wants_slot(second)
            {
                return SlotOwner::Sprite(sprite as u8);
            }
        }

        let copper_cycle = cycle % 2 == 0 && (cycle == 0 || (0x1C..=0xE2).contains(&cycle));
        if copper_cycle
            && self.dma_enabled(DMACON_COPEN)
            && self.copper.wants_slot(position, self.blitter.is_idle())
        {
            return SlotOwner::Copper;
        }

        if self.blitter.is_busy() && self.dma_enabled(DMACON_BLTEN) {
            let nasty = self.dmacon & DMACON_BLTPRI != 0;
            if nasty || !requests.cpu_waiting || self.cpu_starved < CPU_STARVATION_LIMIT {
                return SlotOwner::Blitter;
            }
        }

        SlotOwner::Cpu
    }

    /// Track CPU starvation for the blitter's yield rule.
    pub fn record_grant(&mut self, owner: SlotOwner, cpu_waiting: bool) {
        if owner == SlotOwner::Cpu || !cpu_waiting {
            self.cpu_starved = 0;
        } else {
            self.cpu_starved = self.cpu_starved.saturating_add(1);
        }
    }

    /// Step the beam one slot, running line and frame start work.
    pub fn advance_beam(&mut self) -> BeamEvent {
        let event = self.beam.advance();
        match event {
            BeamEvent::None => {}
            BeamEvent::LineStart => self.begin_line(),
            BeamEvent::FrameStart => {
                self.copper.restart_cop1();
                self.begin_line();
            }
        }
        event
    }

    /// Vertical comparisons for the line the beam just entered.
    pub fn begin_line(&mut self) {
        let line = self.position().line;
        if line == 0 {
            self.vertical_window = false;
        }
        if line == self.window_vstart() {
            self.vertical_window = true;
        }
        if line == self.window_vstop() {
            self.vertical_window = false;
        }
        for sprite in &mut self.sprites {
            sprite.begin_line(line);
        }
        if line == self.beam.timing().vertical_blank_height {
            for sprite in &mut self.sprites {
                sprite.restart();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agnus_at(line: u16, cycle: u16) -> Agnus {
        let mut agnus = Agnus::new(VideoTiming::PAL);
        agnus.beam.write_vhposw((line << 8) | cycle);
        agnus
    }

    #[test]
    fn refresh_slots_are_fixed() {
        for cycle in [0x01, 0x02, 0x03, 0x1B] {
            let agnus = agnus_at(10, cycle);
            assert_eq!(agnus.arbitrate(&SlotRequests::default()), SlotOwner::Refresh);
        }
    }

    #[test]
    fn audio_slot_needs_enable_and_request() {
        let mut agnus = agnus_at(10, 0x07);
        let requests = SlotRequests {
            audio: [true, false, false, false],
            ..SlotRequests::default()
        };
        assert_eq!(agnus.arbitrate(&requests), SlotOwner::Cpu);
        agnus.write_dmacon(0x8000 | DMACON_DMAEN | DMACON_AUD0EN);
        assert_eq!(agnus.arbitrate(&requests), SlotOwner::Audio(0));
        assert_eq!(agnus.arbitrate(&SlotRequests::default()), SlotOwner::Cpu);
    }

    #[test]
    fn copper_takes_even_free_slots() {
        let mut agnus = agnus_at(10, 0x1C);
        agnus.write_dmacon(0x8000 | DMACON_DMAEN | DMACON_COPEN);
        agnus.copper.restart_cop1();
        assert_eq!(agnus.arbitrate(&SlotRequests::default()), SlotOwner::Copper);

        let odd = {
            let mut a = agnus_at(10, 0x1D);
            a.write_dmacon(0x8000 | DMACON_DMAEN | DMACON_COPEN);
            a.copper.restart_cop1();
            a
        };
        assert_eq!(odd.arbitrate(&SlotRequests::default()), SlotOwner::Cpu);
    }

    #[test]
    fn bitplanes_beat_copper_in_fetch_window() {
        let mut agnus = agnus_at(0x2C, 0x3A);
        agnus.write_dmacon(0x8000 | DMACON_DMAEN | DMACON_BPLEN | DMACON_COPEN);
        agnus.write_bplcon0(6 << 12);
        agnus.diwstrt = 0x2C81;
        agnus.diwstop = 0x2CC1;
        agnus.bitplanes.ddfstrt = 0x38;
        agnus.bitplanes.ddfstop = 0xD0;
        agnus.begin_line();
        agnus.copper.restart_cop1();
        assert!(agnus.in_vertical_window());
        assert_eq!(agnus.arbitrate(&SlotRequests::default()), SlotOwner::Bitplane(5));
    }

    #[test]
    fn vertical_window_opens_and_closes() {
        let mut agnus = Agnus::new(VideoTiming::PAL);
        agnus.diwstrt = 0x2C81;
        agnus.diwstop = 0x2CC1;
        assert_eq!(agnus.window_vstop(), 0x12C);
        let mut open_lines = 0;
        for _ in 0..u32::from(agnus.beam.field_height()) * 227 {
            if agnus.advance_beam() != BeamEvent::None && agnus.in_vertical_window() {
                open_lines += 1;
            }
        }
        assert_eq!(open_lines, 0x12C - 0x2C);
    }

    #[test]
    fn nasty_blitter_takes_cpu_slot() {
        let mut agnus = agnus_at(10, 0x00);
        agnus.blitter.bltcon0 = 0x09F0;
        agnus.blitter.write_size((1 << 6) | 1);
        agnus.write_dmacon(0x8000 | DMACON_DMAEN | DMACON_BLTEN | DMACON_BLTPRI);
        let requests = SlotRequests {
            cpu_waiting: true,
            ..SlotRequests::default()
        };
        for _ in 0..8 {
            let owner = agnus.arbitrate(&requests);
            assert_eq!(owner, SlotOwner::Blitter);
            agnus.record_grant(owner, true);
        }
    }

    #[test]
    fn polite_blitter_yields_after_three_slots() {
        let mut agnus = agnus_at(10, 0x00);
        agnus.blitter.bltcon0 = 0x09F0;
        agnus.blitter.write_size((1 << 6) | 1);
        agnus.write_dmacon(0x8000 | DMACON_DMAEN | DMACON_BLTEN);
        let requests = SlotRequests {
            cpu_waiting: true,
            ..SlotRequests::default()
        };
        let mut owners = Vec::new();
        for _ in 0..8 {
            let owner = agnus.arbitrate(&requests);
            agnus.record_grant(owner, true);
            owners.push(owner);
        }
        assert_eq!(&owners[..4], &[
            SlotOwner::Blitter,
            SlotOwner::Blitter,
            SlotOwner::Blitter,
            SlotOwner::Cpu
        ]);
        assert_eq!(owners[4], SlotOwner::Blitter);
    }

    #[test]
    fn dmaconr_reports_blitter_status() {
        let mut agnus = Agnus::new(VideoTiming::PAL);
        agnus.write_dmacon(0x8000 | DMACON_DMAEN | DMACON_BLTPRI);
        assert_eq!(agnus.read_dmaconr(), DMACON_DMAEN | DMACON_BLTPRI | DMACON_BZERO);
        agnus.write_dmacon(DMACON_BLTPRI);
        agnus.blitter.write_size(0x0041);
        assert_eq!(agnus.read_dmaconr(), DMACON_DMAEN | DMACON_BBUSY | DMACON_BZERO);
    }

    #[test]
    fn sprites_rearm_at_end_of_vertical_blank() {
        let mut agnus = Agnus::new(VideoTiming::PAL);
        agnus.beam.write_vhposw((28 << 8) | 226);
        agnus.advance_beam();
        assert_eq!(agnus.position().line, 29);
        assert!(agnus.sprites.iter().all(|s| s.wants_slot(false)));
    }
}
