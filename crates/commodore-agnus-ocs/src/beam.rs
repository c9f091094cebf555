//! Beam counters and video timing.

/// Raster geometry for one video standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoTiming {
    /// Colour clocks per line.
    pub line_length: u16,
    /// Lines in a short field. A long field has one more.
    pub short_field_height: u16,
    /// Lines at the top of the field with no picture.
    pub vertical_blank_height: u16,
    /// VPOSR bits 14-8.
    pub agnus_id: u16,
}

impl VideoTiming {
    /// PAL: 227 colour clocks by 312/313 lines.
    pub const PAL: Self = Self {
        line_length: 227,
        short_field_height: 312,
        vertical_blank_height: 29,
        agnus_id: 0x00,
    };

    /// NTSC: 227 colour clocks by 262/263 lines.
    pub const NTSC: Self = Self {
        line_length: 227,
        short_field_height: 262,
        vertical_blank_height: 21,
        agnus_id: 0x10,
    };
}

/// A (line, cycle) location within the field. Cycles are colour clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RasterPosition {
    pub line: u16,
    pub cycle: u16,
}

impl RasterPosition {
    #[must_use]
    pub const fn new(line: u16, cycle: u16) -> Self {
        Self { line, cycle }
    }
}

/// What the beam crossed when it advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamEvent {
    None,
    LineStart,
    FrameStart,
}

#[derive(Debug, Clone)]
pub struct Beam {
    timing: VideoTiming,
    position: RasterPosition,
    /// LOF: the current field is a long one.
    pub long_field: bool,
    /// BPLCON0 LACE, sampled each frame.
    pub interlace: bool,
    frame: u64,
}

impl Beam {
    #[must_use]
    pub fn new(timing: VideoTiming) -> Self {
        Self {
            timing,
            position: RasterPosition::default(),
            long_field: false,
            interlace: false,
            frame: 0,
        }
    }

    #[must_use]
    pub fn timing(&self) -> VideoTiming {
        self.timing
    }

    #[must_use]
    pub fn position(&self) -> RasterPosition {
        self.position
    }

    /// Completed fields since power-on.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[must_use]
    pub fn field_height(&self) -> u16 {
        self.timing.short_field_height + u16::from(self.long_field)
    }

    /// Last cycle of a line.
    #[must_use]
    pub fn max_cycle(&self) -> u16 {
        self.timing.line_length - 1
    }

    /// Step one colour clock.
    pub fn advance(&mut self) -> BeamEvent {
        self.position.cycle += 1;
        if self.position.cycle < self.timing.line_length {
            return BeamEvent::None;
        }
        self.position.cycle = 0;
        self.position.line += 1;
        if self.position.line < self.field_height() {
            return BeamEvent::LineStart;
        }
        self.position.line = 0;
        self.frame += 1;
        if self.interlace {
            self.long_field = !self.long_field;
        }
        BeamEvent::FrameStart
    }

    /// VPOSR: LOF, Agnus ID, V8.
    #[must_use]
    pub fn read_vposr(&self) -> u16 {
        let lof = if self.long_field { 0x8000 } else { 0 };
        lof | (self.timing.agnus_id << 8) | ((self.position.line >> 8) & 1)
    }

    /// VHPOSR: V7-V0, H8-H1.
    #[must_use]
    pub fn read_vhposr(&self) -> u16 {
        ((self.position.line & 0xFF) << 8) | (self.position.cycle & 0xFF)
    }

    /// VPOSW. LOF takes effect at once, so the current field's length
    /// follows the new flag.
    pub fn write_vposw(&mut self, value: u16) {
        self.long_field = value & 0x8000 != 0;
        let line = (self.position.line & 0xFF) | ((value & 1) << 8);
        self.position.line = line.min(self.field_height() - 1);
    }

    /// VHPOSW.
    pub fn write_vhposw(&mut self, value: u16) {
        let line = (self.position.line & 0x100) | (value >> 8);
        self.position.line = line.min(self.field_height() - 1);
        self.position.cycle = (value & 0xFF).min(self.max_cycle());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_line_then_field() {
        let mut beam = Beam::new(VideoTiming::PAL);
        for _ in 0..226 {
            assert_eq!(beam.advance(), BeamEvent::None);
        }
        assert_eq!(beam.advance(), BeamEvent::LineStart);
        assert_eq!(beam.position(), RasterPosition::new(1, 0));

        let remaining = 311 * 227;
        let mut frames = 0;
        for _ in 0..remaining {
            if beam.advance() == BeamEvent::FrameStart {
                frames += 1;
            }
        }
        assert_eq!(frames, 1);
        assert_eq!(beam.position(), RasterPosition::new(0, 0));
    }

    #[test]
    fn interlace_alternates_field_length() {
        let mut beam = Beam::new(VideoTiming::NTSC);
        beam.interlace = true;
        let mut heights = Vec::new();
        for _ in 0..3 {
            heights.push(beam.field_height());
            let slots = u32::from(beam.field_height()) * 227;
            for _ in 0..slots {
                beam.advance();
            }
        }
        assert_eq!(heights, vec![262, 263, 262]);
    }

    #[test]
    fn vposr_reports_high_line_bit() {
        let mut beam = Beam::new(VideoTiming::PAL);
        beam.write_vhposw(0x0510);
        beam.write_vposw(0x0001);
        assert_eq!(beam.position(), RasterPosition::new(0x105, 0x10));
        assert_eq!(beam.read_vposr(), 0x0001);
        assert_eq!(beam.read_vhposr(), 0x0510);
    }

    #[test]
    fn vposw_lof_approximation_lengthens_current_field() {
        let mut beam = Beam::new(VideoTiming::PAL);
        beam.write_vposw(0x8000);
        assert_eq!(beam.field_height(), 313);
        assert_eq!(beam.read_vposr() & 0x8000, 0x8000);
    }
}
