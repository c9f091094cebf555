//! Output assembler: turns per-slot output into runs for a [`ScanTarget`].
//!
//! Each slot contributes four pixel clocks of one class. Consecutive slots
//! of the same class are merged and handed to the sink in one call when the
//! class changes, the pixel buffer fills, or the line ends.

use emu_core::ScanTarget;

/// Pixel clocks per colour clock.
pub const PIXELS_PER_SLOT: usize = 4;

/// Staging buffer for pixel runs, in pixel clocks.
const PIXEL_BUFFER_LEN: usize = 256;

/// What the video signal is doing during one slot, before the picture area
/// is resolved into border or pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalRegion {
    Sync,
    Blank,
    ColourBurst,
    Picture,
}

/// Vertical sync lines.
const VSYNC_LINES: std::ops::Range<u16> = 2..5;

/// Classify a slot by its beam position.
#[must_use]
pub fn signal_region(line: u16, cycle: u16, vertical_blank_height: u16) -> SignalRegion {
    let horizontal = match cycle {
        15..18 => SignalRegion::Blank,
        18..35 => SignalRegion::Sync,
        35..38 => SignalRegion::Blank,
        38..47 => SignalRegion::ColourBurst,
        47..53 => SignalRegion::Blank,
        _ => SignalRegion::Picture,
    };
    if VSYNC_LINES.contains(&line) {
        // Serration: the hsync gap is the only non-sync part of the line.
        return if horizontal == SignalRegion::Sync {
            SignalRegion::Blank
        } else {
            SignalRegion::Sync
        };
    }
    if line < vertical_blank_height && horizontal == SignalRegion::Picture {
        return SignalRegion::Blank;
    }
    horizontal
}

/// The output of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOutput {
    Sync,
    Blank,
    ColourBurst,
    /// Flat COLOR00.
    Border(u16),
    Pixels([u16; PIXELS_PER_SLOT]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunClass {
    Sync,
    Blank,
    ColourBurst,
    Level(u16),
    Data,
}

impl RunClass {
    fn of(output: &SlotOutput) -> Self {
        match output {
            SlotOutput::Sync => Self::Sync,
            SlotOutput::Blank => Self::Blank,
            SlotOutput::ColourBurst => Self::ColourBurst,
            SlotOutput::Border(colour) => Self::Level(*colour),
            SlotOutput::Pixels(_) => Self::Data,
        }
    }
}

pub struct OutputAssembler {
    class: Option<RunClass>,
    /// Length of the open run in pixel clocks.
    length: usize,
    pixels: Vec<u16>,
}

impl OutputAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            class: None,
            length: 0,
            pixels: Vec::with_capacity(PIXEL_BUFFER_LEN),
        }
    }

    /// Add one slot's output.
    pub fn push(&mut self, output: SlotOutput, target: Option<&mut (dyn ScanTarget + 'static)>) {
        let class = RunClass::of(&output);
        let mut target = target;
        let full = class == RunClass::Data && self.pixels.len() + PIXELS_PER_SLOT > PIXEL_BUFFER_LEN;
        if self.class != Some(class) || full {
            self.flush(target.as_deref_mut());
            self.class = Some(class);
        }
        if let SlotOutput::Pixels(pixels) = output {
            self.pixels.extend_from_slice(&pixels);
        }
        self.length += PIXELS_PER_SLOT;
    }

    /// Close the open run. Runs never span lines.
    pub fn end_line(&mut self, target: Option<&mut (dyn ScanTarget + 'static)>) {
        self.flush(target);
    }

    /// Close the open run and tell the sink the field is done.
    pub fn end_frame(&mut self, target: Option<&mut (dyn ScanTarget + 'static)>) {
        let mut target = target;
        self.flush(target.as_deref_mut());
        if let Some(target) = target {
            target.frame_complete();
        }
    }

    fn flush(&mut self, target: Option<&mut (dyn ScanTarget + 'static)>) {
        let Some(class) = self.class.take() else {
            return;
        };
        debug_assert!(self.length > 0);
        if let Some(target) = target {
            match class {
                RunClass::Sync => target.output_sync(self.length),
                RunClass::Blank => target.output_blank(self.length),
                RunClass::ColourBurst => target.output_colour_burst(self.length),
                RunClass::Level(colour) => target.output_level(self.length, colour),
                RunClass::Data => target.output_data(&self.pixels),
            }
        }
        self.length = 0;
        self.pixels.clear();
    }
}

impl Default for OutputAssembler {
    fn default() -> Self {
        Self::new()
    }
}
