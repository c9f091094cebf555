//! Headless capture: a rasterising sink with PNG output, and WAV output.

use std::error::Error;
use std::fs;
use std::io::BufWriter;
use std::path::Path;

use emu_core::ScanTarget;

use crate::output::PIXELS_PER_SLOT;

/// Pixel clocks in one line of 227 colour clocks.
pub const LINE_WIDTH: usize = 227 * PIXELS_PER_SLOT;
/// Enough rows for a long PAL field.
pub const MAX_LINES: usize = 313;

/// A sink that paints runs into an RGBA image, one row per line.
///
/// Every line is exactly [`LINE_WIDTH`] pixel clocks long, so the cursor
/// wraps by count; `frame_complete` returns it to the top.
pub struct FrameRecorder {
    rgba: Vec<u8>,
    x: usize,
    y: usize,
    frames: u64,
}

fn expand(colour: u16) -> [u8; 4] {
    let r = ((colour >> 8) & 0xF) as u8;
    let g = ((colour >> 4) & 0xF) as u8;
    let b = (colour & 0xF) as u8;
    [r * 0x11, g * 0x11, b * 0x11, 0xFF]
}

const BLACK: [u8; 4] = [0, 0, 0, 0xFF];
const BURST: [u8; 4] = [0x20, 0x20, 0x20, 0xFF];

impl FrameRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rgba: vec![0; LINE_WIDTH * MAX_LINES * 4],
            x: 0,
            y: 0,
            frames: 0,
        }
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// RGBA at `(x, y)`, or `None` off the image.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= LINE_WIDTH || y >= MAX_LINES {
            return None;
        }
        let i = (y * LINE_WIDTH + x) * 4;
        let mut out = [0; 4];
        out.copy_from_slice(&self.rgba[i..i + 4]);
        Some(out)
    }

    fn plot(&mut self, rgba: [u8; 4]) {
        if self.y < MAX_LINES {
            let i = (self.y * LINE_WIDTH + self.x) * 4;
            self.rgba[i..i + 4].copy_from_slice(&rgba);
        }
        self.x += 1;
        if self.x == LINE_WIDTH {
            self.x = 0;
            self.y += 1;
        }
    }

    fn fill(&mut self, length: usize, rgba: [u8; 4]) {
        for _ in 0..length {
            self.plot(rgba);
        }
    }

    /// Save the last painted field as a PNG file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save_png(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let file = fs::File::create(path)?;
        let w = BufWriter::new(file);
        let mut encoder = png::Encoder::new(w, LINE_WIDTH as u32, MAX_LINES as u32);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.rgba)?;
        Ok(())
    }
}

impl Default for FrameRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanTarget for FrameRecorder {
    fn output_sync(&mut self, length: usize) {
        self.fill(length, BLACK);
    }

    fn output_blank(&mut self, length: usize) {
        self.fill(length, BLACK);
    }

    fn output_colour_burst(&mut self, length: usize) {
        self.fill(length, BURST);
    }

    fn output_level(&mut self, length: usize, colour: u16) {
        self.fill(length, expand(colour));
    }

    fn output_data(&mut self, pixels: &[u16]) {
        for &colour in pixels {
            self.plot(expand(colour));
        }
    }

    fn frame_complete(&mut self) {
        self.x = 0;
        self.y = 0;
        self.frames += 1;
    }
}

/// Write interleaved stereo samples as a 16-bit WAV file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_wav(samples: &[f32], sample_rate: u32, path: &Path) -> Result<(), Box<dyn Error>> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        let scaled = (clamped * f32::from(i16::MAX)) as i16;
        writer.write_sample(scaled)?;
    }
    writer.finalize()?;
    Ok(())
}
