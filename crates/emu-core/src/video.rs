//! Video sink interface.
//!
//! The chipset does not rasterise. It emits runs of a single output class
//! (sync, blank, colour burst, flat level, or pixel data) measured in pixel
//! clocks, and a sink turns those into an image however it likes.

/// Preferred signal encoding for a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayType {
    #[default]
    Rgb,
    CompositeColour,
    CompositeMonochrome,
}

/// Frame-lock diagnostics reported by a sink.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScanStatus {
    /// Measured field duration in seconds, 0.0 if unknown.
    pub field_duration: f64,
    /// Drift between the emitted and expected field duration.
    pub field_duration_gradient: f64,
    /// Current output position within the field, 0.0 to 1.0.
    pub current_position: f32,
    /// Fields seen so far.
    pub hsync_count: u64,
}

/// Receives runs of output from the chipset.
///
/// Lengths are in pixel clocks (four per colour clock, i.e. hires pixels).
pub trait ScanTarget {
    fn output_sync(&mut self, length: usize);
    fn output_blank(&mut self, length: usize);
    fn output_colour_burst(&mut self, length: usize);

    /// A run of one flat 12-bit `0x0RGB` colour.
    fn output_level(&mut self, length: usize, colour: u16);

    /// A run of individual 12-bit `0x0RGB` pixels, one per pixel clock.
    fn output_data(&mut self, pixels: &[u16]);

    /// Called once the final run of a field has been emitted.
    fn frame_complete(&mut self) {}

    fn scan_status(&self) -> ScanStatus {
        ScanStatus::default()
    }

    fn set_display_type(&mut self, _display_type: DisplayType) {}

    fn display_type(&self) -> DisplayType {
        DisplayType::Rgb
    }
}
