//! The four audio channels.
//!
//! Each channel keeps one word playing and one prefetched. DMA refills the
//! prefetch slot when Agnus grants the channel's slot; the period counter
//! steps the DAC once per colour clock.

/// Shortest period the DAC can follow, in colour clocks.
pub const MIN_PERIOD: u16 = 124;

#[derive(Debug, Clone, Copy)]
pub struct AudioChannel {
    /// AUDxLC.
    pub location: u32,
    /// AUDxLEN in words, 0 meaning 65536.
    pub length: u16,
    /// AUDxPER as written.
    pub period: u16,
    /// AUDxVOL, 0-64.
    pub volume: u8,
    /// AUDxDAT, last word fetched or written.
    pub data: u16,
    pointer: u32,
    words_remaining: u32,
    playing: Option<u16>,
    queued: Option<u16>,
    high_byte_next: bool,
    countdown: u16,
    sample: i8,
    dma_active: bool,
    dma_was_enabled: bool,
}

impl Default for AudioChannel {
    fn default() -> Self {
        Self {
            location: 0,
            length: 0,
            period: MIN_PERIOD,
            volume: 0,
            data: 0,
            pointer: 0,
            words_remaining: 0,
            playing: None,
            queued: None,
            high_byte_next: true,
            countdown: MIN_PERIOD,
            sample: 0,
            dma_active: false,
            dma_was_enabled: false,
        }
    }
}

impl AudioChannel {
    fn effective_period(&self) -> u16 {
        self.period.max(MIN_PERIOD)
    }

    fn block_words(&self) -> u32 {
        if self.length == 0 {
            65_536
        } else {
            u32::from(self.length)
        }
    }

    /// Track the channel's DMACON enable. Returns true when a block starts,
    /// which is when the hardware raises the channel interrupt.
    pub fn sync_dma_enable(&mut self, enabled: bool) -> bool {
        let started = enabled && !self.dma_was_enabled;
        if started {
            self.pointer = self.location & 0x001F_FFFE;
            self.words_remaining = self.block_words();
            self.playing = None;
            self.queued = None;
            self.high_byte_next = true;
            self.countdown = self.effective_period();
            self.dma_active = true;
        } else if !enabled && self.dma_was_enabled {
            self.dma_active = false;
            self.playing = None;
            self.queued = None;
            self.high_byte_next = true;
        }
        self.dma_was_enabled = enabled;
        started
    }

    /// True if the channel would use its DMA slot right now.
    #[must_use]
    pub fn wants_dma(&self) -> bool {
        self.dma_active && (self.playing.is_none() || self.queued.is_none())
    }

    /// Fetch the next sample word. Returns true if the block wrapped back to
    /// AUDxLC, which raises the channel interrupt again.
    pub fn fetch_dma_word(&mut self, mut read_word: impl FnMut(u32) -> u16) -> bool {
        if !self.wants_dma() {
            return false;
        }

        let mut wrapped = false;
        if self.words_remaining == 0 {
            self.pointer = self.location & 0x001F_FFFE;
            self.words_remaining = self.block_words();
            wrapped = true;
        }

        let word = read_word(self.pointer);
        self.pointer = self.pointer.wrapping_add(2);
        self.words_remaining -= 1;
        self.data = word;

        if self.playing.is_none() {
            self.playing = Some(word);
            self.high_byte_next = true;
        } else {
            self.queued = Some(word);
        }
        wrapped
    }

    /// AUDxDAT written by the CPU. Without DMA this plays the word directly.
    pub fn write_data(&mut self, value: u16) {
        self.data = value;
        if !self.dma_active {
            self.playing = Some(value);
            self.queued = None;
            self.high_byte_next = true;
            self.countdown = self.effective_period();
        }
    }

    /// Step one colour clock.
    pub fn tick(&mut self) {
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown != 0 {
            return;
        }
        self.countdown = self.effective_period();

        if self.playing.is_none() {
            self.playing = self.queued.take();
            self.high_byte_next = true;
        }
        let Some(word) = self.playing else {
            return;
        };

        if self.high_byte_next {
            self.sample = (word >> 8) as u8 as i8;
            self.high_byte_next = false;
        } else {
            self.sample = word as u8 as i8;
            self.high_byte_next = true;
            self.playing = self.queued.take();
        }
    }

    /// Current DAC output scaled by volume, in `[-1.0, 1.0]`.
    #[must_use]
    pub fn output(&self) -> f32 {
        f32::from(self.sample) / 128.0 * f32::from(self.volume.min(64)) / 64.0
    }
}
