//! Commodore 8364 Paula: interrupt controller, audio, disk DMA and UART.
//!
//! Paula owns the fourteen interrupt sources and folds them into the six
//! CPU levels. Its DMA channels never touch memory themselves: Agnus grants
//! the slot, performs the transfer, and hands the word over.

mod audio;
mod disk;
mod interrupts;
mod serial;

pub use audio::{AudioChannel, MIN_PERIOD};
pub use disk::{ADKCON_WORDSYNC, DEFAULT_SYNC, DiskDma, DiskDmaState, DiskTransfer};
pub use interrupts::{
    InterruptController, InterruptFlag, LEVEL_OF_BIT, MASTER_ENABLE, SOURCE_MASK, priority_level,
};
pub use serial::{SerialPort, TRANSMIT_CAPACITY};

const AUDIO_DMA_MASTER: u16 = 0x0200;
const AUDIO_DMA_BITS: [u16; 4] = [0x0001, 0x0002, 0x0004, 0x0008];

pub struct Paula8364 {
    pub interrupts: InterruptController,
    pub adkcon: u16,
    pub disk: DiskDma,
    pub serial: SerialPort,
    audio: [AudioChannel; 4],
}

impl Paula8364 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            interrupts: InterruptController::new(),
            adkcon: 0,
            disk: DiskDma::new(),
            serial: SerialPort::new(),
            audio: [AudioChannel::default(); 4],
        }
    }

    #[must_use]
    pub fn interrupt_level(&self) -> u8 {
        self.interrupts.level()
    }

    pub fn write_adkcon(&mut self, value: u16) {
        self.adkcon = interrupts::set_clr(self.adkcon, value);
    }

    /// Write one audio register (AUDx*), returning true if handled.
    pub fn write_audio_register(&mut self, offset: u16, value: u16) -> bool {
        if !(0x0A0..=0x0DA).contains(&offset) {
            return false;
        }
        let rel = offset - 0x0A0;
        let ch = &mut self.audio[usize::from(rel / 0x10)];
        match (rel % 0x10) / 2 {
            0 => ch.location = (ch.location & 0x0000_FFFF) | (u32::from(value) << 16),
            1 => ch.location = (ch.location & 0xFFFF_0000) | u32::from(value & 0xFFFE),
            2 => ch.length = value,
            3 => ch.period = value,
            4 => ch.volume = (value & 0x7F).min(64) as u8,
            5 => ch.write_data(value),
            _ => {}
        }
        true
    }

    /// Last value written to an audio register, for inspection. The
    /// hardware registers are write-only.
    #[must_use]
    pub fn read_audio_register(&self, offset: u16) -> Option<u16> {
        if !(0x0A0..=0x0DA).contains(&offset) {
            return None;
        }
        let rel = offset - 0x0A0;
        let ch = &self.audio[usize::from(rel / 0x10)];
        Some(match (rel % 0x10) / 2 {
            0 => (ch.location >> 16) as u16,
            1 => ch.location as u16,
            2 => ch.length,
            3 => ch.period,
            4 => u16::from(ch.volume),
            5 => ch.data,
            _ => 0,
        })
    }

    /// Follow DMACON. A channel whose DMA has just been enabled starts its
    /// block and requests its interrupt.
    pub fn sync_audio_dma(&mut self, dmacon: u16) {
        for (index, channel) in self.audio.iter_mut().enumerate() {
            let enabled = dmacon & AUDIO_DMA_MASTER != 0 && dmacon & AUDIO_DMA_BITS[index] != 0;
            if channel.sync_dma_enable(enabled) {
                self.interrupts.set_request(InterruptFlag::audio(index));
            }
        }
    }

    #[must_use]
    pub fn audio_wants_dma(&self, channel: usize) -> bool {
        self.audio[channel & 3].wants_dma()
    }

    /// Service channel `channel`'s DMA slot.
    pub fn fetch_audio_word(&mut self, channel: usize, read_word: impl FnMut(u32) -> u16) {
        if self.audio[channel & 3].fetch_dma_word(read_word) {
            self.interrupts.set_request(InterruptFlag::audio(channel));
        }
    }

    /// Step every channel's DAC one colour clock.
    pub fn tick_audio(&mut self) {
        for channel in &mut self.audio {
            channel.tick();
        }
    }

    /// Mixed stereo output in `[-1.0, 1.0]`: channels 0 and 3 left, 1 and 2
    /// right.
    #[must_use]
    pub fn mix_audio_stereo(&self) -> (f32, f32) {
        let left = (self.audio[0].output() + self.audio[3].output()) * 0.5;
        let right = (self.audio[1].output() + self.audio[2].output()) * 0.5;
        (left.clamp(-1.0, 1.0), right.clamp(-1.0, 1.0))
    }

    pub fn write_dsklen(&mut self, value: u16) {
        self.disk.write_dsklen(value, self.adkcon);
    }

    /// A decoded word from the drive.
    pub fn enqueue_disk_word(&mut self, word: u16, sync_match: bool) {
        if self.disk.enqueue_word(word, sync_match) {
            self.interrupts.set_request(InterruptFlag::DiskSync);
        }
    }

    /// Pop a word bound for chip RAM, raising DSKBLK if it ends the block.
    pub fn take_disk_word(&mut self) -> Option<u16> {
        let transfer = self.disk.take_read_word()?;
        if transfer.finished {
            self.interrupts.set_request(InterruptFlag::DiskBlock);
        }
        Some(transfer.word)
    }

    /// Account for a word fetched from chip RAM for the drive.
    pub fn complete_disk_write(&mut self) {
        if self.disk.complete_write_word() {
            self.interrupts.set_request(InterruptFlag::DiskBlock);
        }
    }

    pub fn write_serdat(&mut self, value: u16) {
        if self.serial.write_serdat(value) {
            self.interrupts.set_request(InterruptFlag::SerialTransmit);
        }
    }

    #[must_use]
    pub fn read_serdatr(&self) -> u16 {
        self.serial
            .read_serdatr(self.interrupts.is_requested(InterruptFlag::SerialReceive))
    }

    pub fn receive_serial(&mut self, byte: u8) {
        let full = self.interrupts.is_requested(InterruptFlag::SerialReceive);
        if self.serial.receive(byte, full) {
            self.interrupts.set_request(InterruptFlag::SerialReceive);
        }
    }

    /// Step the UART one colour clock.
    pub fn tick_serial(&mut self) {
        if self.serial.tick() {
            self.interrupts.set_request(InterruptFlag::SerialTransmit);
        }
    }
}

impl Default for Paula8364 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_reads_audio_registers() {
        let mut paula = Paula8364::new();
        assert!(paula.write_audio_register(0x0B0, 0x0001));
        assert!(paula.write_audio_register(0x0B2, 0x5679));
        assert!(paula.write_audio_register(0x0B4, 0x0020));
        assert!(paula.write_audio_register(0x0B6, 0x0100));
        assert!(paula.write_audio_register(0x0B8, 0x007F));
        assert!(!paula.write_audio_register(0x0DC, 0));

        assert_eq!(paula.read_audio_register(0x0B0), Some(0x0001));
        assert_eq!(paula.read_audio_register(0x0B2), Some(0x5678));
        assert_eq!(paula.read_audio_register(0x0B4), Some(0x0020));
        assert_eq!(paula.read_audio_register(0x0B6), Some(0x0100));
        assert_eq!(paula.read_audio_register(0x0B8), Some(64), "volume clamps");
    }

    #[test]
    fn audio_dma_start_requests_channel_interrupt() {
        let mut paula = Paula8364::new();
        paula.write_audio_register(0x0C2, 0x1000);
        paula.write_audio_register(0x0C4, 1);
        paula.sync_audio_dma(0x0200 | 0x0004);
        assert!(paula.interrupts.is_requested(InterruptFlag::Audio2));
        assert!(paula.audio_wants_dma(2));
        assert!(!paula.audio_wants_dma(0));
    }

    #[test]
    fn audio_left_mix_follows_channel_zero() {
        let mut paula = Paula8364::new();
        paula.write_audio_register(0x0A2, 0x1000);
        paula.write_audio_register(0x0A4, 1);
        paula.write_audio_register(0x0A6, 124);
        paula.write_audio_register(0x0A8, 64);
        paula.sync_audio_dma(0x0201);
        paula.fetch_audio_word(0, |addr| if addr == 0x1000 { 0x7F80 } else { 0 });
        for _ in 0..124 {
            paula.tick_audio();
        }
        let (left, right) = paula.mix_audio_stereo();
        assert!(left > 0.4, "left={left}");
        assert!(right.abs() < 0.01, "right={right}");
    }

    #[test]
    fn disk_block_end_raises_dskblk() {
        let mut paula = Paula8364::new();
        paula.write_dsklen(0x8001);
        paula.write_dsklen(0x8001);
        paula.enqueue_disk_word(0xBEEF, false);
        assert_eq!(paula.take_disk_word(), Some(0xBEEF));
        assert!(paula.interrupts.is_requested(InterruptFlag::DiskBlock));
    }

    #[test]
    fn sync_match_raises_dsksyn_even_when_idle() {
        let mut paula = Paula8364::new();
        paula.enqueue_disk_word(DEFAULT_SYNC, true);
        assert!(paula.interrupts.is_requested(InterruptFlag::DiskSync));
    }

    #[test]
    fn received_byte_sets_rbf_in_serdatr() {
        let mut paula = Paula8364::new();
        paula.receive_serial(0x5A);
        assert_eq!(paula.read_serdatr() & 0x43FF, 0x415A);
        paula.interrupts.clear_request(InterruptFlag::SerialReceive);
        assert_eq!(paula.read_serdatr() & 0x4000, 0);
    }
}
