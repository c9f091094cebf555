//! Disk DMA: DSKLEN protocol, sync detection, and the word FIFO.
//!
//! The drive side delivers decoded MFM words one at a time; Paula buffers
//! up to four and Agnus drains them into chip RAM in the disk slots.

/// Default DSKSYNC, the standard MFM sync mark.
pub const DEFAULT_SYNC: u16 = 0x4489;

const FIFO_WORDS: usize = 4;

/// ADKCON bit 10: hold reads until DSKSYNC is seen.
pub const ADKCON_WORDSYNC: u16 = 1 << 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiskDmaState {
    #[default]
    Inactive,
    WaitingForSync,
    Reading,
    Writing,
}

/// Result of moving one word through a disk DMA slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskTransfer {
    pub word: u16,
    /// The block length reached zero with this word.
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct DiskDma {
    /// DSKLEN as last written.
    pub dsklen: u16,
    /// DSKSYNC.
    pub sync_word: u16,
    state: DiskDmaState,
    armed: bool,
    words_remaining: u16,
    fifo: [u16; FIFO_WORDS],
    head: usize,
    len: usize,
    last_word: u16,
    byte_ready: bool,
    word_equal: bool,
}

impl Default for DiskDma {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskDma {
    #[must_use]
    pub fn new() -> Self {
        Self {
            dsklen: 0,
            sync_word: DEFAULT_SYNC,
            state: DiskDmaState::Inactive,
            armed: false,
            words_remaining: 0,
            fifo: [0; FIFO_WORDS],
            head: 0,
            len: 0,
            last_word: 0,
            byte_ready: false,
            word_equal: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> DiskDmaState {
        self.state
    }

    #[must_use]
    pub fn words_remaining(&self) -> u16 {
        self.words_remaining
    }

    /// DSKLEN write. DMA starts only on the second consecutive write with
    /// bit 15 set; any write with bit 15 clear stops it.
    pub fn write_dsklen(&mut self, value: u16, adkcon: u16) {
        self.dsklen = value;
        if value & 0x8000 == 0 {
            if self.state != DiskDmaState::Inactive {
                log::debug!("disk DMA stopped with {} words left", self.words_remaining);
            }
            self.state = DiskDmaState::Inactive;
            self.armed = false;
            return;
        }
        if !self.armed {
            self.armed = true;
            return;
        }

        self.armed = false;
        self.words_remaining = value & 0x3FFF;
        self.head = 0;
        self.len = 0;
        if self.words_remaining == 0 {
            self.state = DiskDmaState::Inactive;
            return;
        }
        self.state = if value & 0x4000 != 0 {
            DiskDmaState::Writing
        } else if adkcon & ADKCON_WORDSYNC != 0 {
            DiskDmaState::WaitingForSync
        } else {
            DiskDmaState::Reading
        };
        log::debug!(
            "disk DMA {:?}: {} words",
            self.state,
            self.words_remaining
        );
    }

    /// A word arrives from the drive. Returns true when it matched DSKSYNC,
    /// which requests the DSKSYN interrupt.
    pub fn enqueue_word(&mut self, word: u16, sync_match: bool) -> bool {
        self.last_word = word;
        self.byte_ready = true;
        self.word_equal = sync_match;

        match self.state {
            DiskDmaState::WaitingForSync if sync_match => {
                self.state = DiskDmaState::Reading;
            }
            DiskDmaState::Reading if self.len < FIFO_WORDS => {
                self.fifo[(self.head + self.len) % FIFO_WORDS] = word;
                self.len += 1;
            }
            _ => {}
        }
        sync_match
    }

    /// True if a disk slot would be used now.
    #[must_use]
    pub fn wants_dma(&self) -> bool {
        match self.state {
            DiskDmaState::Reading => self.len > 0,
            DiskDmaState::Writing => true,
            _ => false,
        }
    }

    /// Pop the oldest buffered word for writing to chip RAM.
    pub fn take_read_word(&mut self) -> Option<DiskTransfer> {
        if self.state != DiskDmaState::Reading || self.len == 0 {
            return None;
        }
        let word = self.fifo[self.head];
        self.head = (self.head + 1) % FIFO_WORDS;
        self.len -= 1;
        Some(DiskTransfer {
            word,
            finished: self.count_word(),
        })
    }

    /// A word was fetched from chip RAM for the drive. Returns true if it
    /// was the last of the block.
    pub fn complete_write_word(&mut self) -> bool {
        if self.state != DiskDmaState::Writing {
            return false;
        }
        self.count_word()
    }

    fn count_word(&mut self) -> bool {
        self.words_remaining = self.words_remaining.saturating_sub(1);
        if self.words_remaining == 0 {
            self.state = DiskDmaState::Inactive;
            self.len = 0;
            return true;
        }
        false
    }

    /// DSKDATR: the word most recently taken from the drive.
    #[must_use]
    pub fn read_dskdatr(&self) -> u16 {
        self.last_word
    }

    /// DSKBYTR. Reading clears the byte-ready flag.
    pub fn read_dskbytr(&mut self) -> u16 {
        let mut value = self.last_word & 0x00FF;
        if self.byte_ready {
            value |= 0x8000;
        }
        if self.state != DiskDmaState::Inactive {
            value |= 0x4000;
        }
        if self.dsklen & 0x4000 != 0 {
            value |= 0x2000;
        }
        if self.word_equal {
            value |= 0x1000;
        }
        self.byte_ready = false;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_write_does_not_start() {
        let mut disk = DiskDma::new();
        disk.write_dsklen(0x8004, 0);
        assert_eq!(disk.state(), DiskDmaState::Inactive);
        disk.write_dsklen(0x8004, 0);
        assert_eq!(disk.state(), DiskDmaState::Reading);
        assert_eq!(disk.words_remaining(), 4);
    }

    #[test]
    fn wordsync_holds_until_sync_mark() {
        let mut disk = DiskDma::new();
        disk.write_dsklen(0x8002, ADKCON_WORDSYNC);
        disk.write_dsklen(0x8002, ADKCON_WORDSYNC);
        assert_eq!(disk.state(), DiskDmaState::WaitingForSync);

        disk.enqueue_word(0xAAAA, false);
        assert!(!disk.wants_dma());
        assert!(disk.enqueue_word(DEFAULT_SYNC, true));
        assert_eq!(disk.state(), DiskDmaState::Reading);
        assert!(!disk.wants_dma(), "the sync mark itself is not stored");

        disk.enqueue_word(0x1111, false);
        disk.enqueue_word(0x2222, false);
        let first = disk.take_read_word().map(|t| (t.word, t.finished));
        let second = disk.take_read_word().map(|t| (t.word, t.finished));
        assert_eq!(first, Some((0x1111, false)));
        assert_eq!(second, Some((0x2222, true)));
        assert_eq!(disk.state(), DiskDmaState::Inactive);
    }

    #[test]
    fn fifo_drops_words_when_full() {
        let mut disk = DiskDma::new();
        disk.write_dsklen(0x8010, 0);
        disk.write_dsklen(0x8010, 0);
        for word in 1..=6 {
            disk.enqueue_word(word, false);
        }
        let drained: Vec<u16> = std::iter::from_fn(|| disk.take_read_word().map(|t| t.word)).collect();
        assert_eq!(drained, vec![1, 2, 3, 4]);
    }

    #[test]
    fn dskbytr_reports_and_clears_byte_ready() {
        let mut disk = DiskDma::new();
        disk.enqueue_word(0x12AB, false);
        assert_eq!(disk.read_dskbytr(), 0x80AB);
        assert_eq!(disk.read_dskbytr(), 0x00AB);
    }
}
