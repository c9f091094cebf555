//! Sprite DMA: per-sprite fetch state machines.
//!
//! Each sprite owns two consecutive fixed slots per line. Agnus compares
//! the line counter against the sprite's vertical start and stop; Denise
//! does the horizontal work once the fetched words reach its registers.

/// Lines are compared for equality, as the hardware comparators do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpriteDmaState {
    #[default]
    Stopped,
    /// Next first slot fetches SPRxPOS.
    FetchStart,
    /// Next second slot fetches SPRxCTL.
    FetchStopAndControl,
    /// Control words loaded; idle until the line equals `v_start`.
    WaitingForStart,
    /// Next first slot fetches SPRxDATA; one more data word follows.
    FetchData1,
    /// Next second slot fetches SPRxDATB, the line's last data word.
    FetchData0,
}

/// Which register a fetched word belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteRegister {
    Pos,
    Ctl,
    Data,
    Datb,
}

#[derive(Debug, Clone, Default)]
pub struct SpriteDma {
    pub pointer: u32,
    pub state: SpriteDmaState,
    pub pos: u16,
    pub ctl: u16,
}

impl SpriteDma {
    /// First line of the sprite, V8 from CTL bit 2.
    #[must_use]
    pub fn v_start(&self) -> u16 {
        (self.pos >> 8) | ((self.ctl & 0x0004) << 6)
    }

    /// Line on which the sprite ends, V8 from CTL bit 1.
    #[must_use]
    pub fn v_stop(&self) -> u16 {
        (self.ctl >> 8) | ((self.ctl & 0x0002) << 7)
    }

    /// Re-arm at the top of the display.
    pub fn restart(&mut self) {
        self.state = SpriteDmaState::FetchStart;
    }

    /// SPRxPOS seen by Agnus, from the CPU, the Copper or DMA.
    pub fn write_pos(&mut self, value: u16) {
        self.pos = value;
    }

    /// SPRxCTL seen by Agnus. Parks the channel until the start line; a zero
    /// control pair stops it for the rest of the frame.
    pub fn write_ctl(&mut self, value: u16) {
        self.ctl = value;
        self.state = if self.pos == 0 && self.ctl == 0 {
            SpriteDmaState::Stopped
        } else {
            SpriteDmaState::WaitingForStart
        };
    }

    /// Vertical comparisons at the start of `line`.
    pub fn begin_line(&mut self, line: u16) {
        self.state = match self.state {
            SpriteDmaState::FetchData1 | SpriteDmaState::FetchData0 if line == self.v_stop() => {
                SpriteDmaState::FetchStart
            }
            SpriteDmaState::FetchData0 => SpriteDmaState::FetchData1,
            SpriteDmaState::WaitingForStart if line == self.v_start() => {
                if line == self.v_stop() {
                    SpriteDmaState::FetchStart
                } else {
                    SpriteDmaState::FetchData1
                }
            }
            other => other,
        };
    }

    /// True if the sprite's first (`second == false`) or second slot would
    /// carry a fetch.
    #[must_use]
    pub fn wants_slot(&self, second: bool) -> bool {
        if second {
            matches!(
                self.state,
                SpriteDmaState::FetchStopAndControl | SpriteDmaState::FetchData0
            )
        } else {
            matches!(
                self.state,
                SpriteDmaState::FetchStart | SpriteDmaState::FetchData1
            )
        }
    }

    /// Fetch one word. The caller routes it to the returned register, which
    /// for CTL also moves this state machine on via `write_ctl`.
    pub fn fetch(&mut self, read_word: impl FnOnce(u32) -> u16) -> Option<(SpriteRegister, u16)> {
        let (register, next) = match self.state {
            SpriteDmaState::FetchStart => (SpriteRegister::Pos, SpriteDmaState::FetchStopAndControl),
            SpriteDmaState::FetchStopAndControl => {
                (SpriteRegister::Ctl, SpriteDmaState::WaitingForStart)
            }
            SpriteDmaState::FetchData1 => (SpriteRegister::Data, SpriteDmaState::FetchData0),
            SpriteDmaState::FetchData0 => (SpriteRegister::Datb, SpriteDmaState::FetchData1),
            SpriteDmaState::Stopped | SpriteDmaState::WaitingForStart => return None,
        };
        let word = read_word(self.pointer);
        self.pointer = self.pointer.wrapping_add(2) & 0x001F_FFFE;
        self.state = next;
        Some((register, word))
    }
}
