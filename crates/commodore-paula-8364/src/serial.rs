//! UART: SERPER, SERDAT, SERDATR.

/// Bytes kept for the host between drains. Later bytes are dropped.
pub const TRANSMIT_CAPACITY: usize = 4096;

/// Serial port with a one-word transmit buffer feeding the shift register.
#[derive(Debug, Clone, Default)]
pub struct SerialPort {
    /// SERPER as written.
    pub serper: u16,
    buffer: Option<u16>,
    shifting: bool,
    countdown: u32,
    current: u16,
    transmitted: Vec<u8>,
    received: u16,
    overrun: bool,
}

impl SerialPort {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bit_time(&self) -> u32 {
        u32::from(self.serper & 0x7FFF) + 1
    }

    /// SERDAT write. Returns true if the buffer emptied at once (TBE).
    pub fn write_serdat(&mut self, value: u16) -> bool {
        self.buffer = Some(value);
        self.load_shifter()
    }

    fn load_shifter(&mut self) -> bool {
        if self.shifting {
            return false;
        }
        let Some(word) = self.buffer.take() else {
            return false;
        };
        // Start bit, then everything up to the highest set (stop) bit.
        let bits = 1 + (16 - word.leading_zeros()).max(1);
        self.current = word;
        self.countdown = bits * self.bit_time();
        self.shifting = true;
        true
    }

    /// Step one colour clock. Returns true when a buffered word moves into
    /// the shift register (TBE).
    pub fn tick(&mut self) -> bool {
        if !self.shifting {
            return false;
        }
        self.countdown -= 1;
        if self.countdown > 0 {
            return false;
        }
        self.shifting = false;
        let data_mask = if self.serper & 0x8000 != 0 { 0x1FF } else { 0xFF };
        if self.transmitted.len() < TRANSMIT_CAPACITY {
            self.transmitted.push((self.current & data_mask) as u8);
        }
        self.load_shifter()
    }

    /// A byte arrived from the far end. Returns true to request RBF.
    pub fn receive(&mut self, byte: u8, buffer_full: bool) -> bool {
        self.overrun = buffer_full;
        // Stop bit set in bit 8.
        self.received = 0x0100 | u16::from(byte);
        true
    }

    /// SERDATR; `rbf` mirrors the RBF interrupt request.
    #[must_use]
    pub fn read_serdatr(&self, rbf: bool) -> u16 {
        let mut value = self.received & 0x03FF;
        if self.overrun {
            value |= 0x8000;
        }
        if rbf {
            value |= 0x4000;
        }
        if self.buffer.is_none() {
            value |= 0x2000;
        }
        if !self.shifting {
            value |= 0x1000;
        }
        value
    }

    /// Drain bytes that have finished shifting out. Hosts should drain at
    /// least once per frame; at most `TRANSMIT_CAPACITY` bytes are held.
    pub fn take_transmitted(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.transmitted)
    }
}
