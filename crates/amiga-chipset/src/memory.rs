//! The memory map behind the custom chips.

use emu_core::ChipBus;

/// Everything on the bus that is not a custom register.
///
/// Chip RAM is reached through [`ChipBus`] by DMA; the CPU-side accessors
/// see the whole 24-bit space, so an implementation may map ROM, CIAs or
/// expansion memory behind them.
pub trait MemoryMap: ChipBus {
    fn read_word(&self, address: u32) -> u16;
    fn write_word(&mut self, address: u32, value: u16);
    fn read_byte(&self, address: u32) -> u8;
    fn write_byte(&mut self, address: u32, value: u8);
}

pub const CHIP_RAM_BASE: u32 = 0x00_0000;
pub const CUSTOM_REGS_BASE: u32 = 0xDF_F000;

/// Plain chip RAM from address 0, mirrored across the first 2MB.
///
/// Above that the bus is open and reads return all ones.
#[derive(Clone)]
pub struct ChipRam {
    pub ram: Vec<u8>,
    pub mask: u32,
}

/// Agnus can address at most 2MB.
const CHIP_SPACE_END: u32 = 0x20_0000;

impl ChipRam {
    /// `size` is rounded up to a power of two and kept between one word
    /// and 2MB.
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.clamp(2, CHIP_SPACE_END as usize).next_power_of_two();
        Self {
            ram: vec![0; size],
            mask: (size as u32).wrapping_sub(1),
        }
    }

    /// Copy `data` into RAM at `address`, wrapping at the top.
    pub fn load(&mut self, address: u32, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            let addr = (address.wrapping_add(i as u32) & self.mask) as usize;
            self.ram[addr] = byte;
        }
    }

    /// Store a list of words, big-endian, starting at `address`.
    pub fn load_words(&mut self, address: u32, words: &[u16]) {
        for (i, &word) in words.iter().enumerate() {
            self.write_chip_word(address.wrapping_add(2 * i as u32), word);
        }
    }

    fn in_chip_space(address: u32) -> bool {
        address & 0x00FF_FFFF < CHIP_SPACE_END
    }
}

impl ChipBus for ChipRam {
    fn read_chip_word(&self, address: u32) -> u16 {
        let addr = (address & self.mask & !1) as usize;
        u16::from_be_bytes([self.ram[addr], self.ram[addr + 1]])
    }

    fn write_chip_word(&mut self, address: u32, value: u16) {
        let addr = (address & self.mask & !1) as usize;
        let [hi, lo] = value.to_be_bytes();
        self.ram[addr] = hi;
        self.ram[addr + 1] = lo;
    }
}

impl MemoryMap for ChipRam {
    fn read_word(&self, address: u32) -> u16 {
        if Self::in_chip_space(address) {
            self.read_chip_word(address)
        } else {
            0xFFFF
        }
    }

    fn write_word(&mut self, address: u32, value: u16) {
        if Self::in_chip_space(address) {
            self.write_chip_word(address, value);
        }
    }

    fn read_byte(&self, address: u32) -> u8 {
        if Self::in_chip_space(address) {
            self.ram[(address & self.mask) as usize]
        } else {
            0xFF
        }
    }

    fn write_byte(&mut self, address: u32, value: u8) {
        if Self::in_chip_space(address) {
            self.ram[(address & self.mask) as usize] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_big_endian() {
        let mut ram = ChipRam::new(0x1000);
        ram.write_word(0x100, 0x1234);
        assert_eq!(ram.read_byte(0x100), 0x12);
        assert_eq!(ram.read_byte(0x101), 0x34);
        assert_eq!(ram.read_chip_word(0x101), 0x1234, "bit 0 ignored");
    }

    #[test]
    fn dma_addresses_wrap_at_ram_size() {
        let mut ram = ChipRam::new(0x1000);
        ram.write_chip_word(0x1_0010, 0xBEEF);
        assert_eq!(ram.read_chip_word(0x0010), 0xBEEF);
    }

    #[test]
    fn odd_sizes_round_up_to_a_power_of_two() {
        for (asked, got) in [(0, 2), (1, 2), (3, 4), (0x6_0000, 0x8_0000), (0x100_0000, 0x20_0000)] {
            let mut ram = ChipRam::new(asked);
            assert_eq!(ram.ram.len(), got, "size {asked:#X}");
            ram.write_chip_word(0x1234, 0xABCD);
            assert_eq!(ram.read_chip_word(0x1234), 0xABCD);
        }
    }

    #[test]
    fn above_chip_space_is_open_bus() {
        let mut ram = ChipRam::new(0x1000);
        ram.write_word(0x20_0000, 0x1234);
        assert_eq!(ram.read_word(0x20_0000), 0xFFFF);
        assert_eq!(ram.read_word(0), 0);
    }
}
