//! Word-wide DMA view of chip memory.

/// Chip RAM as seen by DMA.
///
/// DMA channels only ever move aligned 16-bit words. Implementations mask
/// the address to the fitted RAM size, so wild pointers wrap rather than
/// fault, as they do on the real bus.
pub trait ChipBus {
    /// Read the word at `address` (bit 0 ignored).
    fn read_chip_word(&self, address: u32) -> u16;

    /// Write the word at `address` (bit 0 ignored).
    fn write_chip_word(&mut self, address: u32, value: u16);
}
