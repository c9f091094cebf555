//! Collaborators outside the chipset.

/// The drive side of disk DMA: bitstream encoding, mechanics and media.
///
/// The chipset only moves decoded words. Words read from the disk surface
/// arrive through [`crate::Chipset::enqueue_disk_word`]; words written by
/// DMA are handed over here.
pub trait DiskController {
    /// Insert a disk image into `drive`.
    fn insert(&mut self, drive: usize, image: Vec<u8>);

    /// A word fetched from chip RAM by a disk write.
    fn write_word(&mut self, word: u16);
}
