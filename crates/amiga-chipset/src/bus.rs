//! Bus access decode for the CPU side.

use crate::memory::CUSTOM_REGS_BASE;
use crate::{Chipset, MemoryMap};

/// Custom registers occupy 512 bytes from $DFF000.
const CUSTOM_REGS_SIZE: u32 = 0x200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Word,
    /// The byte at `address`; even addresses are the high half.
    Byte,
}

/// Who drove the access. Carried through for memory maps and traces that
/// care; register decode treats both alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cpu,
    Dma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusAccess {
    pub address: u32,
    pub operation: Operation,
    pub width: Width,
    pub origin: Origin,
}

impl BusAccess {
    #[must_use]
    pub fn read_word(address: u32) -> Self {
        Self {
            address,
            operation: Operation::Read,
            width: Width::Word,
            origin: Origin::Cpu,
        }
    }

    #[must_use]
    pub fn write_word(address: u32, value: u16) -> Self {
        Self {
            address,
            operation: Operation::Write(value),
            width: Width::Word,
            origin: Origin::Cpu,
        }
    }

    #[must_use]
    pub fn read_byte(address: u32) -> Self {
        Self {
            width: Width::Byte,
            ..Self::read_word(address)
        }
    }

    #[must_use]
    pub fn write_byte(address: u32, value: u8) -> Self {
        Self {
            width: Width::Byte,
            ..Self::write_word(address, u16::from(value))
        }
    }
}

fn custom_offset(address: u32) -> Option<u16> {
    let address = address & 0x00FF_FFFF;
    if (CUSTOM_REGS_BASE..CUSTOM_REGS_BASE + CUSTOM_REGS_SIZE).contains(&address) {
        Some((address - CUSTOM_REGS_BASE) as u16)
    } else {
        None
    }
}

impl<M: MemoryMap> Chipset<M> {
    /// Perform one bus access. Reads return the value; writes return `None`.
    ///
    /// Byte writes to a custom register put the byte in both halves of the
    /// word, as the 68000 drives both byte lanes.
    pub fn perform(&mut self, access: BusAccess) -> Option<u16> {
        log::trace!("{access:?}");
        let Some(offset) = custom_offset(access.address) else {
            return self.perform_memory(access);
        };
        let offset = offset & 0x01FE;
        match (access.operation, access.width) {
            (Operation::Read, Width::Word) => Some(self.read_register(offset)),
            (Operation::Read, Width::Byte) => {
                let [high, low] = self.read_register(offset).to_be_bytes();
                let byte = if access.address & 1 == 0 { high } else { low };
                Some(u16::from(byte))
            }
            (Operation::Write(value), Width::Word) => {
                self.write_register(offset, value);
                None
            }
            (Operation::Write(value), Width::Byte) => {
                let byte = value as u8;
                self.write_register(offset, u16::from_be_bytes([byte, byte]));
                None
            }
        }
    }

    fn perform_memory(&mut self, access: BusAccess) -> Option<u16> {
        match (access.operation, access.width) {
            (Operation::Read, Width::Word) => Some(self.memory.read_word(access.address)),
            (Operation::Read, Width::Byte) => {
                Some(u16::from(self.memory.read_byte(access.address)))
            }
            (Operation::Write(value), Width::Word) => {
                self.memory.write_word(access.address, value);
                None
            }
            (Operation::Write(value), Width::Byte) => {
                self.memory.write_byte(access.address, value as u8);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_custom_window() {
        assert_eq!(custom_offset(0xDF_F180), Some(0x180));
        assert_eq!(custom_offset(0xFFDF_F09A), Some(0x09A));
        assert_eq!(custom_offset(0xDF_F200), None);
        assert_eq!(custom_offset(0x00_1000), None);
    }

    #[test]
    fn byte_helpers_keep_address() {
        let access = BusAccess::write_byte(0xDF_F181, 0x0F);
        assert_eq!(access.width, Width::Byte);
        assert_eq!(access.operation, Operation::Write(0x000F));
        assert_eq!(access.address, 0xDF_F181);
    }
}
