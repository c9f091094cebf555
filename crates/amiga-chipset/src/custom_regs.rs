//! Custom register map.
//!
//! Offsets are from $DFF000. Every write, whether from the CPU, the Copper
//! or a DMA channel, lands in `write_register`, which routes it to the chip
//! or chips that latch it.

use commodore_agnus_ocs::BlitterChannel;

use crate::{Chipset, MemoryMap};

// Read registers:
pub const BLTDDAT: u16 = 0x000;
pub const DMACONR: u16 = 0x002;
pub const VPOSR: u16 = 0x004;
pub const VHPOSR: u16 = 0x006;
pub const DSKDATR: u16 = 0x008;
pub const JOY0DAT: u16 = 0x00A;
pub const JOY1DAT: u16 = 0x00C;
pub const CLXDAT: u16 = 0x00E;
pub const ADKCONR: u16 = 0x010;
pub const POT0DAT: u16 = 0x012;
pub const POT1DAT: u16 = 0x014;
pub const POTGOR: u16 = 0x016;
pub const SERDATR: u16 = 0x018;
pub const DSKBYTR: u16 = 0x01A;
pub const INTENAR: u16 = 0x01C;
pub const INTREQR: u16 = 0x01E;

// Write registers:
pub const DSKPTH: u16 = 0x020;
pub const DSKPTL: u16 = 0x022;
pub const DSKLEN: u16 = 0x024;
pub const VPOSW: u16 = 0x02A;
pub const VHPOSW: u16 = 0x02C;
pub const COPCON: u16 = 0x02E;
pub const SERDAT: u16 = 0x030;
pub const SERPER: u16 = 0x032;
pub const BLTCON0: u16 = 0x040;
pub const BLTCON1: u16 = 0x042;
pub const BLTAFWM: u16 = 0x044;
pub const BLTALWM: u16 = 0x046;
pub const BLTCPTH: u16 = 0x048;
pub const BLTCPTL: u16 = 0x04A;
pub const BLTBPTH: u16 = 0x04C;
pub const BLTBPTL: u16 = 0x04E;
pub const BLTAPTH: u16 = 0x050;
pub const BLTAPTL: u16 = 0x052;
pub const BLTDPTH: u16 = 0x054;
pub const BLTDPTL: u16 = 0x056;
pub const BLTSIZE: u16 = 0x058;
pub const BLTCMOD: u16 = 0x060;
pub const BLTBMOD: u16 = 0x062;
pub const BLTAMOD: u16 = 0x064;
pub const BLTDMOD: u16 = 0x066;
pub const BLTCDAT: u16 = 0x070;
pub const BLTBDAT: u16 = 0x072;
pub const BLTADAT: u16 = 0x074;
pub const DSKSYNC: u16 = 0x07E;
pub const COP1LCH: u16 = 0x080;
pub const COP1LCL: u16 = 0x082;
pub const COP2LCH: u16 = 0x084;
pub const COP2LCL: u16 = 0x086;
pub const COPJMP1: u16 = 0x088;
pub const COPJMP2: u16 = 0x08A;
pub const DIWSTRT: u16 = 0x08E;
pub const DIWSTOP: u16 = 0x090;
pub const DDFSTRT: u16 = 0x092;
pub const DDFSTOP: u16 = 0x094;
pub const DMACON: u16 = 0x096;
pub const CLXCON: u16 = 0x098;
pub const INTENA: u16 = 0x09A;
pub const INTREQ: u16 = 0x09C;
pub const ADKCON: u16 = 0x09E;
pub const AUD0LCH: u16 = 0x0A0;
pub const AUD3DAT: u16 = 0x0DA;
pub const BPL1PTH: u16 = 0x0E0;
pub const BPL1PTL: u16 = 0x0E2;
pub const BPL6PTL: u16 = 0x0F6;
pub const BPLCON0: u16 = 0x100;
pub const BPLCON1: u16 = 0x102;
pub const BPLCON2: u16 = 0x104;
pub const BPL1MOD: u16 = 0x108;
pub const BPL2MOD: u16 = 0x10A;
pub const BPL1DAT: u16 = 0x110;
pub const BPL6DAT: u16 = 0x11A;
pub const SPR0PTH: u16 = 0x120;
pub const SPR7PTL: u16 = 0x13E;
pub const SPR0POS: u16 = 0x140;
pub const SPR7DATB: u16 = 0x17E;
pub const COLOR00: u16 = 0x180;
pub const COLOR31: u16 = 0x1BE;

/// Pins POTGOR reads back with nothing attached.
const POTGOR_IDLE: u16 = 0xFF00;

const POINTER_MASK: u32 = 0x001F_FFFE;

fn set_high(pointer: u32, value: u16) -> u32 {
    ((pointer & 0x0000_FFFF) | (u32::from(value) << 16)) & POINTER_MASK
}

fn set_low(pointer: u32, value: u16) -> u32 {
    ((pointer & 0xFFFF_0000) | u32::from(value)) & POINTER_MASK
}

fn blitter_pointer(offset: u16) -> BlitterChannel {
    match (offset - BLTCPTH) / 4 {
        0 => BlitterChannel::C,
        1 => BlitterChannel::B,
        2 => BlitterChannel::A,
        _ => BlitterChannel::D,
    }
}

fn blitter_modulo(offset: u16) -> BlitterChannel {
    match (offset - BLTCMOD) / 2 {
        0 => BlitterChannel::C,
        1 => BlitterChannel::B,
        2 => BlitterChannel::A,
        _ => BlitterChannel::D,
    }
}

impl<M: MemoryMap> Chipset<M> {
    /// Write a custom register. `offset` is masked to the register range.
    pub fn write_register(&mut self, offset: u16, value: u16) {
        let offset = offset & 0x01FE;
        match offset {
            DSKPTH => self.agnus.write_disk_pointer_high(value),
            DSKPTL => self.agnus.write_disk_pointer_low(value),
            DSKLEN => self.paula.write_dsklen(value),
            VPOSW => self.agnus.beam.write_vposw(value),
            VHPOSW => self.agnus.beam.write_vhposw(value),
            COPCON => self.agnus.copper.write_copcon(value),
            SERDAT => self.paula.write_serdat(value),
            SERPER => self.paula.serial.serper = value,

            BLTCON0 => self.agnus.blitter.bltcon0 = value,
            BLTCON1 => self.agnus.blitter.bltcon1 = value,
            BLTAFWM => self.agnus.blitter.first_word_mask = value,
            BLTALWM => self.agnus.blitter.last_word_mask = value,
            BLTCPTH..=BLTDPTL => {
                let channel = blitter_pointer(offset);
                if offset & 2 == 0 {
                    self.agnus.blitter.write_pointer_high(channel, value);
                } else {
                    self.agnus.blitter.write_pointer_low(channel, value);
                }
            }
            BLTSIZE => self.agnus.blitter.write_size(value),
            BLTCMOD..=BLTDMOD => self
                .agnus
                .blitter
                .write_modulo(blitter_modulo(offset), value),
            BLTCDAT => self.agnus.blitter.data[2] = value,
            BLTBDAT => self.agnus.blitter.data[1] = value,
            BLTADAT => self.agnus.blitter.data[0] = value,

            DSKSYNC => self.paula.disk.sync_word = value,
            COP1LCH => self.agnus.copper.cop1lc = set_high(self.agnus.copper.cop1lc, value),
            COP1LCL => self.agnus.copper.cop1lc = set_low(self.agnus.copper.cop1lc, value),
            COP2LCH => self.agnus.copper.cop2lc = set_high(self.agnus.copper.cop2lc, value),
            COP2LCL => self.agnus.copper.cop2lc = set_low(self.agnus.copper.cop2lc, value),
            COPJMP1 => self.agnus.copper.strobe_cop1(),
            COPJMP2 => self.agnus.copper.strobe_cop2(),

            DIWSTRT => {
                self.agnus.diwstrt = value;
                self.denise.diwstrt = value;
            }
            DIWSTOP => {
                self.agnus.diwstop = value;
                self.denise.diwstop = value;
            }
            DDFSTRT => self.agnus.bitplanes.ddfstrt = value & 0x00FC,
            DDFSTOP => self.agnus.bitplanes.ddfstop = value & 0x00FC,
            DMACON => {
                self.agnus.write_dmacon(value);
                self.paula.sync_audio_dma(self.agnus.dmacon);
            }
            CLXCON => self.denise.clxcon = value,
            INTENA => self.paula.interrupts.write_intena(value),
            INTREQ => self.paula.interrupts.write_intreq(value),
            ADKCON => self.paula.write_adkcon(value),
            AUD0LCH..=AUD3DAT => {
                self.paula.write_audio_register(offset, value);
            }

            BPL1PTH..=BPL6PTL => {
                let plane = usize::from((offset - BPL1PTH) / 4);
                if offset & 2 == 0 {
                    self.agnus.bitplanes.write_pointer_high(plane, value);
                } else {
                    self.agnus.bitplanes.write_pointer_low(plane, value);
                }
            }
            BPLCON0 => {
                self.agnus.write_bplcon0(value);
                self.denise.bplcon0 = value;
            }
            BPLCON1 => self.denise.bplcon1 = value,
            BPLCON2 => self.denise.bplcon2 = value,
            BPL1MOD => self.agnus.bitplanes.bpl1mod = (value & 0xFFFE) as i16,
            BPL2MOD => self.agnus.bitplanes.bpl2mod = (value & 0xFFFE) as i16,
            BPL1DAT..=BPL6DAT => {
                self.denise
                    .write_bitplane_data(usize::from((offset - BPL1DAT) / 2), value);
            }

            SPR0PTH..=SPR7PTL => {
                let sprite = &mut self.agnus.sprites[usize::from((offset - SPR0PTH) / 4)];
                sprite.pointer = if offset & 2 == 0 {
                    set_high(sprite.pointer, value)
                } else {
                    set_low(sprite.pointer, value)
                };
            }
            SPR0POS..=SPR7DATB => {
                let n = usize::from((offset - SPR0POS) / 8);
                match (offset - SPR0POS) % 8 {
                    0 => {
                        self.agnus.sprites[n].write_pos(value);
                        self.denise.write_sprite_pos(n, value);
                    }
                    2 => {
                        self.agnus.sprites[n].write_ctl(value);
                        self.denise.write_sprite_ctl(n, value);
                    }
                    4 => self.denise.write_sprite_data(n, value),
                    _ => self.denise.write_sprite_datb(n, value),
                }
            }
            COLOR00..=COLOR31 => self
                .denise
                .set_palette(usize::from((offset - COLOR00) / 2), value),

            _ => log::trace!("write to unhandled register {offset:#05X} = {value:#06X}"),
        }
    }

    /// Read a custom register. Write-only registers read as 0.
    ///
    /// Takes `&mut self` because CLXDAT and DSKBYTR clear on read.
    pub fn read_register(&mut self, offset: u16) -> u16 {
        match offset & 0x01FE {
            DMACONR => self.agnus.read_dmaconr(),
            VPOSR => self.agnus.beam.read_vposr(),
            VHPOSR => self.agnus.beam.read_vhposr(),
            DSKDATR => self.paula.disk.read_dskdatr(),
            CLXDAT => self.denise.read_clxdat(),
            ADKCONR => self.paula.adkcon,
            POTGOR => POTGOR_IDLE,
            SERDATR => self.paula.read_serdatr(),
            DSKBYTR => self.paula.disk.read_dskbytr(),
            INTENAR => self.paula.interrupts.enable(),
            INTREQR => self.paula.interrupts.request(),
            // No controllers or paddles are attached.
            JOY0DAT | JOY1DAT | POT0DAT | POT1DAT => 0,
            // D goes straight to chip RAM and is never latched.
            BLTDDAT => 0,
            other => {
                log::trace!("read of write-only register {other:#05X}");
                0
            }
        }
    }
}
