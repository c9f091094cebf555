use amiga_chipset::custom_regs::{
    BLTAFWM, BLTALWM, BLTAPTH, BLTAPTL, BLTCON0, BLTCON1, BLTDPTH, BLTDPTL, BLTSIZE, DMACON,
    DMACONR, INTENA, INTREQR,
};
use amiga_chipset::{ChipBus, ChipRam, Chipset, ChipsetConfig, Observable, Ticks, Value};

const SOURCE: u32 = 0x2000;
const DEST: u32 = 0x3000;
const INTREQ_BLIT: u16 = 0x0040;

fn make_chipset() -> Chipset<ChipRam> {
    let mut chipset =
        Chipset::new(ChipRam::new(512 * 1024), ChipsetConfig::pal()).expect("valid config");
    // Clear of the refresh and fixed DMA slots.
    chipset.run_for(Ticks::from_slots(0x30));
    chipset
}

fn write_ptr(chipset: &mut Chipset<ChipRam>, reg_hi: u16, reg_lo: u16, addr: u32) {
    chipset.write_register(reg_hi, (addr >> 16) as u16);
    chipset.write_register(reg_lo, (addr & 0xFFFF) as u16);
}

/// Copy with D = A (minterm 0xF0) and wait for completion.
fn blit_a_to_d(chipset: &mut Chipset<ChipRam>, bltcon1: u16, a: u32, d: u32, size: u16) {
    chipset.write_register(DMACON, 0x8240);
    chipset.write_register(BLTCON0, 0x09F0);
    chipset.write_register(BLTCON1, bltcon1);
    chipset.write_register(BLTAFWM, 0xFFFF);
    chipset.write_register(BLTALWM, 0xFFFF);
    write_ptr(chipset, BLTAPTH, BLTAPTL, a);
    write_ptr(chipset, BLTDPTH, BLTDPTL, d);
    chipset.write_register(BLTSIZE, size);
    for _ in 0..1000 {
        if !chipset.agnus.blitter.is_busy() {
            return;
        }
        chipset.run_for(Ticks::new(2));
    }
    panic!("blit did not finish");
}

#[test]
fn one_word_copy_through_the_bus() {
    let mut chipset = make_chipset();
    chipset.write_register(INTENA, 0xC040);
    chipset.memory.write_chip_word(SOURCE, 0xA5A5);

    blit_a_to_d(&mut chipset, 0, SOURCE, DEST, (1 << 6) | 1);

    assert_eq!(chipset.memory.read_chip_word(DEST), 0xA5A5);
    assert_eq!(chipset.query("blitter.zero"), Some(Value::Bool(false)));
    assert_eq!(chipset.read_register(DMACONR) & 0x6000, 0);
    assert_ne!(chipset.read_register(INTREQR) & INTREQ_BLIT, 0);
    assert_eq!(chipset.get_interrupt_level(), 3);
}

#[test]
fn zero_source_reports_zero() {
    let mut chipset = make_chipset();
    chipset.memory.write_chip_word(DEST, 0xFFFF);

    blit_a_to_d(&mut chipset, 0, SOURCE, DEST, (1 << 6) | 1);

    assert_eq!(chipset.memory.read_chip_word(DEST), 0);
    assert!(chipset.agnus.blitter.zero());
    assert_eq!(chipset.read_register(DMACONR) & 0x2000, 0x2000);
}

#[test]
fn descending_copy_matches_ascending() {
    let mut chipset = make_chipset();
    let words = [0x1111, 0x2222, 0x3333, 0x4444];
    chipset.memory.load_words(SOURCE, &words);

    // DESC: pointers start at the last word.
    blit_a_to_d(&mut chipset, 0x0002, SOURCE + 6, DEST + 6, (1 << 6) | 4);

    for (i, &word) in words.iter().enumerate() {
        assert_eq!(chipset.memory.read_chip_word(DEST + 2 * i as u32), word);
    }
}

#[test]
fn blitter_stalls_without_dma_enable() {
    let mut chipset = make_chipset();
    chipset.write_register(DMACON, 0x0200);
    chipset.write_register(BLTCON0, 0x09F0);
    chipset.write_register(BLTSIZE, (1 << 6) | 1);
    chipset.run_for(Ticks::from_slots(100));
    assert!(chipset.agnus.blitter.is_busy());
    assert_eq!(chipset.query("blitter.busy"), Some(Value::Bool(true)));

    chipset.write_register(DMACON, 0x8240);
    chipset.run_for(Ticks::from_slots(2));
    assert!(!chipset.agnus.blitter.is_busy());
}
