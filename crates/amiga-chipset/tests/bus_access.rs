use amiga_chipset::custom_regs::{INTENA, VPOSR, VPOSW};
use amiga_chipset::{
    BusAccess, ChipRam, Chipset, ChipsetConfig, Observable, Operation, Origin, RasterPosition,
    Ticks, Value, Width,
};

const CUSTOM: u32 = 0xDF_F000;

fn make_chipset() -> Chipset<ChipRam> {
    Chipset::new(ChipRam::new(512 * 1024), ChipsetConfig::pal()).expect("valid config")
}

#[test]
fn byte_write_fills_both_halves() {
    let mut chipset = make_chipset();
    assert_eq!(chipset.perform(BusAccess::write_byte(CUSTOM + 0x181, 0x0A)), None);
    assert_eq!(chipset.query("palette.0"), Some(Value::U16(0x0A0A)));
    chipset.perform(BusAccess::write_byte(CUSTOM + 0x182, 0x05));
    assert_eq!(chipset.query("palette.1"), Some(Value::U16(0x0505)));
}

#[test]
fn byte_read_returns_the_addressed_half() {
    let mut chipset = make_chipset();
    chipset.write_register(INTENA, 0xC020);
    assert_eq!(chipset.perform(BusAccess::read_word(CUSTOM + 0x01C)), Some(0x4020));
    assert_eq!(chipset.perform(BusAccess::read_byte(CUSTOM + 0x01C)), Some(0x40));
    assert_eq!(chipset.perform(BusAccess::read_byte(CUSTOM + 0x01D)), Some(0x20));
}

#[test]
fn other_addresses_go_to_memory() {
    let mut chipset = make_chipset();
    chipset.perform(BusAccess::write_word(0x100, 0x1234));
    assert_eq!(chipset.perform(BusAccess::read_byte(0x101)), Some(0x34));
    let dma_read = BusAccess {
        address: 0x100,
        operation: Operation::Read,
        width: Width::Word,
        origin: Origin::Dma,
    };
    assert_eq!(chipset.perform(dma_read), Some(0x1234));
    assert_eq!(chipset.perform(BusAccess::read_word(0xC0_0000)), Some(0xFFFF));
}

#[test]
fn beam_position_reads_through_the_bus() {
    let mut chipset = make_chipset();
    chipset.run_for(Ticks::from_slots(300 * 227 + 5));
    assert_eq!(chipset.position(), RasterPosition::new(300, 5));
    let vposr = chipset.perform(BusAccess::read_word(CUSTOM + 0x004));
    assert_eq!(vposr, Some(0x0001), "PAL Agnus ID and V8");
    let vhposr = chipset.perform(BusAccess::read_word(CUSTOM + 0x006));
    assert_eq!(vhposr, Some(0x2C05));
}

#[test]
fn vposw_lof_approximation_lengthens_current_field() {
    let mut chipset = make_chipset();
    chipset.write_register(VPOSW, 0x8000);
    assert_eq!(chipset.read_register(VPOSR) & 0x8000, 0x8000);

    chipset.run_for(Ticks::from_slots(312 * 227));
    assert_eq!(chipset.position(), RasterPosition::new(312, 0));
    chipset.run_for(Ticks::from_slots(227));
    assert_eq!(chipset.position(), RasterPosition::new(0, 0));
    assert_eq!(chipset.frame_count(), 1);
}
