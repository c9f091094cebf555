use amiga_chipset::custom_regs::{DMACON, SPR0PTH};
use amiga_chipset::{ChipRam, Chipset, ChipsetConfig, Observable, RasterPosition, Ticks, Value};

const SPRITE_DATA: u32 = 0x4000;
const V_START: u16 = 50;
const V_STOP: u16 = 60;

fn make_chipset() -> Chipset<ChipRam> {
    Chipset::new(ChipRam::new(512 * 1024), ChipsetConfig::pal()).expect("valid config")
}

/// Control words, one data pair per line, then the terminating zero pair.
fn sprite_list() -> Vec<u16> {
    let mut words = vec![(V_START << 8) | 0x40, V_STOP << 8];
    for line in V_START..V_STOP {
        words.push(0xF000 | line);
        words.push(0x0F00 | line);
    }
    words.extend([0, 0]);
    words
}

fn run_line(chipset: &mut Chipset<ChipRam>) {
    let line = chipset.position().line;
    while chipset.position().line == line {
        chipset.run_for(Ticks::new(2));
    }
}

#[test]
fn sprite_fetches_two_words_per_line_inside_its_range() {
    let mut chipset = make_chipset();
    chipset.memory.load_words(SPRITE_DATA, &sprite_list());
    chipset.write_register(SPR0PTH, (SPRITE_DATA >> 16) as u16);
    chipset.write_register(SPR0PTH + 2, SPRITE_DATA as u16);
    chipset.write_register(DMACON, 0x8220);

    let mut fetched = Vec::new();
    while chipset.position().line < 70 {
        let before = chipset.agnus.sprites[0].pointer;
        let line = chipset.position().line;
        run_line(&mut chipset);
        fetched.push((line, (chipset.agnus.sprites[0].pointer - before) / 2));
        if line == V_START {
            assert_eq!(chipset.denise.spr_data[0], 0xF000 | V_START);
            assert_eq!(chipset.denise.spr_datb[0], 0x0F00 | V_START);
            assert!(chipset.denise.sprite_armed(0));
        }
    }

    for (line, words) in fetched {
        let expected = match line {
            29 => 2,
            V_START..V_STOP => 2,
            V_STOP => 2,
            _ => 0,
        };
        assert_eq!(words, expected, "line {line}");
    }
    assert_eq!(chipset.position(), RasterPosition::new(70, 0));
    assert_eq!(chipset.query("sprite.0.state"), Some(Value::from("stopped")));
}

#[test]
fn sprite_dma_off_fetches_nothing() {
    let mut chipset = make_chipset();
    chipset.memory.load_words(SPRITE_DATA, &sprite_list());
    chipset.write_register(SPR0PTH + 2, SPRITE_DATA as u16);
    chipset.write_register(DMACON, 0x8200);
    chipset.run_for(Ticks::from_slots(70 * 227));
    assert_eq!(chipset.agnus.sprites[0].pointer, SPRITE_DATA);
}
