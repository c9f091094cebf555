use std::sync::{Arc, Mutex};

use amiga_chipset::custom_regs::{ADKCON, DMACON, DSKLEN, DSKPTH, DSKPTL, INTREQ, INTREQR};
use amiga_chipset::{ChipBus, ChipRam, Chipset, ChipsetConfig, DiskController, Ticks};

const BUFFER: u32 = 0x5000;
const INTREQ_DSKBLK: u16 = 0x0002;
const INTREQ_DSKSYN: u16 = 0x1000;

#[derive(Default)]
struct Drive {
    inserted: Vec<(usize, usize)>,
    written: Vec<u16>,
}

struct SharedDrive(Arc<Mutex<Drive>>);

impl DiskController for SharedDrive {
    fn insert(&mut self, drive: usize, image: Vec<u8>) {
        self.0.lock().expect("drive lock").inserted.push((drive, image.len()));
    }

    fn write_word(&mut self, word: u16) {
        self.0.lock().expect("drive lock").written.push(word);
    }
}

fn make_chipset() -> Chipset<ChipRam> {
    let mut chipset =
        Chipset::new(ChipRam::new(512 * 1024), ChipsetConfig::pal()).expect("valid config");
    chipset.write_register(DSKPTH, 0);
    chipset.write_register(DSKPTL, BUFFER as u16);
    chipset.write_register(DMACON, 0x8210);
    chipset
}

fn run_line(chipset: &mut Chipset<ChipRam>) {
    chipset.run_for(Ticks::from_slots(227));
}

#[test]
fn dsklen_needs_two_writes() {
    let mut chipset = make_chipset();
    chipset.write_register(DSKLEN, 0x8002);
    chipset.enqueue_disk_word(0xDEAD, false);
    run_line(&mut chipset);
    assert_eq!(chipset.memory.read_chip_word(BUFFER), 0);

    chipset.write_register(DSKLEN, 0x8002);
    chipset.enqueue_disk_word(0x1111, false);
    chipset.enqueue_disk_word(0x2222, false);
    run_line(&mut chipset);

    assert_eq!(chipset.memory.read_chip_word(BUFFER), 0x1111);
    assert_eq!(chipset.memory.read_chip_word(BUFFER + 2), 0x2222);
    assert_eq!(chipset.agnus.disk_pointer, BUFFER + 4);
    assert_ne!(chipset.read_register(INTREQR) & INTREQ_DSKBLK, 0);
}

#[test]
fn wordsync_holds_reads_until_the_sync_mark() {
    let mut chipset = make_chipset();
    chipset.write_register(ADKCON, 0x8400);
    chipset.write_register(DSKLEN, 0x8001);
    chipset.write_register(DSKLEN, 0x8001);

    chipset.enqueue_disk_word(0xAAAA, false);
    run_line(&mut chipset);
    assert_eq!(chipset.agnus.disk_pointer, BUFFER);

    chipset.enqueue_disk_word(0x4489, true);
    assert_ne!(chipset.read_register(INTREQR) & INTREQ_DSKSYN, 0);
    chipset.enqueue_disk_word(0xBEEF, false);
    run_line(&mut chipset);

    assert_eq!(chipset.memory.read_chip_word(BUFFER), 0xBEEF);
    assert_ne!(chipset.read_register(INTREQR) & INTREQ_DSKBLK, 0);
}

#[test]
fn write_mode_feeds_the_controller() {
    let drive = Arc::new(Mutex::new(Drive::default()));
    let mut chipset = make_chipset();
    chipset.set_disk_controller(Box::new(SharedDrive(Arc::clone(&drive))));
    chipset.insert(0, vec![0; 901_120]);
    chipset.memory.load_words(BUFFER, &[0xCAFE, 0xF00D, 0x1234]);

    chipset.write_register(DSKLEN, 0xC002);
    chipset.write_register(DSKLEN, 0xC002);
    chipset.write_register(INTREQ, INTREQ_DSKBLK);
    run_line(&mut chipset);

    let drive = drive.lock().expect("drive lock");
    assert_eq!(drive.inserted, [(0, 901_120)]);
    assert_eq!(drive.written, [0xCAFE, 0xF00D]);
    assert_ne!(chipset.read_register(INTREQR) & INTREQ_DSKBLK, 0);
}

#[test]
fn insert_without_controller_is_ignored() {
    let mut chipset = make_chipset();
    chipset.insert(1, vec![1, 2, 3]);
    run_line(&mut chipset);
}
