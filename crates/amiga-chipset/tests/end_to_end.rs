use std::sync::{Arc, Mutex};

use amiga_chipset::custom_regs::{
    BPL1PTH, BPL1PTL, BPLCON0, COLOR00, COP1LCH, COP1LCL, COPJMP1, DDFSTOP, DDFSTRT, DIWSTOP,
    DIWSTRT, DMACON,
};
use amiga_chipset::{
    ChipRam, Chipset, ChipsetConfig, DisplayType, Observable, RasterPosition, ScanStatus,
    ScanTarget, Ticks, Value,
};

const COPPER_LIST: u32 = 0x1000;
const BITPLANE: u32 = 0x1_0000;
const LINE_WIDTH: usize = 227 * 4;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Sync(usize),
    Blank(usize),
    Burst(usize),
    Level(usize, u16),
    Data(Vec<u16>),
    FrameComplete,
}

impl Call {
    fn length(&self) -> usize {
        match self {
            Call::Sync(n) | Call::Blank(n) | Call::Burst(n) | Call::Level(n, _) => *n,
            Call::Data(pixels) => pixels.len(),
            Call::FrameComplete => 0,
        }
    }
}

/// Records every sink call; the test keeps a second handle to the log.
#[derive(Clone, Default)]
struct RecordingSink {
    calls: Arc<Mutex<Vec<Call>>>,
    display_type: DisplayType,
}

impl RecordingSink {
    fn push(&self, call: Call) {
        self.calls.lock().expect("sink lock").push(call);
    }
}

impl ScanTarget for RecordingSink {
    fn output_sync(&mut self, length: usize) {
        self.push(Call::Sync(length));
    }
    fn output_blank(&mut self, length: usize) {
        self.push(Call::Blank(length));
    }
    fn output_colour_burst(&mut self, length: usize) {
        self.push(Call::Burst(length));
    }
    fn output_level(&mut self, length: usize, colour: u16) {
        self.push(Call::Level(length, colour));
    }
    fn output_data(&mut self, pixels: &[u16]) {
        self.push(Call::Data(pixels.to_vec()));
    }
    fn frame_complete(&mut self) {
        self.push(Call::FrameComplete);
    }
    fn scan_status(&self) -> ScanStatus {
        ScanStatus {
            hsync_count: 7,
            ..ScanStatus::default()
        }
    }
    fn set_display_type(&mut self, display_type: DisplayType) {
        self.display_type = display_type;
    }
    fn display_type(&self) -> DisplayType {
        self.display_type
    }
}

fn make_chipset() -> (Chipset<ChipRam>, Arc<Mutex<Vec<Call>>>) {
    let mut chipset =
        Chipset::new(ChipRam::new(512 * 1024), ChipsetConfig::pal()).expect("valid config");
    let sink = RecordingSink::default();
    let calls = Arc::clone(&sink.calls);
    chipset.set_scan_target(Box::new(sink));
    (chipset, calls)
}

/// Calls grouped by the line they were emitted on.
fn calls_on_line(calls: &[Call], line: usize) -> Vec<Call> {
    let mut position = 0;
    let mut out = Vec::new();
    for call in calls {
        if *call == Call::FrameComplete {
            position = 0;
            continue;
        }
        if position / LINE_WIDTH == line {
            out.push(call.clone());
        }
        position += call.length();
    }
    out
}

fn start_copper(chipset: &mut Chipset<ChipRam>, program: &[u16]) {
    chipset.memory.load_words(COPPER_LIST, program);
    chipset.write_register(COP1LCH, 0);
    chipset.write_register(COP1LCL, COPPER_LIST as u16);
    chipset.write_register(DMACON, 0x8280);
    chipset.write_register(COPJMP1, 0);
}

fn run_to(chipset: &mut Chipset<ChipRam>, line: u16, cycle: u16) {
    let target = RasterPosition::new(line, cycle);
    while chipset.position() != target {
        chipset.run_for(Ticks::new(2));
    }
}

#[test]
fn copper_colour_change_at_line_ten() {
    let (mut chipset, _) = make_chipset();
    chipset.write_register(COLOR00, 0x0005);
    start_copper(&mut chipset, &[0x0A01, 0xFFFE, COLOR00, 0x0F00, 0xFFFF, 0xFFFE]);

    let last_cycle = chipset.agnus.beam.max_cycle();
    run_to(&mut chipset, 9, last_cycle);
    chipset.run_for(Ticks::new(2));
    assert_eq!(chipset.query("palette.0"), Some(Value::U16(0x0005)));
    chipset.run_for(Ticks::new(2));
    assert_eq!(chipset.query("palette.0"), Some(Value::U16(0x0F00)));
}

#[test]
fn border_follows_color00_from_the_wait_line() {
    let (mut chipset, calls) = make_chipset();
    chipset.write_register(COLOR00, 0x0005);
    start_copper(&mut chipset, &[0x6401, 0xFFFE, COLOR00, 0x0F00, 0xFFFF, 0xFFFE]);
    run_to(&mut chipset, 102, 0);

    let calls = calls.lock().expect("sink lock").clone();
    let levels = |line| -> Vec<u16> {
        calls_on_line(&calls, line)
            .into_iter()
            .filter_map(|call| match call {
                Call::Level(_, colour) => Some(colour),
                _ => None,
            })
            .collect()
    };
    assert_eq!(levels(99), [0x0005, 0x0005]);
    assert_eq!(levels(100), [0x0F00, 0x0F00]);
    assert!(levels(10).is_empty(), "vertical blank carries no border");
}

#[test]
fn one_sink_call_per_class_run() {
    let (mut chipset, calls) = make_chipset();
    chipset.write_register(COLOR00, 0x0123);
    run_to(&mut chipset, 52, 0);

    let calls = calls.lock().expect("sink lock").clone();
    assert_eq!(
        calls_on_line(&calls, 50),
        [
            Call::Level(15 * 4, 0x0123),
            Call::Blank(3 * 4),
            Call::Sync(17 * 4),
            Call::Blank(3 * 4),
            Call::Burst(9 * 4),
            Call::Blank(6 * 4),
            Call::Level(174 * 4, 0x0123),
        ]
    );
    assert_eq!(calls_on_line(&calls, 3)[0], Call::Sync(18 * 4));
}

#[test]
fn frame_complete_once_per_field() {
    let (mut chipset, calls) = make_chipset();
    let field = u64::from(chipset.agnus.beam.field_height()) * 227;
    chipset.run_for(Ticks::from_slots(2 * field));
    let frames = calls
        .lock()
        .expect("sink lock")
        .iter()
        .filter(|call| **call == Call::FrameComplete)
        .count();
    assert_eq!(frames, 2);
    assert_eq!(chipset.frame_count(), 2);
}

#[test]
fn lowres_bitplane_reaches_the_sink() {
    let (mut chipset, calls) = make_chipset();
    chipset.memory.load_words(BITPLANE, &[0xFFFF; 20 * 256]);
    chipset.write_register(COLOR00, 0x0000);
    chipset.write_register(COLOR00 + 2, 0x0FFF);
    chipset.write_register(DIWSTRT, 0x2C81);
    chipset.write_register(DIWSTOP, 0x2CC1);
    chipset.write_register(DDFSTRT, 0x0038);
    chipset.write_register(DDFSTOP, 0x00D0);
    chipset.write_register(BPL1PTH, (BITPLANE >> 16) as u16);
    chipset.write_register(BPL1PTL, BITPLANE as u16);
    chipset.write_register(BPLCON0, 0x1200);
    chipset.write_register(DMACON, 0x8300);

    run_to(&mut chipset, 0x30, 0);
    // Four lines of twenty words.
    assert_eq!(chipset.agnus.bitplanes.pointers[0], BITPLANE + 4 * 40);

    let calls = calls.lock().expect("sink lock").clone();
    let white: usize = calls_on_line(&calls, 0x2D)
        .iter()
        .map(|call| match call {
            Call::Data(pixels) => pixels.iter().filter(|&&p| p == 0x0FFF).count(),
            _ => 0,
        })
        .sum();
    assert!(white >= 600, "only {white} lit pixels");
    assert!(
        calls_on_line(&calls, 0x2B)
            .iter()
            .all(|call| !matches!(call, Call::Data(_))),
        "nothing above the window"
    );
}

#[test]
fn sink_passthroughs() {
    let (mut chipset, _) = make_chipset();
    assert_eq!(chipset.scan_status().hsync_count, 7);
    chipset.set_display_type(DisplayType::CompositeColour);
    assert_eq!(chipset.display_type(), DisplayType::CompositeColour);

    assert!(chipset.take_scan_target().is_some());
    assert_eq!(chipset.scan_status(), ScanStatus::default());
    assert_eq!(chipset.display_type(), DisplayType::Rgb);
    chipset.run_for(Ticks::from_slots(1000));
}
