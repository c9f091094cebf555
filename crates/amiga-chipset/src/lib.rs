//! Amiga OCS custom chipset.
//!
//! `Chipset` ties Agnus, Denise and Paula to a memory map and runs them one
//! bus slot (colour clock) at a time. Each slot goes to at most one DMA
//! channel; slots nobody claims are offered to the CPU, which lives outside
//! this crate and drives the chipset through [`Chipset::run_for`],
//! [`Chipset::run_until_cpu_slot`] and [`Chipset::perform`].

mod bus;
#[cfg(feature = "native")]
pub mod capture;
mod config;
pub mod custom_regs;
mod memory;
pub mod output;
mod peripherals;

pub use bus::{BusAccess, Operation, Origin, Width};
pub use config::{ChipsetConfig, ConfigError, DEFAULT_AUDIO_SAMPLE_RATE, Region};
pub use memory::{CHIP_RAM_BASE, CUSTOM_REGS_BASE, ChipRam, MemoryMap};
pub use peripherals::DiskController;

pub use commodore_agnus_ocs::{self as agnus_ocs, Agnus, BeamEvent, RasterPosition, SlotOwner};
pub use commodore_denise_ocs::{self as denise_ocs, DeniseOcs};
pub use commodore_paula_8364::{self as paula_8364, InterruptFlag, Paula8364};
pub use emu_core::{
    ChipBus, DisplayType, MasterClock, Observable, ScanStatus, ScanTarget, Ticks, Value,
};

use commodore_agnus_ocs::{SlotRequests, SpriteRegister};
use commodore_paula_8364::DiskDmaState;

use crate::output::{OutputAssembler, SignalRegion, SlotOutput};

/// Audio kept between drains, in milliseconds.
pub const AUDIO_BUFFER_MS: usize = 200;

/// What a call that advanced time left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Changes {
    /// CPU interrupt level after the last slot.
    pub interrupt_level: u8,
    /// Time advanced.
    pub duration: Ticks,
}

/// How `advance_slot` treats a slot that falls to the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMode {
    /// Hand it over and keep going.
    RunFull,
    /// Stop before it, leaving it for the CPU to claim.
    StopOnCpuSlot,
}

pub struct Chipset<M: MemoryMap> {
    pub agnus: Agnus,
    pub denise: DeniseOcs,
    pub paula: Paula8364,
    pub memory: M,
    config: ChipsetConfig,
    output: OutputAssembler,
    scan_target: Option<Box<dyn ScanTarget>>,
    disk_controller: Option<Box<dyn DiskController>>,
    audio_buffer: Vec<f32>,
    /// Samples are being dropped until the host drains the buffer.
    audio_overflow: bool,
    /// Sample-rate accumulator, in units of slot rate.
    audio_phase: u64,
    slot_rate: u64,
    /// A tick left over from an odd `run_for` duration.
    odd_tick: bool,
    /// The CPU has been told the next slot is its own and not yet used it.
    cpu_slot_reserved: bool,
    cia_a: bool,
    cia_b: bool,
}

impl<M: MemoryMap> Chipset<M> {
    /// Build a chipset at the top of a frame.
    pub fn new(memory: M, config: ChipsetConfig) -> Result<Self, ConfigError> {
        let timing = config.validate()?;
        let slot_rate = config.clock().slot_rate_hz();
        log::info!(
            "{} chipset: {} Hz CPU clock, {} lines/field, audio {} Hz",
            config.region,
            config.cpu_clock_hz,
            timing.short_field_height,
            config.audio_sample_rate
        );
        Ok(Self {
            agnus: Agnus::new(timing),
            denise: DeniseOcs::new(),
            paula: Paula8364::new(),
            memory,
            config,
            output: OutputAssembler::new(),
            scan_target: None,
            disk_controller: None,
            audio_buffer: Vec::new(),
            audio_overflow: false,
            audio_phase: 0,
            slot_rate,
            odd_tick: false,
            cpu_slot_reserved: false,
            cia_a: false,
            cia_b: false,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ChipsetConfig {
        &self.config
    }

    #[must_use]
    pub fn position(&self) -> RasterPosition {
        self.agnus.position()
    }

    /// Completed fields since power-on.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.agnus.beam.frame()
    }

    // --- Time ---

    /// Run for `duration` CPU ticks, handing every free slot to the CPU.
    ///
    /// An odd tick is carried into the next call, so slots advanced always
    /// equal total ticks so far divided by two.
    pub fn run_for(&mut self, duration: Ticks) -> Changes {
        let total = duration.get() + u64::from(self.odd_tick);
        self.odd_tick = total % Ticks::PER_SLOT != 0;
        for _ in 0..total / Ticks::PER_SLOT {
            self.advance_slot(SlotMode::RunFull);
        }
        Changes {
            interrupt_level: self.get_interrupt_level(),
            duration,
        }
    }

    /// Run DMA-owned slots until the next slot would go to the CPU.
    ///
    /// The CPU slot itself is not consumed; the next `run_for` starts with
    /// it. Returns at once if the current slot is already the CPU's.
    pub fn run_until_cpu_slot(&mut self) -> Changes {
        let mut slots = 0;
        while self.advance_slot(SlotMode::StopOnCpuSlot) {
            slots += 1;
        }
        Changes {
            interrupt_level: self.get_interrupt_level(),
            duration: Ticks::from_slots(slots),
        }
    }

    /// Run one slot. Returns false, without advancing, if `mode` is
    /// `StopOnCpuSlot` and the slot belongs to the CPU.
    pub fn advance_slot(&mut self, mode: SlotMode) -> bool {
        self.agnus.copper.begin_slot();

        let cpu_waiting = mode == SlotMode::StopOnCpuSlot || self.cpu_slot_reserved;
        let requests = SlotRequests {
            disk: self.paula.disk.wants_dma(),
            audio: std::array::from_fn(|ch| self.paula.audio_wants_dma(ch)),
            cpu_waiting,
        };
        let owner = self.agnus.arbitrate(&requests);
        if owner == SlotOwner::Cpu {
            if mode == SlotMode::StopOnCpuSlot {
                self.cpu_slot_reserved = true;
                return false;
            }
            self.cpu_slot_reserved = false;
        }
        self.agnus.record_grant(owner, cpu_waiting);

        match owner {
            SlotOwner::Cpu | SlotOwner::Refresh => {}
            SlotOwner::Disk => self.disk_slot(),
            SlotOwner::Audio(channel) => {
                let memory = &self.memory;
                self.paula
                    .fetch_audio_word(usize::from(channel), |addr| memory.read_chip_word(addr));
            }
            SlotOwner::Sprite(n) => self.sprite_slot(usize::from(n)),
            SlotOwner::Bitplane(_) => self.bitplane_slot(),
            SlotOwner::Copper => self.copper_slot(),
            SlotOwner::Blitter => {
                if self.agnus.blitter.step(&mut self.memory) {
                    log::trace!("blit done at {:?}", self.agnus.position());
                    self.paula.interrupts.set_request(InterruptFlag::Blitter);
                }
            }
        }

        self.slot_side_effects();
        true
    }

    fn disk_slot(&mut self) {
        let address = self.agnus.disk_pointer;
        if self.paula.disk.state() == DiskDmaState::Writing {
            let word = self.memory.read_chip_word(address);
            if let Some(controller) = self.disk_controller.as_mut() {
                controller.write_word(word);
            }
            self.paula.complete_disk_write();
        } else if let Some(word) = self.paula.take_disk_word() {
            self.memory.write_chip_word(address, word);
        } else {
            return;
        }
        self.agnus.disk_pointer = address.wrapping_add(2) & 0x001F_FFFE;
    }

    fn sprite_slot(&mut self, n: usize) {
        let memory = &self.memory;
        let Some((register, word)) = self.agnus.sprites[n].fetch(|addr| memory.read_chip_word(addr))
        else {
            return;
        };
        match register {
            SpriteRegister::Pos => {
                self.agnus.sprites[n].write_pos(word);
                self.denise.write_sprite_pos(n, word);
            }
            SpriteRegister::Ctl => {
                self.agnus.sprites[n].write_ctl(word);
                self.denise.write_sprite_ctl(n, word);
            }
            SpriteRegister::Data => self.denise.write_sprite_data(n, word),
            SpriteRegister::Datb => self.denise.write_sprite_datb(n, word),
        }
    }

    fn bitplane_slot(&mut self) {
        let cycle = self.agnus.position().cycle;
        let Some(fetch) = self.agnus.bitplane_slot(cycle) else {
            return;
        };
        let memory = &self.memory;
        let word = self
            .agnus
            .bitplanes
            .fetch(fetch, |addr| memory.read_chip_word(addr));
        self.denise
            .write_bitplane_data(usize::from(fetch.plane), word);
    }

    fn copper_slot(&mut self) {
        let position = self.agnus.position();
        let blitter_idle = self.agnus.blitter.is_idle();
        let memory = &self.memory;
        if let Some((register, value)) = self
            .agnus
            .copper
            .tick(position, blitter_idle, |addr| memory.read_chip_word(addr))
        {
            self.write_register(register, value);
        }
    }

    /// Everything that happens every slot regardless of who owned the bus.
    fn slot_side_effects(&mut self) {
        let position = self.agnus.position();
        let blank_height = self.agnus.beam.timing().vertical_blank_height;

        let pixels = self
            .denise
            .output(position.cycle, self.agnus.in_vertical_window());
        let slot_output = match output::signal_region(position.line, position.cycle, blank_height) {
            SignalRegion::Sync => SlotOutput::Sync,
            SignalRegion::Blank => SlotOutput::Blank,
            SignalRegion::ColourBurst => SlotOutput::ColourBurst,
            SignalRegion::Picture => match pixels {
                Some(pixels) => SlotOutput::Pixels(pixels),
                None => SlotOutput::Border(self.denise.palette[0]),
            },
        };
        self.output.push(slot_output, self.scan_target.as_deref_mut());

        self.paula.tick_audio();
        self.audio_phase += u64::from(self.config.audio_sample_rate);
        if self.audio_phase >= self.slot_rate {
            self.audio_phase -= self.slot_rate;
            let (left, right) = self.paula.mix_audio_stereo();
            if self.audio_buffer.len() < self.audio_capacity() {
                self.audio_buffer.push(left);
                self.audio_buffer.push(right);
            } else if !self.audio_overflow {
                self.audio_overflow = true;
                log::debug!("audio buffer full; dropping samples until drained");
            }
        }

        self.paula.tick_serial();

        if self.cia_a {
            self.paula.interrupts.set_request(InterruptFlag::Ports);
        }
        if self.cia_b {
            self.paula.interrupts.set_request(InterruptFlag::External);
        }

        match self.agnus.advance_beam() {
            BeamEvent::None => {}
            BeamEvent::LineStart => {
                self.output.end_line(self.scan_target.as_deref_mut());
                self.denise.begin_line();
            }
            BeamEvent::FrameStart => {
                self.output.end_frame(self.scan_target.as_deref_mut());
                self.denise.begin_line();
                self.paula
                    .interrupts
                    .set_request(InterruptFlag::VerticalBlank);
            }
        }
    }

    // --- Interrupts ---

    #[must_use]
    pub fn get_interrupt_level(&self) -> u8 {
        self.paula.interrupt_level()
    }

    /// Drive the CIA interrupt lines. While a line is held, its INTREQ bit
    /// (PORTS for CIA A, EXTER for CIA B) is re-requested every slot.
    pub fn set_peripheral_interrupts(&mut self, cia_a: bool, cia_b: bool) {
        self.cia_a = cia_a;
        self.cia_b = cia_b;
        if cia_a {
            self.paula.interrupts.set_request(InterruptFlag::Ports);
        }
        if cia_b {
            self.paula.interrupts.set_request(InterruptFlag::External);
        }
    }

    // --- Video ---

    pub fn set_scan_target(&mut self, target: Box<dyn ScanTarget>) {
        self.scan_target = Some(target);
    }

    pub fn take_scan_target(&mut self) -> Option<Box<dyn ScanTarget>> {
        self.scan_target.take()
    }

    #[must_use]
    pub fn scan_status(&self) -> ScanStatus {
        self.scan_target
            .as_ref()
            .map_or_else(ScanStatus::default, |target| target.scan_status())
    }

    pub fn set_display_type(&mut self, display_type: DisplayType) {
        if let Some(target) = self.scan_target.as_mut() {
            target.set_display_type(display_type);
        }
    }

    #[must_use]
    pub fn display_type(&self) -> DisplayType {
        self.scan_target
            .as_ref()
            .map_or(DisplayType::Rgb, |target| target.display_type())
    }

    // --- Audio ---

    /// Drain interleaved stereo samples collected since the last call.
    ///
    /// Hosts should drain at least once per frame. At most
    /// `AUDIO_BUFFER_MS` of audio is held; later samples are dropped.
    pub fn take_audio_buffer(&mut self) -> Vec<f32> {
        self.audio_overflow = false;
        std::mem::take(&mut self.audio_buffer)
    }

    /// Interleaved samples held before dropping.
    fn audio_capacity(&self) -> usize {
        2 * (self.config.audio_sample_rate as usize * AUDIO_BUFFER_MS / 1000).max(1)
    }

    // --- Disk ---

    pub fn set_disk_controller(&mut self, controller: Box<dyn DiskController>) {
        self.disk_controller = Some(controller);
    }

    /// Forward a disk image to the attached controller.
    pub fn insert(&mut self, drive: usize, image: Vec<u8>) {
        match self.disk_controller.as_mut() {
            Some(controller) => {
                log::debug!("inserting {} byte image into DF{drive}:", image.len());
                controller.insert(drive, image);
            }
            None => log::debug!("no disk controller attached; DF{drive}: image ignored"),
        }
    }

    /// A decoded word from the drive. `sync_match` is true when it equals
    /// DSKSYNC.
    pub fn enqueue_disk_word(&mut self, word: u16, sync_match: bool) {
        self.paula.enqueue_disk_word(word, sync_match);
    }

    // --- Serial ---

    /// Drain bytes shifted out of SERDAT.
    pub fn transmitted_serial(&mut self) -> Vec<u8> {
        self.paula.serial.take_transmitted()
    }

    pub fn receive_serial(&mut self, byte: u8) {
        self.paula.receive_serial(byte);
    }
}

fn copper_state_name(state: agnus_ocs::CopperState) -> &'static str {
    match state {
        agnus_ocs::CopperState::Idle => "idle",
        agnus_ocs::CopperState::Fetch1 => "fetch1",
        agnus_ocs::CopperState::Fetch2 => "fetch2",
        agnus_ocs::CopperState::Wait => "wait",
    }
}

fn sprite_state_name(state: agnus_ocs::SpriteDmaState) -> &'static str {
    use agnus_ocs::SpriteDmaState as S;
    match state {
        S::Stopped => "stopped",
        S::FetchStart => "fetch_start",
        S::FetchStopAndControl => "fetch_stop_and_control",
        S::WaitingForStart => "waiting_for_start",
        S::FetchData1 => "fetch_data1",
        S::FetchData0 => "fetch_data0",
    }
}

impl<M: MemoryMap> Observable for Chipset<M> {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(index) = path.strip_prefix("palette.") {
            let index: usize = index.parse().ok()?;
            return self.denise.palette.get(index).map(|&c| Value::U16(c));
        }
        if let Some(rest) = path.strip_prefix("audio.") {
            let (index, field) = rest.split_once('.')?;
            let channel: u16 = index.parse().ok().filter(|&n| n < 4)?;
            let base = custom_regs::AUD0LCH + channel * 0x10;
            let read = |offset: u16| self.paula.read_audio_register(base + offset);
            return match field {
                "location" => {
                    let location = (u32::from(read(0)?) << 16) | u32::from(read(2)?);
                    Some(location.into())
                }
                "length" => read(4).map(Value::U16),
                "period" => read(6).map(Value::U16),
                "volume" => read(8).map(Value::U16),
                _ => None,
            };
        }
        if let Some(rest) = path.strip_prefix("sprite.") {
            let (index, field) = rest.split_once('.')?;
            let sprite = self.agnus.sprites.get(index.parse::<usize>().ok()?)?;
            return match field {
                "state" => Some(sprite_state_name(sprite.state).into()),
                "pointer" => Some(sprite.pointer.into()),
                _ => None,
            };
        }
        match path {
            "beam.line" => Some(self.agnus.position().line.into()),
            "beam.cycle" => Some(self.agnus.position().cycle.into()),
            "beam.frame" => Some(self.agnus.beam.frame().into()),
            "dmacon" => Some(self.agnus.read_dmaconr().into()),
            "intena" => Some(self.paula.interrupts.enable().into()),
            "intreq" => Some(self.paula.interrupts.request().into()),
            "interrupt_level" => Some(self.get_interrupt_level().into()),
            "copper.pc" => Some(self.agnus.copper.pc.into()),
            "copper.state" => Some(copper_state_name(self.agnus.copper.state).into()),
            "blitter.busy" => Some(self.agnus.blitter.is_busy().into()),
            "blitter.zero" => Some(self.agnus.blitter.zero().into()),
            "bplcon0" => Some(self.agnus.bplcon0.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "beam.line",
            "beam.cycle",
            "beam.frame",
            "dmacon",
            "intena",
            "intreq",
            "interrupt_level",
            "copper.pc",
            "copper.state",
            "blitter.busy",
            "blitter.zero",
            "bplcon0",
            "palette.<n>",
            "audio.<n>.location",
            "audio.<n>.length",
            "audio.<n>.period",
            "audio.<n>.volume",
            "sprite.<n>.state",
            "sprite.<n>.pointer",
        ]
    }
}
