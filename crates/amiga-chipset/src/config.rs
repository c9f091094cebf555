//! Configuration for the chipset.

use std::fmt;

use commodore_agnus_ocs::VideoTiming;
use emu_core::MasterClock;

/// Default host audio rate.
pub const DEFAULT_AUDIO_SAMPLE_RATE: u32 = 48_000;

/// How far the CPU clock may stray from the region's nominal rate, in
/// thousandths.
const CLOCK_TOLERANCE_PERMILLE: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "native", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "native", serde(rename_all = "lowercase"))]
pub enum Region {
    Pal,
    Ntsc,
}

impl Region {
    #[must_use]
    pub const fn nominal_clock(self) -> MasterClock {
        match self {
            Self::Pal => MasterClock::PAL,
            Self::Ntsc => MasterClock::NTSC,
        }
    }

    #[must_use]
    pub const fn timing(self) -> VideoTiming {
        match self {
            Self::Pal => VideoTiming::PAL,
            Self::Ntsc => VideoTiming::NTSC,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pal => "PAL",
            Self::Ntsc => "NTSC",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "native", derive(serde::Serialize, serde::Deserialize))]
pub struct ChipsetConfig {
    pub region: Region,
    /// CPU clock in Hz. One bus slot is two of these.
    pub cpu_clock_hz: u64,
    /// Rate at which stereo samples are collected for `take_audio_buffer`.
    pub audio_sample_rate: u32,
}

impl ChipsetConfig {
    #[must_use]
    pub const fn pal() -> Self {
        Self {
            region: Region::Pal,
            cpu_clock_hz: MasterClock::PAL.frequency_hz,
            audio_sample_rate: DEFAULT_AUDIO_SAMPLE_RATE,
        }
    }

    #[must_use]
    pub const fn ntsc() -> Self {
        Self {
            region: Region::Ntsc,
            cpu_clock_hz: MasterClock::NTSC.frequency_hz,
            audio_sample_rate: DEFAULT_AUDIO_SAMPLE_RATE,
        }
    }

    #[must_use]
    pub const fn clock(&self) -> MasterClock {
        MasterClock::new(self.cpu_clock_hz)
    }

    /// Check the clock against the region and return the raster geometry.
    pub fn validate(&self) -> Result<VideoTiming, ConfigError> {
        if !self
            .clock()
            .is_near(self.region.nominal_clock(), CLOCK_TOLERANCE_PERMILLE)
        {
            return Err(ConfigError::UnsupportedClockRate {
                hz: self.cpu_clock_hz,
                region: self.region,
            });
        }
        let slot_rate = self.clock().slot_rate_hz();
        if self.audio_sample_rate == 0 || u64::from(self.audio_sample_rate) > slot_rate {
            return Err(ConfigError::InvalidSampleRate(self.audio_sample_rate));
        }
        Ok(self.region.timing())
    }

    /// Parse a config from JSON, e.g.
    /// `{"region":"ntsc","cpu_clock_hz":7159090,"audio_sample_rate":44100}`.
    #[cfg(feature = "native")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

impl Default for ChipsetConfig {
    fn default() -> Self {
        Self::pal()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The CPU clock is not within 1% of the region's crystal.
    UnsupportedClockRate { hz: u64, region: Region },
    /// Zero, or faster than one sample per bus slot.
    InvalidSampleRate(u32),
    #[cfg(feature = "native")]
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedClockRate { hz, region } => {
                write!(f, "unsupported {region} CPU clock: {hz} Hz")
            }
            Self::InvalidSampleRate(rate) => write!(f, "invalid audio sample rate: {rate} Hz"),
            #[cfg(feature = "native")]
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
