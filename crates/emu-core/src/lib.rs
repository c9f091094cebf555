//! Core traits and types shared by the chipset crates.
//!
//! Time is counted in CPU clock ticks. One bus slot (a colour clock) is two
//! ticks; everything the chipset does happens on a slot boundary.

mod chip_bus;
mod clock;
mod observable;
mod ticks;
mod video;

pub use chip_bus::ChipBus;
pub use clock::MasterClock;
pub use observable::{Observable, Value};
pub use ticks::Ticks;
pub use video::{DisplayType, ScanStatus, ScanTarget};
