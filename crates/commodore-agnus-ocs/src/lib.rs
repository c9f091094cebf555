//! Commodore Agnus OCS: beam counter, DMA controller, copper and blitter.
//!
//! Agnus is the master DMA controller in the Original Chip Set (OCS). It owns
//! the chip bus, decides which DMA channel uses each slot, generates the beam
//! position counters, and contains the copper coprocessor and blitter.

mod agnus;
mod beam;
mod bitplanes;
mod blitter;
mod copper;
mod sprites;

pub use agnus::{
    Agnus, DMACON_AUD0EN, DMACON_BBUSY, DMACON_BLTEN, DMACON_BLTPRI, DMACON_BPLEN, DMACON_BZERO,
    DMACON_COPEN, DMACON_DMAEN, DMACON_DSKEN, DMACON_SPREN, SlotOwner, SlotRequests,
};
pub use beam::{Beam, BeamEvent, RasterPosition, VideoTiming};
pub use bitplanes::{BitplaneDma, BitplaneFetch, HIRES_DDF_TO_PLANE, LOWRES_DDF_TO_PLANE};
pub use blitter::{Blitter, Channel as BlitterChannel, minterm};
pub use copper::{COPCON_CDANG, Copper, State as CopperState};
pub use sprites::{SpriteDma, SpriteDmaState, SpriteRegister};
