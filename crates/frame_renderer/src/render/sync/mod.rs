//! Synchronisation between the producer, the prep task and the render thread

pub mod gate;
pub mod ring;

pub use gate::{RenderPrepGate, RenderPrepPermit};
pub use ring::{CommandBufferRing, COMMAND_BUFFER_RING_DEPTH};
