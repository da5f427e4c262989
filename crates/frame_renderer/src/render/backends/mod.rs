//! Graphics device implementations
//!
//! Only a headless recording device ships with the crate. Platform backends
//! implement [`GraphicsDevice`](crate::render::api::GraphicsDevice) outside it.

/// In-memory device that records every call
pub mod recording;

pub use recording::{DeviceCall, RecordingDevice};
