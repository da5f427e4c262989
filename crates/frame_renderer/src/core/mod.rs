//! # Core Module
//!
//! Shared abstractions used by the render pipeline and the binaries that
//! drive it.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for the pipeline and its host
//! - **Foundation**: Low-level utilities (math, collections, logging)

pub mod config;

// Re-export foundation modules for convenience
pub use crate::foundation;

// Re-export commonly used config types
pub use config::{
    ApplicationConfig,
    EngineConfig,
    RendererConfig,
    Config,
    ConfigError,
    ConfigFormat,
};
