//! # Unified Configuration
//!
//! Configuration structures for the frame pipeline and the application that
//! drives it. All types are serde-serializable and can be loaded from TOML or
//! RON through the [`Config`] trait.
//!
//! ## Configuration Categories
//!
//! - **Renderer Config**: prep worker pool, processor limits, culling
//! - **Engine Config**: logging and debug behaviour
//! - **Application Config**: top-level bundle used by binaries

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError, ConfigFormat};

/// Default upper bound for a single dynamic mesh's vertex data, in bytes
pub const DEFAULT_MAX_DYNAMIC_VERTEX_BYTES: usize = 1024 * 1024;

/// Default upper bound for a single dynamic mesh's index data, in bytes
pub const DEFAULT_MAX_DYNAMIC_INDEX_BYTES: usize = 256 * 1024;

/// # Renderer Configuration
///
/// Tuning for the snapshot → command buffer → execution pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Threads in the render-prep worker pool; `None` lets rayon decide
    pub worker_threads: Option<usize>,
    /// Number of texture units the processor may hand out per material
    pub max_texture_units: u32,
    /// Capacity of the scratch vertex buffer used for dynamic meshes
    pub max_dynamic_vertex_bytes: usize,
    /// Capacity of the scratch index buffer used for dynamic meshes
    pub max_dynamic_index_bytes: usize,
    /// Whether objects outside the camera frustum are dropped before sorting
    pub enable_frustum_culling: bool,
}

impl RendererConfig {
    /// Create a renderer configuration with defaults
    pub fn new() -> Self {
        Self {
            worker_threads: None,
            max_texture_units: 8,
            max_dynamic_vertex_bytes: DEFAULT_MAX_DYNAMIC_VERTEX_BYTES,
            max_dynamic_index_bytes: DEFAULT_MAX_DYNAMIC_INDEX_BYTES,
            enable_frustum_culling: true,
        }
    }

    /// Set the prep worker pool size
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Set the number of texture units
    pub fn with_max_texture_units(mut self, units: u32) -> Self {
        self.max_texture_units = units;
        self
    }

    /// Set the dynamic mesh scratch buffer capacities
    pub fn with_dynamic_mesh_limits(mut self, vertex_bytes: usize, index_bytes: usize) -> Self {
        self.max_dynamic_vertex_bytes = vertex_bytes;
        self.max_dynamic_index_bytes = index_bytes;
        self
    }

    /// Enable or disable frustum culling
    pub fn with_frustum_culling(mut self, enabled: bool) -> Self {
        self.enable_frustum_culling = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_threads == Some(0) {
            return Err("Worker threads must be at least 1 when set".to_string());
        }

        if self.max_texture_units == 0 {
            return Err("Max texture units must be at least 1".to_string());
        }

        if self.max_dynamic_vertex_bytes == 0 || self.max_dynamic_index_bytes == 0 {
            return Err("Dynamic mesh buffer limits must be non-zero".to_string());
        }

        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for RendererConfig {}

/// # Engine Configuration
///
/// Process-wide behaviour that is not specific to rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter, overridable through `RUST_LOG`
    pub log_level: String,
    /// Whether to enable debug features
    pub debug_mode: bool,
    /// Target simulation ticks per second for producers
    pub target_fps: Option<u32>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
            target_fps: None,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set target FPS
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = Some(fps);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all subsystems.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Rendering pipeline configuration
    pub renderer: RendererConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.renderer.validate().map_err(ConfigError::Invalid)
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_config_defaults_are_valid() {
        let config = RendererConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.enable_frustum_culling);
        assert_eq!(config.worker_threads, None);
    }

    #[test]
    fn test_renderer_config_rejects_zero_workers() {
        let config = RendererConfig::new().with_worker_threads(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_application_config_toml_partial_document() {
        let toml = r#"
            [engine]
            log_level = "debug"

            [renderer]
            worker_threads = 2
            enable_frustum_culling = false
        "#;

        let config = ApplicationConfig::from_str_with_format(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.engine.log_level, "debug");
        assert_eq!(config.renderer.worker_threads, Some(2));
        assert!(!config.renderer.enable_frustum_culling);
        assert_eq!(config.renderer.max_texture_units, 8);
    }

    #[test]
    fn test_application_config_ron_round_trip() {
        let config = ApplicationConfig {
            engine: EngineConfig::new().with_target_fps(30),
            renderer: RendererConfig::new().with_max_texture_units(4),
        };

        let text = config.to_string_with_format(ConfigFormat::Ron).unwrap();
        let parsed = ApplicationConfig::from_str_with_format(&text, ConfigFormat::Ron).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_application_config() {
        let mut config = ApplicationConfig::default();
        config.renderer.max_texture_units = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
