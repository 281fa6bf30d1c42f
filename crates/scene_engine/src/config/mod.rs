//! Configuration system
//!
//! Engine settings load from and save to TOML or RON files, chosen by file
//! extension. The initial render pass list is part of the configuration, so
//! a pass setup can be tuned without recompiling.

use std::str::FromStr;

pub use serde::{Serialize, Deserialize};

use crate::render::render_pass::{RenderPass, DEPTH_EFFECT, SHADOWMAP_EFFECT, SHADOWMAP_TARGET};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;
        
        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }
    
    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };
        
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    
    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
    
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
    
    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that parse but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Names of the resources the engine creates or falls back to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceNames {
    /// Effect used when a requested effect is missing
    pub fallback_effect: String,
    /// Material used when a requested material is missing
    pub fallback_material: String,
    /// The window framebuffer
    pub screen_framebuffer: String,
    /// Effect of depth-only passes
    pub depth_effect: String,
    /// Effect of shadow-map passes
    pub shadowmap_effect: String,
    /// Render target of shadow-map passes
    pub shadowmap_target: String,
}

impl Default for ResourceNames {
    fn default() -> Self {
        Self {
            fallback_effect: "engine:effect:fallback".to_string(),
            fallback_material: "engine:material:fallback".to_string(),
            screen_framebuffer: "engine:framebuffer:screen".to_string(),
            depth_effect: DEPTH_EFFECT.to_string(),
            shadowmap_effect: SHADOWMAP_EFFECT.to_string(),
            shadowmap_target: SHADOWMAP_TARGET.to_string(),
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log filter level (`error`, `warn`, `info`, `debug`, `trace`, `off`)
    pub log_level: String,
    /// Whether [`Engine::init`](crate::Engine::init) installs the logger
    pub init_logging: bool,
    /// Initial clear color (RGBA)
    pub clear_color: [f32; 4],
    /// Resource names
    pub resource_names: ResourceNames,
    /// Initial render pass list
    pub render_passes: Vec<RenderPass>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            init_logging: false,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            resource_names: ResourceNames::default(),
            render_passes: vec![RenderPass::default()],
        }
    }
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Set the log level (builder pattern)
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the clear color (builder pattern)
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Replace the render pass list (builder pattern)
    pub fn with_render_passes(mut self, passes: Vec<RenderPass>) -> Self {
        self.render_passes = passes;
        self
    }

    /// Parsed log level
    pub fn level_filter(&self) -> Result<log::LevelFilter, ConfigError> {
        log::LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.level_filter()?;
        if self.clear_color.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::Invalid("clear color must be finite".to_string()));
        }
        let names = &self.resource_names;
        for (field, value) in [
            ("fallback_effect", &names.fallback_effect),
            ("fallback_material", &names.fallback_material),
            ("screen_framebuffer", &names.screen_framebuffer),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Invalid(format!("resource name '{}' is empty", field)));
            }
        }
        Ok(())
    }
}
