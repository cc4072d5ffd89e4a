//! Configuration system

use std::path::PathBuf;

pub use serde::{Deserialize, Serialize};

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

    /// A value failed validation
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Name of the offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Largest pixel size the font registry accepts by default
pub const DEFAULT_MAX_FONT_SIZE: u32 = 49;

/// Hardware alignment applied to texture dimensions by default
pub const DEFAULT_TEXTURE_ALIGNMENT: u32 = 32;

/// Upper bound for `max_font_size`; the registry holds one slot per size
pub const MAX_FONT_SIZE_LIMIT: u32 = 1024;

/// Upper bound for `texture_alignment`
pub const MAX_TEXTURE_ALIGNMENT: u32 = 4096;

/// # Text Configuration
///
/// Settings for the font system: which face to load, the registry bounds,
/// and how glyph textures are allocated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Path to the TrueType/OpenType face
    pub font_path: PathBuf,
    /// Pixel size used when the caller doesn't pick one
    pub default_pixel_size: u32,
    /// Highest registry slot (inclusive)
    pub max_font_size: u32,
    /// Texture width/height are rounded up to a multiple of this
    pub texture_alignment: u32,
    /// Cache every glyph of the face when an instance is created
    pub precache: bool,
    /// Apply pair kerning when the face supports it
    pub kerning: bool,
    /// Vertex format selector passed through to quad draws
    pub vertex_format: u8,
    /// Default log filter for `foundation::logging::init_with_level`
    pub log_level: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_path: PathBuf::from("resources/fonts/default.ttf"),
            default_pixel_size: 24,
            max_font_size: DEFAULT_MAX_FONT_SIZE,
            texture_alignment: DEFAULT_TEXTURE_ALIGNMENT,
            precache: false,
            kerning: true,
            vertex_format: 1,
            log_level: "info".to_string(),
        }
    }
}

impl Config for TextConfig {}

impl TextConfig {
    /// Check values that would otherwise surface as silent rendering failures
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_font_size == 0 || self.max_font_size > MAX_FONT_SIZE_LIMIT {
            return Err(ConfigError::Invalid {
                field: "max_font_size",
                reason: format!("must be within 1..={MAX_FONT_SIZE_LIMIT}"),
            });
        }
        if self.default_pixel_size == 0 || self.default_pixel_size > self.max_font_size {
            return Err(ConfigError::Invalid {
                field: "default_pixel_size",
                reason: format!("must be within 1..={}", self.max_font_size),
            });
        }
        if !self.texture_alignment.is_power_of_two() || self.texture_alignment > MAX_TEXTURE_ALIGNMENT {
            return Err(ConfigError::Invalid {
                field: "texture_alignment",
                reason: format!("{} is not a power of two up to {MAX_TEXTURE_ALIGNMENT}", self.texture_alignment),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TextConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_font_size, 49);
        assert_eq!(config.texture_alignment, 32);
    }

    #[test]
    fn test_validate_rejects_bad_alignment() {
        let config = TextConfig { texture_alignment: 24, ..TextConfig::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "texture_alignment", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_oversized_default() {
        let config = TextConfig { default_pixel_size: 64, ..TextConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_registry_size() {
        let config = TextConfig { max_font_size: u32::MAX, ..TextConfig::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "max_font_size", .. })
        ));

        let config = TextConfig { max_font_size: 0, ..TextConfig::default() };
        assert!(config.validate().is_err());

        let config = TextConfig { max_font_size: MAX_FONT_SIZE_LIMIT, ..TextConfig::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bounds_alignment() {
        let config = TextConfig { texture_alignment: 1 << 31, ..TextConfig::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "texture_alignment", .. })
        ));
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("gx_text_config_{}.toml", std::process::id()));
        let path = path.to_string_lossy().to_string();

        let config = TextConfig { default_pixel_size: 18, precache: true, ..TextConfig::default() };
        config.save_to_file(&path).unwrap();
        let loaded = TextConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config: TextConfig = ron::from_str("(default_pixel_size: 12)").unwrap();
        assert_eq!(config.default_pixel_size, 12);
        assert_eq!(config.max_font_size, DEFAULT_MAX_FONT_SIZE);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = TextConfig::load_from_file("settings.json");
        assert!(matches!(result, Err(ConfigError::Io(_)) | Err(ConfigError::UnsupportedFormat(_))));
    }
}
