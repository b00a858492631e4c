//! Construction configuration
//!
//! Tunables for naming, instancing and structural limits. Values can be
//! loaded from TOML; anything missing falls back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConstructError, Result};

/// Configuration for tree authoring and instancing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructionConfig {
    /// Suffix appended to a variable name to form its template object name
    ///
    /// A node named `Mesh` owns a template named `Mesh_GEN_VARIABLE`. Runtime
    /// instances use the bare variable name, so the two never collide on the
    /// same owner.
    pub template_name_suffix: String,

    /// Whether cooked instancing data is consulted during construction
    ///
    /// When false every node is instanced by duplicating its template, even
    /// if cooked data is present. Useful for checking that both paths agree.
    pub use_cooked_data: bool,

    /// Maximum depth of a construction tree (roots are depth 1)
    ///
    /// Instancing recurses once per level, so this bounds stack usage.
    pub max_tree_depth: usize,
}

impl Default for ConstructionConfig {
    fn default() -> Self {
        Self {
            template_name_suffix: "_GEN_VARIABLE".to_string(),
            use_cooked_data: true,
            max_tree_depth: 64,
        }
    }
}

impl ConstructionConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from a TOML string and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ConstructionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file on disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.template_name_suffix.is_empty() {
            return Err(ConstructError::Config(
                "template_name_suffix must not be empty".into(),
            ));
        }

        if self.template_name_suffix.chars().any(char::is_whitespace) {
            return Err(ConstructError::Config(format!(
                "template_name_suffix ({:?}) must not contain whitespace",
                self.template_name_suffix
            )));
        }

        if self.max_tree_depth == 0 {
            return Err(ConstructError::Config(
                "max_tree_depth must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<ConstructionConfig> = OnceLock::new();

/// Get the global construction config (initializes with defaults if not set)
pub fn config() -> &'static ConstructionConfig {
    CONFIG.get_or_init(ConstructionConfig::default)
}

/// Set the global construction config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: ConstructionConfig) -> std::result::Result<(), ConstructionConfig> {
    CONFIG.set(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ConstructionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ConstructionConfig::from_toml_str("use_cooked_data = false").unwrap();
        assert!(!config.use_cooked_data);
        assert_eq!(config.template_name_suffix, "_GEN_VARIABLE");
        assert_eq!(config.max_tree_depth, 64);
    }

    #[test]
    fn test_rejects_zero_depth() {
        let result = ConstructionConfig::from_toml_str("max_tree_depth = 0");
        assert!(matches!(result, Err(ConstructError::Config(_))));
    }

    #[test]
    fn test_rejects_blank_suffix() {
        let result = ConstructionConfig::from_toml_str("template_name_suffix = \"\"");
        assert!(result.is_err());
    }
}
