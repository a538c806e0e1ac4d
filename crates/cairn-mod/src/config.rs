//! Mod configuration.
//!
//! Spacing can be overridden per structure (useful while playtesting) and
//! the world-load re-apply hook can be tuned. Configuration is read from
//! `cairn.toml`.

use std::fs;
use std::io;
use std::path::Path;

use cairn_common::Identity;
use cairn_registry::StructureDescriptor;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "cairn.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    /// Failed to parse TOML.
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize TOML.
    #[error("Failed to serialize config TOML: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Two overrides name the same structure.
    #[error("Duplicate override for {0}")]
    DuplicateOverride(Identity),
}

/// Spacing override for one structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureOverride {
    /// Structure to override
    pub identity: Identity,
    /// Minimum chunk distance between placement attempts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_spacing: Option<i32>,
    /// Maximum chunk distance between placement attempts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_spacing: Option<i32>,
    /// Placement salt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_offset: Option<i32>,
    /// Land-conforming flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conforms_land: Option<bool>,
}

impl StructureOverride {
    /// Applies the set fields to a descriptor.
    #[must_use]
    pub fn apply(&self, mut descriptor: StructureDescriptor) -> StructureDescriptor {
        if let Some(min) = self.min_spacing {
            descriptor.min_spacing = min;
        }
        if let Some(max) = self.max_spacing {
            descriptor.max_spacing = max;
        }
        if let Some(salt) = self.seed_offset {
            descriptor.seed_offset = salt;
        }
        if let Some(conforms) = self.conforms_land {
            descriptor.conforms_land = conforms;
        }
        descriptor
    }
}

/// World-load hook settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldLoadConfig {
    /// Re-apply spacing into dimensions that copied settings too early
    pub reapply_spacing: bool,
    /// Leave superflat overworlds alone
    pub skip_flat_overworld: bool,
}

impl Default for WorldLoadConfig {
    fn default() -> Self {
        Self {
            reapply_spacing: true,
            skip_flat_overworld: true,
        }
    }
}

/// Mod configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CairnConfig {
    /// Per-structure spacing overrides
    #[serde(rename = "structure")]
    pub structures: Vec<StructureOverride>,
    /// World-load hook settings
    pub world_load: WorldLoadConfig,
}

impl CairnConfig {
    /// Load configuration from the default file location.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match Self::try_load_from(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("{e}; using defaults");
                Self::default()
            },
        }
    }

    /// Load configuration from a specific path, failing on any error.
    pub fn try_load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Rejects duplicate overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, entry) in self.structures.iter().enumerate() {
            if self.structures[..i]
                .iter()
                .any(|earlier| earlier.identity == entry.identity)
            {
                return Err(ConfigError::DuplicateOverride(entry.identity.clone()));
            }
        }
        Ok(())
    }

    /// Finds the override for a structure.
    #[must_use]
    pub fn override_for(&self, identity: &Identity) -> Option<&StructureOverride> {
        self.structures.iter().find(|o| &o.identity == identity)
    }

    /// Applies any matching override to a descriptor.
    #[must_use]
    pub fn apply_overrides(&self, descriptor: StructureDescriptor) -> StructureDescriptor {
        match self.override_for(&descriptor.identity) {
            Some(entry) => {
                info!("Applying config override for {}", descriptor.identity);
                entry.apply(descriptor)
            },
            None => descriptor,
        }
    }
}
