//! Structure descriptors and separation settings.

use cairn_common::{Identity, RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};

/// Placement rarity stored in the host's separation-settings table.
///
/// Field names follow the host: `spacing` is the maximum chunk distance
/// between placement attempts, `separation` the minimum, and `salt`
/// decorrelates structures that share similar spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeparationSettings {
    /// Maximum distance apart in chunks between spawn attempts
    pub spacing: i32,
    /// Minimum distance apart in chunks between spawn attempts
    pub separation: i32,
    /// Placement seed modifier
    pub salt: i32,
}

impl SeparationSettings {
    /// Creates validated settings.
    pub fn new(spacing: i32, separation: i32, salt: i32) -> RegistryResult<Self> {
        validate_spacing(separation, spacing)?;
        Ok(Self {
            spacing,
            separation,
            salt,
        })
    }

    /// Minimum spacing (alias of `separation`).
    #[must_use]
    pub const fn min_spacing(&self) -> i32 {
        self.separation
    }

    /// Maximum spacing (alias of `spacing`).
    #[must_use]
    pub const fn max_spacing(&self) -> i32 {
        self.spacing
    }
}

/// Checks `0 <= min < max`.
pub fn validate_spacing(min: i32, max: i32) -> RegistryResult<()> {
    if min < 0 || max < 0 || min >= max {
        return Err(RegistryError::InvalidSpacing { min, max });
    }
    Ok(())
}

/// Everything the registration driver needs to know about one structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureDescriptor {
    /// Stable registry name; never rename once published
    pub identity: Identity,
    /// Minimum chunk distance between placement attempts
    pub min_spacing: i32,
    /// Maximum chunk distance between placement attempts
    pub max_spacing: i32,
    /// Large, unique placement salt
    pub seed_offset: i32,
    /// Whether the host should reshape terrain under the footprint
    #[serde(default)]
    pub conforms_land: bool,
}

impl StructureDescriptor {
    /// Creates a descriptor that does not conform land.
    #[must_use]
    pub fn new(identity: Identity, min_spacing: i32, max_spacing: i32, seed_offset: i32) -> Self {
        Self {
            identity,
            min_spacing,
            max_spacing,
            seed_offset,
            conforms_land: false,
        }
    }

    /// Sets the land-conforming flag.
    #[must_use]
    pub fn with_land_conforming(mut self, conforms_land: bool) -> Self {
        self.conforms_land = conforms_land;
        self
    }

    /// Replaces the spacing triple.
    #[must_use]
    pub fn with_spacing(mut self, min_spacing: i32, max_spacing: i32, seed_offset: i32) -> Self {
        self.min_spacing = min_spacing;
        self.max_spacing = max_spacing;
        self.seed_offset = seed_offset;
        self
    }

    /// Validates the spacing.
    pub fn validate(&self) -> RegistryResult<()> {
        validate_spacing(self.min_spacing, self.max_spacing)
    }

    /// Converts the spacing triple to host settings.
    pub fn separation(&self) -> RegistryResult<SeparationSettings> {
        SeparationSettings::new(self.max_spacing, self.min_spacing, self.seed_offset)
    }
}
