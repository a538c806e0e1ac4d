//! Dimensions and their structure tables.
//!
//! Each dimension copies the default separation settings when it is
//! created. That copy is an early reader: anything appended to the default
//! table afterwards is invisible to the dimension unless it is re-applied
//! when the world loads.

use ahash::AHashMap;
use cairn_common::{Identity, StructureHandle};
use cairn_registry::{SeparationSettings, VersionedMap};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Kind of dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimensionKind {
    /// Main surface world
    Overworld,
    /// Nether
    Nether,
    /// End
    End,
    /// Dimension added in code or by a datapack
    Custom,
}

/// Per-dimension structure settings.
#[derive(Debug, Clone, Default)]
pub struct DimensionStructureTable {
    settings: AHashMap<StructureHandle, SeparationSettings>,
    /// Version of the default table this copy was taken from
    source_version: u64,
}

impl DimensionStructureTable {
    /// Copies the current default settings.
    #[must_use]
    pub fn copy_of(defaults: &VersionedMap<StructureHandle, SeparationSettings>) -> Self {
        let snapshot = defaults.snapshot();
        Self {
            settings: snapshot.iter().map(|(h, s)| (*h, *s)).collect(),
            source_version: snapshot.version(),
        }
    }

    /// Gets the settings for a structure.
    #[must_use]
    pub fn get(&self, handle: StructureHandle) -> Option<SeparationSettings> {
        self.settings.get(&handle).copied()
    }

    /// Checks whether the structure can generate here.
    #[must_use]
    pub fn contains(&self, handle: StructureHandle) -> bool {
        self.settings.contains_key(&handle)
    }

    /// Inserts settings unless the dimension already has some.
    ///
    /// Returns `true` if the settings were inserted.
    pub fn insert_if_absent(&mut self, handle: StructureHandle, settings: SeparationSettings) -> bool {
        if self.settings.contains_key(&handle) {
            return false;
        }
        self.settings.insert(handle, settings);
        true
    }

    /// Overrides settings for a structure (datapack customisation).
    pub fn set(&mut self, handle: StructureHandle, settings: SeparationSettings) {
        self.settings.insert(handle, settings);
    }

    /// Removes a structure from this dimension.
    pub fn remove(&mut self, handle: StructureHandle) -> Option<SeparationSettings> {
        self.settings.remove(&handle)
    }

    /// Returns the number of structures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    /// Checks if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Default-table version this table was copied from.
    #[must_use]
    pub fn source_version(&self) -> u64 {
        self.source_version
    }
}

/// A loaded or loadable dimension.
#[derive(Debug, Clone)]
pub struct Dimension {
    id: Identity,
    kind: DimensionKind,
    /// Superflat world type
    flat: bool,
    structures: DimensionStructureTable,
}

impl Dimension {
    /// Creates a dimension, copying the default structure settings.
    #[must_use]
    pub fn new(
        id: Identity,
        kind: DimensionKind,
        flat: bool,
        defaults: &VersionedMap<StructureHandle, SeparationSettings>,
    ) -> Self {
        let structures = DimensionStructureTable::copy_of(defaults);
        debug!(
            "Dimension {id} copied {} structure settings (v{})",
            structures.len(),
            structures.source_version()
        );
        Self {
            id,
            kind,
            flat,
            structures,
        }
    }

    /// Returns the dimension id.
    #[must_use]
    pub fn id(&self) -> &Identity {
        &self.id
    }

    /// Returns the dimension kind.
    #[must_use]
    pub const fn kind(&self) -> DimensionKind {
        self.kind
    }

    /// Checks whether this is a superflat world.
    #[must_use]
    pub const fn is_flat(&self) -> bool {
        self.flat
    }

    /// Structure table.
    #[must_use]
    pub fn structures(&self) -> &DimensionStructureTable {
        &self.structures
    }

    /// Structure table, mutably.
    pub fn structures_mut(&mut self) -> &mut DimensionStructureTable {
        &mut self.structures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(salt: i32) -> SeparationSettings {
        SeparationSettings::new(32, 8, salt).expect("valid")
    }

    #[test]
    fn test_copy_is_an_early_reader() {
        let defaults = VersionedMap::new();
        defaults
            .append_only(StructureHandle::from_raw(0), settings(1))
            .expect("append");

        let dim = Dimension::new(
            Identity::parse("overworld").expect("id"),
            DimensionKind::Overworld,
            false,
            &defaults,
        );

        defaults
            .append_only(StructureHandle::from_raw(1), settings(2))
            .expect("append");

        assert!(dim.structures().contains(StructureHandle::from_raw(0)));
        assert!(!dim.structures().contains(StructureHandle::from_raw(1)));
        assert!(dim.structures().source_version() < defaults.version());
    }

    #[test]
    fn test_insert_if_absent_keeps_existing() {
        let mut table = DimensionStructureTable::default();
        let handle = StructureHandle::from_raw(4);
        table.set(handle, settings(1));

        assert!(!table.insert_if_absent(handle, settings(2)));
        assert_eq!(table.get(handle).map(|s| s.salt), Some(1));

        table.remove(handle);
        assert!(table.insert_if_absent(handle, settings(2)));
        assert_eq!(table.get(handle).map(|s| s.salt), Some(2));
    }
}
