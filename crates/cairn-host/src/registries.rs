//! Engine-owned structure collections.

use std::sync::Arc;

use cairn_common::{Identity, RegistryError, RegistryResult, StructureHandle};
use cairn_registry::{
    AlreadyPresent, GenerationStep, RegistrationFacility, RegistryTargets, SeparationSettings,
    StructureInstance, VersionedList, VersionedMap,
};
use tracing::info;

use crate::facility::{StructureRegistry, VanillaStructure};

/// A structure the host ships with.
#[derive(Debug, Clone, Copy)]
pub struct VanillaEntry {
    /// Path in the default namespace
    pub path: &'static str,
    /// Display name
    pub name: &'static str,
    /// Generation step
    pub step: GenerationStep,
    /// Spacing (max chunk distance)
    pub spacing: i32,
    /// Separation (min chunk distance)
    pub separation: i32,
    /// Placement salt
    pub salt: i32,
    /// Whether terrain is reshaped under the footprint
    pub conforms_land: bool,
}

/// Structures present before any mod loads.
pub const VANILLA_STRUCTURES: &[VanillaEntry] = &[
    VanillaEntry {
        path: "village",
        name: "Village",
        step: GenerationStep::SurfaceStructures,
        spacing: 32,
        separation: 8,
        salt: 10_387_312,
        conforms_land: true,
    },
    VanillaEntry {
        path: "desert_pyramid",
        name: "Desert Pyramid",
        step: GenerationStep::SurfaceStructures,
        spacing: 32,
        separation: 8,
        salt: 14_357_617,
        conforms_land: false,
    },
    VanillaEntry {
        path: "igloo",
        name: "Igloo",
        step: GenerationStep::SurfaceStructures,
        spacing: 32,
        separation: 8,
        salt: 14_357_618,
        conforms_land: false,
    },
    VanillaEntry {
        path: "pillager_outpost",
        name: "Pillager Outpost",
        step: GenerationStep::SurfaceStructures,
        spacing: 32,
        separation: 8,
        salt: 165_745_296,
        conforms_land: true,
    },
    VanillaEntry {
        path: "ruined_portal",
        name: "Ruined Portal",
        step: GenerationStep::SurfaceStructures,
        spacing: 40,
        separation: 15,
        salt: 34_222_645,
        conforms_land: false,
    },
    VanillaEntry {
        path: "mineshaft",
        name: "Mineshaft",
        step: GenerationStep::UndergroundStructures,
        spacing: 1,
        separation: 0,
        salt: 0,
        conforms_land: false,
    },
];

/// The three collections a structure must appear in, plus the generic
/// registry that issues handles.
#[derive(Debug, Default)]
pub struct HostRegistries {
    /// Identity to handle
    structure_map: VersionedMap<Identity, StructureHandle>,
    /// Land-conforming handles
    land_conforming: VersionedList<StructureHandle>,
    /// Default separation settings, copied by each new dimension
    separation: VersionedMap<StructureHandle, SeparationSettings>,
    /// Generic registry
    structures: StructureRegistry,
}

impl HostRegistries {
    /// Creates empty registries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates registries seeded with [`VANILLA_STRUCTURES`].
    pub fn vanilla() -> RegistryResult<Self> {
        Self::with_entries(VANILLA_STRUCTURES)
    }

    /// Creates registries seeded with the given entries.
    pub fn with_entries(entries: &[VanillaEntry]) -> RegistryResult<Self> {
        let mut structures = StructureRegistry::new();
        let mut map = Vec::with_capacity(entries.len());
        let mut land = Vec::new();
        let mut separation = Vec::with_capacity(entries.len());

        for entry in entries {
            let identity = Identity::new(Identity::DEFAULT_NAMESPACE, entry.path)?;
            let instance: StructureInstance = Arc::new(VanillaStructure::new(entry.name, entry.step));
            let handle = structures.register(identity.clone(), Box::new(move || instance))?;
            let settings = SeparationSettings::new(entry.spacing, entry.separation, entry.salt)?;

            map.push((identity, handle));
            if entry.conforms_land {
                land.push(handle);
            }
            separation.push((handle, settings));
        }

        let registries = Self {
            structure_map: VersionedMap::from_entries(map).map_err(seed_error)?,
            land_conforming: VersionedList::from_items(land).map_err(seed_error)?,
            separation: VersionedMap::from_entries(separation).map_err(seed_error)?,
            structures,
        };
        info!(
            "Host registries initialized with {} structures",
            registries.structure_map.len()
        );
        Ok(registries)
    }

    /// Borrows the collections as patch targets.
    #[must_use]
    pub fn targets(&self) -> RegistryTargets<'_> {
        RegistryTargets {
            structure_map: &self.structure_map,
            land_conforming: &self.land_conforming,
            separation: &self.separation,
        }
    }

    /// Borrows the patch targets and the generic registry together.
    pub fn split(&mut self) -> (RegistryTargets<'_>, &mut StructureRegistry) {
        (
            RegistryTargets {
                structure_map: &self.structure_map,
                land_conforming: &self.land_conforming,
                separation: &self.separation,
            },
            &mut self.structures,
        )
    }

    /// Identity to handle map.
    #[must_use]
    pub fn structure_map(&self) -> &VersionedMap<Identity, StructureHandle> {
        &self.structure_map
    }

    /// Land-conforming list.
    #[must_use]
    pub fn land_conforming(&self) -> &VersionedList<StructureHandle> {
        &self.land_conforming
    }

    /// Default separation settings.
    #[must_use]
    pub fn separation(&self) -> &VersionedMap<StructureHandle, SeparationSettings> {
        &self.separation
    }

    /// Generic registry.
    #[must_use]
    pub fn structures(&self) -> &StructureRegistry {
        &self.structures
    }

    /// Generic registry, mutably.
    pub fn structures_mut(&mut self) -> &mut StructureRegistry {
        &mut self.structures
    }
}

fn seed_error(_: AlreadyPresent) -> RegistryError {
    RegistryError::Facility("duplicate entry in host seed data".to_string())
}
