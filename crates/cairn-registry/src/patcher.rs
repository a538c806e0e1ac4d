//! Additive patches against the host's structure collections.
//!
//! A structure becomes known to the host through three independent
//! collections. [`RegistryPatcher`] plans one append per collection, checks
//! every append against the locked collections, and only then applies them,
//! so a rejected patch never leaves a structure half-registered.

use cairn_common::{Identity, RegistryError, RegistryResult, StructureHandle};
use tracing::debug;

use crate::descriptor::{SeparationSettings, StructureDescriptor};
use crate::store::{ListWriter, MapWriter, VersionedList, VersionedMap};

/// The host collections touched by a structure registration.
#[derive(Debug, Clone, Copy)]
pub struct RegistryTargets<'a> {
    /// Identity to handle
    pub structure_map: &'a VersionedMap<Identity, StructureHandle>,
    /// Handles whose footprint reshapes terrain
    pub land_conforming: &'a VersionedList<StructureHandle>,
    /// Handle to placement settings
    pub separation: &'a VersionedMap<StructureHandle, SeparationSettings>,
}

impl<'a> RegistryTargets<'a> {
    /// Takes the write side of all three collections.
    ///
    /// Locks are always taken in the same order: structure map, land list,
    /// separation table.
    pub fn lock(&self) -> TargetWriters<'a> {
        TargetWriters {
            structure_map: self.structure_map.write(),
            land_conforming: self.land_conforming.write(),
            separation: self.separation.write(),
        }
    }
}

/// Exclusive access to every target collection.
pub struct TargetWriters<'a> {
    structure_map: MapWriter<'a, Identity, StructureHandle>,
    land_conforming: ListWriter<'a, StructureHandle>,
    separation: MapWriter<'a, StructureHandle, SeparationSettings>,
}

impl TargetWriters<'_> {
    /// Checks whether the identity is already mapped.
    #[must_use]
    pub fn has_identity(&self, identity: &Identity) -> bool {
        self.structure_map.contains_key(identity)
    }
}

/// One planned append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    /// Map the identity to its handle
    StructureMap {
        /// New key
        identity: Identity,
        /// Value
        handle: StructureHandle,
    },
    /// Append the handle to the land-conforming list
    LandConforming {
        /// New member
        handle: StructureHandle,
    },
    /// Record the handle's placement settings
    Separation {
        /// New key
        handle: StructureHandle,
        /// Value
        settings: SeparationSettings,
    },
}

impl Patch {
    /// Checks the patch would not overwrite anything.
    pub fn check(&self, writers: &TargetWriters<'_>) -> RegistryResult<()> {
        match self {
            Self::StructureMap { identity, .. } => {
                if writers.structure_map.contains_key(identity) {
                    return Err(RegistryError::DuplicateIdentity {
                        identity: identity.clone(),
                    });
                }
            },
            Self::LandConforming { handle } => {
                if writers.land_conforming.contains(handle) {
                    return Err(RegistryError::DuplicateMember { handle: *handle });
                }
            },
            Self::Separation { handle, .. } => {
                if writers.separation.contains_key(handle) {
                    return Err(RegistryError::DuplicateHandle { handle: *handle });
                }
            },
        }
        Ok(())
    }

    /// Applies the patch, returning the collection's new version.
    fn apply(self, writers: &mut TargetWriters<'_>) -> RegistryResult<u64> {
        match self {
            Self::StructureMap { identity, handle } => writers
                .structure_map
                .append(identity.clone(), handle)
                .map_err(|_| RegistryError::DuplicateIdentity { identity }),
            Self::LandConforming { handle } => writers
                .land_conforming
                .append(handle)
                .map_err(|_| RegistryError::DuplicateMember { handle }),
            Self::Separation { handle, settings } => writers
                .separation
                .append(handle, settings)
                .map_err(|_| RegistryError::DuplicateHandle { handle }),
        }
    }
}

/// Versions published by a successful patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchReport {
    /// Handle that was patched in
    pub handle: StructureHandle,
    /// Structure map version after the append
    pub structure_map_version: u64,
    /// Land list version after the append, if the structure conforms land
    pub land_conforming_version: Option<u64>,
    /// Separation table version after the append
    pub separation_version: u64,
}

/// Ordered set of appends registering one structure with the host.
#[derive(Debug, Clone)]
pub struct RegistryPatcher {
    handle: StructureHandle,
    patches: Vec<Patch>,
}

impl RegistryPatcher {
    /// Plans the patches for a descriptor already registered under `handle`.
    pub fn for_structure(
        descriptor: &StructureDescriptor,
        handle: StructureHandle,
    ) -> RegistryResult<Self> {
        let settings = descriptor.separation()?;

        let mut patches = Vec::with_capacity(3);
        patches.push(Patch::StructureMap {
            identity: descriptor.identity.clone(),
            handle,
        });
        if descriptor.conforms_land {
            patches.push(Patch::LandConforming { handle });
        }
        patches.push(Patch::Separation { handle, settings });

        Ok(Self { handle, patches })
    }

    /// Returns the planned patches in application order.
    #[must_use]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Checks every patch without applying any.
    pub fn check(&self, writers: &TargetWriters<'_>) -> RegistryResult<()> {
        self.patches.iter().try_for_each(|patch| patch.check(writers))
    }

    /// Checks, then applies every patch.
    pub fn apply(self, writers: &mut TargetWriters<'_>) -> RegistryResult<PatchReport> {
        self.check(writers)?;

        let mut report = PatchReport {
            handle: self.handle,
            structure_map_version: 0,
            land_conforming_version: None,
            separation_version: 0,
        };

        for patch in self.patches {
            match patch {
                Patch::StructureMap { .. } => {
                    report.structure_map_version = patch.apply(writers)?;
                },
                Patch::LandConforming { .. } => {
                    report.land_conforming_version = Some(patch.apply(writers)?);
                },
                Patch::Separation { .. } => {
                    report.separation_version = patch.apply(writers)?;
                },
            }
        }

        debug!(
            "Patched handle {}: structure map v{}, separation v{}",
            report.handle, report.structure_map_version, report.separation_version
        );
        Ok(report)
    }
}
