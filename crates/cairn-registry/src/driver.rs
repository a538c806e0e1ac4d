//! Registration driver.
//!
//! Sequences the registration of one structure: generic facility first, then
//! the structure map, the land-conforming list, and the separation table.
//! The handle the facility will assign is known up front, so every patch is
//! checked before the facility or any collection is written. A failed
//! registration leaves the facility and all collections exactly as they were.

use cairn_common::{RegistryError, RegistryResult, StructureHandle};
use tracing::{info, warn};

use crate::deferred::DeclaredStructure;
use crate::descriptor::StructureDescriptor;
use crate::patcher::{RegistryPatcher, RegistryTargets};
use crate::structure::{RegistrationFacility, StructureFactory};

/// Registers structures against injected host collections.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationDriver<'a> {
    targets: RegistryTargets<'a>,
}

impl<'a> RegistrationDriver<'a> {
    /// Creates a driver for the given collections.
    #[must_use]
    pub const fn new(targets: RegistryTargets<'a>) -> Self {
        Self { targets }
    }

    /// Returns the target collections.
    #[must_use]
    pub const fn targets(&self) -> RegistryTargets<'a> {
        self.targets
    }

    /// Checks a descriptor against the current collections without writing.
    pub fn preflight(&self, descriptor: &StructureDescriptor) -> RegistryResult<()> {
        descriptor.validate()?;
        if self.targets.structure_map.contains_key(&descriptor.identity) {
            return Err(RegistryError::DuplicateIdentity {
                identity: descriptor.identity.clone(),
            });
        }
        Ok(())
    }

    /// Checks a declaration before it is materialized.
    ///
    /// `handle` is the handle the facility will assign to the declaration,
    /// as reported by [`DeferredRegister::planned_handle`](crate::DeferredRegister::planned_handle).
    pub fn preflight_declared(
        &self,
        descriptor: &StructureDescriptor,
        declared: &DeclaredStructure,
        handle: StructureHandle,
    ) -> RegistryResult<()> {
        ensure_matches(descriptor, declared)?;
        self.preflight(descriptor)?;
        RegistryPatcher::for_structure(descriptor, handle)?.check(&self.targets.lock())
    }

    /// Registers a structure with the facility and patches it into the host.
    pub fn register(
        &self,
        descriptor: &StructureDescriptor,
        factory: StructureFactory,
        facility: &mut dyn RegistrationFacility,
    ) -> RegistryResult<StructureHandle> {
        descriptor.validate()?;
        if !facility.is_open() {
            return Err(RegistryError::Facility(format!(
                "registration closed; cannot register {}",
                descriptor.identity
            )));
        }

        let mut writers = self.targets.lock();
        if writers.has_identity(&descriptor.identity) || facility.contains(&descriptor.identity) {
            warn!("Refusing duplicate structure {}", descriptor.identity);
            return Err(RegistryError::DuplicateIdentity {
                identity: descriptor.identity.clone(),
            });
        }

        let planned = facility.next_handle();
        let patcher = RegistryPatcher::for_structure(descriptor, planned)?;
        patcher.check(&writers)?;

        let handle = facility.register(descriptor.identity.clone(), factory)?;
        if handle != planned {
            return Err(RegistryError::Facility(format!(
                "{} was assigned {handle}, expected {planned}",
                descriptor.identity
            )));
        }
        let report = patcher.apply(&mut writers)?;

        info!(
            "Registered structure {} as {} (spacing {}..{}, salt {}, land conforming: {})",
            descriptor.identity,
            report.handle,
            descriptor.min_spacing,
            descriptor.max_spacing,
            descriptor.seed_offset,
            descriptor.conforms_land
        );
        Ok(report.handle)
    }

    /// Patches an already materialized declaration into the host.
    pub fn register_declared(
        &self,
        descriptor: &StructureDescriptor,
        declared: &DeclaredStructure,
    ) -> RegistryResult<StructureHandle> {
        descriptor.validate()?;
        ensure_matches(descriptor, declared)?;

        let handle = declared.handle()?;
        let report =
            RegistryPatcher::for_structure(descriptor, handle)?.apply(&mut self.targets.lock())?;

        info!(
            "Registered structure {} as {} (spacing {}..{}, salt {}, land conforming: {})",
            descriptor.identity,
            report.handle,
            descriptor.min_spacing,
            descriptor.max_spacing,
            descriptor.seed_offset,
            descriptor.conforms_land
        );
        Ok(report.handle)
    }

    /// Registers a batch in order, stopping at the first failure.
    ///
    /// Each registration is atomic on its own; structures registered before
    /// the failure stay registered.
    pub fn register_all<I>(
        &self,
        entries: I,
        facility: &mut dyn RegistrationFacility,
    ) -> RegistryResult<Vec<StructureHandle>>
    where
        I: IntoIterator<Item = (StructureDescriptor, StructureFactory)>,
    {
        entries
            .into_iter()
            .map(|(descriptor, factory)| self.register(&descriptor, factory, facility))
            .collect()
    }
}

fn ensure_matches(
    descriptor: &StructureDescriptor,
    declared: &DeclaredStructure,
) -> RegistryResult<()> {
    if declared.identity() != &descriptor.identity {
        return Err(RegistryError::IdentityMismatch {
            descriptor: descriptor.identity.clone(),
            declared: declared.identity().clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::DeferredRegister;
    use crate::descriptor::SeparationSettings;
    use crate::store::{VersionedList, VersionedMap};
    use crate::test_support::{marker, marker_factory, TestFacility};
    use cairn_common::Identity;
    use proptest::prelude::*;

    struct Host {
        structure_map: VersionedMap<Identity, StructureHandle>,
        land_conforming: VersionedList<StructureHandle>,
        separation: VersionedMap<StructureHandle, SeparationSettings>,
        facility: TestFacility,
    }

    impl Host {
        fn new() -> Self {
            Self {
                structure_map: VersionedMap::new(),
                land_conforming: VersionedList::new(),
                separation: VersionedMap::new(),
                facility: TestFacility::default(),
            }
        }

        fn register(&mut self, descriptor: &StructureDescriptor) -> RegistryResult<StructureHandle> {
            let driver = RegistrationDriver::new(RegistryTargets {
                structure_map: &self.structure_map,
                land_conforming: &self.land_conforming,
                separation: &self.separation,
            });
            driver.register(descriptor, marker_factory("test"), &mut self.facility)
        }

        fn sizes(&self) -> (usize, usize, usize, usize) {
            (
                self.structure_map.len(),
                self.land_conforming.len(),
                self.separation.len(),
                self.facility.entries.len(),
            )
        }
    }

    fn small_pyramid() -> StructureDescriptor {
        let identity = Identity::parse("sample:small_pyramid").expect("valid identity");
        StructureDescriptor::new(identity, 4, 32, 1_038_494_734)
    }

    #[test]
    fn test_register_small_pyramid() {
        let mut host = Host::new();
        let handle = host.register(&small_pyramid()).expect("register");

        assert_eq!(host.structure_map.len(), 1);
        assert_eq!(host.structure_map.get(&small_pyramid().identity), Some(handle));
        assert!(host.land_conforming.is_empty());

        let settings = host.separation.get(&handle).expect("settings");
        assert_eq!(settings.min_spacing(), 4);
        assert_eq!(settings.max_spacing(), 32);
        assert_eq!(settings.salt, 1_038_494_734);
    }

    #[test]
    fn test_land_conforming_member_once() {
        let mut host = Host::new();
        let handle = host
            .register(&small_pyramid().with_land_conforming(true))
            .expect("register");

        let members: Vec<_> = host.land_conforming.snapshot().iter().copied().collect();
        assert_eq!(members, vec![handle]);
    }

    #[test]
    fn test_duplicate_identity_leaves_collections_untouched() {
        let mut host = Host::new();
        host.register(&small_pyramid()).expect("first register");
        let after_first = host.sizes();
        let versions = (host.structure_map.version(), host.separation.version());

        let result = host.register(&small_pyramid().with_land_conforming(true));

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateIdentity { .. })
        ));
        assert_eq!(host.sizes(), after_first);
        assert_eq!(
            (host.structure_map.version(), host.separation.version()),
            versions
        );
    }

    #[test]
    fn test_invalid_spacing_touches_nothing() {
        let mut host = Host::new();
        let result = host.register(&small_pyramid().with_spacing(10, 5, 1_038_494_734));

        assert!(matches!(
            result,
            Err(RegistryError::InvalidSpacing { min: 10, max: 5 })
        ));
        assert_eq!(host.sizes(), (0, 0, 0, 0));
    }

    #[test]
    fn test_identity_known_to_facility_only() {
        let mut host = Host::new();
        host.facility
            .register(small_pyramid().identity, marker_factory("other mod"))
            .expect("seed");

        let result = host.register(&small_pyramid());

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateIdentity { .. })
        ));
        assert_eq!(host.sizes(), (0, 0, 0, 1));
    }

    #[test]
    fn test_handle_with_settings_leaves_facility_untouched() {
        let mut host = Host::new();
        let stale = SeparationSettings::new(12, 4, 99).expect("valid");
        host.separation
            .append_only(StructureHandle::from_raw(0), stale)
            .expect("seed");

        let result = host.register(&small_pyramid());

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateHandle { handle }) if handle.raw() == 0
        ));
        assert_eq!(host.sizes(), (0, 0, 1, 0));
        assert_eq!(host.separation.get(&StructureHandle::from_raw(0)), Some(stale));
    }

    #[test]
    fn test_land_member_collision_leaves_facility_untouched() {
        let mut host = Host::new();
        host.land_conforming
            .append_only(StructureHandle::from_raw(0))
            .expect("seed");

        let result = host.register(&small_pyramid().with_land_conforming(true));

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateMember { .. })
        ));
        assert_eq!(host.sizes(), (0, 1, 0, 0));
    }

    #[test]
    fn test_closed_facility_touches_nothing() {
        let mut host = Host::new();
        host.facility.closed = true;

        let result = host.register(&small_pyramid());

        assert!(matches!(result, Err(RegistryError::Facility(_))));
        assert_eq!(host.sizes(), (0, 0, 0, 0));
    }

    #[test]
    fn test_preflight_declared_checks_planned_handle() {
        let host = Host::new();
        let mut deferred = DeferredRegister::new("sample").expect("namespace");
        let declared = deferred.declare("small_pyramid", marker("pyramid")).expect("declare");
        let other = deferred.declare("watchtower", marker("tower")).expect("declare");

        let driver = RegistrationDriver::new(RegistryTargets {
            structure_map: &host.structure_map,
            land_conforming: &host.land_conforming,
            separation: &host.separation,
        });
        let planned = deferred
            .planned_handle(&declared, &host.facility)
            .expect("planned");
        assert!(driver
            .preflight_declared(&small_pyramid(), &declared, planned)
            .is_ok());
        assert!(matches!(
            driver.preflight_declared(&small_pyramid(), &other, planned),
            Err(RegistryError::IdentityMismatch { .. })
        ));

        host.separation
            .append_only(planned, SeparationSettings::new(8, 2, 0).expect("valid"))
            .expect("seed");
        assert!(matches!(
            driver.preflight_declared(&small_pyramid(), &declared, planned),
            Err(RegistryError::DuplicateHandle { .. })
        ));
    }

    #[test]
    fn test_preflight() {
        let mut host = Host::new();
        let targets = RegistryTargets {
            structure_map: &host.structure_map,
            land_conforming: &host.land_conforming,
            separation: &host.separation,
        };
        assert!(RegistrationDriver::new(targets).preflight(&small_pyramid()).is_ok());

        host.register(&small_pyramid()).expect("register");
        let targets = RegistryTargets {
            structure_map: &host.structure_map,
            land_conforming: &host.land_conforming,
            separation: &host.separation,
        };
        assert!(RegistrationDriver::new(targets).preflight(&small_pyramid()).is_err());
    }

    #[test]
    fn test_register_declared() {
        let mut host = Host::new();
        let mut deferred = DeferredRegister::new("sample").expect("namespace");
        let declared = deferred.declare("small_pyramid", marker("pyramid")).expect("declare");
        let other = deferred.declare("watchtower", marker("tower")).expect("declare");

        let driver = RegistrationDriver::new(RegistryTargets {
            structure_map: &host.structure_map,
            land_conforming: &host.land_conforming,
            separation: &host.separation,
        });

        assert!(matches!(
            driver.register_declared(&small_pyramid(), &declared),
            Err(RegistryError::NotMaterialized { .. })
        ));

        deferred.materialize(&mut host.facility).expect("materialize");

        assert!(matches!(
            driver.register_declared(&small_pyramid(), &other),
            Err(RegistryError::IdentityMismatch { .. })
        ));

        let handle = driver
            .register_declared(&small_pyramid(), &declared)
            .expect("register");
        assert_eq!(Some(handle), host.structure_map.get(&small_pyramid().identity));
        assert_eq!(host.separation.len(), 1);
    }

    #[test]
    fn test_register_all_stops_at_first_failure() {
        let mut host = Host::new();
        let tower = StructureDescriptor::new(
            Identity::parse("sample:watchtower").expect("identity"),
            8,
            24,
            14_357_617,
        );
        let broken = small_pyramid().with_spacing(5, 5, 0);

        let driver = RegistrationDriver::new(RegistryTargets {
            structure_map: &host.structure_map,
            land_conforming: &host.land_conforming,
            separation: &host.separation,
        });
        let result = driver.register_all(
            vec![
                (tower.clone(), marker_factory("tower")),
                (broken, marker_factory("broken")),
            ],
            &mut host.facility,
        );

        assert!(result.is_err());
        assert!(host.structure_map.contains_key(&tower.identity));
        assert_eq!(host.structure_map.len(), 1);
    }

    #[test]
    fn test_stale_reader_observes_old_snapshot() {
        let mut host = Host::new();
        let early = host.separation.snapshot();

        let handle = host.register(&small_pyramid()).expect("register");

        assert!(!host.separation.is_current(&early));
        assert!(early.get(&handle).is_none());
        assert!(host.separation.snapshot().get(&handle).is_some());
    }

    fn descriptor_for(index: usize, min: i32, gap: i32) -> StructureDescriptor {
        let identity = Identity::new("sample", format!("structure_{index}")).expect("identity");
        StructureDescriptor::new(identity, min, min + gap, index as i32)
    }

    proptest! {
        #[test]
        fn prop_registration_order_preserved(
            spacings in proptest::collection::vec((0..64_i32, 1..64_i32), 1..24)
        ) {
            let mut host = Host::new();
            let descriptors: Vec<_> = spacings
                .iter()
                .enumerate()
                .map(|(i, &(min, gap))| descriptor_for(i, min, gap))
                .collect();

            for descriptor in &descriptors {
                host.register(descriptor).expect("register");
            }

            let snapshot = host.structure_map.snapshot();
            let registered: Vec<_> = snapshot.keys().cloned().collect();
            let expected: Vec<_> = descriptors.iter().map(|d| d.identity.clone()).collect();
            prop_assert_eq!(registered, expected);
        }

        #[test]
        fn prop_existing_entries_unchanged(
            spacings in proptest::collection::vec((0..64_i32, 1..64_i32), 2..16)
        ) {
            let mut host = Host::new();
            let (first, rest) = spacings.split_first().expect("non-empty");

            let seed = descriptor_for(0, first.0, first.1);
            let seed_handle = host.register(&seed).expect("register");
            let seed_settings = host.separation.get(&seed_handle).expect("settings");

            for (i, &(min, gap)) in rest.iter().enumerate() {
                host.register(&descriptor_for(i + 1, min, gap)).expect("register");
            }

            prop_assert_eq!(host.structure_map.get(&seed.identity), Some(seed_handle));
            prop_assert_eq!(host.separation.get(&seed_handle), Some(seed_settings));
        }
    }
}
