//! Mod setup: declare, materialize, patch, and hook world loads.

use cairn_common::{Identity, RegistryResult, StructureHandle};
use cairn_host::HostEngine;
use cairn_registry::RegistrationDriver;
use tracing::info;

use crate::config::CairnConfig;
use crate::reapply::WorldLoadHook;
use crate::structures::ModStructures;

/// Outcome of [`setup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    /// Registered structures in registration order
    pub registered: Vec<(Identity, StructureHandle)>,
    /// Whether the world-load hook was installed
    pub world_load_hook: bool,
}

/// Registers every declared structure with the host.
///
/// Must run during the host's registration phase. Every descriptor and the
/// patches it will make under its planned handle are checked against the
/// host before the generic registry is touched, so a failed setup leaves the
/// host unchanged.
pub fn setup(
    engine: &mut HostEngine,
    structures: &mut ModStructures,
    config: &CairnConfig,
) -> RegistryResult<SetupReport> {
    let entries: Vec<_> = structures
        .descriptors()?
        .into_iter()
        .map(|(descriptor, declared)| (config.apply_overrides(descriptor), declared))
        .collect();

    {
        let registries = engine.registries();
        let driver = RegistrationDriver::new(registries.targets());
        for (descriptor, declared) in &entries {
            let handle = structures
                .register
                .planned_handle(declared, registries.structures())?;
            driver.preflight_declared(descriptor, declared, handle)?;
        }
    }

    let (targets, facility) = engine.registries_mut().split();
    structures.register.materialize(facility)?;

    let driver = RegistrationDriver::new(targets);
    let mut registered = Vec::with_capacity(entries.len());
    for (descriptor, declared) in &entries {
        let handle = driver.register_declared(descriptor, declared)?;
        registered.push((descriptor.identity.clone(), handle));
    }

    let world_load_hook = config.world_load.reapply_spacing;
    if world_load_hook {
        let handles = registered.iter().map(|(_, handle)| *handle).collect();
        engine.add_world_load_listener(Box::new(WorldLoadHook::new(
            handles,
            config.world_load.skip_flat_overworld,
        )));
    }

    info!(
        "Setup complete: {} structure(s) registered, world-load hook {}",
        registered.len(),
        if world_load_hook { "installed" } else { "disabled" }
    );
    Ok(SetupReport {
        registered,
        world_load_hook,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StructureOverride;
    use crate::structures::{small_pyramid_descriptor, SMALL_PYRAMID_SEED_OFFSET};
    use cairn_common::RegistryError;
    use cairn_host::{DimensionKind, HostRegistries};
    use cairn_registry::{RegistrationFacility, SeparationSettings};

    fn vanilla_engine() -> HostEngine {
        HostEngine::new(HostRegistries::vanilla().expect("seed"))
    }

    fn counts(engine: &HostEngine) -> (usize, usize, usize, usize) {
        let registries = engine.registries();
        (
            registries.structure_map().len(),
            registries.land_conforming().len(),
            registries.separation().len(),
            registries.structures().len(),
        )
    }

    fn pyramid_id() -> Identity {
        small_pyramid_descriptor().expect("descriptor").identity
    }

    #[test]
    fn test_setup_registers_small_pyramid() {
        let mut engine = vanilla_engine();
        let (map, land, separation, generic) = counts(&engine);

        let mut structures = ModStructures::declare().expect("declare");
        let report = setup(&mut engine, &mut structures, &CairnConfig::default()).expect("setup");

        assert_eq!(counts(&engine), (map + 1, land, separation + 1, generic + 1));
        assert_eq!(report.registered.len(), 1);
        assert!(report.world_load_hook);

        let handle = structures.small_pyramid.handle().expect("resolved");
        assert_eq!(report.registered[0], (pyramid_id(), handle));

        let settings = engine
            .registries()
            .separation()
            .get(&handle)
            .expect("settings");
        assert_eq!(settings.min_spacing(), 4);
        assert_eq!(settings.max_spacing(), 32);
        assert_eq!(settings.salt, SMALL_PYRAMID_SEED_OFFSET);
        assert!(!engine.registries().land_conforming().contains(&handle));

        let instance = structures
            .small_pyramid
            .instance(engine.registries().structures())
            .expect("instance");
        assert_eq!(instance.display_name(), "Small Pyramid");
    }

    #[test]
    fn test_setup_twice_fails_without_changes() {
        let mut engine = vanilla_engine();
        let mut first = ModStructures::declare().expect("declare");
        setup(&mut engine, &mut first, &CairnConfig::default()).expect("setup");
        let after_first = counts(&engine);

        let mut second = ModStructures::declare().expect("declare");
        let result = setup(&mut engine, &mut second, &CairnConfig::default());

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateIdentity { .. })
        ));
        assert_eq!(counts(&engine), after_first);
        assert!(!second.register.is_materialized());
    }

    #[test]
    fn test_invalid_override_touches_nothing() {
        let mut engine = vanilla_engine();
        let before = counts(&engine);

        let mut config = CairnConfig::default();
        config.structures.push(StructureOverride {
            identity: pyramid_id(),
            min_spacing: Some(10),
            max_spacing: Some(5),
            seed_offset: None,
            conforms_land: None,
        });

        let mut structures = ModStructures::declare().expect("declare");
        let result = setup(&mut engine, &mut structures, &config);

        assert!(matches!(
            result,
            Err(RegistryError::InvalidSpacing { min: 10, max: 5 })
        ));
        assert_eq!(counts(&engine), before);
        assert!(!structures.small_pyramid.is_resolved());
    }

    #[test]
    fn test_setup_after_registration_closed() {
        let mut engine = vanilla_engine();
        engine.finish_registration();
        let before = counts(&engine);

        let mut structures = ModStructures::declare().expect("declare");
        let result = setup(&mut engine, &mut structures, &CairnConfig::default());

        assert!(matches!(result, Err(RegistryError::Facility(_))));
        assert_eq!(counts(&engine), before);
        assert!(!structures.register.is_materialized());
        assert!(!structures.small_pyramid.is_resolved());
    }

    #[test]
    fn test_planned_handle_collision_touches_nothing() {
        let mut engine = vanilla_engine();
        let planned = engine.registries().structures().next_handle();
        let stale = SeparationSettings::new(16, 8, 3).expect("valid");
        engine
            .registries()
            .separation()
            .append_only(planned, stale)
            .expect("seed");
        let before = counts(&engine);

        let mut structures = ModStructures::declare().expect("declare");
        let result = setup(&mut engine, &mut structures, &CairnConfig::default());

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateHandle { handle }) if handle == planned
        ));
        assert_eq!(counts(&engine), before);
        assert!(!structures.register.is_materialized());
    }

    #[test]
    fn test_land_conforming_override() {
        let mut engine = vanilla_engine();
        let land_before = engine.registries().land_conforming().len();

        let mut config = CairnConfig::default();
        config.structures.push(StructureOverride {
            identity: pyramid_id(),
            min_spacing: None,
            max_spacing: None,
            seed_offset: None,
            conforms_land: Some(true),
        });

        let mut structures = ModStructures::declare().expect("declare");
        setup(&mut engine, &mut structures, &config).expect("setup");

        let handle = structures.small_pyramid.handle().expect("resolved");
        let land = engine.registries().land_conforming().snapshot();
        assert_eq!(land.len(), land_before + 1);
        assert_eq!(land.as_slice().last(), Some(&handle));
    }

    #[test]
    fn test_early_dimension_gets_spacing_on_load() {
        let mut engine = vanilla_engine();
        let custom = Identity::parse("cairn:catacombs").expect("id");
        engine.create_dimension(custom.clone(), DimensionKind::Custom, false);

        let mut structures = ModStructures::declare().expect("declare");
        setup(&mut engine, &mut structures, &CairnConfig::default()).expect("setup");
        engine.finish_registration();
        let handle = structures.small_pyramid.handle().expect("resolved");

        // The dimension copied the defaults before the pyramid existed.
        let before = engine.dimension(&custom).expect("dimension");
        assert!(!before.structures().contains(handle));

        let loaded = engine.load_dimension(&custom).expect("loaded");
        assert!(loaded.structures().contains(handle));
        let size = loaded.structures().len();

        let reloaded = engine.load_dimension(&custom).expect("loaded");
        assert_eq!(reloaded.structures().len(), size);
    }

    #[test]
    fn test_flat_overworld_skipped() {
        let mut engine = vanilla_engine();
        let flat = Identity::parse("overworld").expect("id");
        engine.create_dimension(flat.clone(), DimensionKind::Overworld, true);

        let mut structures = ModStructures::declare().expect("declare");
        setup(&mut engine, &mut structures, &CairnConfig::default()).expect("setup");
        let handle = structures.small_pyramid.handle().expect("resolved");

        let loaded = engine.load_dimension(&flat).expect("loaded");
        assert!(!loaded.structures().contains(handle));
    }

    #[test]
    fn test_reapply_keeps_dimension_overrides() {
        let mut engine = vanilla_engine();
        let nether = Identity::parse("the_nether").expect("id");
        engine.create_dimension(nether.clone(), DimensionKind::Nether, false);

        let mut structures = ModStructures::declare().expect("declare");
        let report = setup(&mut engine, &mut structures, &CairnConfig::default()).expect("setup");
        let handle = report.registered[0].1;

        let custom = SeparationSettings::new(64, 16, 7).expect("valid");
        let hook = WorldLoadHook::new(vec![handle], true);

        let defaults = engine.registries().separation().snapshot();
        let mut dimension = engine.dimension(&nether).expect("dimension").clone();
        dimension.structures_mut().set(handle, custom);

        let applied = hook.reapply(&mut dimension, engine.registries().separation());
        assert_eq!(applied, 0);
        assert_eq!(dimension.structures().get(handle), Some(custom));
        assert_ne!(defaults.get(&handle).copied(), Some(custom));
    }

    #[test]
    fn test_hook_disabled_by_config() {
        let mut engine = vanilla_engine();
        let custom = Identity::parse("cairn:catacombs").expect("id");
        engine.create_dimension(custom.clone(), DimensionKind::Custom, false);

        let mut config = CairnConfig::default();
        config.world_load.reapply_spacing = false;

        let mut structures = ModStructures::declare().expect("declare");
        let report = setup(&mut engine, &mut structures, &config).expect("setup");
        assert!(!report.world_load_hook);

        let handle = report.registered[0].1;
        let loaded = engine.load_dimension(&custom).expect("loaded");
        assert!(!loaded.structures().contains(handle));
    }
}
