//! Shared fixtures for unit tests.

use std::sync::Arc;

use cairn_common::{Identity, RegistryError, RegistryResult, StructureHandle};

use crate::structure::{
    GenerationStep, RegistrationFacility, Structure, StructureFactory, StructureInstance,
};

/// Structure that only carries a name.
#[derive(Debug)]
pub struct Marker(pub &'static str);

impl Structure for Marker {
    fn step(&self) -> GenerationStep {
        GenerationStep::SurfaceStructures
    }

    fn display_name(&self) -> &str {
        self.0
    }
}

/// Constructor for a [`Marker`].
pub fn marker(name: &'static str) -> impl FnOnce() -> StructureInstance + Send + 'static {
    move || Arc::new(Marker(name)) as StructureInstance
}

/// Boxed constructor for a [`Marker`].
pub fn marker_factory(name: &'static str) -> StructureFactory {
    Box::new(marker(name))
}

/// In-memory facility handing out dense handles.
#[derive(Default)]
pub struct TestFacility {
    pub entries: Vec<(Identity, StructureInstance)>,
    pub closed: bool,
}

impl RegistrationFacility for TestFacility {
    fn register(
        &mut self,
        identity: Identity,
        factory: StructureFactory,
    ) -> RegistryResult<StructureHandle> {
        if self.closed {
            return Err(RegistryError::Facility(format!("closed; cannot register {identity}")));
        }
        if self.contains(&identity) {
            return Err(RegistryError::DuplicateIdentity { identity });
        }
        let handle = self.next_handle();
        self.entries.push((identity, factory()));
        Ok(handle)
    }

    fn next_handle(&self) -> StructureHandle {
        StructureHandle::from_raw(self.entries.len() as u32)
    }

    fn is_open(&self) -> bool {
        !self.closed
    }

    fn contains(&self, identity: &Identity) -> bool {
        self.entries.iter().any(|(id, _)| id == identity)
    }

    fn instance(&self, handle: StructureHandle) -> Option<StructureInstance> {
        self.entries
            .get(handle.raw() as usize)
            .map(|(_, s)| Arc::clone(s))
    }
}
