//! The host's generic structure registry.

use std::sync::Arc;

use ahash::AHashMap;
use cairn_common::{Identity, RegistryError, RegistryResult, StructureHandle};
use cairn_registry::{
    GenerationStep, RegistrationFacility, Structure, StructureFactory, StructureInstance,
};
use tracing::debug;

/// Structure type shipped with the host.
#[derive(Debug, Clone)]
pub struct VanillaStructure {
    name: String,
    step: GenerationStep,
}

impl VanillaStructure {
    /// Creates a vanilla structure.
    #[must_use]
    pub fn new(name: impl Into<String>, step: GenerationStep) -> Self {
        Self {
            name: name.into(),
            step,
        }
    }
}

impl Structure for VanillaStructure {
    fn step(&self) -> GenerationStep {
        self.step
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// Generic registry handing out dense handles in registration order.
///
/// The registry is open while mods load and frozen afterwards; registering
/// into a frozen registry is rejected.
#[derive(Debug, Default)]
pub struct StructureRegistry {
    /// Registered instances, indexed by handle
    entries: Vec<(Identity, StructureInstance)>,
    /// Identity to handle
    by_identity: AHashMap<Identity, StructureHandle>,
    /// Whether registration has closed
    frozen: bool,
}

impl StructureRegistry {
    /// Creates an empty, open registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes the registry to further registration.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Checks whether registration has closed.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Looks up the identity behind a handle.
    #[must_use]
    pub fn identity_of(&self, handle: StructureHandle) -> Option<&Identity> {
        self.entries.get(handle.raw() as usize).map(|(id, _)| id)
    }

    /// Returns the number of registered structures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RegistrationFacility for StructureRegistry {
    fn register(
        &mut self,
        identity: Identity,
        factory: StructureFactory,
    ) -> RegistryResult<StructureHandle> {
        if self.frozen {
            return Err(RegistryError::Facility(format!(
                "structure registry is frozen; cannot register {identity}"
            )));
        }
        if self.by_identity.contains_key(&identity) {
            return Err(RegistryError::DuplicateIdentity { identity });
        }

        let handle = self.next_handle();
        let instance = factory();
        debug!("Structure registry: {identity} -> {handle} ({})", instance.display_name());

        self.by_identity.insert(identity.clone(), handle);
        self.entries.push((identity, instance));
        Ok(handle)
    }

    fn next_handle(&self) -> StructureHandle {
        StructureHandle::from_raw(self.entries.len() as u32)
    }

    fn is_open(&self) -> bool {
        !self.frozen
    }

    fn contains(&self, identity: &Identity) -> bool {
        self.by_identity.contains_key(identity)
    }

    fn instance(&self, handle: StructureHandle) -> Option<StructureInstance> {
        self.entries
            .get(handle.raw() as usize)
            .map(|(_, instance)| Arc::clone(instance))
    }
}
