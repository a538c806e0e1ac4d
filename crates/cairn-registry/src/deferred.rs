//! Two-phase deferred registration.
//!
//! Structures are declared during mod construction and materialized once,
//! later, when the host opens its registries. Declaration records a
//! constructor; materialization runs every constructor in declaration order
//! and resolves each [`DeclaredStructure`] to its handle.

use std::sync::{Arc, OnceLock};

use ahash::AHashMap;
use cairn_common::{Identity, RegistryError, RegistryResult, StructureHandle};
use tracing::{debug, info};

use crate::structure::{RegistrationFacility, StructureFactory, StructureInstance};

/// Reference to a declared structure, resolved at materialization.
#[derive(Debug, Clone)]
pub struct DeclaredStructure {
    identity: Identity,
    resolved: Arc<OnceLock<StructureHandle>>,
}

impl DeclaredStructure {
    /// Returns the declared identity.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns the handle assigned by the host.
    pub fn handle(&self) -> RegistryResult<StructureHandle> {
        self.resolved
            .get()
            .copied()
            .ok_or_else(|| RegistryError::NotMaterialized {
                identity: self.identity.clone(),
            })
    }

    /// Checks whether the declaration has been materialized.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Gets the constructed instance from the facility.
    pub fn instance(
        &self,
        facility: &dyn RegistrationFacility,
    ) -> RegistryResult<StructureInstance> {
        let handle = self.handle()?;
        facility.instance(handle).ok_or_else(|| {
            RegistryError::Facility(format!("no instance for {} ({handle})", self.identity))
        })
    }
}

/// A pending declaration.
struct Pending {
    declared: DeclaredStructure,
    constructor: Option<StructureFactory>,
}

/// Collects declarations for one namespace until the host materializes them.
pub struct DeferredRegister {
    namespace: String,
    pending: Vec<Pending>,
    by_identity: AHashMap<Identity, usize>,
    materialized: bool,
}

impl std::fmt::Debug for DeferredRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredRegister")
            .field("namespace", &self.namespace)
            .field("declared", &self.pending.len())
            .field("materialized", &self.materialized)
            .finish()
    }
}

impl DeferredRegister {
    /// Creates a register for a namespace (usually the mod id).
    pub fn new(namespace: impl Into<String>) -> RegistryResult<Self> {
        let namespace = namespace.into();
        Identity::validate_namespace(&namespace)?;

        Ok(Self {
            namespace,
            pending: Vec::new(),
            by_identity: AHashMap::new(),
            materialized: false,
        })
    }

    /// Returns the namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Declares `namespace:path` with a deferred constructor.
    pub fn declare<F>(&mut self, path: &str, constructor: F) -> RegistryResult<DeclaredStructure>
    where
        F: FnOnce() -> StructureInstance + Send + 'static,
    {
        if self.materialized {
            return Err(RegistryError::AlreadyMaterialized);
        }

        let identity = Identity::new(self.namespace.as_str(), path)?;
        if self.by_identity.contains_key(&identity) {
            return Err(RegistryError::DuplicateIdentity { identity });
        }

        let declared = DeclaredStructure {
            identity: identity.clone(),
            resolved: Arc::new(OnceLock::new()),
        };
        self.by_identity.insert(identity, self.pending.len());
        self.pending.push(Pending {
            declared: declared.clone(),
            constructor: Some(Box::new(constructor)),
        });

        debug!("Declared structure {}", declared.identity);
        Ok(declared)
    }

    /// Gets a declaration by identity.
    #[must_use]
    pub fn get(&self, identity: &Identity) -> Option<&DeclaredStructure> {
        self.by_identity
            .get(identity)
            .map(|&i| &self.pending[i].declared)
    }

    /// Handle the facility will assign to `declared` when this register
    /// materializes.
    pub fn planned_handle(
        &self,
        declared: &DeclaredStructure,
        facility: &dyn RegistrationFacility,
    ) -> RegistryResult<StructureHandle> {
        if self.materialized {
            return Err(RegistryError::AlreadyMaterialized);
        }
        let index = self
            .by_identity
            .get(&declared.identity)
            .copied()
            .filter(|&i| Arc::ptr_eq(&self.pending[i].declared.resolved, &declared.resolved))
            .ok_or_else(|| RegistryError::UndeclaredStructure {
                identity: declared.identity.clone(),
            })?;

        u32::try_from(index)
            .ok()
            .and_then(|offset| facility.next_handle().raw().checked_add(offset))
            .map(StructureHandle::from_raw)
            .ok_or_else(|| RegistryError::Facility("structure handles exhausted".to_string()))
    }

    /// Returns the number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Checks if nothing was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Checks whether materialization has run.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    /// Registers every declaration with the facility, in declaration order.
    ///
    /// A closed facility or an identity collision aborts before anything is
    /// registered and leaves the register unmaterialized. Once registering
    /// starts, materialization counts as done: a facility failure part-way
    /// is unrecoverable.
    pub fn materialize(
        &mut self,
        facility: &mut dyn RegistrationFacility,
    ) -> RegistryResult<Vec<StructureHandle>> {
        if self.materialized {
            return Err(RegistryError::AlreadyMaterialized);
        }
        if !facility.is_open() {
            return Err(RegistryError::Facility(format!(
                "registration closed; cannot materialize namespace {}",
                self.namespace
            )));
        }

        if let Some(taken) = self
            .pending
            .iter()
            .find(|p| facility.contains(&p.declared.identity))
        {
            return Err(RegistryError::DuplicateIdentity {
                identity: taken.declared.identity.clone(),
            });
        }

        self.materialized = true;

        let mut handles = Vec::with_capacity(self.pending.len());
        for pending in &mut self.pending {
            let constructor = pending
                .constructor
                .take()
                .ok_or(RegistryError::AlreadyMaterialized)?;
            let handle = facility.register(pending.declared.identity.clone(), constructor)?;
            pending
                .declared
                .resolved
                .set(handle)
                .map_err(|_| RegistryError::AlreadyMaterialized)?;
            handles.push(handle);
        }

        info!(
            "Materialized {} structure(s) in namespace {}",
            handles.len(),
            self.namespace
        );
        Ok(handles)
    }
}
