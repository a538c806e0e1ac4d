//! Structure instances and the host's generic registration facility.

use std::fmt;
use std::sync::Arc;

use cairn_common::{Identity, RegistryResult, StructureHandle};
use serde::{Deserialize, Serialize};

/// Decoration stage in which the host places a structure's pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationStep {
    /// Carved before surface decoration
    UndergroundStructures,
    /// Placed on the surface (pyramids, villages)
    SurfaceStructures,
    /// Placed while strongholds are generated
    StrongholdStructures,
}

/// A structure type the host can place.
///
/// Piece assembly and placement stay inside the host; implementors only
/// describe themselves.
pub trait Structure: Send + Sync + fmt::Debug {
    /// Stage in which the structure generates.
    fn step(&self) -> GenerationStep;

    /// Human-readable name used in logs.
    fn display_name(&self) -> &str;
}

/// Shared structure instance.
pub type StructureInstance = Arc<dyn Structure>;

/// Zero-argument constructor invoked when the host materializes entries.
pub type StructureFactory = Box<dyn FnOnce() -> StructureInstance + Send>;

/// Host-side generic registry that hands out handles.
///
/// Handles are dense: a successful [`register`](Self::register) assigns
/// exactly [`next_handle`](Self::next_handle), and each later registration
/// the following one. Callers rely on this to check handle-keyed patches
/// before the facility commits anything.
pub trait RegistrationFacility {
    /// Registers an identity, constructing its instance.
    fn register(
        &mut self,
        identity: Identity,
        factory: StructureFactory,
    ) -> RegistryResult<StructureHandle>;

    /// Handle the next successful registration will receive.
    fn next_handle(&self) -> StructureHandle;

    /// Checks whether the facility still accepts registrations.
    fn is_open(&self) -> bool;

    /// Checks whether the identity is already registered.
    fn contains(&self, identity: &Identity) -> bool;

    /// Gets the instance behind a handle.
    fn instance(&self, handle: StructureHandle) -> Option<StructureInstance>;
}
