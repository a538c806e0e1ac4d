//! World lifecycle events.

use cairn_common::StructureHandle;
use cairn_registry::{SeparationSettings, VersionedMap};

use crate::dimension::Dimension;

/// Fired when a dimension finishes loading, before chunks generate.
pub struct WorldLoadEvent<'a> {
    dimension: &'a mut Dimension,
    defaults: &'a VersionedMap<StructureHandle, SeparationSettings>,
}

impl<'a> WorldLoadEvent<'a> {
    /// Creates an event.
    pub fn new(
        dimension: &'a mut Dimension,
        defaults: &'a VersionedMap<StructureHandle, SeparationSettings>,
    ) -> Self {
        Self {
            dimension,
            defaults,
        }
    }

    /// The dimension being loaded.
    #[must_use]
    pub fn dimension(&self) -> &Dimension {
        self.dimension
    }

    /// The dimension being loaded, mutably.
    pub fn dimension_mut(&mut self) -> &mut Dimension {
        self.dimension
    }

    /// The current default separation settings.
    #[must_use]
    pub fn defaults(&self) -> &VersionedMap<StructureHandle, SeparationSettings> {
        self.defaults
    }
}

/// Receives world-load events.
pub trait WorldLoadListener: Send {
    /// Called once per dimension load.
    fn on_world_load(&mut self, event: &mut WorldLoadEvent<'_>);
}
