//! Host engine lifecycle: registration phase, dimensions, world loads.

use cairn_common::Identity;
use tracing::{info, warn};

use crate::dimension::{Dimension, DimensionKind};
use crate::events::{WorldLoadEvent, WorldLoadListener};
use crate::registries::HostRegistries;

/// Startup phase of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPhase {
    /// Mods may register structures
    Registration,
    /// Registries are frozen, worlds may load
    Running,
}

/// Minimal host: owns the registries, dimensions, and world-load listeners.
pub struct HostEngine {
    registries: HostRegistries,
    dimensions: Vec<Dimension>,
    listeners: Vec<Box<dyn WorldLoadListener>>,
    phase: HostPhase,
}

impl std::fmt::Debug for HostEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostEngine")
            .field("registries", &self.registries)
            .field("dimensions", &self.dimensions.len())
            .field("listeners", &self.listeners.len())
            .field("phase", &self.phase)
            .finish()
    }
}

impl HostEngine {
    /// Creates a host in the registration phase.
    #[must_use]
    pub fn new(registries: HostRegistries) -> Self {
        Self {
            registries,
            dimensions: Vec::new(),
            listeners: Vec::new(),
            phase: HostPhase::Registration,
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> HostPhase {
        self.phase
    }

    /// Registries.
    #[must_use]
    pub fn registries(&self) -> &HostRegistries {
        &self.registries
    }

    /// Registries, mutably.
    pub fn registries_mut(&mut self) -> &mut HostRegistries {
        &mut self.registries
    }

    /// Subscribes to world-load events.
    pub fn add_world_load_listener(&mut self, listener: Box<dyn WorldLoadListener>) {
        self.listeners.push(listener);
    }

    /// Ends the registration phase and freezes the generic registry.
    pub fn finish_registration(&mut self) {
        self.registries.structures_mut().freeze();
        self.phase = HostPhase::Running;
        info!(
            "Registration closed with {} structures",
            self.registries.structure_map().len()
        );
    }

    /// Creates a dimension, copying the current default structure settings.
    ///
    /// Dimensions created during the registration phase may miss
    /// structures registered after them.
    pub fn create_dimension(&mut self, id: Identity, kind: DimensionKind, flat: bool) -> &Dimension {
        if self.phase == HostPhase::Registration {
            warn!("Dimension {id} created before registration closed");
        }
        let dimension = Dimension::new(id, kind, flat, self.registries.separation());
        self.dimensions.push(dimension);
        &self.dimensions[self.dimensions.len() - 1]
    }

    /// Loads a dimension, firing world-load listeners in subscription order.
    pub fn load_dimension(&mut self, id: &Identity) -> Option<&Dimension> {
        let index = self.dimensions.iter().position(|d| d.id() == id)?;

        let defaults = self.registries.separation();
        for listener in &mut self.listeners {
            let mut event = WorldLoadEvent::new(&mut self.dimensions[index], defaults);
            listener.on_world_load(&mut event);
        }

        info!("Loaded dimension {id}");
        self.dimensions.get(index)
    }

    /// Gets a dimension by id.
    #[must_use]
    pub fn dimension(&self, id: &Identity) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.id() == id)
    }

    /// Iterates dimensions in creation order.
    pub fn dimensions(&self) -> impl Iterator<Item = &Dimension> {
        self.dimensions.iter()
    }
}
