//! Late-binding re-apply of separation settings on world load.
//!
//! Known early readers of the default separation table:
//! - per-dimension structure tables, which copy the defaults when the
//!   dimension is created (code-made dimensions are created before mods
//!   finish registering)
//!
//! Such copies never see structures appended afterwards. The hook below
//! fills the gap each time a dimension loads.

use cairn_common::StructureHandle;
use cairn_host::{Dimension, DimensionKind, WorldLoadEvent, WorldLoadListener};
use cairn_registry::{MapSnapshot, SeparationSettings, VersionedMap};
use tracing::{debug, info};

/// Re-applies this mod's spacing into dimensions as they load.
#[derive(Debug, Clone)]
pub struct WorldLoadHook {
    /// Structures owned by this mod
    handles: Vec<StructureHandle>,
    /// Leave superflat overworlds alone
    skip_flat_overworld: bool,
}

impl WorldLoadHook {
    /// Creates a hook for the given structures.
    #[must_use]
    pub fn new(handles: Vec<StructureHandle>, skip_flat_overworld: bool) -> Self {
        Self {
            handles,
            skip_flat_overworld,
        }
    }

    /// Checks whether the dimension is excluded.
    #[must_use]
    pub fn skips(&self, dimension: &Dimension) -> bool {
        self.skip_flat_overworld && dimension.is_flat() && dimension.kind() == DimensionKind::Overworld
    }

    /// Inserts default settings the dimension is missing.
    ///
    /// Settings the dimension already carries are never overwritten.
    /// Returns the number of entries inserted.
    pub fn reapply(
        &self,
        dimension: &mut Dimension,
        defaults: &VersionedMap<StructureHandle, SeparationSettings>,
    ) -> usize {
        self.reapply_from(dimension, &defaults.snapshot())
    }

    fn reapply_from(
        &self,
        dimension: &mut Dimension,
        defaults: &MapSnapshot<StructureHandle, SeparationSettings>,
    ) -> usize {
        if self.skips(dimension) {
            debug!("Skipping flat dimension {}", dimension.id());
            return 0;
        }

        let table = dimension.structures_mut();
        let mut applied = 0;
        for &handle in &self.handles {
            if let Some(&settings) = defaults.get(&handle) {
                if table.insert_if_absent(handle, settings) {
                    applied += 1;
                }
            }
        }

        if applied > 0 {
            info!(
                "Re-applied {applied} structure spacing(s) into {}",
                dimension.id()
            );
        }
        applied
    }
}

impl WorldLoadListener for WorldLoadHook {
    fn on_world_load(&mut self, event: &mut WorldLoadEvent<'_>) {
        let defaults = event.defaults().snapshot();
        self.reapply_from(event.dimension_mut(), &defaults);
    }
}
