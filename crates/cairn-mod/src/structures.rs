//! Structure types added by this mod.

use std::sync::Arc;

use cairn_common::{Identity, RegistryResult};
use cairn_registry::{
    DeclaredStructure, DeferredRegister, GenerationStep, Structure, StructureDescriptor,
    StructureInstance,
};

/// Namespace of every identity this mod registers.
pub const MOD_ID: &str = "cairn";

/// Registry path of the small pyramid. Never rename once published.
pub const SMALL_PYRAMID_PATH: &str = "small_pyramid";

/// Default minimum chunk distance between small pyramid attempts.
pub const SMALL_PYRAMID_MIN_SPACING: i32 = 4;

/// Default maximum chunk distance between small pyramid attempts.
pub const SMALL_PYRAMID_MAX_SPACING: i32 = 32;

/// Placement salt for the small pyramid.
pub const SMALL_PYRAMID_SEED_OFFSET: i32 = 1_038_494_734;

/// A small desert pyramid with a trapped chamber.
///
/// Pieces and placement come from the host; this type only names the
/// generation step.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmallPyramid;

impl Structure for SmallPyramid {
    fn step(&self) -> GenerationStep {
        GenerationStep::SurfaceStructures
    }

    fn display_name(&self) -> &str {
        "Small Pyramid"
    }
}

/// Default descriptor for the small pyramid.
pub fn small_pyramid_descriptor() -> RegistryResult<StructureDescriptor> {
    Ok(StructureDescriptor::new(
        Identity::new(MOD_ID, SMALL_PYRAMID_PATH)?,
        SMALL_PYRAMID_MIN_SPACING,
        SMALL_PYRAMID_MAX_SPACING,
        SMALL_PYRAMID_SEED_OFFSET,
    ))
}

/// Declarations made at mod construction.
#[derive(Debug)]
pub struct ModStructures {
    /// Deferred register for [`MOD_ID`]
    pub register: DeferredRegister,
    /// The small pyramid declaration
    pub small_pyramid: DeclaredStructure,
}

impl ModStructures {
    /// Declares every structure of this mod.
    pub fn declare() -> RegistryResult<Self> {
        let mut register = DeferredRegister::new(MOD_ID)?;
        let small_pyramid = register.declare(SMALL_PYRAMID_PATH, || {
            Arc::new(SmallPyramid) as StructureInstance
        })?;

        Ok(Self {
            register,
            small_pyramid,
        })
    }

    /// Default descriptors, paired with their declarations.
    pub fn descriptors(&self) -> RegistryResult<Vec<(StructureDescriptor, DeclaredStructure)>> {
        Ok(vec![(small_pyramid_descriptor()?, self.small_pyramid.clone())])
    }
}
