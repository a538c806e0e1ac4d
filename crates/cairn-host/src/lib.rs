//! # Cairn Host
//!
//! Stand-in for the host engine's world-generation registries.
//!
//! This crate provides:
//! - The generic structure registry (registration facility)
//! - The structure map, land-conforming list, and default separation table
//! - Dimensions and their per-dimension structure tables
//! - World-load events
//!
//! Only the interfaces mods interact with are modelled; no terrain is
//! generated here.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod dimension;
pub mod engine;
pub mod events;
pub mod facility;
pub mod registries;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::dimension::*;
    pub use crate::engine::*;
    pub use crate::events::*;
    pub use crate::facility::*;
    pub use crate::registries::*;
}

pub use prelude::*;
