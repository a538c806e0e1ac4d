//! # Cairn Registry
//!
//! Extends host registries that offer no extension API of their own.
//!
//! This crate provides:
//! - Versioned append-only stores with pinned snapshots
//! - The registry patcher (all-or-nothing appends to the host collections)
//! - Structure descriptors and separation settings
//! - Two-phase deferred registration
//! - The registration driver

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod deferred;
pub mod descriptor;
pub mod driver;
pub mod patcher;
pub mod store;
pub mod structure;

#[cfg(test)]
mod test_support;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::deferred::*;
    pub use crate::descriptor::*;
    pub use crate::driver::*;
    pub use crate::patcher::*;
    pub use crate::store::*;
    pub use crate::structure::*;
}

pub use prelude::*;
