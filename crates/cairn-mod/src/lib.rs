//! # Cairn
//!
//! Adds the small pyramid structure to the host's world generation.
//!
//! This crate handles:
//! - Declaring the mod's structures
//! - Spacing overrides from `cairn.toml`
//! - Patching the host's structure collections during startup
//! - Re-applying spacing into dimensions as they load

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod reapply;
pub mod setup;
pub mod structures;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::reapply::*;
    pub use crate::setup::*;
    pub use crate::structures::*;
}

pub use prelude::*;
