//! Error types for Cairn.

use thiserror::Error;

use crate::ids::{Identity, StructureHandle};

/// Errors raised while registering structures or patching host registries.
///
/// Every variant is fatal at startup: registration is deterministic, so a
/// retry would hit the same precondition again.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The identity is already present in the target registry
    #[error("Duplicate structure identity: {identity}")]
    DuplicateIdentity {
        /// The colliding identity
        identity: Identity,
    },

    /// Spacing is negative or not strictly increasing
    #[error("Invalid spacing: min {min} must be >= 0 and less than max {max}")]
    InvalidSpacing {
        /// Minimum chunk distance between placement attempts
        min: i32,
        /// Maximum chunk distance between placement attempts
        max: i32,
    },

    /// The handle already has separation settings
    #[error("Separation settings already present for handle {handle}")]
    DuplicateHandle {
        /// The colliding handle
        handle: StructureHandle,
    },

    /// The handle is already a member of the land-conforming list
    #[error("Handle {handle} is already land-conforming")]
    DuplicateMember {
        /// The colliding handle
        handle: StructureHandle,
    },

    /// Malformed identity
    #[error("Invalid identity: {0}")]
    InvalidIdentity(#[from] IdentityError),

    /// Declaration or materialization attempted after materialization
    #[error("Deferred register already materialized")]
    AlreadyMaterialized,

    /// A declared structure was resolved before materialization
    #[error("Structure {identity} has not been materialized yet")]
    NotMaterialized {
        /// Identity of the unresolved declaration
        identity: Identity,
    },

    /// A descriptor was paired with another structure's declaration
    #[error("Descriptor {descriptor} does not match declaration {declared}")]
    IdentityMismatch {
        /// Identity named by the descriptor
        descriptor: Identity,
        /// Identity of the declaration
        declared: Identity,
    },

    /// The declaration does not belong to this register
    #[error("Structure {identity} was not declared here")]
    UndeclaredStructure {
        /// Identity of the foreign declaration
        identity: Identity,
    },

    /// The host's registration facility rejected the entry
    #[error("Registration facility error: {0}")]
    Facility(String),
}

/// Identity parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Namespace part is empty
    #[error("namespace is empty")]
    EmptyNamespace,

    /// Path part is empty
    #[error("path is empty")]
    EmptyPath,

    /// Namespace contains a character outside `[a-z0-9_.-]`
    #[error("invalid character {found:?} in namespace {namespace:?}")]
    InvalidNamespaceChar {
        /// Offending namespace
        namespace: String,
        /// First invalid character
        found: char,
    },

    /// Path contains a character outside `[a-z0-9_.-/]`
    #[error("invalid character {found:?} in path {path:?}")]
    InvalidPathChar {
        /// Offending path
        path: String,
        /// First invalid character
        found: char,
    },
}

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
