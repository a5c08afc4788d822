//! Error Types
//!
//! This module defines the error types used by the attachment core.
//!
//! # Overview
//!
//! The main error type [`AttachError`] covers the failure modes of binding
//! an attachable to a character's skeleton:
//! - Target resolution failures (character, skeleton, bone)
//! - Content failures while cloning the source model
//! - Stale scene handles
//! - Settings parsing errors
//!
//! Resolution failures are normally not surfaced to the user: the lifecycle
//! treats them as "not yet" and retries on the next relevant change.
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, AttachError>`.
//!
//! ```rust,ignore
//! use myth_attach::errors::{AttachError, Result};
//!
//! fn resolve() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::store::ObjectId;

/// The main error type for attachable binding and synchronization.
#[derive(Error, Debug)]
pub enum AttachError {
    // ========================================================================
    // Target Resolution Errors
    // ========================================================================
    /// No direct child of the scene carries the target character identifier.
    #[error("Character not found in scene: {0}")]
    CharacterUnresolved(ObjectId),

    /// The character exists but has no skinned mesh / skeleton to bind to.
    #[error("Character {0} has no skinned mesh with a skeleton")]
    SkeletonUnresolved(ObjectId),

    /// The named bone is absent from the resolved skeleton.
    #[error("Bone '{bone}' not found on character {character}")]
    BoneNotFound {
        /// Requested bone name
        bone: String,
        /// Character the lookup ran against
        character: ObjectId,
    },

    // ========================================================================
    // Content Errors
    // ========================================================================
    /// The source model contains a skinned mesh, which cannot be rigidly
    /// attached to a bone.
    #[error("Attachable {0} contains a skinned mesh and cannot be bone-attached")]
    InvalidAttachmentContent(ObjectId),

    /// The source model could not be traversed (dangling references etc.).
    #[error("Malformed model data: {0}")]
    MalformedModel(String),

    // ========================================================================
    // State Errors
    // ========================================================================
    /// A scene handle no longer refers to a live node.
    #[error("Scene node not found")]
    NodeNotFound,

    /// The operation needs a bound attachable.
    #[error("Attachable {0} is not bound to a character")]
    NotBound(ObjectId),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Settings could not be parsed.
    #[error("Settings parse error: {0}")]
    Settings(#[from] serde_json::Error),
}

impl AttachError {
    /// Returns `true` for errors that only mean "the target is not there yet".
    ///
    /// The lifecycle swallows these and waits for the next scene or store
    /// change instead of reporting them.
    #[must_use]
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            Self::CharacterUnresolved(_) | Self::SkeletonUnresolved(_) | Self::BoneNotFound { .. }
        )
    }
}

/// Alias for `Result<T, AttachError>`.
pub type Result<T> = std::result::Result<T, AttachError>;
