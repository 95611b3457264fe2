//! Error handling for the simulation core.
//!
//! One central error type: setup-time configuration problems and boundary
//! decode failures surface here, while steady-state simulation never
//! fails — geometric edge cases resolve to defined fallbacks and missing
//! identifiers inside a step are benign no-ops.

use crate::body_data::BodyId;

/// Result alias used throughout the crate.
pub type PhysicsResult<T> = Result<T, PhysicsError>;

#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("body {id} is not present in the world")]
    MissingBody { id: BodyId },

    #[error("unsupported shape kind: {kind:?}")]
    UnsupportedShapeKind { kind: String },

    #[error("invalid body definition: {reason}")]
    InvalidBody { reason: String },

    #[error("invalid world definition: {reason}")]
    InvalidWorld { reason: String },

    #[error("invalid constraint definition: {reason}")]
    InvalidConstraint { reason: String },

    #[error("encode/decode failed: {0}")]
    Codec(#[from] serde_json::Error),
}
