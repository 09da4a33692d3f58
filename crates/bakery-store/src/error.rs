//! # Store Error Types
//!
//! Error types for store mutations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  patch_one(id, fields)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← which collection, which id, why             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in console) ← carried in a failed CommandResult              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only patches can fail. `set_all`, `upsert_one` and `remove_one` take whole
//! entities and always succeed.

use thiserror::Error;

/// Store mutation errors. A failed mutation leaves the collection untouched.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The patch was not a JSON object.
    ///
    /// ## When This Occurs
    /// - A typed patch serialized to something other than a struct
    #[error("Patch for {entity} must be a JSON object")]
    PatchNotObject { entity: &'static str },

    /// The patch tried to change the entity's identity.
    #[error("Patch cannot change {entity} id from '{id}' to '{attempted}'")]
    IdentityChange {
        entity: &'static str,
        id: String,
        attempted: String,
    },

    /// The merged value no longer deserializes as the entity.
    ///
    /// ## When This Occurs
    /// - Wrong field type (`"total": "abc"`)
    /// - Unknown enum value (`"status": "baked"`)
    #[error("Patch rejected for {entity} '{id}': {reason}")]
    PatchRejected {
        entity: &'static str,
        id: String,
        reason: String,
    },

    /// Serializing the patch or the current value failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
