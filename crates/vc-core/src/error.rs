use crate::id::EntityId;

/// Failures raised by a scene while capturing or restoring its state.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("entity {id} cannot be serialized: {reason}")]
    CorruptEntity { id: EntityId, reason: String },

    #[error("snapshot encoding failed: {0}")]
    Encode(String),

    #[error("snapshot decoding failed: {0}")]
    Decode(String),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("malformed scene document: {0}")]
    Malformed(String),
}
