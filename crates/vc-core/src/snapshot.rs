//! Snapshot codec: scene state ↔ immutable bytes.
//!
//! A `SceneDocument` is the flattened, order-preserving value form of a
//! canvas. Entities are listed in pre-order (each parent before its
//! children, siblings back to front), so the document alone fixes both the
//! hierarchy and the z-order. Only `Vec`s are used, which keeps encoding
//! deterministic: equal scenes always produce byte-equal snapshots.

use crate::error::SceneError;
use crate::id::EntityId;
use crate::model::{Color, Entity, Layer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Version tag written into every document.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Encoding used for snapshot payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotFormat {
    /// Compact binary (MessagePack with named fields).
    #[default]
    MessagePack,
    /// Human-readable JSON, handy when inspecting history in a debugger.
    Json,
}

/// One entity plus the id of its parent (`None` = top level).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub parent: Option<EntityId>,
    pub entity: Entity,
}

/// The complete, self-contained state of one canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub background: Color,
    pub layers: Vec<Layer>,
    pub entities: Vec<EntityRecord>,
}

/// An immutable capture of one scene state.
///
/// Cloning shares the payload. Equality and hashing are by content.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Snapshot {
    format: SnapshotFormat,
    bytes: Arc<[u8]>,
}

impl Snapshot {
    /// Wrap an already-encoded payload.
    pub fn from_bytes(format: SnapshotFormat, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            format,
            bytes: bytes.into(),
        }
    }

    pub fn format(&self) -> SnapshotFormat {
        self.format
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Encode a document into a snapshot.
///
/// # Errors
/// Returns [`SceneError::Encode`] if the serializer rejects the document.
pub fn encode(document: &SceneDocument, format: SnapshotFormat) -> Result<Snapshot, SceneError> {
    let bytes = match format {
        SnapshotFormat::MessagePack => {
            rmp_serde::to_vec_named(document).map_err(|e| SceneError::Encode(e.to_string()))?
        }
        SnapshotFormat::Json => {
            serde_json::to_vec(document).map_err(|e| SceneError::Encode(e.to_string()))?
        }
    };
    log::trace!(
        "encoded {} entities into {} bytes ({:?})",
        document.entities.len(),
        bytes.len(),
        format
    );
    Ok(Snapshot::from_bytes(format, bytes))
}

/// Decode a snapshot back into a document, checking its version.
///
/// # Errors
/// Returns [`SceneError::Decode`] for unreadable payloads and
/// [`SceneError::UnsupportedVersion`] for documents from another version.
pub fn decode(snapshot: &Snapshot) -> Result<SceneDocument, SceneError> {
    let document: SceneDocument = match snapshot.format {
        SnapshotFormat::MessagePack => rmp_serde::from_slice(snapshot.as_bytes())
            .map_err(|e| SceneError::Decode(e.to_string()))?,
        SnapshotFormat::Json => serde_json::from_slice(snapshot.as_bytes())
            .map_err(|e| SceneError::Decode(e.to_string()))?,
    };
    if document.version != SNAPSHOT_VERSION {
        return Err(SceneError::UnsupportedVersion {
            found: document.version,
            expected: SNAPSHOT_VERSION,
        });
    }
    Ok(document)
}
