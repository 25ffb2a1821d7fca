pub mod canvas;
pub mod error;
pub mod id;
pub mod model;
pub mod mutation;
pub mod scene;
pub mod snapshot;

pub use canvas::{Canvas, ZOrder};
pub use error::SceneError;
pub use id::EntityId;
pub use model::*;
pub use mutation::{Axis, SceneMutation};
pub use scene::{Scene, SceneChange};
pub use snapshot::{SNAPSHOT_VERSION, SceneDocument, Snapshot, SnapshotFormat};

// Re-export so downstream crates don't need direct petgraph/smallvec dependencies
pub use petgraph::graph::NodeIndex;
pub use smallvec::SmallVec;
