use vc_core::SceneError;

/// Failures surfaced by the history engine.
///
/// Nothing-to-undo and nothing-to-redo are not errors: `undo`/`redo`
/// report them as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// The scene could not be captured; the log is unchanged.
    #[error("could not capture scene state")]
    SerializationFailed(#[source] SceneError),

    /// The snapshot at `index` could not be applied; the pointer is unchanged.
    #[error("could not restore history entry {index}")]
    RestoreFailed {
        index: usize,
        #[source]
        source: SceneError,
    },

    #[error("history index {index} out of range (log has {len} entries)")]
    InvalidHistoryIndex { index: usize, len: usize },
}

/// Failures while loading an [`EditorConfig`](crate::config::EditorConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid editor config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("max_steps must be at least 1")]
    InvalidMaxSteps,

    #[error("invalid background color {0:?}")]
    InvalidColor(String),
}
