pub mod config;
pub mod error;
pub mod history;
pub mod session;
pub mod shortcuts;

pub use config::EditorConfig;
pub use error::{ConfigError, HistoryError};
pub use history::{DEFAULT_MAX_STEPS, EntryView, HistoryEngine, Mode};
pub use session::EditorSession;
pub use shortcuts::{ShortcutAction, ShortcutMap};
