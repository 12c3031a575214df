pub mod config;
pub mod error;
pub mod history;
pub mod shortcuts;
pub mod store;

pub use config::EditorConfig;
pub use error::EditError;
pub use history::History;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use store::{EditorMode, EditorStore, Panel, Snapshot, ViewState};
