pub mod ai;
pub mod editing;
pub mod io;
pub mod models;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{
    DocumentWidget, EditorSession, FocusState, FocusTracker, GatePolicy, Markup, MemoryEditor,
    SettleOptions, SyncError, SyncOptions, SyncOutcome,
};
pub use io::*;
pub use models::{Block, BlockContent, BlockId, Document, NoteFile, NoteIndex};
