pub mod block;
pub mod document;
pub mod flashcard;
pub mod note_file;
pub mod note_index;

pub use block::{Block, BlockContent, BlockId, ChecklistItem, ListStyle};
pub use document::{Document, EDITOR_FORMAT_VERSION};
pub use flashcard::{Flashcard, FlashcardSide, FlashcardUpdate};
pub use note_file::{NOTE_EXTENSION, NoteFile};
pub use note_index::NoteIndex;
