//! AI assistance: the generation service client, the suggestion palette, and
//! the assistants that route answers into notes and flashcards.

pub mod assistant;
pub mod client;
pub mod palette;

pub use assistant::{AssistError, FlashcardAction, FlashcardAssistant, NoteAssistant};
pub use client::{
    AiContext, GenerationError, GenerationRequest, GenerationService, HttpGenerationClient, Keyword,
};
pub use palette::{
    CREATE_FLASHCARD_PROMPT, Palette, Suggestion, SuggestionAction, filter_suggestions, suggestions,
};
