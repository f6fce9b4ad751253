use std::sync::Arc;
use thiserror::Error;

use crate::ai::client::{AiContext, GenerationError, GenerationRequest, GenerationService, Keyword};
use crate::editing::{DocumentWidget, EditorSession, SyncError, SyncOutcome, extract_rendered};
use crate::models::{Flashcard, FlashcardUpdate};

#[derive(Debug, Error)]
pub enum AssistError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl AssistError {
    /// Short text for a toast
    pub fn notice(&self) -> String {
        match self {
            AssistError::Generation(_) => {
                "The AI assistant is unavailable right now. Your note was not changed.".to_string()
            }
            AssistError::Sync(SyncError::Busy) => {
                "Still inserting the previous answer, try again in a moment.".to_string()
            }
            AssistError::Sync(err) => format!("Could not insert the answer: {err}"),
        }
    }
}

/// Runs note commands: ask the service, then insert the answer at the focus
pub struct NoteAssistant<G: GenerationService, W: DocumentWidget> {
    generator: Arc<G>,
    session: Option<Arc<EditorSession<W>>>,
    file_id: u64,
}

impl<G: GenerationService, W: DocumentWidget> NoteAssistant<G, W> {
    pub fn new(generator: Arc<G>, file_id: u64) -> Self {
        Self {
            generator,
            session: None,
            file_id,
        }
    }

    pub fn attach(&mut self, session: Arc<EditorSession<W>>, file_id: u64) {
        self.session = Some(session);
        self.file_id = file_id;
    }

    pub fn detach(&mut self) -> Option<Arc<EditorSession<W>>> {
        self.session.take()
    }

    pub fn session(&self) -> Option<&Arc<EditorSession<W>>> {
        self.session.as_ref()
    }

    /// Ask the service for `keyword`, attaching the note's markdown if needed
    pub async fn request(&self, keyword: Keyword) -> Result<String, AssistError> {
        let mut request = GenerationRequest::new(AiContext::Notes, keyword, self.file_id);
        if request.keyword.needs_content() {
            let content = match &self.session {
                Some(session) => extract_rendered(&session.widget().await.rendered_blocks()),
                None => String::new(),
            };
            request = request.with_content(content);
        }

        self.generator.generate(&request).await.map_err(|err| {
            log::error!("generation for {} failed: {err}", request.path());
            AssistError::from(err)
        })
    }

    /// Insert generated markdown; a no-op when no document is mounted
    pub async fn insert_response(&self, markdown: &str) -> Result<Option<SyncOutcome>, AssistError> {
        let Some(session) = &self.session else {
            log::debug!("no mounted document, dropping generated content");
            return Ok(None);
        };
        let outcome = session.insert_markdown(markdown).await?;
        Ok(Some(outcome))
    }

    /// Generate for `keyword` and insert the answer
    pub async fn run(&self, keyword: Keyword) -> Result<Option<SyncOutcome>, AssistError> {
        let markdown = self.request(keyword).await?;
        self.insert_response(&markdown).await
    }
}

/// Result of an AI action on a flashcard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashcardAction {
    Update(FlashcardUpdate),
    /// Both sides are empty or both full; ask the user for a topic
    NeedsPrompt,
}

pub struct FlashcardAssistant<G: GenerationService> {
    generator: Arc<G>,
}

impl<G: GenerationService> FlashcardAssistant<G> {
    pub fn new(generator: Arc<G>) -> Self {
        Self { generator }
    }

    /// Fill the missing side of a half-finished card
    pub async fn complete(&self, card: &Flashcard) -> Result<FlashcardAction, AssistError> {
        let Some(side) = card.missing_side() else {
            return Ok(FlashcardAction::NeedsPrompt);
        };

        let request = GenerationRequest::new(AiContext::Flashcards, Keyword::Predict, card.id);
        let text = self.generator.generate(&request).await.map_err(|err| {
            log::error!("prediction for flashcard {} failed: {err}", card.id);
            AssistError::from(err)
        })?;
        Ok(FlashcardAction::Update(FlashcardUpdate::side(side, text)))
    }

    /// Generate both sides from a free-text prompt
    ///
    /// Returns `None` when the answer is not in `Term: .. Definition: ..` form.
    pub async fn create(&self, card_id: u64, prompt: &str) -> Result<Option<FlashcardUpdate>, AssistError> {
        let request = GenerationRequest::new(
            AiContext::Flashcards,
            Keyword::parse(prompt),
            card_id,
        );
        let text = self.generator.generate(&request).await.map_err(|err| {
            log::error!("flashcard generation for card {card_id} failed: {err}");
            AssistError::from(err)
        })?;
        let update = FlashcardUpdate::parse_generated(&text);
        if update.is_none() {
            log::info!("No term/definition found in generated flashcard text");
        }
        Ok(update)
    }
}
