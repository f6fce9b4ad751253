use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::editing::markup::Markup;
use crate::editing::rendered::RenderedBlock;
use crate::editing::widget::{DocumentWidget, EditorEvent, FocusTarget, WidgetError};
use crate::models::{Block, BlockContent, BlockId, Document};

/// In-process block editor with the same contract as the web widget
///
/// Keeps empty blocks on screen but leaves them out of `save`, and clears the
/// document on every markup import.
#[derive(Debug, Default)]
pub struct MemoryEditor {
    blocks: Vec<Block>,
    listeners: Vec<UnboundedSender<EditorEvent>>,
}

impl MemoryEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: Document) -> Self {
        Self {
            blocks: document.blocks,
            listeners: Vec::new(),
        }
    }

    /// Every block on screen, empty ones included
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|block| block.id.clone()).collect()
    }

    pub fn position(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| &block.id == id)
    }

    pub fn push_block(&mut self, block: Block) {
        self.blocks.push(block);
        self.emit(EditorEvent::Changed);
    }

    /// Open a new empty paragraph below `id`, as pressing Enter would
    pub fn insert_empty_after(&mut self, id: &BlockId) -> Result<BlockId, WidgetError> {
        let index = self
            .position(id)
            .ok_or_else(|| WidgetError::MissingBlock(id.clone()))?;
        let block = Block::generated(BlockContent::paragraph(""));
        let new_id = block.id.clone();
        self.blocks.insert(index + 1, block);
        self.emit(EditorEvent::Changed);
        Ok(new_id)
    }

    pub fn set_content(&mut self, id: &BlockId, content: BlockContent) -> Result<(), WidgetError> {
        let block = self
            .blocks
            .iter_mut()
            .find(|block| &block.id == id)
            .ok_or_else(|| WidgetError::MissingBlock(id.clone()))?;
        block.content = content;
        self.emit(EditorEvent::Changed);
        Ok(())
    }

    pub fn remove_block(&mut self, id: &BlockId) -> Result<Block, WidgetError> {
        let index = self
            .position(id)
            .ok_or_else(|| WidgetError::MissingBlock(id.clone()))?;
        let removed = self.blocks.remove(index);
        self.emit(EditorEvent::Changed);
        Ok(removed)
    }

    /// Signal the initial focus on the first block
    pub fn autofocus(&mut self) {
        self.emit(EditorEvent::Autofocus);
    }

    /// Move focus into the editable region of block `id`
    pub fn focus(&mut self, id: &BlockId) -> Result<(), WidgetError> {
        let index = self
            .position(id)
            .ok_or_else(|| WidgetError::MissingBlock(id.clone()))?;
        let rendered = RenderedBlock::from_block(&self.blocks[index]);
        self.emit(EditorEvent::Focus(FocusTarget {
            block: Some(id.clone()),
            inner_html: rendered.content.inner_html,
        }));
        Ok(())
    }

    /// Number of live subscriptions
    pub fn listener_count(&self) -> usize {
        self.listeners.iter().filter(|tx| !tx.is_closed()).count()
    }

    fn emit(&mut self, event: EditorEvent) {
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[async_trait]
impl DocumentWidget for MemoryEditor {
    async fn save(&self) -> Result<Document, WidgetError> {
        Ok(Document::stamped(
            self.blocks
                .iter()
                .filter(|block| !block.is_empty())
                .cloned()
                .collect(),
        ))
    }

    async fn render_from_markup(&mut self, markup: &Markup) -> Result<(), WidgetError> {
        self.blocks.clear();
        self.blocks
            .extend(markup.blocks.iter().cloned().map(Block::generated));
        self.emit(EditorEvent::Changed);
        Ok(())
    }

    fn insert_block(&mut self, block: Block, index: usize) -> Result<(), WidgetError> {
        if self.position(&block.id).is_some() {
            return Err(WidgetError::DuplicateBlock(block.id));
        }
        let index = index.min(self.blocks.len());
        self.blocks.insert(index, block);
        self.emit(EditorEvent::Changed);
        Ok(())
    }

    fn rendered_blocks(&self) -> Vec<RenderedBlock> {
        self.blocks.iter().map(RenderedBlock::from_block).collect()
    }

    fn subscribe(&mut self) -> UnboundedReceiver<EditorEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.retain(|tx| !tx.is_closed());
        self.listeners.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::paragraph;
    use pretty_assertions::assert_eq;

    fn editor_with(blocks: Vec<Block>) -> MemoryEditor {
        MemoryEditor::from_document(Document::new(blocks))
    }

    #[tokio::test]
    async fn test_save_omits_empty_blocks() {
        let mut editor = editor_with(vec![paragraph("a", "Hello")]);
        let empty = editor.insert_empty_after(&BlockId::new("a")).unwrap();

        let saved = editor.save().await.unwrap();

        assert_eq!(saved.ids(), vec![BlockId::new("a")]);
        assert_eq!(editor.rendered_blocks().len(), 2);
        assert_eq!(editor.rendered_blocks()[1].id, empty);
    }

    #[tokio::test]
    async fn test_render_from_markup_clears_document() {
        let mut editor = editor_with(vec![paragraph("a", "Hello"), paragraph("b", "World")]);

        editor
            .render_from_markup(&Markup::from_markdown("# New\n\nBody"))
            .await
            .unwrap();

        let saved = editor.save().await.unwrap();
        assert_eq!(saved.len(), 2);
        assert!(saved.position(&BlockId::new("a")).is_none());
        assert_eq!(saved.blocks[0].content, BlockContent::header(1, "New"));
    }

    #[test]
    fn test_insert_block_clamps_index_and_rejects_duplicates() {
        let mut editor = editor_with(vec![paragraph("a", "Hello")]);

        editor.insert_block(paragraph("b", "World"), 99).unwrap();
        assert_eq!(editor.ids(), vec![BlockId::new("a"), BlockId::new("b")]);

        let err = editor.insert_block(paragraph("a", "Again"), 0).unwrap_err();
        assert_eq!(err, WidgetError::DuplicateBlock(BlockId::new("a")));
    }

    #[test]
    fn test_focus_emits_target_to_subscribers() {
        let mut editor = editor_with(vec![paragraph("a", "Hello")]);
        let mut events = editor.subscribe();

        editor.focus(&BlockId::new("a")).unwrap();

        assert_eq!(
            events.try_recv().unwrap(),
            EditorEvent::Focus(FocusTarget {
                block: Some(BlockId::new("a")),
                inner_html: "Hello".to_string(),
            })
        );
    }

    #[test]
    fn test_dropped_subscription_is_pruned() {
        let mut editor = MemoryEditor::new();
        let events = editor.subscribe();
        assert_eq!(editor.listener_count(), 1);

        drop(events);
        editor.autofocus();

        assert_eq!(editor.listener_count(), 0);
    }

    #[test]
    fn test_focus_unknown_block_is_an_error() {
        let mut editor = MemoryEditor::new();
        assert_eq!(
            editor.focus(&BlockId::new("nope")),
            Err(WidgetError::MissingBlock(BlockId::new("nope")))
        );
    }
}
