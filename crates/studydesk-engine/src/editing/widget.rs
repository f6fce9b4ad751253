use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::editing::markup::Markup;
use crate::editing::rendered::RenderedBlock;
use crate::models::{Block, BlockId, Document};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WidgetError {
    #[error("Block {0} is already present in the document")]
    DuplicateBlock(BlockId),
    #[error("Can't find a block to remove: {0}")]
    MissingBlock(BlockId),
    #[error("Failed to render markup: {0}")]
    Render(String),
}

/// The element that received focus, resolved to its nearest enclosing block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTarget {
    /// Id of the closest enclosing block, if the element sits inside one
    pub block: Option<BlockId>,
    /// Current HTML of the focused editable region
    pub inner_html: String,
}

/// Events a widget emits to its subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// Fired once when the widget first mounts and focuses its first block
    Autofocus,
    /// The user moved focus to another element
    Focus(FocusTarget),
    /// Document content changed
    Changed,
}

/// The capabilities the synchronizer needs from a block editor
///
/// `render_from_markup` is destructive: it clears every existing block before
/// importing the markup.
#[async_trait]
pub trait DocumentWidget: Send {
    /// Persistable blocks, in order. Empty blocks are omitted.
    async fn save(&self) -> Result<Document, WidgetError>;

    /// Replace the whole document with the blocks the markup produces
    async fn render_from_markup(&mut self, markup: &Markup) -> Result<(), WidgetError>;

    /// Insert a block at `index`, clamped to the current length
    fn insert_block(&mut self, block: Block, index: usize) -> Result<(), WidgetError>;

    /// Every displayed block, empty ones included
    fn rendered_blocks(&self) -> Vec<RenderedBlock>;

    /// Register a listener for focus and change events
    fn subscribe(&mut self) -> UnboundedReceiver<EditorEvent>;
}
