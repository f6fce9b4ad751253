//! Inserting generated content around the focused block.
//!
//! The widget's markup import wipes the whole document, so one cycle runs:
//!
//! 1. snapshot the saved blocks (`before`)
//! 2. find the last non-empty rendered block ahead of the focused one
//! 3. map that block to its index in `before` (the boundary)
//! 4. import the markup, then wait for the generated blocks to appear
//! 5. put every snapshot block back, shifting those past the boundary by the
//!    number of generated blocks
//!
//! The rendered view is used in step 2 because a save drops empty blocks and
//! would lose where an empty focused line sits.

use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, sleep};

use crate::editing::focus::FocusState;
use crate::editing::markup::Markup;
use crate::editing::rendered::RenderedBlock;
use crate::editing::widget::{DocumentWidget, WidgetError};
use crate::models::{Block, BlockId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("An insertion is already in progress")]
    Busy,
    #[error("Editor error: {0}")]
    Widget(#[from] WidgetError),
}

/// How long to wait for an import to show up in the widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleOptions {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for SettleOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            timeout: Duration::from_secs(2),
        }
    }
}

/// Result of one synchronization cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Blocks produced by the import
    pub generated: usize,
    /// Snapshot blocks put back
    pub restored: usize,
    /// Snapshot index the generated content follows; `None` means the start
    pub boundary: Option<usize>,
    /// False when the import never reached the expected block count in time
    pub settled: bool,
}

/// Id of the last rendered block before `focused` that a save would keep
///
/// Returns `None` when nothing is focused, the focused block is no longer
/// rendered, or every earlier block is empty.
pub fn last_full_block(rendered: &[RenderedBlock], focused: Option<&BlockId>) -> Option<BlockId> {
    let focused = focused?;
    let focus_index = rendered.iter().position(|block| &block.id == focused)?;

    rendered[..focus_index]
        .iter()
        .rev()
        .find(|block| !block.is_empty())
        .map(|block| block.id.clone())
}

/// Index of `last_full` within the snapshot
pub fn boundary_index(before: &[Block], last_full: Option<&BlockId>) -> Option<usize> {
    let last_full = last_full?;
    before.iter().position(|block| &block.id == last_full)
}

/// Where snapshot block `original` goes once `generated` blocks exist
pub fn reinsertion_index(original: usize, boundary: Option<usize>, generated: usize) -> usize {
    match boundary {
        Some(boundary) if original <= boundary => original,
        _ => original + generated,
    }
}

/// Snapshot blocks paired with their target index, in ascending order
///
/// Inserting in this order keeps every earlier target valid.
pub fn plan_reinsertion(
    before: &[Block],
    boundary: Option<usize>,
    generated: usize,
) -> Vec<(usize, &Block)> {
    before
        .iter()
        .enumerate()
        .map(|(original, block)| (reinsertion_index(original, boundary, generated), block))
        .collect()
}

/// Runs one insertion cycle against a widget
pub struct BlockSynchronizer<'w, W: DocumentWidget + ?Sized> {
    widget: &'w mut W,
    settle: SettleOptions,
}

impl<'w, W: DocumentWidget + ?Sized> BlockSynchronizer<'w, W> {
    pub fn new(widget: &'w mut W, settle: SettleOptions) -> Self {
        Self { widget, settle }
    }

    /// Replace-and-restore `markup` at the position implied by `focus`
    pub async fn insert(self, focus: &FocusState, markup: &Markup) -> Result<SyncOutcome, SyncError> {
        let before = self.widget.save().await?.blocks;

        let rendered = self.widget.rendered_blocks();
        let last_full = last_full_block(&rendered, focus.block.as_ref());
        let boundary = boundary_index(&before, last_full.as_ref());
        log::debug!(
            "snapshot of {} blocks, last full block {:?}, boundary {:?}",
            before.len(),
            last_full,
            boundary
        );

        self.widget.render_from_markup(markup).await?;
        let (generated, settled) = self.wait_until_rendered(markup.len()).await?;

        for (index, block) in plan_reinsertion(&before, boundary, generated) {
            self.widget.insert_block(block.clone(), index)?;
        }
        log::debug!("restored {} blocks around {} generated", before.len(), generated);

        Ok(SyncOutcome {
            generated,
            restored: before.len(),
            boundary,
            settled,
        })
    }

    /// Poll the saved block count until the import is visible
    async fn wait_until_rendered(&self, expected: usize) -> Result<(usize, bool), WidgetError> {
        let deadline = Instant::now() + self.settle.timeout;
        loop {
            let count = self.widget.save().await?.len();
            if count == expected {
                return Ok((count, true));
            }
            if Instant::now() >= deadline {
                log::warn!(
                    "import did not settle: expected {expected} blocks, saw {count} after {:?}",
                    self.settle.timeout
                );
                return Ok((count, false));
            }
            sleep(self.settle.poll_interval).await;
        }
    }
}
