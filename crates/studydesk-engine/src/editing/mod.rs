/*!
 * # Block editing core
 *
 * Glue between a block-structured document widget and generated content.
 *
 * ## The problem
 *
 * The widget can import markup only destructively: the import clears every
 * block before adding the new ones. Inserting generated text "after the line
 * the user is on" therefore means snapshotting the document, importing, and
 * putting the old blocks back at shifted positions.
 *
 * ## Module Structure
 *
 * - **`widget`**: `DocumentWidget` trait, the four capabilities the core needs
 * - **`memory`**: `MemoryEditor`, an in-process widget with the same contract
 * - **`rendered`**: rendered view of blocks (tags, inner HTML, inner text)
 * - **`focus`**: `FocusTracker`, the authoritative focused-block record
 * - **`extract`**: markdown extraction for generation requests
 * - **`markup`**: generated markdown to widget HTML and block payloads
 * - **`sync`**: `BlockSynchronizer`, the snapshot/replace/restore cycle
 * - **`session`**: `EditorSession`, mount/unmount ownership and the cycle gate
 *
 * ## Usage Pattern
 *
 * ```rust
 * use studydesk_engine::editing::*;
 * use studydesk_engine::models::{Block, BlockContent, BlockId, Document};
 *
 * # tokio::runtime::Runtime::new().unwrap().block_on(async {
 * let doc = Document::new(vec![
 *     Block::new("x1", BlockContent::paragraph("Hello")),
 *     Block::new("x2", BlockContent::paragraph("World")),
 * ]);
 * let session = EditorSession::mount(MemoryEditor::from_document(doc), SyncOptions::default());
 *
 * session.widget().await.focus(&BlockId::new("x1")).unwrap();
 * let outcome = session.insert_markdown("Generated").await.unwrap();
 *
 * assert_eq!(outcome.generated, 1);
 * assert_eq!(session.widget().await.blocks().len(), 3);
 * # });
 * ```
 */

pub mod extract;
pub mod focus;
pub mod markup;
pub mod memory;
pub mod rendered;
pub mod session;
pub mod sync;
pub mod widget;

pub use extract::{BlockShape, extract_blocks, extract_rendered};
pub use focus::{EditableRegion, FocusState, FocusTracker};
pub use markup::{Markup, markdown_to_html};
pub use memory::MemoryEditor;
pub use rendered::{Element, ElementTag, RenderedBlock};
pub use session::{EditorSession, GatePolicy, SyncOptions};
pub use sync::{BlockSynchronizer, SettleOptions, SyncError, SyncOutcome};
pub use widget::{DocumentWidget, EditorEvent, FocusTarget, WidgetError};
