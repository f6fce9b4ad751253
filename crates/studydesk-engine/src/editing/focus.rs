use tokio::sync::mpsc::UnboundedReceiver;

use crate::editing::markup::is_blank;
use crate::editing::rendered::RenderedBlock;
use crate::editing::widget::{DocumentWidget, EditorEvent, FocusTarget};
use crate::models::BlockId;

/// The editable region that last held focus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableRegion {
    pub block: BlockId,
    pub inner_html: String,
}

/// Which block has focus and whether it is blank
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusState {
    pub block: Option<BlockId>,
    pub editable: Option<EditableRegion>,
    pub is_empty: bool,
}

/// Keeps the single authoritative [`FocusState`] for one mounted document
///
/// Listens to the widget's event stream. Attaching is idempotent and
/// detaching drops the subscription, so a document never has more than one
/// registered listener per mount.
#[derive(Debug, Default)]
pub struct FocusTracker {
    state: FocusState,
    events: Option<UnboundedReceiver<EditorEvent>>,
    autofocus_armed: bool,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FocusState {
        &self.state
    }

    pub fn is_attached(&self) -> bool {
        self.events.is_some()
    }

    /// Subscribe to `widget`. Returns false if already attached.
    pub fn attach<W: DocumentWidget + ?Sized>(&mut self, widget: &mut W) -> bool {
        if self.is_attached() {
            return false;
        }
        self.events = Some(widget.subscribe());
        self.autofocus_armed = true;
        true
    }

    pub fn detach(&mut self) {
        self.events = None;
        self.autofocus_armed = false;
        self.state = FocusState::default();
    }

    /// Apply every pending event against the current rendered view
    ///
    /// Returns the number of events consumed.
    pub fn pump(&mut self, rendered: &[RenderedBlock]) -> usize {
        let mut pending = Vec::new();
        if let Some(events) = self.events.as_mut() {
            while let Ok(event) = events.try_recv() {
                pending.push(event);
            }
        }

        let count = pending.len();
        for event in pending {
            match event {
                EditorEvent::Autofocus => self.on_autofocus(rendered),
                EditorEvent::Focus(target) => self.on_focus_change(&target, rendered),
                EditorEvent::Changed => self.on_content_change(rendered),
            }
        }
        count
    }

    /// Focus the first block. Honoured once per mount.
    pub fn on_autofocus(&mut self, rendered: &[RenderedBlock]) {
        if !self.autofocus_armed {
            return;
        }
        let Some(first) = rendered.first() else {
            return;
        };
        self.autofocus_armed = false;

        let inner_html = first.content.inner_html.clone();
        self.state = FocusState {
            block: Some(first.id.clone()),
            is_empty: is_blank(&inner_html),
            editable: Some(EditableRegion {
                block: first.id.clone(),
                inner_html,
            }),
        };
        log::debug!("autofocus on block {}", first.id);
    }

    /// Re-read the focused block after the document changed
    ///
    /// Focus on a block that is no longer rendered is dropped.
    pub fn on_content_change(&mut self, rendered: &[RenderedBlock]) {
        let Some(focused) = self.state.block.clone() else {
            return;
        };
        let Some(block) = rendered.iter().find(|block| block.id == focused) else {
            log::debug!("focused block {focused} left the document");
            self.state = FocusState::default();
            return;
        };

        self.state.is_empty = block.is_empty();
        self.state.editable = Some(EditableRegion {
            block: focused,
            inner_html: block.content.inner_html.clone(),
        });
    }

    /// Record focus moving to `target`
    ///
    /// A target outside any rendered block clears the focused block but still
    /// records its editable region.
    pub fn on_focus_change(&mut self, target: &FocusTarget, rendered: &[RenderedBlock]) {
        let block = target
            .block
            .as_ref()
            .filter(|id| rendered.iter().any(|candidate| &candidate.id == *id))
            .cloned();

        self.state = FocusState {
            is_empty: is_blank(&target.inner_html),
            editable: block.clone().map(|block| EditableRegion {
                block,
                inner_html: target.inner_html.clone(),
            }),
            block,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::memory::MemoryEditor;
    use crate::models::{BlockContent, Document};
    use crate::tests::paragraph;
    use pretty_assertions::assert_eq;

    fn mounted(blocks: Vec<crate::models::Block>) -> (MemoryEditor, FocusTracker) {
        let mut editor = MemoryEditor::from_document(Document::new(blocks));
        let mut tracker = FocusTracker::new();
        assert!(tracker.attach(&mut editor));
        (editor, tracker)
    }

    #[test]
    fn test_autofocus_selects_first_block() {
        let (mut editor, mut tracker) = mounted(vec![paragraph("a", "&nbsp;"), paragraph("b", "x")]);

        editor.autofocus();
        tracker.pump(&editor.rendered_blocks());

        let state = tracker.state();
        assert_eq!(state.block, Some(BlockId::new("a")));
        assert!(state.is_empty);
        assert_eq!(state.editable.as_ref().map(|e| e.inner_html.as_str()), Some("&nbsp;"));
    }

    #[test]
    fn test_autofocus_is_honoured_once_per_mount() {
        let (mut editor, mut tracker) = mounted(vec![paragraph("a", "one"), paragraph("b", "two")]);
        editor.autofocus();
        tracker.pump(&editor.rendered_blocks());

        editor.focus(&BlockId::new("b")).unwrap();
        editor.autofocus();
        tracker.pump(&editor.rendered_blocks());

        assert_eq!(tracker.state().block, Some(BlockId::new("b")));
    }

    #[test]
    fn test_focus_change_tracks_block_and_emptiness() {
        let (mut editor, mut tracker) = mounted(vec![paragraph("a", "Hello")]);
        let blank = editor.insert_empty_after(&BlockId::new("a")).unwrap();

        editor.focus(&BlockId::new("a")).unwrap();
        tracker.pump(&editor.rendered_blocks());
        assert_eq!(tracker.state().block, Some(BlockId::new("a")));
        assert!(!tracker.state().is_empty);

        editor.focus(&blank).unwrap();
        tracker.pump(&editor.rendered_blocks());
        assert_eq!(tracker.state().block, Some(blank));
        assert!(tracker.state().is_empty);
    }

    #[test]
    fn test_typing_into_focused_blank_updates_emptiness() {
        let (mut editor, mut tracker) = mounted(vec![paragraph("a", "Hello"), paragraph("b", "")]);
        editor.focus(&BlockId::new("b")).unwrap();
        tracker.pump(&editor.rendered_blocks());
        assert!(tracker.state().is_empty);

        editor.set_content(&BlockId::new("b"), BlockContent::paragraph("typed")).unwrap();
        tracker.pump(&editor.rendered_blocks());

        let state = tracker.state();
        assert_eq!(state.block, Some(BlockId::new("b")));
        assert!(!state.is_empty);
        assert_eq!(state.editable.as_ref().map(|e| e.inner_html.as_str()), Some("typed"));

        editor.set_content(&BlockId::new("b"), BlockContent::paragraph("&nbsp;")).unwrap();
        tracker.pump(&editor.rendered_blocks());
        assert!(tracker.state().is_empty);
    }

    #[test]
    fn test_removing_focused_block_clears_focus() {
        let (mut editor, mut tracker) = mounted(vec![paragraph("a", "Hello"), paragraph("b", "Bye")]);
        editor.focus(&BlockId::new("b")).unwrap();
        tracker.pump(&editor.rendered_blocks());

        editor.remove_block(&BlockId::new("b")).unwrap();
        tracker.pump(&editor.rendered_blocks());

        assert_eq!(tracker.state(), &FocusState::default());
    }

    #[test]
    fn test_focus_outside_blocks_clears_block() {
        let (editor, mut tracker) = mounted(vec![paragraph("a", "Hello")]);

        tracker.on_focus_change(
            &FocusTarget {
                block: Some(BlockId::new("gone")),
                inner_html: "text".to_string(),
            },
            &editor.rendered_blocks(),
        );

        assert_eq!(tracker.state().block, None);
        assert_eq!(tracker.state().editable, None);
    }

    #[test]
    fn test_attach_twice_registers_one_listener() {
        let (mut editor, mut tracker) = mounted(vec![paragraph("a", "Hello")]);

        assert!(!tracker.attach(&mut editor));
        assert_eq!(editor.listener_count(), 1);

        tracker.detach();
        editor.set_content(&BlockId::new("a"), BlockContent::paragraph("Bye")).unwrap();
        assert_eq!(editor.listener_count(), 0);
        assert!(!tracker.is_attached());
    }

    #[test]
    fn test_tracker_never_mutates_document() {
        let (mut editor, mut tracker) = mounted(vec![paragraph("a", "Hello")]);
        let before = editor.blocks().to_vec();

        editor.autofocus();
        editor.focus(&BlockId::new("a")).unwrap();
        let consumed = tracker.pump(&editor.rendered_blocks());

        assert_eq!(consumed, 2);
        assert_eq!(editor.blocks(), before.as_slice());
    }
}
