use std::sync::Mutex as StdMutex;
use tokio::sync::{Mutex, MutexGuard};

use crate::editing::focus::{FocusState, FocusTracker};
use crate::editing::markup::Markup;
use crate::editing::sync::{BlockSynchronizer, SettleOptions, SyncError, SyncOutcome};
use crate::editing::widget::DocumentWidget;

/// What a second insertion does while one is running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GatePolicy {
    /// Wait for the running cycle to finish
    #[default]
    Queue,
    /// Fail immediately with [`SyncError::Busy`]
    Drop,
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub settle: SettleOptions,
    pub gate: GatePolicy,
}

/// A mounted document widget and its focus tracker
///
/// Created on mount and consumed by [`EditorSession::unmount`]. The widget
/// lives behind an async mutex which doubles as the one-cycle-at-a-time gate
/// for insertions.
pub struct EditorSession<W: DocumentWidget> {
    widget: Mutex<W>,
    focus: StdMutex<FocusTracker>,
    options: SyncOptions,
}

impl<W: DocumentWidget> EditorSession<W> {
    pub fn mount(mut widget: W, options: SyncOptions) -> Self {
        let mut tracker = FocusTracker::new();
        tracker.attach(&mut widget);
        Self {
            widget: Mutex::new(widget),
            focus: StdMutex::new(tracker),
            options,
        }
    }

    /// Detach listeners and hand the widget back
    pub fn unmount(self) -> W {
        let mut tracker = self
            .focus
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        tracker.detach();
        self.widget.into_inner()
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Exclusive access to the widget; waits for any running insertion
    pub async fn widget(&self) -> MutexGuard<'_, W> {
        self.widget.lock().await
    }

    /// The widget, unless an insertion currently holds it
    pub fn try_widget(&self) -> Option<MutexGuard<'_, W>> {
        self.widget.try_lock().ok()
    }

    /// Apply pending focus events and return the current state
    pub async fn refresh_focus(&self) -> FocusState {
        let widget = self.widget.lock().await;
        self.pump_focus(&widget)
    }

    /// Last known focus state without draining new events
    pub fn focus_state(&self) -> FocusState {
        self.tracker().state().clone()
    }

    /// Insert generated markdown around the focused block
    pub async fn insert_markdown(&self, markdown: &str) -> Result<SyncOutcome, SyncError> {
        self.insert_markup(&Markup::from_markdown(markdown)).await
    }

    pub async fn insert_markup(&self, markup: &Markup) -> Result<SyncOutcome, SyncError> {
        let mut widget = match self.options.gate {
            GatePolicy::Queue => self.widget.lock().await,
            GatePolicy::Drop => self.widget.try_lock().map_err(|_| SyncError::Busy)?,
        };

        let focus = self.pump_focus(&widget);
        BlockSynchronizer::new(&mut *widget, self.options.settle.clone())
            .insert(&focus, markup)
            .await
    }

    fn pump_focus(&self, widget: &W) -> FocusState {
        let rendered = widget.rendered_blocks();
        let mut tracker = self.tracker();
        tracker.pump(&rendered);
        tracker.state().clone()
    }

    fn tracker(&self) -> std::sync::MutexGuard<'_, FocusTracker> {
        self.focus
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
