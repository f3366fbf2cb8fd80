use tracing::{debug, trace};

use crate::document::{ApplyOutcome, Document};
use crate::edit::Edit;

/// Display collaborator refreshed after every mutation.
pub trait View {
    /// Called with the full document text (lines joined by `\n`).
    fn refresh(&mut self, text: &str);

    /// Called once when the owning engine releases its rendering context.
    fn close(&mut self) {}
}

/// A view that shows nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullView;

impl View for NullView {
    fn refresh(&mut self, _text: &str) {}
}

impl<V: View + ?Sized> View for Box<V> {
    fn refresh(&mut self, text: &str) {
        (**self).refresh(text);
    }

    fn close(&mut self) {
        (**self).close();
    }
}

/// Owns one [`Document`] and the view that displays it.
///
/// `apply` never fails and never blocks: edits that don't fit the document
/// are dropped. The view is refreshed before `apply` returns, so no caller
/// can observe a stale display after an edit.
pub struct BufferEngine<V: View> {
    document: Document,
    view: V,
    closed: bool,
}

impl<V: View> BufferEngine<V> {
    pub fn new(view: V) -> Self {
        Self::with_document(Document::new(), view)
    }

    pub fn with_document(document: Document, view: V) -> Self {
        Self {
            document,
            view,
            closed: false,
        }
    }

    /// Apply `edit` and refresh the view if the document changed.
    pub fn apply(&mut self, edit: &Edit) -> ApplyOutcome {
        let outcome = self.document.apply(edit);
        match outcome {
            ApplyOutcome::Applied => {
                trace!(%edit, lines = self.document.line_count(), "edit applied");
                let text = self.document.text();
                self.view.refresh(&text);
            }
            ApplyOutcome::Dropped(reason) => {
                debug!(%edit, %reason, "edit dropped");
            }
        }
        outcome
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Release the view. Idempotent; also runs on drop.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.view.close();
        }
    }
}

impl<V: View> Drop for BufferEngine<V> {
    fn drop(&mut self) {
        self.close();
    }
}
