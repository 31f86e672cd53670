//! Candidate preview: navigation state plus the presenters that drive it.
//!
//! [`CandidatePreview`] is a pure state machine. Presenters feed it events from
//! somewhere (document clicks, a terminal) and return its single resolution.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use polish_dom::{Document, DomError, NodeId};
use polish_types::CandidateSet;
use tokio::sync::{Mutex, mpsc};

pub const PREVIEW_TITLE: &str = "Message Enhancement Preview";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKey {
    Escape,
    Enter,
    ArrowLeft,
    ArrowRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewEvent {
    Next,
    Previous,
    Accept,
    Cancel,
    BackdropClick,
    Key(PreviewKey),
}

/// How a preview ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    Accepted { index: usize, text: String },
    Cancelled,
}

impl PreviewOutcome {
    #[must_use]
    pub fn accepted(&self) -> Option<&str> {
        match self {
            PreviewOutcome::Accepted { text, .. } => Some(text),
            PreviewOutcome::Cancelled => None,
        }
    }
}

/// Cursor over a [`CandidateSet`] that resolves exactly once.
#[derive(Debug, Clone)]
pub struct CandidatePreview {
    candidates: CandidateSet,
    cursor: usize,
    resolved: bool,
}

impl CandidatePreview {
    #[must_use]
    pub fn new(candidates: CandidateSet) -> Self {
        Self {
            candidates,
            cursor: 0,
            resolved: false,
        }
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.count() == 0
    }

    #[must_use]
    pub fn current(&self) -> &str {
        self.candidates.get(self.cursor).unwrap_or_else(|| self.candidates.first())
    }

    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.cursor + 1 < self.len()
    }

    #[must_use]
    pub fn can_retreat(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// "Candidate 2 of 3"
    #[must_use]
    pub fn counter_label(&self) -> String {
        format!("Candidate {} of {}", self.cursor + 1, self.len())
    }

    /// Feed one event. Returns the outcome the first time the preview resolves;
    /// everything after that is ignored.
    pub fn handle(&mut self, event: PreviewEvent) -> Option<PreviewOutcome> {
        if self.resolved {
            return None;
        }
        let event = match event {
            PreviewEvent::Key(PreviewKey::Escape) => PreviewEvent::Cancel,
            PreviewEvent::Key(PreviewKey::Enter) => PreviewEvent::Accept,
            PreviewEvent::Key(PreviewKey::ArrowLeft) => PreviewEvent::Previous,
            PreviewEvent::Key(PreviewKey::ArrowRight) => PreviewEvent::Next,
            other => other,
        };
        match event {
            PreviewEvent::Next => {
                if self.can_advance() {
                    self.cursor += 1;
                }
                None
            }
            PreviewEvent::Previous => {
                if self.can_retreat() {
                    self.cursor -= 1;
                }
                None
            }
            PreviewEvent::Accept => {
                self.resolved = true;
                Some(PreviewOutcome::Accepted {
                    index: self.cursor,
                    text: self.current().to_string(),
                })
            }
            PreviewEvent::Cancel | PreviewEvent::BackdropClick | PreviewEvent::Key(_) => {
                self.resolved = true;
                Some(PreviewOutcome::Cancelled)
            }
        }
    }
}

/// Shows a preview to the user and waits for its resolution.
pub trait PreviewPresenter {
    fn present(&self, preview: CandidatePreview) -> impl Future<Output = PreviewOutcome>;
}

// ============================================================================
// Document overlay
// ============================================================================

const CLASS_BACKDROP: &str = "polish-preview";
const CLASS_PREV: &str = "polish-preview-prev";
const CLASS_NEXT: &str = "polish-preview-next";
const CLASS_CANCEL: &str = "polish-preview-cancel";
const CLASS_APPLY: &str = "polish-preview-apply";

#[derive(Debug, Clone, Copy)]
struct Overlay {
    root: NodeId,
    counter: NodeId,
    text: NodeId,
    prev: NodeId,
    next: NodeId,
}

impl Overlay {
    fn mount(doc: &mut Document, preview: &CandidatePreview) -> Result<Self, DomError> {
        let root = element(doc, "div", CLASS_BACKDROP);
        doc.set_attribute(root, "role", "dialog");
        let content = element(doc, "div", "polish-preview-content");
        doc.append_child(root, content)?;

        let title = element(doc, "h3", "polish-preview-title");
        let title_text = doc.create_text(PREVIEW_TITLE);
        doc.append_child(title, title_text)?;
        let counter = element(doc, "div", "polish-preview-counter");
        let text = element(doc, "div", "polish-preview-text");
        let actions = element(doc, "div", "polish-preview-actions");
        for node in [title, counter, text, actions] {
            doc.append_child(content, node)?;
        }

        let prev = button(doc, CLASS_PREV, "Previous")?;
        let next = button(doc, CLASS_NEXT, "Next")?;
        let cancel = button(doc, CLASS_CANCEL, "Cancel")?;
        let apply = button(doc, CLASS_APPLY, "Apply Changes")?;
        for node in [prev, next, cancel, apply] {
            doc.append_child(actions, node)?;
        }

        doc.append_child(doc.body(), root)?;
        let overlay = Self {
            root,
            counter,
            text,
            prev,
            next,
        };
        overlay.render(doc, preview)?;
        Ok(overlay)
    }

    fn render(&self, doc: &mut Document, preview: &CandidatePreview) -> Result<(), DomError> {
        let counter = doc.create_text(preview.counter_label());
        doc.replace_children(self.counter, vec![counter])?;

        let mut lines = Vec::new();
        for (i, line) in preview.current().split('\n').enumerate() {
            if i > 0 {
                lines.push(doc.create_element("br"));
            }
            if !line.is_empty() {
                lines.push(doc.create_text(line));
            }
        }
        doc.replace_children(self.text, lines)?;

        set_disabled(doc, self.prev, !preview.can_retreat());
        set_disabled(doc, self.next, !preview.can_advance());
        Ok(())
    }
}

fn element(doc: &mut Document, tag: &str, class: &str) -> NodeId {
    let node = doc.create_element(tag);
    doc.set_attribute(node, "class", class);
    node
}

fn button(doc: &mut Document, class: &str, label: &str) -> Result<NodeId, DomError> {
    let node = element(doc, "button", class);
    doc.set_attribute(node, "type", "button");
    let text = doc.create_text(label);
    doc.append_child(node, text)?;
    Ok(node)
}

fn set_disabled(doc: &mut Document, node: NodeId, disabled: bool) {
    if disabled {
        doc.set_attribute(node, "disabled", "");
    } else {
        doc.remove_attribute(node, "disabled");
    }
}

/// Map a click inside a preview overlay to its event.
///
/// Clicks on the content area that hit no button map to `None`; a click on
/// the backdrop itself is [`PreviewEvent::BackdropClick`].
#[must_use]
pub fn event_for_click(doc: &Document, target: NodeId) -> Option<PreviewEvent> {
    if doc.has_class(target, CLASS_BACKDROP) {
        return Some(PreviewEvent::BackdropClick);
    }
    doc.inclusive_ancestors(target).find_map(|node| {
        if doc.has_class(node, CLASS_PREV) {
            Some(PreviewEvent::Previous)
        } else if doc.has_class(node, CLASS_NEXT) {
            Some(PreviewEvent::Next)
        } else if doc.has_class(node, CLASS_CANCEL) {
            Some(PreviewEvent::Cancel)
        } else if doc.has_class(node, CLASS_APPLY) {
            Some(PreviewEvent::Accept)
        } else {
            None
        }
    })
}

/// Detaches the overlay however `present` ends, including when its future
/// is dropped mid-await.
struct OverlayGuard {
    doc: Rc<RefCell<Document>>,
    root: NodeId,
}

impl Drop for OverlayGuard {
    fn drop(&mut self) {
        match self.doc.try_borrow_mut() {
            Ok(mut doc) => doc.remove(self.root),
            Err(_) => tracing::warn!("Document busy; preview overlay left attached"),
        }
    }
}

/// Sends events to a [`DocumentPresenter`].
#[derive(Debug, Clone)]
pub struct PreviewController {
    sender: mpsc::UnboundedSender<PreviewEvent>,
}

impl PreviewController {
    /// Returns false once the presenter is gone.
    pub fn send(&self, event: PreviewEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// Presents candidates as a `div.polish-preview` overlay in the document.
#[derive(Debug)]
pub struct DocumentPresenter {
    doc: Rc<RefCell<Document>>,
    events: Mutex<mpsc::UnboundedReceiver<PreviewEvent>>,
}

impl DocumentPresenter {
    #[must_use]
    pub fn new(doc: Rc<RefCell<Document>>) -> (Self, PreviewController) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                doc,
                events: Mutex::new(receiver),
            },
            PreviewController { sender },
        )
    }
}

impl PreviewPresenter for DocumentPresenter {
    async fn present(&self, mut preview: CandidatePreview) -> PreviewOutcome {
        let overlay = match Overlay::mount(&mut self.doc.borrow_mut(), &preview) {
            Ok(overlay) => overlay,
            Err(e) => {
                tracing::warn!(%e, "Could not mount preview");
                return PreviewOutcome::Cancelled;
            }
        };
        let _guard = OverlayGuard {
            doc: Rc::clone(&self.doc),
            root: overlay.root,
        };

        let mut events = self.events.lock().await;
        loop {
            let Some(event) = events.recv().await else {
                tracing::debug!("Preview event channel closed; cancelling");
                return PreviewOutcome::Cancelled;
            };
            if let Some(outcome) = preview.handle(event) {
                tracing::debug!(?outcome, "Preview resolved");
                return outcome;
            }
            if let Err(e) = overlay.render(&mut self.doc.borrow_mut(), &preview) {
                tracing::warn!(%e, "Could not re-render preview");
            }
        }
    }
}
