//! Selection tracking: which selections qualify, and what gets captured.

use polish_dom::{Document, DomError, NodeId, Range, Rect};
use polish_types::{ContentModel, Objective, PlatformProfile, PlatformRegistry, UiPreferences};

use crate::affordance::Affordance;

/// What a capture points at inside its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTarget {
    /// Boundaries inside a content-editable region.
    Range(Range),
    /// Character offsets into a text field's value.
    Field { start: usize, end: usize },
}

/// Durable reference to a qualifying selection.
///
/// Valid only against the document state it was taken from: the host's
/// generation is recorded so later writes can detect intervening edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCapture {
    host: NodeId,
    target: CaptureTarget,
    text: String,
    content_model: ContentModel,
    generation: u64,
}

impl SelectionCapture {
    #[must_use]
    pub fn host(&self) -> NodeId {
        self.host
    }

    #[must_use]
    pub fn target(&self) -> CaptureTarget {
        self.target
    }

    /// Selected text as rendered, edge whitespace included.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn content_model(&self) -> ContentModel {
        self.content_model
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_live(&self, doc: &Document) -> bool {
        doc.is_connected(self.host)
    }
}

/// Watches selection events for one page and owns the current capture.
#[derive(Debug)]
pub struct SelectionTracker {
    profile: Option<PlatformProfile>,
    capture: Option<SelectionCapture>,
    affordance: Affordance,
}

impl SelectionTracker {
    /// Track `doc` using the profile registered for its hostname.
    pub fn attach(
        doc: &mut Document,
        registry: &PlatformRegistry,
        ui: UiPreferences,
    ) -> Result<Self, DomError> {
        let profile = registry.for_host(doc.hostname()).cloned();
        match &profile {
            Some(profile) => tracing::debug!(platform = profile.name(), "Tracking selections"),
            None => tracing::debug!(host = doc.hostname(), "No platform profile; tracker inactive"),
        }
        Self::with_profile(doc, profile, ui)
    }

    pub fn with_profile(
        doc: &mut Document,
        profile: Option<PlatformProfile>,
        ui: UiPreferences,
    ) -> Result<Self, DomError> {
        Ok(Self {
            profile,
            capture: None,
            affordance: Affordance::mount(doc, ui)?,
        })
    }

    #[must_use]
    pub fn profile(&self) -> Option<&PlatformProfile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn affordance(&self) -> &Affordance {
        &self.affordance
    }

    pub fn apply_preferences(&mut self, doc: &mut Document, ui: UiPreferences) {
        self.affordance.apply_preferences(doc, ui);
    }

    /// Editable surfaces under the profile's observation root.
    #[must_use]
    pub fn surfaces(&self, doc: &Document) -> Vec<NodeId> {
        let Some(profile) = &self.profile else {
            return Vec::new();
        };
        let root = profile
            .observe_root()
            .and_then(|selector| doc.query(doc.body(), selector))
            .unwrap_or_else(|| doc.body());
        doc.query_all(root, profile.surface())
    }

    /// Re-evaluate the selection. Returns whether it qualifies.
    pub fn on_selection_change(&mut self, doc: &mut Document) -> bool {
        match self.compute(doc) {
            Some(capture) => {
                let rect = doc.selection_rect().unwrap_or_default();
                self.show(doc, capture, rect);
                true
            }
            None => {
                self.release(doc);
                false
            }
        }
    }

    pub fn on_pointer_up(&mut self, doc: &mut Document) -> bool {
        self.on_selection_change(doc)
    }

    /// Pointer-down anywhere but the affordance dismisses it.
    pub fn on_pointer_down(&mut self, doc: &mut Document, target: NodeId) {
        if !self.affordance.contains(doc, target) {
            self.release(doc);
        }
    }

    /// Objective button under `target`, if any.
    #[must_use]
    pub fn objective_at(&self, doc: &Document, target: NodeId) -> Option<Objective> {
        self.affordance.objective_at(doc, target)
    }

    /// Current capture; a capture whose host left the document is dropped.
    pub fn capture(&mut self, doc: &Document) -> Option<&SelectionCapture> {
        if self.capture.as_ref().is_some_and(|c| !c.is_live(doc)) {
            tracing::debug!("Dropping capture of detached host");
            self.capture = None;
        }
        self.capture.as_ref()
    }

    /// Hand the capture to a cycle and hide the affordance.
    pub fn take_capture(&mut self, doc: &mut Document) -> Option<SelectionCapture> {
        self.affordance.hide(doc);
        self.capture.take().filter(|c| c.is_live(doc))
    }

    /// Drop the capture and hide the affordance.
    pub fn release(&mut self, doc: &mut Document) {
        self.capture = None;
        self.affordance.hide(doc);
    }

    fn show(&mut self, doc: &mut Document, capture: SelectionCapture, rect: Rect) {
        self.capture = Some(capture);
        self.affordance.show_at(doc, rect);
    }

    fn compute(&self, doc: &Document) -> Option<SelectionCapture> {
        let profile = self.profile.as_ref()?;
        if let Some(capture) = field_capture(doc, profile) {
            return Some(capture);
        }
        range_capture(doc, profile)
    }
}

fn field_capture(doc: &Document, profile: &PlatformProfile) -> Option<SelectionCapture> {
    let host = doc.active_element()?;
    let field = doc.field(host)?;
    if field.selection_start == field.selection_end {
        return None;
    }
    doc.closest(host, profile.surface())?;
    let text = field.selected_text();
    if text.trim().is_empty() {
        return None;
    }
    Some(SelectionCapture {
        host,
        target: CaptureTarget::Field {
            start: field.selection_start,
            end: field.selection_end,
        },
        text,
        content_model: ContentModel::Plain,
        generation: doc.generation(host),
    })
}

fn range_capture(doc: &Document, profile: &PlatformProfile) -> Option<SelectionCapture> {
    let range = doc.selection()?;
    if range.is_collapsed() {
        return None;
    }
    let anchor = range.start.node;
    let anchor_element = if doc.is_element(anchor) {
        anchor
    } else {
        doc.parent(anchor)?
    };
    let host = doc.closest(anchor_element, profile.surface())?;
    if !doc.contains(host, range.end.node) {
        return None;
    }
    let split = doc.split_range(host, &range)?;
    if split.selected.trim().is_empty() {
        return None;
    }
    let content_model = if doc.is_text_field(host) {
        ContentModel::Plain
    } else {
        match profile.content_model() {
            ContentModel::Plain => ContentModel::RichBreaks,
            rich => rich,
        }
    };
    Some(SelectionCapture {
        host,
        target: CaptureTarget::Range(range),
        text: split.selected,
        content_model,
        generation: doc.generation(host),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polish_dom::Boundary;
    use polish_types::{BlockTag, Selector};

    fn slack_doc() -> (Document, NodeId, NodeId) {
        let mut doc = Document::from_html(
            r#"<div class="p-workspace__primary_view_contents">
                 <div class="ql-editor" contenteditable="true"><p>hello there</p><p>second line</p></div>
               </div>
               <div class="sidebar"><span>not editable</span></div>"#,
        );
        doc.set_hostname("app.slack.com");
        let editor = doc
            .query(doc.body(), &Selector::parse(".ql-editor").unwrap())
            .unwrap();
        let first_text = doc.children(doc.children(editor)[0])[0];
        (doc, editor, first_text)
    }

    fn tracker(doc: &mut Document) -> SelectionTracker {
        SelectionTracker::attach(doc, &PlatformRegistry::builtin(), UiPreferences::default())
            .unwrap()
    }

    #[test]
    fn qualifying_selection_captures_and_shows() {
        let (mut doc, editor, text) = slack_doc();
        let mut tracker = tracker(&mut doc);
        doc.set_selection(Range::new(Boundary::new(text, 6), Boundary::new(text, 11)));
        doc.set_selection_rect(Some(Rect::new(10.0, 20.0, 50.0, 14.0)));

        assert!(tracker.on_selection_change(&mut doc));
        assert!(tracker.affordance().is_visible(&doc));
        let capture = tracker.capture(&doc).unwrap();
        assert_eq!(capture.host(), editor);
        assert_eq!(capture.text(), "there");
        assert_eq!(
            capture.content_model(),
            ContentModel::RichBlocks {
                tag: BlockTag::Paragraph
            }
        );
        assert_eq!(capture.generation(), doc.generation(editor));
        let pos = tracker.affordance().position();
        assert!((pos.top - 44.0).abs() < f64::EPSILON);
        assert!((pos.left - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn collapsed_or_blank_selection_hides() {
        let (mut doc, _, text) = slack_doc();
        let mut tracker = tracker(&mut doc);
        doc.set_selection(Range::new(Boundary::new(text, 0), Boundary::new(text, 5)));
        assert!(tracker.on_selection_change(&mut doc));

        doc.set_selection(Range::caret(Boundary::new(text, 3)));
        assert!(!tracker.on_selection_change(&mut doc));
        assert!(!tracker.affordance().is_visible(&doc));
        assert!(tracker.capture(&doc).is_none());

        doc.set_selection(Range::new(Boundary::new(text, 5), Boundary::new(text, 6)));
        assert!(!tracker.on_selection_change(&mut doc));
    }

    #[test]
    fn selection_outside_surface_is_inactive() {
        let (mut doc, _, _) = slack_doc();
        let mut tracker = tracker(&mut doc);
        let span = doc
            .query(doc.body(), &Selector::parse("span").unwrap())
            .unwrap();
        let text = doc.children(span)[0];
        doc.set_selection(Range::new(Boundary::new(text, 0), Boundary::new(text, 3)));
        assert!(!tracker.on_selection_change(&mut doc));
    }

    #[test]
    fn unknown_host_never_qualifies() {
        let (mut doc, _, text) = slack_doc();
        doc.set_hostname("example.org");
        let mut tracker = tracker(&mut doc);
        assert!(tracker.profile().is_none());
        doc.set_selection(Range::new(Boundary::new(text, 0), Boundary::new(text, 5)));
        assert!(!tracker.on_selection_change(&mut doc));
        assert!(tracker.surfaces(&doc).is_empty());
    }

    #[test]
    fn pointer_down_outside_dismisses() {
        let (mut doc, editor, text) = slack_doc();
        let mut tracker = tracker(&mut doc);
        doc.set_selection(Range::new(Boundary::new(text, 0), Boundary::new(text, 5)));
        tracker.on_pointer_up(&mut doc);

        let button = doc.children(tracker.affordance().root())[0];
        tracker.on_pointer_down(&mut doc, button);
        assert!(tracker.capture(&doc).is_some());

        tracker.on_pointer_down(&mut doc, editor);
        assert!(tracker.capture(&doc).is_none());
        assert!(!tracker.affordance().is_visible(&doc));
    }

    #[test]
    fn detached_host_invalidates_capture() {
        let (mut doc, editor, text) = slack_doc();
        let mut tracker = tracker(&mut doc);
        doc.set_selection(Range::new(Boundary::new(text, 0), Boundary::new(text, 5)));
        tracker.on_selection_change(&mut doc);
        doc.remove(editor);
        assert!(tracker.capture(&doc).is_none());
        assert!(tracker.take_capture(&mut doc).is_none());
    }

    #[test]
    fn focused_text_field_is_captured_by_offsets() {
        let mut doc = Document::from_html(r#"<textarea class="composer">i seen him</textarea>"#);
        doc.set_hostname("chat.example.com");
        let field = doc.query(doc.body(), &Selector::parse("textarea").unwrap()).unwrap();
        let profile = PlatformProfile::new(
            "intranet",
            vec!["chat.example.com".to_string()],
            Selector::parse("textarea.composer").unwrap(),
            ContentModel::Plain,
            None,
        );
        let mut tracker =
            SelectionTracker::with_profile(&mut doc, Some(profile), UiPreferences::default())
                .unwrap();
        doc.focus(field);
        doc.set_field_selection(field, 2, 6).unwrap();

        assert!(tracker.on_selection_change(&mut doc));
        let capture = tracker.take_capture(&mut doc).unwrap();
        assert_eq!(capture.target(), CaptureTarget::Field { start: 2, end: 6 });
        assert_eq!(capture.text(), "seen");
        assert_eq!(capture.content_model(), ContentModel::Plain);
        assert!(!tracker.affordance().is_visible(&doc));
        assert!(tracker.capture(&doc).is_none());
    }

    #[test]
    fn surfaces_are_found_under_observe_root() {
        let (mut doc, editor, _) = slack_doc();
        let tracker = tracker(&mut doc);
        assert_eq!(tracker.surfaces(&doc), vec![editor]);
    }
}
