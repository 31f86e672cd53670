//! In-memory model of a host page's document.
//!
//! The enhancement pipeline never talks to a browser directly. It reads and
//! writes this arena of element and text nodes, which carries the handful of
//! host facilities the pipeline relies on:
//!
//! - a single selection [`Range`] plus the focused element
//! - value-based text fields ([`TextField`]) with their own selection
//! - layout facts supplied by the host (selection rectangle, scroll origin)
//! - an event log for synthetic events the pipeline dispatches
//!
//! Every node keeps a content generation counter. Any change to a node's child
//! list, character data, or field value bumps the counter on the node and all of
//! its ancestors, so comparing a host's generation before and after tells whether
//! anything inside it changed.

mod html;
mod selection;
mod text;

pub use selection::{Boundary, DomEvent, Range, Rect, ScrollOffset, TextField};
pub use text::RangeSplit;

use std::collections::HashMap;
use std::iter;

use polish_types::{Selector, SelectorSubject};
use thiserror::Error;

/// Handle to a node. Only meaningful for the document that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {0:?} cannot have children")]
    NotAContainer(NodeId),
    #[error("inserting {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("node {0:?} is not a text field")]
    NotATextField(NodeId),
    #[error("node {0:?} is not a text node")]
    NotText(NodeId),
}

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
    generation: u64,
}

const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "blockquote",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "ol",
    "p",
    "pre",
    "section",
    "ul",
];

/// Elements that start a new line in rendered text.
#[must_use]
pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

/// Element borrowed for selector evaluation.
#[derive(Clone, Copy)]
pub struct ElementView<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl SelectorSubject for ElementView<'_> {
    fn tag_name(&self) -> &str {
        self.doc.tag_name(self.id).unwrap_or_default()
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.doc.attribute(self.id, name)
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
    hostname: String,
    selection: Option<Range>,
    active: Option<NodeId>,
    fields: HashMap<NodeId, TextField>,
    selection_rect: Option<Rect>,
    scroll: ScrollOffset,
    events: Vec<DomEvent>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document containing only `<body>`.
    #[must_use]
    pub fn new() -> Self {
        let body = Node {
            parent: None,
            children: Vec::new(),
            data: NodeData::Element {
                tag: "body".to_string(),
                attributes: Vec::new(),
            },
            generation: 0,
        };
        Self {
            nodes: vec![body],
            body: NodeId(0),
            hostname: String::new(),
            selection: None,
            active: None,
            fields: HashMap::new(),
            selection_rect: None,
            scroll: ScrollOffset::default(),
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn body(&self) -> NodeId {
        self.body
    }

    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn set_hostname(&mut self, hostname: impl Into<String>) {
        self.hostname = hostname.into();
    }

    // ------------------------------------------------------------------
    // Construction and tree structure
    // ------------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let tag = tag.to_ascii_lowercase();
        let is_field = matches!(tag.as_str(), "input" | "textarea");
        let id = self.push_node(NodeData::Element {
            tag,
            attributes: Vec::new(),
        });
        if is_field {
            self.fields.insert(id, TextField::default());
        }
        id
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeData::Text(text.into()))
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
            generation: 0,
        });
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Bump the content generation of `id` and every ancestor.
    fn touch(&mut self, id: NodeId) {
        let chain: Vec<NodeId> = self.inclusive_ancestors(id).collect();
        for node in chain {
            self.node_mut(node).generation += 1;
        }
    }

    #[must_use]
    pub fn generation(&self, id: NodeId) -> u64 {
        self.node(id).generation
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if !self.is_element(parent) {
            return Err(DomError::NotAContainer(parent));
        }
        if self.contains(child, parent) {
            return Err(DomError::Cycle { parent, child });
        }
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
        self.touch(parent);
        Ok(())
    }

    /// Detach `id` from its parent. The node and its subtree stay valid.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        self.touch(parent);
        self.node_mut(parent).children.retain(|&c| c != id);
        self.node_mut(id).parent = None;
    }

    /// Replace every child of `parent` with `children`, in order.
    pub fn replace_children(
        &mut self,
        parent: NodeId,
        children: Vec<NodeId>,
    ) -> Result<(), DomError> {
        if !self.is_element(parent) {
            return Err(DomError::NotAContainer(parent));
        }
        for &child in &children {
            if self.contains(child, parent) {
                return Err(DomError::Cycle { parent, child });
            }
        }
        let old = self.node(parent).children.clone();
        for child in old {
            self.detach(child);
        }
        for child in children {
            self.append_child(parent, child)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Parent chain of `id`, nearest first, excluding `id`.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(self.parent(id), |&n| self.parent(n))
    }

    /// `id` followed by its parent chain.
    pub fn inclusive_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(Some(id), |&n| self.parent(n))
    }

    /// True when `node` is `ancestor` or lies inside it.
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.inclusive_ancestors(node).any(|n| n == ancestor)
    }

    /// True when `id` is reachable from `<body>`.
    #[must_use]
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.body, id)
    }

    /// Descendants of `root` in document order, excluding `root`.
    #[must_use]
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    // ------------------------------------------------------------------
    // Node data
    // ------------------------------------------------------------------

    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Element { .. })
    }

    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element { tag, .. } => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    /// Character data of a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Text(text) => Some(text),
            NodeData::Element { .. } => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) -> Result<(), DomError> {
        match &mut self.node_mut(id).data {
            NodeData::Text(text) => *text = value.into(),
            NodeData::Element { .. } => return Err(DomError::NotText(id)),
        }
        self.touch(id);
        Ok(())
    }

    /// Concatenated character data of every descendant text node.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Largest valid boundary offset inside `id`.
    #[must_use]
    pub fn boundary_limit(&self, id: NodeId) -> usize {
        match &self.node(id).data {
            NodeData::Text(text) => text.chars().count(),
            NodeData::Element { .. } => self.node(id).children.len(),
        }
    }

    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            NodeData::Text(_) => None,
        }
    }

    /// Attributes of an element in insertion order.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match &self.node(id).data {
            NodeData::Element { attributes, .. } => attributes,
            NodeData::Text(_) => &[],
        }
    }

    /// Set an attribute. Ignored on text nodes.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let NodeData::Element { attributes, .. } = &mut self.node_mut(id).data else {
            return;
        };
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => attributes.push((name, value)),
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.node_mut(id).data {
            attributes.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        }
    }

    #[must_use]
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attribute(id, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) || !self.is_element(id) {
            return;
        }
        let classes = match self.attribute(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attribute(id, "class", classes);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(existing) = self.attribute(id, "class") else {
            return;
        };
        let remaining = existing
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(id, "class", remaining);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Selector view of an element; `None` for text nodes.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<ElementView<'_>> {
        self.is_element(id).then_some(ElementView { doc: self, id })
    }

    #[must_use]
    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        self.element(id).is_some_and(|el| selector.matches(&el))
    }

    /// Nearest element, starting at `id` itself, that matches `selector`.
    #[must_use]
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        self.inclusive_ancestors(id)
            .find(|&n| self.matches(n, selector))
    }

    /// Matching descendants of `root` in document order.
    #[must_use]
    pub fn query_all(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&n| self.matches(n, selector))
            .collect()
    }

    #[must_use]
    pub fn query(&self, root: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&n| self.matches(n, selector))
    }

    /// Connected element with the given `id` attribute.
    #[must_use]
    pub fn element_by_id(&self, id_attr: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|&n| self.attribute(n, "id") == Some(id_attr))
    }

    /// Nearest editing host containing `id`.
    ///
    /// An explicit `contenteditable="false"` on the way up ends the search.
    #[must_use]
    pub fn editable_root(&self, id: NodeId) -> Option<NodeId> {
        for node in self.inclusive_ancestors(id) {
            match self.attribute(node, "contenteditable") {
                Some(value) if value.eq_ignore_ascii_case("false") => return None,
                Some(value)
                    if value.is_empty()
                        || value.eq_ignore_ascii_case("true")
                        || value.eq_ignore_ascii_case("plaintext-only") =>
                {
                    return Some(node);
                }
                _ => {}
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // Text fields
    // ------------------------------------------------------------------

    /// True for `<textarea>` and text-like `<input>` elements.
    #[must_use]
    pub fn is_text_field(&self, id: NodeId) -> bool {
        match self.tag_name(id) {
            Some("textarea") => true,
            Some("input") => matches!(
                self.attribute(id, "type")
                    .map(str::to_ascii_lowercase)
                    .as_deref(),
                None | Some("" | "text" | "search" | "email" | "url" | "tel")
            ),
            _ => false,
        }
    }

    #[must_use]
    pub fn field(&self, id: NodeId) -> Option<&TextField> {
        if !self.is_text_field(id) {
            return None;
        }
        self.fields.get(&id)
    }

    /// Replace a field's value. The field selection is clamped to the new length.
    pub fn set_field_value(
        &mut self,
        id: NodeId,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        if !self.is_text_field(id) {
            return Err(DomError::NotATextField(id));
        }
        let field = self.fields.entry(id).or_default();
        field.value = value.into();
        field.clamp_selection();
        self.touch(id);
        Ok(())
    }

    pub fn set_field_selection(
        &mut self,
        id: NodeId,
        start: usize,
        end: usize,
    ) -> Result<(), DomError> {
        if !self.is_text_field(id) {
            return Err(DomError::NotATextField(id));
        }
        let field = self.fields.entry(id).or_default();
        field.selection_start = start;
        field.selection_end = end;
        field.clamp_selection();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Selection, focus, layout, events
    // ------------------------------------------------------------------

    #[must_use]
    pub fn selection(&self) -> Option<Range> {
        self.selection
    }

    pub fn set_selection(&mut self, range: Range) {
        self.selection = Some(range);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// True when `boundary` names an existing connected point.
    #[must_use]
    pub fn is_valid_boundary(&self, boundary: Boundary) -> bool {
        boundary.node.0 < self.nodes.len()
            && self.is_connected(boundary.node)
            && boundary.offset <= self.boundary_limit(boundary.node)
    }

    pub fn focus(&mut self, id: NodeId) {
        self.active = Some(id);
    }

    pub fn blur(&mut self) {
        self.active = None;
    }

    /// Focused element, if it is still in the document.
    #[must_use]
    pub fn active_element(&self) -> Option<NodeId> {
        self.active.filter(|&id| self.is_connected(id))
    }

    #[must_use]
    pub fn selection_rect(&self) -> Option<Rect> {
        self.selection_rect
    }

    pub fn set_selection_rect(&mut self, rect: Option<Rect>) {
        self.selection_rect = rect;
    }

    #[must_use]
    pub fn scroll(&self) -> ScrollOffset {
        self.scroll
    }

    pub fn set_scroll(&mut self, x: f64, y: f64) {
        self.scroll = ScrollOffset { x, y };
    }

    pub fn dispatch(&mut self, event: DomEvent) {
        tracing::trace!(?event, "dispatch");
        self.events.push(event);
    }

    #[must_use]
    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }
}
