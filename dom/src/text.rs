//! Rendered-text linearization.
//!
//! Rich editors store one line per block element or separate lines with
//! `<br>`. Reading their text the way a user sees it means:
//!
//! - adjacent block elements are separated by a single `\n`
//! - a block with no text (usually `<p><br></p>`) is an empty line
//! - a `<br>` is a `\n`, except the trailing placeholder `<br>` of a block
//!
//! While walking, selection boundaries are mapped to byte positions in the
//! output. A start boundary sitting on a line break lands after it; an end
//! boundary lands before it.

use crate::{Boundary, Document, NodeData, NodeId, Range, is_block_tag};

/// Rendered text of an editing root, cut at a selection range.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RangeSplit {
    pub before: String,
    pub selected: String,
    pub after: String,
}

struct Linearizer<'a> {
    doc: &'a Document,
    root: NodeId,
    out: String,
    /// A line break is owed before the next emitted content.
    need_break: bool,
    /// Something (text or an empty line) has been emitted.
    started: bool,
    emitted: usize,
    range: Option<Range>,
    start_pos: Option<usize>,
    end_pos: Option<usize>,
}

impl<'a> Linearizer<'a> {
    fn new(doc: &'a Document, root: NodeId, range: Option<Range>) -> Self {
        Self {
            doc,
            root,
            out: String::new(),
            need_break: false,
            started: false,
            emitted: 0,
            range,
            start_pos: None,
            end_pos: None,
        }
    }

    fn flush_break(&mut self) {
        if self.need_break {
            self.out.push('\n');
            self.need_break = false;
        }
    }

    fn is_block(&self, id: NodeId) -> bool {
        self.doc.tag_name(id).is_some_and(is_block_tag)
    }

    fn mark(&mut self, node: NodeId, offset: usize, text_byte: Option<usize>) {
        let Some(range) = self.range else {
            return;
        };
        let point = Boundary::new(node, offset);
        let pending = usize::from(self.need_break);
        if range.start == point {
            self.start_pos = Some(text_byte.unwrap_or(self.out.len() + pending));
        }
        if range.end == point {
            self.end_pos = Some(text_byte.unwrap_or(self.out.len()));
        }
    }

    fn walk_children(&mut self, id: NodeId) {
        let doc = self.doc;
        let children = doc.children(id);
        for (index, &child) in children.iter().enumerate() {
            if self.started && self.is_block(child) {
                self.need_break = true;
            }
            self.mark(id, index, None);
            let is_last = index + 1 == children.len();
            self.visit(child, id, is_last);
        }
        self.mark(id, children.len(), None);
    }

    fn visit(&mut self, id: NodeId, parent: NodeId, is_last: bool) {
        let doc = self.doc;
        match &doc.node(id).data {
            NodeData::Text(text) => self.visit_text(id, text),
            NodeData::Element { tag, .. } if tag == "br" => {
                let placeholder = is_last && parent != self.root && self.is_block(parent);
                if !placeholder {
                    self.flush_break();
                    self.out.push('\n');
                    self.started = true;
                    self.emitted += 1;
                }
            }
            NodeData::Element { tag, .. } if is_block_tag(tag) => {
                if self.started {
                    self.need_break = true;
                }
                let mark = self.emitted;
                self.walk_children(id);
                if self.emitted == mark {
                    self.flush_break();
                    self.started = true;
                    self.emitted += 1;
                }
                self.need_break = true;
            }
            NodeData::Element { .. } => self.walk_children(id),
        }
    }

    fn visit_text(&mut self, id: NodeId, text: &str) {
        if text.is_empty() {
            self.mark(id, 0, None);
            return;
        }
        self.flush_break();
        let base = self.out.len();
        if let Some(range) = self.range {
            for point in [range.start, range.end] {
                if point.node == id
                    && let Some(byte) = char_to_byte(text, point.offset)
                {
                    self.mark(id, point.offset, Some(base + byte));
                }
            }
        }
        self.out.push_str(text);
        self.started = true;
        self.emitted += 1;
    }

    fn run(mut self) -> (String, Option<usize>, Option<usize>) {
        self.walk_children(self.root);
        (self.out, self.start_pos, self.end_pos)
    }
}

fn char_to_byte(text: &str, offset: usize) -> Option<usize> {
    text.char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .nth(offset)
}

impl Document {
    /// Text of `root` as the user sees it.
    #[must_use]
    pub fn inner_text(&self, root: NodeId) -> String {
        if let Some(text) = self.text(root) {
            return text.to_string();
        }
        Linearizer::new(self, root, None).run().0
    }

    /// Split the rendered text of `root` at `range`.
    ///
    /// Returns `None` when either boundary lies outside `root` or no longer
    /// resolves to a valid position.
    #[must_use]
    pub fn split_range(&self, root: NodeId, range: &Range) -> Option<RangeSplit> {
        if !self.is_element(root) {
            return None;
        }
        for point in [range.start, range.end] {
            if !self.is_valid_boundary(point) || !self.contains(root, point.node) {
                return None;
            }
        }
        let (text, start, end) = Linearizer::new(self, root, Some(*range)).run();
        let mut start = start?.min(text.len());
        let end = end?.min(text.len()).max(start);
        start = start.min(end);
        Some(RangeSplit {
            before: text[..start].to_string(),
            selected: text[start..end].to_string(),
            after: text[end..].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(doc: &mut Document, tag: &str, lines: &[&str]) -> (NodeId, Vec<NodeId>) {
        let root = doc.create_element("div");
        doc.set_attribute(root, "contenteditable", "true");
        doc.append_child(doc.body(), root).unwrap();
        let mut texts = Vec::new();
        for line in lines {
            let block = doc.create_element(tag);
            doc.append_child(root, block).unwrap();
            if line.is_empty() {
                let br = doc.create_element("br");
                doc.append_child(block, br).unwrap();
                texts.push(br);
            } else {
                let text = doc.create_text(*line);
                doc.append_child(block, text).unwrap();
                texts.push(text);
            }
        }
        (root, texts)
    }

    #[test]
    fn block_lines_join_with_newlines() {
        let mut doc = Document::new();
        let (root, _) = blocks(&mut doc, "p", &["first", "", "third"]);
        assert_eq!(doc.inner_text(root), "first\n\nthird");
    }

    #[test]
    fn single_empty_block_is_one_empty_line() {
        let mut doc = Document::new();
        let (root, _) = blocks(&mut doc, "p", &[""]);
        assert_eq!(doc.inner_text(root), "");
        let (root, _) = blocks(&mut doc, "div", &["", "x"]);
        assert_eq!(doc.inner_text(root), "\nx");
    }

    #[test]
    fn line_breaks_between_inline_text() {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        doc.append_child(doc.body(), root).unwrap();
        for (i, part) in ["a", "b"].iter().enumerate() {
            if i > 0 {
                let br = doc.create_element("br");
                doc.append_child(root, br).unwrap();
                let br = doc.create_element("br");
                doc.append_child(root, br).unwrap();
            }
            let text = doc.create_text(*part);
            doc.append_child(root, text).unwrap();
        }
        assert_eq!(doc.inner_text(root), "a\n\nb");
    }

    #[test]
    fn inline_then_block_breaks_once() {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        doc.append_child(doc.body(), root).unwrap();
        let a = doc.create_text("a");
        let block = doc.create_element("div");
        let b = doc.create_text("b");
        let c = doc.create_text("c");
        doc.append_child(root, a).unwrap();
        doc.append_child(root, block).unwrap();
        doc.append_child(block, b).unwrap();
        doc.append_child(root, c).unwrap();
        assert_eq!(doc.inner_text(root), "a\nb\nc");
    }

    #[test]
    fn split_mid_line_keeps_other_lines() {
        let mut doc = Document::new();
        let (root, texts) = blocks(&mut doc, "p", &["keep me", "fix thiss line", "keep too"]);
        let range = Range::new(Boundary::new(texts[1], 4), Boundary::new(texts[1], 9));
        let split = doc.split_range(root, &range).unwrap();
        assert_eq!(split.before, "keep me\nfix ");
        assert_eq!(split.selected, "thiss");
        assert_eq!(split.after, " line\nkeep too");
    }

    #[test]
    fn split_across_blocks_includes_separator() {
        let mut doc = Document::new();
        let (root, texts) = blocks(&mut doc, "div", &["one", "two"]);
        let range = Range::new(Boundary::new(texts[0], 1), Boundary::new(texts[1], 2));
        let split = doc.split_range(root, &range).unwrap();
        assert_eq!(split.before, "o");
        assert_eq!(split.selected, "ne\ntw");
        assert_eq!(split.after, "o");
    }

    #[test]
    fn element_boundaries_map_around_separators() {
        let mut doc = Document::new();
        let (root, _) = blocks(&mut doc, "p", &["one", "two"]);
        // Select the whole second block by child index.
        let range = Range::new(Boundary::new(root, 1), Boundary::new(root, 2));
        let split = doc.split_range(root, &range).unwrap();
        assert_eq!(split.before, "one\n");
        assert_eq!(split.selected, "two");
        assert_eq!(split.after, "");
    }

    #[test]
    fn select_all_contents() {
        let mut doc = Document::new();
        let (root, _) = blocks(&mut doc, "p", &["a", "", "b"]);
        let end = doc.boundary_limit(root);
        let range = Range::new(Boundary::new(root, 0), Boundary::new(root, end));
        let split = doc.split_range(root, &range).unwrap();
        assert_eq!(split.selected, "a\n\nb");
        assert!(split.before.is_empty() && split.after.is_empty());
    }

    #[test]
    fn multibyte_offsets_are_chars() {
        let mut doc = Document::new();
        let (root, texts) = blocks(&mut doc, "p", &["héllo wörld"]);
        let range = Range::new(Boundary::new(texts[0], 6), Boundary::new(texts[0], 11));
        let split = doc.split_range(root, &range).unwrap();
        assert_eq!(split.selected, "wörld");
    }

    #[test]
    fn boundaries_outside_root_fail() {
        let mut doc = Document::new();
        let (root, _) = blocks(&mut doc, "p", &["inside"]);
        let outside = doc.create_text("outside");
        doc.append_child(doc.body(), outside).unwrap();
        let range = Range::new(Boundary::new(outside, 0), Boundary::new(outside, 3));
        assert!(doc.split_range(root, &range).is_none());

        let (_, texts) = blocks(&mut doc, "p", &["abc"]);
        let too_far = Range::new(Boundary::new(texts[0], 0), Boundary::new(texts[0], 9));
        assert!(doc.split_range(root, &too_far).is_none());
    }
}
