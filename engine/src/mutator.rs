//! Writes an accepted candidate back into the captured target.
//!
//! The target is re-derived from the live document, never trusted blindly:
//! a detached host, a missing editing root, or any content change since the
//! capture aborts the write.

use polish_dom::{Boundary, Document, DomEvent, NodeId, Range};
use polish_types::{BlockTag, ContentModel, split_edge_whitespace};

use crate::error::DomUnavailableError;
use crate::tracker::{CaptureTarget, SelectionCapture};

/// Where the caret ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caret {
    /// Character offset in a text field.
    Field(usize),
    /// Collapsed selection in a rich region.
    Range(Boundary),
}

/// Replace the captured selection with `replacement`.
///
/// Whitespace the selection carried at its edges is kept around the
/// replacement. On success an `input` event is dispatched on the host.
pub fn apply(
    doc: &mut Document,
    capture: &SelectionCapture,
    replacement: &str,
) -> Result<Caret, DomUnavailableError> {
    let host = capture.host();
    if !doc.is_connected(host) {
        tracing::debug!("Capture host detached; skipping write");
        return Err(DomUnavailableError::Detached);
    }
    if doc.generation(host) != capture.generation() {
        tracing::debug!(
            captured = capture.generation(),
            current = doc.generation(host),
            "Host changed since capture"
        );
        return Err(DomUnavailableError::Changed);
    }

    let caret = match capture.target() {
        CaptureTarget::Field { start, end } => apply_field(doc, host, start, end, replacement)?,
        CaptureTarget::Range(range) => {
            apply_rich(doc, host, &range, capture.content_model(), replacement)?
        }
    };

    doc.focus(host);
    doc.dispatch(DomEvent::Input {
        target: host,
        bubbles: true,
    });
    tracing::debug!(?caret, "Applied replacement");
    Ok(caret)
}

fn apply_field(
    doc: &mut Document,
    host: NodeId,
    start: usize,
    end: usize,
    replacement: &str,
) -> Result<Caret, DomUnavailableError> {
    let value = doc.field(host).ok_or(DomUnavailableError::Changed)?.value.clone();
    let len = value.chars().count();
    let end = end.min(len);
    let start = start.min(end);

    let prefix: String = value.chars().take(start).collect();
    let selected: String = value.chars().skip(start).take(end - start).collect();
    let suffix: String = value.chars().skip(end).collect();
    let (leading, _, trailing) = split_edge_whitespace(&selected);
    let inserted = format!("{leading}{replacement}{trailing}");

    let caret = start + inserted.chars().count();
    doc.set_field_value(host, format!("{prefix}{inserted}{suffix}"))
        .map_err(|_| DomUnavailableError::Changed)?;
    doc.set_field_selection(host, caret, caret)
        .map_err(|_| DomUnavailableError::Changed)?;
    Ok(Caret::Field(caret))
}

fn apply_rich(
    doc: &mut Document,
    host: NodeId,
    range: &Range,
    model: ContentModel,
    replacement: &str,
) -> Result<Caret, DomUnavailableError> {
    let root = match doc.editable_root(range.start.node) {
        Some(root) if doc.contains(host, root) => root,
        Some(root) if doc.contains(root, host) => host,
        _ => return Err(DomUnavailableError::EditableRootMissing),
    };
    let split = doc
        .split_range(root, range)
        .ok_or(DomUnavailableError::Changed)?;

    let (leading, _, trailing) = split_edge_whitespace(&split.selected);
    let inserted = format!("{leading}{replacement}{trailing}");
    let caret = split.before.chars().count() + inserted.chars().count();
    let full = format!("{}{inserted}{}", split.before, split.after);

    let layout = match model {
        ContentModel::RichBlocks { tag } => Layout::Blocks(tag),
        ContentModel::RichBreaks | ContentModel::Plain => Layout::Breaks,
    };
    let (children, boundary) = render(doc, root, &full, caret, layout);
    doc.replace_children(root, children)
        .map_err(|_| DomUnavailableError::Changed)?;
    doc.set_selection(Range::caret(boundary));
    Ok(Caret::Range(boundary))
}

#[derive(Debug, Clone, Copy)]
enum Layout {
    Blocks(BlockTag),
    Breaks,
}

/// Line and column of character offset `caret` in `text`.
fn locate(text: &str, caret: usize) -> (usize, usize) {
    let mut remaining = caret;
    let mut last = (0, 0);
    for (index, line) in text.split('\n').enumerate() {
        let len = line.chars().count();
        if remaining <= len {
            return (index, remaining);
        }
        remaining -= len + 1;
        last = (index, len);
    }
    last
}

/// Build the new children of `root` and the caret boundary inside them.
fn render(
    doc: &mut Document,
    root: NodeId,
    text: &str,
    caret: usize,
    layout: Layout,
) -> (Vec<NodeId>, Boundary) {
    let (caret_line, caret_column) = locate(text, caret);
    let mut children = Vec::new();
    let mut boundary = Boundary::new(root, 0);

    for (index, line) in text.split('\n').enumerate() {
        match layout {
            Layout::Blocks(tag) => {
                let block = doc.create_element(tag.as_str());
                let content = if line.is_empty() {
                    doc.create_element("br")
                } else {
                    doc.create_text(line)
                };
                // Fresh nodes; appending cannot fail.
                let _ = doc.append_child(block, content);
                if index == caret_line {
                    boundary = if line.is_empty() {
                        Boundary::new(block, 0)
                    } else {
                        Boundary::new(content, caret_column)
                    };
                }
                children.push(block);
            }
            Layout::Breaks => {
                if index > 0 {
                    children.push(doc.create_element("br"));
                }
                if line.is_empty() {
                    if index == caret_line {
                        boundary = Boundary::new(root, children.len());
                    }
                } else {
                    let node = doc.create_text(line);
                    if index == caret_line {
                        boundary = Boundary::new(node, caret_column);
                    }
                    children.push(node);
                }
            }
        }
    }
    (children, boundary)
}
