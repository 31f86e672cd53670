//! HTML fixtures in, markup out.
//!
//! Parsing goes through `scraper` (html5ever) so fixtures behave like the
//! markup a browser would build. Whitespace-only text containing a newline is
//! treated as source indentation and dropped, except inside `<pre>` and
//! `<textarea>`.

use scraper::{ElementRef, Html};

use crate::{Document, DomError, NodeData, NodeId};

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

impl Document {
    /// Document whose body holds the parsed `html` fragment.
    #[must_use]
    pub fn from_html(html: &str) -> Self {
        let mut doc = Self::new();
        let body = doc.body();
        // Appending to the freshly created body cannot fail.
        let _ = doc.append_html(body, html);
        doc
    }

    /// Parse `html` and append the resulting nodes to `parent`.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Result<Vec<NodeId>, DomError> {
        if !self.is_element(parent) {
            return Err(DomError::NotAContainer(parent));
        }
        let fragment = Html::parse_fragment(html);
        let before = self.children(parent).len();
        self.import_children(parent, fragment.root_element(), false)?;
        Ok(self.children(parent)[before..].to_vec())
    }

    fn import_children(
        &mut self,
        parent: NodeId,
        source: ElementRef<'_>,
        keep_whitespace: bool,
    ) -> Result<(), DomError> {
        for child in source.children() {
            if let Some(element) = ElementRef::wrap(child) {
                let tag = element.value().name();
                let id = self.create_element(tag);
                for (name, value) in element.value().attrs() {
                    self.set_attribute(id, name, value);
                }
                self.append_child(parent, id)?;
                let keep = keep_whitespace || matches!(tag, "pre" | "textarea");
                self.import_children(id, element, keep)?;
                self.init_field(id);
            } else if let Some(text) = child.value().as_text() {
                let text: &str = text;
                if !keep_whitespace && text.contains('\n') && text.trim().is_empty() {
                    continue;
                }
                let id = self.create_text(text);
                self.append_child(parent, id)?;
            }
        }
        Ok(())
    }

    /// Seed a text field's value from parsed markup.
    fn init_field(&mut self, id: NodeId) {
        let value = match self.tag_name(id) {
            Some("textarea") => self.text_content(id),
            Some("input") => self.attribute(id, "value").unwrap_or_default().to_string(),
            _ => return,
        };
        if let Some(field) = self.fields.get_mut(&id) {
            field.value = value;
            field.clamp_selection();
        }
    }

    /// Serialized children of `id`.
    #[must_use]
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_html(child, &mut out);
        }
        out
    }

    /// Serialized `id` including its own tag.
    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match &self.node(id).data {
            NodeData::Text(text) => escape_into(text, false, out),
            NodeData::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_TAGS.contains(&tag.as_str()) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}
