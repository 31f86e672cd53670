//! Auto-dismissing error notices.

use std::time::{Duration, Instant};

use polish_dom::{Document, NodeId};
use polish_types::truncate_with_ellipsis;

pub const NOTICE_LIFETIME: Duration = Duration::from_secs(3);
pub const NOTICE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone)]
struct Notice {
    node: NodeId,
    message: String,
    expires: Instant,
}

/// Live notices. Each one is a `div.polish-notice` under `<body>`.
#[derive(Debug)]
pub struct NoticeBoard {
    lifetime: Duration,
    active: Vec<Notice>,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::with_lifetime(NOTICE_LIFETIME)
    }
}

impl NoticeBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            lifetime,
            active: Vec::new(),
        }
    }

    /// Mount a notice that expires `lifetime` after `now`.
    pub fn show(&mut self, doc: &mut Document, message: &str, now: Instant) -> NodeId {
        let message = truncate_with_ellipsis(message, NOTICE_MAX_CHARS);
        let node = doc.create_element("div");
        doc.set_attribute(node, "class", "polish-notice");
        doc.set_attribute(node, "role", "alert");
        let text = doc.create_text(message.as_str());
        // Both nodes are fresh elements/text; appending cannot fail.
        let _ = doc.append_child(node, text);
        let _ = doc.append_child(doc.body(), node);
        tracing::debug!(%message, "Showing notice");
        self.active.push(Notice {
            node,
            message,
            expires: now + self.lifetime,
        });
        node
    }

    /// Remove expired notices. Returns how many were removed.
    pub fn sweep(&mut self, doc: &mut Document, now: Instant) -> usize {
        let before = self.active.len();
        self.active.retain(|notice| {
            if notice.expires <= now {
                doc.remove(notice.node);
                false
            } else {
                true
            }
        });
        before - self.active.len()
    }

    /// Remove every notice immediately.
    pub fn clear(&mut self, doc: &mut Document) {
        for notice in self.active.drain(..) {
            doc.remove(notice.node);
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(|notice| notice.message.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
