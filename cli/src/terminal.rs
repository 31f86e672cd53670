//! Preview presenter for a terminal: candidates on stderr, keys on a reader.

use std::cell::RefCell;
use std::io::Write;

use polish_engine::{
    CandidatePreview, PREVIEW_TITLE, PreviewEvent, PreviewOutcome, PreviewPresenter,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Mutex;

const HINT: &str = "[n]ext  [p]revious  [a]pply (Enter)  [q]uit";

/// One command per line: `n`, `p`, `a` or an empty line, `q`.
pub struct TerminalPresenter<R, W> {
    input: Mutex<R>,
    output: RefCell<W>,
}

impl<R, W> TerminalPresenter<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Mutex::new(input),
            output: RefCell::new(output),
        }
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output.into_inner()
    }

    // Write failures only lose the rendering; the outcome still comes from input.
    fn render(&self, preview: &CandidatePreview) {
        let mut out = self.output.borrow_mut();
        let _ = writeln!(out, "\n{PREVIEW_TITLE} ({})", preview.counter_label());
        let _ = writeln!(out, "{}", "-".repeat(PREVIEW_TITLE.len()));
        let _ = writeln!(out, "{}", preview.current());
        let _ = writeln!(out, "{}", "-".repeat(PREVIEW_TITLE.len()));
        let _ = write!(out, "{HINT} > ");
        let _ = out.flush();
    }

    fn unknown(&self, command: &str) {
        let _ = writeln!(self.output.borrow_mut(), "unknown command: {command:?}");
    }
}

fn parse_command(line: &str) -> Option<PreviewEvent> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "a" | "apply" => Some(PreviewEvent::Accept),
        "n" | "next" => Some(PreviewEvent::Next),
        "p" | "prev" | "previous" => Some(PreviewEvent::Previous),
        "q" | "quit" | "cancel" => Some(PreviewEvent::Cancel),
        _ => None,
    }
}

impl<R, W> PreviewPresenter for TerminalPresenter<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    async fn present(&self, mut preview: CandidatePreview) -> PreviewOutcome {
        let mut input = self.input.lock().await;
        let mut line = String::new();
        loop {
            self.render(&preview);
            line.clear();
            match input.read_line(&mut line).await {
                Ok(0) => return PreviewOutcome::Cancelled,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(%e, "Preview input failed; cancelling");
                    return PreviewOutcome::Cancelled;
                }
            }
            let Some(event) = parse_command(&line) else {
                self.unknown(line.trim());
                continue;
            };
            if let Some(outcome) = preview.handle(event) {
                return outcome;
            }
        }
    }
}
