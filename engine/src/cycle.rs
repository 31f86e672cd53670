//! The enhancement cycle: capture, request, preview, write back.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use polish_dom::{Document, DomError, NodeId};
use polish_providers::{ChatTransport, EnhancementClient};
use polish_types::{Objective, Settings};
use tokio::sync::watch;

use crate::error::{CycleError, ValidationError};
use crate::guard::{CycleGuard, CycleTicket};
use crate::mutator::{self, Caret};
use crate::notice::NoticeBoard;
use crate::preview::{CandidatePreview, PreviewOutcome, PreviewPresenter};
use crate::tracker::SelectionTracker;

/// How a cycle ended. Failures have already been surfaced as notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Applied { text: String, caret: Caret },
    Cancelled,
    /// A newer cycle started while this one was waiting; its result was dropped.
    Superseded,
    Failed(CycleError),
}

impl CycleOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, CycleOutcome::Applied { .. })
    }
}

/// Session object for one page: tracker, notices, and the cycle guard.
///
/// All state lives behind `RefCell`s and no borrow is held across an await,
/// so overlapping cycles on one thread are safe; only the newest one's
/// result is ever applied.
pub struct Enhancer<T, P> {
    doc: Rc<RefCell<Document>>,
    client: EnhancementClient<T>,
    presenter: P,
    settings: watch::Receiver<Arc<Settings>>,
    tracker: RefCell<SelectionTracker>,
    notices: RefCell<NoticeBoard>,
    guard: CycleGuard,
}

impl<T: ChatTransport, P: PreviewPresenter> Enhancer<T, P> {
    /// Attach to `doc` using the platform registry from the current settings.
    pub fn new(
        doc: Rc<RefCell<Document>>,
        client: EnhancementClient<T>,
        presenter: P,
        settings: watch::Receiver<Arc<Settings>>,
    ) -> Result<Self, DomError> {
        let snapshot = settings.borrow().clone();
        let tracker =
            SelectionTracker::attach(&mut doc.borrow_mut(), &snapshot.platforms, snapshot.ui)?;
        Ok(Self::with_tracker(doc, tracker, client, presenter, settings))
    }

    pub fn with_tracker(
        doc: Rc<RefCell<Document>>,
        tracker: SelectionTracker,
        client: EnhancementClient<T>,
        presenter: P,
        settings: watch::Receiver<Arc<Settings>>,
    ) -> Self {
        Self {
            doc,
            client,
            presenter,
            settings,
            tracker: RefCell::new(tracker),
            notices: RefCell::new(NoticeBoard::new()),
            guard: CycleGuard::new(),
        }
    }

    #[must_use]
    pub fn document(&self) -> &Rc<RefCell<Document>> {
        &self.doc
    }

    #[must_use]
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Selection changed in the host page. Returns whether it qualifies.
    pub fn selection_changed(&self) -> bool {
        let ui = self.settings.borrow().ui;
        let mut doc = self.doc.borrow_mut();
        self.notices.borrow_mut().sweep(&mut doc, Instant::now());
        let mut tracker = self.tracker.borrow_mut();
        tracker.apply_preferences(&mut doc, ui);
        tracker.on_selection_change(&mut doc)
    }

    pub fn pointer_up(&self) -> bool {
        self.selection_changed()
    }

    pub fn pointer_down(&self, target: NodeId) {
        let mut doc = self.doc.borrow_mut();
        self.tracker.borrow_mut().on_pointer_down(&mut doc, target);
    }

    /// Objective button under a click target.
    #[must_use]
    pub fn objective_at(&self, target: NodeId) -> Option<Objective> {
        self.tracker.borrow().objective_at(&self.doc.borrow(), target)
    }

    /// Run a cycle if `target` is an objective button.
    pub async fn click(&self, target: NodeId) -> Option<CycleOutcome> {
        let objective = self.objective_at(target)?;
        Some(self.enhance(objective).await)
    }

    /// Run a cycle for an objective given by name.
    pub async fn run(&self, objective: &str) -> CycleOutcome {
        match Objective::parse(objective) {
            Some(objective) => self.enhance(objective).await,
            None => {
                let outcome = CycleOutcome::Failed(
                    ValidationError::UnknownObjective(objective.to_string()).into(),
                );
                self.finish(&outcome);
                outcome
            }
        }
    }

    /// Run one full cycle for the current capture.
    ///
    /// Starting a cycle supersedes any cycle still in flight.
    pub async fn enhance(&self, objective: Objective) -> CycleOutcome {
        let ticket = self.guard.begin();
        tracing::debug!(ticket = ticket.id(), %objective, "Cycle started");
        let outcome = self.cycle(ticket, objective).await;
        self.finish(&outcome);
        outcome
    }

    /// Drop expired notices.
    pub fn sweep_notices(&self, now: Instant) -> usize {
        self.notices.borrow_mut().sweep(&mut self.doc.borrow_mut(), now)
    }

    /// Messages of the notices currently shown.
    #[must_use]
    pub fn notices(&self) -> Vec<String> {
        self.notices.borrow().messages().map(str::to_string).collect()
    }

    async fn cycle(&self, ticket: CycleTicket, objective: Objective) -> CycleOutcome {
        let capture = {
            let mut doc = self.doc.borrow_mut();
            self.tracker.borrow_mut().take_capture(&mut doc)
        };
        let Some(capture) = capture else {
            return CycleOutcome::Failed(ValidationError::NothingSelected.into());
        };
        let text = capture.text().trim();
        if text.is_empty() {
            return CycleOutcome::Failed(ValidationError::EmptySelection.into());
        }

        // One snapshot for the whole request; later edits don't reach it.
        let snapshot = self.settings.borrow().clone();
        let request = self.client.enhance(
            text,
            objective,
            &snapshot.style,
            snapshot.credentials.api_key.as_ref(),
        );
        // A newer cycle drops the pending future, and with it any open preview.
        let result = tokio::select! {
            biased;
            () = self.guard.superseded(ticket) => return CycleOutcome::Superseded,
            result = request => result,
        };
        let candidates = match result {
            Ok(candidates) => candidates,
            Err(e) => return CycleOutcome::Failed(e.into()),
        };

        let outcome = tokio::select! {
            biased;
            () = self.guard.superseded(ticket) => return CycleOutcome::Superseded,
            outcome = self.presenter.present(CandidatePreview::new(candidates)) => outcome,
        };
        let PreviewOutcome::Accepted { text, .. } = outcome else {
            return CycleOutcome::Cancelled;
        };

        match mutator::apply(&mut self.doc.borrow_mut(), &capture, &text) {
            Ok(caret) => CycleOutcome::Applied { text, caret },
            Err(e) => CycleOutcome::Failed(e.into()),
        }
    }

    fn finish(&self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::Applied { .. } => tracing::debug!("Cycle applied"),
            CycleOutcome::Cancelled => tracing::debug!("Cycle cancelled"),
            CycleOutcome::Superseded => tracing::debug!("Cycle superseded; dropping result"),
            CycleOutcome::Failed(err) => {
                tracing::warn!(%err, "Cycle failed");
                if let Some(message) = err.notice() {
                    self.notices
                        .borrow_mut()
                        .show(&mut self.doc.borrow_mut(), &message, Instant::now());
                }
            }
        }
    }
}
