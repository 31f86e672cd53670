//! Selection tracking, preview, and write-back for Polish.
//!
//! # Architecture
//!
//! - [`SelectionTracker`] - qualifies selections inside a platform's compose
//!   surface, owns the current [`SelectionCapture`], and shows the
//!   [`Affordance`] buttons
//! - [`CandidatePreview`] - cursor over candidates; a [`PreviewPresenter`]
//!   drives it to a [`PreviewOutcome`]
//! - [`mutator`] - writes the accepted candidate back into the captured
//!   region and leaves the caret after it
//! - [`Enhancer`] - runs one cycle at a time end to end; a [`CycleGuard`]
//!   drops results from cycles that were superseded
//!
//! Everything here is single-threaded. The document lives in an
//! `Rc<RefCell<_>>` and cycles run on a current-thread runtime.

mod affordance;
mod cycle;
mod error;
mod guard;
pub mod mutator;
mod notice;
mod preview;
mod tracker;

pub use affordance::{AFFORDANCE_OFFSET_PX, Affordance, Position, position_below};
pub use cycle::{CycleOutcome, Enhancer};
pub use error::{CycleError, DomUnavailableError, ValidationError};
pub use guard::{CycleGuard, CycleTicket};
pub use mutator::Caret;
pub use notice::{NOTICE_LIFETIME, NOTICE_MAX_CHARS, NoticeBoard};
pub use preview::{
    CandidatePreview, DocumentPresenter, PREVIEW_TITLE, PreviewController, PreviewEvent,
    PreviewKey, PreviewOutcome, PreviewPresenter, event_for_click,
};
pub use tracker::{CaptureTarget, SelectionCapture, SelectionTracker};
