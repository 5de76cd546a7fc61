//! Observer trait for flow events.
//!
//! Inject an [`Arc<dyn FlowObserver>`] via
//! [`crate::flow::FlowController::with_observer`] to be told when the flow
//! changes screen, when an analysis fails, and when a submission is handed
//! to the dispatcher. The terminal front-end uses it to start and stop the
//! "Analisando boletim..." spinner; a web front-end could push the same
//! events to a socket.
//!
//! # Example
//!
//! ```rust
//! use encceja_boletim::{AppStep, FlowObserver};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct StepLog(Mutex<Vec<AppStep>>);
//!
//! impl FlowObserver for StepLog {
//!     fn on_step_change(&self, _from: AppStep, to: AppStep) {
//!         self.0.lock().unwrap().push(to);
//!     }
//! }
//!
//! let log = StepLog::default();
//! log.on_step_change(AppStep::Form, AppStep::Analyzing);
//! assert_eq!(*log.0.lock().unwrap(), vec![AppStep::Analyzing]);
//! ```

use std::sync::Arc;

use crate::error::BoletimError;
use crate::output::AppStep;
use crate::pipeline::submit::SubmissionPayload;

/// Called by the flow controller as it moves between screens.
///
/// All methods have default no-op implementations so observers only
/// override what they care about.
pub trait FlowObserver: Send + Sync {
    /// Called after every transition, including reset edges.
    fn on_step_change(&self, from: AppStep, to: AppStep) {
        let _ = (from, to);
    }

    /// Called when encoding or extraction failed, before returning to the form.
    ///
    /// The participant only sees the generic message; this hook receives the
    /// actual cause.
    fn on_analysis_failed(&self, error: &BoletimError) {
        let _ = error;
    }

    /// Called once the submission has been handed off for delivery.
    fn on_submission_dispatched(&self, payload: &SubmissionPayload) {
        let _ = payload;
    }
}

/// A no-op observer. This is the default when none is configured.
pub struct NoopObserver;

impl FlowObserver for NoopObserver {}

/// Convenience alias matching the type stored in the flow controller.
pub type SharedObserver = Arc<dyn FlowObserver>;
