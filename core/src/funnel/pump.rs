use crate::error::{CadtrisError, Result};
use crate::funnel::router::ExecutionRouter;
use cadtris_signals::Hook;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Outcome of one pump invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Actions taken off the queue and run, failed ones included
    pub executed: usize,
    pub failed: usize,
}

/// Drains the action queue on the main context.
///
/// Failing or panicking actions are logged and counted; the drain carries on
/// with the next action, so one bad action never strands the rest.
pub struct ConsumerPump {
    router: Arc<ExecutionRouter>,
}

impl ConsumerPump {
    pub fn new(router: Arc<ExecutionRouter>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Arc<ExecutionRouter> {
        &self.router
    }

    /// Run every queued action in FIFO order until the queue is empty.
    ///
    /// Actions queued while draining (by other threads, or by the actions
    /// themselves) are picked up by this same call.
    pub fn pump(&self) -> DrainReport {
        self.router.wakeup().acknowledge();

        let hook = self.router.current_hook();
        let mut report = DrainReport::default();
        while let Some(action) = self.router.pop() {
            report.executed += 1;
            if let Err(e) = run_guarded(hook, action) {
                report.failed += 1;
                log::error!("Deferred action #{} failed: {}", report.executed, e);
            }
        }

        log::debug!("Executed {} actions.", report.executed);
        report
    }
}

/// Run an action, turning errors and panics into [`CadtrisError`]s.
pub(crate) fn run_guarded<T, F>(hook: Hook, action: F) -> Result<T>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    match catch_unwind(AssertUnwindSafe(action)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(CadtrisError::ActionFailed {
            hook,
            source: e.into(),
        }),
        Err(payload) => Err(CadtrisError::ActionPanicked {
            hook,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
