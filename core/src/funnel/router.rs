use crate::error::{CadtrisError, Result};
use crate::funnel::pump::run_guarded;
use crate::funnel::queue::{Action, ActionQueue};
use crate::funnel::wakeup::WakeupSignal;
use cadtris_signals::Hook;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, ThreadId};

/// How a submitted action was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Ran to completion before `submit` returned.
    Inline,
    /// Queued; the host was asked to wake the pump.
    Deferred,
    /// The command was already torn down; the action was dropped unrun.
    Rejected,
}

/// Decides for every action whether it runs in place or goes through the
/// host's execute hook.
///
/// Routing state is the hook most recently entered via [`enter`]. The main
/// context is the thread the router was created on unless given explicitly.
///
/// [`enter`]: ExecutionRouter::enter
pub struct ExecutionRouter {
    state: AtomicU8,
    main_thread: ThreadId,
    queue: RwLock<ActionQueue>,
    wakeup: WakeupSignal,
    closed: AtomicBool,
}

impl ExecutionRouter {
    pub fn new(wakeup: WakeupSignal) -> Self {
        Self::with_main_thread(wakeup, thread::current().id())
    }

    pub fn with_main_thread(wakeup: WakeupSignal, main_thread: ThreadId) -> Self {
        Self {
            state: AtomicU8::new(Hook::Created.to_u8()),
            main_thread,
            queue: RwLock::new(ActionQueue::new()),
            wakeup,
            closed: AtomicBool::new(false),
        }
    }

    /// Record entry into a lifecycle hook.
    pub fn enter(&self, hook: Hook) {
        let previous = self.state.swap(hook.to_u8(), Ordering::AcqRel);
        log::trace!(
            "Router: {} -> {}",
            Hook::from_u8(previous).unwrap_or(Hook::Created),
            hook
        );
    }

    pub fn current_hook(&self) -> Hook {
        Hook::from_u8(self.state.load(Ordering::Acquire)).unwrap_or(Hook::Created)
    }

    pub fn is_main_context(&self) -> bool {
        thread::current().id() == self.main_thread
    }

    pub fn main_thread(&self) -> ThreadId {
        self.main_thread
    }

    fn can_run_inline(&self, hook: Hook) -> bool {
        self.is_main_context() && hook.is_privileged()
    }

    /// Hand an action to the funnel from any thread.
    ///
    /// Inline failures are returned to the caller. Deferred actions report
    /// failures through the pump.
    pub fn submit<F>(&self, action: F) -> Result<Submission>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.submit_boxed(Box::new(action))
    }

    pub fn submit_boxed(&self, action: Action) -> Result<Submission> {
        if self.is_closed() {
            log::debug!("Router: command torn down, rejecting action");
            return Ok(Submission::Rejected);
        }

        let hook = self.current_hook();
        if self.can_run_inline(hook) {
            run_guarded(hook, action)?;
            return Ok(Submission::Inline);
        }

        {
            // Checked again under the lock: teardown closes before it swaps the queue.
            let queue = self.read_queue();
            if self.is_closed() {
                log::debug!("Router: command torn down, rejecting action");
                return Ok(Submission::Rejected);
            }
            queue.push(action);
        }
        if self.wakeup.raise() {
            log::trace!("Router: wakeup '{}' requested", self.wakeup.id());
        }
        Ok(Submission::Deferred)
    }

    /// Run `action` with direct access to host resources.
    ///
    /// Only legal on the main context while a privileged hook (created or
    /// destroy) is active; anything else is a [`CadtrisError::RoutingViolation`].
    pub fn run_privileged<T, F>(&self, action: F) -> Result<T>
    where
        F: FnOnce() -> anyhow::Result<T>,
    {
        let hook = self.current_hook();
        if !self.can_run_inline(hook) {
            log::error!(
                "Router: privileged call during '{}' (main context: {})",
                hook,
                self.is_main_context()
            );
            return Err(CadtrisError::RoutingViolation { hook });
        }
        run_guarded(hook, action)
    }

    /// Number of queued actions.
    pub fn pending(&self) -> usize {
        self.read_queue().len()
    }

    pub(crate) fn pop(&self) -> Option<Action> {
        self.read_queue().pop()
    }

    /// Swap in a fresh empty queue. Returns how many actions were discarded
    /// without running.
    pub fn reset_queue(&self) -> usize {
        let mut queue = self.write_queue();
        let discarded = queue.len();
        *queue = ActionQueue::new();
        discarded
    }

    /// Reject every later submission.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn wakeup(&self) -> &WakeupSignal {
        &self.wakeup
    }

    fn read_queue(&self) -> RwLockReadGuard<'_, ActionQueue> {
        self.queue.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_queue(&self) -> RwLockWriteGuard<'_, ActionQueue> {
        self.queue.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for ExecutionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionRouter")
            .field("hook", &self.current_hook())
            .field("main_thread", &self.main_thread)
            .field("pending", &self.pending())
            .field("closed", &self.is_closed())
            .finish()
    }
}
