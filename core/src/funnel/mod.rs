//! Cross-thread action funnel.
//!
//! Producers on any thread hand actions to the [`ExecutionRouter`]. During
//! privileged hooks on the main context they run inline; otherwise they are
//! queued and the host is asked (through the [`WakeupSignal`]) to invoke the
//! execute hook, whose body is the [`ConsumerPump`].

pub mod pump;
pub mod queue;
pub mod router;
pub mod wakeup;

pub use pump::{ConsumerPump, DrainReport};
pub use queue::{Action, ActionQueue};
pub use router::{ExecutionRouter, Submission};
pub use wakeup::{Wakeup, WakeupSignal};
