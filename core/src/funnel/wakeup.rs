use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Host side of the wakeup channel: asks the host to invoke the execute hook
/// "soon". Delivery may be delayed or coalesced by the host.
pub trait Wakeup: Send + Sync {
    fn request_wakeup(&self, signal_id: &str);
}

/// Coalescing wakeup handle, one per command instance.
///
/// Only the first raise after each acknowledgement reaches the host; further
/// raises while a wakeup is pending are absorbed. The pump acknowledges before
/// draining, so anything enqueued after the drain started triggers a new
/// request.
pub struct WakeupSignal {
    id: String,
    target: Arc<dyn Wakeup>,
    pending: AtomicBool,
    forwarded: AtomicU64,
}

impl WakeupSignal {
    pub fn new(id: impl Into<String>, target: Arc<dyn Wakeup>) -> Self {
        Self {
            id: id.into(),
            target,
            pending: AtomicBool::new(false),
            forwarded: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns `true` if the request was forwarded to the host.
    pub fn raise(&self) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.forwarded.fetch_add(1, Ordering::Relaxed);
        self.target.request_wakeup(&self.id);
        true
    }

    /// Clears the pending flag. Called by the pump before it drains.
    pub fn acknowledge(&self) {
        // RMW so the pump synchronizes with the last producer that raised.
        self.pending.swap(false, Ordering::AcqRel);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Number of requests that actually reached the host.
    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for WakeupSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeupSignal")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
            .field("forwarded", &self.forwarded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingHost {
        requests: Mutex<Vec<String>>,
    }

    impl Wakeup for CountingHost {
        fn request_wakeup(&self, signal_id: &str) {
            self.requests.lock().unwrap().push(signal_id.to_string());
        }
    }

    #[test]
    fn test_raise_coalesces_until_acknowledged() {
        let host = Arc::new(CountingHost::default());
        let signal = WakeupSignal::new("evt", host.clone());

        assert!(signal.raise());
        assert!(!signal.raise());
        assert!(!signal.raise());
        assert!(signal.is_pending());
        assert_eq!(host.requests.lock().unwrap().len(), 1);

        signal.acknowledge();
        assert!(!signal.is_pending());
        assert!(signal.raise());

        assert_eq!(signal.forwarded(), 2);
        assert_eq!(*host.requests.lock().unwrap(), vec!["evt", "evt"]);
    }

    #[test]
    fn test_acknowledge_without_raise_is_harmless() {
        let host = Arc::new(CountingHost::default());
        let signal = WakeupSignal::new("evt", host.clone());
        signal.acknowledge();
        signal.acknowledge();
        assert_eq!(signal.forwarded(), 0);
        assert!(host.requests.lock().unwrap().is_empty());
    }
}
