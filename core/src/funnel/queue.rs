use crossbeam_channel::{Receiver, Sender};

/// A deferred unit of work with its arguments already bound.
pub type Action = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// Unbounded FIFO of pending actions.
///
/// Any thread may push; only the main context pops. Each action is handed out
/// exactly once.
pub struct ActionQueue {
    tx: Sender<Action>,
    rx: Receiver<Action>,
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionQueue {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    pub fn push(&self, action: Action) {
        // The receiver lives as long as `self`, so this cannot disconnect.
        if self.tx.send(action).is_err() {
            log::warn!("ActionQueue: receiver gone, action dropped");
        }
    }

    pub fn pop(&self) -> Option<Action> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl std::fmt::Debug for ActionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionQueue")
            .field("len", &self.len())
            .finish()
    }
}
