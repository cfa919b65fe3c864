use crate::display::Display;
use crate::error::Result;
use cadtris_signals::{GameAction, Snapshot};
use crossbeam_channel::{RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// The game rules. Board layout, pieces and scoring live behind this trait.
pub trait GameRules: Send + 'static {
    /// Serialize the current state. The snapshot must not share data with
    /// the live state.
    fn snapshot(&self) -> Snapshot;

    /// Apply a player action. Returns `true` if the state changed.
    fn apply(&mut self, action: GameAction) -> bool;

    /// Advance one step of game time. Returns `true` if the state changed.
    fn tick(&mut self) -> bool;
}

struct Ticker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns the game state and pushes a snapshot to the display after every change.
pub struct GameModel {
    rules: Mutex<Box<dyn GameRules>>,
    display: Arc<dyn Display>,
    ticker: Mutex<Option<Ticker>>,
    terminated: AtomicBool,
}

impl GameModel {
    /// Create the model and show its initial state once.
    pub fn new(rules: Box<dyn GameRules>, display: Arc<dyn Display>) -> Result<Arc<Self>> {
        let model = Arc::new(Self {
            rules: Mutex::new(rules),
            display,
            ticker: Mutex::new(None),
            terminated: AtomicBool::new(false),
        });
        model.change(|_| true)?;
        Ok(model)
    }

    pub fn serialize(&self) -> Snapshot {
        self.lock_rules().snapshot()
    }

    /// Apply a player action and refresh the display if anything changed.
    pub fn apply(&self, action: GameAction) -> Result<bool> {
        if self.is_terminated() {
            log::debug!("GameModel: ignoring {} after terminate", action);
            return Ok(false);
        }
        self.change(|rules| rules.apply(action))
    }

    /// Advance game time by one step.
    pub fn tick(&self) -> Result<bool> {
        if self.is_terminated() {
            return Ok(false);
        }
        self.change(|rules| rules.tick())
    }

    /// Spawn the background thread that ticks the game every `interval`.
    ///
    /// The thread only holds a weak reference, so dropping the last model
    /// handle also ends it.
    pub fn start_ticker(self: &Arc<Self>, interval: Duration) -> Result<()> {
        let mut slot = self.ticker.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            log::warn!("GameModel: ticker already running");
            return Ok(());
        }

        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let weak: Weak<GameModel> = Arc::downgrade(self);
        let handle = thread::Builder::new()
            .name("cadtris-ticker".to_string())
            .spawn(move || {
                log::debug!("Ticker started ({:?})", interval);
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let Some(model) = weak.upgrade() else { break };
                            if let Err(e) = model.tick() {
                                log::warn!("Game tick failed: {}", e);
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                log::debug!("Ticker stopped");
            })?;

        *slot = Some(Ticker { stop_tx, handle });
        Ok(())
    }

    /// Stop the ticker and refuse further state changes. Idempotent.
    ///
    /// Returns after the ticker thread has exited, so no more display updates
    /// originate from this model afterwards.
    pub fn terminate(&self) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        let ticker = self.ticker.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(ticker) = ticker {
            stop_ticker(ticker);
        }
        log::info!("Game terminated");
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Mutate, snapshot and hand the snapshot to the display under one lock,
    /// so displays receive snapshots in the order the state changed.
    fn change(&self, mutate: impl FnOnce(&mut dyn GameRules) -> bool) -> Result<bool> {
        let mut rules = self.lock_rules();
        let changed = mutate(&mut **rules);
        if changed {
            let snapshot = rules.snapshot();
            self.display.update(snapshot)?;
        }
        Ok(changed)
    }

    fn lock_rules(&self) -> MutexGuard<'_, Box<dyn GameRules>> {
        self.rules.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn stop_ticker(ticker: Ticker) {
    let Ticker { stop_tx, handle } = ticker;
    let _ = stop_tx.try_send(());
    drop(stop_tx);
    // The last strong handle may be released by the ticker itself.
    if handle.thread().id() != thread::current().id() {
        if handle.join().is_err() {
            log::error!("Ticker thread panicked");
        }
    }
}

impl Drop for GameModel {
    fn drop(&mut self) {
        let ticker = self
            .ticker
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(ticker) = ticker {
            stop_ticker(ticker);
        }
    }
}
