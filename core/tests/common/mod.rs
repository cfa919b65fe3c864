#![allow(dead_code)]

use cadtris_core::{
    Cell, CommandControl, ComponentId, DesignType, GameAction, GameRules, Host, ProgressDialog, Snapshot, Voxel,
    VoxelMap, VoxelWorld, Wakeup,
};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

/// Wakeup target that forwards every request into a channel, standing in for
/// the host's event queue.
pub struct ChannelWakeup {
    tx: Sender<String>,
    pub requests: AtomicUsize,
}

impl ChannelWakeup {
    pub fn new() -> (Arc<Self>, Receiver<String>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (
            Arc::new(Self {
                tx,
                requests: AtomicUsize::new(0),
            }),
            rx,
        )
    }

    pub fn count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Wakeup for ChannelWakeup {
    fn request_wakeup(&self, signal_id: &str) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let _ = self.tx.send(signal_id.to_string());
    }
}

#[derive(Debug, Default)]
pub struct WorldLog {
    pub updates: Vec<(usize, Option<ProgressDialog>)>,
    pub grid_sizes: Vec<u32>,
    pub cleared: usize,
    /// Threads on which any world operation ran
    pub threads: Vec<ThreadId>,
}

pub struct FakeWorld {
    component: ComponentId,
    log: Arc<Mutex<WorldLog>>,
}

impl VoxelWorld for FakeWorld {
    fn component(&self) -> ComponentId {
        self.component
    }

    fn update(&mut self, voxels: &VoxelMap, progress: Option<&ProgressDialog>) -> anyhow::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.updates.push((voxels.len(), progress.cloned()));
        log.threads.push(thread::current().id());
        Ok(())
    }

    fn set_grid_size(
        &mut self,
        grid_size: u32,
        _progress: Option<&ProgressDialog>,
    ) -> anyhow::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.grid_sizes.push(grid_size);
        log.threads.push(thread::current().id());
        Ok(())
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.cleared += 1;
        log.threads.push(thread::current().id());
        Ok(())
    }
}

/// In-memory host. Custom event firings go to a channel the test drains.
pub struct FakeHost {
    pub design: Mutex<DesignType>,
    pub confirm_answer: bool,
    pub confirmations: AtomicUsize,
    pub controls: Mutex<Vec<CommandControl>>,
    pub registered: Mutex<Vec<String>>,
    pub fired: AtomicUsize,
    events_tx: Sender<String>,
    pub created: Mutex<Vec<ComponentId>>,
    pub deleted: Mutex<Vec<ComponentId>>,
    pub world: Arc<Mutex<WorldLog>>,
    /// Makes `create_voxel_world` fail while set
    pub fail_voxel_world: AtomicBool,
    next_id: AtomicU64,
}

impl FakeHost {
    pub fn new(design: DesignType, confirm_answer: bool) -> (Arc<Self>, Receiver<String>) {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let host = Arc::new(Self {
            design: Mutex::new(design),
            confirm_answer,
            confirmations: AtomicUsize::new(0),
            controls: Mutex::new(Vec::new()),
            registered: Mutex::new(Vec::new()),
            fired: AtomicUsize::new(0),
            events_tx,
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            world: Arc::new(Mutex::new(WorldLog::default())),
            fail_voxel_world: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        });
        (host, events_rx)
    }

    pub fn direct() -> (Arc<Self>, Receiver<String>) {
        Self::new(DesignType::Direct, true)
    }
}

impl Host for FakeHost {
    fn add_command_control(&self, control: &CommandControl) -> anyhow::Result<()> {
        self.controls.lock().unwrap().push(control.clone());
        Ok(())
    }

    fn register_custom_event(&self, event_id: &str) -> anyhow::Result<()> {
        self.registered.lock().unwrap().push(event_id.to_string());
        Ok(())
    }

    fn unregister_custom_event(&self, event_id: &str) {
        self.registered.lock().unwrap().retain(|e| e != event_id);
    }

    fn fire_custom_event(&self, event_id: &str) {
        self.fired.fetch_add(1, Ordering::SeqCst);
        let _ = self.events_tx.send(event_id.to_string());
    }

    fn design_type(&self) -> DesignType {
        *self.design.lock().unwrap()
    }

    fn set_design_type(&self, design_type: DesignType) -> anyhow::Result<()> {
        *self.design.lock().unwrap() = design_type;
        Ok(())
    }

    fn confirm(&self, _title: &str, _question: &str) -> bool {
        self.confirmations.fetch_add(1, Ordering::SeqCst);
        self.confirm_answer
    }

    fn create_component(&self, _name: &str) -> anyhow::Result<ComponentId> {
        let id = ComponentId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.created.lock().unwrap().push(id);
        Ok(id)
    }

    fn delete_component(&self, component: ComponentId) -> anyhow::Result<()> {
        self.deleted.lock().unwrap().push(component);
        Ok(())
    }

    fn create_voxel_world(
        &self,
        component: ComponentId,
        _voxel_size: f64,
    ) -> anyhow::Result<Box<dyn VoxelWorld>> {
        if self.fail_voxel_world.load(Ordering::SeqCst) {
            anyhow::bail!("renderer unavailable");
        }
        Ok(Box::new(FakeWorld {
            component,
            log: self.world.clone(),
        }))
    }
}

/// One block on a 10x20 board. Moves sideways on key actions, falls on ticks,
/// and a hard drop fills the bottom two rows.
pub struct BlockRules {
    pub x: i32,
    pub y: i32,
    pub filled: bool,
}

impl BlockRules {
    pub fn boxed() -> Box<dyn GameRules> {
        Box::new(Self {
            x: 4,
            y: 0,
            filled: false,
        })
    }
}

impl GameRules for BlockRules {
    fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new(10, 20);
        snapshot.set(Cell::new(self.x, self.y), Voxel::opaque(0, 200, 0));
        if self.filled {
            for y in 18..20 {
                for x in 0..10 {
                    snapshot.set(Cell::new(x, y), Voxel::opaque(90, 90, 90));
                }
            }
        }
        snapshot
    }

    fn apply(&mut self, action: GameAction) -> bool {
        match action {
            GameAction::MoveLeft if self.x > 0 => self.x -= 1,
            GameAction::MoveRight if self.x < 9 => self.x += 1,
            GameAction::HardDrop if !self.filled => self.filled = true,
            _ => return false,
        }
        true
    }

    fn tick(&mut self) -> bool {
        if self.y < 17 {
            self.y += 1;
            true
        } else {
            false
        }
    }
}
