use cadtris_core::display::render_ascii;
use cadtris_core::{
    CommandControl, ComponentId, DesignType, Host, InputId, InputValue, KeyCode, ProgressDialog, Snapshot,
    VoxelMap, VoxelWorld,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

/// Everything the simulated host delivers to its main loop.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// A registered custom event fired; the host runs the execute hook.
    Custom(String),
    Key(KeyCode),
    Input(InputId, InputValue),
    /// The user closed the command.
    Close,
}

/// Headless stand-in for the CAD application.
///
/// Custom events are posted to the main loop's channel, so firing them is
/// safe from any thread.
pub struct SimHost {
    events: UnboundedSender<HostEvent>,
    design: Mutex<DesignType>,
    accept_direct_design: bool,
    registered: Mutex<HashSet<String>>,
    components: Mutex<HashSet<ComponentId>>,
    next_component: AtomicU64,
    board: (u32, u32),
    print_frames: bool,
}

impl SimHost {
    pub fn new(
        events: UnboundedSender<HostEvent>,
        design: DesignType,
        accept_direct_design: bool,
        board: (u32, u32),
        print_frames: bool,
    ) -> Self {
        Self {
            events,
            design: Mutex::new(design),
            accept_direct_design,
            registered: Mutex::new(HashSet::new()),
            components: Mutex::new(HashSet::new()),
            next_component: AtomicU64::new(1),
            board,
            print_frames,
        }
    }

    /// Components created and not yet deleted.
    pub fn live_components(&self) -> usize {
        self.components.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl Host for SimHost {
    fn add_command_control(&self, control: &CommandControl) -> anyhow::Result<()> {
        log::info!(
            "SimHost: button '{}' ({}) on {}/{}/{}",
            control.name,
            control.tooltip,
            control.workspace_id,
            control.tab_id,
            control.panel_id
        );
        Ok(())
    }

    fn register_custom_event(&self, event_id: &str) -> anyhow::Result<()> {
        let mut registered = self
            .registered
            .lock()
            .map_err(|_| anyhow::anyhow!("event registry poisoned"))?;
        if !registered.insert(event_id.to_string()) {
            anyhow::bail!("custom event '{}' already registered", event_id);
        }
        log::debug!("SimHost: registered custom event '{}'", event_id);
        Ok(())
    }

    fn unregister_custom_event(&self, event_id: &str) {
        if let Ok(mut registered) = self.registered.lock() {
            registered.remove(event_id);
        }
    }

    fn fire_custom_event(&self, event_id: &str) {
        let known = self
            .registered
            .lock()
            .map(|r| r.contains(event_id))
            .unwrap_or(false);
        if !known {
            log::warn!("SimHost: dropping unregistered custom event '{}'", event_id);
            return;
        }
        if self.events.send(HostEvent::Custom(event_id.to_string())).is_err() {
            log::debug!("SimHost: main loop gone, custom event dropped");
        }
    }

    fn design_type(&self) -> DesignType {
        *self.design.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_design_type(&self, design_type: DesignType) -> anyhow::Result<()> {
        log::info!("SimHost: design type -> {:?}", design_type);
        *self.design.lock().unwrap_or_else(|e| e.into_inner()) = design_type;
        Ok(())
    }

    fn confirm(&self, title: &str, question: &str) -> bool {
        log::info!(
            "SimHost: [{}] {} -> {}",
            title,
            question.trim(),
            if self.accept_direct_design { "yes" } else { "no" }
        );
        self.accept_direct_design
    }

    fn create_component(&self, name: &str) -> anyhow::Result<ComponentId> {
        let id = ComponentId(self.next_component.fetch_add(1, Ordering::Relaxed));
        self.components
            .lock()
            .map_err(|_| anyhow::anyhow!("component registry poisoned"))?
            .insert(id);
        log::info!("SimHost: created component '{}' ({:?})", name, id);
        Ok(id)
    }

    fn delete_component(&self, component: ComponentId) -> anyhow::Result<()> {
        let removed = self
            .components
            .lock()
            .map_err(|_| anyhow::anyhow!("component registry poisoned"))?
            .remove(&component);
        if !removed {
            anyhow::bail!("unknown component {:?}", component);
        }
        log::info!("SimHost: deleted component {:?}", component);
        Ok(())
    }

    fn create_voxel_world(
        &self,
        component: ComponentId,
        voxel_size: f64,
    ) -> anyhow::Result<Box<dyn VoxelWorld>> {
        Ok(Box::new(TerminalWorld {
            component,
            width: self.board.0,
            height: self.board.1,
            voxel_size,
            grid_size: 1,
            voxels: VoxelMap::new(),
            print_frames: self.print_frames,
        }))
    }
}

/// Voxel renderer that draws the board as text.
pub struct TerminalWorld {
    component: ComponentId,
    width: u32,
    height: u32,
    voxel_size: f64,
    grid_size: u32,
    voxels: VoxelMap,
    print_frames: bool,
}

impl TerminalWorld {
    fn draw(&self) {
        let mut snapshot = Snapshot::new(self.width, self.height);
        snapshot.cells = self.voxels.clone();
        let frame = render_ascii(&snapshot);
        if self.print_frames {
            println!("{frame}");
        } else {
            log::debug!("Frame:\n{}", frame);
        }
    }

    fn announce(progress: Option<&ProgressDialog>, total: usize) {
        if let Some(progress) = progress {
            let message = progress
                .message
                .replace("%v", "0")
                .replace("%m", &total.to_string());
            log::info!("{}: {}", progress.title, message);
        }
    }
}

impl VoxelWorld for TerminalWorld {
    fn component(&self) -> ComponentId {
        self.component
    }

    fn update(&mut self, voxels: &VoxelMap, progress: Option<&ProgressDialog>) -> anyhow::Result<()> {
        let added = voxels.keys().filter(|c| !self.voxels.contains_key(c)).count();
        let removed = self.voxels.keys().filter(|c| !voxels.contains_key(c)).count();
        Self::announce(progress, added + removed);

        self.voxels = voxels.clone();
        log::debug!(
            "TerminalWorld: +{} -{} voxels ({} total)",
            added,
            removed,
            self.voxels.len()
        );
        self.draw();
        Ok(())
    }

    fn set_grid_size(
        &mut self,
        grid_size: u32,
        progress: Option<&ProgressDialog>,
    ) -> anyhow::Result<()> {
        if grid_size == 0 {
            anyhow::bail!("grid size must be positive");
        }
        Self::announce(progress, self.voxels.len());
        self.grid_size = grid_size;
        log::info!(
            "TerminalWorld: grid size {} (voxel edge {:.2})",
            grid_size,
            self.voxel_size * grid_size as f64
        );
        self.draw();
        Ok(())
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        log::info!("TerminalWorld: removing {} voxels", self.voxels.len());
        self.voxels.clear();
        Ok(())
    }
}
