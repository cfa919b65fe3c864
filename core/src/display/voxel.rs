use super::Display;
use crate::error::Result;
use crate::funnel::{ExecutionRouter, Submission};
use crate::host::{Host, ProgressDialog, VoxelMap, VoxelWorld};
use cadtris_config::DisplayConfig;
use cadtris_signals::Snapshot;
use std::sync::{Arc, Mutex};

/// Voxel description for a snapshot. Fully transparent cells are left out.
pub fn voxel_map(snapshot: &Snapshot) -> VoxelMap {
    snapshot
        .cells
        .iter()
        .filter(|(_, voxel)| voxel.opacity > 0)
        .map(|(cell, voxel)| (*cell, *voxel))
        .collect()
}

/// Number of coordinates that gain or lose a voxel between `previous` and `next`.
pub fn voxel_diff(previous: &VoxelMap, next: &VoxelMap) -> usize {
    let added = next.keys().filter(|c| !previous.contains_key(c)).count();
    let removed = previous.keys().filter(|c| !next.contains_key(c)).count();
    added + removed
}

/// Display that builds the board as voxel bodies inside a host component.
///
/// Every operation touches host geometry, so all of them go through the
/// funnel: inline during created/destroy, via the execute hook otherwise.
pub struct VoxelDisplay {
    router: Arc<ExecutionRouter>,
    host: Arc<dyn Host>,
    scene: Arc<Mutex<VoxelScene>>,
}

struct VoxelScene {
    world: Box<dyn VoxelWorld>,
    config: DisplayConfig,
    last_game: Option<Snapshot>,
    last_voxels: VoxelMap,
    cleared: bool,
}

impl VoxelDisplay {
    pub fn new(
        router: Arc<ExecutionRouter>,
        host: Arc<dyn Host>,
        world: Box<dyn VoxelWorld>,
        config: DisplayConfig,
    ) -> Self {
        Self {
            router,
            host,
            scene: Arc::new(Mutex::new(VoxelScene {
                world,
                config,
                last_game: None,
                last_voxels: VoxelMap::new(),
                cleared: false,
            })),
        }
    }

    /// Resize the voxel grid of the world.
    pub fn set_grid_size(&self, grid_size: u32) -> Result<Submission> {
        self.routed(move |scene, _| {
            let progress = scene.progress_dialog();
            scene.world.set_grid_size(grid_size, Some(&progress))
        })
    }

    /// Remove all voxels and delete the world's component.
    pub fn clear_world(&self) -> Result<Submission> {
        self.routed(|scene, host| {
            scene.world.clear()?;
            host.delete_component(scene.world.component())?;
            scene.cleared = true;
            scene.last_voxels.clear();
            log::info!("Voxel world cleared");
            Ok(())
        })
    }

    /// Number of voxels currently built, as last sent to the world.
    pub fn voxel_count(&self) -> usize {
        self.scene
            .lock()
            .map(|s| s.last_voxels.len())
            .unwrap_or(0)
    }

    fn routed<F>(&self, op: F) -> Result<Submission>
    where
        F: FnOnce(&mut VoxelScene, &dyn Host) -> anyhow::Result<()> + Send + 'static,
    {
        let scene = self.scene.clone();
        let host = self.host.clone();
        self.router.submit(move || {
            let mut scene = scene
                .lock()
                .map_err(|_| anyhow::anyhow!("voxel scene lock poisoned"))?;
            if scene.cleared {
                log::debug!("VoxelDisplay: world already cleared, skipping");
                return Ok(());
            }
            op(&mut scene, host.as_ref())
        })
    }
}

impl Display for VoxelDisplay {
    fn update(&self, snapshot: Snapshot) -> Result<Submission> {
        self.routed(move |scene, _| scene.update(snapshot))
    }
}

impl VoxelScene {
    fn update(&mut self, snapshot: Snapshot) -> anyhow::Result<()> {
        // A resized board with the same cells still has to be redrawn.
        if self.last_game.as_ref() == Some(&snapshot) {
            log::trace!("VoxelDisplay: snapshot unchanged");
            return Ok(());
        }
        let changed = match &self.last_game {
            None => snapshot.len(),
            Some(last) => snapshot.changed_cells(last).len(),
        };
        log::debug!("VoxelDisplay: {} cells changed", changed);

        self.update_voxels(&snapshot)?;
        self.last_game = Some(snapshot);
        Ok(())
    }

    fn update_voxels(&mut self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let voxels = voxel_map(snapshot);
        let n_diff = voxel_diff(&self.last_voxels, &voxels);
        let progress = if n_diff >= self.config.min_voxels_for_progressbar {
            Some(self.progress_dialog())
        } else {
            None
        };
        self.world.update(&voxels, progress.as_ref())?;
        self.last_voxels = voxels;
        Ok(())
    }

    fn progress_dialog(&self) -> ProgressDialog {
        ProgressDialog {
            title: self.config.progressbar_title.clone(),
            message: self.config.progressbar_message.clone(),
            show_after_changes: self.config.voxel_changes_for_dialog,
        }
    }
}
