use super::ComponentId;
use cadtris_signals::{Cell, Voxel};
use std::collections::BTreeMap;

/// Voxel description handed to the renderer, keyed by game coordinate.
pub type VoxelMap = BTreeMap<Cell, Voxel>;

/// Progress dialog the host shows while a large voxel update is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressDialog {
    pub title: String,
    pub message: String,
    /// Show the dialog only once this many voxels have been processed
    pub show_after_changes: usize,
}

/// The host-side voxel renderer for one component.
///
/// Implementations diff against their own current geometry; callers always
/// pass the complete desired voxel set.
pub trait VoxelWorld: Send {
    fn component(&self) -> ComponentId;

    fn update(&mut self, voxels: &VoxelMap, progress: Option<&ProgressDialog>) -> anyhow::Result<()>;

    fn set_grid_size(
        &mut self,
        grid_size: u32,
        progress: Option<&ProgressDialog>,
    ) -> anyhow::Result<()>;

    /// Remove every voxel body.
    fn clear(&mut self) -> anyhow::Result<()>;
}
