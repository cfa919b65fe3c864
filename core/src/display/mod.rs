pub mod ascii;
pub mod voxel;

pub use ascii::{render_ascii, AsciiDisplay};
pub use voxel::{voxel_diff, voxel_map, VoxelDisplay};

use crate::error::Result;
use crate::funnel::Submission;
use cadtris_signals::Snapshot;

/// Visualizes game snapshots.
pub trait Display: Send + Sync {
    /// Show `snapshot`. Displays that touch host geometry route this through
    /// the funnel, so it may complete later.
    fn update(&self, snapshot: Snapshot) -> Result<Submission>;
}
