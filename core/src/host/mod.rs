//! Boundary with the CAD host application.
//!
//! The host's document model, UI toolkit and voxel renderer live on the other
//! side of these traits; the add-in only ever calls into them.

pub mod voxel_world;
pub use voxel_world::{ProgressDialog, VoxelMap, VoxelWorld};

use crate::funnel::Wakeup;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignType {
    /// History-based design with a timeline
    Parametric,
    /// Direct modelling, no timeline
    Direct,
}

/// Host handle of a component (the container the voxels are built into).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(pub u64);

/// Where the command's button is placed in the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandControl {
    pub workspace_id: String,
    pub tab_id: String,
    pub panel_id: String,
    pub name: String,
    pub tooltip: String,
}

/// Services the host exposes to the add-in.
///
/// Everything except `fire_custom_event` touches host documents and must only
/// be called on the main context, either inline during created/destroy or from
/// within the execute hook.
pub trait Host: Send + Sync {
    /// Add the button that starts the command.
    fn add_command_control(&self, control: &CommandControl) -> anyhow::Result<()>;

    /// Register the custom event whose firing makes the host run the execute hook.
    fn register_custom_event(&self, event_id: &str) -> anyhow::Result<()>;

    fn unregister_custom_event(&self, event_id: &str);

    /// Fire-and-forget; safe from any thread.
    fn fire_custom_event(&self, event_id: &str);

    fn design_type(&self) -> DesignType;

    fn set_design_type(&self, design_type: DesignType) -> anyhow::Result<()>;

    /// Yes/no message box. Returns `true` on "yes".
    fn confirm(&self, title: &str, question: &str) -> bool;

    fn create_component(&self, name: &str) -> anyhow::Result<ComponentId>;

    fn delete_component(&self, component: ComponentId) -> anyhow::Result<()>;

    fn create_voxel_world(
        &self,
        component: ComponentId,
        voxel_size: f64,
    ) -> anyhow::Result<Box<dyn VoxelWorld>>;
}

/// Routes wakeup requests to the host's custom event.
pub struct HostWakeup {
    host: Arc<dyn Host>,
}

impl HostWakeup {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }
}

impl Wakeup for HostWakeup {
    fn request_wakeup(&self, signal_id: &str) {
        self.host.fire_custom_event(signal_id);
    }
}
