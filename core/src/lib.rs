//! Core of the cadtris add-in: the cross-thread action funnel and the
//! command lifecycle built on it.

pub mod error;
pub use error::{CadtrisError, Result};

pub mod funnel;
pub use funnel::{
    Action, ActionQueue, ConsumerPump, DrainReport, ExecutionRouter, Submission, Wakeup,
    WakeupSignal,
};

pub mod host;
pub use host::{
    CommandControl, ComponentId, DesignType, Host, HostWakeup, ProgressDialog, VoxelMap,
    VoxelWorld,
};

pub mod inputs;
pub use inputs::InputsWindow;

pub mod display;
pub use display::{AsciiDisplay, Display, VoxelDisplay};

pub mod model;
pub use model::{GameModel, GameRules};

pub mod command;
pub use command::{AddinCommand, CreateOutcome, CreatedArgs, InputChangedArgs, KeyArgs};

pub use cadtris_config::CadtrisConfig;
pub use cadtris_signals::{Cell, GameAction, Hook, InputId, InputValue, KeyCode, Snapshot, Voxel};
