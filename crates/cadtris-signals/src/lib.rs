use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Raw key code as delivered by the host keyboard event.
pub type KeyCode = u32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseSignalError {
    #[error("unknown game action '{0}'")]
    UnknownAction(String),
    #[error("invalid key code '{0}'")]
    InvalidKeyCode(String),
}

// ============================================================================
// LIFECYCLE HOOKS
// ============================================================================

/// The callback kinds the host invokes on a command instance.
///
/// The most recently entered hook is the routing state the funnel consults
/// when deciding between inline and deferred execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Command created. Initial state, privileged calls are legal.
    Created,
    /// A command input changed.
    InputChanged,
    /// The host honoured a wakeup and runs the execute callback (queue drain).
    Execute,
    /// A key was pressed while the command was active.
    KeyDown,
    /// Command teardown. Terminal state, privileged calls are legal.
    Destroy,
}

impl Hook {
    pub const ALL: [Hook; 5] = [
        Hook::Created,
        Hook::InputChanged,
        Hook::Execute,
        Hook::KeyDown,
        Hook::Destroy,
    ];

    /// Whether host geometry may be touched synchronously while this hook runs.
    pub fn is_privileged(self) -> bool {
        matches!(self, Hook::Created | Hook::Destroy)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Hook::Created => "created",
            Hook::InputChanged => "input_changed",
            Hook::Execute => "execute",
            Hook::KeyDown => "key_down",
            Hook::Destroy => "destroy",
        }
    }

    /// Compact encoding used for atomic storage.
    pub fn to_u8(self) -> u8 {
        match self {
            Hook::Created => 0,
            Hook::InputChanged => 1,
            Hook::Execute => 2,
            Hook::KeyDown => 3,
            Hook::Destroy => 4,
        }
    }

    pub fn from_u8(raw: u8) -> Option<Self> {
        Hook::ALL.get(raw as usize).copied()
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// GAME ACTIONS
// ============================================================================

/// Player intents produced by key bindings and handed to the game rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameAction {
    MoveLeft,
    MoveRight,
    RotateLeft,
    RotateRight,
    SoftDrop,
    HardDrop,
    Pause,
}

impl GameAction {
    pub const ALL: [GameAction; 7] = [
        GameAction::MoveLeft,
        GameAction::MoveRight,
        GameAction::RotateLeft,
        GameAction::RotateRight,
        GameAction::SoftDrop,
        GameAction::HardDrop,
        GameAction::Pause,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GameAction::MoveLeft => "move_left",
            GameAction::MoveRight => "move_right",
            GameAction::RotateLeft => "rotate_left",
            GameAction::RotateRight => "rotate_right",
            GameAction::SoftDrop => "soft_drop",
            GameAction::HardDrop => "hard_drop",
            GameAction::Pause => "pause",
        }
    }
}

impl fmt::Display for GameAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameAction {
    type Err = ParseSignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameAction::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ParseSignalError::UnknownAction(s.to_string()))
    }
}

/// Parse a key code from its decimal string form (TOML table keys are strings).
pub fn parse_key_code(s: &str) -> Result<KeyCode, ParseSignalError> {
    s.trim()
        .parse::<KeyCode>()
        .map_err(|_| ParseSignalError::InvalidKeyCode(s.to_string()))
}

// ============================================================================
// COMMAND INPUTS
// ============================================================================

/// Identifiers of the controls in the command's input window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputId {
    Button1,
    KeepBodies,
    GridSize,
}

impl InputId {
    pub fn as_str(self) -> &'static str {
        match self {
            InputId::Button1 => "button_1",
            InputId::KeepBodies => "keep_bodies",
            InputId::GridSize => "grid_size",
        }
    }
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Bool(bool),
    Integer(i64),
}

impl InputValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            InputValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            InputValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

// ============================================================================
// BOARD SNAPSHOT
// ============================================================================

/// A board cell coordinate in game space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Display attributes of one occupied cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Voxel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// 0 = fully transparent, 255 = opaque
    pub opacity: u8,
}

impl Voxel {
    pub fn new(r: u8, g: u8, b: u8, opacity: u8) -> Self {
        Self { r, g, b, opacity }
    }

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }
}

/// Serialized game state handed to displays.
///
/// Owns all of its data; nothing in here aliases the live game state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub width: u32,
    pub height: u32,
    pub cells: BTreeMap<Cell, Voxel>,
}

impl Snapshot {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: BTreeMap::new(),
        }
    }

    pub fn with_cell(mut self, cell: Cell, voxel: Voxel) -> Self {
        self.cells.insert(cell, voxel);
        self
    }

    pub fn set(&mut self, cell: Cell, voxel: Voxel) {
        self.cells.insert(cell, voxel);
    }

    pub fn get(&self, cell: Cell) -> Option<&Voxel> {
        self.cells.get(&cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells whose display attributes differ between `self` and `previous`,
    /// including cells present in only one of them.
    pub fn changed_cells(&self, previous: &Snapshot) -> BTreeSet<Cell> {
        let mut changed: BTreeSet<Cell> = self
            .cells
            .iter()
            .filter(|(cell, voxel)| previous.cells.get(cell) != Some(voxel))
            .map(|(cell, _)| *cell)
            .collect();
        changed.extend(
            previous
                .cells
                .keys()
                .filter(|cell| !self.cells.contains_key(cell)),
        );
        changed
    }
}
