use cadtris_signals::{parse_key_code, GameAction, KeyCode};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

/// Settings compiled into the add-in. They are static for the lifetime of the
/// process; nothing here is read from the environment.
const BUILTIN_TOML: &str = include_str!("../../../configs/cadtris.toml");

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// Directory for the log file, relative to the add-in root
    pub folder: PathBuf,
    pub file_name: String,
    /// `env_logger` filter, e.g. "info" or "cadtris_core=debug"
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            folder: PathBuf::from("logs"),
            file_name: "cadtris.log".to_string(),
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn log_path(&self) -> PathBuf {
        self.folder.join(&self.file_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CommandConfig {
    pub workspace_id: String,
    pub tab_id: String,
    pub panel_id: String,
    pub name: String,
    pub tooltip: String,
    /// Identifier of the host custom event used as wakeup signal
    pub custom_event_id: String,
    /// Name of the component the voxels are built into
    pub component_name: String,
    pub direct_design_title: String,
    pub direct_design_question: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            workspace_id: "FusionSolidEnvironment".to_string(),
            tab_id: "ToolsTab".to_string(),
            panel_id: "SolidScriptsAddinsPanel".to_string(),
            name: "cadtris".to_string(),
            tooltip: "Play cadtris inside your design.".to_string(),
            custom_event_id: "cadtris_custom_event".to_string(),
            component_name: "cadtris".to_string(),
            direct_design_title: "cadtris".to_string(),
            direct_design_question: "cadtris can only be played in direct design mode. \
                Switch to direct design mode?"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DisplayConfig {
    pub initial_voxel_size: f64,
    pub initial_grid_size: u32,
    pub progressbar_title: String,
    pub progressbar_message: String,
    /// Voxel diffs at least this large get a progress dialog
    pub min_voxels_for_progressbar: usize,
    /// Number of voxel changes after which the host shows the dialog
    pub voxel_changes_for_dialog: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            initial_voxel_size: 1.0,
            initial_grid_size: 1,
            progressbar_title: "Updating Screen".to_string(),
            progressbar_message: "Building blocks (%v/%m)".to_string(),
            min_voxels_for_progressbar: 15,
            voxel_changes_for_dialog: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GameConfig {
    pub tick_interval_ms: u64,
    pub board_width: u32,
    pub board_height: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 800,
            board_width: 10,
            board_height: 20,
        }
    }
}

impl GameConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CadtrisConfig {
    pub logging: LoggingConfig,
    pub command: CommandConfig,
    pub display: DisplayConfig,
    pub game: GameConfig,
    /// Key code (decimal string) to game action
    pub keys: BTreeMap<String, GameAction>,
}

impl Default for CadtrisConfig {
    fn default() -> Self {
        let keys = [
            ("37", GameAction::MoveLeft),
            ("39", GameAction::MoveRight),
            ("38", GameAction::RotateRight),
            ("90", GameAction::RotateLeft),
            ("40", GameAction::SoftDrop),
            ("32", GameAction::HardDrop),
            ("80", GameAction::Pause),
        ]
        .into_iter()
        .map(|(k, a)| (k.to_string(), a))
        .collect();

        Self {
            logging: LoggingConfig::default(),
            command: CommandConfig::default(),
            display: DisplayConfig::default(),
            game: GameConfig::default(),
            keys,
        }
    }
}

impl CadtrisConfig {
    /// The configuration embedded at build time.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_toml_str(BUILTIN_TOML)
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: CadtrisConfig = toml::from_str(text)
            .map_err(|e| anyhow::anyhow!("Failed to parse cadtris config: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.command.custom_event_id.trim().is_empty() {
            anyhow::bail!("command.custom_event_id must not be empty");
        }
        if self.command.component_name.trim().is_empty() {
            anyhow::bail!("command.component_name must not be empty");
        }
        if self.game.tick_interval_ms == 0 {
            anyhow::bail!("game.tick_interval_ms must be greater than zero");
        }
        if self.game.board_width == 0 || self.game.board_height == 0 {
            anyhow::bail!(
                "game board must not be empty ({}x{})",
                self.game.board_width,
                self.game.board_height
            );
        }
        if self.display.initial_voxel_size <= 0.0 {
            anyhow::bail!("display.initial_voxel_size must be positive");
        }
        self.key_map()?;
        Ok(())
    }

    /// Key bindings with parsed key codes.
    pub fn key_map(&self) -> anyhow::Result<HashMap<KeyCode, GameAction>> {
        self.keys
            .iter()
            .map(|(code, action)| {
                let code = parse_key_code(code)
                    .map_err(|e| anyhow::anyhow!("Invalid [keys] entry: {e}"))?;
                Ok((code, *action))
            })
            .collect()
    }

    /// JSON Schema describing the configuration file.
    pub fn settings_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(CadtrisConfig);
        serde_json::to_value(schema).unwrap_or(serde_json::Value::Null)
    }
}
