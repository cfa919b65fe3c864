//! Headless host for the cadtris add-in.
//!
//! Plays the part of the CAD application: owns the main loop, delivers key
//! presses and input changes to the command, and runs the execute hook
//! whenever the add-in's custom event fires.

mod demo;
mod host;

use anyhow::Context;
use cadtris_config::{CadtrisConfig, LoggingConfig};
use cadtris_core::{
    AddinCommand, CreateOutcome, CreatedArgs, DesignType, GameAction, InputChangedArgs, InputId,
    InputValue, KeyArgs, KeyCode,
};
use clap::Parser;
use demo::DemoBoard;
use host::{HostEvent, SimHost};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};

/// Key sequence replayed by the scripted session.
const SCRIPT: &[GameAction] = &[
    GameAction::MoveLeft,
    GameAction::MoveLeft,
    GameAction::RotateRight,
    GameAction::SoftDrop,
    GameAction::MoveRight,
    GameAction::HardDrop,
    GameAction::MoveRight,
    GameAction::MoveRight,
    GameAction::HardDrop,
];

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// TOML file overriding the built-in configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// How long the scripted session runs, in seconds.
    #[arg(long, default_value_t = 10)]
    seconds: u64,

    /// Delay between scripted key presses, in milliseconds.
    #[arg(long, default_value_t = 300)]
    key_interval_ms: u64,

    /// Start in a parametric design, which triggers the direct-design prompt.
    #[arg(long)]
    parametric: bool,

    /// Answer "no" to the direct-design prompt.
    #[arg(long)]
    decline: bool,

    /// Change the grid size input once the game is running.
    #[arg(long)]
    grid_size: Option<u32>,

    /// Keep the voxel bodies when the command is destroyed.
    #[arg(long)]
    keep_bodies: bool,

    /// Print every frame to stdout instead of the debug log.
    #[arg(long)]
    print_frames: bool,

    /// Comma-separated game actions to replay instead of the built-in script.
    #[arg(long, value_delimiter = ',')]
    script: Vec<GameAction>,

    /// Print the JSON Schema of the configuration file and exit.
    #[arg(long)]
    print_schema: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.print_schema {
        println!(
            "{}",
            serde_json::to_string_pretty(&CadtrisConfig::settings_schema())?
        );
        return Ok(());
    }

    let config = load_config(args.config.as_deref())?;
    init_logging(&config.logging)?;
    log::info!("Starting cadtris sim host");

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let design = if args.parametric {
        DesignType::Parametric
    } else {
        DesignType::Direct
    };
    let host = Arc::new(SimHost::new(
        events_tx.clone(),
        design,
        !args.decline,
        (config.game.board_width, config.game.board_height),
        args.print_frames,
    ));

    // The command is created here, so this thread is its main context.
    let mut command = AddinCommand::new(config.clone(), host.clone())?;
    let rules = Box::new(DemoBoard::new(
        config.game.board_width,
        config.game.board_height,
    ));
    if command.on_create(CreatedArgs { rules })? == CreateOutcome::Declined {
        command.on_destroy()?;
        log::info!("Direct design declined, exiting");
        return Ok(());
    }

    let script = if args.script.is_empty() {
        SCRIPT
    } else {
        &args.script[..]
    };
    let keys = script_keys(&config, script)?;
    tokio::spawn(run_script(
        events_tx,
        keys,
        Duration::from_millis(args.key_interval_ms),
        Duration::from_secs(args.seconds),
        args.grid_size,
        args.keep_bodies,
    ));

    let mut executes = 0usize;
    let mut failed = 0usize;
    while let Some(event) = events_rx.recv().await {
        match event {
            HostEvent::Custom(event_id) => {
                if event_id != config.command.custom_event_id {
                    log::warn!("Ignoring foreign custom event '{}'", event_id);
                    continue;
                }
                let report = command.on_execute();
                executes += 1;
                failed += report.failed;
                log::trace!("Execute #{}: {:?}", executes, report);
            }
            HostEvent::Key(key_code) => match command.on_key(KeyArgs { key_code }) {
                Ok(Some(action)) => log::debug!("Key {} -> {}", key_code, action),
                Ok(None) => {}
                Err(e) => log::warn!("Key {} failed: {}", key_code, e),
            },
            HostEvent::Input(input, value) => {
                if let Err(e) = command.on_input_changed(InputChangedArgs { input, value }) {
                    log::warn!("Input change failed: {}", e);
                }
            }
            HostEvent::Close => break,
        }
    }

    command.on_destroy()?;
    log::info!(
        "Session finished: {} execute hooks, {} failed actions, {} live components",
        executes,
        failed,
        host.live_components()
    );
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CadtrisConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            CadtrisConfig::from_toml_str(&text)
        }
        None => CadtrisConfig::builtin(),
    }
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&logging.level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    if logging.enabled {
        std::fs::create_dir_all(&logging.folder).with_context(|| {
            format!("Failed to create log folder {}", logging.folder.display())
        })?;
        let path = logging.log_path();
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init().context("Logger already initialised")?;
    Ok(())
}

/// Key codes for `script`, looked up in the configured bindings.
fn script_keys(config: &CadtrisConfig, script: &[GameAction]) -> anyhow::Result<Vec<KeyCode>> {
    let key_map = config.key_map()?;
    script
        .iter()
        .map(|action| {
            key_map
                .iter()
                .filter(|(_, bound)| *bound == action)
                .map(|(code, _)| *code)
                .min()
                .with_context(|| format!("No key bound to '{}'", action))
        })
        .collect()
}

async fn run_script(
    events: UnboundedSender<HostEvent>,
    keys: Vec<KeyCode>,
    key_interval: Duration,
    total: Duration,
    grid_size: Option<u32>,
    keep_bodies: bool,
) {
    if keep_bodies {
        let _ = events.send(HostEvent::Input(InputId::KeepBodies, InputValue::Bool(true)));
    }
    if let Some(size) = grid_size {
        let _ = events.send(HostEvent::Input(
            InputId::GridSize,
            InputValue::Integer(size as i64),
        ));
    }

    let deadline = tokio::time::sleep(total);
    tokio::pin!(deadline);
    let mut interval = tokio::time::interval(key_interval);
    let mut presses = keys.iter().cycle();

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = interval.tick() => {
                let Some(&key_code) = presses.next() else { break };
                if events.send(HostEvent::Key(key_code)).is_err() {
                    return;
                }
            }
        }
    }
    let _ = events.send(HostEvent::Close);
}
