use crate::display::VoxelDisplay;
use crate::error::{CadtrisError, Result};
use crate::funnel::{ConsumerPump, DrainReport, ExecutionRouter, WakeupSignal};
use crate::host::{CommandControl, ComponentId, DesignType, Host, HostWakeup};
use crate::inputs::InputsWindow;
use crate::model::{GameModel, GameRules};
use cadtris_config::CadtrisConfig;
use cadtris_signals::{GameAction, Hook, InputId, InputValue, KeyCode};
use std::collections::HashMap;
use std::sync::Arc;

pub struct CreatedArgs {
    /// Rules of the game to host
    pub rules: Box<dyn GameRules>,
}

#[derive(Debug, Clone)]
pub struct InputChangedArgs {
    pub input: InputId,
    pub value: InputValue,
}

#[derive(Debug, Clone, Copy)]
pub struct KeyArgs {
    pub key_code: KeyCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The game is running.
    Started,
    /// The user refused to leave parametric design; the command stays inert.
    Declined,
}

/// Everything that exists only between a successful create and destroy.
struct Session {
    component: ComponentId,
    inputs: InputsWindow,
    display: Arc<VoxelDisplay>,
    model: Arc<GameModel>,
}

/// The add-in command: entry points for the five host callbacks.
///
/// Must be constructed on the host's main context; that thread becomes the
/// main context of the funnel. Each entry point records its hook with the
/// router before doing anything else.
pub struct AddinCommand {
    config: CadtrisConfig,
    host: Arc<dyn Host>,
    router: Arc<ExecutionRouter>,
    pump: ConsumerPump,
    key_map: HashMap<KeyCode, GameAction>,
    session: Option<Session>,
}

impl AddinCommand {
    pub fn new(config: CadtrisConfig, host: Arc<dyn Host>) -> anyhow::Result<Self> {
        config.validate()?;
        let key_map = config.key_map()?;
        let wakeup = WakeupSignal::new(
            config.command.custom_event_id.clone(),
            Arc::new(HostWakeup::new(host.clone())),
        );
        let router = Arc::new(ExecutionRouter::new(wakeup));
        let pump = ConsumerPump::new(router.clone());

        let command = &config.command;
        host.add_command_control(&CommandControl {
            workspace_id: command.workspace_id.clone(),
            tab_id: command.tab_id.clone(),
            panel_id: command.panel_id.clone(),
            name: command.name.clone(),
            tooltip: command.tooltip.clone(),
        })?;

        log::info!(
            "Command '{}' ready ({} key bindings)",
            config.command.name,
            key_map.len()
        );

        Ok(Self {
            config,
            host,
            router,
            pump,
            key_map,
            session: None,
        })
    }

    pub fn router(&self) -> &Arc<ExecutionRouter> {
        &self.router
    }

    pub fn config(&self) -> &CadtrisConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn model(&self) -> Option<&Arc<GameModel>> {
        self.session.as_ref().map(|s| &s.model)
    }

    pub fn display(&self) -> Option<&Arc<VoxelDisplay>> {
        self.session.as_ref().map(|s| &s.display)
    }

    pub fn inputs(&self) -> Option<&InputsWindow> {
        self.session.as_ref().map(|s| &s.inputs)
    }

    pub fn on_create(&mut self, args: CreatedArgs) -> Result<CreateOutcome> {
        self.tracked(Hook::Created, |cmd| cmd.create(args))
    }

    pub fn on_input_changed(&mut self, args: InputChangedArgs) -> Result<()> {
        self.tracked(Hook::InputChanged, |cmd| cmd.input_changed(args))
    }

    /// The execute hook, run by the host after a wakeup. Drains the queue.
    pub fn on_execute(&mut self) -> DrainReport {
        self.tracked(Hook::Execute, |cmd| cmd.pump.pump())
    }

    /// Returns the game action the key mapped to, if any.
    pub fn on_key(&mut self, args: KeyArgs) -> Result<Option<GameAction>> {
        self.tracked(Hook::KeyDown, |cmd| cmd.key_down(args))
    }

    pub fn on_destroy(&mut self) -> Result<()> {
        self.tracked(Hook::Destroy, |cmd| cmd.destroy())
    }

    fn tracked<T>(&mut self, hook: Hook, f: impl FnOnce(&mut Self) -> T) -> T {
        self.router.enter(hook);
        f(self)
    }

    fn create(&mut self, args: CreatedArgs) -> Result<CreateOutcome> {
        if self.session.is_some() {
            log::warn!("Command already created, ignoring");
            return Ok(CreateOutcome::Started);
        }

        let host = self.host.clone();
        let command = &self.config.command;

        if host.design_type() == DesignType::Parametric {
            if !host.confirm(&command.direct_design_title, &command.direct_design_question) {
                log::info!("Direct design declined, command stays inactive");
                return Ok(CreateOutcome::Declined);
            }
            self.router
                .run_privileged(|| host.set_design_type(DesignType::Direct))?;
        }

        host.register_custom_event(&command.custom_event_id)?;
        let session = match self.start_session(args.rules) {
            Ok(session) => session,
            Err(e) => {
                log::error!("Command '{}' failed to start: {}", command.name, e);
                host.unregister_custom_event(&command.custom_event_id);
                return Err(e);
            }
        };

        log::info!("Command '{}' started", command.name);
        self.session = Some(session);
        Ok(CreateOutcome::Started)
    }

    /// Create the component and everything living in it. On failure the
    /// component is deleted again.
    fn start_session(&self, rules: Box<dyn GameRules>) -> Result<Session> {
        let host = &self.host;
        let component = self
            .router
            .run_privileged(|| host.create_component(&self.config.command.component_name))?;

        self.build_session(component, rules).map_err(|e| {
            if let Err(cleanup) = self
                .router
                .run_privileged(|| host.delete_component(component))
            {
                log::warn!("Failed to delete component {:?}: {}", component, cleanup);
            }
            e
        })
    }

    fn build_session(&self, component: ComponentId, rules: Box<dyn GameRules>) -> Result<Session> {
        let host = &self.host;
        let voxel_size = self.config.display.initial_voxel_size;
        let world = self
            .router
            .run_privileged(|| host.create_voxel_world(component, voxel_size))?;

        let inputs = InputsWindow::new(self.config.display.initial_grid_size);
        let display = Arc::new(VoxelDisplay::new(
            self.router.clone(),
            host.clone(),
            world,
            self.config.display.clone(),
        ));
        let model = GameModel::new(rules, display.clone())?;
        model.start_ticker(self.config.game.tick_interval())?;

        Ok(Session {
            component,
            inputs,
            display,
            model,
        })
    }

    fn input_changed(&mut self, args: InputChangedArgs) -> Result<()> {
        log::info!("Changed input: {} = {:?}", args.input, args.value);
        let session = self.session.as_mut().ok_or(CadtrisError::NotCreated)?;
        session.inputs.set(args.input, args.value);

        if args.input == InputId::GridSize {
            match session.inputs.grid_size() {
                Some(size) if size > 0 => {
                    session.display.set_grid_size(size)?;
                }
                _ => log::warn!("Ignoring invalid grid size"),
            }
        }
        Ok(())
    }

    fn key_down(&mut self, args: KeyArgs) -> Result<Option<GameAction>> {
        log::info!("Pressed key {}.", args.key_code);
        let Some(action) = self.key_map.get(&args.key_code).copied() else {
            return Ok(None);
        };
        let session = self.session.as_ref().ok_or(CadtrisError::NotCreated)?;
        session.model.apply(action)?;
        Ok(Some(action))
    }

    fn destroy(&mut self) -> Result<()> {
        let mut result = Ok(());

        if let Some(session) = self.session.take() {
            // Stop the ticker first so nothing new is produced while clearing.
            session.model.terminate();

            if session.inputs.keep_bodies() {
                log::info!("Keeping bodies of component {:?}", session.component);
            } else if let Err(e) = session.display.clear_world() {
                log::error!("Failed to clear voxel world: {}", e);
                result = Err(e);
            }
            self.host
                .unregister_custom_event(&self.config.command.custom_event_id);
        }

        // Close first: nothing may slip into the queue once it is replaced.
        self.router.close();
        let discarded = self.router.reset_queue();
        if discarded > 0 {
            log::debug!("Discarded {} pending actions", discarded);
        }
        log::info!("Command '{}' destroyed", self.config.command.name);
        result
    }
}
