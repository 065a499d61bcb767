//! Application context: the parameter store, change bus, scene and loader
//! bundled in one owner that the UI and render loop borrow from.

use crate::assets::{resolve_asset_path, AssetError, LoadOutcome, LoadSource, ModelLoader};
use crate::config::ViewerConfig;
use crate::events::ParamBus;
use crate::params::serialization::{self, SerializationError};
use crate::params::{ParamChange, ParamError, ParamStore, ViewerState};
use crate::scene::Scene;
use crate::ui::PanelAction;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Total attempts for the startup model before giving up.
const DEFAULT_MODEL_ATTEMPTS: u32 = 2;

/// Latest message shown in the panel's status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

impl Status {
    pub fn text(&self) -> &str {
        match self {
            Status::Info(text) | Status::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }
}

/// File selection for panel actions. The app backs this with native dialogs.
pub trait FilePicker {
    fn pick_model(&mut self) -> Option<PathBuf>;
    fn pick_settings_to_save(&mut self) -> Option<PathBuf>;
    fn pick_settings_to_open(&mut self) -> Option<PathBuf>;
}

pub struct ViewerContext {
    params: ParamStore,
    bus: ParamBus,
    scene: Scene,
    loader: ModelLoader,
    status: Option<Status>,
    config: ViewerConfig,
    default_attempts: u32,
}

impl ViewerContext {
    /// Builds the scene from default parameters and starts loading a startup model.
    pub fn new(config: ViewerConfig) -> Self {
        let params = ParamStore::new(ViewerState::default());
        let bus = ParamBus::new();
        let scene = Scene::build(params.state());
        let loader = ModelLoader::new();
        let mut context = Self {
            params,
            bus,
            scene,
            loader,
            status: None,
            config,
            default_attempts: 0,
        };

        match context.config.pick_default_model() {
            Some(path) => {
                let source = LoadSource::DefaultAsset(resolve_asset_path(&path));
                context.default_attempts = 1;
                // Fresh loader, so this cannot be Busy; spawn failures land in the status.
                let _ = context.request_load(source);
            }
            None => {
                log::warn!("No default model configured");
                context.status = Some(Status::Info("No default model configured".to_string()));
            }
        }
        context
    }

    pub fn params(&self) -> &ViewerState {
        self.params.state()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_busy()
    }

    pub fn pending_changes(&self) -> usize {
        self.bus.pending()
    }

    /// Writes to the store and queues the change for the scene.
    pub fn apply_change(&mut self, change: ParamChange) -> Result<(), ParamError> {
        self.params.set(change)?;
        self.bus.publish(change);
        Ok(())
    }

    /// Pushes every queued change onto the scene. Returns how many were applied.
    pub fn sync(&mut self) -> usize {
        self.bus.dispatch(&mut [&mut self.scene])
    }

    pub fn handle(&mut self, action: PanelAction, picker: &mut dyn FilePicker) {
        match action {
            PanelAction::Change(change) => {
                if let Err(err) = self.apply_change(change) {
                    log::warn!("Rejected change: {}", err);
                }
            }
            PanelAction::LoadModel => {
                if let Some(pending) = self.loader.pending_source() {
                    self.status = Some(Status::Info(format!(
                        "Still loading {}",
                        pending.display_name()
                    )));
                    return;
                }
                if let Some(path) = picker.pick_model() {
                    let _ = self.request_load(LoadSource::File(path));
                }
            }
            PanelAction::SaveSettings => {
                if let Some(path) = picker.pick_settings_to_save() {
                    let _ = self.save_settings(&path);
                }
            }
            PanelAction::LoadSettings => {
                if let Some(path) = picker.pick_settings_to_open() {
                    let _ = self.load_settings(&path);
                }
            }
            PanelAction::DismissStatus => self.status = None,
        }
    }

    /// Starts a background load. A load already in flight is never interrupted.
    pub fn request_load(&mut self, source: LoadSource) -> Result<(), AssetError> {
        let name = source.display_name();
        match self.loader.request(source) {
            Ok(()) => {
                self.status = Some(Status::Info(format!("Loading {name}...")));
                Ok(())
            }
            Err(err @ AssetError::Busy { .. }) => {
                log::warn!("Ignoring load of {}: {}", name, err);
                self.status = Some(Status::Info(format!("Busy, ignored {name}")));
                Err(err)
            }
            Err(err) => {
                log::error!("Could not start load of {}: {}", name, err);
                self.status = Some(Status::Error(format!("Load failed: {err}")));
                Err(err)
            }
        }
    }

    /// Installs a finished load, if any. Call once per frame before drawing.
    pub fn poll_loader(&mut self) -> bool {
        match self.loader.poll() {
            Some(outcome) => self.finish_load(outcome),
            None => false,
        }
    }

    /// Blocking variant of [`Self::poll_loader`] for headless callers.
    pub fn wait_for_load(&mut self, timeout: Duration) -> bool {
        match self.loader.wait(timeout) {
            Some(outcome) => self.finish_load(outcome),
            None => false,
        }
    }

    fn finish_load(&mut self, outcome: LoadOutcome) -> bool {
        match outcome.result {
            Ok(decoded) => {
                let name = decoded.name.clone();
                self.scene.install_model(decoded, self.params.state());
                self.status = Some(Status::Info(format!("Loaded {name}")));
                true
            }
            Err(err) => {
                log::error!("Load of {} failed: {}", outcome.source, err);
                if outcome.source.is_default() && self.default_attempts < DEFAULT_MODEL_ATTEMPTS {
                    self.default_attempts += 1;
                    log::info!(
                        "Retrying default model (attempt {}/{})",
                        self.default_attempts,
                        DEFAULT_MODEL_ATTEMPTS
                    );
                    let _ = self.request_load(outcome.source);
                } else {
                    self.status = Some(Status::Error(format!("Load failed: {err}")));
                }
                false
            }
        }
    }

    /// Moves every differing field to `state` through the normal change path.
    pub fn apply_settings(&mut self, state: &ViewerState) -> usize {
        let changes = self.params.changes_to(state);
        let count = changes.len();
        for change in changes {
            if let Err(err) = self.apply_change(change) {
                log::warn!("Skipping settings field: {}", err);
            }
        }
        count
    }

    pub fn save_settings(&mut self, path: &Path) -> Result<(), SerializationError> {
        match serialization::save_settings_to_file(self.params.state(), path) {
            Ok(()) => {
                log::info!("Saved settings to {}", path.display());
                self.status = Some(Status::Info(format!("Saved settings to {}", path.display())));
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to save settings: {}", err);
                self.status = Some(Status::Error(format!("Save failed: {err}")));
                Err(err)
            }
        }
    }

    pub fn load_settings(&mut self, path: &Path) -> Result<(), SerializationError> {
        match serialization::load_settings_from_file(path) {
            Ok(state) => {
                let changed = self.apply_settings(&state);
                log::info!("Loaded settings from {} ({} changed)", path.display(), changed);
                self.status = Some(Status::Info(format!(
                    "Loaded settings from {}",
                    path.display()
                )));
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to load settings: {}", err);
                self.status = Some(Status::Error(format!("Settings load failed: {err}")));
                Err(err)
            }
        }
    }
}
