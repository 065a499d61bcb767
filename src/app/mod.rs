pub mod egui_host;
mod input;
mod timing;

use crate::config::{ViewerConfig, CONFIG_FILE_NAME};
use crate::context::{FilePicker, ViewerContext};
use crate::render::{OrbitCamera, RenderContext, RenderError};
use crate::ui::ControlPanel;
use egui_host::EguiHost;
use input::{DragMode, PointerState};
use timing::FrameTiming;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Native file dialogs backing the panel's load/save buttons.
struct NativeDialogs;

impl FilePicker for NativeDialogs {
    fn pick_model(&mut self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .add_filter("Wavefront OBJ", &["obj"])
            .pick_file()
    }

    fn pick_settings_to_save(&mut self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .add_filter("Settings", &["json"])
            .set_file_name("meshview-settings.json")
            .save_file()
    }

    fn pick_settings_to_open(&mut self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .add_filter("Settings", &["json"])
            .pick_file()
    }
}

struct Graphics {
    window: Arc<Window>,
    render: RenderContext,
    egui: EguiHost,
}

pub struct App {
    graphics: Option<Graphics>,
    viewer: ViewerContext,
    panel: ControlPanel,
    camera: OrbitCamera,
    pointer: PointerState,
    dialogs: NativeDialogs,
    timing: FrameTiming,
    target_frame_duration: Duration,
    next_frame_time: Instant,
    fatal: Option<AppError>,
}

impl App {
    fn new(config: ViewerConfig) -> Self {
        let now = Instant::now();
        let camera = OrbitCamera::new(
            &config.camera,
            config.window.width as f32 / config.window.height.max(1) as f32,
        );
        let panel = ControlPanel::new(config.panel_width);
        let timing = FrameTiming::new(config.window.title.clone(), now);
        Self {
            graphics: None,
            viewer: ViewerContext::new(config),
            panel,
            camera,
            pointer: PointerState::default(),
            dialogs: NativeDialogs,
            timing,
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: now,
            fatal: None,
        }
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_config = &self.viewer.config().window;
        let window_attrs = WindowAttributes::default()
            .with_title(window_config.title.clone())
            .with_inner_size(LogicalSize::new(window_config.width, window_config.height))
            .with_resizable(true);
        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);

        let render = RenderContext::new(window.clone(), self.viewer.scene())?;
        let egui = EguiHost::new(&window);
        self.camera.set_viewport(size.width, size.height);
        self.update_target_frame_duration(&window);
        self.graphics = Some(Graphics {
            window,
            render,
            egui,
        });
        Ok(())
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(millihz) = window
            .current_monitor()
            .and_then(|monitor| monitor.refresh_rate_millihertz())
        {
            let hz = millihz as f32 / 1000.0;
            if hz > 1.0 {
                target = Duration::from_secs_f32(1.0 / hz);
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn handle_resize(&mut self, width: u32, height: u32) {
        if let Some(graphics) = &mut self.graphics {
            graphics.render.resize(winit::dpi::PhysicalSize::new(width, height));
        }
        self.camera.set_viewport(width, height);
    }

    fn ui_wants_pointer(&self) -> bool {
        self.graphics
            .as_ref()
            .is_some_and(|graphics| graphics.egui.captures_pointer())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(graphics) = &mut self.graphics else {
            return;
        };
        let now = Instant::now();
        let dt = self.timing.tick(now);

        self.viewer.poll_loader();

        let viewer = &self.viewer;
        let panel = &mut self.panel;
        let mut actions = Vec::new();
        let ui = graphics.egui.frame(&graphics.window, |ctx| {
            actions = panel.show(ctx, viewer);
        });
        for action in actions {
            self.viewer.handle(action, &mut self.dialogs);
        }
        self.viewer.sync();
        self.camera.update(dt);

        if let Err(err) = graphics.render.render(self.viewer.scene(), &self.camera, ui) {
            log::error!("Rendering failed: {}", err);
            self.fatal = Some(err.into());
            event_loop.exit();
            return;
        }

        let model = self.viewer.scene().object().map(|object| object.name.as_str());
        self.timing.update_title(&graphics.window, now, model);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }
        if let Err(err) = self.init_graphics(event_loop) {
            log::error!("Startup failed: {}", err);
            self.fatal = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let consumed = match &mut self.graphics {
            Some(graphics) => graphics.egui.on_window_event(&graphics.window, &event),
            None => false,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    log::info!("Escape pressed, shutting down...");
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(new_size) => {
                log::debug!("Window resized to {}x{}", new_size.width, new_size.height);
                self.handle_resize(new_size.width, new_size.height);
            }
            WindowEvent::Moved(_) => {
                if let Some(window) = self.graphics.as_ref().map(|g| g.window.clone()) {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = state == ElementState::Pressed;
                if !pressed || !(consumed || self.ui_wants_pointer()) {
                    self.pointer.handle_button(button, pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(drag) = self
                    .pointer
                    .handle_cursor_moved(position.x as f32, position.y as f32)
                {
                    let height = self
                        .graphics
                        .as_ref()
                        .map_or(1.0, |graphics| graphics.render.size().height as f32);
                    match drag.mode {
                        DragMode::Rotate => self.camera.rotate(drag.dx, drag.dy, height),
                        DragMode::Pan => self.camera.pan(drag.dx, drag.dy, height),
                    }
                }
            }
            WindowEvent::CursorLeft { .. } => self.pointer.handle_cursor_left(),
            WindowEvent::MouseWheel { delta, .. } => {
                // An orbit drag keeps the wheel even over the panel.
                if self.pointer.is_dragging() || !(consumed || self.ui_wants_pointer()) {
                    self.camera.zoom(input::scroll_steps(delta));
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(graphics) = &self.graphics {
                graphics.window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

fn load_config(path: &Path) -> ViewerConfig {
    ViewerConfig::load_or_default(path).unwrap_or_else(|err| {
        log::warn!("{}; using defaults", err);
        ViewerConfig::default()
    })
}

pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("meshview {}", env!("CARGO_PKG_VERSION"));
    log::info!("   Drag to orbit, right-drag to pan, scroll to zoom, ESC to exit");

    let config = load_config(Path::new(CONFIG_FILE_NAME));
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    if let Some(err) = app.fatal.take() {
        return Err(err);
    }
    log::info!("Goodbye!");
    Ok(())
}
