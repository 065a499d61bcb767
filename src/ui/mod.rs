//! Settings panel. Widgets read the current parameters and report edits as
//! [`PanelAction`]s; applying them is up to the caller.

use crate::context::{Status, ViewerContext};
use crate::params::{Param, ParamChange, ParamValue, Rgb, ViewerState};
use crate::scene::LoadedObject;

const DIGEST_PREFIX_LEN: usize = 12;
const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(0xd0, 0x40, 0x40);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelAction {
    Change(ParamChange),
    LoadModel,
    SaveSettings,
    LoadSettings,
    DismissStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folder {
    Editor,
    Lighting,
    Model,
}

impl Folder {
    pub const ALL: [Folder; 3] = [Folder::Editor, Folder::Lighting, Folder::Model];

    pub fn title(self) -> &'static str {
        match self {
            Folder::Editor => "Editor",
            Folder::Lighting => "Lighting",
            Folder::Model => "Model",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidgetKind {
    Color,
    Toggle,
    Slider { min: f32, max: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding {
    pub param: Param,
    pub label: &'static str,
    pub folder: Folder,
    pub widget: WidgetKind,
}

const fn bind(param: Param, label: &'static str, folder: Folder, widget: WidgetKind) -> Binding {
    Binding {
        param,
        label,
        folder,
        widget,
    }
}

const UNIT: WidgetKind = WidgetKind::Slider { min: -1.0, max: 1.0 };

/// One entry per parameter, in display order.
pub const BINDINGS: [Binding; 15] = [
    bind(Param::BackgroundColor, "Background Color", Folder::Editor, WidgetKind::Color),
    bind(Param::ShowGrid, "Show Grid", Folder::Editor, WidgetKind::Toggle),
    bind(Param::ShowAxes, "Show Axes", Folder::Editor, WidgetKind::Toggle),
    bind(Param::AmbientColor, "Ambient Color", Folder::Lighting, WidgetKind::Color),
    bind(Param::LightPositionX, "Light Position X", Folder::Lighting, UNIT),
    bind(Param::LightPositionY, "Light Position Y", Folder::Lighting, UNIT),
    bind(Param::LightPositionZ, "Light Position Z", Folder::Lighting, UNIT),
    bind(Param::LightColor, "Light Color", Folder::Lighting, WidgetKind::Color),
    bind(
        Param::Intensity,
        "Intensity",
        Folder::Lighting,
        WidgetKind::Slider { min: 0.0, max: 5.0 },
    ),
    bind(Param::Visible, "Visible", Folder::Model, WidgetKind::Toggle),
    bind(Param::Wireframe, "Wireframe", Folder::Model, WidgetKind::Toggle),
    bind(
        Param::Scale,
        "Scale",
        Folder::Model,
        WidgetKind::Slider { min: 0.0, max: 5.0 },
    ),
    bind(Param::DiffuseColor, "Diffuse Color", Folder::Model, WidgetKind::Color),
    bind(Param::SpecularColor, "Specular Color", Folder::Model, WidgetKind::Color),
    bind(
        Param::Shininess,
        "Shininess",
        Folder::Model,
        WidgetKind::Slider { min: 0.0, max: 100.0 },
    ),
];

pub fn binding(param: Param) -> Option<&'static Binding> {
    BINDINGS.iter().find(|binding| binding.param == param)
}

pub struct ControlPanel {
    width: f32,
}

impl ControlPanel {
    pub fn new(width: f32) -> Self {
        Self { width }
    }

    pub fn show(&mut self, ctx: &egui::Context, viewer: &ViewerContext) -> Vec<PanelAction> {
        let mut actions = Vec::new();
        let state = viewer.params();

        egui::Window::new("Controls")
            .id(egui::Id::new("meshview_controls"))
            .default_pos([ctx.screen_rect().right() - self.width - 12.0, 12.0])
            .default_width(self.width)
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                ui.set_width(self.width);
                for folder in Folder::ALL {
                    egui::CollapsingHeader::new(folder.title())
                        .default_open(true)
                        .show(ui, |ui| {
                            for binding in BINDINGS.iter().filter(|b| b.folder == folder) {
                                if let Some(change) = binding_widget(ui, binding, state) {
                                    actions.push(PanelAction::Change(change));
                                }
                            }
                        });
                }

                ui.separator();
                let load = ui.add_enabled(!viewer.is_loading(), egui::Button::new("Load Model"));
                if load.clicked() {
                    actions.push(PanelAction::LoadModel);
                }
                ui.horizontal(|ui| {
                    if ui.button("Save Settings...").clicked() {
                        actions.push(PanelAction::SaveSettings);
                    }
                    if ui.button("Load Settings...").clicked() {
                        actions.push(PanelAction::LoadSettings);
                    }
                });

                ui.separator();
                object_info(ui, viewer.scene().object());

                if let Some(status) = viewer.status() {
                    ui.separator();
                    if status_line(ui, status) {
                        actions.push(PanelAction::DismissStatus);
                    }
                }
            });

        actions
    }
}

fn binding_widget(ui: &mut egui::Ui, binding: &Binding, state: &ViewerState) -> Option<ParamChange> {
    let param = binding.param;
    match (binding.widget, state.get(param)) {
        (WidgetKind::Color, ParamValue::Color(color)) => {
            let mut rgb = color.to_array();
            let changed = ui
                .horizontal(|ui| {
                    let response = ui.color_edit_button_srgb(&mut rgb);
                    ui.label(binding.label);
                    response.changed()
                })
                .inner;
            changed.then(|| ParamChange::color(param, Rgb::from_array(rgb)))
        }
        (WidgetKind::Toggle, ParamValue::Bool(mut value)) => ui
            .checkbox(&mut value, binding.label)
            .changed()
            .then(|| ParamChange::flag(param, value)),
        (WidgetKind::Slider { min, max }, ParamValue::Scalar(mut value)) => ui
            .add(egui::Slider::new(&mut value, min..=max).text(binding.label))
            .changed()
            .then(|| ParamChange::scalar(param, value)),
        (widget, value) => {
            log::warn!("No {:?} widget for {} value {}", widget, param, value);
            None
        }
    }
}

fn object_info(ui: &mut egui::Ui, object: Option<&LoadedObject>) {
    let Some(object) = object else {
        ui.label("No model loaded");
        return;
    };
    egui::Grid::new("model_info").num_columns(2).show(ui, |ui| {
        ui.label("Name");
        ui.label(&object.name);
        ui.end_row();
        ui.label("Meshes");
        ui.label(object.meshes.len().to_string());
        ui.end_row();
        ui.label("Vertices");
        ui.label(object.vertex_count().to_string());
        ui.end_row();
        ui.label("Triangles");
        ui.label(object.triangle_count().to_string());
        ui.end_row();
        ui.label("SHA-256");
        ui.monospace(digest_prefix(&object.digest));
        ui.end_row();
    });
}

/// Returns true when the dismiss button was clicked.
fn status_line(ui: &mut egui::Ui, status: &Status) -> bool {
    ui.horizontal_wrapped(|ui| {
        match status {
            Status::Error(text) => ui.colored_label(ERROR_COLOR, text),
            Status::Info(text) => ui.label(text),
        };
        ui.small_button("Dismiss").clicked()
    })
    .inner
}

fn digest_prefix(digest: &str) -> &str {
    digest.get(..DIGEST_PREFIX_LEN).unwrap_or(digest)
}
