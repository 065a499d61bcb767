//! CPU-side scene graph drawn by the renderer every frame.

mod object;

pub use object::{LoadedObject, MaterialHandle, MeshGeometry, ObjectId, SceneMesh};

use crate::assets::DecodedModel;
use crate::events::ParamObserver;
use crate::params::{Param, ParamChange, ParamValue, Rgb, ViewerState};
use glam::Vec3;

pub const GRID_SIZE: f32 = 8.0;
pub const GRID_DIVISIONS: u32 = 100;
pub const GRID_OPACITY: f32 = 0.25;
pub const AXES_LENGTH: f32 = 1.5;

const GRID_CENTER_COLOR: Rgb = Rgb::new(0x44, 0x44, 0x44);
const GRID_LINE_COLOR: Rgb = Rgb::new(0x88, 0x88, 0x88);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HelperId(pub u32);

/// Line vertex for helpers: position and color.
pub type HelperVertex = ([f32; 3], Rgb);

#[derive(Debug, Clone, PartialEq)]
pub struct GridHelper {
    pub id: HelperId,
    pub size: f32,
    pub divisions: u32,
    pub opacity: f32,
    pub visible: bool,
}

impl GridHelper {
    /// Line list on the XZ plane; the two center lines are darker.
    pub fn line_vertices(&self) -> Vec<HelperVertex> {
        let half = self.size / 2.0;
        let step = self.size / self.divisions.max(1) as f32;
        let center = self.divisions / 2;
        let mut vertices = Vec::with_capacity((self.divisions as usize + 1) * 4);
        for i in 0..=self.divisions {
            let offset = -half + i as f32 * step;
            let color = if i == center {
                GRID_CENTER_COLOR
            } else {
                GRID_LINE_COLOR
            };
            vertices.push(([-half, 0.0, offset], color));
            vertices.push(([half, 0.0, offset], color));
            vertices.push(([offset, 0.0, -half], color));
            vertices.push(([offset, 0.0, half], color));
        }
        vertices
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxesHelper {
    pub id: HelperId,
    pub length: f32,
    pub visible: bool,
}

impl AxesHelper {
    /// X red, Y green, Z blue, starting at the origin.
    pub fn line_vertices(&self) -> Vec<HelperVertex> {
        let l = self.length;
        let red = Rgb::new(0xff, 0x00, 0x00);
        let green = Rgb::new(0x00, 0xff, 0x00);
        let blue = Rgb::new(0x00, 0x00, 0xff);
        vec![
            ([0.0, 0.0, 0.0], red),
            ([l, 0.0, 0.0], red),
            ([0.0, 0.0, 0.0], green),
            ([0.0, l, 0.0], green),
            ([0.0, 0.0, 0.0], blue),
            ([0.0, 0.0, l], blue),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Rgb,
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl DirectionalLight {
    /// Unit vector pointing from the target towards the light.
    pub fn to_light(&self) -> Vec3 {
        (self.position - self.target).normalize_or_zero()
    }
}

/// Phong material shared by every mesh of the loaded object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongMaterial {
    pub diffuse: Rgb,
    pub specular: Rgb,
    pub shininess: f32,
    pub wireframe: bool,
    pub double_sided: bool,
}

#[derive(Debug)]
pub struct Scene {
    pub background: Rgb,
    pub grid: GridHelper,
    pub axes: AxesHelper,
    pub ambient_light: AmbientLight,
    pub directional_light: DirectionalLight,
    material: PhongMaterial,
    material_handle: MaterialHandle,
    object: Option<LoadedObject>,
    next_object_id: u64,
}

impl Scene {
    /// Builds the fixed members from the current state. The scene starts without
    /// an object; models are installed once they finish loading.
    pub fn build(state: &ViewerState) -> Self {
        Self {
            background: state.background_color,
            grid: GridHelper {
                id: HelperId(1),
                size: GRID_SIZE,
                divisions: GRID_DIVISIONS,
                opacity: GRID_OPACITY,
                visible: state.show_grid,
            },
            axes: AxesHelper {
                id: HelperId(2),
                length: AXES_LENGTH,
                visible: state.show_axes,
            },
            ambient_light: AmbientLight {
                color: state.ambient_color,
            },
            directional_light: DirectionalLight {
                color: state.light_color,
                intensity: state.intensity,
                position: Vec3::from(state.light_position()),
                target: Vec3::ZERO,
            },
            material: PhongMaterial {
                diffuse: state.diffuse_color,
                specular: state.specular_color,
                shininess: state.shininess,
                wireframe: state.wireframe,
                double_sided: true,
            },
            material_handle: MaterialHandle(0),
            object: None,
            next_object_id: 1,
        }
    }

    pub fn material(&self) -> &PhongMaterial {
        &self.material
    }

    pub fn shared_material(&self) -> MaterialHandle {
        self.material_handle
    }

    pub fn object(&self) -> Option<&LoadedObject> {
        self.object.as_ref()
    }

    /// Turns a decoded model into the scene object: current visibility and scale
    /// are applied and every mesh is bound to the shared material. The previous
    /// object, if any, is detached and returned.
    pub fn install_model(
        &mut self,
        decoded: DecodedModel,
        state: &ViewerState,
    ) -> Option<LoadedObject> {
        let bounds = decoded.model.bounds();
        let material = self.material_handle;
        let meshes = decoded
            .model
            .meshes
            .into_iter()
            .map(|mesh| SceneMesh::from_obj(mesh, material))
            .collect();
        let id = ObjectId(self.next_object_id);
        self.next_object_id += 1;

        let object = LoadedObject {
            id,
            name: decoded.name,
            source: decoded.source,
            digest: decoded.digest,
            meshes,
            visible: state.visible,
            scale: Vec3::splat(state.scale),
            bounds,
        };
        log::info!(
            "Attached '{}' ({} meshes, {} triangles)",
            object.name,
            object.meshes.len(),
            object.triangle_count()
        );
        let previous = self.object.replace(object);
        if let Some(previous) = &previous {
            log::debug!("Detached '{}'", previous.name);
        }
        previous
    }
}

impl ParamObserver for Scene {
    fn param_changed(&mut self, change: &ParamChange) {
        match (change.param, change.value) {
            (Param::BackgroundColor, ParamValue::Color(color)) => self.background = color,
            (Param::ShowGrid, ParamValue::Bool(visible)) => self.grid.visible = visible,
            (Param::ShowAxes, ParamValue::Bool(visible)) => self.axes.visible = visible,
            (Param::AmbientColor, ParamValue::Color(color)) => self.ambient_light.color = color,
            (Param::LightPositionX, ParamValue::Scalar(x)) => self.directional_light.position.x = x,
            (Param::LightPositionY, ParamValue::Scalar(y)) => self.directional_light.position.y = y,
            (Param::LightPositionZ, ParamValue::Scalar(z)) => self.directional_light.position.z = z,
            (Param::LightColor, ParamValue::Color(color)) => {
                self.directional_light.color = color
            }
            (Param::Intensity, ParamValue::Scalar(intensity)) => {
                self.directional_light.intensity = intensity
            }
            (Param::Visible, ParamValue::Bool(visible)) => {
                if let Some(object) = &mut self.object {
                    object.visible = visible;
                }
            }
            (Param::Wireframe, ParamValue::Bool(wireframe)) => self.material.wireframe = wireframe,
            (Param::Scale, ParamValue::Scalar(scale)) => {
                if let Some(object) = &mut self.object {
                    object.set_uniform_scale(scale);
                }
            }
            (Param::DiffuseColor, ParamValue::Color(color)) => self.material.diffuse = color,
            (Param::SpecularColor, ParamValue::Color(color)) => self.material.specular = color,
            (Param::Shininess, ParamValue::Scalar(shininess)) => {
                self.material.shininess = shininess
            }
            (param, value) => log::warn!("Ignoring {} change with mismatched value {}", param, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{load_model_bytes, LoadSource};
    use std::path::PathBuf;

    fn decoded(name: &str, text: &str) -> DecodedModel {
        load_model_bytes(text.as_bytes(), LoadSource::File(PathBuf::from(name))).unwrap()
    }

    const TWO_GROUPS: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
v 0 0 1
g a
usemtl brass
f 1 2 3
g b
usemtl wood
f 1 3 4
";

    #[test]
    fn build_reflects_state_and_starts_empty() {
        let mut state = ViewerState::default();
        state.show_axes = false;
        state.light_position_x = 0.5;
        let scene = Scene::build(&state);
        assert_eq!(scene.background, state.background_color);
        assert!(scene.grid.visible);
        assert!(!scene.axes.visible);
        assert_eq!(scene.directional_light.position, Vec3::new(0.5, 1.0, 0.0));
        assert_eq!(scene.directional_light.target, Vec3::ZERO);
        assert_eq!(scene.material().shininess, 30.0);
        assert!(scene.material().double_sided);
        assert!(scene.object().is_none());
    }

    #[test]
    fn every_mesh_uses_the_shared_material() {
        let state = ViewerState::default();
        let mut scene = Scene::build(&state);
        scene.install_model(decoded("two.obj", TWO_GROUPS), &state);
        let object = scene.object().unwrap();
        assert_eq!(object.meshes.len(), 2);
        for mesh in &object.meshes {
            assert_eq!(mesh.material, scene.shared_material());
        }
        let requested: Vec<_> = object
            .meshes
            .iter()
            .map(|mesh| mesh.requested_material.as_deref())
            .collect();
        assert_eq!(requested, vec![Some("brass"), Some("wood")]);
    }

    #[test]
    fn installing_replaces_the_previous_object() {
        let state = ViewerState::default();
        let mut scene = Scene::build(&state);
        assert!(scene
            .install_model(decoded("first.obj", TWO_GROUPS), &state)
            .is_none());
        let first_id = scene.object().unwrap().id;

        let detached = scene
            .install_model(decoded("second.obj", TWO_GROUPS), &state)
            .expect("previous object detached");
        assert_eq!(detached.id, first_id);
        assert_eq!(detached.name, "first.obj");
        let current = scene.object().unwrap();
        assert_ne!(current.id, first_id);
        assert_eq!(current.name, "second.obj");
    }

    #[test]
    fn install_applies_current_scale_and_visibility() {
        let mut state = ViewerState::default();
        state.scale = 2.5;
        state.visible = false;
        let mut scene = Scene::build(&state);
        scene.install_model(decoded("bunny.obj", TWO_GROUPS), &state);
        let object = scene.object().unwrap();
        assert_eq!(object.scale, Vec3::splat(2.5));
        assert!(!object.visible);
    }

    #[test]
    fn grid_toggle_only_flips_visibility() {
        let state = ViewerState::default();
        let mut scene = Scene::build(&state);
        let before = scene.grid.clone();
        scene.param_changed(&ParamChange::flag(Param::ShowGrid, false));
        assert!(!scene.grid.visible);
        scene.param_changed(&ParamChange::flag(Param::ShowGrid, true));
        assert_eq!(scene.grid, before);
    }

    #[test]
    fn object_changes_without_object_are_ignored() {
        let mut scene = Scene::build(&ViewerState::default());
        scene.param_changed(&ParamChange::scalar(Param::Scale, 3.0));
        scene.param_changed(&ParamChange::flag(Param::Visible, false));
        assert!(scene.object().is_none());
    }

    #[test]
    fn mismatched_values_leave_the_scene_alone() {
        let mut scene = Scene::build(&ViewerState::default());
        let before = scene.material;
        scene.param_changed(&ParamChange::flag(Param::Shininess, true));
        assert_eq!(scene.material, before);
    }

    #[test]
    fn grid_and_axes_geometry() {
        let scene = Scene::build(&ViewerState::default());
        let grid = scene.grid.line_vertices();
        assert_eq!(grid.len(), (GRID_DIVISIONS as usize + 1) * 4);
        assert!(grid
            .iter()
            .all(|(p, _)| p[1] == 0.0 && p[0].abs() <= 4.0 + 1e-4 && p[2].abs() <= 4.0 + 1e-4));
        assert_eq!(grid.iter().filter(|(_, c)| *c == GRID_CENTER_COLOR).count(), 4);

        let axes = scene.axes.line_vertices();
        assert_eq!(axes.len(), 6);
        assert_eq!(axes[1].0, [AXES_LENGTH, 0.0, 0.0]);
    }

    #[test]
    fn light_direction_points_at_the_light() {
        let scene = Scene::build(&ViewerState::default());
        assert_eq!(scene.directional_light.to_light(), Vec3::Y);
    }
}
