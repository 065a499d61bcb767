//! Viewer parameters: the single source of truth for every tunable visual value.
//!
//! The store only records values. Pushing a change onto the live scene is the
//! job of whoever publishes it on the [`crate::events::ParamBus`].

mod color;
pub mod serialization;

pub use color::{ColorParseError, Rgb};

use std::fmt;

/// Every user-tunable visual parameter, with the defaults the viewer starts with.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ViewerState {
    pub background_color: Rgb,
    pub show_grid: bool,
    pub show_axes: bool,
    pub wireframe: bool,
    pub ambient_color: Rgb,
    pub light_position_x: f32,
    pub light_position_y: f32,
    pub light_position_z: f32,
    pub light_color: Rgb,
    pub intensity: f32,
    pub visible: bool,
    pub scale: f32,
    pub diffuse_color: Rgb,
    pub specular_color: Rgb,
    pub shininess: f32,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            background_color: Rgb::new(0xf0, 0xf0, 0xf0),
            show_grid: true,
            show_axes: true,
            wireframe: false,
            ambient_color: Rgb::new(0x40, 0x40, 0x40),
            light_position_x: 0.0,
            light_position_y: 1.0,
            light_position_z: 0.0,
            light_color: Rgb::WHITE,
            intensity: 0.5,
            visible: true,
            scale: 0.4,
            diffuse_color: Rgb::WHITE,
            specular_color: Rgb::new(0xa7, 0xa7, 0xa7),
            shininess: 30.0,
        }
    }
}

impl ViewerState {
    pub fn light_position(&self) -> [f32; 3] {
        [
            self.light_position_x,
            self.light_position_y,
            self.light_position_z,
        ]
    }

    pub fn get(&self, param: Param) -> ParamValue {
        match param {
            Param::BackgroundColor => ParamValue::Color(self.background_color),
            Param::ShowGrid => ParamValue::Bool(self.show_grid),
            Param::ShowAxes => ParamValue::Bool(self.show_axes),
            Param::AmbientColor => ParamValue::Color(self.ambient_color),
            Param::LightPositionX => ParamValue::Scalar(self.light_position_x),
            Param::LightPositionY => ParamValue::Scalar(self.light_position_y),
            Param::LightPositionZ => ParamValue::Scalar(self.light_position_z),
            Param::LightColor => ParamValue::Color(self.light_color),
            Param::Intensity => ParamValue::Scalar(self.intensity),
            Param::Visible => ParamValue::Bool(self.visible),
            Param::Wireframe => ParamValue::Bool(self.wireframe),
            Param::Scale => ParamValue::Scalar(self.scale),
            Param::DiffuseColor => ParamValue::Color(self.diffuse_color),
            Param::SpecularColor => ParamValue::Color(self.specular_color),
            Param::Shininess => ParamValue::Scalar(self.shininess),
        }
    }

    fn color_mut(&mut self, param: Param) -> Option<&mut Rgb> {
        match param {
            Param::BackgroundColor => Some(&mut self.background_color),
            Param::AmbientColor => Some(&mut self.ambient_color),
            Param::LightColor => Some(&mut self.light_color),
            Param::DiffuseColor => Some(&mut self.diffuse_color),
            Param::SpecularColor => Some(&mut self.specular_color),
            _ => None,
        }
    }

    fn bool_mut(&mut self, param: Param) -> Option<&mut bool> {
        match param {
            Param::ShowGrid => Some(&mut self.show_grid),
            Param::ShowAxes => Some(&mut self.show_axes),
            Param::Visible => Some(&mut self.visible),
            Param::Wireframe => Some(&mut self.wireframe),
            _ => None,
        }
    }

    fn scalar_mut(&mut self, param: Param) -> Option<&mut f32> {
        match param {
            Param::LightPositionX => Some(&mut self.light_position_x),
            Param::LightPositionY => Some(&mut self.light_position_y),
            Param::LightPositionZ => Some(&mut self.light_position_z),
            Param::Intensity => Some(&mut self.intensity),
            Param::Scale => Some(&mut self.scale),
            Param::Shininess => Some(&mut self.shininess),
            _ => None,
        }
    }
}

/// Names one field of [`ViewerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    BackgroundColor,
    ShowGrid,
    ShowAxes,
    AmbientColor,
    LightPositionX,
    LightPositionY,
    LightPositionZ,
    LightColor,
    Intensity,
    Visible,
    Wireframe,
    Scale,
    DiffuseColor,
    SpecularColor,
    Shininess,
}

impl Param {
    /// All parameters in settings-panel order.
    pub const ALL: [Param; 15] = [
        Param::BackgroundColor,
        Param::ShowGrid,
        Param::ShowAxes,
        Param::AmbientColor,
        Param::LightPositionX,
        Param::LightPositionY,
        Param::LightPositionZ,
        Param::LightColor,
        Param::Intensity,
        Param::Visible,
        Param::Wireframe,
        Param::Scale,
        Param::DiffuseColor,
        Param::SpecularColor,
        Param::Shininess,
    ];

    pub fn kind(self) -> ParamKind {
        match self {
            Param::BackgroundColor
            | Param::AmbientColor
            | Param::LightColor
            | Param::DiffuseColor
            | Param::SpecularColor => ParamKind::Color,
            Param::ShowGrid | Param::ShowAxes | Param::Visible | Param::Wireframe => {
                ParamKind::Bool
            }
            Param::LightPositionX
            | Param::LightPositionY
            | Param::LightPositionZ
            | Param::Intensity
            | Param::Scale
            | Param::Shininess => ParamKind::Scalar,
        }
    }

    /// Stable camelCase key, as used in logs.
    pub fn key(self) -> &'static str {
        match self {
            Param::BackgroundColor => "backgroundColor",
            Param::ShowGrid => "showGrid",
            Param::ShowAxes => "showAxes",
            Param::AmbientColor => "ambientColor",
            Param::LightPositionX => "lightPositionX",
            Param::LightPositionY => "lightPositionY",
            Param::LightPositionZ => "lightPositionZ",
            Param::LightColor => "lightColor",
            Param::Intensity => "intensity",
            Param::Visible => "visible",
            Param::Wireframe => "wireframe",
            Param::Scale => "scale",
            Param::DiffuseColor => "diffuseColor",
            Param::SpecularColor => "specularColor",
            Param::Shininess => "shininess",
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Color,
    Bool,
    Scalar,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Color(Rgb),
    Bool(bool),
    Scalar(f32),
}

impl ParamValue {
    pub fn kind(self) -> ParamKind {
        match self {
            ParamValue::Color(_) => ParamKind::Color,
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Scalar(_) => ParamKind::Scalar,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Color(color) => write!(f, "{color}"),
            ParamValue::Bool(value) => write!(f, "{value}"),
            ParamValue::Scalar(value) => write!(f, "{value:.3}"),
        }
    }
}

/// A single field write, as published to scene observers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamChange {
    pub param: Param,
    pub value: ParamValue,
}

impl ParamChange {
    pub fn new(param: Param, value: ParamValue) -> Self {
        Self { param, value }
    }

    pub fn color(param: Param, color: Rgb) -> Self {
        Self::new(param, ParamValue::Color(color))
    }

    pub fn flag(param: Param, value: bool) -> Self {
        Self::new(param, ParamValue::Bool(value))
    }

    pub fn scalar(param: Param, value: f32) -> Self {
        Self::new(param, ParamValue::Scalar(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("{param} expects a {expected:?} value, got {found:?}")]
    TypeMismatch {
        param: Param,
        expected: ParamKind,
        found: ParamKind,
    },
}

#[derive(Debug, Default)]
pub struct ParamStore {
    state: ViewerState,
}

impl ParamStore {
    pub fn new(state: ViewerState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn get(&self, param: Param) -> ParamValue {
        self.state.get(param)
    }

    /// Writes one field. Only the value type is checked: ranged scalars accept
    /// anything, the panel is what keeps them in range.
    pub fn set(&mut self, change: ParamChange) -> Result<(), ParamError> {
        let mismatch = || ParamError::TypeMismatch {
            param: change.param,
            expected: change.param.kind(),
            found: change.value.kind(),
        };
        match change.value {
            ParamValue::Color(color) => {
                *self.state.color_mut(change.param).ok_or_else(mismatch)? = color
            }
            ParamValue::Bool(value) => {
                *self.state.bool_mut(change.param).ok_or_else(mismatch)? = value
            }
            ParamValue::Scalar(value) => {
                *self.state.scalar_mut(change.param).ok_or_else(mismatch)? = value
            }
        }
        Ok(())
    }

    /// Field writes that would turn the current state into `target`.
    pub fn changes_to(&self, target: &ViewerState) -> Vec<ParamChange> {
        Param::ALL
            .iter()
            .filter_map(|&param| {
                let value = target.get(param);
                (self.get(param) != value).then(|| ParamChange::new(param, value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_startup_values() {
        let state = ViewerState::default();
        assert_eq!(state.background_color.to_hex(), "#f0f0f0");
        assert_eq!(state.ambient_color.to_hex(), "#404040");
        assert_eq!(state.specular_color.to_hex(), "#a7a7a7");
        assert_eq!(state.light_position(), [0.0, 1.0, 0.0]);
        assert_eq!(state.intensity, 0.5);
        assert_eq!(state.scale, 0.4);
        assert_eq!(state.shininess, 30.0);
        assert!(state.show_grid && state.show_axes && state.visible);
        assert!(!state.wireframe);
    }

    #[test]
    fn generic_set_then_get_round_trips_every_param() {
        let mut store = ParamStore::default();
        for param in Param::ALL {
            let value = match param.kind() {
                ParamKind::Color => ParamValue::Color(Rgb::new(1, 2, 3)),
                ParamKind::Bool => ParamValue::Bool(!matches!(
                    store.get(param),
                    ParamValue::Bool(true)
                )),
                ParamKind::Scalar => ParamValue::Scalar(0.75),
            };
            store.set(ParamChange::new(param, value)).unwrap();
            assert_eq!(store.get(param), value, "{param}");
        }
    }

    #[test]
    fn set_rejects_wrong_value_type() {
        let mut store = ParamStore::default();
        let err = store
            .set(ParamChange::color(Param::Scale, Rgb::WHITE))
            .unwrap_err();
        assert_eq!(
            err,
            ParamError::TypeMismatch {
                param: Param::Scale,
                expected: ParamKind::Scalar,
                found: ParamKind::Color,
            }
        );
        assert_eq!(store.state().scale, 0.4);
    }

    #[test]
    fn out_of_range_scalars_are_accepted() {
        let mut store = ParamStore::default();
        store
            .set(ParamChange::scalar(Param::Intensity, -3.0))
            .unwrap();
        store.set(ParamChange::scalar(Param::Scale, 42.0)).unwrap();
        assert_eq!(store.state().intensity, -3.0);
        assert_eq!(store.state().scale, 42.0);
    }

    #[test]
    fn changes_to_lists_only_differing_fields() {
        let store = ParamStore::default();
        let mut target = ViewerState::default();
        target.scale = 2.5;
        target.show_grid = false;
        let changes = store.changes_to(&target);
        assert_eq!(
            changes,
            vec![
                ParamChange::flag(Param::ShowGrid, false),
                ParamChange::scalar(Param::Scale, 2.5),
            ]
        );
        assert!(store.changes_to(store.state()).is_empty());
    }

    #[test]
    fn set_writes_the_named_field() {
        let mut store = ParamStore::default();
        store.set(ParamChange::scalar(Param::LightPositionX, 0.5)).unwrap();
        store.set(ParamChange::scalar(Param::LightPositionY, -0.5)).unwrap();
        store.set(ParamChange::scalar(Param::LightPositionZ, 1.0)).unwrap();
        store.set(ParamChange::flag(Param::Wireframe, true)).unwrap();
        store.set(ParamChange::color(Param::SpecularColor, Rgb::BLACK)).unwrap();
        assert_eq!(store.state().light_position(), [0.5, -0.5, 1.0]);
        assert!(store.state().wireframe);
        assert_eq!(store.get(Param::SpecularColor), ParamValue::Color(Rgb::BLACK));
    }
}
