//! Viewer configuration (`meshview.json` in the working directory).
//!
//! Every field is optional in the file; anything missing falls back to the
//! values the viewer has always started with.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "meshview.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    /// Width of the settings panel in logical pixels.
    pub panel_width: f32,
    /// Candidate models for startup; one is picked at random.
    pub default_models: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// Orbit inertia, 0 disables it.
    pub damping: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            panel_width: 300.0,
            default_models: vec![
                PathBuf::from("models/cube.obj"),
                PathBuf::from("models/octahedron.obj"),
                PathBuf::from("models/tetrahedron.obj"),
            ],
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "meshview".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 70.0,
            near: 0.01,
            far: 100.0,
            position: [1.2, 2.0, 1.4],
            target: [0.0, 0.0, 0.0],
            damping: 0.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ViewerConfig {
    /// Reads `path` if it exists. A missing file is not an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn pick_default_model(&self) -> Option<PathBuf> {
        self.pick_default_model_with(&mut rand::rng())
    }

    pub fn pick_default_model_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<PathBuf> {
        self.default_models.choose(rng).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn defaults_reproduce_the_classic_viewer() {
        let config = ViewerConfig::default();
        assert_eq!(config.panel_width, 300.0);
        assert_eq!(config.camera.fov_degrees, 70.0);
        assert_eq!(config.camera.near, 0.01);
        assert_eq!(config.camera.far, 100.0);
        assert_eq!(config.camera.position, [1.2, 2.0, 1.4]);
        assert_eq!(config.camera.damping, 0.0);
        assert_eq!(config.default_models.len(), 3);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ViewerConfig::load_or_default(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"{ "camera": { "damping": 0.1 }, "default_models": ["models/bunny.obj"] }"#,
        )
        .unwrap();
        let config = ViewerConfig::load_or_default(&path).unwrap();
        assert_eq!(config.camera.damping, 0.1);
        assert_eq!(config.camera.fov_degrees, 70.0);
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(
            config.pick_default_model(),
            Some(PathBuf::from("models/bunny.obj"))
        );
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ViewerConfig::load_or_default(&path),
            Err(ConfigError::Json { .. })
        ));
    }

    #[test]
    fn random_pick_is_always_a_candidate() {
        let config = ViewerConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let picked = config.pick_default_model_with(&mut rng).unwrap();
            assert!(config.default_models.contains(&picked));
        }
        let empty = ViewerConfig {
            default_models: Vec::new(),
            ..ViewerConfig::default()
        };
        assert!(empty.pick_default_model().is_none());
    }
}
