use crate::params::ViewerState;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

pub fn save_settings_to_file(state: &ViewerState, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Missing fields fall back to their defaults.
pub fn load_settings_from_file(path: &Path) -> Result<ViewerState> {
    let json = std::fs::read_to_string(path)?;
    let state: ViewerState = serde_json::from_str(&json)?;
    Ok(state)
}
