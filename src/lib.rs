//! meshview: a desktop viewer for Wavefront OBJ models with a live settings
//! panel for lighting, material and scene helpers.

pub mod app;
pub mod assets;
pub mod config;
pub mod context;
pub mod events;
pub mod params;
pub mod render;
pub mod scene;
pub mod ui;
