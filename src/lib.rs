//! vitrine
//!
//! A cursor-reactive glTF showcase for native and WASM. A row of models is
//! loaded from a list of URLs; every model appears as soon as its own download
//! finishes and tilts toward the mouse pointer, the further away the stronger.
//!
//! High-level modules
//! - `camera`: camera types and uniforms for view/projection
//! - `config`: the constants that shape the scene
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: engine data models (meshes, instances, textures, scene graph)
//! - `flow`: the event loop and the flow trait scenes implement
//! - `pipelines`: the lit mesh pipeline and its light uniform
//! - `resources`: fetching and decoding glTF assets and uploading them to the GPU
//! - `render`: render composition for efficient pipeline reuse
//! - `showcase`: the model row, its layout and the tilt animation
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod showcase;

pub use config::ShowcaseConfig;
pub use showcase::{Showcase, ShowcaseEvent, ShowcaseState};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Open a window and run the showcase until it is closed.
pub fn run_showcase(config: ShowcaseConfig) -> anyhow::Result<()> {
    flow::run::<ShowcaseState, ShowcaseEvent>(vec![Showcase::constructor(config)])
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    run_showcase(ShowcaseConfig::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
