//! Scene data: meshes, materials, textures, instances and the scene graph.
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds per-instance transformation data
//! - `bounds` is the axis-aligned box used to recentre loaded assets
//! - `scene_graph` enables hierarchical scene organization

pub mod bounds;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
