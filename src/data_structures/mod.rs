//! Viewer data structures: scene graphs, GPU geometry, materials and textures.
//!
//! - `scene_graph` is the read-only hierarchy produced by the file loaders
//! - `geometry` holds per-mesh vertex and index buffers
//! - `material` holds per-material image bindings or flat colours
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod geometry;
pub mod material;
pub mod scene_graph;
pub mod texture;
