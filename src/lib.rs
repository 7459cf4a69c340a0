//! scene-viewer
//!
//! A minimal free-fly 3D scene viewer. A scene file is parsed into a read-only
//! scene graph, imported once into GPU geometry and materials plus a flat draw
//! list, and rendered every frame from a camera driven by edge-triggered
//! keyboard and mouse input.
//!
//! High-level modules
//! - `camera`: free-fly camera, controller and view/projection uniforms
//! - `config`: every tunable of the viewer, passed explicitly to `flow::run`
//! - `context`: window surface, GPU device/queue and the GPU upload seam
//! - `data_structures`: scene graphs, geometry, materials and textures
//! - `error`: error taxonomy of import, resource loading and shader setup
//! - `flow`: the winit event loop
//! - `importer`: scene graph to GPU resources and draw list
//! - `input`: per-frame edge-triggered input
//! - `pipelines`: the scene render pipeline and its shader
//! - `render`: per-frame planning and draw submission
//! - `resources`: OBJ/glTF scene loaders and image decoding
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod importer;
pub mod input;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
pub use winit::event::WindowEvent;
pub use winit::keyboard::KeyCode;
