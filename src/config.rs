//! Viewer configuration.
//!
//! Every tunable the viewer needs is collected in [`ViewerConfig`] and passed to
//! [`run`](crate::flow::run) explicitly. The defaults reproduce the classic viewer:
//! a 1280x720 window, a camera slightly above the origin and W/S/A/D/Q/Z movement.

use std::path::PathBuf;

use cgmath::{Deg, Point3, Rad};

use crate::{
    camera::{Camera, CameraController, DRAG_SENSITIVITY, MOVEMENT_STEP, Projection},
    importer::{ImportOptions, TextureFailurePolicy},
    input::{DEFAULT_DRAG_THRESHOLD, InputCollector, KeyBindings},
};

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// Scene file to load (`.obj`, `.gltf` or `.glb`).
    pub scene: PathBuf,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub input: InputConfig,
    pub clear_colour: wgpu::Color,
    pub texture_failure: TextureFailurePolicy,
}

impl ViewerConfig {
    pub fn new(scene: impl Into<PathBuf>) -> Self {
        Self {
            scene: scene.into(),
            ..Default::default()
        }
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            texture_failure: self.texture_failure,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            scene: PathBuf::new(),
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            input: InputConfig::default(),
            clear_colour: wgpu::Color::BLACK,
            texture_failure: TextureFailurePolicy::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Scene Viewer".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub position: Point3<f32>,
    /// Radians.
    pub yaw: f32,
    /// Radians.
    pub pitch: f32,
    pub movement_step: f32,
    pub drag_sensitivity: f32,
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl CameraConfig {
    pub fn camera(&self) -> Camera {
        Camera::new(self.position, Rad(self.yaw), Rad(self.pitch))
    }

    pub fn controller(&self) -> CameraController {
        CameraController::new(self.movement_step, self.drag_sensitivity)
    }

    pub fn projection(&self) -> Projection {
        Projection::new(Deg(self.fovy_degrees), self.znear, self.zfar)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.5, 0.0),
            yaw: 5.66,
            pitch: 0.0,
            movement_step: MOVEMENT_STEP,
            drag_sensitivity: DRAG_SENSITIVITY,
            fovy_degrees: 45.0,
            znear: 0.1,
            zfar: 1000.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputConfig {
    pub bindings: KeyBindings,
    /// Pixels the cursor has to travel before a click counts as a drag.
    pub drag_threshold: f32,
}

impl InputConfig {
    pub fn collector(&self) -> InputCollector {
        InputCollector::new(self.bindings.clone(), self.drag_threshold)
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            bindings: KeyBindings::default(),
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
        }
    }
}
