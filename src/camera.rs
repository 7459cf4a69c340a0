//! Free-fly camera.
//!
//! [`Camera`] holds position and orientation. Its look direction is always derived
//! from yaw and pitch and re-normalized, never stored independently.
//! [`CameraController`] turns one frame's edge-triggered [`FrameInput`] into
//! discrete steps: a released drag rotates, each released movement key moves the
//! camera by a fixed step. Nothing is integrated over time, so the magnitude of a
//! step does not depend on the frame rate.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector2, Vector3};

use crate::input::FrameInput;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Below this `|cos(pitch)|` the look direction is treated as parallel to world-up.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Pitch offset applied to the derived direction when it would be parallel to world-up.
const PARALLEL_NUDGE: f32 = 1e-4;

pub const WORLD_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// Distance covered by one released movement key.
pub const MOVEMENT_STEP: f32 = 0.2;

/// Pixels of drag per radian of rotation.
pub const DRAG_SENSITIVITY: f32 = 500.0;

/// The six movement actions a key release can trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CameraAction {
    Forward,
    Backward,
    StrafeLeft,
    StrafeRight,
    Rise,
    Fall,
}

impl CameraAction {
    /// Order in which released actions are applied within a frame.
    pub const ALL: [CameraAction; 6] = [
        CameraAction::Forward,
        CameraAction::Backward,
        CameraAction::StrafeLeft,
        CameraAction::StrafeRight,
        CameraAction::Rise,
        CameraAction::Fall,
    ];
}

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    yaw: Rad<f32>,
    pitch: Rad<f32>,
    direction: Vector3<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        let mut camera = Self {
            position: position.into(),
            yaw: Rad(0.0),
            pitch: Rad(0.0),
            direction: Vector3::unit_x(),
        };
        camera.set_orientation(yaw.into(), pitch.into());
        camera
    }

    pub fn yaw(&self) -> Rad<f32> {
        self.yaw
    }

    pub fn pitch(&self) -> Rad<f32> {
        self.pitch
    }

    /// Unit-length look direction.
    pub fn direction(&self) -> Vector3<f32> {
        self.direction
    }

    /// Sets yaw and pitch and re-derives the look direction.
    ///
    /// Pitch is stored as given. Only when the direction would be exactly
    /// parallel to world-up is it derived from a slightly nudged pitch, which
    /// keeps `look_at_rh` and [`Camera::right`] defined.
    pub fn set_orientation(&mut self, yaw: Rad<f32>, pitch: Rad<f32>) {
        self.yaw = yaw;
        self.pitch = pitch;
        let mut direction_pitch = pitch.0;
        if direction_pitch.cos().abs() < PARALLEL_EPSILON {
            direction_pitch -= PARALLEL_NUDGE * direction_pitch.sin().signum();
        }
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let (sin_pitch, cos_pitch) = direction_pitch.sin_cos();
        self.direction = Vector3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch).normalize();
    }

    /// Unit vector pointing to the camera's right, in the horizontal plane.
    pub fn right(&self) -> Vector3<f32> {
        self.direction.cross(WORLD_UP).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.direction, WORLD_UP)
    }
}

/// Perspective parameters; the aspect ratio comes from the viewport each frame.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Projection for a `width` x `height` viewport, in wgpu clip space.
    pub fn calc_matrix(&self, width: u32, height: u32) -> Matrix4<f32> {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, aspect, self.znear, self.zfar)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(cgmath::Deg(45.0), 0.1, 1000.0)
    }
}

/// Combined view and projection for one frame.
pub fn view_projection(camera: &Camera, projection: &Projection, viewport: (u32, u32)) -> Matrix4<f32> {
    projection.calc_matrix(viewport.0, viewport.1) * camera.calc_matrix()
}

#[derive(Clone, Copy, Debug)]
pub struct CameraController {
    step: f32,
    sensitivity: f32,
}

impl CameraController {
    pub fn new(step: f32, sensitivity: f32) -> Self {
        Self { step, sensitivity }
    }

    /// Apply one frame of input: first the released drag, then every released
    /// movement action in [`CameraAction::ALL`] order.
    pub fn update(&self, camera: &mut Camera, input: &FrameInput) {
        if let Some(delta) = input.drag {
            self.handle_drag(camera, delta);
        }
        for action in CameraAction::ALL {
            if input.was_released(action) {
                self.handle_action(camera, action);
            }
        }
    }

    /// Rotate by a drag of `delta` pixels: right turns right, down looks down.
    pub fn handle_drag(&self, camera: &mut Camera, delta: Vector2<f32>) {
        let yaw = camera.yaw + Rad(delta.x / self.sensitivity);
        let pitch = camera.pitch - Rad(delta.y / self.sensitivity);
        camera.set_orientation(yaw, pitch);
    }

    pub fn handle_action(&self, camera: &mut Camera, action: CameraAction) {
        let offset = match action {
            CameraAction::Forward => camera.direction() * self.step,
            CameraAction::Backward => -camera.direction() * self.step,
            CameraAction::StrafeLeft => -camera.right() * self.step,
            CameraAction::StrafeRight => camera.right() * self.step,
            CameraAction::Rise => WORLD_UP * self.step,
            CameraAction::Fall => -WORLD_UP * self.step,
        };
        camera.position += offset;
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(MOVEMENT_STEP, DRAG_SENSITIVITY)
    }
}

/// Bind group 0 of the scene pipeline.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, view_proj: Matrix4<f32>) {
        self.view_proj = view_proj.into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}
