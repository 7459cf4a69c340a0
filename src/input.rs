//! Edge-triggered input.
//!
//! The window delivers events as they happen; the viewer consumes them once per
//! frame as a [`FrameInput`]: the set of movement keys released since the last
//! poll, the drag delta of a left-button drag that ended since the last poll, and
//! whether the viewer should close. Held keys and in-progress drags produce
//! nothing until they are released.

use std::collections::BTreeSet;

use cgmath::Vector2;
use winit::{
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::camera::CameraAction;

/// Cursor travel, in pixels, below which a click does not count as a drag.
pub const DEFAULT_DRAG_THRESHOLD: f32 = 6.0;

/// Physical keys bound to camera actions and to closing the viewer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyBindings {
    pub forward: KeyCode,
    pub backward: KeyCode,
    pub strafe_left: KeyCode,
    pub strafe_right: KeyCode,
    pub rise: KeyCode,
    pub fall: KeyCode,
    pub close: KeyCode,
}

impl KeyBindings {
    pub fn action_for(&self, code: KeyCode) -> Option<CameraAction> {
        [
            (self.forward, CameraAction::Forward),
            (self.backward, CameraAction::Backward),
            (self.strafe_left, CameraAction::StrafeLeft),
            (self.strafe_right, CameraAction::StrafeRight),
            (self.rise, CameraAction::Rise),
            (self.fall, CameraAction::Fall),
        ]
        .into_iter()
        .find_map(|(key, action)| (key == code).then_some(action))
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: KeyCode::KeyW,
            backward: KeyCode::KeyS,
            strafe_left: KeyCode::KeyA,
            strafe_right: KeyCode::KeyD,
            rise: KeyCode::KeyQ,
            fall: KeyCode::KeyZ,
            close: KeyCode::Escape,
        }
    }
}

/// Everything the camera and the main loop need from one frame of input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub released: BTreeSet<CameraAction>,
    /// Cursor displacement of a left-button drag released this frame.
    pub drag: Option<Vector2<f32>>,
    pub close_requested: bool,
}

impl FrameInput {
    pub fn was_released(&self, action: CameraAction) -> bool {
        self.released.contains(&action)
    }

    pub fn is_empty(&self) -> bool {
        self.released.is_empty() && self.drag.is_none() && !self.close_requested
    }
}

#[derive(Clone, Copy, Debug)]
struct Press {
    origin: Vector2<f64>,
    max_distance_sq: f64,
}

/// Accumulates window events between two frame polls.
#[derive(Debug)]
pub struct InputCollector {
    bindings: KeyBindings,
    drag_threshold: f32,
    cursor: Vector2<f64>,
    press: Option<Press>,
    pending: FrameInput,
}

impl InputCollector {
    pub fn new(bindings: KeyBindings, drag_threshold: f32) -> Self {
        Self {
            bindings,
            drag_threshold,
            cursor: Vector2::new(0.0, 0.0),
            press: None,
            pending: FrameInput::default(),
        }
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Released,
                        ..
                    },
                ..
            } => self.key_released(*code),
            WindowEvent::CursorMoved { position, .. } => self.cursor_moved(position.x, position.y),
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_button(*button, state.is_pressed())
            }
            WindowEvent::CloseRequested => self.pending.close_requested = true,
            _ => (),
        }
    }

    pub fn key_released(&mut self, code: KeyCode) {
        if code == self.bindings.close {
            self.pending.close_requested = true;
        } else if let Some(action) = self.bindings.action_for(code) {
            self.pending.released.insert(action);
        }
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        self.cursor = Vector2::new(x, y);
        if let Some(press) = &mut self.press {
            let d = self.cursor - press.origin;
            press.max_distance_sq = press.max_distance_sq.max(d.x * d.x + d.y * d.y);
        }
    }

    pub fn mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if button != MouseButton::Left {
            return;
        }
        if pressed {
            self.press = Some(Press {
                origin: self.cursor,
                max_distance_sq: 0.0,
            });
        } else if let Some(press) = self.press.take() {
            let threshold = self.drag_threshold as f64;
            if press.max_distance_sq >= threshold * threshold {
                let d = self.cursor - press.origin;
                self.pending.drag = Some(Vector2::new(d.x as f32, d.y as f32));
            }
        }
    }

    /// Hand out everything observed since the previous call.
    pub fn take_frame(&mut self) -> FrameInput {
        std::mem::take(&mut self.pending)
    }
}

impl Default for InputCollector {
    fn default() -> Self {
        Self::new(KeyBindings::default(), DEFAULT_DRAG_THRESHOLD)
    }
}
