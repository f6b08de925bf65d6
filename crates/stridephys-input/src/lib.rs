//! Keyboard-to-intent translation and the orbit camera. Both are pure state
//! machines so any windowing layer can feed them raw events.

use glam::Quat;
use stridephys_core::Scalar;
use stridephys_core::types::Vec3;
use stridephys_rig::{CommandIntent, Speed};

/// Symbolic key set. The host window layer translates its own key codes to
/// these before forwarding.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Key {
    Forward,      // W / Up
    Backward,     // S / Down
    StrafeLeft,   // A
    StrafeRight,  // D
    RotateLeft,   // Q / Left
    RotateRight,  // E / Right
    Jump,         // Space
    SpeedSlow,    // 1
    SpeedNormal,  // 2
    SpeedFast,    // 3
}

const KEY_COUNT: usize = 10;

/// Held-key tracker. `apply_to` rewrites the sustained intent fields from
/// the current hold state every frame, so keyboard input and programmatic
/// command calls share one intent record and the last writer wins.
#[derive(Default)]
pub struct InputAdapter {
    held: [bool; KEY_COUNT],
    jump_edge: bool,
    speed: Option<Speed>,
}

impl InputAdapter {
    pub fn new() -> Self { Self::default() }

    pub fn key_down(&mut self, k: Key) {
        let i = k as usize;
        match k {
            Key::Jump => {
                // edge-triggered: holding space is one gesture
                if !self.held[i] { self.jump_edge = true; }
            }
            Key::SpeedSlow => self.speed = Some(Speed::Slow),
            Key::SpeedNormal => self.speed = Some(Speed::Normal),
            Key::SpeedFast => self.speed = Some(Speed::Fast),
            _ => {}
        }
        self.held[i] = true;
    }

    pub fn key_up(&mut self, k: Key) {
        self.held[k as usize] = false;
    }

    #[inline] fn held(&self, k: Key) -> bool { self.held[k as usize] }

    pub fn apply_to(&mut self, intent: &mut CommandIntent) {
        intent.stop();
        if self.held(Key::Forward) { intent.move_forward(); }
        if self.held(Key::Backward) { intent.move_backward(); }
        if self.held(Key::StrafeLeft) { intent.move_left(); }
        if self.held(Key::StrafeRight) { intent.move_right(); }
        if self.held(Key::RotateLeft) { intent.rotate_left(); }
        if self.held(Key::RotateRight) { intent.rotate_right(); }
        if self.jump_edge {
            intent.jump();
            self.jump_edge = false;
        }
        if let Some(s) = self.speed.take() {
            intent.set_speed(s);
        }
    }
}

/* ---------------- orbit camera ---------------- */

/// Third-person orbit camera. Follows a look-at target but never feeds back
/// into the simulation.
#[derive(Copy, Clone, Debug)]
pub struct OrbitCamera {
    pub yaw: Scalar,
    pub pitch: Scalar,
    pub distance: Scalar,
    pub target: Vec3,
    pub drag_scale: Scalar, // rad per pixel
}

const PITCH_LIMIT: Scalar = 1.45; // keep away from the poles

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.5,
            distance: 5.0,
            target: Vec3::ZERO,
            drag_scale: 0.005,
        }
    }
}

impl OrbitCamera {
    pub fn drag(&mut self, dx: Scalar, dy: Scalar) {
        self.yaw -= dx * self.drag_scale;
        self.pitch = (self.pitch + dy * self.drag_scale).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn zoom(&mut self, delta: Scalar) {
        self.distance = (self.distance - delta).clamp(1.0, 30.0);
    }

    pub fn follow(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Eye position on the orbit sphere around the current target.
    pub fn eye(&self) -> Vec3 {
        let rot = Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(-self.pitch);
        self.target + rot * (Vec3::Z * self.distance)
    }
}
