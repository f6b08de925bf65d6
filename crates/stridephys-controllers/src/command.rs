use glam::Quat;
use stridephys_core::{Scalar, vec3};
use stridephys_core::types::Vec3;
use stridephys_rig::{HumanoidRig, Limb, STAND_HEIGHT};
use stridephys_viz::LedgerEvent;
use stridephys_world::World;

#[derive(Copy, Clone, Debug)]
pub struct CommandParams {
    pub base_speed: Scalar,        // m/s at Speed::Normal
    pub jump_impulse: Scalar,      // N·s, torso only
    pub jump_debounce: u8,         // steps one gesture is held off
    pub stand_tolerance: Scalar,   // torso height window that allows a jump
    pub stand_height: Scalar,
    pub gait_rate: Scalar,         // rad of gait phase per simulated second
    pub arm_swing_rate: Scalar,    // peak shoulder target vel, rad/s
}

impl Default for CommandParams {
    fn default() -> Self {
        Self {
            base_speed: 1.0,
            jump_impulse: 260.0,
            jump_debounce: 5,
            stand_tolerance: 0.10,
            stand_height: STAND_HEIGHT,
            gait_rate: 6.0,
            arm_swing_rate: 2.5,
        }
    }
}

/// Re-evaluates the rig's command intent once per step. Translation is a
/// kinematic override: limb positions are moved directly and the horizontal
/// velocity is discarded, which keeps walking drift-free without a traction
/// controller for the whole constraint graph. Jump and arm swing stay
/// physical (impulse and hinge motors).
pub struct CommandCtrl {
    pub params: CommandParams,
    gait_phase: Scalar,
}

impl CommandCtrl {
    pub fn new(params: CommandParams) -> Self {
        Self { params, gait_phase: 0.0 }
    }

    #[inline] pub fn gait_phase(&self) -> Scalar { self.gait_phase }

    pub fn step(&mut self, world: &mut World, rig: &mut HumanoidRig, dt: Scalar) {
        let factor = rig.intent.speed.factor();
        let torso = rig.body(Limb::Torso);

        // walking / strafing
        if rig.intent.translating() {
            let yaw = yaw_of(world.body_pose(torso).rot);
            let local = vec3(rig.intent.strafe as Scalar, 0.0, rig.intent.forward as Scalar);
            let delta = (Quat::from_rotation_y(yaw) * local) * (self.params.base_speed * factor * dt);
            for l in Limb::ALL {
                let id = rig.body(l);
                let mut p = world.body_pose(id);
                p.pos += delta;
                world.set_body_pose(id, p);
                let mut v = world.body_vel(id);
                v.lin.x = 0.0;
                v.lin.z = 0.0;
                world.set_body_vel(id, v);
            }
            world.push_event(LedgerEvent::KinematicMove { dx: delta.x, dz: delta.z });
        }

        // yaw rate is set directly while a rotate command is held, released
        // to zero otherwise
        let mut tv = world.body_vel(torso);
        tv.ang.y = rig.intent.rotate_rate * factor;
        world.set_body_vel(torso, tv);

        // jump: torso impulse, gated on standing height and a short debounce
        if rig.intent.jump_frames_remaining > 0 {
            rig.intent.jump_frames_remaining -= 1;
        }
        if rig.intent.jump_requested {
            rig.intent.jump_requested = false;
            let h = world.body_pose(torso).pos.y;
            let standing = (h - self.params.stand_height).abs() <= self.params.stand_tolerance;
            if standing && rig.intent.jump_frames_remaining == 0 {
                world.apply_impulse(torso, vec3(0.0, self.params.jump_impulse, 0.0));
                world.push_event(LedgerEvent::JumpImpulse {
                    id: torso.0, jy: self.params.jump_impulse,
                });
                rig.intent.jump_frames_remaining = self.params.jump_debounce;
            }
        }

        // arm swing: alternate shoulders on a sim-time gait phase while
        // moving forward or backward; motors hold at zero otherwise
        if rig.intent.forward != 0 {
            self.gait_phase = (self.gait_phase
                + self.params.gait_rate * factor * dt)
                .rem_euclid(core::f32::consts::TAU);
            let target = self.params.arm_swing_rate * self.gait_phase.sin();
            world.set_hinge_motor_target(rig.shoulder_left, target);
            world.set_hinge_motor_target(rig.shoulder_right, -target);
            world.push_event(LedgerEvent::MotorDrive {
                hinge: rig.shoulder_left.0, target,
            });
        } else {
            world.set_hinge_motor_target(rig.shoulder_left, 0.0);
            world.set_hinge_motor_target(rig.shoulder_right, 0.0);
        }
    }
}

/// Yaw about +Y of an orientation, from where it carries the +Z axis.
#[inline]
pub fn yaw_of(q: Quat) -> Scalar {
    let f = q * Vec3::Z;
    f.x.atan2(f.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stridephys_core::vec3;
    use stridephys_rig::{build_humanoid, RigParams, Speed};

    fn setup() -> (World, HumanoidRig, CommandCtrl) {
        let mut w = World::new(vec3(0.0, -9.81, 0.0), 8);
        let rig = build_humanoid(&mut w, stridephys_core::types::Vec3::ZERO, RigParams::default());
        (w, rig, CommandCtrl::new(CommandParams::default()))
    }

    #[test]
    fn forward_displacement_matches_commanded_speed() {
        // ten controller steps of 0.1 s at normal speed: exactly 1 m of +z
        let (mut w, mut rig, mut ctrl) = setup();
        rig.intent.move_forward();
        let z0 = w.body_pose(rig.body(Limb::Torso)).pos.z;
        for _ in 0..10 {
            ctrl.step(&mut w, &mut rig, 0.1);
        }
        let z1 = w.body_pose(rig.body(Limb::Torso)).pos.z;
        assert!((z1 - z0 - 1.0).abs() < 0.01, "dz {}", z1 - z0);
    }

    #[test]
    fn fast_speed_doubles_displacement() {
        let run = |speed: Speed| {
            let (mut w, mut rig, mut ctrl) = setup();
            rig.intent.set_speed(speed);
            rig.intent.move_forward();
            for _ in 0..10 {
                ctrl.step(&mut w, &mut rig, 0.1);
            }
            w.body_pose(rig.body(Limb::Torso)).pos.z
        };
        let normal = run(Speed::Normal);
        let fast = run(Speed::Fast);
        assert!((fast - 2.0 * normal).abs() < 1e-4);
    }

    #[test]
    fn every_limb_translates_together() {
        let (mut w, mut rig, mut ctrl) = setup();
        let before: Vec<_> = Limb::ALL.iter()
            .map(|&l| w.body_pose(rig.body(l)).pos)
            .collect();
        rig.intent.move_right();
        ctrl.step(&mut w, &mut rig, 0.1);
        for (i, &l) in Limb::ALL.iter().enumerate() {
            let d = w.body_pose(rig.body(l)).pos - before[i];
            assert!((d.x - 0.1).abs() < 1e-5 && d.z.abs() < 1e-5, "{}", l.name());
        }
    }

    #[test]
    fn jump_applies_single_impulse_within_debounce() {
        let (mut w, mut rig, mut ctrl) = setup();
        let torso = rig.body(Limb::Torso);

        rig.intent.jump();
        ctrl.step(&mut w, &mut rig, 1.0 / 60.0);
        let v1 = w.body_vel(torso).lin.y;
        assert!(v1 > 1.0, "no lift: {v1}");

        // second gesture inside the debounce window is swallowed
        rig.intent.jump();
        ctrl.step(&mut w, &mut rig, 1.0 / 60.0);
        let v2 = w.body_vel(torso).lin.y;
        assert!((v2 - v1).abs() < 1e-6, "double impulse: {v1} -> {v2}");
    }

    #[test]
    fn fallen_rig_cannot_jump() {
        let (mut w, mut rig, mut ctrl) = setup();
        let torso = rig.body(Limb::Torso);
        let mut p = w.body_pose(torso);
        p.pos.y = 0.2;
        w.set_body_pose(torso, p);

        rig.intent.jump();
        ctrl.step(&mut w, &mut rig, 1.0 / 60.0);
        assert_eq!(w.body_vel(torso).lin.y, 0.0);
        assert!((w.body_pose(torso).pos.y - 0.2).abs() < 1e-6);
    }

    #[test]
    fn rotate_commands_are_symmetric() {
        let (mut w, mut rig, mut ctrl) = setup();
        let torso = rig.body(Limb::Torso);

        rig.intent.rotate_left();
        ctrl.step(&mut w, &mut rig, 1.0 / 60.0);
        let left = w.body_vel(torso).ang.y;

        rig.intent.rotate_right();
        ctrl.step(&mut w, &mut rig, 1.0 / 60.0);
        let right = w.body_vel(torso).ang.y;

        assert!(left > 0.0 && (left + right).abs() < 1e-6);

        rig.intent.stop();
        ctrl.step(&mut w, &mut rig, 1.0 / 60.0);
        assert_eq!(w.body_vel(torso).ang.y, 0.0);
    }

    #[test]
    fn gait_phase_accumulates_from_sim_time_only() {
        let (mut w, mut rig, mut ctrl) = setup();
        rig.intent.move_forward();
        for _ in 0..10 {
            ctrl.step(&mut w, &mut rig, 0.01);
        }
        let p = ctrl.gait_phase();
        assert!((p - 0.6).abs() < 1e-4, "phase {p}");

        // no forward command, no phase advance
        rig.intent.stop();
        ctrl.step(&mut w, &mut rig, 0.01);
        assert_eq!(ctrl.gait_phase(), p);
    }

    #[test]
    fn yaw_extraction_round_trips() {
        for yaw in [-2.0f32, -0.4, 0.0, 0.9, 3.0] {
            let q = Quat::from_rotation_y(yaw);
            assert!((yaw_of(q) - yaw).abs() < 1e-5);
        }
    }
}
