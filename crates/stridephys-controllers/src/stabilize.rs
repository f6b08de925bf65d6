use glam::Quat;
use stridephys_core::{Scalar, vec3, quat_identity, BodyId};
use stridephys_core::types::Vec3;
use stridephys_rig::{HumanoidRig, Limb};
use stridephys_viz::LedgerEvent;
use stridephys_world::World;

use crate::command::yaw_of;

#[derive(Copy, Clone, Debug)]
pub struct StabilizeParams {
    pub deadband: Scalar,       // rad; inside it, snap to pure yaw
    pub torque_gain: Scalar,    // corrective angvel per rad of tilt per second
    pub angvel_keep: Scalar,    // per-step retention of non-yaw angvel
    pub sag_comp: Scalar,       // fraction of leg weight countered
    pub foot_ground: Scalar,    // m; below this, feet are pinned down
}

impl Default for StabilizeParams {
    fn default() -> Self {
        Self {
            deadband: 0.05,
            torque_gain: 40.0,
            angvel_keep: 0.85,
            sag_comp: 1.0,
            foot_ground: 0.12,
        }
    }
}

/// Upright keeper. Runs unconditionally every step: small tilts are snapped
/// away, larger ones get a proportional torque, and legs/head are locked to
/// identity because locomotion drives them positionally. This heuristic
/// stands in for a real balance controller and trades physical fidelity for
/// guaranteed visual stability.
pub struct StabilizeCtrl {
    pub params: StabilizeParams,
}

impl StabilizeCtrl {
    pub fn new(params: StabilizeParams) -> Self {
        Self { params }
    }

    pub fn step(&mut self, world: &mut World, rig: &HumanoidRig, dt: Scalar) {
        self.upright(world, rig.body(Limb::Torso), dt);

        // head never shows rotation
        let head = rig.body(Limb::Head);
        let mut hp = world.body_pose(head);
        hp.rot = quat_identity();
        world.set_body_pose(head, hp);
        let mut hv = world.body_vel(head);
        hv.ang = Vec3::ZERO;
        world.set_body_vel(head, hv);

        // legs are positionally driven; lock their orientation and counter
        // the sag gravity would add to the chain
        let lift = world.gravity.y.abs() * self.params.sag_comp;
        for l in Limb::ALL {
            if !l.is_leg() { continue; }
            let id = rig.body(l);
            let mut p = world.body_pose(id);
            p.rot = quat_identity();
            world.set_body_pose(id, p);
            let mut v = world.body_vel(id);
            v.ang = Vec3::ZERO;
            world.set_body_vel(id, v);
            let im = world.body_inv_mass(id);
            if im > 0.0 {
                world.apply_force(id, vec3(0.0, lift / im, 0.0));
            }
        }

        // grounded feet: no sliding, no liftoff from glancing impacts
        for l in [Limb::FootLeft, Limb::FootRight] {
            let id = rig.body(l);
            if world.body_pose(id).pos.y < self.params.foot_ground {
                let mut v = world.body_vel(id);
                v.lin.x = 0.0;
                v.lin.z = 0.0;
                v.lin.y = v.lin.y.min(0.0);
                world.set_body_vel(id, v);
            }
        }
    }

    /// Roll/pitch suppression for one body. Tilt is the rotation left over
    /// after factoring out yaw; inside the deadband the orientation is
    /// snapped to the pure-yaw quaternion and the non-yaw spin is dropped,
    /// outside it a proportional correction avoids visible pops.
    pub fn upright(&self, world: &mut World, id: BodyId, dt: Scalar) {
        let pose = world.body_pose(id);
        let yaw = yaw_of(pose.rot);
        let yaw_q = Quat::from_rotation_y(yaw);

        let mut tilt = Vec3::from((pose.rot * yaw_q.conjugate()).to_scaled_axis());
        tilt.y = 0.0;

        let mut v = world.body_vel(id);
        if tilt.length() < self.params.deadband {
            let mut p = pose;
            p.rot = yaw_q;
            world.set_body_pose(id, p);
            v.ang.x = 0.0;
            v.ang.z = 0.0;
            world.push_event(LedgerEvent::UprightSnap { id: id.0, yaw });
        } else {
            v.ang -= tilt * (self.params.torque_gain * dt);
            world.push_event(LedgerEvent::UprightTorque {
                id: id.0, roll: tilt.x, pitch: tilt.z,
            });
        }

        // bleed residual contact energy off the non-yaw axes every step
        v.ang.x *= self.params.angvel_keep;
        v.ang.z *= self.params.angvel_keep;
        world.set_body_vel(id, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stridephys_core::{iso, Velocity};
    use stridephys_geom::MassProps;
    use stridephys_rig::{build_humanoid, RigParams};
    use stridephys_world::SUB_DT;

    fn tilt_of(world: &World, id: BodyId) -> f32 {
        let rot = world.body_pose(id).rot;
        let yaw_q = Quat::from_rotation_y(yaw_of(rot));
        let mut t = Vec3::from((rot * yaw_q.conjugate()).to_scaled_axis());
        t.y = 0.0;
        t.length()
    }

    #[test]
    fn tilted_body_recovers_monotonically_within_a_second() {
        // free body, no gravity: the upright loop alone must bring a 0.5 rad
        // roll under the deadband inside one simulated second without ever
        // growing it
        let mut w = World::new(Vec3::ZERO, 4);
        let b = w.add_body(
            iso(vec3(0.0, 1.0, 0.0), Quat::from_rotation_z(0.5)),
            Velocity::default(),
            MassProps::from_mass(10.0),
            0.0, 0.0,
            true,
        );
        let ctrl = StabilizeCtrl::new(StabilizeParams::default());
        let mut prev = tilt_of(&w, b);
        assert!((prev - 0.5).abs() < 1e-3);
        for _ in 0..60 {
            w.step(SUB_DT);
            ctrl.upright(&mut w, b, SUB_DT);
            let t = tilt_of(&w, b);
            assert!(t <= prev + 1e-4, "tilt grew: {prev} -> {t}");
            prev = t;
        }
        assert!(prev < 0.05, "still tilted: {prev}");
    }

    #[test]
    fn command_free_rig_stays_upright() {
        let mut w = World::new(vec3(0.0, -9.81, 0.0), 8);
        let rig = build_humanoid(&mut w, Vec3::ZERO, RigParams::default());
        let mut ctrl = StabilizeCtrl::new(StabilizeParams::default());
        let torso = rig.body(Limb::Torso);
        for i in 0..120 {
            w.step(SUB_DT);
            ctrl.step(&mut w, &rig, SUB_DT);
            if i >= 10 {
                let t = tilt_of(&w, torso);
                assert!(t < 0.05, "step {i}: tilt {t}");
            }
        }
    }

    #[test]
    fn legs_are_locked_to_identity() {
        let mut w = World::new(vec3(0.0, -9.81, 0.0), 8);
        let rig = build_humanoid(&mut w, Vec3::ZERO, RigParams::default());
        let mut ctrl = StabilizeCtrl::new(StabilizeParams::default());
        let leg = rig.body(Limb::UpperLegLeft);

        let mut p = w.body_pose(leg);
        p.rot = Quat::from_rotation_x(0.3);
        w.set_body_pose(leg, p);
        let mut v = w.body_vel(leg);
        v.ang = vec3(1.0, 2.0, 3.0);
        w.set_body_vel(leg, v);

        ctrl.step(&mut w, &rig, SUB_DT);
        assert!(w.body_pose(leg).rot.abs_diff_eq(quat_identity(), 1e-6));
        assert_eq!(w.body_vel(leg).ang, Vec3::ZERO);
    }

    #[test]
    fn grounded_foot_cannot_lift_or_slide() {
        let mut w = World::new(vec3(0.0, -9.81, 0.0), 8);
        let rig = build_humanoid(&mut w, Vec3::ZERO, RigParams::default());
        let mut ctrl = StabilizeCtrl::new(StabilizeParams::default());
        let foot = rig.body(Limb::FootLeft);

        let mut v = w.body_vel(foot);
        v.lin = vec3(0.5, 1.0, -0.5);
        w.set_body_vel(foot, v);

        ctrl.step(&mut w, &rig, SUB_DT);
        let v = w.body_vel(foot).lin;
        assert_eq!((v.x, v.y, v.z), (0.0, 0.0, 0.0));
    }

    #[test]
    fn airborne_foot_is_left_alone() {
        let mut w = World::new(vec3(0.0, -9.81, 0.0), 8);
        let rig = build_humanoid(&mut w, Vec3::ZERO, RigParams::default());
        let mut ctrl = StabilizeCtrl::new(StabilizeParams::default());
        let foot = rig.body(Limb::FootRight);

        let mut p = w.body_pose(foot);
        p.pos.y = 0.5;
        w.set_body_pose(foot, p);
        let mut v = w.body_vel(foot);
        v.lin = vec3(0.0, 2.0, 0.0);
        w.set_body_vel(foot, v);

        ctrl.step(&mut w, &rig, SUB_DT);
        assert!((w.body_vel(foot).lin.y - 2.0).abs() < 1e-6);
    }
}
