use stridephys_core::{vec3, iso, quat_identity, Velocity, BodyId};
use stridephys_core::types::Vec3;
use stridephys_geom::{Shape, MassProps, Material};
use stridephys_world::World;
use stridephys_articulation::{HingeId, HingeMotor, weld_offsets_full, weld_offsets_light};

use crate::limb::{Limb, LimbMap};
use crate::intent::CommandIntent;

/// Nominal torso center height of the standing pose, in meters above the
/// feet. The jump gate compares against this.
pub const STAND_HEIGHT: f32 = 1.20;

/// Per-limb tunables. Masses are hand-picked for a stable standing pose
/// (heavier torso and upper legs, light extremities), not derived from
/// volume; the anchor radii below were tuned together with them, so a
/// different skeleton scale needs both re-tuned by hand.
#[derive(Copy, Clone, Debug)]
pub struct RigParams {
    pub torso_mass: f32,
    pub head_mass: f32,
    pub upper_leg_mass: f32,
    pub lower_leg_mass: f32,
    pub foot_mass: f32,
    pub upper_arm_mass: f32,
    pub forearm_mass: f32,
    pub hand_mass: f32,
    pub finger_mass: f32,
    pub lin_damping: f32,
    pub ang_damping: f32,
    pub shoulder_drive_torque: f32,
    pub elbow_hold_torque: f32,
}

impl Default for RigParams {
    fn default() -> Self {
        Self {
            torso_mass: 30.0,
            head_mass: 3.0,
            upper_leg_mass: 8.0,
            lower_leg_mass: 4.0,
            foot_mass: 1.5,
            upper_arm_mass: 2.5,
            forearm_mass: 1.5,
            hand_mass: 0.5,
            finger_mass: 0.05,
            lin_damping: 0.05,
            ang_damping: 0.4,
            shoulder_drive_torque: 30.0,
            elbow_hold_torque: 12.0,
        }
    }
}

/// Standing-pose offset of each limb center relative to the rig origin (a
/// point on the ground between the feet).
fn standing_offset(l: Limb) -> Vec3 {
    let (x1, x2) = finger_x();
    match l {
        Limb::Torso => vec3(0.0, 1.20, 0.0),
        Limb::Head => vec3(0.0, 1.62, 0.0),
        Limb::UpperArmLeft => vec3(-0.27, 1.28, 0.0),
        Limb::UpperArmRight => vec3(0.27, 1.28, 0.0),
        Limb::ForearmLeft => vec3(-0.27, 1.01, 0.0),
        Limb::ForearmRight => vec3(0.27, 1.01, 0.0),
        Limb::HandLeft => vec3(-0.27, 0.82, 0.0),
        Limb::HandRight => vec3(0.27, 0.82, 0.0),
        Limb::Finger1BaseLeft => vec3(-0.27 - x1, 0.735, 0.0),
        Limb::Finger1MidLeft => vec3(-0.27 - x1, 0.685, 0.0),
        Limb::Finger1TipLeft => vec3(-0.27 - x1, 0.635, 0.0),
        Limb::Finger2BaseLeft => vec3(-0.27 + x2, 0.735, 0.0),
        Limb::Finger2MidLeft => vec3(-0.27 + x2, 0.685, 0.0),
        Limb::Finger2TipLeft => vec3(-0.27 + x2, 0.635, 0.0),
        Limb::Finger1BaseRight => vec3(0.27 + x1, 0.735, 0.0),
        Limb::Finger1MidRight => vec3(0.27 + x1, 0.685, 0.0),
        Limb::Finger1TipRight => vec3(0.27 + x1, 0.635, 0.0),
        Limb::Finger2BaseRight => vec3(0.27 - x2, 0.735, 0.0),
        Limb::Finger2MidRight => vec3(0.27 - x2, 0.685, 0.0),
        Limb::Finger2TipRight => vec3(0.27 - x2, 0.635, 0.0),
        Limb::UpperLegLeft => vec3(-0.15, 0.70, 0.0),
        Limb::UpperLegRight => vec3(0.15, 0.70, 0.0),
        Limb::LowerLegLeft => vec3(-0.15, 0.30, 0.0),
        Limb::LowerLegRight => vec3(0.15, 0.30, 0.0),
        Limb::FootLeft => vec3(-0.15, 0.05, 0.03),
        Limb::FootRight => vec3(0.15, 0.05, 0.03),
    }
}

#[inline] fn finger_x() -> (f32, f32) { (0.02, 0.02) }

fn shape_of(l: Limb) -> Shape {
    match l {
        Limb::Torso => Shape::Box { hx: 0.20, hy: 0.30, hz: 0.12 },
        Limb::Head => Shape::Sphere { r: 0.12 },
        Limb::UpperArmLeft | Limb::UpperArmRight => Shape::Box { hx: 0.05, hy: 0.14, hz: 0.05 },
        Limb::ForearmLeft | Limb::ForearmRight => Shape::Box { hx: 0.04, hy: 0.13, hz: 0.04 },
        Limb::HandLeft | Limb::HandRight => Shape::Box { hx: 0.045, hy: 0.06, hz: 0.03 },
        l if l.is_leg() => match l {
            Limb::UpperLegLeft | Limb::UpperLegRight => Shape::Box { hx: 0.07, hy: 0.20, hz: 0.07 },
            _ => Shape::Box { hx: 0.06, hy: 0.20, hz: 0.06 },
        },
        Limb::FootLeft | Limb::FootRight => Shape::Box { hx: 0.09, hy: 0.05, hz: 0.15 },
        _ => Shape::Box { hx: 0.012, hy: 0.025, hz: 0.012 }, // finger segment
    }
}

fn mass_of(l: Limb, p: &RigParams) -> f32 {
    match l {
        Limb::Torso => p.torso_mass,
        Limb::Head => p.head_mass,
        Limb::UpperArmLeft | Limb::UpperArmRight => p.upper_arm_mass,
        Limb::ForearmLeft | Limb::ForearmRight => p.forearm_mass,
        Limb::HandLeft | Limb::HandRight => p.hand_mass,
        Limb::UpperLegLeft | Limb::UpperLegRight => p.upper_leg_mass,
        Limb::LowerLegLeft | Limb::LowerLegRight => p.lower_leg_mass,
        Limb::FootLeft | Limb::FootRight => p.foot_mass,
        _ => p.finger_mass,
    }
}

/// The assembled skeleton: limb slots, motorized joints worth steering, and
/// the one mutable command-intent record.
pub struct HumanoidRig {
    pub limbs: LimbMap<BodyId>,
    pub shoulder_left: HingeId,
    pub shoulder_right: HingeId,
    pub elbow_left: HingeId,
    pub elbow_right: HingeId,
    pub intent: CommandIntent,
    pub params: RigParams,
    origin: Vec3,
}

impl HumanoidRig {
    #[inline] pub fn body(&self, l: Limb) -> BodyId { self.limbs[l] }
    #[inline] pub fn origin(&self) -> Vec3 { self.origin }

    /// Restore the canonical standing pose: every limb back to its build-time
    /// offset with identity orientation and zero velocity. Used by the
    /// degenerate-state recovery path.
    pub fn reset_pose(&self, world: &mut World) {
        for l in Limb::ALL {
            let id = self.limbs[l];
            world.set_body_pose(id, iso(self.origin + standing_offset(l), quat_identity()));
            world.set_body_vel(id, Velocity::default());
        }
    }
}

/// Build every limb as a primitive body and wire the constraint graph:
/// motorized hinges at shoulders and elbows, redundant multi-anchor welds
/// everywhere else. Constraints are never removed or re-parented afterward.
pub fn build_humanoid(world: &mut World, origin: Vec3, params: RigParams) -> HumanoidRig {
    let limbs = LimbMap::from_fn(|l| {
        world.add_body(
            iso(origin + standing_offset(l), quat_identity()),
            Velocity::default(),
            MassProps::from_mass(mass_of(l, &params)),
            params.lin_damping,
            params.ang_damping,
            true,
        )
    });
    for l in Limb::ALL {
        world.add_collider(limbs[l], shape_of(l), Material::character());
    }

    let at = |p: Vec3| origin + p;
    let full = |r: f32| weld_offsets_full(r);
    let light = |r: f32| weld_offsets_light(r);

    // neck
    world.add_weld(limbs[Limb::Torso], limbs[Limb::Head], at(vec3(0.0, 1.53, 0.0)), &full(0.06));

    // shoulders: motorized swing about X (forward/back)
    let shoulder = Some(HingeMotor { target_vel: 0.0, max_torque: params.shoulder_drive_torque });
    let shoulder_left = world.add_hinge(
        limbs[Limb::Torso], limbs[Limb::UpperArmLeft],
        at(vec3(-0.25, 1.42, 0.0)), vec3(1.0, 0.0, 0.0), shoulder);
    let shoulder_right = world.add_hinge(
        limbs[Limb::Torso], limbs[Limb::UpperArmRight],
        at(vec3(0.25, 1.42, 0.0)), vec3(1.0, 0.0, 0.0), shoulder);

    // elbows: zero-speed hold keeps the arm effectively straight
    let elbow = Some(HingeMotor { target_vel: 0.0, max_torque: params.elbow_hold_torque });
    let elbow_left = world.add_hinge(
        limbs[Limb::UpperArmLeft], limbs[Limb::ForearmLeft],
        at(vec3(-0.27, 1.14, 0.0)), vec3(1.0, 0.0, 0.0), elbow);
    let elbow_right = world.add_hinge(
        limbs[Limb::UpperArmRight], limbs[Limb::ForearmRight],
        at(vec3(0.27, 1.14, 0.0)), vec3(1.0, 0.0, 0.0), elbow);

    // wrists
    world.add_weld(limbs[Limb::ForearmLeft], limbs[Limb::HandLeft], at(vec3(-0.27, 0.88, 0.0)), &full(0.03));
    world.add_weld(limbs[Limb::ForearmRight], limbs[Limb::HandRight], at(vec3(0.27, 0.88, 0.0)), &full(0.03));

    // finger chains: hand -> base -> mid -> tip, three light anchors per
    // junction so fast arm swings cannot shake digits loose
    let digits = [
        (Limb::HandLeft, [Limb::Finger1BaseLeft, Limb::Finger1MidLeft, Limb::Finger1TipLeft]),
        (Limb::HandLeft, [Limb::Finger2BaseLeft, Limb::Finger2MidLeft, Limb::Finger2TipLeft]),
        (Limb::HandRight, [Limb::Finger1BaseRight, Limb::Finger1MidRight, Limb::Finger1TipRight]),
        (Limb::HandRight, [Limb::Finger2BaseRight, Limb::Finger2MidRight, Limb::Finger2TipRight]),
    ];
    for (hand, chain) in digits {
        let base = standing_offset(chain[0]);
        world.add_weld(limbs[hand], limbs[chain[0]], at(base + vec3(0.0, 0.025, 0.0)), &light(0.01));
        world.add_weld(limbs[chain[0]], limbs[chain[1]],
            at(standing_offset(chain[1]) + vec3(0.0, 0.025, 0.0)), &light(0.01));
        world.add_weld(limbs[chain[1]], limbs[chain[2]],
            at(standing_offset(chain[2]) + vec3(0.0, 0.025, 0.0)), &light(0.01));
    }

    // hips / knees / ankles
    for (side, sx) in [(0u8, -0.15f32), (1, 0.15)] {
        let (upper, lower, foot) = if side == 0 {
            (Limb::UpperLegLeft, Limb::LowerLegLeft, Limb::FootLeft)
        } else {
            (Limb::UpperLegRight, Limb::LowerLegRight, Limb::FootRight)
        };
        world.add_weld(limbs[Limb::Torso], limbs[upper], at(vec3(sx, 0.90, 0.0)), &full(0.05));
        world.add_weld(limbs[upper], limbs[lower], at(vec3(sx, 0.50, 0.0)), &full(0.04));
        world.add_weld(limbs[lower], limbs[foot], at(vec3(sx, 0.10, 0.0)), &full(0.03));
    }

    HumanoidRig {
        limbs,
        shoulder_left, shoulder_right,
        elbow_left, elbow_right,
        intent: CommandIntent::default(),
        params,
        origin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stridephys_world::World;

    fn setup() -> (World, HumanoidRig) {
        let mut w = World::new(vec3(0.0, -9.81, 0.0), 8);
        let rig = build_humanoid(&mut w, Vec3::ZERO, RigParams::default());
        (w, rig)
    }

    #[test] fn limb_ids_are_distinct() {
        let (_, rig) = setup();
        for (i, a) in Limb::ALL.iter().enumerate() {
            for b in &Limb::ALL[i + 1..] {
                assert_ne!(rig.limbs[*a], rig.limbs[*b]);
            }
        }
    }

    #[test] fn torso_starts_at_stand_height() {
        let (w, rig) = setup();
        let y = w.body_pose(rig.body(Limb::Torso)).pos.y;
        assert!((y - STAND_HEIGHT).abs() < 1e-6);
    }

    #[test] fn every_constraint_references_world_bodies() {
        let (w, _) = setup();
        let n = w.num_bodies();
        for p in w.joints().points() {
            assert!(p.a.0 < n && p.b.0 < n);
        }
        for h in w.joints().hinges() {
            assert!(h.a.0 < n && h.b.0 < n);
        }
    }

    #[test] fn welds_carry_redundant_anchors() {
        let (w, _) = setup();
        // 9 full welds (6 anchors) + 12 finger junctions (3 anchors)
        assert_eq!(w.joints().points().len(), 9 * 6 + 12 * 3);
        assert_eq!(w.joints().hinges().len(), 4);
    }

    #[test] fn reset_pose_restores_standing() {
        let (mut w, rig) = setup();
        let torso = rig.body(Limb::Torso);
        let mut p = w.body_pose(torso);
        p.pos.y = 0.2;
        w.set_body_pose(torso, p);
        rig.reset_pose(&mut w);
        assert!((w.body_pose(torso).pos.y - STAND_HEIGHT).abs() < 1e-6);
    }
}
