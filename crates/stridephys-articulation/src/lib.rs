use stridephys_core::{Scalar, BodyId, JointId};
use stridephys_core::types::Vec3;
use stridephys_dynamics::Bodies;

/// XPBD point-anchor constraint: one local anchor per body, pinned to
/// coincide. No rotational restriction by itself; rigidity comes from
/// stacking several of these at offset anchors (see `add_weld`).
#[derive(Copy, Clone, Debug)]
pub struct PointJoint {
    pub a: BodyId,
    pub b: BodyId,
    pub anchor_a: Vec3, // local to a
    pub anchor_b: Vec3, // local to b
    pub compliance: Scalar, // 0 = rigid
}

#[derive(Copy, Clone, Debug)]
pub struct HingeMotor {
    pub target_vel: Scalar, // rad/s about the hinge axis (b relative to a)
    pub max_torque: Scalar, // caps the per-substep velocity correction
}

/// Hinge: pivot point + single rotation axis on each body, optional motor.
#[derive(Copy, Clone, Debug)]
pub struct HingeJoint {
    pub a: BodyId,
    pub b: BodyId,
    pub anchor_a: Vec3,
    pub anchor_b: Vec3,
    pub axis_a: Vec3, // local to a, unit
    pub axis_b: Vec3, // local to b, unit
    pub motor: Option<HingeMotor>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct HingeId(pub u32);

#[derive(Default)]
pub struct Joints {
    points: Vec<PointJoint>,
    hinges: Vec<HingeJoint>,
}

/// Anchor offset pattern for full welds: six offsets on the principal axes.
/// Offsets at radius `r` around the nominal pivot give the redundancy that
/// pins the remaining rotational degrees of freedom.
pub fn weld_offsets_full(r: Scalar) -> [Vec3; 6] {
    [
        Vec3::new(r, 0.0, 0.0), Vec3::new(-r, 0.0, 0.0),
        Vec3::new(0.0, r, 0.0), Vec3::new(0.0, -r, 0.0),
        Vec3::new(0.0, 0.0, r), Vec3::new(0.0, 0.0, -r),
    ]
}

/// Light pattern for small links (finger segments): three anchors are the
/// minimum that still locks orientation.
pub fn weld_offsets_light(r: Scalar) -> [Vec3; 3] {
    [Vec3::ZERO, Vec3::new(r, 0.0, 0.0), Vec3::new(0.0, r, 0.0)]
}

impl Joints {
    pub fn new() -> Self { Self::default() }

    pub fn add_point(
        &mut self,
        a: BodyId, b: BodyId,
        anchor_a: Vec3, anchor_b: Vec3,
        compliance: Scalar,
    ) -> JointId {
        self.points.push(PointJoint { a, b, anchor_a, anchor_b, compliance });
        JointId((self.points.len() as u32) - 1)
    }

    /// Approximated 6-DOF weld: N point anchors at distinct offsets around a
    /// shared world-space pivot. Local anchors are derived from the bodies'
    /// build-time poses, so call this before the first step.
    pub fn add_weld(
        &mut self,
        bodies: &Bodies,
        a: BodyId, b: BodyId,
        pivot_ws: Vec3,
        offsets: &[Vec3],
        compliance: Scalar,
    ) -> Vec<JointId> {
        let pa = bodies.pose(a.0);
        let pb = bodies.pose(b.0);
        let inv_a = pa.rot.conjugate();
        let inv_b = pb.rot.conjugate();
        let mut ids = Vec::with_capacity(offsets.len());
        for off in offsets {
            let p = pivot_ws + *off;
            let la = inv_a * (p - pa.pos);
            let lb = inv_b * (p - pb.pos);
            ids.push(self.add_point(a, b, la, lb, compliance));
        }
        ids
    }

    pub fn add_hinge(
        &mut self,
        bodies: &Bodies,
        a: BodyId, b: BodyId,
        pivot_ws: Vec3,
        axis_ws: Vec3,
        motor: Option<HingeMotor>,
    ) -> HingeId {
        let pa = bodies.pose(a.0);
        let pb = bodies.pose(b.0);
        let axis = axis_ws.normalize();
        self.hinges.push(HingeJoint {
            a, b,
            anchor_a: pa.rot.conjugate() * (pivot_ws - pa.pos),
            anchor_b: pb.rot.conjugate() * (pivot_ws - pb.pos),
            axis_a: pa.rot.conjugate() * axis,
            axis_b: pb.rot.conjugate() * axis,
            motor,
        });
        HingeId((self.hinges.len() as u32) - 1)
    }

    pub fn set_motor(&mut self, id: HingeId, motor: Option<HingeMotor>) {
        if let Some(h) = self.hinges.get_mut(id.0 as usize) {
            h.motor = motor;
        }
    }

    pub fn set_motor_target(&mut self, id: HingeId, target_vel: Scalar) {
        if let Some(h) = self.hinges.get_mut(id.0 as usize) {
            if let Some(m) = h.motor.as_mut() { m.target_vel = target_vel; }
        }
    }

    #[inline] pub fn points(&self) -> &[PointJoint] { &self.points }
    #[inline] pub fn hinges(&self) -> &[HingeJoint] { &self.hinges }
    #[inline] pub fn len(&self) -> usize { self.points.len() + self.hinges.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// One substep of constraint work: motors at velocity level once, then
    /// `iterations` rounds of positional XPBD over points and hinge frames.
    pub fn solve(&self, bodies: &mut Bodies, dt: Scalar, iterations: u32) {
        self.drive_motors(bodies, dt);
        for _ in 0..iterations {
            for j in &self.points {
                solve_point(bodies, j, dt);
            }
            for h in &self.hinges {
                solve_hinge_frames(bodies, h, dt);
            }
        }
    }

    fn drive_motors(&self, bodies: &mut Bodies, dt: Scalar) {
        for h in &self.hinges {
            let Some(m) = h.motor else { continue };
            let ia = h.a.0;
            let ib = h.b.0;
            let wa = bodies.inv_mass_of(ia);
            let wb = bodies.inv_mass_of(ib);
            let w_sum = wa + wb;
            if w_sum == 0.0 { continue; }

            let u = (bodies.pose(ia).rot * h.axis_a).normalize_or_zero();
            if u == Vec3::ZERO { continue; }

            let va = bodies.vel(ia);
            let vb = bodies.vel(ib);
            let rel = (vb.ang - va.ang).dot(u);
            let mut lambda = (m.target_vel - rel) / w_sum;
            let cap = m.max_torque * dt;
            lambda = lambda.clamp(-cap, cap);

            let mut na = va;
            let mut nb = vb;
            na.ang -= u * (lambda * wa);
            nb.ang += u * (lambda * wb);
            bodies.set_vel(ia, na);
            bodies.set_vel(ib, nb);
        }
    }
}

fn solve_point(bodies: &mut Bodies, j: &PointJoint, dt: Scalar) {
    let ia = j.a.0;
    let ib = j.b.0;
    let wa = bodies.inv_mass_of(ia);
    let wb = bodies.inv_mass_of(ib);
    if wa + wb == 0.0 { return; }

    let pa = bodies.pose(ia);
    let pb = bodies.pose(ib);
    let ra = pa.rot * j.anchor_a;
    let rb = pb.rot * j.anchor_b;
    let err = (pa.pos + ra) - (pb.pos + rb);
    let c = err.length();
    if c <= 1.0e-7 { return; }
    let n = err / c;

    // Generalized inverse masses with the isotropic-inertia fallback the
    // body store uses (inv inertia ~ inv_mass * I).
    let ga = wa + wa * ra.cross(n).length_squared();
    let gb = wb + wb * rb.cross(n).length_squared();
    let alpha = if j.compliance <= 0.0 { 0.0 } else { j.compliance / (dt * dt) };
    let lambda = c / (ga + gb + alpha);

    let p = n * lambda;
    bodies.apply_position_delta(ia, -p * wa);
    bodies.apply_position_delta(ib,  p * wb);
    bodies.apply_orientation_delta(ia, -ra.cross(p) * wa);
    bodies.apply_orientation_delta(ib,  rb.cross(p) * wb);
}

/// Keep the two hinge frames coincident at the pivot and their axes aligned,
/// leaving rotation about the shared axis free.
fn solve_hinge_frames(bodies: &mut Bodies, h: &HingeJoint, dt: Scalar) {
    // pivot as a rigid point constraint
    let pj = PointJoint {
        a: h.a, b: h.b,
        anchor_a: h.anchor_a, anchor_b: h.anchor_b,
        compliance: 0.0,
    };
    solve_point(bodies, &pj, dt);

    // axis alignment as an angular correction
    let ia = h.a.0;
    let ib = h.b.0;
    let wa = bodies.inv_mass_of(ia);
    let wb = bodies.inv_mass_of(ib);
    let w_sum = wa + wb;
    if w_sum == 0.0 { return; }

    let ua = (bodies.pose(ia).rot * h.axis_a).normalize_or_zero();
    let ub = (bodies.pose(ib).rot * h.axis_b).normalize_or_zero();
    if ua == Vec3::ZERO || ub == Vec3::ZERO { return; }

    let e = ua.cross(ub); // rotation that carries ua onto ub, small-angle
    if e.length_squared() <= 1.0e-14 { return; }
    let corr = e / w_sum;
    bodies.apply_orientation_delta(ia,  corr * wa);
    bodies.apply_orientation_delta(ib, -corr * wb);
}

#[cfg(test)]
mod tests {
    use super::*;
    use stridephys_core::{vec3, iso, quat_identity, Velocity};
    use stridephys_dynamics::BodyDesc;

    fn body_at(bodies: &mut Bodies, p: Vec3, inv_mass: f32) -> BodyId {
        BodyId(bodies.add(BodyDesc {
            pose: iso(p, quat_identity()),
            vel: Velocity::default(),
            inv_mass,
            ..BodyDesc::default()
        }))
    }

    #[test]
    fn point_joint_pulls_anchors_together() {
        let mut bodies = Bodies::default();
        let a = body_at(&mut bodies, vec3(0.0, 0.0, 0.0), 1.0);
        let b = body_at(&mut bodies, vec3(1.0, 0.0, 0.0), 1.0);
        let mut joints = Joints::new();
        joints.add_point(a, b, Vec3::ZERO, Vec3::ZERO, 0.0);

        let dt = 1.0 / 60.0;
        for _ in 0..30 { joints.solve(&mut bodies, dt, 8); }
        let gap = (bodies.pose(0).pos - bodies.pose(1).pos).length();
        assert!(gap < 1e-2, "gap {gap}");
    }

    #[test]
    fn weld_resists_relative_rotation() {
        let mut bodies = Bodies::default();
        let a = body_at(&mut bodies, vec3(0.0, 0.0, 0.0), 1.0);
        let b = body_at(&mut bodies, vec3(0.0, 0.5, 0.0), 1.0);
        let mut joints = Joints::new();
        joints.add_weld(&bodies, a, b, vec3(0.0, 0.25, 0.0), &weld_offsets_full(0.1), 0.0);

        // kick b's orientation, then let the weld fight it
        bodies.apply_orientation_delta(1, vec3(0.4, 0.0, 0.0));
        let dt = 1.0 / 60.0;
        for _ in 0..60 { joints.solve(&mut bodies, dt, 8); }

        let rel = bodies.pose(0).rot.conjugate() * bodies.pose(1).rot;
        assert!(rel.to_scaled_axis().length() < 0.1);
    }

    #[test]
    fn hinge_motor_reaches_target_rate() {
        let mut bodies = Bodies::default();
        let a = body_at(&mut bodies, vec3(0.0, 0.0, 0.0), 0.0); // anchor body static
        let b = body_at(&mut bodies, vec3(0.0, -0.5, 0.0), 1.0);
        let mut joints = Joints::new();
        joints.add_hinge(&bodies, a, b, Vec3::ZERO, vec3(1.0, 0.0, 0.0),
            Some(HingeMotor { target_vel: 2.0, max_torque: 50.0 }));

        let dt = 1.0 / 60.0;
        for _ in 0..60 { joints.solve(&mut bodies, dt, 4); }
        let u = vec3(1.0, 0.0, 0.0);
        let rel = bodies.vel(1).ang.dot(u);
        assert!((rel - 2.0).abs() < 0.2, "rel {rel}");
    }

    #[test]
    fn joints_reference_known_bodies() {
        let mut bodies = Bodies::default();
        let a = body_at(&mut bodies, Vec3::ZERO, 1.0);
        let b = body_at(&mut bodies, vec3(0.0, 1.0, 0.0), 1.0);
        let mut joints = Joints::new();
        joints.add_weld(&bodies, a, b, vec3(0.0, 0.5, 0.0), &weld_offsets_light(0.05), 0.0);
        let n = bodies.len() as u32;
        for p in joints.points() {
            assert!(p.a.0 < n && p.b.0 < n);
        }
    }
}
