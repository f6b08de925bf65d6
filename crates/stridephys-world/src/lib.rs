use stridephys_core::{
    Scalar, Vec3, Isometry, Velocity, BodyId, ColliderId, StepStats, StepHasher,
    hash_vec3, hash_quat, StepStage,
};
use stridephys_geom::{Aabb, Shape, MassProps, Material, aabb_of};
use stridephys_materials as mats;
use stridephys_collision::pairs_sap;
use stridephys_dynamics::{Bodies, BodyDesc};
use stridephys_articulation::{Joints, HingeId, HingeMotor};
use stridephys_viz::{ScheduleRecorder, DebugSettings, Ledger, LedgerEvent};

/// Fixed integration sub-step. Callers clamp their frame delta before calling
/// `step`; the world itself performs no validation.
pub const SUB_DT: Scalar = 1.0 / 60.0;

/* ---------------- Collider & Contact ---------------- */
#[derive(Copy, Clone, Debug)]
pub struct Collider {
    pub body: BodyId,
    pub shape: Shape,
    pub aabb: Aabb,
    pub material: Material,
}

#[derive(Copy, Clone, Debug)]
struct Contact {
    a_collider: usize,
    b_collider: usize,
    normal: Vec3, // from A -> B
    depth: Scalar,
}

/* ---------------- World ---------------- */
pub struct World {
    pub gravity: Vec3,
    solver_iterations: u32,

    bodies: Bodies, // SoA
    colliders: Vec<Collider>,
    joints: Joints,
    forces: Vec<Vec3>, // per-body accumulators, consumed by each step

    tick: u64,
    accum: Scalar,
    schedule: ScheduleRecorder,
    debug: DebugSettings,
    ledger: Ledger,
}

impl World {
    /// Create the world with one static ground slab already registered.
    /// Contact stiffness/relaxation lives in the solver iteration count and
    /// positional-correction factor; the ground↔character pairing comes from
    /// the material table.
    pub fn new(gravity: Vec3, solver_iterations: u32) -> Self {
        let mut w = Self {
            gravity,
            solver_iterations: solver_iterations.max(1),
            bodies: Bodies::with_capacity(64),
            colliders: Vec::with_capacity(64),
            joints: Joints::new(),
            forces: Vec::with_capacity(64),
            tick: 0,
            accum: 0.0,
            schedule: ScheduleRecorder::new(),
            debug: DebugSettings::default(),
            ledger: Ledger::new(4096),
        };
        // ground: a wide slab whose top face sits at y = 0
        let g = w.add_body(
            Isometry { pos: Vec3::new(0.0, -0.5, 0.0), rot: stridephys_core::quat_identity() },
            Velocity::default(),
            MassProps::infinite(),
            0.0, 0.0,
            false,
        );
        w.add_collider(g, Shape::Box { hx: 100.0, hy: 0.5, hz: 100.0 }, Material::ground());
        w
    }

    /// Register one immovable scenery collider (platforms, pillars, stairs).
    /// Scene-build time only; never mutated afterward.
    pub fn add_static_box(&mut self, pos: Vec3, half_extents: Vec3) -> BodyId {
        let id = self.add_body(
            Isometry { pos, rot: stridephys_core::quat_identity() },
            Velocity::default(),
            MassProps::infinite(),
            0.0, 0.0,
            false,
        );
        self.add_collider(id, Shape::Box {
            hx: half_extents.x, hy: half_extents.y, hz: half_extents.z,
        }, Material::ground());
        id
    }

    /* ---------- World composition ---------- */
    pub fn add_body(
        &mut self,
        pose: Isometry,
        vel: Velocity,
        mass: MassProps,
        lin_damping: Scalar,
        ang_damping: Scalar,
        dynamic: bool,
    ) -> BodyId {
        let inv_mass = if dynamic { mass.inv_mass } else { 0.0 };
        let id = self.bodies.add(BodyDesc { pose, vel, inv_mass, lin_damping, ang_damping, dynamic });
        self.forces.push(Vec3::ZERO);
        BodyId(id)
    }

    pub fn add_collider(&mut self, body: BodyId, shape: Shape, material: Material) -> ColliderId {
        let pose = self.bodies.pose(body.0);
        let aabb = aabb_of(&shape, &pose);
        let id = self.colliders.len() as u32;
        self.colliders.push(Collider { body, shape, aabb, material });
        ColliderId(id)
    }

    /* ---------- Joints ---------- */
    pub fn add_weld(
        &mut self,
        a: BodyId, b: BodyId,
        pivot_ws: Vec3,
        offsets: &[Vec3],
    ) -> Vec<stridephys_core::JointId> {
        self.joints.add_weld(&self.bodies, a, b, pivot_ws, offsets, 0.0)
    }

    pub fn add_hinge(
        &mut self,
        a: BodyId, b: BodyId,
        pivot_ws: Vec3,
        axis_ws: Vec3,
        motor: Option<HingeMotor>,
    ) -> HingeId {
        self.joints.add_hinge(&self.bodies, a, b, pivot_ws, axis_ws, motor)
    }

    pub fn set_hinge_motor_target(&mut self, id: HingeId, target_vel: Scalar) {
        self.joints.set_motor_target(id, target_vel);
    }

    pub fn joints(&self) -> &Joints { &self.joints }

    /* ---------- State access ---------- */
    #[inline] pub fn num_bodies(&self) -> u32 { self.bodies.len() as u32 }
    #[inline] pub fn tick_index(&self) -> u64 { self.tick }
    #[inline] pub fn body_pose(&self, id: BodyId) -> Isometry { self.bodies.pose(id.0) }
    #[inline] pub fn body_vel(&self, id: BodyId) -> Velocity { self.bodies.vel(id.0) }
    #[inline] pub fn body_inv_mass(&self, id: BodyId) -> Scalar { self.bodies.inv_mass_of(id.0) }

    pub fn set_body_pose(&mut self, id: BodyId, pose: Isometry) {
        self.bodies.set_pose(id.0, pose);
        for c in &mut self.colliders {
            if c.body == id {
                c.aabb = aabb_of(&c.shape, &pose);
            }
        }
    }

    pub fn set_body_vel(&mut self, id: BodyId, vel: Velocity) {
        self.bodies.set_vel(id.0, vel);
    }

    /// One-shot impulse (N·s), applied immediately to velocity.
    pub fn apply_impulse(&mut self, id: BodyId, j: Vec3) {
        self.bodies.apply_impulse(id.0, j);
    }

    /// Continuous force (N), consumed by every sub-step of the next `step`
    /// call, then cleared.
    pub fn apply_force(&mut self, id: BodyId, f: Vec3) {
        self.forces[id.0 as usize] += f;
    }

    pub fn set_debug(&mut self, cfg: DebugSettings) { self.debug = cfg; }
    pub fn ledger(&self) -> &Ledger { &self.ledger }
    pub fn push_event(&mut self, e: LedgerEvent) { self.ledger.push(e); }

    pub fn for_each_collider<F: FnMut(u32, BodyId, &Shape, &Aabb)>(&self, mut f: F) {
        for (i, c) in self.colliders.iter().enumerate() {
            f(i as u32, c.body, &c.shape, &c.aabb);
        }
    }

    /// True when every body transform and velocity is finite.
    pub fn all_finite(&self) -> bool {
        for i in self.bodies.indices() {
            let p = self.bodies.pose(i);
            let v = self.bodies.vel(i);
            if !(p.pos.is_finite() && p.rot.is_finite() && v.lin.is_finite() && v.ang.is_finite()) {
                return false;
            }
        }
        true
    }

    /* ---------- Step ---------- */
    /// Advance by fixed sub-steps. The caller-supplied `dt` only decides how
    /// many sub-steps run; clamp it before calling after a rendering hitch.
    pub fn step(&mut self, dt: Scalar) -> StepStats {
        self.schedule.clear();
        self.ledger.clear();
        self.tick = self.tick.wrapping_add(1);

        let mut stats = StepStats::default();
        self.accum += dt;
        while self.accum >= SUB_DT - 1.0e-9 {
            self.accum -= SUB_DT;
            let (pairs, contacts) = self.substep(SUB_DT);
            stats.substeps += 1;
            stats.pairs_tested += pairs;
            stats.contacts += contacts;
        }

        // force accumulators are per-frame: zero them once consumed
        for f in &mut self.forces { *f = Vec3::ZERO; }

        if self.debug.print_every != 0 && (self.tick as u32) % self.debug.print_every == 0 {
            self.print_debug_block();
        }
        stats
    }

    /// Frame-end hook: dump this tick's ledger when debug settings ask for
    /// it. Runs after the controllers have pushed their events, so jump
    /// impulses, snaps and motor drives land in the same dump as the
    /// physics events of the step that preceded them.
    pub fn flush_ledger(&self) {
        if self.debug.json_every != 0 && (self.tick as u32) % self.debug.json_every == 0 {
            let _ = self.ledger.write_jsonl("out", self.tick);
        }
    }

    fn substep(&mut self, h: Scalar) -> (u32, u32) {
        // Integrate: gravity + accumulated forces
        self.schedule.push(StepStage::Integrate);
        for i in 0..(self.bodies.len() as u32) {
            if !self.bodies.is_dynamic(i) { continue; }
            let im = self.bodies.inv_mass_of(i);
            if im == 0.0 { continue; }
            let f = self.forces[i as usize];
            if f != Vec3::ZERO {
                let mut v = self.bodies.vel(i);
                v.lin += f * (im * h);
                self.bodies.set_vel(i, v);
                self.ledger.push(LedgerEvent::Integrate { id: i, dv: (f * im * h).into() });
            }
        }
        self.bodies.integrate_all(self.gravity, h);

        self.schedule.push(StepStage::Damp);
        self.bodies.damp_all(h);

        self.schedule.push(StepStage::SolveJoints);
        self.joints.solve(&mut self.bodies, h, self.solver_iterations);

        // Refresh AABBs after integration + joint corrections
        self.schedule.push(StepStage::UpdateAabbs);
        for idx in 0..self.colliders.len() {
            let b = self.colliders[idx].body;
            let shape = self.colliders[idx].shape;
            let pose = self.bodies.pose(b.0);
            self.colliders[idx].aabb = aabb_of(&shape, &pose);
        }

        self.schedule.push(StepStage::Broadphase);
        let aabbs: Vec<Aabb> = self.colliders.iter().map(|c| c.aabb).collect();
        let pairs = pairs_sap(&aabbs);

        self.schedule.push(StepStage::Narrowphase);
        let mut contacts = Vec::new();
        for (i, j) in pairs.iter().copied() {
            // limbs never collide with each other; the constraint graph holds
            // the rig together and self-contacts would only fight it
            let ma = self.colliders[i].material.id;
            let mb = self.colliders[j].material.id;
            if ma == mats::MaterialId::Character && mb == mats::MaterialId::Character {
                continue;
            }
            if let Some(c) = self.contact_box_box(i, j)    { contacts.push(c); continue; }
            if let Some(c) = self.contact_sphere_box(i, j) { contacts.push(c); continue; }
        }

        // Ensure final orientation is A -> B
        for c in &mut contacts {
            let a = self.colliders[c.a_collider].body;
            let b = self.colliders[c.b_collider].body;
            let pa = self.bodies.pose(a.0).pos;
            let pb = self.bodies.pose(b.0).pos;
            if c.normal.dot(pb - pa) < 0.0 {
                c.normal = -c.normal;
            }
        }

        self.schedule.push(StepStage::SolveContacts);
        if !contacts.is_empty() {
            self.solve_contacts(&contacts);
        }
        (pairs.len() as u32, contacts.len() as u32)
    }

    pub fn step_hash(&self) -> [u8; 32] {
        let mut h = StepHasher::new();
        h.update_bytes(&self.tick.to_le_bytes());
        h.update_bytes(&self.schedule.digest());
        for i in self.bodies.indices() {
            let pose = self.bodies.pose(i);
            let vel = self.bodies.vel(i);
            h.update_bytes(&i.to_le_bytes());
            hash_vec3(&mut h, &pose.pos);
            hash_quat(&mut h, &pose.rot);
            hash_vec3(&mut h, &vel.lin);
            hash_vec3(&mut h, &vel.ang);
        }
        h.finalize()
    }

    /* ---------- Contacts ---------- */
    fn contact_box_box(&self, ci: usize, cj: usize) -> Option<Contact> {
        let a = &self.colliders[ci];
        let b = &self.colliders[cj];
        match (a.shape, b.shape) {
            (Shape::Box { .. }, Shape::Box { .. }) => {}
            _ => return None,
        }
        let aa = a.aabb; let bb = b.aabb;
        if !aa.overlaps(&bb) { return None; }
        let ca = (aa.min + aa.max) * 0.5;
        let cb = (bb.min + bb.max) * 0.5;
        let px = (aa.max.x - bb.min.x).min(bb.max.x - aa.min.x);
        let py = (aa.max.y - bb.min.y).min(bb.max.y - aa.min.y);
        let pz = (aa.max.z - bb.min.z).min(bb.max.z - aa.min.z);
        let (mut normal, depth) = if px <= py && px <= pz {
            let dir = if cb.x > ca.x { 1.0 } else { -1.0 }; (Vec3::new(dir, 0.0, 0.0), px)
        } else if py <= pz {
            let dir = if cb.y > ca.y { 1.0 } else { -1.0 }; (Vec3::new(0.0, dir, 0.0), py)
        } else {
            let dir = if cb.z > ca.z { 1.0 } else { -1.0 }; (Vec3::new(0.0, 0.0, dir), pz)
        };
        if depth <= 0.0 { return None; }
        let n_len = normal.length(); if n_len == 0.0 { return None; }
        normal /= n_len;
        Some(Contact { a_collider: ci, b_collider: cj, normal, depth })
    }

    fn contact_sphere_box(&self, ci: usize, cj: usize) -> Option<Contact> {
        let (si, bi) = match (self.colliders[ci].shape, self.colliders[cj].shape) {
            (Shape::Sphere { .. }, Shape::Box { .. }) => (ci, cj),
            (Shape::Box { .. }, Shape::Sphere { .. }) => (cj, ci),
            _ => return None,
        };
        let s = &self.colliders[si]; let b = &self.colliders[bi];
        let r = match s.shape { Shape::Sphere { r } => r, _ => unreachable!() };
        let ps = self.bodies.pose(s.body.0).pos;
        let bb = b.aabb;
        let q = clamp_vec3(ps, bb.min, bb.max);
        let mut n = ps - q; // box -> sphere
        let dist = n.length(); if dist >= r { return None; }
        if dist > 1.0e-6 { n /= dist; } else { n = Vec3::new(0.0, 1.0, 0.0); }
        let depth = r - dist;
        // n is BOX -> SPHERE; A is the SPHERE, B is the BOX
        Some(Contact { a_collider: si, b_collider: bi, normal: -n, depth })
    }

    /* ---------- Solver (normal + friction + positional correction) ---------- */
    fn solve_contacts(&mut self, contacts: &[Contact]) {
        let iterations = self.solver_iterations;
        let slop = 0.010;
        let beta = 0.20;

        for _ in 0..iterations {
            for c in contacts {
                let ai = self.colliders[c.a_collider].body.0;
                let bi = self.colliders[c.b_collider].body.0;
                if ai == bi { continue; }

                let inv_a = self.bodies.inv_mass_of(ai);
                let inv_b = self.bodies.inv_mass_of(bi);
                let denom = inv_a + inv_b;
                if denom == 0.0 { continue; }

                let pair = mats::pair_props(
                    self.colliders[c.a_collider].material.id,
                    self.colliders[c.b_collider].material.id,
                );

                let va = self.bodies.vel(ai);
                let vb = self.bodies.vel(bi);
                let n = c.normal;
                let rel_v_n = (vb.lin - va.lin).dot(n);

                // Normal impulse
                let mut jn = 0.0;
                if rel_v_n < 0.0 {
                    jn = -(1.0 + pair.restitution) * rel_v_n / denom;
                    let imp_n = n * jn;
                    self.bodies.apply_impulse(ai, -imp_n);
                    self.bodies.apply_impulse(bi, imp_n);
                    self.ledger.push(LedgerEvent::ImpulseN { a: ai, b: bi, jn });
                }

                // Positional correction (split impulse style)
                let corr = (c.depth - slop).max(0.0) * beta;
                if corr > 0.0 {
                    let corr_vec = n * (corr / denom);
                    self.bodies.apply_position_delta(ai, -corr_vec * inv_a);
                    self.bodies.apply_position_delta(bi, corr_vec * inv_b);
                    self.ledger.push(LedgerEvent::PosCorr { a: ai, b: bi, corr });
                }

                // Friction (2 tangents)
                if jn > 0.0 || c.depth > slop {
                    let va2 = self.bodies.vel(ai);
                    let vb2 = self.bodies.vel(bi);
                    let vrel = vb2.lin - va2.lin;
                    let v_n = n * vrel.dot(n);
                    let v_t = vrel - v_n;

                    let (t1, t2) = orthonormal_basis(n);
                    let vt1 = v_t.dot(t1);
                    let vt2 = v_t.dot(t2);

                    let jt1_des = -vt1 / denom;
                    let jt2_des = -vt2 / denom;
                    let jt_des_len = (jt1_des * jt1_des + jt2_des * jt2_des).sqrt();

                    let jt_max_static = pair.mu_s * jn;
                    let (jt1, jt2) = if jt_des_len <= jt_max_static || jn == 0.0 {
                        (jt1_des, jt2_des)
                    } else {
                        let jt_max_kin = pair.mu_k * jn;
                        let scale = if jt_des_len > 1.0e-9 { jt_max_kin / jt_des_len } else { 0.0 };
                        (jt1_des * scale, jt2_des * scale)
                    };

                    let jt_vec = t1 * jt1 + t2 * jt2;
                    self.bodies.apply_impulse(ai, -jt_vec);
                    self.bodies.apply_impulse(bi, jt_vec);
                    self.ledger.push(LedgerEvent::ImpulseT { a: ai, b: bi, jt1, jt2 });
                }
            }
        }
    }

    /* ---------- Debug printer ---------- */
    fn print_debug_block(&self) {
        println!("--- debug @ tick {} ---", self.tick);

        if self.debug.show_energy {
            let mut ke = 0.0f32;
            for i in self.bodies.indices() {
                let im = self.bodies.inv_mass_of(i);
                if im > 0.0 {
                    let m = 1.0 / im;
                    let v = self.bodies.vel(i).lin;
                    ke += 0.5 * m * v.length_squared();
                }
            }
            println!("energy: KE_total = {:.6}", ke);
        }

        if self.debug.show_bodies {
            let mut lines = 0usize;
            for i in self.bodies.indices() {
                let p = self.bodies.pose(i).pos;
                let v = self.bodies.vel(i).lin;
                println!("body {:3}  pos=({:+.3},{:+.3},{:+.3})  vel=({:+.3},{:+.3},{:+.3})",
                         i, p.x, p.y, p.z, v.x, v.y, v.z);
                lines += 1; if lines >= self.debug.max_lines { break; }
            }
        }

        if self.debug.show_contacts {
            let mut shown = 0usize;
            for e in self.ledger.iter() {
                if let LedgerEvent::ImpulseN { a, b, jn } = *e {
                    println!("contact  a={a} b={b}  jn={jn:.5}");
                    shown += 1; if shown >= self.debug.max_lines { break; }
                }
            }
            if shown == 0 { println!("contacts: (none)"); }
        }
    }
}

/* ---------- helpers ---------- */
#[inline] fn clampf(x: f32, lo: f32, hi: f32) -> f32 { x.max(lo).min(hi) }
#[inline] fn clamp_vec3(p: Vec3, mn: Vec3, mx: Vec3) -> Vec3 {
    Vec3::new(clampf(p.x, mn.x, mx.x), clampf(p.y, mn.y, mx.y), clampf(p.z, mn.z, mx.z))
}
fn orthonormal_basis(n: Vec3) -> (Vec3, Vec3) {
    let ax = n.x.abs(); let ay = n.y.abs(); let az = n.z.abs();
    let base = if ax <= ay && ax <= az { Vec3::new(1.0, 0.0, 0.0) }
    else if ay <= az { Vec3::new(0.0, 1.0, 0.0) }
    else { Vec3::new(0.0, 0.0, 1.0) };
    let t1 = (base.cross(n)).normalize_or_zero();
    let t2 = n.cross(t1);
    (t1, t2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stridephys_core::{vec3, iso, quat_identity};

    fn world() -> World {
        World::new(vec3(0.0, -9.81, 0.0), 8)
    }

    fn drop_box(w: &mut World, y: f32) -> BodyId {
        let id = w.add_body(
            iso(vec3(0.0, y, 0.0), quat_identity()),
            Velocity::default(),
            MassProps::from_box(vec3(0.25, 0.25, 0.25), 1000.0),
            0.0, 0.0,
            true,
        );
        w.add_collider(id, Shape::Box { hx: 0.25, hy: 0.25, hz: 0.25 }, Material::character());
        id
    }

    #[test]
    fn box_settles_on_ground() {
        let mut w = world();
        let b = drop_box(&mut w, 1.0);
        for _ in 0..240 { w.step(SUB_DT); }
        let y = w.body_pose(b).pos.y;
        assert!((y - 0.25).abs() < 0.05, "rest height {y}");
    }

    #[test]
    fn no_bounce_on_character_ground_pair() {
        let mut w = world();
        let b = drop_box(&mut w, 0.5);
        let mut max_y_after_touch = 0.0f32;
        let mut touched = false;
        for _ in 0..240 {
            w.step(SUB_DT);
            let y = w.body_pose(b).pos.y;
            if y <= 0.26 { touched = true; }
            if touched { max_y_after_touch = max_y_after_touch.max(y); }
        }
        assert!(touched);
        assert!(max_y_after_touch < 0.32, "bounced to {max_y_after_touch}");
    }

    #[test]
    fn substep_count_follows_dt() {
        let mut w = world();
        let s = w.step(3.0 * SUB_DT + 1.0e-4);
        assert_eq!(s.substeps, 3);
    }

    #[test]
    fn fixed_substeps_are_deterministic() {
        let run = || {
            let mut w = world();
            drop_box(&mut w, 1.0);
            for _ in 0..120 { w.step(SUB_DT); }
            w.step_hash()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn forces_are_consumed_per_step() {
        let mut w = world();
        let b = drop_box(&mut w, 5.0);
        // cancel gravity exactly for one frame
        let m = 1.0 / w.body_inv_mass(b);
        w.apply_force(b, vec3(0.0, 9.81 * m, 0.0));
        w.step(SUB_DT);
        let v1 = w.body_vel(b).lin.y;
        assert!(v1.abs() < 1.0e-4, "supported body fell: {v1}");
        w.step(SUB_DT);
        let v2 = w.body_vel(b).lin.y;
        assert!(v2 < -0.1, "force should not persist: {v2}");
    }
}
