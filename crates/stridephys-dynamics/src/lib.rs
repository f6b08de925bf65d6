use stridephys_core::types::{Isometry, Velocity, Vec3};
use stridephys_core::{Scalar, Quat};

/// Input descriptor when creating a body.
#[derive(Copy, Clone, Debug)]
pub struct BodyDesc {
    pub pose: Isometry,
    pub vel: Velocity,
    pub inv_mass: Scalar,
    pub lin_damping: Scalar,
    pub ang_damping: Scalar,
    pub dynamic: bool,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            pose: Isometry::default(),
            vel: Velocity::default(),
            inv_mass: 1.0,
            lin_damping: 0.0,
            ang_damping: 0.0,
            dynamic: true,
        }
    }
}

/// SoA body storage with deterministic ID = index semantics. Bodies are owned
/// exclusively by the world once registered; constraints refer to them by
/// index only.
pub struct Bodies {
    pos: Vec<Vec3>,
    rot: Vec<Quat>,
    linvel: Vec<Vec3>,
    angvel: Vec<Vec3>,
    inv_mass: Vec<Scalar>,
    lin_damp: Vec<Scalar>,
    ang_damp: Vec<Scalar>,
    dynamic: Vec<bool>,
}

impl Bodies {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            pos:      Vec::with_capacity(cap),
            rot:      Vec::with_capacity(cap),
            linvel:   Vec::with_capacity(cap),
            angvel:   Vec::with_capacity(cap),
            inv_mass: Vec::with_capacity(cap),
            lin_damp: Vec::with_capacity(cap),
            ang_damp: Vec::with_capacity(cap),
            dynamic:  Vec::with_capacity(cap),
        }
    }

    pub fn add(&mut self, desc: BodyDesc) -> u32 {
        self.pos.push(desc.pose.pos);
        self.rot.push(desc.pose.rot);
        self.linvel.push(desc.vel.lin);
        self.angvel.push(desc.vel.ang);
        self.inv_mass.push(desc.inv_mass);
        self.lin_damp.push(desc.lin_damping);
        self.ang_damp.push(desc.ang_damping);
        self.dynamic.push(desc.dynamic);
        (self.pos.len() as u32) - 1
    }

    #[inline] pub fn len(&self) -> usize { self.pos.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.pos.is_empty() }

    /// Semi-implicit Euler over all dynamic bodies, then per-substep velocity
    /// damping. Orientation follows angular velocity via small-angle deltas.
    pub fn integrate_all(&mut self, gravity: Vec3, dt: Scalar) {
        for i in 0..self.len() {
            if !self.dynamic[i] || self.inv_mass[i] == 0.0 { continue; }
            self.linvel[i] += gravity * dt;
            self.pos[i] += self.linvel[i] * dt;
            let w = self.angvel[i];
            if w.length_squared() > 0.0 {
                let dq = Quat::from_xyzw(w.x * dt * 0.5, w.y * dt * 0.5, w.z * dt * 0.5, 1.0).normalize();
                self.rot[i] = (dq * self.rot[i]).normalize();
            }
        }
    }

    /// Apply linear/angular damping for one substep: v *= 1/(1 + d*dt).
    pub fn damp_all(&mut self, dt: Scalar) {
        for i in 0..self.len() {
            if !self.dynamic[i] { continue; }
            let kl = 1.0 / (1.0 + self.lin_damp[i] * dt);
            let ka = 1.0 / (1.0 + self.ang_damp[i] * dt);
            self.linvel[i] *= kl;
            self.angvel[i] *= ka;
        }
    }

    // -------- Accessors used by world/solver/hash --------
    #[inline] pub fn pose(&self, id: u32) -> Isometry {
        let i = id as usize;
        Isometry { pos: self.pos[i], rot: self.rot[i] }
    }
    #[inline] pub fn set_pose(&mut self, id: u32, iso: Isometry) {
        let i = id as usize;
        self.pos[i] = iso.pos;
        self.rot[i] = iso.rot;
    }

    #[inline] pub fn vel(&self, id: u32) -> Velocity {
        let i = id as usize;
        Velocity { lin: self.linvel[i], ang: self.angvel[i] }
    }
    #[inline] pub fn set_vel(&mut self, id: u32, v: Velocity) {
        let i = id as usize;
        self.linvel[i] = v.lin;
        self.angvel[i] = v.ang;
    }

    #[inline] pub fn inv_mass_of(&self, id: u32) -> Scalar { self.inv_mass[id as usize] }
    #[inline] pub fn is_dynamic(&self, id: u32) -> bool { self.dynamic[id as usize] }

    // -------- Impulses / deltas --------
    #[inline] pub fn apply_impulse(&mut self, id: u32, j: Vec3) {
        let i = id as usize;
        let im = self.inv_mass[i];
        if im != 0.0 { self.linvel[i] += j * im; }
    }

    /// Add a position delta (already scaled for this body).
    #[inline] pub fn apply_position_delta(&mut self, id: u32, dp: Vec3) {
        let i = id as usize;
        self.pos[i] += dp;
    }

    /// Small-angle orientation correction (world space). Deterministic, stable.
    pub fn apply_orientation_delta(&mut self, id: u32, dtheta_world: Vec3) {
        let i = id as usize;
        if dtheta_world.length_squared() <= 0.0 { return; }
        let dq = Quat::from_xyzw(
            dtheta_world.x * 0.5,
            dtheta_world.y * 0.5,
            dtheta_world.z * 0.5,
            1.0,
        ).normalize();
        self.rot[i] = (dq * self.rot[i]).normalize();
    }

    // Iterator for hashing in stable order
    pub fn indices(&self) -> impl ExactSizeIterator<Item = u32> + '_ {
        0..(self.len() as u32)
    }
}

impl Default for Bodies {
    fn default() -> Self { Self::with_capacity(0) }
}
