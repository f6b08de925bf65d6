//! Per-frame driver: clamp the frame delta, step the world, run the command
//! and stabilization controllers in order, guard against degenerate state,
//! and expose a read-only pose snapshot for rendering.

use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use stridephys_controllers::{CommandCtrl, CommandParams, StabilizeCtrl, StabilizeParams};
use stridephys_core::{Scalar, StepHasher, StepStats, hash_quat, hash_vec3};
use stridephys_core::types::Vec3;
use stridephys_input::OrbitCamera;
use stridephys_rig::{CommandIntent, HumanoidRig, Limb, RigParams, build_humanoid};
use stridephys_viz::LedgerEvent;
use stridephys_world::World;

/// Hard cap on the frame delta fed into the world. Bounds worst-case solver
/// error after a rendering hitch; the world itself never validates dt.
pub const MAX_FRAME_DT: Scalar = 0.033;

pub struct SimConfig {
    pub gravity: Vec3,
    pub solver_iterations: u32,
    pub origin: Vec3,
    pub label: String,
    pub scenery: Vec<(Vec3, Vec3)>, // (position, half-extents)
    pub rig: RigParams,
    pub command: CommandParams,
    pub stabilize: StabilizeParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            solver_iterations: 8,
            origin: Vec3::ZERO,
            label: String::from("rig"),
            scenery: Vec::new(),
            rig: RigParams::default(),
            command: CommandParams::default(),
            stabilize: StabilizeParams::default(),
        }
    }
}

pub struct Simulation {
    pub world: World,
    pub rig: HumanoidRig,
    pub camera: OrbitCamera,
    label: String,
    command: CommandCtrl,
    stabilize: StabilizeCtrl,
}

impl Simulation {
    pub fn new(cfg: SimConfig) -> Self {
        let mut world = World::new(cfg.gravity, cfg.solver_iterations);
        for (pos, half) in &cfg.scenery {
            world.add_static_box(*pos, *half);
        }
        let rig = build_humanoid(&mut world, cfg.origin, cfg.rig);
        Self {
            world,
            rig,
            camera: OrbitCamera::default(),
            label: cfg.label,
            command: CommandCtrl::new(cfg.command),
            stabilize: StabilizeCtrl::new(cfg.stabilize),
        }
    }

    #[inline] pub fn label(&self) -> &str { &self.label }

    /// The one shared intent record; input adapters and programmatic callers
    /// both write here, the command controller reads it once per frame.
    #[inline] pub fn intent_mut(&mut self) -> &mut CommandIntent { &mut self.rig.intent }

    /// One frame: world step, command actuation, stabilization, recovery
    /// guard, camera follow. Order is fixed.
    pub fn frame(&mut self, dt: Scalar) -> StepStats {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);

        let stats = self.world.step(dt);
        self.command.step(&mut self.world, &mut self.rig, dt);
        self.stabilize.step(&mut self.world, &self.rig, dt);

        // a body that went non-finite would poison every connected
        // constraint; reset to the canonical standing pose instead
        if !self.world.all_finite() {
            self.rig.reset_pose(&mut self.world);
            let tick = self.world.tick_index();
            self.world.push_event(LedgerEvent::RigReset { tick });
        }

        self.world.flush_ledger();

        self.camera.follow(self.world.body_pose(self.rig.body(Limb::Torso)).pos);
        stats
    }

    pub fn snapshot(&self) -> RigSnapshot {
        let bodies = Limb::ALL
            .iter()
            .map(|&l| {
                let p = self.world.body_pose(self.rig.body(l));
                BodyState {
                    name: l.name(),
                    pos: [p.pos.x, p.pos.y, p.pos.z],
                    rot: [p.rot.x, p.rot.y, p.rot.z, p.rot.w],
                }
            })
            .collect();
        RigSnapshot {
            label: self.label.clone(),
            tick: self.world.tick_index(),
            bodies,
        }
    }

    /// Digest of the rig pose alone, for cheap regression comparisons.
    pub fn pose_hash(&self) -> [u8; 32] {
        let mut h = StepHasher::new();
        for l in Limb::ALL {
            let p = self.world.body_pose(self.rig.body(l));
            hash_vec3(&mut h, &p.pos);
            hash_quat(&mut h, &p.rot);
        }
        h.finalize()
    }
}

/* ---------------- pose snapshot ---------------- */

#[derive(Clone, Debug, Serialize)]
pub struct BodyState {
    pub name: &'static str,
    pub pos: [f32; 3],
    pub rot: [f32; 4],
}

#[derive(Clone, Debug, Serialize)]
pub struct RigSnapshot {
    pub label: String,
    pub tick: u64,
    pub bodies: Vec<BodyState>,
}

impl RigSnapshot {
    /// Append to `<dir>/pose_<tick>.json`.
    pub fn write_json(&self, dir: &str) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let path = Path::new(dir).join(format!("pose_{}.json", self.tick));
        let mut f = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(&mut f, self)?;
        f.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stridephys_core::hex32;
    use stridephys_rig::STAND_HEIGHT;
    use stridephys_world::SUB_DT;

    fn sim() -> Simulation {
        Simulation::new(SimConfig::default())
    }

    #[test]
    fn frame_delta_is_clamped() {
        let mut s = sim();
        // a 10 s hitch still runs at most two fixed sub-steps
        let stats = s.frame(10.0);
        assert!(stats.substeps <= 2, "{} substeps", stats.substeps);
    }

    #[test]
    fn walking_one_second_covers_base_speed() {
        let mut s = sim();
        s.intent_mut().move_forward();
        let z0 = s.world.body_pose(s.rig.body(Limb::Torso)).pos.z;
        for _ in 0..60 {
            s.frame(SUB_DT);
        }
        let dz = s.world.body_pose(s.rig.body(Limb::Torso)).pos.z - z0;
        assert!((dz - 1.0).abs() < 0.02, "dz {dz}");
    }

    #[test]
    fn equal_rotations_cancel() {
        let mut s = sim();
        let torso = s.rig.body(Limb::Torso);
        let yaw0 = stridephys_controllers::yaw_of(s.world.body_pose(torso).rot);

        s.intent_mut().rotate_left();
        for _ in 0..15 { s.frame(SUB_DT); }
        let turned = stridephys_controllers::yaw_of(s.world.body_pose(torso).rot);
        assert!(turned > yaw0 + 0.05, "did not turn: {turned}");

        s.intent_mut().rotate_right();
        for _ in 0..15 { s.frame(SUB_DT); }
        s.intent_mut().stop();
        for _ in 0..2 { s.frame(SUB_DT); }

        let yaw1 = stridephys_controllers::yaw_of(s.world.body_pose(torso).rot);
        assert!((yaw1 - yaw0).abs() < 0.1, "residual yaw {}", yaw1 - yaw0);
    }

    #[test]
    fn non_finite_state_resets_to_standing() {
        let mut s = sim();
        let torso = s.rig.body(Limb::Torso);
        let mut p = s.world.body_pose(torso);
        p.pos.y = f32::NAN;
        s.world.set_body_pose(torso, p);

        s.frame(SUB_DT);
        assert!(s.world.all_finite());
        let y = s.world.body_pose(torso).pos.y;
        assert!((y - STAND_HEIGHT).abs() < 0.05, "torso at {y}");
    }

    #[test]
    fn snapshot_names_every_limb() {
        let mut s = sim();
        s.frame(SUB_DT);
        let snap = s.snapshot();
        assert_eq!(snap.bodies.len(), Limb::COUNT);
        assert!(snap.bodies.iter().any(|b| b.name == "torso"));
        assert!(snap.bodies.iter().any(|b| b.name == "leftFinger2Tip"));
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"label\""));
    }

    #[test]
    fn pose_hash_is_reproducible() {
        let run = || {
            let mut s = sim();
            s.intent_mut().move_forward();
            for _ in 0..30 { s.frame(SUB_DT); }
            hex32(&s.pose_hash())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn jump_frame_dump_carries_the_impulse_event() {
        let mut s = sim();
        s.world.set_debug(stridephys_viz::DebugSettings {
            json_every: 1,
            ..Default::default()
        });
        s.intent_mut().jump();
        s.frame(SUB_DT);

        // the controller event survives until the frame-end flush
        assert!(s.world.ledger().iter().any(|e| matches!(e, LedgerEvent::JumpImpulse { .. })));

        let tick = s.world.tick_index();
        let dump = std::fs::read_to_string(format!("out/ledger_{tick}.jsonl")).unwrap();
        assert!(dump.contains("\"ev\":\"JumpImpulse\""), "dump: {dump}");
    }

    #[test]
    fn camera_tracks_the_torso() {
        let mut s = sim();
        s.intent_mut().move_forward();
        for _ in 0..30 { s.frame(SUB_DT); }
        let torso = s.world.body_pose(s.rig.body(Limb::Torso)).pos;
        assert!((s.camera.target - torso).length() < 1e-6);
    }
}
