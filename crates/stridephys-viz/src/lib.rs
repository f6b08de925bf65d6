use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use stridephys_core::{StepStage, schedule_digest};

#[derive(Default)]
pub struct ScheduleRecorder { stages: Vec<StepStage> }

impl ScheduleRecorder {
    pub fn new() -> Self { Self { stages: Vec::new() } }
    pub fn push(&mut self, s: StepStage) { self.stages.push(s); }
    pub fn clear(&mut self) { self.stages.clear(); }
    pub fn digest(&self) -> [u8; 32] { schedule_digest(&self.stages) }
}

/// Debug output knobs. Everything defaults to off; the core has no observable
/// output besides the pose snapshot unless a harness opts in.
#[derive(Copy, Clone, Debug)]
pub struct DebugSettings {
    pub print_every: u32, // 0 = never
    pub json_every: u32,  // 0 = never
    pub show_bodies: bool,
    pub show_contacts: bool,
    pub show_energy: bool,
    pub max_lines: usize,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            print_every: 0,
            json_every: 0,
            show_bodies: false,
            show_contacts: false,
            show_energy: false,
            max_lines: 16,
        }
    }
}

/// Per-tick event tape. Cleared at the start of every step; dumped as JSONL
/// at the frame-end flush when DebugSettings asks for it.
#[derive(Copy, Clone, Debug, Serialize)]
#[serde(tag = "ev")]
pub enum LedgerEvent {
    Integrate { id: u32, dv: [f32; 3] },
    ImpulseN { a: u32, b: u32, jn: f32 },
    ImpulseT { a: u32, b: u32, jt1: f32, jt2: f32 },
    PosCorr { a: u32, b: u32, corr: f32 },
    JumpImpulse { id: u32, jy: f32 },
    UprightSnap { id: u32, yaw: f32 },
    UprightTorque { id: u32, roll: f32, pitch: f32 },
    MotorDrive { hinge: u32, target: f32 },
    KinematicMove { dx: f32, dz: f32 },
    RigReset { tick: u64 },
}

pub struct Ledger {
    events: Vec<LedgerEvent>,
    cap: usize,
}

impl Ledger {
    pub fn new(cap: usize) -> Self { Self { events: Vec::with_capacity(cap), cap } }
    pub fn push(&mut self, e: LedgerEvent) {
        if self.events.len() < self.cap { self.events.push(e); }
    }
    pub fn clear(&mut self) { self.events.clear(); }
    pub fn iter(&self) -> impl Iterator<Item = &LedgerEvent> { self.events.iter() }
    pub fn len(&self) -> usize { self.events.len() }
    pub fn is_empty(&self) -> bool { self.events.is_empty() }

    /// Append this tick's events to `<dir>/ledger_<tick>.jsonl`.
    pub fn write_jsonl(&self, dir: &str, tick: u64) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let path = Path::new(dir).join(format!("ledger_{tick}.jsonl"));
        let mut f = std::fs::File::create(path)?;
        for e in &self.events {
            serde_json::to_writer(&mut f, e)?;
            f.write_all(b"\n")?;
        }
        Ok(())
    }
}
