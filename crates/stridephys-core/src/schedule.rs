use crate::StepHasher;

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum StepStage {
    Integrate = 1,
    Damp = 2,
    SolveJoints = 3,
    UpdateAabbs = 4,
    Broadphase = 5,
    Narrowphase = 6,
    SolveContacts = 7,
}

pub fn schedule_digest(stages: &[StepStage]) -> [u8; 32] {
    let mut h = StepHasher::new();
    for s in stages { h.update_bytes(&[*s as u8]); }
    h.finalize()
}
