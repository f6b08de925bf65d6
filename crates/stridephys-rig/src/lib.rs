mod limb;
mod intent;
mod build;

pub use limb::{Limb, LimbMap};
pub use intent::{CommandIntent, Speed, ROTATE_RATE};
pub use build::{HumanoidRig, RigParams, build_humanoid, STAND_HEIGHT};
