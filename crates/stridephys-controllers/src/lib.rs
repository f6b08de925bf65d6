mod command;
mod stabilize;

pub use command::{CommandCtrl, CommandParams, yaw_of};
pub use stabilize::{StabilizeCtrl, StabilizeParams};
