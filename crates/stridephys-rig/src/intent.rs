/// Speed levels exposed to callers. The multiplier scales translation and
/// rotation uniformly.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Speed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl Speed {
    #[inline] pub fn factor(self) -> f32 {
        match self {
            Speed::Slow => 0.5,
            Speed::Normal => 1.0,
            Speed::Fast => 2.0,
        }
    }
}

/// The one mutable command record. Written by the input adapter or
/// programmatic callers, read once per simulation step by the command
/// controller; last write wins.
#[derive(Copy, Clone, Debug, Default)]
pub struct CommandIntent {
    pub forward: i8,             // -1, 0, 1
    pub strafe: i8,              // -1, 0, 1
    pub rotate_rate: f32,        // rad/s about +Y, before the speed factor
    pub jump_requested: bool,
    pub jump_frames_remaining: u8,
    pub speed: Speed,
}

/// Yaw rate a single rotate command asks for, rad/s.
pub const ROTATE_RATE: f32 = 1.5;

impl CommandIntent {
    pub fn move_forward(&mut self) { self.forward = 1; }
    pub fn move_backward(&mut self) { self.forward = -1; }
    pub fn move_left(&mut self) { self.strafe = -1; }
    pub fn move_right(&mut self) { self.strafe = 1; }
    pub fn rotate_left(&mut self) { self.rotate_rate = ROTATE_RATE; }
    pub fn rotate_right(&mut self) { self.rotate_rate = -ROTATE_RATE; }
    pub fn jump(&mut self) { self.jump_requested = true; }
    pub fn set_speed(&mut self, s: Speed) { self.speed = s; }

    /// Release every sustained control; pending jump state is kept so the
    /// debounce window still runs out.
    pub fn stop(&mut self) {
        self.forward = 0;
        self.strafe = 0;
        self.rotate_rate = 0.0;
    }

    #[inline] pub fn translating(&self) -> bool {
        self.forward != 0 || self.strafe != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn stop_releases_sustained_controls() {
        let mut c = CommandIntent::default();
        c.move_forward();
        c.move_right();
        c.rotate_left();
        c.stop();
        assert!(!c.translating());
        assert_eq!(c.rotate_rate, 0.0);
    }

    #[test] fn speed_factors() {
        assert_eq!(Speed::Slow.factor(), 0.5);
        assert_eq!(Speed::Normal.factor(), 1.0);
        assert_eq!(Speed::Fast.factor(), 2.0);
    }

    #[test] fn last_write_wins() {
        let mut c = CommandIntent::default();
        c.move_forward();
        c.move_backward();
        assert_eq!(c.forward, -1);
    }
}
