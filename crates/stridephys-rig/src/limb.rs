use core::ops::{Index, IndexMut};
use serde::Serialize;

/// Fixed set of limb slots. An enum-indexed map replaces a string-keyed
/// lookup: a missing or typo'd limb is a compile error, not a runtime panic.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum Limb {
    Torso,
    Head,
    UpperArmLeft, UpperArmRight,
    ForearmLeft, ForearmRight,
    HandLeft, HandRight,
    Finger1BaseLeft, Finger1MidLeft, Finger1TipLeft,
    Finger2BaseLeft, Finger2MidLeft, Finger2TipLeft,
    Finger1BaseRight, Finger1MidRight, Finger1TipRight,
    Finger2BaseRight, Finger2MidRight, Finger2TipRight,
    UpperLegLeft, UpperLegRight,
    LowerLegLeft, LowerLegRight,
    FootLeft, FootRight,
}

impl Limb {
    pub const COUNT: usize = 26;

    pub const ALL: [Limb; Self::COUNT] = [
        Limb::Torso,
        Limb::Head,
        Limb::UpperArmLeft, Limb::UpperArmRight,
        Limb::ForearmLeft, Limb::ForearmRight,
        Limb::HandLeft, Limb::HandRight,
        Limb::Finger1BaseLeft, Limb::Finger1MidLeft, Limb::Finger1TipLeft,
        Limb::Finger2BaseLeft, Limb::Finger2MidLeft, Limb::Finger2TipLeft,
        Limb::Finger1BaseRight, Limb::Finger1MidRight, Limb::Finger1TipRight,
        Limb::Finger2BaseRight, Limb::Finger2MidRight, Limb::Finger2TipRight,
        Limb::UpperLegLeft, Limb::UpperLegRight,
        Limb::LowerLegLeft, Limb::LowerLegRight,
        Limb::FootLeft, Limb::FootRight,
    ];

    #[inline] pub fn idx(self) -> usize { self as usize }

    pub fn name(self) -> &'static str {
        match self {
            Limb::Torso => "torso",
            Limb::Head => "head",
            Limb::UpperArmLeft => "upperArmLeft",
            Limb::UpperArmRight => "upperArmRight",
            Limb::ForearmLeft => "forearmLeft",
            Limb::ForearmRight => "forearmRight",
            Limb::HandLeft => "handLeft",
            Limb::HandRight => "handRight",
            Limb::Finger1BaseLeft => "leftFinger1Base",
            Limb::Finger1MidLeft => "leftFinger1Mid",
            Limb::Finger1TipLeft => "leftFinger1Tip",
            Limb::Finger2BaseLeft => "leftFinger2Base",
            Limb::Finger2MidLeft => "leftFinger2Mid",
            Limb::Finger2TipLeft => "leftFinger2Tip",
            Limb::Finger1BaseRight => "rightFinger1Base",
            Limb::Finger1MidRight => "rightFinger1Mid",
            Limb::Finger1TipRight => "rightFinger1Tip",
            Limb::Finger2BaseRight => "rightFinger2Base",
            Limb::Finger2MidRight => "rightFinger2Mid",
            Limb::Finger2TipRight => "rightFinger2Tip",
            Limb::UpperLegLeft => "upperLegLeft",
            Limb::UpperLegRight => "upperLegRight",
            Limb::LowerLegLeft => "lowerLegLeft",
            Limb::LowerLegRight => "lowerLegRight",
            Limb::FootLeft => "footLeft",
            Limb::FootRight => "footRight",
        }
    }

    #[inline] pub fn is_leg(self) -> bool {
        matches!(self,
            Limb::UpperLegLeft | Limb::UpperLegRight |
            Limb::LowerLegLeft | Limb::LowerLegRight)
    }

    #[inline] pub fn is_foot(self) -> bool {
        matches!(self, Limb::FootLeft | Limb::FootRight)
    }
}

/// Dense per-limb storage indexed by the enum.
#[derive(Copy, Clone, Debug)]
pub struct LimbMap<T>([T; Limb::COUNT]);

impl<T: Copy + Default> LimbMap<T> {
    pub fn splat(v: T) -> Self { Self([v; Limb::COUNT]) }
}

impl<T: Copy + Default> Default for LimbMap<T> {
    fn default() -> Self { Self([T::default(); Limb::COUNT]) }
}

impl<T> LimbMap<T> {
    pub fn from_fn(mut f: impl FnMut(Limb) -> T) -> Self {
        Self(Limb::ALL.map(|l| f(l)))
    }
    pub fn iter(&self) -> impl Iterator<Item = (Limb, &T)> {
        Limb::ALL.iter().map(move |&l| (l, &self.0[l.idx()]))
    }
}

impl<T> Index<Limb> for LimbMap<T> {
    type Output = T;
    #[inline] fn index(&self, l: Limb) -> &T { &self.0[l.idx()] }
}

impl<T> IndexMut<Limb> for LimbMap<T> {
    #[inline] fn index_mut(&mut self, l: Limb) -> &mut T { &mut self.0[l.idx()] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn all_covers_every_variant_once() {
        let mut seen = [false; Limb::COUNT];
        for l in Limb::ALL {
            assert!(!seen[l.idx()]);
            seen[l.idx()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test] fn names_are_unique() {
        for (i, a) in Limb::ALL.iter().enumerate() {
            for b in &Limb::ALL[i + 1..] {
                assert_ne!(a.name(), b.name());
            }
        }
    }

    #[test] fn map_round_trips() {
        let mut m = LimbMap::<u32>::default();
        m[Limb::Torso] = 7;
        assert_eq!(m[Limb::Torso], 7);
        assert_eq!(m[Limb::Head], 0);
    }
}
