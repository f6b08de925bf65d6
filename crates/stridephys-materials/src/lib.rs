/// Material catalog is fixed and deterministic. The rig only ever touches two
/// materials: the ground/scenery tag and the character-limb tag. Pair mixing
/// is symmetric; the ground↔character pairing is pinned explicitly so limb
/// contacts never bounce and feet get high traction.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MaterialId {
    Ground,
    Character,
}

/// Canonical single-material properties.
/// Friction coefficients are dimensionless; restitution in [0,1].
#[derive(Copy, Clone, Debug)]
pub struct MatProps {
    pub mu_s: f32,        // static
    pub mu_k: f32,        // kinetic
    pub restitution: f32, // bounciness
}

/// Pair properties after mixing + overrides; what the solver should use.
#[derive(Copy, Clone, Debug)]
pub struct MatPairProps {
    pub mu_s: f32,
    pub mu_k: f32,
    pub restitution: f32,
}

pub fn props(id: MaterialId) -> MatProps {
    use MaterialId::*;
    match id {
        Ground    => MatProps { mu_s: 0.80, mu_k: 0.70, restitution: 0.00 },
        Character => MatProps { mu_s: 1.00, mu_k: 0.90, restitution: 0.00 },
    }
}

/// Symmetric mixing with explicit pair overrides (checked before the generic
/// geometric-mean fallback).
pub fn pair_props(a: MaterialId, b: MaterialId) -> MatPairProps {
    use MaterialId::*;
    let (lo, hi) = if (a as u8) <= (b as u8) { (a, b) } else { (b, a) };
    match (lo, hi) {
        // Ground vs character limbs: high grip, dead on impact.
        (Ground, Character) => MatPairProps { mu_s: 0.90, mu_k: 0.90, restitution: 0.00 },
        _ => {
            let pa = props(lo);
            let pb = props(hi);
            MatPairProps {
                mu_s: (pa.mu_s * pb.mu_s).sqrt(),
                mu_k: (pa.mu_k * pb.mu_k).sqrt(),
                restitution: pa.restitution.min(pb.restitution),
            }
        }
    }
}
