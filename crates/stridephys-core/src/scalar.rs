/// Single simulation scalar. f32 across the whole workspace; keep sorts and
/// reductions in fixed order so steps replay bit-identically.
pub type Scalar = f32;
