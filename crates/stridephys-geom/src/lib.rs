pub mod aabb;
pub mod shape;
pub mod mass;

pub use aabb::Aabb;
pub use shape::Shape;
pub use mass::{MassProps, Material};
pub use shape::aabb_of;
