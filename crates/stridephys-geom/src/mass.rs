use stridephys_core::types::Vec3;
use stridephys_materials::MaterialId;

#[derive(Copy, Clone, Debug)]
pub struct Material { pub id: MaterialId }

impl Material {
    pub fn ground() -> Self { Self { id: MaterialId::Ground } }
    pub fn character() -> Self { Self { id: MaterialId::Character } }
}

#[derive(Copy, Clone, Debug)]
pub struct MassProps {
    pub mass: f32,
    pub inv_mass: f32,
}

impl MassProps {
    pub fn infinite() -> Self {
        Self { mass: f32::INFINITY, inv_mass: 0.0 }
    }

    /// Explicit mass, ignoring the shape. Limbs use this: the standing pose
    /// was tuned with hand-picked masses, not volumetric ones.
    pub fn from_mass(mass: f32) -> Self {
        Self { mass, inv_mass: 1.0 / mass }
    }

    pub fn from_sphere(radius: f32, density: f32) -> Self {
        let vol = (4.0 / 3.0) * core::f32::consts::PI * radius * radius * radius;
        let m = density * vol;
        Self { mass: m, inv_mass: 1.0 / m }
    }

    pub fn from_box(half: Vec3, density: f32) -> Self {
        let dims = half * 2.0;
        let m = density * dims.x * dims.y * dims.z;
        Self { mass: m, inv_mass: 1.0 / m }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stridephys_core::vec3;
    #[test] fn box_mass_is_volume_times_density() {
        let m = MassProps::from_box(vec3(0.5, 0.5, 0.5), 1000.0);
        assert!((m.mass - 1000.0).abs() < 1e-3);
        assert!((m.inv_mass * m.mass - 1.0).abs() < 1e-6);
    }
    #[test] fn infinite_has_zero_inv_mass() {
        assert_eq!(MassProps::infinite().inv_mass, 0.0);
    }
}
