// crates/driftfvm-device/src/region.rs

//! Typed regions: one connected material domain per mesh subdomain tag.

use driftfvm_material::{Material, MaterialCategory};

/// Region kind, derived from the material category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionKind {
    /// Carrier-transporting semiconductor.
    Semiconductor,
    /// Dielectric.
    Insulator,
    /// Perfect conductor.
    Electrode,
    /// Resistive metal.
    Metal,
    /// Vacuum.
    Vacuum,
    /// Perfectly-matched layer.
    Pml,
}

impl RegionKind {
    /// Kind backing a material category.
    #[must_use]
    pub const fn from_category(cat: MaterialCategory) -> Self {
        match cat {
            MaterialCategory::Semiconductor => Self::Semiconductor,
            MaterialCategory::Insulator => Self::Insulator,
            MaterialCategory::Conductor => Self::Electrode,
            MaterialCategory::Resistance => Self::Metal,
            MaterialCategory::Vacuum => Self::Vacuum,
            MaterialCategory::Pml => Self::Pml,
        }
    }

    /// Sort rank at multi-region boundary vertices: the semiconductor FVM
    /// node always comes first so boundary handlers can anchor their
    /// governing rows on it.
    #[must_use]
    pub const fn boundary_rank(self) -> u8 {
        match self {
            Self::Semiconductor => 0,
            Self::Metal => 1,
            Self::Electrode => 2,
            Self::Insulator => 3,
            Self::Vacuum => 4,
            Self::Pml => 5,
        }
    }
}

/// One material domain.
#[derive(Clone, Copy, Debug)]
pub struct Region {
    /// Mesh subdomain id.
    pub id: usize,
    /// Kind derived from the material.
    pub kind: RegionKind,
    /// Material adapter.
    pub material: &'static Material,
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftfvm_material::by_name;

    #[test]
    fn kinds_follow_material_categories() {
        assert_eq!(
            RegionKind::from_category(by_name("si").unwrap().category),
            RegionKind::Semiconductor
        );
        assert_eq!(
            RegionKind::from_category(by_name("al").unwrap().category),
            RegionKind::Metal
        );
        assert_eq!(
            RegionKind::from_category(by_name("sio2").unwrap().category),
            RegionKind::Insulator
        );
    }

    #[test]
    fn semiconductor_sorts_first_at_boundaries() {
        for kind in [
            RegionKind::Insulator,
            RegionKind::Electrode,
            RegionKind::Metal,
            RegionKind::Vacuum,
            RegionKind::Pml,
        ] {
            assert!(RegionKind::Semiconductor.boundary_rank() < kind.boundary_rank());
        }
    }
}
