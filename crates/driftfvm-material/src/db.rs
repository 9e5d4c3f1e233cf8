// crates/driftfvm-material/src/db.rs

//! Built-in material database and the category predicates consulted by
//! interface classification.

use anyhow::{bail, Result};

use crate::model::{BandParams, Material, MaterialCategory, MobilityParams, RecombParams};

const SI_BAND: BandParams = BandParams {
    eg0: 1.17,
    eg_alpha: 4.73e-4,
    eg_beta: 636.0,
    nc300: 2.8e19,
    nv300: 3.1e19,
};

const SI_MOBILITY: MobilityParams = MobilityParams {
    mun_min: 5.524e1,
    mun_max: 1.429_23e3,
    nrefn: 1.072e17,
    nun: -2.3,
    xin: -3.8,
    alphan: 0.73,
    mup_min: 4.97e1,
    mup_max: 4.793_7e2,
    nrefp: 1.606e17,
    nup: -2.2,
    xip: -3.7,
    alphap: 0.70,
};

const SI_RECOMB: RecombParams = RecombParams {
    taun: 1.0e-5,
    taup: 1.0e-5,
    augn: 2.8e-31,
    augp: 9.9e-32,
    direct: 1.1e-14,
};

/// Single-crystal silicon.
pub const SILICON: Material = Material {
    name: "si",
    category: MaterialCategory::Semiconductor,
    permittivity: 11.7,
    affinity: 4.05,
    density: 2.329,
    conductance: 0.0,
    thermal_conductivity: 1.5,
    heat_capacity: 0.70,
    band: Some(SI_BAND),
    mobility: Some(SI_MOBILITY),
    recomb: Some(SI_RECOMB),
};

/// Polycrystalline silicon (gate material); silicon band structure with
/// its own analytic mobility fit.
pub const POLYSILICON: Material = Material {
    name: "polysi",
    category: MaterialCategory::Semiconductor,
    permittivity: 11.7,
    affinity: 4.05,
    density: 2.320,
    conductance: 0.0,
    thermal_conductivity: 0.30,
    heat_capacity: 0.70,
    band: Some(SI_BAND),
    mobility: Some(SI_MOBILITY),
    recomb: Some(SI_RECOMB),
};

/// Thermal oxide.
pub const SIO2: Material = Material {
    name: "sio2",
    category: MaterialCategory::Insulator,
    permittivity: 3.9,
    affinity: 0.97,
    density: 2.65,
    conductance: 0.0,
    thermal_conductivity: 0.014,
    heat_capacity: 0.73,
    band: None,
    mobility: None,
    recomb: None,
};

/// Silicon nitride.
pub const NITRIDE: Material = Material {
    name: "nitride",
    category: MaterialCategory::Insulator,
    permittivity: 7.5,
    affinity: 1.0,
    density: 3.44,
    conductance: 0.0,
    thermal_conductivity: 0.185,
    heat_capacity: 0.70,
    band: None,
    mobility: None,
    recomb: None,
};

/// Aluminum, as a resistive metal. `1/(2.874 μΩ·cm) ≈ 3.48·10⁵ S/cm`.
pub const ALUMINUM: Material = Material {
    name: "al",
    category: MaterialCategory::Resistance,
    permittivity: 1.0,
    affinity: 4.25,
    density: 2.70,
    conductance: 1.0 / 2.874e-6,
    thermal_conductivity: 2.37,
    heat_capacity: 0.90,
    band: None,
    mobility: None,
    recomb: None,
};

/// Copper, as a resistive metal.
pub const COPPER: Material = Material {
    name: "cu",
    category: MaterialCategory::Resistance,
    permittivity: 1.0,
    affinity: 4.65,
    density: 8.96,
    conductance: 1.0 / 1.69e-6,
    thermal_conductivity: 4.01,
    heat_capacity: 0.385,
    band: None,
    mobility: None,
    recomb: None,
};

/// Idealised perfect conductor backing an electrode region.
pub const ELECTRODE: Material = Material {
    name: "elec",
    category: MaterialCategory::Conductor,
    permittivity: 1.0,
    affinity: 4.7,
    density: 0.0,
    conductance: 0.0,
    thermal_conductivity: 4.0,
    heat_capacity: 0.4,
    band: None,
    mobility: None,
    recomb: None,
};

/// Vacuum.
pub const VACUUM: Material = Material {
    name: "vacuum",
    category: MaterialCategory::Vacuum,
    permittivity: 1.0,
    affinity: 0.0,
    density: 0.0,
    conductance: 0.0,
    thermal_conductivity: 2.6e-4,
    heat_capacity: 1.0,
    band: None,
    mobility: None,
    recomb: None,
};

/// Perfectly-matched layer for wave solvers.
pub const PML: Material = Material {
    name: "pml",
    category: MaterialCategory::Pml,
    permittivity: 1.0,
    affinity: 0.0,
    density: 0.0,
    conductance: 0.0,
    thermal_conductivity: 2.6e-4,
    heat_capacity: 1.0,
    band: None,
    mobility: None,
    recomb: None,
};

const ALL: &[&Material] = &[
    &SILICON,
    &POLYSILICON,
    &SIO2,
    &NITRIDE,
    &ALUMINUM,
    &COPPER,
    &ELECTRODE,
    &VACUUM,
    &PML,
];

/// Look up a material by (case-insensitive) name. `silicon` and `oxide`
/// are accepted spellings of `si` and `sio2`.
///
/// # Errors
/// Fails with the offending name when it is unknown.
pub fn by_name(name: &str) -> Result<&'static Material> {
    let key = name.to_ascii_lowercase();
    let key = match key.as_str() {
        "silicon" => "si",
        "oxide" | "ox" => "sio2",
        "aluminum" => "al",
        "copper" => "cu",
        other => other,
    };
    for m in ALL {
        if m.name == key {
            return Ok(m);
        }
    }
    bail!("unknown material '{name}'")
}

fn category_of(name: &str) -> Option<MaterialCategory> {
    by_name(name).ok().map(|m| m.category)
}

/// Whether the named material transports carriers.
#[must_use]
pub fn is_semiconductor(name: &str) -> bool {
    category_of(name) == Some(MaterialCategory::Semiconductor)
}

/// Whether the named material is a dielectric.
#[must_use]
pub fn is_insulator(name: &str) -> bool {
    category_of(name) == Some(MaterialCategory::Insulator)
}

/// Whether the named material is a perfect conductor.
#[must_use]
pub fn is_conductor(name: &str) -> bool {
    category_of(name) == Some(MaterialCategory::Conductor)
}

/// Whether the named material is a resistive metal.
#[must_use]
pub fn is_resistance(name: &str) -> bool {
    category_of(name) == Some(MaterialCategory::Resistance)
}

/// Whether the named material is vacuum.
#[must_use]
pub fn is_vacuum(name: &str) -> bool {
    category_of(name) == Some(MaterialCategory::Vacuum)
}

/// Whether the named material is a perfectly-matched layer.
#[must_use]
pub fn is_pml(name: &str) -> bool {
    category_of(name) == Some(MaterialCategory::Pml)
}
