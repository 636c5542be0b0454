//! SI quantities at the public API edges.

use uom::si::f64::{Length as UomLength, MassDensity, Velocity as UomVelocity};

pub type Density = MassDensity;
pub type Length = UomLength;
pub type Velocity = UomVelocity;

pub fn m(v: f64) -> Length {
    Length::new::<uom::si::length::meter>(v)
}

pub fn mps(v: f64) -> Velocity {
    Velocity::new::<uom::si::velocity::meter_per_second>(v)
}

pub fn kgpm3(v: f64) -> Density {
    Density::new::<uom::si::mass_density::kilogram_per_cubic_meter>(v)
}

pub mod constants {
    /// Sea-level standard air density (kg/m³)
    pub const RHO_SL_KGPM3: f64 = 1.225;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uom::si::length::millimeter;
    use uom::si::velocity::kilometer_per_hour;

    #[test]
    fn values_are_stored_in_si() {
        assert!((m(1.5).get::<millimeter>() - 1500.0).abs() < 1e-9);
        assert!((mps(10.0).get::<kilometer_per_hour>() - 36.0).abs() < 1e-9);
        assert_eq!(kgpm3(constants::RHO_SL_KGPM3).value, 1.225);
    }
}
