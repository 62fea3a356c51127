// wo-core/src/units.rs

use uom::si::f64::{
    Acceleration as UomAcceleration, Angle as UomAngle, AngularVelocity as UomAngularVelocity,
    Energy as UomEnergy, Force as UomForce, Frequency as UomFrequency, Length as UomLength,
    Mass as UomMass, MassDensity as UomMassDensity, Power as UomPower, Time as UomTime,
};

// Public canonical unit types (SI, f64)
pub type Accel = UomAcceleration;
pub type Angle = UomAngle;
pub type AngularVelocity = UomAngularVelocity;
pub type Density = UomMassDensity;
pub type Energy = UomEnergy;
pub type Force = UomForce;
pub type Frequency = UomFrequency;
pub type Length = UomLength;
pub type Mass = UomMass;
pub type Power = UomPower;
pub type Time = UomTime;

#[inline]
pub fn hz(v: f64) -> Frequency {
    use uom::si::frequency::hertz;
    Frequency::new::<hertz>(v)
}

#[inline]
pub fn rad_per_s(v: f64) -> AngularVelocity {
    use uom::si::angular_velocity::radian_per_second;
    AngularVelocity::new::<radian_per_second>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn kgpm3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

#[inline]
pub fn newton(v: f64) -> Force {
    use uom::si::force::newton;
    Force::new::<newton>(v)
}

#[inline]
pub fn watt(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn joule(v: f64) -> Energy {
    use uom::si::energy::joule;
    Energy::new::<joule>(v)
}

#[inline]
pub fn rad(v: f64) -> Angle {
    use uom::si::angle::radian;
    Angle::new::<radian>(v)
}

#[inline]
pub fn deg(v: f64) -> Angle {
    use uom::si::angle::degree;
    Angle::new::<degree>(v)
}

pub mod constants {
    use super::*;

    pub const G0_MPS2: f64 = 9.806_65;
    pub const SEAWATER_DENSITY_KGPM3: f64 = 1025.0;

    #[inline]
    pub fn g0() -> Accel {
        use uom::si::acceleration::meter_per_second_squared;
        Accel::new::<meter_per_second_squared>(G0_MPS2)
    }

    #[inline]
    pub fn seawater_density() -> Density {
        kgpm3(SEAWATER_DENSITY_KGPM3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _f = hz(0.3);
        let _w = rad_per_s(1.2);
        let _l = m(0.0625);
        let _dt = s(0.1);
        let _m = kg(858.0);
        let _f = newton(2000.0);
        let _p = watt(-50.0);
        let _e = joule(1.0);
        let _g0 = constants::g0();
        let _rho = constants::seawater_density();
    }

    #[test]
    fn degrees_convert_to_radians() {
        use uom::si::angle::radian;
        let a = deg(180.0);
        assert!((a.get::<radian>() - std::f64::consts::PI).abs() < 1e-12);
        assert!((rad(1.0).get::<radian>() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn hertz_round_trip() {
        use uom::si::frequency::hertz;
        assert!((hz(0.05).get::<hertz>() - 0.05).abs() < 1e-15);
    }
}
