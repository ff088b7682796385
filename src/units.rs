//! Pure unit conversions for display. Internally everything runs on
//! canonical units (meters, knots, degrees, Celsius); conversion happens
//! at the exposure boundary only.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::{KNOT_KMH, KNOT_MPS, NAUTICAL_CABLE_M, NAUTICAL_MILE_M};
use crate::error::Error;

/// Distance display unit.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DistanceUnit {
    #[default]
    NauticalMiles,
    Cables,
    Meters,
    /// Requires a configured hull length.
    BoatLengths,
}

impl std::fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NauticalMiles => write!(f, "nm"),
            Self::Cables => write!(f, "cbl"),
            Self::Meters => write!(f, "m"),
            Self::BoatLengths => write!(f, "boat lengths"),
        }
    }
}

/// Convert a canonical distance (meters) into `unit`.
/// [DistanceUnit::BoatLengths] needs `hull_length_m`; without it the
/// conversion fails with [Error::MissingConfiguration] while every other
/// unit still converts.
pub fn convert_distance(
    meters: f64,
    unit: DistanceUnit,
    hull_length_m: Option<f64>,
) -> Result<f64, Error> {
    match unit {
        DistanceUnit::Meters => Ok(meters),
        DistanceUnit::NauticalMiles => Ok(meters_to_nm(meters)),
        DistanceUnit::Cables => Ok(meters / NAUTICAL_CABLE_M),
        DistanceUnit::BoatLengths => match hull_length_m {
            Some(hull) if hull > 0.0 => Ok(meters / hull),
            _ => Err(Error::MissingConfiguration),
        },
    }
}

pub fn meters_to_nm(m: f64) -> f64 {
    m / NAUTICAL_MILE_M
}

pub fn knots_to_mps(kts: f64) -> f64 {
    kts * KNOT_MPS
}

pub fn kmh_to_knots(kmh: f64) -> f64 {
    kmh / KNOT_KMH
}

pub fn mps_to_knots(mps: f64) -> f64 {
    mps / KNOT_MPS
}

#[cfg(test)]
mod test {
    use super::*;

    fn nm_to_meters(nm: f64) -> f64 {
        nm * NAUTICAL_MILE_M
    }

    #[test]
    fn distance_round_trip() {
        let m = 9_260.0;
        let nm = meters_to_nm(m);
        assert!((nm - 5.0).abs() < 1e-9);
        assert!((nm_to_meters(nm) - m).abs() < 1e-9);
    }

    #[test]
    fn boat_lengths_need_hull() {
        assert_eq!(
            convert_distance(120.0, DistanceUnit::BoatLengths, None),
            Err(crate::Error::MissingConfiguration)
        );
        assert_eq!(
            convert_distance(120.0, DistanceUnit::BoatLengths, Some(12.0)),
            Ok(10.0)
        );
        // other units are unaffected by a missing hull length
        assert_eq!(
            convert_distance(1852.0, DistanceUnit::NauticalMiles, None),
            Ok(1.0)
        );
    }

    #[test]
    fn cables_are_tenths_of_a_mile() {
        let cables = convert_distance(1852.0, DistanceUnit::Cables, None).unwrap();
        assert!((cables - 10.0).abs() < 1e-9);
    }

    #[test]
    fn speed_round_trip() {
        let kts = 6.5;
        assert!((mps_to_knots(knots_to_mps(kts)) - kts).abs() < 1e-9);
        assert!((kmh_to_knots(1.852) - 1.0).abs() < 1e-9);
    }
}
