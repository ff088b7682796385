//! Configuration surface. Everything the core needs is supplied here at
//! startup or through explicit setters; there is no implicit global
//! lookup inside the core.
use thiserror::Error;

use hifitime::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::MIN_SOG_KTS;
use crate::units::DistanceUnit;

/// Configuration Error
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Error {
    #[error("tack tolerance must lie in (0, 90) degrees")]
    InvalidTackTolerance,
    #[error("hull length must be > 0")]
    InvalidHullLength,
    #[error("minimal SOG threshold must be >= 0")]
    InvalidSogThreshold,
    #[error("filter noise coefficients must be > 0")]
    InvalidFilterTuning,
}

/// Unit mode for exposed snapshot values. Filters always run on the
/// canonical units (knots, meters, degrees, Celsius) so toggling the mode
/// mid-session cannot disturb their noise characteristics.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnitMode {
    /// Wind speeds exposed in knots.
    #[default]
    Imperial,
    /// Wind speeds exposed in m.s⁻¹.
    Metric,
}

/// Which heading reference to prefer for display.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BearingMode {
    /// True heading (magnetic corrected by variation when available).
    #[default]
    True,
    /// Raw magnetic heading.
    Magnetic,
}

/// Side to favor when the two candidate tack headings are equally
/// attractive (exactly on the tolerance boundary).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TackPolicy {
    #[default]
    Starboard,
    Port,
}

/// Noise coefficients for one class of smoothing filters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FilterTuning {
    /// Process noise covariance (q): higher adapts faster.
    pub process_noise: f64,
    /// Measurement noise covariance (r): higher smooths harder.
    pub measurement_noise: f64,
}

fn default_angle_tuning() -> FilterTuning {
    FilterTuning {
        process_noise: 0.5,
        measurement_noise: 0.1,
    }
}

fn default_speed_tuning() -> FilterTuning {
    FilterTuning {
        process_noise: 1.0e-5,
        measurement_noise: 1.0e-1,
    }
}

fn default_depth_tuning() -> FilterTuning {
    FilterTuning {
        process_noise: 1.0e-5,
        measurement_noise: 1.0e-1,
    }
}

fn default_tack_tolerance() -> f64 {
    10.0
}

fn default_min_sog() -> f64 {
    MIN_SOG_KTS
}

fn default_min_interval() -> Duration {
    Duration::from_seconds(1.0)
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Unit mode for exposed values
    #[cfg_attr(feature = "serde", serde(default))]
    pub units: UnitMode,

    /// Distance display unit preference
    #[cfg_attr(feature = "serde", serde(default))]
    pub distance_unit: DistanceUnit,

    /// Heading reference preference
    #[cfg_attr(feature = "serde", serde(default))]
    pub bearing: BearingMode,

    /// Tolerance angle (degrees) around the optimal tack heading within
    /// which the current course still counts as "on the tack".
    #[cfg_attr(feature = "serde", serde(default = "default_tack_tolerance"))]
    pub tack_tolerance_deg: f64,

    /// Tie-break side when exactly on the tolerance boundary
    #[cfg_attr(feature = "serde", serde(default))]
    pub tack_policy: TackPolicy,

    /// Hull length (meters), required only for boat-length distances
    #[cfg_attr(feature = "serde", serde(default))]
    pub hull_length_m: Option<f64>,

    /// SOG (knots) at or below this is "not moving": ETA unavailable
    #[cfg_attr(feature = "serde", serde(default = "default_min_sog"))]
    pub min_sog_kts: f64,

    /// Minimal interval between cadence-triggered recomputations
    #[cfg_attr(feature = "serde", serde(default = "default_min_interval"))]
    pub min_interval: Duration,

    /// Angular channel smoothing (heading, wind angles)
    #[cfg_attr(feature = "serde", serde(default = "default_angle_tuning"))]
    pub angle_tuning: FilterTuning,

    /// Speed channel smoothing (boat speed, wind speeds)
    #[cfg_attr(feature = "serde", serde(default = "default_speed_tuning"))]
    pub speed_tuning: FilterTuning,

    /// Depth channel smoothing
    #[cfg_attr(feature = "serde", serde(default = "default_depth_tuning"))]
    pub depth_tuning: FilterTuning,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            units: UnitMode::default(),
            distance_unit: DistanceUnit::default(),
            bearing: BearingMode::default(),
            tack_tolerance_deg: default_tack_tolerance(),
            tack_policy: TackPolicy::default(),
            hull_length_m: None,
            min_sog_kts: default_min_sog(),
            min_interval: default_min_interval(),
            angle_tuning: default_angle_tuning(),
            speed_tuning: default_speed_tuning(),
            depth_tuning: default_depth_tuning(),
        }
    }
}

impl Config {
    /// Check value ranges. Construction never fails; call this after
    /// deserializing externally supplied settings.
    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..90.0).contains(&self.tack_tolerance_deg) || self.tack_tolerance_deg == 0.0 {
            return Err(Error::InvalidTackTolerance);
        }
        if let Some(hull) = self.hull_length_m {
            if hull <= 0.0 {
                return Err(Error::InvalidHullLength);
            }
        }
        if self.min_sog_kts < 0.0 {
            return Err(Error::InvalidSogThreshold);
        }
        for tuning in [self.angle_tuning, self.speed_tuning, self.depth_tuning] {
            if tuning.process_noise <= 0.0 || tuning.measurement_noise <= 0.0 {
                return Err(Error::InvalidFilterTuning);
            }
        }
        Ok(())
    }
}
