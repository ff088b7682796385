#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

// private modules
mod angle;
mod constants;
mod error;
mod geo;
mod kalman;
mod navigation;
mod nmea;
mod polar;
mod sync;
mod units;
mod vmg;
mod waypoint;

pub mod cfg;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::cfg::{BearingMode, Config, TackPolicy, UnitMode};
    pub use crate::geo::GeoPoint;
    pub use crate::kalman::{AngleKalman, ScalarKalman};
    pub use crate::navigation::{DecodeStats, NavigationSnapshot, Navigator, SharedNavigator};
    pub use crate::nmea::{decode, DecodeError, DecodedReading, PositionFix};
    pub use crate::polar::{PolarTable, SailingState, TackSolution, TackTable};
    pub use crate::sync::{MetricsPublisher, SyncFrame, SyncMetric};
    pub use crate::units::DistanceUnit;
    pub use crate::vmg::{Laylines, VmgProcessor, VmgSnapshot};
    pub use crate::waypoint::Waypoint;
    // re-export
    pub use hifitime::{Duration, Epoch};
}

// pub export
pub use error::Error;
