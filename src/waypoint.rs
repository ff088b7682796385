#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Read-only copy of a stored waypoint. The persistence side owns the
/// full record; the core only needs identity, position and whether it is
/// the active VMG target. At most one waypoint is active at a time -
/// activating one deactivates the rest, which the supplier enforces.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Waypoint {
    pub name: String,
    pub position: GeoPoint,
    pub active: bool,
}

impl Waypoint {
    pub fn new(name: &str, lat_deg: f64, lon_deg: f64) -> Self {
        Self {
            name: name.to_string(),
            position: GeoPoint::new(lat_deg, lon_deg),
            active: false,
        }
    }

    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }
}

impl std::fmt::Display for Waypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.position)
    }
}
