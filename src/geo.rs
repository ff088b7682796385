//! Spherical-earth navigation primitives: great-circle distance and
//! bearing, destination point, and small-area segment intersection.
use nalgebra::{Matrix2, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::angle::normalize_360;
use crate::constants::EARTH_RADIUS_M;

/// A geographic position, decimal degrees, north/east positive.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl GeoPoint {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}°, {:.6}°)", self.lat_deg, self.lon_deg)
    }
}

/// Great-circle (haversine) distance in meters.
pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lon1) = (a.lat_deg.to_radians(), a.lon_deg.to_radians());
    let (lat2, lon2) = (b.lat_deg.to_radians(), b.lon_deg.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Great-circle initial bearing from `a` to `b`, degrees [0, 360).
pub fn initial_bearing_deg(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lon1) = (a.lat_deg.to_radians(), a.lon_deg.to_radians());
    let (lat2, lon2) = (b.lat_deg.to_radians(), b.lon_deg.to_radians());
    let dlon = lon2 - lon1;
    let x = lat2.cos() * dlon.sin();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_360(x.atan2(y).to_degrees())
}

/// Point reached from `start` following the great circle with the given
/// initial bearing for `distance_m` meters.
pub fn destination(start: GeoPoint, bearing_deg: f64, distance_m: f64) -> GeoPoint {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let lat1 = start.lat_deg.to_radians();
    let lon1 = start.lon_deg.to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    GeoPoint::new(lat2.to_degrees(), lon2.to_degrees())
}

/// Project onto a local equirectangular plane (meters east/north of
/// `origin`). Valid over the few-mile scale of layline geometry.
fn to_local(origin: GeoPoint, p: GeoPoint) -> Vector2<f64> {
    let east = (p.lon_deg - origin.lon_deg).to_radians()
        * origin.lat_deg.to_radians().cos()
        * EARTH_RADIUS_M;
    let north = (p.lat_deg - origin.lat_deg).to_radians() * EARTH_RADIUS_M;
    Vector2::new(east, north)
}

fn from_local(origin: GeoPoint, v: Vector2<f64>) -> GeoPoint {
    let lat = origin.lat_deg + (v.y / EARTH_RADIUS_M).to_degrees();
    let lon = origin.lon_deg
        + (v.x / (EARTH_RADIUS_M * origin.lat_deg.to_radians().cos())).to_degrees();
    GeoPoint::new(lat, lon)
}

/// Intersection of segments (a1, a2) and (b1, b2), computed on the local
/// plane centered at `a1`. None when the segments are parallel or the
/// crossing falls outside either segment.
pub fn segment_intersection(
    a1: GeoPoint,
    a2: GeoPoint,
    b1: GeoPoint,
    b2: GeoPoint,
) -> Option<GeoPoint> {
    let origin = a1;
    let p1 = to_local(origin, a1);
    let p2 = to_local(origin, a2);
    let p3 = to_local(origin, b1);
    let p4 = to_local(origin, b2);

    let da = p2 - p1;
    let db = p4 - p3;

    // p1 + t*da = p3 + s*db
    let m = Matrix2::new(da.x, -db.x, da.y, -db.y);
    let rhs = p3 - p1;
    let ts = m.lu().solve(&rhs)?;
    let (t, s) = (ts.x, ts.y);

    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&s) {
        return None;
    }

    Some(from_local(origin, p1 + da * t))
}
