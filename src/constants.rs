/// Mean Earth radius (meters), spherical model
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per nautical mile
pub const NAUTICAL_MILE_M: f64 = 1852.0;

/// Meters per nautical cable (1/10 nautical mile)
pub const NAUTICAL_CABLE_M: f64 = 185.2;

/// m.s⁻¹ per knot
pub const KNOT_MPS: f64 = 0.514444444;

/// km.h⁻¹ per knot
pub const KNOT_KMH: f64 = 1.852;

/// SOG below this (knots) is treated as "not moving": ETA style
/// quantities are unavailable rather than diverging.
pub const MIN_SOG_KTS: f64 = 0.1;
