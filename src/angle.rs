//! Angle normalization and shortest-path arithmetic.
//!
//! All public angles in this crate are degrees. Compass-style values live
//! in [0, 360), relative bearings in (-180, +180]. Any difference of two
//! compass angles must go through [shortest_delta] before it is fed to a
//! linear filter or a cosine.

/// Normalize an angle to [0, 360).
pub fn normalize_360(deg: f64) -> f64 {
    let r = deg % 360.0;
    if r < 0.0 {
        r + 360.0
    } else {
        r
    }
}

/// Normalize an angle to (-180, +180].
pub fn normalize_180(deg: f64) -> f64 {
    let r = normalize_360(deg);
    if r > 180.0 {
        r - 360.0
    } else {
        r
    }
}

/// Fold an angle into [-90, +90], mirroring across the beam.
/// Used to compare "how far off the bow" two directions are when
/// ahead/astern does not matter.
pub fn fold_90(deg: f64) -> f64 {
    let r = normalize_180(deg);
    if r > 90.0 {
        180.0 - r
    } else if r < -90.0 {
        -180.0 - r
    } else {
        r
    }
}

/// Signed shortest rotation from `from` to `to`, in (-180, +180].
/// `from + shortest_delta(from, to)` reaches `to` without ever taking
/// the long way around the 0/360 seam.
pub fn shortest_delta(from: f64, to: f64) -> f64 {
    normalize_180(to - from)
}
