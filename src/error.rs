use thiserror::Error;

use crate::cfg;
use crate::kalman;

/// Compute-time errors. All of these are recoverable: the affected output
/// fields degrade to "unavailable", nothing terminates the session.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Error {
    /// No waypoint is currently selected as the VMG target:
    /// no mark-relative computation is attempted and the previous
    /// metrics snapshot is cleared.
    #[error("no active target waypoint")]
    NoActiveTarget,

    /// Boat position or course has not been observed yet: mark-relative
    /// fields are unavailable rather than stale.
    #[error("insufficient data (position or course unknown)")]
    InsufficientData,

    /// A unit-dependent output needs a configuration value that was not
    /// supplied (boat-length distances require the hull length).
    #[error("missing configuration (hull length)")]
    MissingConfiguration,

    /// Configuration failed validation at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] cfg::Error),

    /// Smoothing filter construction was given bad noise coefficients.
    #[error("filter error: {0}")]
    Filter(#[from] kalman::Error),
}
