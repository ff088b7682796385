//! Scalar recursive smoothing (1-D Kalman filter) and its angular adapter.
use thiserror::Error;

use crate::angle::{normalize_360, shortest_delta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Process noise and measurement noise must both be strictly positive.
    /// Fatal to the filter instance being built, nothing else.
    #[error("invalid filter parameter: noise coefficients must be > 0")]
    InvalidFilterParameter,
}

/// Scalar Kalman filter: one estimate, one covariance, fixed noise
/// coefficients.
///
/// Higher `q` (process noise) lets the filter track real change faster;
/// higher `r` (measurement noise) rejects transient noise harder.
/// Deterministic for a given input sequence.
///
/// The output is unbounded. Never feed a wrapped angle directly:
/// use [AngleKalman], which unwraps the shortest-path delta first.
#[derive(Debug, Clone)]
pub struct ScalarKalman {
    /// Current estimate
    x: f64,
    /// Error covariance, >= 0 at all times
    p: f64,
    /// Process noise covariance
    q: f64,
    /// Measurement noise covariance
    r: f64,
}

impl ScalarKalman {
    /// Build a filter seeded at `initial` with the given noise
    /// coefficients. `q` or `r` <= 0 is a caller error and fails with
    /// [Error::InvalidFilterParameter].
    pub fn new(initial: f64, q: f64, r: f64) -> Result<Self, Error> {
        if q <= 0.0 || r <= 0.0 {
            return Err(Error::InvalidFilterParameter);
        }
        Ok(Self {
            x: initial,
            p: 1.0,
            q,
            r,
        })
    }

    /// Fold one measurement in, returning the new estimate.
    pub fn update(&mut self, measurement: f64) -> f64 {
        // prediction
        self.p += self.q;

        // measurement update
        let k = self.p / (self.p + self.r);
        self.x += k * (measurement - self.x);
        self.p *= 1.0 - k;

        self.x
    }

    /// Latest estimate, without folding a new measurement in.
    pub fn estimate(&self) -> f64 {
        self.x
    }

    /// Current error covariance.
    pub fn covariance(&self) -> f64 {
        self.p
    }

    /// Re-seed the filter at `initial`, restoring initial uncertainty.
    pub fn reset(&mut self, initial: f64) {
        self.x = initial;
        self.p = 1.0;
    }
}

/// Angular adapter over [ScalarKalman].
///
/// Compass angles wrap at 0/360: filtering them linearly would drag the
/// estimate backwards through 180 on a 350 -> 10 transition. This wrapper
/// keeps the inner estimate on an unwrapped (cumulative) axis, feeds it
/// the raw value shifted by the shortest signed delta, and re-normalizes
/// the output into [0, 360).
///
/// Seeds itself from the first sample.
#[derive(Debug, Clone)]
pub struct AngleKalman {
    inner: ScalarKalman,
    initialized: bool,
}

impl AngleKalman {
    pub fn new(q: f64, r: f64) -> Result<Self, Error> {
        Ok(Self {
            inner: ScalarKalman::new(0.0, q, r)?,
            initialized: false,
        })
    }

    /// Fold one raw compass angle (degrees, any wrap) in, returning the
    /// smoothed angle in [0, 360).
    pub fn update(&mut self, raw_deg: f64) -> f64 {
        if !self.initialized {
            self.inner.reset(normalize_360(raw_deg));
            self.initialized = true;
            return self.inner.estimate();
        }
        let est = self.inner.estimate();
        let delta = shortest_delta(normalize_360(est), normalize_360(raw_deg));
        normalize_360(self.inner.update(est + delta))
    }

    /// Smoothed angle in [0, 360), or None before the first sample.
    pub fn estimate(&self) -> Option<f64> {
        if self.initialized {
            Some(normalize_360(self.inner.estimate()))
        } else {
            None
        }
    }

    pub fn reset(&mut self) {
        self.initialized = false;
        self.inner.reset(0.0);
    }
}
