//! Companion-device metric publishing: a coalesced, change-detected
//! subset of the navigation state, rounded to fixed precision before
//! comparison so sub-display jitter never triggers a transmission.
//!
//! The publisher is an explicitly owned object: construct one, feed it
//! snapshots, drain frames into whatever transport the application uses.
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::navigation::NavigationSnapshot;

/// Identity of one published scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SyncMetric {
    Depth,
    BoatSpeed,
    ApparentWindSpeed,
    TrueWindSpeed,
    SpeedOverGround,
}

impl SyncMetric {
    /// Wire key for the metric.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Depth => "depth",
            Self::BoatSpeed => "boatSpeed",
            Self::ApparentWindSpeed => "apparentWindSpeed",
            Self::TrueWindSpeed => "trueWindSpeed",
            Self::SpeedOverGround => "speedOverGround",
        }
    }

    /// Decimal places kept before change comparison. Depth renders at
    /// one decimal, all speeds at two.
    fn decimals(&self) -> i32 {
        match self {
            Self::Depth => 1,
            _ => 2,
        }
    }

    fn round(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.decimals());
        (value * scale).round() / scale
    }
}

/// One coalesced set of rounded metrics. Fields the instruments have
/// never reported stay `None`.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncFrame {
    pub depth_m: Option<f64>,
    pub boat_speed_kts: Option<f64>,
    pub apparent_wind_speed: Option<f64>,
    pub true_wind_speed: Option<f64>,
    pub sog_kts: Option<f64>,
}

impl SyncFrame {
    fn is_empty(&self) -> bool {
        self.depth_m.is_none()
            && self.boat_speed_kts.is_none()
            && self.apparent_wind_speed.is_none()
            && self.true_wind_speed.is_none()
            && self.sog_kts.is_none()
    }

    /// Present metrics as `(identity, value)` pairs, for transports that
    /// serialize key/value maps.
    pub fn entries(&self) -> impl Iterator<Item = (SyncMetric, f64)> + '_ {
        [
            (SyncMetric::Depth, self.depth_m),
            (SyncMetric::BoatSpeed, self.boat_speed_kts),
            (SyncMetric::ApparentWindSpeed, self.apparent_wind_speed),
            (SyncMetric::TrueWindSpeed, self.true_wind_speed),
            (SyncMetric::SpeedOverGround, self.sog_kts),
        ]
        .into_iter()
        .filter_map(|(metric, value)| value.map(|v| (metric, v)))
    }
}

/// Change-detecting metrics publisher.
///
/// [MetricsPublisher::update_from] folds a snapshot in (rounding each
/// present value); [MetricsPublisher::take_changed] yields a frame only
/// when the rounded values differ from the last frame taken. A metric
/// the snapshot no longer carries keeps its previous value rather than
/// flapping between present and absent.
#[derive(Debug, Default)]
pub struct MetricsPublisher {
    latest: SyncFrame,
    last_sent: Option<SyncFrame>,
}

impl MetricsPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the publishable subset of `nav` into the pending frame.
    pub fn update_from(&mut self, nav: &NavigationSnapshot) {
        let update = |slot: &mut Option<f64>, metric: SyncMetric, value: Option<f64>| {
            if let Some(v) = value {
                *slot = Some(metric.round(v));
            }
        };
        update(&mut self.latest.depth_m, SyncMetric::Depth, nav.depth_m);
        update(
            &mut self.latest.boat_speed_kts,
            SyncMetric::BoatSpeed,
            nav.stw_kts,
        );
        update(
            &mut self.latest.apparent_wind_speed,
            SyncMetric::ApparentWindSpeed,
            nav.aws_kts(),
        );
        update(
            &mut self.latest.true_wind_speed,
            SyncMetric::TrueWindSpeed,
            nav.tws_kts(),
        );
        update(
            &mut self.latest.sog_kts,
            SyncMetric::SpeedOverGround,
            nav.sog_kts,
        );
    }

    /// The pending frame when it differs from the last one taken, None
    /// otherwise. Taking a frame marks it sent.
    pub fn take_changed(&mut self) -> Option<SyncFrame> {
        if self.latest.is_empty() {
            return None;
        }
        if self.last_sent.as_ref() == Some(&self.latest) {
            debug!("no visible change, skipping sync frame");
            return None;
        }
        self.last_sent = Some(self.latest.clone());
        Some(self.latest.clone())
    }

    /// Forget both pending and sent state; the next frame always sends.
    pub fn reset(&mut self) {
        self.latest = SyncFrame::default();
        self.last_sent = None;
    }
}
