//! Navigation state: per-channel smoothing of decoded instrument
//! readings and aggregation into coherent snapshots.
use hifitime::Epoch;
use log::debug;

use crate::angle::normalize_360;
use crate::cfg::{Config, FilterTuning, UnitMode};
use crate::error::Error;
use crate::geo::GeoPoint;
use crate::kalman::{AngleKalman, ScalarKalman};
use crate::nmea::{decode, DecodeError, DecodedReading};
use crate::units::knots_to_mps;
use crate::waypoint::Waypoint;

mod shared;
mod snapshot;

pub use shared::SharedNavigator;
pub use snapshot::NavigationSnapshot;

/// Counters over all lines ever fed to a [Navigator].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeStats {
    /// Lines decoded and folded into the state
    pub accepted: u64,
    /// Lines rejected for framing, checksum or field errors
    pub malformed: u64,
    /// Valid frames of a type we do not decode
    pub unsupported: u64,
}

/// Scalar channel that seeds its filter from the first sample instead of
/// dragging the estimate up from zero.
#[derive(Debug, Clone)]
struct Channel {
    filter: ScalarKalman,
    seen: bool,
}

impl Channel {
    fn new(tuning: FilterTuning) -> Result<Self, Error> {
        Ok(Self {
            filter: ScalarKalman::new(0.0, tuning.process_noise, tuning.measurement_noise)?,
            seen: false,
        })
    }

    fn update(&mut self, value: f64) -> f64 {
        if !self.seen {
            self.filter.reset(value);
            self.seen = true;
        }
        self.filter.update(value)
    }

    fn estimate(&self) -> Option<f64> {
        self.seen.then(|| self.filter.estimate())
    }

    fn reset(&mut self) {
        self.filter.reset(0.0);
        self.seen = false;
    }
}

/// Aggregated navigation state.
///
/// Feed decoded readings (or raw lines) in; take [NavigationSnapshot]s
/// out. Angular channels (headings, wind angles) and noisy scalar
/// channels (speeds, depth) are Kalman-smoothed; position, temperature
/// and log distances pass through unfiltered. Single writer by design:
/// wrap in [SharedNavigator] to share across threads.
pub struct Navigator {
    cfg: Config,

    heading_mag: AngleKalman,
    heading_true: AngleKalman,
    awa: AngleKalman,
    twa: AngleKalman,

    stw: Channel,
    aws: Channel,
    tws: Channel,
    depth: Channel,

    /// Last reported magnetic variation (east positive)
    variation_deg: Option<f64>,
    position: Option<GeoPoint>,
    sog_kts: Option<f64>,
    cog_deg: Option<f64>,
    water_temp_c: Option<f64>,
    total_log_nm: Option<f64>,
    trip_log_nm: Option<f64>,
    wind_updated_at: Option<Epoch>,

    target: Option<Waypoint>,
    stats: DecodeStats,
}

impl Navigator {
    /// Build a navigator. Fails on invalid configuration
    /// ([Error::InvalidConfiguration]).
    pub fn new(cfg: Config) -> Result<Self, Error> {
        cfg.validate()?;
        let angles = cfg.angle_tuning;
        Ok(Self {
            heading_mag: AngleKalman::new(angles.process_noise, angles.measurement_noise)?,
            heading_true: AngleKalman::new(angles.process_noise, angles.measurement_noise)?,
            awa: AngleKalman::new(angles.process_noise, angles.measurement_noise)?,
            twa: AngleKalman::new(angles.process_noise, angles.measurement_noise)?,
            stw: Channel::new(cfg.speed_tuning)?,
            aws: Channel::new(cfg.speed_tuning)?,
            tws: Channel::new(cfg.speed_tuning)?,
            depth: Channel::new(cfg.depth_tuning)?,
            variation_deg: None,
            position: None,
            sog_kts: None,
            cog_deg: None,
            water_temp_c: None,
            total_log_nm: None,
            trip_log_nm: None,
            wind_updated_at: None,
            target: None,
            stats: DecodeStats::default(),
            cfg,
        })
    }

    /// Decode one raw NMEA line and fold it into the state. Rejected
    /// lines are counted and returned, they never disturb the state.
    pub fn feed_line(&mut self, line: &str) -> Result<(), DecodeError> {
        match decode(line) {
            Ok(reading) => {
                self.stats.accepted += 1;
                self.accept(reading);
                Ok(())
            },
            Err(e) => {
                match e {
                    DecodeError::MalformedSentence(_) => self.stats.malformed += 1,
                    DecodeError::UnsupportedSentenceType(_) => self.stats.unsupported += 1,
                }
                debug!("rejected line: {}", e);
                Err(e)
            },
        }
    }

    /// Fold one decoded reading into the state.
    pub fn accept(&mut self, reading: DecodedReading) {
        match reading {
            DecodedReading::Depth(m) => {
                self.depth.update(m);
            },
            DecodedReading::WaterTemperature(c) => self.water_temp_c = Some(c),
            DecodedReading::SpeedThroughWater(kts) => {
                self.stw.update(kts);
            },
            DecodedReading::DistanceLog {
                total_nm,
                since_reset_nm,
            } => {
                self.total_log_nm = Some(total_nm);
                self.trip_log_nm = Some(since_reset_nm);
            },
            DecodedReading::MagneticHeading {
                heading_deg,
                variation_deg,
            } => {
                if variation_deg.is_some() {
                    self.variation_deg = variation_deg;
                }
                self.heading_mag.update(heading_deg);
                // variation east positive: adding it converts to true
                if let Some(var) = self.variation_deg {
                    self.heading_true.update(normalize_360(heading_deg + var));
                }
            },
            DecodedReading::TrueHeading(deg) => {
                self.heading_true.update(deg);
            },
            DecodedReading::ApparentWind {
                angle_deg,
                speed_kts,
            } => {
                self.awa.update(angle_deg);
                self.aws.update(speed_kts);
                self.wind_updated_at = Epoch::now().ok();
            },
            DecodedReading::TrueWind {
                angle_deg,
                speed_kts,
            } => {
                self.twa.update(angle_deg);
                self.tws.update(speed_kts);
                self.wind_updated_at = Epoch::now().ok();
            },
            DecodedReading::Position(fix) => {
                self.position = Some(fix.position);
                if fix.sog_kts.is_some() {
                    self.sog_kts = fix.sog_kts;
                }
                if fix.cog_deg.is_some() {
                    self.cog_deg = fix.cog_deg;
                }
            },
            DecodedReading::GroundTrack { cog_deg, sog_kts } => {
                if sog_kts.is_some() {
                    self.sog_kts = sog_kts;
                }
                if cog_deg.is_some() {
                    self.cog_deg = cog_deg;
                }
            },
        }
    }

    /// Select (or clear) the active waypoint target.
    pub fn set_target(&mut self, target: Option<Waypoint>) {
        match &target {
            Some(wp) => debug!("target set: {}", wp),
            None => debug!("target cleared"),
        }
        self.target = target.map(Waypoint::activated);
    }

    pub fn clear_target(&mut self) {
        self.set_target(None);
    }

    pub fn target(&self) -> Option<&Waypoint> {
        self.target.as_ref()
    }

    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Owned snapshot of the current state. Wind speeds are converted to
    /// the configured unit mode here; internal filters are untouched.
    pub fn snapshot(&self) -> NavigationSnapshot {
        let heading = self.heading_true.estimate().or(self.heading_mag.estimate());
        let wind_direction = |angle: Option<f64>| match (angle, heading) {
            (Some(a), Some(h)) => Some(normalize_360(a + h)),
            _ => None,
        };
        let wind_speed = |kts: Option<f64>| match self.cfg.units {
            UnitMode::Imperial => kts,
            UnitMode::Metric => kts.map(knots_to_mps),
        };

        NavigationSnapshot {
            units: self.cfg.units,
            bearing: self.cfg.bearing,
            position: self.position,
            sog_kts: self.sog_kts,
            cog_deg: self.cog_deg,
            heading_mag_deg: self.heading_mag.estimate(),
            heading_true_deg: self.heading_true.estimate(),
            stw_kts: self.stw.estimate(),
            depth_m: self.depth.estimate(),
            water_temp_c: self.water_temp_c,
            total_log_nm: self.total_log_nm,
            trip_log_nm: self.trip_log_nm,
            awa_deg: self.awa.estimate(),
            aws: wind_speed(self.aws.estimate()),
            awd_deg: wind_direction(self.awa.estimate()),
            twa_deg: self.twa.estimate(),
            tws: wind_speed(self.tws.estimate()),
            twd_deg: wind_direction(self.twa.estimate()),
            wind_updated_at: self.wind_updated_at,
            target: self.target.clone(),
        }
    }

    /// Drop all measurements and filter state. Configuration and the
    /// active target survive.
    pub fn reset(&mut self) {
        self.heading_mag.reset();
        self.heading_true.reset();
        self.awa.reset();
        self.twa.reset();
        self.stw.reset();
        self.aws.reset();
        self.tws.reset();
        self.depth.reset();
        self.variation_deg = None;
        self.position = None;
        self.sog_kts = None;
        self.cog_deg = None;
        self.water_temp_c = None;
        self.total_log_nm = None;
        self.trip_log_nm = None;
        self.wind_updated_at = None;
        self.stats = DecodeStats::default();
    }
}
